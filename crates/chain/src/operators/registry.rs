//! Operator registration, enable/disable and auditor management.
//!
//! ## Atomicity
//!
//! Validations run first. When an operation cascades into the ledger
//! (enabling or disabling the owning validator), the ledger call happens
//! before any registry map is touched, so a ledger failure leaves both
//! sides unchanged.

use proofchain_common::{Address, Amount, Event, OperatorRole, ValidatorId};
use tracing::{debug, info};

use super::{OperatorRecord, OperatorRegistry};
use crate::error::RegistryError;
use crate::staking::StakingInterface;

impl OperatorRegistry {
    fn ensure_governance(&self, caller: &Address) -> Result<(), RegistryError> {
        if *caller != self.governance {
            return Err(RegistryError::NotGovernance);
        }
        Ok(())
    }

    fn ensure_role_free(&self, account: &Address) -> Result<(), RegistryError> {
        if let Some(existing) = self.operators.get(account) {
            return Err(RegistryError::RoleConflict {
                account: *account,
                existing: existing.role.to_string(),
            });
        }
        if self.auditors.contains(account) {
            return Err(RegistryError::RoleConflict {
                account: *account,
                existing: "auditor".to_string(),
            });
        }
        Ok(())
    }

    /// Look up `account` and check it is registered under `role`.
    fn record_for_role(&self, account: &Address, role: OperatorRole) -> Result<&OperatorRecord, RegistryError> {
        match self.operators.get(account) {
            Some(r) if r.role == role => Ok(r),
            _ => Err(RegistryError::WrongRole { account: *account, expected: role }),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // REGISTRATION
    // ════════════════════════════════════════════════════════════════════════════

    /// Register `account` as a disabled operator of `role` owned by
    /// `validator_id`. Governance only.
    ///
    /// ## Validations
    ///
    /// 1. Caller is governance
    /// 2. `role` is a producer role, `account` is non-zero
    /// 3. Validator exists
    /// 4. `account` holds no role yet (`RoleConflict`)
    pub fn add_operator<S: StakingInterface + ?Sized>(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        account: Address,
        validator_id: ValidatorId,
        staking: &S,
    ) -> Result<Event, RegistryError> {
        self.ensure_governance(caller)?;
        match role {
            OperatorRole::BlockSpecimenProducer | OperatorRole::BlockResultProducer => {}
            OperatorRole::Unassigned => return Err(RegistryError::InvalidRole(role)),
        }
        if account.is_zero() {
            return Err(RegistryError::InvalidAddress);
        }
        if staking.validator_owner(validator_id).is_none() {
            return Err(RegistryError::UnknownValidator(validator_id));
        }
        self.ensure_role_free(&account)?;

        self.operators.insert(
            account,
            OperatorRecord { account, role, validator_id, enabled: false },
        );

        info!(operator = %account, validator_id, %role, "operator added");
        Ok(Event::OperatorAdded { operator: account, validator_id, role })
    }

    /// Unregister `account`. Removing an enabled operator counts as
    /// disabling it first. Governance only.
    pub fn remove_operator<S: StakingInterface + ?Sized>(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        account: &Address,
        staking: &mut S,
        block: u64,
    ) -> Result<Vec<Event>, RegistryError> {
        self.ensure_governance(caller)?;
        let record = self.record_for_role(account, role)?.clone();

        let mut events = Vec::new();
        if record.enabled {
            if let Some(ev) = self.cascade_disable(record.validator_id, staking, block)? {
                events.push(ev);
            }
            self.enabled_slots.remove(&(record.validator_id, role));
        }
        self.operators.remove(account);

        info!(operator = %account, validator_id = record.validator_id, %role, "operator removed");
        events.insert(0, Event::OperatorRemoved { operator: *account, validator_id: record.validator_id, role });
        Ok(events)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // ENABLE / DISABLE
    // ════════════════════════════════════════════════════════════════════════════

    /// Enable `account` for `role`. Only the owner of the operator's
    /// validator may call.
    ///
    /// ## Check Order (Strict)
    ///
    /// 1. Registered under `role` (`WrongRole`)
    /// 2. Caller owns the validator (`NotOperatorManager`)
    /// 3. Not already enabled (`AlreadyEnabled`)
    /// 4. No other enabled operator of `role` for the validator (`RoleSlotTaken`)
    /// 5. Validator stake ≥ `required_stake(role)` (`InsufficientStake`)
    ///
    /// Enabling the first operator of a disabled validator re-enables it.
    pub fn enable_operator<S: StakingInterface + ?Sized>(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        account: &Address,
        staking: &mut S,
    ) -> Result<Vec<Event>, RegistryError> {
        let record = self.record_for_role(account, role)?;
        let validator_id = record.validator_id;
        if staking.validator_owner(validator_id) != Some(*caller) {
            return Err(RegistryError::NotOperatorManager);
        }
        if record.enabled {
            return Err(RegistryError::AlreadyEnabled(*account));
        }
        if self.enabled_slots.contains_key(&(validator_id, role)) {
            return Err(RegistryError::RoleSlotTaken { validator_id, role });
        }
        let required = self.required_stake(role);
        let actual = staking.validator_stake(validator_id).unwrap_or(0);
        if actual < required {
            return Err(RegistryError::InsufficientStake { required, actual });
        }

        let mut events = Vec::new();
        if self.enabled_count(validator_id) == 0 && staking.is_validator_enabled(validator_id) == Some(false) {
            events.push(staking.enable_validator(&self.identity, validator_id)?);
            debug!(validator_id, "validator re-enabled by first operator");
        }

        if let Some(r) = self.operators.get_mut(account) {
            r.enabled = true;
        }
        self.enabled_slots.insert((validator_id, role), *account);

        info!(operator = %account, validator_id, %role, "operator enabled");
        events.insert(0, Event::OperatorEnabled { operator: *account, validator_id, role });
        Ok(events)
    }

    /// Disable `account` for `role`. Disabling the validator's last enabled
    /// operator disables the validator at `block`.
    pub fn disable_operator<S: StakingInterface + ?Sized>(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        account: &Address,
        staking: &mut S,
        block: u64,
    ) -> Result<Vec<Event>, RegistryError> {
        let record = self.record_for_role(account, role)?;
        let validator_id = record.validator_id;
        if staking.validator_owner(validator_id) != Some(*caller) {
            return Err(RegistryError::NotOperatorManager);
        }
        if !record.enabled {
            return Err(RegistryError::AlreadyDisabled(*account));
        }

        let mut events = Vec::new();
        if let Some(ev) = self.cascade_disable(validator_id, staking, block)? {
            events.push(ev);
        }

        if let Some(r) = self.operators.get_mut(account) {
            r.enabled = false;
        }
        self.enabled_slots.remove(&(validator_id, role));

        info!(operator = %account, validator_id, %role, "operator disabled");
        events.insert(0, Event::OperatorDisabled { operator: *account, validator_id, role });
        Ok(events)
    }

    /// Take a validator out of service: every enabled operator it owns is
    /// disabled and the validator is disabled in the ledger at `block`.
    /// Governance only. A validator that is already disabled in the ledger
    /// is left as is; its operators are still switched off.
    ///
    /// ## Validations
    ///
    /// 1. Caller is governance
    /// 2. Validator exists (`UnknownValidator`)
    pub fn disable_validator<S: StakingInterface + ?Sized>(
        &mut self,
        caller: &Address,
        validator_id: ValidatorId,
        staking: &mut S,
        block: u64,
    ) -> Result<Vec<Event>, RegistryError> {
        self.ensure_governance(caller)?;
        let enabled = staking
            .is_validator_enabled(validator_id)
            .ok_or(RegistryError::UnknownValidator(validator_id))?;

        let ledger_event = if enabled {
            Some(staking.disable_validator(&self.identity, validator_id, block)?)
        } else {
            None
        };

        let slots: Vec<(OperatorRole, Address)> = self
            .enabled_slots
            .iter()
            .filter(|((id, _), _)| *id == validator_id)
            .map(|((_, role), account)| (*role, *account))
            .collect();
        let mut events = Vec::with_capacity(slots.len() + 1);
        for (role, account) in slots {
            if let Some(r) = self.operators.get_mut(&account) {
                r.enabled = false;
            }
            self.enabled_slots.remove(&(validator_id, role));
            events.push(Event::OperatorDisabled { operator: account, validator_id, role });
        }
        events.extend(ledger_event);

        info!(validator_id, block, operators = events.len(), "validator disabled by governance");
        Ok(events)
    }

    /// Disable the validator in the ledger if the operator about to go away
    /// is its last enabled one. Registry maps are not touched here.
    fn cascade_disable<S: StakingInterface + ?Sized>(
        &self,
        validator_id: ValidatorId,
        staking: &mut S,
        block: u64,
    ) -> Result<Option<Event>, RegistryError> {
        if self.enabled_count(validator_id) == 1 && staking.is_validator_enabled(validator_id) == Some(true) {
            let ev = staking.disable_validator(&self.identity, validator_id, block)?;
            debug!(validator_id, block, "validator disabled with its last operator");
            return Ok(Some(ev));
        }
        Ok(None)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // AUDITORS & ROLE CONFIG
    // ════════════════════════════════════════════════════════════════════════════

    pub fn add_auditor(&mut self, caller: &Address, auditor: Address) -> Result<Event, RegistryError> {
        self.ensure_governance(caller)?;
        if auditor.is_zero() {
            return Err(RegistryError::InvalidAddress);
        }
        self.ensure_role_free(&auditor)?;
        self.auditors.insert(auditor);
        info!(%auditor, "auditor added");
        Ok(Event::AuditorAdded { auditor })
    }

    pub fn remove_auditor(&mut self, caller: &Address, auditor: &Address) -> Result<Event, RegistryError> {
        self.ensure_governance(caller)?;
        if !self.auditors.remove(auditor) {
            return Err(RegistryError::UnknownAuditor(*auditor));
        }
        info!(%auditor, "auditor removed");
        Ok(Event::AuditorRemoved { auditor: *auditor })
    }

    pub fn set_required_stake(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        amount: Amount,
    ) -> Result<Event, RegistryError> {
        self.ensure_governance(caller)?;
        if role == OperatorRole::Unassigned {
            return Err(RegistryError::InvalidRole(role));
        }
        self.required_stake.insert(role, amount);
        Ok(Event::RequiredStakeChanged { role, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::MemoryCustody;
    use crate::error::StakingError;
    use crate::staking::{LedgerParams, StakingLedger};
    use proofchain_common::ONE_TOKEN;

    const BSP: OperatorRole = OperatorRole::BlockSpecimenProducer;
    const BRP: OperatorRole = OperatorRole::BlockResultProducer;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn gov() -> Address { addr(0xa0) }
    fn engine() -> Address { addr(0xa1) }
    fn owner() -> Address { addr(0x01) }

    /// Registry plus a ledger with validator 0 owned by `owner()` holding
    /// 200 tokens. BSP requires 100 tokens, BRP 300.
    fn setup() -> (OperatorRegistry, StakingLedger<MemoryCustody>) {
        let mut custody = MemoryCustody::new(addr(0xee));
        custody.mint(owner(), 1_000 * ONE_TOKEN).unwrap();
        let params = LedgerParams {
            delegator_cooldown: 5,
            validator_cooldown: 10,
            max_cap_multiplier: 2,
            validator_max_stake: 100_000 * ONE_TOKEN,
        };
        let mut ledger = StakingLedger::new(custody, gov(), engine(), params);
        ledger.add_validator(&engine(), owner(), 0, 1).unwrap();
        ledger.stake(&owner(), 0, 200 * ONE_TOKEN).unwrap();

        let mut reg = OperatorRegistry::new(gov(), engine());
        reg.set_required_stake(&gov(), BSP, 100 * ONE_TOKEN).unwrap();
        reg.set_required_stake(&gov(), BRP, 300 * ONE_TOKEN).unwrap();
        (reg, ledger)
    }

    #[test]
    fn add_operator_registers_disabled() {
        let (mut reg, ledger) = setup();
        let ev = reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap();
        assert_eq!(ev, Event::OperatorAdded { operator: addr(0x10), validator_id: 0, role: BSP });
        let rec = reg.operator(&addr(0x10)).unwrap();
        assert!(!rec.enabled);
        assert_eq!(reg.role_of(&addr(0x10)), BSP);
        assert_eq!(reg.role_of(&addr(0x11)), OperatorRole::Unassigned);
    }

    #[test]
    fn add_operator_validations() {
        let (mut reg, ledger) = setup();
        assert_eq!(reg.add_operator(&owner(), BSP, addr(0x10), 0, &ledger).unwrap_err(), RegistryError::NotGovernance);
        assert_eq!(
            reg.add_operator(&gov(), OperatorRole::Unassigned, addr(0x10), 0, &ledger).unwrap_err(),
            RegistryError::InvalidRole(OperatorRole::Unassigned)
        );
        assert_eq!(reg.add_operator(&gov(), BSP, addr(0x10), 9, &ledger).unwrap_err(), RegistryError::UnknownValidator(9));
    }

    #[test]
    fn role_exclusivity() {
        let (mut reg, ledger) = setup();
        reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap();
        let err = reg.add_operator(&gov(), BRP, addr(0x10), 0, &ledger).unwrap_err();
        assert!(matches!(err, RegistryError::RoleConflict { .. }));
        let err = reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap_err();
        assert!(matches!(err, RegistryError::RoleConflict { .. }));
        assert!(matches!(reg.add_auditor(&gov(), addr(0x10)).unwrap_err(), RegistryError::RoleConflict { .. }));

        reg.add_auditor(&gov(), addr(0x20)).unwrap();
        let err = reg.add_operator(&gov(), BSP, addr(0x20), 0, &ledger).unwrap_err();
        assert!(matches!(err, RegistryError::RoleConflict { .. }));
        assert_eq!(reg.role_of(&addr(0x10)), BSP);
    }

    #[test]
    fn enable_first_operator_enables_validator() {
        let (mut reg, mut ledger) = setup();
        reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap();
        assert_eq!(ledger.is_validator_enabled(0), Some(false));

        let events = reg.enable_operator(&owner(), BSP, &addr(0x10), &mut ledger).unwrap();
        assert_eq!(
            events,
            vec![
                Event::OperatorEnabled { operator: addr(0x10), validator_id: 0, role: BSP },
                Event::ValidatorEnabled { validator_id: 0 },
            ]
        );
        assert_eq!(ledger.is_validator_enabled(0), Some(true));
        assert!(reg.is_enabled_for(&addr(0x10), BSP));
        assert_eq!(reg.active_operators(BSP).len(), 1);
    }

    #[test]
    fn enable_checks() {
        let (mut reg, mut ledger) = setup();
        reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap();
        reg.add_operator(&gov(), BSP, addr(0x11), 0, &ledger).unwrap();
        reg.add_operator(&gov(), BRP, addr(0x12), 0, &ledger).unwrap();

        assert_eq!(
            reg.enable_operator(&owner(), BRP, &addr(0x10), &mut ledger).unwrap_err(),
            RegistryError::WrongRole { account: addr(0x10), expected: BRP }
        );
        assert_eq!(
            reg.enable_operator(&addr(0x99), BSP, &addr(0x10), &mut ledger).unwrap_err(),
            RegistryError::NotOperatorManager
        );
        reg.enable_operator(&owner(), BSP, &addr(0x10), &mut ledger).unwrap();
        assert_eq!(
            reg.enable_operator(&owner(), BSP, &addr(0x10), &mut ledger).unwrap_err(),
            RegistryError::AlreadyEnabled(addr(0x10))
        );
        assert_eq!(
            reg.enable_operator(&owner(), BSP, &addr(0x11), &mut ledger).unwrap_err(),
            RegistryError::RoleSlotTaken { validator_id: 0, role: BSP }
        );
        assert_eq!(
            reg.enable_operator(&owner(), BRP, &addr(0x12), &mut ledger).unwrap_err(),
            RegistryError::InsufficientStake { required: 300 * ONE_TOKEN, actual: 200 * ONE_TOKEN }
        );
    }

    #[test]
    fn disabling_last_operator_disables_validator() {
        let (mut reg, mut ledger) = setup();
        ledger.stake(&owner(), 0, 100 * ONE_TOKEN).unwrap();
        reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap();
        reg.add_operator(&gov(), BRP, addr(0x12), 0, &ledger).unwrap();
        reg.enable_operator(&owner(), BSP, &addr(0x10), &mut ledger).unwrap();
        let events = reg.enable_operator(&owner(), BRP, &addr(0x12), &mut ledger).unwrap();
        // validator was already enabled by the first operator
        assert_eq!(events.len(), 1);

        let events = reg.disable_operator(&owner(), BSP, &addr(0x10), &mut ledger, 40).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(ledger.is_validator_enabled(0), Some(true));

        let events = reg.disable_operator(&owner(), BRP, &addr(0x12), &mut ledger, 41).unwrap();
        assert_eq!(events[1], Event::ValidatorDisabled { validator_id: 0, block: 41 });
        assert_eq!(ledger.validator_metadata(0).unwrap().disabled_at_block, Some(41));
        assert_eq!(
            reg.disable_operator(&owner(), BRP, &addr(0x12), &mut ledger, 42).unwrap_err(),
            RegistryError::AlreadyDisabled(addr(0x12))
        );
    }

    #[test]
    fn remove_enabled_operator_acts_as_disable() {
        let (mut reg, mut ledger) = setup();
        reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap();
        reg.enable_operator(&owner(), BSP, &addr(0x10), &mut ledger).unwrap();

        assert_eq!(
            reg.remove_operator(&gov(), BRP, &addr(0x10), &mut ledger, 50).unwrap_err(),
            RegistryError::WrongRole { account: addr(0x10), expected: BRP }
        );
        assert_eq!(
            reg.remove_operator(&owner(), BSP, &addr(0x10), &mut ledger, 50).unwrap_err(),
            RegistryError::NotGovernance
        );

        let events = reg.remove_operator(&gov(), BSP, &addr(0x10), &mut ledger, 50).unwrap();
        assert_eq!(events[0], Event::OperatorRemoved { operator: addr(0x10), validator_id: 0, role: BSP });
        assert_eq!(events[1], Event::ValidatorDisabled { validator_id: 0, block: 50 });
        assert!(reg.operator(&addr(0x10)).is_none());
        assert!(reg.enabled_operator(0, BSP).is_none());

        // account is free again
        reg.add_operator(&gov(), BRP, addr(0x10), 0, &ledger).unwrap();
    }

    #[test]
    fn ledger_failure_leaves_registry_unchanged() {
        let (mut reg, mut ledger) = setup();
        reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap();
        // the registry no longer holds the staking-manager identity
        ledger.set_staking_manager(&gov(), addr(0x42)).unwrap();

        let err = reg.enable_operator(&owner(), BSP, &addr(0x10), &mut ledger).unwrap_err();
        assert_eq!(err, RegistryError::Staking(StakingError::NotStakingManager));
        assert!(!reg.operator(&addr(0x10)).unwrap().enabled);
        assert!(reg.enabled_operator(0, BSP).is_none());
    }

    #[test]
    fn auditor_management() {
        let (mut reg, _) = setup();
        assert_eq!(reg.add_auditor(&owner(), addr(0x30)).unwrap_err(), RegistryError::NotGovernance);
        reg.add_auditor(&gov(), addr(0x30)).unwrap();
        assert!(reg.is_auditor(&addr(0x30)));
        reg.remove_auditor(&gov(), &addr(0x30)).unwrap();
        assert!(!reg.is_auditor(&addr(0x30)));
        assert_eq!(
            reg.remove_auditor(&gov(), &addr(0x30)).unwrap_err(),
            RegistryError::UnknownAuditor(addr(0x30))
        );
    }

    #[test]
    fn governance_disable_switches_off_every_operator() {
        let (mut reg, mut ledger) = setup();
        ledger.stake(&owner(), 0, 100 * ONE_TOKEN).unwrap();
        reg.add_operator(&gov(), BSP, addr(0x10), 0, &ledger).unwrap();
        reg.add_operator(&gov(), BRP, addr(0x12), 0, &ledger).unwrap();
        reg.enable_operator(&owner(), BSP, &addr(0x10), &mut ledger).unwrap();
        reg.enable_operator(&owner(), BRP, &addr(0x12), &mut ledger).unwrap();

        assert_eq!(reg.disable_validator(&owner(), 0, &mut ledger, 60), Err(RegistryError::NotGovernance));
        assert_eq!(reg.disable_validator(&gov(), 9, &mut ledger, 60), Err(RegistryError::UnknownValidator(9)));

        let events = reg.disable_validator(&gov(), 0, &mut ledger, 60).unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.contains(&Event::OperatorDisabled { operator: addr(0x10), validator_id: 0, role: BSP }));
        assert!(events.contains(&Event::OperatorDisabled { operator: addr(0x12), validator_id: 0, role: BRP }));
        assert_eq!(events[2], Event::ValidatorDisabled { validator_id: 0, block: 60 });

        assert!(!reg.is_enabled_for(&addr(0x10), BSP));
        assert!(reg.active_operators(BRP).is_empty());
        assert_eq!(ledger.validator_metadata(0).unwrap().disabled_at_block, Some(60));

        // nothing left to switch off
        assert_eq!(reg.disable_validator(&gov(), 0, &mut ledger, 61), Ok(vec![]));
        // the owner can bring it back through an operator
        reg.enable_operator(&owner(), BSP, &addr(0x10), &mut ledger).unwrap();
        assert!(ledger.validator(0).unwrap().is_enabled());
    }
}
