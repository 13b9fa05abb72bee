//! Validator lifecycle: registration, enable/disable, commission.

use std::collections::BTreeMap;

use proofchain_common::{Address, Event, ValidatorId, DIVIDER};
use tracing::info;

use super::{StakingLedger, Validator};
use crate::custody::Custody;
use crate::error::StakingError;

impl<C: Custody> StakingLedger<C> {
    // ============================================================
    // VALIDATOR REGISTRATION
    // ============================================================

    /// Register a new validator owned by `owner`.
    ///
    /// The id is the next dense index. New validators start disabled at
    /// `block`; they become enabled once an operator is enabled for them.
    ///
    /// ## Errors
    ///
    /// - `NotStakingManager` unless called by the staking manager or governance
    /// - `InvalidAddress` for the zero owner
    /// - `InvalidCommissionRate` when `commission_rate >= 10^18`
    pub fn add_validator(
        &mut self,
        caller: &Address,
        owner: Address,
        commission_rate: u128,
        block: u64,
    ) -> Result<(ValidatorId, Event), StakingError> {
        self.ensure_manager_or_governance(caller)?;
        if owner.is_zero() {
            return Err(StakingError::InvalidAddress);
        }
        if commission_rate >= DIVIDER {
            return Err(StakingError::InvalidCommissionRate(commission_rate));
        }

        let id = self.validators_count();
        self.validators.push(Validator {
            id,
            owner,
            commission_rate,
            staked: 0,
            delegated: 0,
            disabled_at_block: Some(block),
            positions: BTreeMap::new(),
        });

        info!(validator_id = id, %owner, commission_rate, "validator added");
        Ok((id, Event::ValidatorAdded { validator_id: id, commission_rate, owner }))
    }

    pub fn enable_validator(&mut self, caller: &Address, id: ValidatorId) -> Result<Event, StakingError> {
        self.ensure_manager_or_governance(caller)?;
        let v = self.validator_mut(id)?;
        if v.is_enabled() {
            return Err(StakingError::AlreadyEnabled(id));
        }
        v.disabled_at_block = None;

        info!(validator_id = id, "validator enabled");
        Ok(Event::ValidatorEnabled { validator_id: id })
    }

    /// Disable a validator, recording the block. A disabled validator can
    /// still be unstaked from and rewarded, but delegators cannot stake to it.
    pub fn disable_validator(&mut self, caller: &Address, id: ValidatorId, block: u64) -> Result<Event, StakingError> {
        self.ensure_manager_or_governance(caller)?;
        let v = self.validator_mut(id)?;
        if !v.is_enabled() {
            return Err(StakingError::AlreadyDisabled(id));
        }
        v.disabled_at_block = Some(block);

        info!(validator_id = id, block, "validator disabled");
        Ok(Event::ValidatorDisabled { validator_id: id, block })
    }

    pub fn set_validator_commission_rate(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        commission_rate: u128,
    ) -> Result<Event, StakingError> {
        self.ensure_governance(caller)?;
        if commission_rate >= DIVIDER {
            return Err(StakingError::InvalidCommissionRate(commission_rate));
        }
        self.validator_mut(id)?.commission_rate = commission_rate;
        Ok(Event::ValidatorCommissionRateChanged { validator_id: id, commission_rate })
    }
}
