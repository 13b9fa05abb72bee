//! # Operator Registry
//!
//! Maps operator accounts to `(role, owning validator, enabled)` and
//! gates who may submit proofs.
//!
//! ## Invariants
//!
//! 1. An account holds at most one role (operator role or auditor).
//! 2. A validator has at most one *enabled* operator per role; any number
//!    of disabled ones may be registered.
//! 3. `enabled_slots[(validator, role)] == account` iff the record for
//!    `account` is enabled with that validator and role.
//! 4. A validator with at least one enabled operator is enabled in the
//!    ledger; disabling or removing its last enabled operator disables it
//!    at the current block.
//!
//! Role-specific behavior is a `match` on [`OperatorRole`]; entry points
//! take the role they serve and reject operators registered under another.

use std::collections::{BTreeMap, BTreeSet};

use proofchain_common::{Address, Amount, OperatorRole, ValidatorId};
use serde::{Deserialize, Serialize};

mod registry;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRecord {
    pub account: Address,
    pub role: OperatorRole,
    pub validator_id: ValidatorId,
    pub enabled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct OperatorRegistry {
    governance: Address,
    /// Identity the registry uses when it toggles validators in the ledger.
    identity: Address,
    operators: BTreeMap<Address, OperatorRecord>,
    enabled_slots: BTreeMap<(ValidatorId, OperatorRole), Address>,
    required_stake: BTreeMap<OperatorRole, Amount>,
    auditors: BTreeSet<Address>,
}

impl OperatorRegistry {
    pub fn new(governance: Address, identity: Address) -> Self {
        OperatorRegistry {
            governance,
            identity,
            ..Default::default()
        }
    }

    pub fn governance(&self) -> Address {
        self.governance
    }

    pub fn operator(&self, account: &Address) -> Option<&OperatorRecord> {
        self.operators.get(account)
    }

    /// Role held by `account`, `Unassigned` when none.
    pub fn role_of(&self, account: &Address) -> OperatorRole {
        self.operators.get(account).map(|r| r.role).unwrap_or_default()
    }

    pub fn operators_of(&self, validator_id: ValidatorId) -> Vec<&OperatorRecord> {
        self.operators
            .values()
            .filter(|r| r.validator_id == validator_id)
            .collect()
    }

    /// Enabled operators of `role`, ordered by validator id.
    pub fn active_operators(&self, role: OperatorRole) -> Vec<&OperatorRecord> {
        self.enabled_slots
            .iter()
            .filter(|((_, r), _)| *r == role)
            .filter_map(|(_, account)| self.operators.get(account))
            .collect()
    }

    pub fn enabled_operator(&self, validator_id: ValidatorId, role: OperatorRole) -> Option<Address> {
        self.enabled_slots.get(&(validator_id, role)).copied()
    }

    /// True if `account` is registered under `role` and enabled.
    pub fn is_enabled_for(&self, account: &Address, role: OperatorRole) -> bool {
        self.operators
            .get(account)
            .map(|r| r.role == role && r.enabled)
            .unwrap_or(false)
    }

    /// Minimum validator stake for enabling or submitting under `role`.
    pub fn required_stake(&self, role: OperatorRole) -> Amount {
        self.required_stake.get(&role).copied().unwrap_or(0)
    }

    pub fn is_auditor(&self, account: &Address) -> bool {
        self.auditors.contains(account)
    }

    pub fn auditors(&self) -> impl Iterator<Item = &Address> {
        self.auditors.iter()
    }

    fn enabled_count(&self, validator_id: ValidatorId) -> usize {
        self.enabled_slots
            .keys()
            .filter(|(id, _)| *id == validator_id)
            .count()
    }
}
