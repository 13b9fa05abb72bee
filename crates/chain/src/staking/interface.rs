//! # StakingInterface
//!
//! The slice of the ledger the operator registry and the quorum engine
//! depend on. Keeping it a trait lets both be driven by a fake ledger in
//! tests.
//!
//! Mutating methods take the caller explicitly; in an integrated
//! deployment the caller is the engine's own identity, configured as the
//! ledger's staking manager.

use proofchain_common::{Address, Amount, Event, ValidatorId};

use super::StakingLedger;
use crate::custody::Custody;
use crate::error::StakingError;

pub trait StakingInterface {
    /// Owning account of a validator, `None` for unknown ids.
    fn validator_owner(&self, id: ValidatorId) -> Option<Address>;

    /// Self-stake plus delegated stake, `None` for unknown ids.
    fn validator_stake(&self, id: ValidatorId) -> Option<Amount>;

    /// `None` for unknown ids.
    fn is_validator_enabled(&self, id: ValidatorId) -> Option<bool>;

    fn enable_validator(&mut self, caller: &Address, id: ValidatorId) -> Result<Event, StakingError>;

    fn disable_validator(&mut self, caller: &Address, id: ValidatorId, block: u64) -> Result<Event, StakingError>;

    fn reward_validators(
        &mut self,
        caller: &Address,
        ids: &[ValidatorId],
        amounts: &[Amount],
    ) -> Result<Vec<Event>, StakingError>;
}

impl<C: Custody> StakingInterface for StakingLedger<C> {
    fn validator_owner(&self, id: ValidatorId) -> Option<Address> {
        self.validator(id).map(|v| v.owner)
    }

    fn validator_stake(&self, id: ValidatorId) -> Option<Amount> {
        self.validator(id).and_then(|v| v.total_stake())
    }

    fn is_validator_enabled(&self, id: ValidatorId) -> Option<bool> {
        self.validator(id).map(|v| v.is_enabled())
    }

    fn enable_validator(&mut self, caller: &Address, id: ValidatorId) -> Result<Event, StakingError> {
        StakingLedger::enable_validator(self, caller, id)
    }

    fn disable_validator(&mut self, caller: &Address, id: ValidatorId, block: u64) -> Result<Event, StakingError> {
        StakingLedger::disable_validator(self, caller, id, block)
    }

    fn reward_validators(
        &mut self,
        caller: &Address,
        ids: &[ValidatorId],
        amounts: &[Amount],
    ) -> Result<Vec<Event>, StakingError> {
        StakingLedger::reward_validators(self, caller, ids, amounts)
    }
}
