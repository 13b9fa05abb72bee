//! Validator identity transfer.

use proofchain_common::{Address, Event, ValidatorId};
use tracing::info;

use super::{StakingLedger, MAX_UNSTAKINGS};
use crate::custody::Custody;
use crate::error::StakingError;

impl<C: Custody> StakingLedger<C> {
    /// Hand validator `id` over to `new_owner`.
    ///
    /// The owner position (stake, rewards, commission, unstakings) moves to
    /// `new_owner`. If `new_owner` already holds a position for this
    /// validator the call fails with `CannotTransferToDelegator` unless
    /// `merge` is set, in which case both positions are combined and the
    /// destination's former delegated stake becomes self-stake.
    ///
    /// ## Validations
    ///
    /// 1. `caller` is the current owner (`NotValidator`)
    /// 2. `new_owner` is non-zero and differs from the owner (`InvalidAddress`)
    /// 3. Destination position empty, or `merge` (`CannotTransferToDelegator`)
    /// 4. Combined live unstakings ≤ 300 (`TooManyUnstakings`)
    pub fn set_validator_identity(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        new_owner: Address,
        merge: bool,
    ) -> Result<Event, StakingError> {
        let v = self.validator_ref(id)?;
        if *caller != v.owner {
            return Err(StakingError::NotValidator);
        }
        if new_owner.is_zero() || new_owner == v.owner {
            return Err(StakingError::InvalidAddress);
        }

        let source = v.position(&v.owner).cloned().unwrap_or_default();
        let dest = v.position(&new_owner).cloned().unwrap_or_default();
        if !dest.is_empty() && !merge {
            return Err(StakingError::CannotTransferToDelegator);
        }
        if source.live_unstakings() + dest.live_unstakings() > MAX_UNSTAKINGS {
            return Err(StakingError::TooManyUnstakings { limit: MAX_UNSTAKINGS });
        }

        let mut merged = dest;
        let moved_delegation = merged.staked;
        merged.staked = merged.staked.checked_add(source.staked).ok_or(StakingError::Overflow)?;
        merged.rewards = merged.rewards.checked_add(source.rewards).ok_or(StakingError::Overflow)?;
        merged.commission_earned = merged
            .commission_earned
            .checked_add(source.commission_earned)
            .ok_or(StakingError::Overflow)?;
        let new_staked = v.staked.checked_add(moved_delegation).ok_or(StakingError::Overflow)?;
        let new_delegated = v.delegated.checked_sub(moved_delegation).ok_or(StakingError::Overflow)?;

        let mut source = source;
        for entry in source.drain_unstakings() {
            merged.push_unstaking(entry);
        }

        // All validations passed, apply.
        let v = self.validator_mut(id)?;
        let old_owner = v.owner;
        v.positions.remove(&old_owner);
        v.positions.insert(new_owner, merged);
        v.owner = new_owner;
        v.staked = new_staked;
        v.delegated = new_delegated;

        info!(validator_id = id, %old_owner, %new_owner, merge, "validator address changed");
        Ok(Event::ValidatorAddressChanged { validator_id: id, old_owner, new_owner })
    }
}
