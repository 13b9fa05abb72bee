//! Stake and unstake.

use proofchain_common::{Address, Amount, Event, ValidatorId};
use tracing::{debug, info};

use super::{StakingLedger, Unstaking, MAX_UNSTAKINGS, REWARD_REDEEM_THRESHOLD};
use crate::custody::Custody;
use crate::error::StakingError;

impl<C: Custody> StakingLedger<C> {
    // ============================================================
    // STAKE
    // ============================================================

    /// Lock `amount` from `caller` against validator `id`.
    ///
    /// ## Check Order
    ///
    /// 1. Validator exists, amount non-zero
    /// 2. Owner: resulting self-stake within `validator_max_stake` while enabled
    /// 3. Delegator: validator enabled, resulting delegated stake within
    ///    `staked * max_cap_multiplier`
    /// 4. Custody transfer from `caller`
    pub fn stake(&mut self, caller: &Address, id: ValidatorId, amount: Amount) -> Result<Event, StakingError> {
        let v = self.validator_ref(id)?;
        if amount == 0 {
            return Err(StakingError::AmountZero);
        }
        let is_owner = *caller == v.owner;
        let current = v.position(caller).map(|p| p.staked).unwrap_or(0);
        let new_position = current.checked_add(amount).ok_or(StakingError::Overflow)?;

        let (new_staked, new_delegated) = if is_owner {
            let new_staked = v.staked.checked_add(amount).ok_or(StakingError::Overflow)?;
            if v.is_enabled() && new_staked > self.params.validator_max_stake {
                return Err(StakingError::CapExceeded {
                    cap: self.params.validator_max_stake,
                    resulting: new_staked,
                });
            }
            (new_staked, v.delegated)
        } else {
            if !v.is_enabled() {
                return Err(StakingError::ValidatorDisabled(id));
            }
            let new_delegated = v.delegated.checked_add(amount).ok_or(StakingError::Overflow)?;
            let cap = v
                .staked
                .checked_mul(self.params.max_cap_multiplier)
                .ok_or(StakingError::Overflow)?;
            if new_delegated > cap {
                return Err(StakingError::DelegationCapExceeded { cap, resulting: new_delegated });
            }
            (v.staked, new_delegated)
        };

        self.custody.transfer_in(caller, amount)?;

        let v = self.validator_mut(id)?;
        v.staked = new_staked;
        v.delegated = new_delegated;
        v.positions.entry(*caller).or_default().staked = new_position;

        info!(validator_id = id, account = %caller, amount, owner = is_owner, "staked");
        Ok(Event::Staked { validator_id: id, account: *caller, amount })
    }

    // ============================================================
    // UNSTAKE
    // ============================================================

    /// Move `amount` of `caller`'s stake into the unstaking queue.
    ///
    /// The entry unlocks at `block + cooldown`, where cooldown is the
    /// validator cooldown for the owner and the delegator cooldown for
    /// everyone else. Disabled validators skip the max-cap check so owners
    /// can exit.
    pub fn unstake(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        amount: Amount,
        block: u64,
    ) -> Result<Event, StakingError> {
        let v = self.validator_ref(id)?;
        let position = v.position(caller);
        let staked = position.map(|p| p.staked).unwrap_or(0);
        if staked < amount {
            return Err(StakingError::InsufficientStaked { staked, requested: amount });
        }
        if amount < REWARD_REDEEM_THRESHOLD {
            return Err(StakingError::AmountTooSmall { amount, minimum: REWARD_REDEEM_THRESHOLD });
        }

        let is_owner = *caller == v.owner;
        let (new_staked, new_delegated) = if is_owner {
            let remaining = v.staked.checked_sub(amount).ok_or(StakingError::Overflow)?;
            if v.is_enabled() {
                let cap = remaining
                    .checked_mul(self.params.max_cap_multiplier)
                    .ok_or(StakingError::Overflow)?;
                if v.delegated > cap {
                    return Err(StakingError::CapViolation { delegated: v.delegated, cap });
                }
            }
            (remaining, v.delegated)
        } else {
            (v.staked, v.delegated.checked_sub(amount).ok_or(StakingError::Overflow)?)
        };

        if position.map(|p| p.live_unstakings()).unwrap_or(0) >= MAX_UNSTAKINGS {
            return Err(StakingError::TooManyUnstakings { limit: MAX_UNSTAKINGS });
        }
        let cooldown = if is_owner {
            self.params.validator_cooldown
        } else {
            self.params.delegator_cooldown
        };
        let end_epoch = block.checked_add(cooldown).ok_or(StakingError::Overflow)?;

        // All checks passed, apply.
        let v = self.validator_mut(id)?;
        v.staked = new_staked;
        v.delegated = new_delegated;
        let p = v.positions.entry(*caller).or_default();
        p.staked -= amount;
        let unstake_id = p.push_unstaking(Unstaking { amount, end_epoch });

        info!(validator_id = id, account = %caller, amount, end_epoch, "unstaked");
        debug!(unstake_id, remaining = p.staked, "unstaking queued");
        Ok(Event::Unstaked { validator_id: id, account: *caller, amount, unstake_id, end_epoch })
    }
}
