//! # Round Reward Math
//!
//! Splits a round's reward across the validators behind the winning
//! submissions, proportionally to their stake at call time, then pays the
//! shares through the ledger's commission split.
//!
//! ## Invariant
//!
//! ```text
//! total_distributed + remainder == total_reward
//! ```
//!
//! Each share truncates toward zero, so the remainder is at most the
//! number of winners minus one (plus the full amount when no winner has
//! stake). The remainder is never taken from the reward pool.

use proofchain_chain::StakingInterface;
use proofchain_common::math::mul_div;
use proofchain_common::{Address, Amount, Event, ValidatorId};
use tracing::debug;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardShares {
    /// One entry per winner with a non-zero share, in input order.
    pub shares: Vec<(ValidatorId, Amount)>,
    pub total_distributed: Amount,
    pub remainder: Amount,
}

/// Compute `total_reward * stake_i / Σ stake` for each `(validator, stake)`.
pub fn compute_reward_shares(
    winners: &[(ValidatorId, Amount)],
    total_reward: Amount,
) -> Result<RewardShares, EngineError> {
    let total_stake = winners
        .iter()
        .try_fold(0u128, |acc, (_, s)| acc.checked_add(*s))
        .ok_or(EngineError::Overflow)?;

    if total_stake == 0 {
        return Ok(RewardShares { shares: Vec::new(), total_distributed: 0, remainder: total_reward });
    }

    let mut shares = Vec::with_capacity(winners.len());
    let mut total_distributed: Amount = 0;
    for &(id, stake) in winners {
        let share = mul_div(total_reward, stake, total_stake).ok_or(EngineError::Overflow)?;
        if share == 0 {
            continue;
        }
        total_distributed = total_distributed.checked_add(share).ok_or(EngineError::Overflow)?;
        shares.push((id, share));
    }

    Ok(RewardShares {
        shares,
        total_distributed,
        remainder: total_reward - total_distributed,
    })
}

/// Compute shares and credit them in one `reward_validators` batch.
/// Returns the ledger's events (including soft failures).
pub fn pay_round_reward<S: StakingInterface + ?Sized>(
    staking: &mut S,
    caller: &Address,
    winners: &[(ValidatorId, Amount)],
    total_reward: Amount,
) -> Result<Vec<Event>, EngineError> {
    let split = compute_reward_shares(winners, total_reward)?;
    if split.shares.is_empty() {
        return Ok(Vec::new());
    }
    let (ids, amounts): (Vec<ValidatorId>, Vec<Amount>) = split.shares.iter().copied().unzip();

    debug!(
        winners = winners.len(),
        distributed = split.total_distributed,
        remainder = split.remainder,
        "paying round reward"
    );
    Ok(staking.reward_validators(caller, &ids, &amounts)?)
}
