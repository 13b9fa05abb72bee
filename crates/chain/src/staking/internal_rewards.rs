//! Reward pool, reward distribution and redemption.
//!
//! ## Distribution
//!
//! For each `(id, amount)` in a batch:
//!
//! ```text
//! commission = amount * commission_rate / 10^18
//! net        = amount - commission
//! share_i    = net * weight_i / Σ weight        weight_i = staked_i + rewards_i
//! dust       = net - Σ share_i                  → owner position
//! ```
//!
//! Rewards already credited count toward the weight, so they compound.
//! The pool is debited by exactly `amount`.

use std::collections::BTreeMap;

use proofchain_common::math::{apply_rate, mul_div};
use proofchain_common::{Address, Amount, Event, ValidatorId};
use tracing::{debug, info, warn};

use super::{StakingLedger, Validator, REWARD_REDEEM_THRESHOLD};
use crate::custody::Custody;
use crate::error::StakingError;

impl<C: Custody> StakingLedger<C> {
    // ============================================================
    // REWARD POOL
    // ============================================================

    /// Fund the reward pool from `caller`.
    pub fn deposit_reward_tokens(&mut self, caller: &Address, amount: Amount) -> Result<Event, StakingError> {
        if amount == 0 {
            return Err(StakingError::AmountZero);
        }
        let new_pool = self.reward_pool.checked_add(amount).ok_or(StakingError::Overflow)?;
        self.custody.transfer_in(caller, amount)?;
        self.reward_pool = new_pool;

        info!(amount, pool = new_pool, "reward tokens deposited");
        Ok(Event::RewardTokensDeposited { amount })
    }

    /// Governance withdrawal of unallocated reward tokens.
    pub fn take_out_reward_tokens(&mut self, caller: &Address, amount: Amount) -> Result<Event, StakingError> {
        self.ensure_governance(caller)?;
        if amount == 0 {
            return Err(StakingError::AmountZero);
        }
        if amount > self.reward_pool {
            return Err(StakingError::InsufficientRewardPool { pool: self.reward_pool, requested: amount });
        }
        self.custody.transfer_out(caller, amount)?;
        self.reward_pool -= amount;

        info!(amount, pool = self.reward_pool, "allocated tokens taken");
        Ok(Event::AllocatedTokensTaken { amount })
    }

    // ============================================================
    // REWARD DISTRIBUTION
    // ============================================================

    /// Credit a batch of rewards. Staking manager only.
    ///
    /// Zero-stake validators and entries the pool cannot cover are skipped
    /// with a `RewardFailedDueZeroStake` / `RewardFailedDueLowPool` event;
    /// the rest of the batch still applies. Unknown ids and overflow abort
    /// the whole batch.
    pub fn reward_validators(
        &mut self,
        caller: &Address,
        ids: &[ValidatorId],
        amounts: &[Amount],
    ) -> Result<Vec<Event>, StakingError> {
        self.ensure_staking_manager(caller)?;
        if ids.len() != amounts.len() {
            return Err(StakingError::LengthMismatch { ids: ids.len(), amounts: amounts.len() });
        }

        // Work on copies of the touched validators so a late failure leaves
        // the ledger untouched.
        let mut staged: BTreeMap<ValidatorId, Validator> = BTreeMap::new();
        let mut pool = self.reward_pool;
        let mut events = Vec::with_capacity(ids.len());

        for (&id, &amount) in ids.iter().zip(amounts) {
            if !staged.contains_key(&id) {
                staged.insert(id, self.validator_ref(id)?.clone());
            }
            let v = staged.get_mut(&id).ok_or(StakingError::InvalidValidator(id))?;

            if v.total_stake().ok_or(StakingError::Overflow)? == 0 {
                warn!(validator_id = id, amount, "reward failed: zero stake");
                events.push(Event::RewardFailedDueZeroStake { validator_id: id, amount });
                continue;
            }
            if pool < amount {
                warn!(validator_id = id, amount, pool, "reward failed: low pool");
                events.push(Event::RewardFailedDueLowPool { validator_id: id, amount });
                continue;
            }

            let (net, commission) = credit_reward(v, amount)?;
            pool -= amount;

            debug!(validator_id = id, net, commission, "validator rewarded");
            events.push(Event::Rewarded { validator_id: id, amount: net, commission });
        }

        for (id, v) in staged {
            *self.validator_mut(id)? = v;
        }
        self.reward_pool = pool;

        Ok(events)
    }

    // ============================================================
    // REDEMPTION
    // ============================================================

    /// Pay out accrued rewards (and, for the owner, commission) to
    /// `beneficiary`. Commission is consumed first.
    ///
    /// ## Errors
    ///
    /// `AmountZero`, `InvalidValidator`, `InvalidAddress` (zero
    /// beneficiary), `BelowRedeemThreshold`, `AmountTooHigh`.
    pub fn redeem_rewards(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        beneficiary: &Address,
        amount: Amount,
    ) -> Result<Vec<Event>, StakingError> {
        if amount == 0 {
            return Err(StakingError::AmountZero);
        }
        let v = self.validator_ref(id)?;
        if beneficiary.is_zero() {
            return Err(StakingError::InvalidAddress);
        }
        if amount < REWARD_REDEEM_THRESHOLD {
            return Err(StakingError::BelowRedeemThreshold { amount, minimum: REWARD_REDEEM_THRESHOLD });
        }

        let (rewards, commission) = v
            .position(caller)
            .map(|p| (p.rewards, p.commission_earned))
            .unwrap_or((0, 0));
        let available = rewards.checked_add(commission).ok_or(StakingError::Overflow)?;
        if amount > available {
            return Err(StakingError::AmountTooHigh { requested: amount, available });
        }
        let from_commission = amount.min(commission);
        let from_rewards = amount - from_commission;

        self.custody.transfer_out(beneficiary, amount)?;

        let v = self.validator_mut(id)?;
        if let Some(p) = v.positions.get_mut(caller) {
            p.commission_earned -= from_commission;
            p.rewards -= from_rewards;
        }

        let mut events = Vec::new();
        if from_commission > 0 {
            events.push(Event::CommissionRewardRedeemed {
                validator_id: id,
                beneficiary: *beneficiary,
                amount: from_commission,
            });
        }
        if from_rewards > 0 {
            events.push(Event::RewardRedeemed { validator_id: id, beneficiary: *beneficiary, amount: from_rewards });
        }

        info!(validator_id = id, account = %caller, %beneficiary, amount, "rewards redeemed");
        Ok(events)
    }
}

/// Split `amount` into commission and net reward and credit both to the
/// validator's positions. Returns `(net, commission)`.
fn credit_reward(v: &mut Validator, amount: Amount) -> Result<(Amount, Amount), StakingError> {
    let commission = apply_rate(amount, v.commission_rate).ok_or(StakingError::Overflow)?;
    let net = amount - commission;

    let total_weight = v
        .positions
        .values()
        .try_fold(0u128, |acc, p| acc.checked_add(p.reward_weight()?))
        .ok_or(StakingError::Overflow)?;

    let mut credited: Amount = 0;
    if total_weight > 0 {
        for p in v.positions.values_mut() {
            let weight = p.reward_weight().ok_or(StakingError::Overflow)?;
            let share = mul_div(net, weight, total_weight).ok_or(StakingError::Overflow)?;
            p.rewards = p.rewards.checked_add(share).ok_or(StakingError::Overflow)?;
            credited += share;
        }
    }

    let owner = v.positions.entry(v.owner).or_default();
    owner.rewards = owner.rewards.checked_add(net - credited).ok_or(StakingError::Overflow)?;
    owner.commission_earned = owner.commission_earned.checked_add(commission).ok_or(StakingError::Overflow)?;

    Ok((net, commission))
}
