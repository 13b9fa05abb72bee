//! # Staking Ledger
//!
//! Per-validator and per-(validator, account) balances, unstaking queues,
//! the reward pool and commission accounting.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────────────────────────────┐
//!                  │          StakingLedger<C>            │
//!                  │                                      │
//!  stake ────────► │  validators: Vec<Validator>          │ ──► Custody::transfer_in
//!  unstake ──────► │    └─ positions: account → Position  │
//!  transfer_out ─► │         ├─ staked / rewards          │ ──► Custody::transfer_out
//!  rewards ──────► │         ├─ commission_earned         │
//!                  │         └─ unstakings (≤ 300 live)   │
//!                  │  reward_pool                         │
//!                  └──────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Operations |
//! |--------|------------|
//! | `internal_validators` | `add_validator`, `enable_validator`, `disable_validator`, `set_validator_commission_rate` |
//! | `internal_stake` | `stake`, `unstake` |
//! | `internal_unstake_queue` | `transfer_unstaked_out`, unstaking slot management |
//! | `internal_rewards` | `reward_validators`, `redeem_rewards`, `deposit_reward_tokens`, `take_out_reward_tokens` |
//! | `internal_identity` | `set_validator_identity` |
//! | `internal_params` | cap, cooldown and staking-manager setters |
//! | `interface` | `StakingInterface`, the view the operator registry and quorum engine use |
//!
//! ## Invariants
//!
//! After every successful mutating call:
//!
//! 1. For each validator, `staked` equals the owner position's staked amount
//!    and `delegated` equals the sum over all other positions.
//! 2. `custody.balance_of(vault) == Σ staked + Σ pending unstakings +
//!    reward_pool + Σ unredeemed rewards + Σ unredeemed commission`.
//! 3. An unstaking entry keeps its index and `end_epoch` for life; only its
//!    amount shrinks on withdrawal. Drained entries stay in place at zero.
//!
//! ## Atomicity
//!
//! Every operation validates and computes new values before touching
//! state. The custody call is the last fallible step; state is written
//! only after it succeeds.

use std::collections::BTreeMap;

use proofchain_common::config::StakingConfig;
use proofchain_common::{Address, Amount, ValidatorId};
use serde::{Deserialize, Serialize};

use crate::custody::Custody;
use crate::error::StakingError;

mod interface;
mod internal_identity;
mod internal_params;
mod internal_rewards;
mod internal_stake;
mod internal_unstake_queue;
mod internal_validators;


pub use interface::StakingInterface;

// ════════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ════════════════════════════════════════════════════════════════════════════════

/// Smallest unstake or reward redemption (10^8 units).
pub const REWARD_REDEEM_THRESHOLD: Amount = 100_000_000;

/// Live unstaking entries a single position may hold.
pub const MAX_UNSTAKINGS: usize = 300;

// ════════════════════════════════════════════════════════════════════════════════
// MODEL
// ════════════════════════════════════════════════════════════════════════════════

/// A pending withdrawal. `end_epoch` is fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unstaking {
    pub amount: Amount,
    pub end_epoch: u64,
}

/// Balance of one account against one validator.
///
/// The unstaking queue is append-only: an index names the same entry for
/// the life of the position, and a drained entry stays behind with a zero
/// amount.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub staked: Amount,
    pub rewards: Amount,
    /// Only ever non-zero on the owner's position.
    pub commission_earned: Amount,
    unstakings: Vec<Unstaking>,
}

impl Position {
    /// Iterate live (non-zero) unstakings with their index.
    pub fn unstakings(&self) -> impl Iterator<Item = (usize, &Unstaking)> {
        self.unstakings.iter().enumerate().filter(|(_, u)| u.amount > 0)
    }

    /// Entry at `index`, drained ones included.
    pub fn unstaking(&self, index: usize) -> Option<&Unstaking> {
        self.unstakings.get(index)
    }

    pub fn live_unstakings(&self) -> usize {
        self.unstakings.iter().filter(|u| u.amount > 0).count()
    }

    /// Sum of amounts still waiting in the unstaking queue.
    pub fn pending_unstaked(&self) -> Option<Amount> {
        self.unstakings()
            .try_fold(0u128, |acc, (_, u)| acc.checked_add(u.amount))
    }

    /// Weight used for proportional reward credit.
    pub(crate) fn reward_weight(&self) -> Option<Amount> {
        self.staked.checked_add(self.rewards)
    }

    /// True when nothing is held: no stake, no rewards, no commission and
    /// no pending unstakings.
    pub fn is_empty(&self) -> bool {
        self.staked == 0
            && self.rewards == 0
            && self.commission_earned == 0
            && self.live_unstakings() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    pub owner: Address,
    /// 10^18-scaled share of each reward kept as commission.
    pub commission_rate: u128,
    /// Owner's own stake.
    pub staked: Amount,
    /// Sum of all non-owner stake.
    pub delegated: Amount,
    /// `None` while enabled.
    pub disabled_at_block: Option<u64>,
    positions: BTreeMap<Address, Position>,
}

impl Validator {
    pub fn is_enabled(&self) -> bool {
        self.disabled_at_block.is_none()
    }

    /// Self-stake plus delegated stake.
    pub fn total_stake(&self) -> Option<Amount> {
        self.staked.checked_add(self.delegated)
    }

    pub fn position(&self, account: &Address) -> Option<&Position> {
        self.positions.get(account)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&Address, &Position)> {
        self.positions.iter()
    }
}

/// Ledger parameters adjustable by governance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    pub delegator_cooldown: u64,
    pub validator_cooldown: u64,
    pub max_cap_multiplier: u128,
    pub validator_max_stake: Amount,
}

impl From<&StakingConfig> for LedgerParams {
    fn from(cfg: &StakingConfig) -> Self {
        LedgerParams {
            delegator_cooldown: cfg.delegator_cooldown,
            validator_cooldown: cfg.validator_cooldown,
            max_cap_multiplier: cfg.max_cap_multiplier,
            validator_max_stake: cfg.validator_max_stake,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// SNAPSHOTS
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorMetadata {
    pub id: ValidatorId,
    pub owner: Address,
    pub commission_rate: u128,
    pub staked: Amount,
    pub delegated: Amount,
    pub disabled_at_block: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorMetadata {
    pub validator_id: ValidatorId,
    pub account: Address,
    pub staked: Amount,
    pub rewards: Amount,
    pub commission_earned: Amount,
    /// `(slot index, entry)` for each live unstaking.
    pub unstakings: Vec<(usize, Unstaking)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMetadata {
    pub vault: Address,
    pub governance: Address,
    pub staking_manager: Address,
    pub params: LedgerParams,
    pub reward_pool: Amount,
    pub validators_count: u64,
}

// ════════════════════════════════════════════════════════════════════════════════
// LEDGER
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct StakingLedger<C: Custody> {
    custody: C,
    governance: Address,
    staking_manager: Address,
    params: LedgerParams,
    reward_pool: Amount,
    validators: Vec<Validator>,
}

impl<C: Custody> StakingLedger<C> {
    pub fn new(custody: C, governance: Address, staking_manager: Address, params: LedgerParams) -> Self {
        StakingLedger {
            custody,
            governance,
            staking_manager,
            params,
            reward_pool: 0,
            validators: Vec::new(),
        }
    }

    /// Build from the `[staking]` config section. Missing addresses
    /// default to the zero address.
    pub fn from_config(custody: C, cfg: &StakingConfig) -> Self {
        Self::new(
            custody,
            cfg.governance.unwrap_or_default(),
            cfg.staking_manager.unwrap_or_default(),
            LedgerParams::from(cfg),
        )
    }

    // ── access guards ───────────────────────────────────────────────────────

    pub(crate) fn ensure_governance(&self, caller: &Address) -> Result<(), StakingError> {
        if *caller != self.governance {
            return Err(StakingError::NotGovernance);
        }
        Ok(())
    }

    pub(crate) fn ensure_staking_manager(&self, caller: &Address) -> Result<(), StakingError> {
        if *caller != self.staking_manager {
            return Err(StakingError::NotStakingManager);
        }
        Ok(())
    }

    pub(crate) fn ensure_manager_or_governance(&self, caller: &Address) -> Result<(), StakingError> {
        if *caller != self.staking_manager && *caller != self.governance {
            return Err(StakingError::NotStakingManager);
        }
        Ok(())
    }

    pub(crate) fn validator_ref(&self, id: ValidatorId) -> Result<&Validator, StakingError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.validators.get(i))
            .ok_or(StakingError::InvalidValidator(id))
    }

    pub(crate) fn validator_mut(&mut self, id: ValidatorId) -> Result<&mut Validator, StakingError> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.validators.get_mut(i))
            .ok_or(StakingError::InvalidValidator(id))
    }

    // ════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ════════════════════════════════════════════════════════════════════════

    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Mutable custody handle, for funding accounts outside ledger flows.
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    pub fn governance(&self) -> Address {
        self.governance
    }

    pub fn staking_manager(&self) -> Address {
        self.staking_manager
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn reward_pool(&self) -> Amount {
        self.reward_pool
    }

    pub fn validators_count(&self) -> u64 {
        self.validators.len() as u64
    }

    pub fn validator(&self, id: ValidatorId) -> Option<&Validator> {
        self.validator_ref(id).ok()
    }

    pub fn validator_metadata(&self, id: ValidatorId) -> Result<ValidatorMetadata, StakingError> {
        let v = self.validator_ref(id)?;
        Ok(ValidatorMetadata {
            id: v.id,
            owner: v.owner,
            commission_rate: v.commission_rate,
            staked: v.staked,
            delegated: v.delegated,
            disabled_at_block: v.disabled_at_block,
        })
    }

    pub fn all_validators_metadata(&self) -> Vec<ValidatorMetadata> {
        self.validators
            .iter()
            .map(|v| ValidatorMetadata {
                id: v.id,
                owner: v.owner,
                commission_rate: v.commission_rate,
                staked: v.staked,
                delegated: v.delegated,
                disabled_at_block: v.disabled_at_block,
            })
            .collect()
    }

    /// Snapshot of one account's position. Unknown accounts yield an empty
    /// position; unknown validators are an error.
    pub fn delegator_metadata(&self, id: ValidatorId, account: &Address) -> Result<DelegatorMetadata, StakingError> {
        let v = self.validator_ref(id)?;
        let empty = Position::default();
        let p = v.positions.get(account).unwrap_or(&empty);
        Ok(DelegatorMetadata {
            validator_id: id,
            account: *account,
            staked: p.staked,
            rewards: p.rewards,
            commission_earned: p.commission_earned,
            unstakings: p.unstakings().map(|(i, u)| (i, *u)).collect(),
        })
    }

    pub fn metadata(&self) -> LedgerMetadata {
        LedgerMetadata {
            vault: self.custody.vault(),
            governance: self.governance,
            staking_manager: self.staking_manager,
            params: self.params.clone(),
            reward_pool: self.reward_pool,
            validators_count: self.validators_count(),
        }
    }

    /// Everything the ledger owes: stake, pending unstakings, the reward
    /// pool, unredeemed rewards and commission. Equals the vault balance.
    pub fn total_locked(&self) -> Option<Amount> {
        let mut total = self.reward_pool;
        for v in &self.validators {
            for p in v.positions.values() {
                total = total
                    .checked_add(p.staked)?
                    .checked_add(p.rewards)?
                    .checked_add(p.commission_earned)?
                    .checked_add(p.pending_unstaked()?)?;
            }
        }
        Some(total)
    }
}
