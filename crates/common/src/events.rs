//! # Emitted Events
//!
//! One variant per observable state transition. Every variant carries the
//! identifying keys (validator id, operator account, chain id, block height,
//! amounts) an indexer needs to rebuild history without replaying state.
//!
//! | Source | Variants |
//! |--------|----------|
//! | Validators | `ValidatorAdded`, `ValidatorEnabled`, `ValidatorDisabled`, `ValidatorAddressChanged`, `ValidatorCommissionRateChanged` |
//! | Stake | `Staked`, `Unstaked`, `UnstakeRedeemed` |
//! | Rewards | `Rewarded`, `RewardFailedDueLowPool`, `RewardFailedDueZeroStake`, `RewardRedeemed`, `CommissionRewardRedeemed`, `RewardTokensDeposited`, `AllocatedTokensTaken` |
//! | Ledger parameters | `ValidatorMaxCapChanged`, `MaxCapMultiplierChanged`, `ValidatorCooldownChanged`, `DelegatorCooldownChanged`, `StakingManagerAddressChanged` |
//! | Operators | `OperatorAdded`, `OperatorEnabled`, `OperatorDisabled`, `OperatorRemoved`, `AuditorAdded`, `AuditorRemoved`, `RequiredStakeChanged` |
//! | Sessions | `ProofSubmitted`, `QuorumNotReached`, `RewardAwarded` |
//! | Engine parameters | `SessionDurationChanged` .. `LiveSyncPolicyChanged` |
//!
//! Events are produced only after an operation has fully succeeded, so a
//! failed call never leaves a partial trail.

use serde::{Deserialize, Serialize};

use crate::types::{
    Address, Amount, BlockHeight, ChainId, Hash32, LiveSyncPolicy, OperatorRole, RoundKind,
    ValidatorId,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    // ── validators ──────────────────────────────────────────────────────────
    ValidatorAdded { validator_id: ValidatorId, commission_rate: u128, owner: Address },
    ValidatorEnabled { validator_id: ValidatorId },
    ValidatorDisabled { validator_id: ValidatorId, block: u64 },
    ValidatorAddressChanged { validator_id: ValidatorId, old_owner: Address, new_owner: Address },
    ValidatorCommissionRateChanged { validator_id: ValidatorId, commission_rate: u128 },

    // ── stake ───────────────────────────────────────────────────────────────
    Staked { validator_id: ValidatorId, account: Address, amount: Amount },
    Unstaked { validator_id: ValidatorId, account: Address, amount: Amount, unstake_id: usize, end_epoch: u64 },
    UnstakeRedeemed { validator_id: ValidatorId, account: Address, unstake_id: usize, amount: Amount },

    // ── rewards ─────────────────────────────────────────────────────────────
    Rewarded { validator_id: ValidatorId, amount: Amount, commission: Amount },
    RewardFailedDueLowPool { validator_id: ValidatorId, amount: Amount },
    RewardFailedDueZeroStake { validator_id: ValidatorId, amount: Amount },
    RewardRedeemed { validator_id: ValidatorId, beneficiary: Address, amount: Amount },
    CommissionRewardRedeemed { validator_id: ValidatorId, beneficiary: Address, amount: Amount },
    RewardTokensDeposited { amount: Amount },
    AllocatedTokensTaken { amount: Amount },

    // ── ledger parameters ───────────────────────────────────────────────────
    ValidatorMaxCapChanged { amount: Amount },
    MaxCapMultiplierChanged { multiplier: u128 },
    ValidatorCooldownChanged { blocks: u64 },
    DelegatorCooldownChanged { blocks: u64 },
    StakingManagerAddressChanged { address: Address },

    // ── operators ───────────────────────────────────────────────────────────
    OperatorAdded { operator: Address, validator_id: ValidatorId, role: OperatorRole },
    OperatorEnabled { operator: Address, validator_id: ValidatorId, role: OperatorRole },
    OperatorDisabled { operator: Address, validator_id: ValidatorId, role: OperatorRole },
    OperatorRemoved { operator: Address, validator_id: ValidatorId, role: OperatorRole },
    AuditorAdded { auditor: Address },
    AuditorRemoved { auditor: Address },
    RequiredStakeChanged { role: OperatorRole, amount: Amount },

    // ── sessions ────────────────────────────────────────────────────────────
    ProofSubmitted {
        kind: RoundKind,
        chain_id: ChainId,
        block_height: BlockHeight,
        primary_hash: Hash32,
        secondary_hash: Hash32,
        storage_locator: String,
        operator: Address,
        validator_id: ValidatorId,
        stake: Amount,
    },
    QuorumNotReached { kind: RoundKind, chain_id: ChainId, block_height: BlockHeight },
    RewardAwarded {
        kind: RoundKind,
        chain_id: ChainId,
        block_height: BlockHeight,
        primary_hash: Hash32,
        secondary_hash: Hash32,
    },

    // ── engine parameters ───────────────────────────────────────────────────
    SessionDurationChanged { blocks: u64 },
    QuorumThresholdChanged { threshold: u128 },
    MinimumRequiredSubmissionsChanged { count: u64 },
    RewardAllocationChanged { kind: RoundKind, amount: Amount },
    SecondsPerBlockChanged { seconds: u64 },
    NthBlockChanged { chain_id: ChainId, nth_block: u64 },
    MaxSubmissionsPerBlockHeightChanged { chain_id: ChainId, max: u64 },
    ChainSyncDataChanged {
        chain_id: ChainId,
        block_on_target_chain: u64,
        block_on_current_chain: u64,
        seconds_per_block: u64,
    },
    BlockHeightSubmissionThresholdChanged { chain_id: ChainId, threshold: u64 },
    LiveSyncPolicyChanged { chain_id: ChainId, policy: LiveSyncPolicy },
}

impl Event {
    /// Short machine name, used as the log target field.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ValidatorAdded { .. } => "validator_added",
            Event::ValidatorEnabled { .. } => "validator_enabled",
            Event::ValidatorDisabled { .. } => "validator_disabled",
            Event::ValidatorAddressChanged { .. } => "validator_address_changed",
            Event::ValidatorCommissionRateChanged { .. } => "validator_commission_rate_changed",
            Event::Staked { .. } => "staked",
            Event::Unstaked { .. } => "unstaked",
            Event::UnstakeRedeemed { .. } => "unstake_redeemed",
            Event::Rewarded { .. } => "rewarded",
            Event::RewardFailedDueLowPool { .. } => "reward_failed_due_low_pool",
            Event::RewardFailedDueZeroStake { .. } => "reward_failed_due_zero_stake",
            Event::RewardRedeemed { .. } => "reward_redeemed",
            Event::CommissionRewardRedeemed { .. } => "commission_reward_redeemed",
            Event::RewardTokensDeposited { .. } => "reward_tokens_deposited",
            Event::AllocatedTokensTaken { .. } => "allocated_tokens_taken",
            Event::ValidatorMaxCapChanged { .. } => "validator_max_cap_changed",
            Event::MaxCapMultiplierChanged { .. } => "max_cap_multiplier_changed",
            Event::ValidatorCooldownChanged { .. } => "validator_cooldown_changed",
            Event::DelegatorCooldownChanged { .. } => "delegator_cooldown_changed",
            Event::StakingManagerAddressChanged { .. } => "staking_manager_address_changed",
            Event::OperatorAdded { .. } => "operator_added",
            Event::OperatorEnabled { .. } => "operator_enabled",
            Event::OperatorDisabled { .. } => "operator_disabled",
            Event::OperatorRemoved { .. } => "operator_removed",
            Event::AuditorAdded { .. } => "auditor_added",
            Event::AuditorRemoved { .. } => "auditor_removed",
            Event::RequiredStakeChanged { .. } => "required_stake_changed",
            Event::ProofSubmitted { .. } => "proof_submitted",
            Event::QuorumNotReached { .. } => "quorum_not_reached",
            Event::RewardAwarded { .. } => "reward_awarded",
            Event::SessionDurationChanged { .. } => "session_duration_changed",
            Event::QuorumThresholdChanged { .. } => "quorum_threshold_changed",
            Event::MinimumRequiredSubmissionsChanged { .. } => "minimum_required_submissions_changed",
            Event::RewardAllocationChanged { .. } => "reward_allocation_changed",
            Event::SecondsPerBlockChanged { .. } => "seconds_per_block_changed",
            Event::NthBlockChanged { .. } => "nth_block_changed",
            Event::MaxSubmissionsPerBlockHeightChanged { .. } => "max_submissions_per_block_height_changed",
            Event::ChainSyncDataChanged { .. } => "chain_sync_data_changed",
            Event::BlockHeightSubmissionThresholdChanged { .. } => "block_height_submission_threshold_changed",
            Event::LiveSyncPolicyChanged { .. } => "live_sync_policy_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_tag() {
        let ev = Event::Staked {
            validator_id: 3,
            account: Address::from_bytes([7; 20]),
            amount: 42,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "staked");
        assert_eq!(json["validator_id"], 3);
        assert_eq!(ev.name(), "staked");
    }
}
