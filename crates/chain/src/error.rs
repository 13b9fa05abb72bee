//! Error types for the staking ledger and the operator registry.
//!
//! Every variant is a hard failure: the operation that returned it made no
//! state change. Soft failures inside reward batches are reported as
//! events instead (see `StakingLedger::reward_validators`).

use proofchain_common::{Address, Amount, OperatorRole, ValidatorId};
use thiserror::Error;

use crate::custody::CustodyError;

// ════════════════════════════════════════════════════════════════════════════════
// STAKING ERROR
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    // ── permissions ─────────────────────────────────────────────────────────
    #[error("caller is not governance")]
    NotGovernance,

    #[error("caller is not the staking manager")]
    NotStakingManager,

    #[error("caller is not the validator owner")]
    NotValidator,

    // ── lookup ──────────────────────────────────────────────────────────────
    #[error("invalid validator id {0}")]
    InvalidValidator(ValidatorId),

    #[error("invalid address")]
    InvalidAddress,

    #[error("unstaking {index} does not exist")]
    NoSuchUnstaking { index: usize },

    // ── amounts ─────────────────────────────────────────────────────────────
    #[error("amount is 0")]
    AmountZero,

    #[error("unstake amount {amount} is below the minimum {minimum}")]
    AmountTooSmall { amount: Amount, minimum: Amount },

    #[error("requested amount {amount} must be higher than redeem threshold {minimum}")]
    BelowRedeemThreshold { amount: Amount, minimum: Amount },

    #[error("requested amount {requested} is too high, available {available}")]
    AmountTooHigh { requested: Amount, available: Amount },

    #[error("staked {staked} < amount provided {requested}")]
    InsufficientStaked { staked: Amount, requested: Amount },

    #[error("reward pool {pool} is smaller than requested {requested}")]
    InsufficientRewardPool { pool: Amount, requested: Amount },

    #[error("arithmetic overflow")]
    Overflow,

    // ── caps ────────────────────────────────────────────────────────────────
    #[error("validator max stake exceeded: cap {cap}, resulting {resulting}")]
    CapExceeded { cap: Amount, resulting: Amount },

    #[error("validator max delegation exceeded: cap {cap}, resulting {resulting}")]
    DelegationCapExceeded { cap: Amount, resulting: Amount },

    #[error("cannot unstake beyond max cap: delegated {delegated}, remaining cap {cap}")]
    CapViolation { delegated: Amount, cap: Amount },

    // ── validator state ─────────────────────────────────────────────────────
    #[error("validator {0} is disabled")]
    ValidatorDisabled(ValidatorId),

    #[error("validator {0} is already enabled")]
    AlreadyEnabled(ValidatorId),

    #[error("validator {0} is already disabled")]
    AlreadyDisabled(ValidatorId),

    #[error("invalid commission rate {0}")]
    InvalidCommissionRate(u128),

    // ── unstaking / identity ────────────────────────────────────────────────
    #[error("cooldown period has not ended: ends at {end_epoch}, current block {current}")]
    CooldownNotElapsed { end_epoch: u64, current: u64 },

    #[error("too many unstakings, limit {limit}")]
    TooManyUnstakings { limit: usize },

    #[error("cannot transfer validator address to a delegator")]
    CannotTransferToDelegator,

    #[error("given ids ({ids}) and amounts ({amounts}) must be of the same length")]
    LengthMismatch { ids: usize, amounts: usize },

    #[error("custody: {0}")]
    Custody(#[from] CustodyError),
}

// ════════════════════════════════════════════════════════════════════════════════
// REGISTRY ERROR
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("caller is not governance")]
    NotGovernance,

    #[error("caller is not the operator manager")]
    NotOperatorManager,

    #[error("{account} already holds role {existing}")]
    RoleConflict { account: Address, existing: String },

    #[error("operator {account} does not perform role {expected}")]
    WrongRole { account: Address, expected: OperatorRole },

    #[error("role {0} cannot be assigned to an operator")]
    InvalidRole(OperatorRole),

    #[error("operator {0} is already enabled")]
    AlreadyEnabled(Address),

    #[error("operator {0} is already disabled")]
    AlreadyDisabled(Address),

    #[error("validator {validator_id} already has an enabled {role} operator")]
    RoleSlotTaken { validator_id: ValidatorId, role: OperatorRole },

    #[error("insufficiently staked: required {required}, actual {actual}")]
    InsufficientStake { required: Amount, actual: Amount },

    #[error("unknown validator {0}")]
    UnknownValidator(ValidatorId),

    #[error("{0} is not an auditor")]
    UnknownAuditor(Address),

    #[error("invalid address")]
    InvalidAddress,

    #[error("staking: {0}")]
    Staking(#[from] StakingError),
}
