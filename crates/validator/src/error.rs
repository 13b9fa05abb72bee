//! Engine error type.
//!
//! | Category | Variants |
//! |----------|----------|
//! | Permission | `NotGovernance`, `NotAuditor`, `Unauthorized` |
//! | Chain sync | `InvalidChainId`, `InvalidBlockHeight` |
//! | Submission | `InsufficientStake`, `SessionClosed`, `DuplicateSubmission`, `MaxSubmissionsExceeded` |
//! | Session lifecycle | `SessionNotStarted`, `SessionNotPastDeadline`, `SessionCannotBeFinalized`, `SessionNotFinalizable` |
//! | Parameters | `InvalidParameter`, `Overflow` |
//! | Wrapped | `Staking`, `Registry` |

use proofchain_chain::{RegistryError, StakingError};
use proofchain_common::{Address, Amount, BlockHeight, ChainId, OperatorRole};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    // ════════════════════════════════════════════════════════════════════════
    // PERMISSION
    // ════════════════════════════════════════════════════════════════════════
    #[error("sender is not governance")]
    NotGovernance,

    #[error("sender is not an auditor")]
    NotAuditor,

    #[error("sender {caller} is not an enabled {role} operator")]
    Unauthorized { caller: Address, role: OperatorRole },

    // ════════════════════════════════════════════════════════════════════════
    // CHAIN SYNC
    // ════════════════════════════════════════════════════════════════════════
    #[error("invalid chain id {0}")]
    InvalidChainId(ChainId),

    #[error("block height {height} rejected for chain {chain_id}: {reason}")]
    InvalidBlockHeight { chain_id: ChainId, height: BlockHeight, reason: &'static str },

    // ════════════════════════════════════════════════════════════════════════
    // SUBMISSION
    // ════════════════════════════════════════════════════════════════════════
    #[error("insufficiently staked to submit: required {required}, actual {actual}")]
    InsufficientStake { required: Amount, actual: Amount },

    #[error("session submissions have closed")]
    SessionClosed,

    #[error("validator already submitted for this session")]
    DuplicateSubmission,

    #[error("max submissions per block height reached ({max})")]
    MaxSubmissionsExceeded { max: u64 },

    // ════════════════════════════════════════════════════════════════════════
    // SESSION LIFECYCLE
    // ════════════════════════════════════════════════════════════════════════
    #[error("session not started")]
    SessionNotStarted,

    #[error("session not past deadline (deadline {deadline}, current block {current})")]
    SessionNotPastDeadline { deadline: u64, current: u64 },

    #[error("session cannot be finalized")]
    SessionCannotBeFinalized,

    #[error("session must require audit before arbitration")]
    SessionNotFinalizable,

    // ════════════════════════════════════════════════════════════════════════
    // PARAMETERS
    // ════════════════════════════════════════════════════════════════════════
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("arithmetic overflow")]
    Overflow,

    #[error(transparent)]
    Staking(#[from] StakingError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
