//! Engine-wide parameters.

use proofchain_common::config::EngineConfig;
use proofchain_common::{Amount, RoundKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Blocks a session accepts submissions for, counted from its first one.
    pub session_duration: u64,
    /// 10^18-scaled fraction of eligible stake the leading pair needs.
    pub quorum_threshold: u128,
    pub min_submissions_required: u64,
    /// Block time of the host chain.
    pub seconds_per_block: u64,
    pub block_specimen_reward: Amount,
    pub block_result_reward: Amount,
}

impl EngineParams {
    /// Total reward paid out for one resolved session of `kind`.
    pub fn reward_for(&self, kind: RoundKind) -> Amount {
        match kind {
            RoundKind::Specimen => self.block_specimen_reward,
            RoundKind::Result => self.block_result_reward,
        }
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineParams {
    fn from(cfg: &EngineConfig) -> Self {
        EngineParams {
            session_duration: cfg.session_duration,
            quorum_threshold: cfg.quorum_threshold,
            min_submissions_required: cfg.min_submissions_required,
            seconds_per_block: cfg.seconds_per_block,
            block_specimen_reward: cfg.block_specimen_reward,
            block_result_reward: cfg.block_result_reward,
        }
    }
}
