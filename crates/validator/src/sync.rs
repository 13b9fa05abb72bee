//! # Chain Sync Records
//!
//! Per-chain data used to decide whether a claimed block height is
//! plausible for the current host block.
//!
//! ## Live-Sync Window
//!
//! ```text
//! elapsed  = current_block - block_on_current_chain          (saturating)
//! expected = block_on_target_chain + elapsed * host_secs / target_secs
//! valid   ⇔ expected - allowed_threshold ≤ height ≤ expected + allowed_threshold
//! ```
//!
//! Independently of the window, the height must be a positive multiple
//! of `nth_block`.

use proofchain_common::config::ChainConfig;
use proofchain_common::math::mul_div;
use proofchain_common::{BlockHeight, ChainId, LiveSyncPolicy};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSync {
    pub chain_id: ChainId,
    /// Only every n-th block of the target chain is proven. 0 disables the chain.
    pub nth_block: u64,
    pub block_on_target_chain: u64,
    pub block_on_current_chain: u64,
    /// Block time of the target chain.
    pub seconds_per_block: u64,
    pub allowed_threshold: u64,
    /// Distinct hash pairs a single session may hold.
    pub max_submissions_per_block_height: u64,
    pub live_sync: LiveSyncPolicy,
}

impl From<&ChainConfig> for ChainSync {
    fn from(cfg: &ChainConfig) -> Self {
        ChainSync {
            chain_id: cfg.chain_id,
            nth_block: cfg.nth_block,
            block_on_target_chain: cfg.block_on_target_chain,
            block_on_current_chain: cfg.block_on_current_chain,
            seconds_per_block: cfg.seconds_per_block,
            allowed_threshold: cfg.allowed_threshold,
            max_submissions_per_block_height: cfg.max_submissions_per_block_height,
            live_sync: cfg.live_sync,
        }
    }
}

impl ChainSync {
    /// A record with no sync anchor yet; everything else zero.
    pub fn empty(chain_id: ChainId) -> Self {
        ChainSync {
            chain_id,
            nth_block: 0,
            block_on_target_chain: 0,
            block_on_current_chain: 0,
            seconds_per_block: 0,
            allowed_threshold: 0,
            max_submissions_per_block_height: 0,
            live_sync: LiveSyncPolicy::default(),
        }
    }

    /// Target-chain height implied by `current_block` on the host chain.
    pub fn expected_height(&self, current_block: u64, host_seconds_per_block: u64) -> Option<u64> {
        let elapsed = current_block.saturating_sub(self.block_on_current_chain);
        let advanced = mul_div(
            u128::from(elapsed),
            u128::from(host_seconds_per_block),
            u128::from(self.seconds_per_block),
        )?;
        u64::try_from(advanced).ok()?.checked_add(self.block_on_target_chain)
    }

    /// Validate a claimed `height`.
    ///
    /// `opens_session` is true for the submission that creates the session;
    /// under [`LiveSyncPolicy::FirstSubmission`] only that one is checked
    /// against the live-sync window.
    pub fn check_height(
        &self,
        height: BlockHeight,
        current_block: u64,
        host_seconds_per_block: u64,
        opens_session: bool,
    ) -> Result<(), EngineError> {
        if self.nth_block == 0 {
            return Err(EngineError::InvalidChainId(self.chain_id));
        }
        if height == 0 || height % self.nth_block != 0 {
            return Err(EngineError::InvalidBlockHeight {
                chain_id: self.chain_id,
                height,
                reason: "not a positive multiple of nth block",
            });
        }

        let check_window = match self.live_sync {
            LiveSyncPolicy::FirstSubmission => opens_session,
            LiveSyncPolicy::EverySubmission => true,
        };
        if !check_window {
            return Ok(());
        }

        let expected = self
            .expected_height(current_block, host_seconds_per_block)
            .ok_or(EngineError::InvalidChainId(self.chain_id))?;
        let low = expected.saturating_sub(self.allowed_threshold);
        let high = expected.saturating_add(self.allowed_threshold);
        if height < low || height > high {
            return Err(EngineError::InvalidBlockHeight {
                chain_id: self.chain_id,
                height,
                reason: "out of bounds for live sync",
            });
        }
        Ok(())
    }
}
