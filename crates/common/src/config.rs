//! TOML configuration for the ledger, the quorum engine and the
//! per-chain sync records.
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! [staking]
//! delegator_cooldown = 5
//! validator_cooldown = 10
//!
//! [engine]
//! session_duration = 240
//!
//! [[chains]]
//! chain_id = 1
//! nth_block = 5
//! ```

use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::math::{DIVIDER, ONE_TOKEN};
use crate::types::{Address, Amount, ChainId, LiveSyncPolicy};

// ════════════════════════════════════════════════════════════════════════════════
// DEFAULTS
// ════════════════════════════════════════════════════════════════════════════════

/// Blocks a delegator waits between unstake and withdrawal.
pub const DEFAULT_DELEGATOR_COOLDOWN: u64 = 5;

/// Blocks a validator owner waits between unstake and withdrawal.
pub const DEFAULT_VALIDATOR_COOLDOWN: u64 = 10;

/// Delegated stake may be at most this multiple of self-stake.
pub const DEFAULT_MAX_CAP_MULTIPLIER: u128 = 2;

/// 100,000 tokens (18 decimals).
pub const DEFAULT_VALIDATOR_MAX_STAKE: Amount = 100_000 * ONE_TOKEN;

pub const DEFAULT_SESSION_DURATION: u64 = 240;

/// 50% in 10^18 fixed point.
pub const DEFAULT_QUORUM_THRESHOLD: u128 = DIVIDER / 2;

pub const DEFAULT_MIN_SUBMISSIONS_REQUIRED: u64 = 2;

/// Host chain block time.
pub const DEFAULT_SECONDS_PER_BLOCK: u64 = 12;

/// 1 token per finalized round.
pub const DEFAULT_ROUND_REWARD: Amount = ONE_TOKEN;

/// 100 tokens per operator role.
pub const DEFAULT_REQUIRED_STAKE: Amount = 100 * ONE_TOKEN;

// ════════════════════════════════════════════════════════════════════════════════
// SECTIONS
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub staking: StakingConfig,
    pub engine: EngineConfig,
    pub chains: Vec<ChainConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StakingConfig {
    pub delegator_cooldown: u64,
    pub validator_cooldown: u64,
    pub max_cap_multiplier: u128,
    #[serde(deserialize_with = "de_amount")]
    pub validator_max_stake: Amount,
    /// Owner of the ledger parameters. Absent means the zero address.
    pub governance: Option<Address>,
    /// Caller allowed to reward and toggle validators.
    pub staking_manager: Option<Address>,
}

impl Default for StakingConfig {
    fn default() -> Self {
        StakingConfig {
            delegator_cooldown: DEFAULT_DELEGATOR_COOLDOWN,
            validator_cooldown: DEFAULT_VALIDATOR_COOLDOWN,
            max_cap_multiplier: DEFAULT_MAX_CAP_MULTIPLIER,
            validator_max_stake: DEFAULT_VALIDATOR_MAX_STAKE,
            governance: None,
            staking_manager: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub session_duration: u64,
    pub quorum_threshold: u128,
    pub min_submissions_required: u64,
    pub seconds_per_block: u64,
    #[serde(deserialize_with = "de_amount")]
    pub block_specimen_reward: Amount,
    #[serde(deserialize_with = "de_amount")]
    pub block_result_reward: Amount,
    #[serde(deserialize_with = "de_amount")]
    pub bsp_required_stake: Amount,
    #[serde(deserialize_with = "de_amount")]
    pub brp_required_stake: Amount,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            session_duration: DEFAULT_SESSION_DURATION,
            quorum_threshold: DEFAULT_QUORUM_THRESHOLD,
            min_submissions_required: DEFAULT_MIN_SUBMISSIONS_REQUIRED,
            seconds_per_block: DEFAULT_SECONDS_PER_BLOCK,
            block_specimen_reward: DEFAULT_ROUND_REWARD,
            block_result_reward: DEFAULT_ROUND_REWARD,
            bsp_required_stake: DEFAULT_REQUIRED_STAKE,
            brp_required_stake: DEFAULT_REQUIRED_STAKE,
        }
    }
}

/// Sync record for one target chain.
#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub nth_block: u64,
    #[serde(default)]
    pub block_on_target_chain: u64,
    #[serde(default)]
    pub block_on_current_chain: u64,
    #[serde(default = "default_target_seconds_per_block")]
    pub seconds_per_block: u64,
    #[serde(default)]
    pub allowed_threshold: u64,
    #[serde(default = "default_max_submissions")]
    pub max_submissions_per_block_height: u64,
    #[serde(default)]
    pub live_sync: LiveSyncPolicy,
}

/// TOML integers stop at i64, so large amounts may be written as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(u64),
    Str(String),
}

fn de_amount<'de, D>(deserializer: D) -> Result<Amount, D::Error>
where D: serde::Deserializer<'de> {
    match RawAmount::deserialize(deserializer)? {
        RawAmount::Int(v) => Ok(v as Amount),
        RawAmount::Str(s) => s.replace('_', "").parse::<Amount>().map_err(serde::de::Error::custom),
    }
}

fn default_target_seconds_per_block() -> u64 { DEFAULT_SECONDS_PER_BLOCK }
fn default_max_submissions() -> u64 { 3 }

// ════════════════════════════════════════════════════════════════════════════════
// LOADING
// ════════════════════════════════════════════════════════════════════════════════

impl Config {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.quorum_threshold > DIVIDER {
            bail!("quorum_threshold {} exceeds 10^18", self.engine.quorum_threshold);
        }
        if self.engine.seconds_per_block == 0 {
            bail!("engine.seconds_per_block cannot be 0");
        }
        for chain in &self.chains {
            if chain.nth_block == 0 {
                bail!("chain {}: nth_block cannot be 0", chain.chain_id);
            }
            if chain.seconds_per_block == 0 {
                bail!("chain {}: seconds_per_block cannot be 0", chain.chain_id);
            }
        }
        Ok(())
    }
}

/// Load and validate config from a TOML file path.
pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let p = path.as_ref();
    let s = fs::read_to_string(p)
        .with_context(|| format!("reading config {}", p.display()))?;
    let cfg: Config = toml::from_str(&s)
        .with_context(|| format!("parsing config {}", p.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
