//! `proofchain-node`: load a config, build an in-memory proof chain and
//! print its state as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use proofchain_chain::{LedgerMetadata, MemoryCustody, StakingLedger};
use proofchain_common::config::{load_from_file, Config};
use proofchain_common::{Address, Amount, Event, OperatorRole};
use proofchain_validator::{ChainSync, EngineParams, ProofChain};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proofchain-node", version, about = "Stake-weighted proof submission engine")]
struct Cli {
    /// TOML config file. Built-in defaults are used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Load and validate the config.
    Check,
    /// Build the store and print ledger, engine and chain state.
    Inspect {
        /// Custody vault address.
        #[arg(long, default_value = "0x00000000000000000000000000000000000000ee")]
        vault: String,
    },
}

/// Printed by `inspect`. Amounts are plain integers in the smallest unit.
#[derive(Serialize)]
struct Report<'a> {
    ledger: LedgerMetadata,
    engine: &'a EngineParams,
    bsp_required_stake: Amount,
    brp_required_stake: Amount,
    chains: Vec<&'a ChainSync>,
    events: &'a [Event],
}

fn load(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => load_from_file(p),
        None => {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = load(cli.config.as_ref())?;

    match cli.cmd {
        Cmd::Check => {
            info!(
                chains = cfg.chains.len(),
                session_duration = cfg.engine.session_duration,
                quorum_threshold = cfg.engine.quorum_threshold,
                "config ok"
            );
        }
        Cmd::Inspect { vault } => {
            let vault = Address::from_hex(&vault).context("parsing --vault")?;
            let governance = cfg.staking.governance.context("staking.governance is not set")?;
            let identity = cfg
                .staking
                .staking_manager
                .context("staking.staking_manager is not set (the engine identity)")?;

            let ledger = StakingLedger::from_config(MemoryCustody::new(vault), &cfg.staking);
            let chain = ProofChain::from_config(ledger, governance, identity, &cfg)?;

            let report = Report {
                ledger: chain.staking().metadata(),
                engine: chain.params(),
                bsp_required_stake: chain.operators().required_stake(OperatorRole::BlockSpecimenProducer),
                brp_required_stake: chain.operators().required_stake(OperatorRole::BlockResultProducer),
                chains: chain.chains().collect(),
                events: chain.journal(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
