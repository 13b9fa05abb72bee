//! # Proof Chain Ledger Library
//!
//! Staking ledger and operator registry for the stake-weighted proof
//! submission engine.
//!
//! ## Module Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | `custody` | `Custody` trait, `MemoryCustody` |
//! | `staking` | `StakingLedger`: stake, unstake, cooldowns, rewards, commission, identity transfer |
//! | `operators` | `OperatorRegistry`: operator roles, enable/disable cascade, auditors |
//! | `error` | `StakingError`, `RegistryError` |
//!
//! ## Value Flow
//!
//! ```text
//! user ──stake──► custody vault ──► position.staked
//!                                        │ unstake
//!                                        ▼
//!                            unstaking (end_epoch) ──transfer_unstaked_out──► user
//!
//! depositor ──deposit_reward_tokens──► reward_pool
//!                                        │ reward_validators
//!                                        ▼
//!                 owner.commission_earned + position.rewards ──redeem_rewards──► beneficiary
//! ```

pub mod custody;
pub mod error;
pub mod operators;
pub mod staking;

pub use custody::{Custody, CustodyError, MemoryCustody};
pub use error::{RegistryError, StakingError};
pub use operators::{OperatorRecord, OperatorRegistry};
pub use staking::{
    DelegatorMetadata, LedgerMetadata, LedgerParams, Position, StakingInterface, StakingLedger,
    Unstaking, Validator, ValidatorMetadata, MAX_UNSTAKINGS, REWARD_REDEEM_THRESHOLD,
};
