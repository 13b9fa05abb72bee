//! # Proof Chain Validator Engine
//!
//! Stake-weighted proof submission, quorum resolution and arbitration on
//! top of the ledger and operator registry from `proofchain_chain`.
//!
//! ## Module Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | `proof_chain` | `ProofChain`: the top-level store and every engine operation |
//! | `session` | `Session`, `SessionKey`, lifecycle and per-pair tallies |
//! | `sync` | `ChainSync`: nth-block and live-sync height checks |
//! | `rewards` | pro-rata round reward split |
//! | `params` | `EngineParams` |
//! | `shared` | `SharedProofChain`: mutex-serialized handle |
//! | `error` | `EngineError` |
//!
//! ## Round Flow
//!
//! ```text
//! operator ──submit_proof──► Session (Open)
//!                                │ deadline
//!                                ▼
//!                           Session (Closed) ──finalize_and_reward_session──┐
//!                                                                           │
//!                 ┌───────── quorum met ─────────┬──── quorum missed ───────┘
//!                 ▼                              ▼
//!           Finalized + reward_validators   RequiresAudit ──arbitrate──► Finalized + reward_validators
//! ```

pub mod error;
pub mod params;
pub mod proof_chain;
pub mod rewards;
pub mod session;
pub mod shared;
pub mod sync;

pub use error::EngineError;
pub use params::EngineParams;
pub use proof_chain::{LedgerProofChain, ProofChain};
pub use rewards::{compute_reward_shares, pay_round_reward, RewardShares};
pub use session::{HashPair, PairTally, Resolution, Session, SessionKey, SessionState, Submission};
pub use shared::SharedProofChain;
pub use sync::ChainSync;
