//! # proofchain_common
//!
//! Shared vocabulary for the proof-chain workspace:
//!
//! | Module | Contents |
//! |--------|----------|
//! | `types` | `Address`, `Hash32`, id aliases, `RoundKind`, `OperatorRole`, `LiveSyncPolicy` |
//! | `math` | 10^18 fixed point, truncating `mul_div` |
//! | `events` | `Event`, one variant per observable state transition |
//! | `config` | TOML `Config` loader |

pub mod config;
pub mod events;
pub mod math;
pub mod types;

pub use config::Config;
pub use events::Event;
pub use math::{mul_div, DIVIDER, ONE_TOKEN};
pub use types::{
    Address, Amount, BlockHeight, ChainId, Hash32, LiveSyncPolicy, OperatorRole, RoundKind,
    ValidatorId,
};
