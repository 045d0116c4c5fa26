//! # sk-engine: Outcome engine for the Štrakanje 5×3 reel slot
//!
//! Draws a 5×3 grid from a weighted symbol pool, scores it against nine
//! paylines and settles the result against a player balance.
//!
//! ## Features
//!
//! - **RTP Profiles**: swappable weight/payout/multiplier tables (JSON or YAML)
//! - **Weighted Reels**: independent cell draws, no wild on the edge reels
//! - **Single Best Line**: wins are never summed across paylines
//! - **Bonus Scatter**: free spins credited on 3+ bonus symbols anywhere
//! - **Session Engine**: Idle → Spinning → Settling transaction with
//!   overlapping requests rejected
//! - **Simulation**: seeded long runs for checking a profile's return
//!
//! ## Architecture
//!
//! ```text
//! SessionEngine
//!     │
//!     ├── RtpProfile (SymbolTable, denominations, multipliers)
//!     ├── ReelGenerator (weighted draw, seeded RNG)
//!     └── SpinEvaluator
//!           ├── LineEvaluator × 9 paylines
//!           └── bonus scatter count
//!           │
//!           v
//!     SpinResult (amount, winning line, win tier, balance)
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod paylines;
pub mod paytable;
pub mod persistence;
pub mod reels;
pub mod simulator;
pub mod spin;
pub mod symbols;
pub mod win_tiers;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use grid::*;
pub use paylines::*;
pub use paytable::*;
pub use persistence::*;
pub use reels::*;
pub use simulator::*;
pub use spin::*;
pub use symbols::*;
pub use win_tiers::*;
