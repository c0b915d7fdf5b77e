//! Lootbook - level progress, prize awards and a loyalty program
//!
//! Lootbook keeps a small game-progress ledger in SQLite: which levels each
//! player has started and completed, which prizes were awarded for those
//! completions and whether they were claimed. A separate loyalty database
//! tracks daily logins, login streaks, daily points and boosts.
//!
//! ## Guarantees
//!
//! 1. **Atomic awards**: a prize batch is persisted completely or not at all,
//!    and only for a completed level.
//! 2. **One-way transitions**: completing a level and claiming a prize happen
//!    once; repeating either is a conflict.

pub mod config;
pub mod error;
pub mod loyalty;
pub mod progress;
pub mod time_bucket;

pub use config::Config;
pub use error::{Error, Result};
