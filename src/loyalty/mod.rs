//! Loyalty program: daily logins, login streaks, daily points and boosts
//!
//! Kept in its own database (`~/.lootbook/loyalty.db`); nothing here touches
//! level progress.
//!
//! # Usage
//!
//! ```ignore
//! let loyalty = LoyaltyManager::new(LoyaltyDb::open(&path)?, config.loyalty.clone());
//! loyalty.register("alice")?;
//!
//! let outcome = loyalty.record_login("alice", Utc::now())?;
//! println!("streak {} (+{} points)", outcome.streak.current, outcome.points_accrued);
//!
//! loyalty.define_boost("double_xp", Some("Double XP for an hour"), "multiplier")?;
//! loyalty.grant_boost("alice", "double_xp", 2.0, Utc::now())?;
//! ```

mod db;
mod manager;
mod models;
mod streak;

pub use db::LoyaltyDb;
pub use manager::LoyaltyManager;
pub use models::{Boost, LoginOutcome, LoyaltyPlayer, PlayerBoost, PlayerLogin};
pub use streak::StreakInfo;
