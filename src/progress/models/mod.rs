//! Data models for level progress and prize awards

mod catalog;
mod level_prize;
mod player_level;

pub use catalog::{Level, Player, Prize};
pub use level_prize::{AwardedPrize, ClaimState, LevelPrize};
pub use player_level::{Completion, PlayerLevel};
