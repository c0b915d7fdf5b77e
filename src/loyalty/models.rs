//! Loyalty data models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::streak::StreakInfo;

/// A player of the loyalty program, keyed by username
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyPlayer {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub daily_points: i64,
    pub first_login: Option<DateTime<Utc>>,
    /// Earliest moment the next daily points may accrue
    pub next_accrual_available: Option<DateTime<Utc>>,
    pub streak: StreakInfo,
}

impl LoyaltyPlayer {
    /// Streak length as of `today`: the stored streak is only updated on
    /// login, so a missed day reads as 0 here until the next login.
    pub fn live_streak(&self, today: NaiveDate) -> u32 {
        if self.streak.is_active(today) {
            self.streak.current
        } else {
            0
        }
    }
}

/// One recorded login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLogin {
    pub id: i64,
    pub player_id: i64,
    pub login_time: DateTime<Utc>,
}

/// A kind of boost players can receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boost {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Free-form boost type, e.g. "multiplier", "shield", "streak"
    pub kind: String,
}

/// A boost granted to a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBoost {
    pub id: i64,
    pub player_id: i64,
    pub boost_id: i64,
    pub boost_name: String,
    pub value: f64,
    pub received_at: DateTime<Utc>,
}

/// What a login changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginOutcome {
    pub login: PlayerLogin,
    /// Streak after this login
    pub streak: StreakInfo,
    /// Whether this was the first counted login of the day
    pub streak_extended: bool,
    /// Points added by this login (0 outside the accrual window)
    pub points_accrued: i64,
    pub daily_points: i64,
    pub boosts_granted: Vec<PlayerBoost>,
}
