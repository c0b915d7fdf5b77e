//! Daily login streak tracking

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Streak data stored on the loyalty player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakInfo {
    pub current: u32,
    pub best: u32,
    /// UTC day of the last counted login
    pub last_login_day: Option<NaiveDate>,
}

impl StreakInfo {
    /// Whether the streak survives until `today` (login today or yesterday)
    pub fn is_active(&self, today: NaiveDate) -> bool {
        let Some(last_day) = self.last_login_day else {
            return false;
        };
        (today - last_day).num_days() <= 1
    }

    /// Count a login on `today`.
    ///
    /// Returns the updated streak, or `None` when a login was already counted
    /// today (or the stored day lies in the future).
    pub fn advance(&self, today: NaiveDate) -> Option<StreakInfo> {
        let current = match self.last_login_day {
            Some(last_day) if last_day >= today => return None,
            Some(last_day) if last_day + Duration::days(1) == today => self.current + 1,
            _ => 1,
        };

        Some(StreakInfo {
            current,
            best: current.max(self.best),
            last_login_day: Some(today),
        })
    }
}
