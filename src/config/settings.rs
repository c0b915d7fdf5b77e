//! Settings configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::Config;

/// Database settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Progress database file (default: ~/.lootbook/progress.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_path: Option<PathBuf>,

    /// Loyalty database file (default: ~/.lootbook/loyalty.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loyalty_path: Option<PathBuf>,

    /// How long a writer waits for the database lock before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            progress_path: None,
            loyalty_path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseSettings {
    pub fn progress_path(&self) -> PathBuf {
        self.progress_path
            .clone()
            .unwrap_or_else(|| Config::global_config_dir().join("progress.db"))
    }

    pub fn loyalty_path(&self) -> PathBuf {
        self.loyalty_path
            .clone()
            .unwrap_or_else(|| Config::global_config_dir().join("loyalty.db"))
    }
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

/// CSV export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Rows fetched from the database per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    crate::progress::DEFAULT_PAGE_SIZE
}

/// Daily login rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltySettings {
    /// Points added on the first login of each accrual window
    #[serde(default = "default_daily_points")]
    pub daily_points: i64,

    /// Boosts granted when a login streak reaches a length
    #[serde(default = "default_streak_boosts")]
    pub streak_boosts: Vec<StreakBoostRule>,
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        Self {
            daily_points: default_daily_points(),
            streak_boosts: default_streak_boosts(),
        }
    }
}

/// Grant `boost` with `value` when the streak reaches `days`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakBoostRule {
    pub days: u32,
    pub boost: String,
    pub value: f64,
}

fn default_daily_points() -> i64 {
    10
}

fn default_streak_boosts() -> Vec<StreakBoostRule> {
    vec![
        StreakBoostRule {
            days: 3,
            boost: "streak_3".to_string(),
            value: 1.1,
        },
        StreakBoostRule {
            days: 7,
            boost: "streak_7".to_string(),
            value: 1.5,
        },
    ]
}
