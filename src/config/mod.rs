//! Configuration loading and management

mod io;
mod settings;

pub use settings::{DatabaseSettings, ExportSettings, LoyaltySettings, StreakBoostRule};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database locations and connection settings
    #[serde(default)]
    pub database: DatabaseSettings,

    /// CSV export settings
    #[serde(default)]
    pub export: ExportSettings,

    /// Daily login rewards and streak boosts
    #[serde(default)]
    pub loyalty: LoyaltySettings,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the stores cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.export.page_size == 0 {
            anyhow::bail!("export.page_size must be at least 1");
        }
        if self.loyalty.daily_points < 0 {
            anyhow::bail!("loyalty.daily_points must not be negative");
        }
        for rule in &self.loyalty.streak_boosts {
            if rule.days == 0 {
                anyhow::bail!("loyalty.streak_boosts: '{}' needs days >= 1", rule.boost);
            }
            if rule.boost.trim().is_empty() {
                anyhow::bail!("loyalty.streak_boosts: boost name must not be empty");
            }
        }
        Ok(())
    }

    /// Keys accepted by [`Config::set`]
    pub const SETTABLE_KEYS: [&'static str; 5] = [
        "database.progress_path",
        "database.loyalty_path",
        "database.busy_timeout_ms",
        "export.page_size",
        "loyalty.daily_points",
    ];

    /// Set one scalar setting from its dotted key. The result is validated.
    ///
    /// Path keys accept an empty value to fall back to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let optional_path = |value: &str| (!value.is_empty()).then(|| PathBuf::from(value));

        match key {
            "database.progress_path" => self.database.progress_path = optional_path(value),
            "database.loyalty_path" => self.database.loyalty_path = optional_path(value),
            "database.busy_timeout_ms" => {
                self.database.busy_timeout_ms = value
                    .parse()
                    .with_context(|| format!("{} expects milliseconds, got '{}'", key, value))?;
            }
            "export.page_size" => {
                self.export.page_size = value
                    .parse()
                    .with_context(|| format!("{} expects a row count, got '{}'", key, value))?;
            }
            "loyalty.daily_points" => {
                self.loyalty.daily_points = value
                    .parse()
                    .with_context(|| format!("{} expects a number, got '{}'", key, value))?;
            }
            _ => anyhow::bail!(
                "Unknown config key '{}'. Known keys: {}",
                key,
                Self::SETTABLE_KEYS.join(", ")
            ),
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.export.page_size, 1000);
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.loyalty.daily_points, 10);
        assert_eq!(config.loyalty.streak_boosts.len(), 2);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [database]
            progress_path = "/tmp/lootbook/progress.db"

            [export]
            page_size = 250

            [loyalty]
            daily_points = 25

            [[loyalty.streak_boosts]]
            days = 5
            boost = "five_day_shield"
            value = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(
            config.database.progress_path(),
            Path::new("/tmp/lootbook/progress.db")
        );
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.export.page_size, 250);
        assert_eq!(config.loyalty.daily_points, 25);
        assert_eq!(config.loyalty.streak_boosts.len(), 1);
        assert_eq!(config.loyalty.streak_boosts[0].boost, "five_day_shield");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml("[export]\npage_size = 0").is_err());
        assert!(Config::from_toml("[loyalty]\ndaily_points = -1").is_err());
        assert!(
            Config::from_toml("[[loyalty.streak_boosts]]\ndays = 0\nboost = \"x\"\nvalue = 1.0")
                .is_err()
        );
    }

    #[test]
    fn test_set_scalar_keys() {
        let mut config = Config::default();
        config.set("export.page_size", "200").unwrap();
        config.set("database.progress_path", "/srv/lootbook/progress.db").unwrap();
        config.set("loyalty.daily_points", "15").unwrap();

        assert_eq!(config.export.page_size, 200);
        assert_eq!(config.loyalty.daily_points, 15);
        assert_eq!(
            config.database.progress_path(),
            Path::new("/srv/lootbook/progress.db")
        );

        config.set("database.progress_path", "").unwrap();
        assert_eq!(config.database.progress_path, None);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set("export.page_size", "lots").is_err());
        assert!(config.set("export.page_size", "0").is_err());
        assert!(config.set("gui.theme", "dark").is_err());
    }
}
