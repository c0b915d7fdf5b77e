//! Init command implementation

use anyhow::{Result, bail};
use std::path::PathBuf;

use lootbook::Config;

/// Default configuration content for lootbook init
pub const DEFAULT_CONFIG: &str = r#"# Lootbook Configuration
# ======================

# ============================================================================
# DATABASE - Where progress and loyalty data live
# ============================================================================
#
# Available options:
#   progress_path    - Progress database (default: ~/.lootbook/progress.db)
#   loyalty_path     - Loyalty database (default: ~/.lootbook/loyalty.db)
#   busy_timeout_ms  - How long a writer waits for the database lock (default: 5000)

[database]
busy_timeout_ms = 5000
# progress_path = "/var/lib/lootbook/progress.db"
# loyalty_path = "/var/lib/lootbook/loyalty.db"

# ============================================================================
# EXPORT - CSV export of player levels and their prizes
# ============================================================================

[export]
# Rows fetched from the database per page
page_size = 1000

# ============================================================================
# LOYALTY - Daily login rewards
# ============================================================================
#
# daily_points is added on the first login after the accrual window opens
# (the next UTC midnight after the previous accrual).
#
# Each streak boost is granted when the login streak reaches exactly `days`.

[loyalty]
daily_points = 10

[[loyalty.streak_boosts]]
days = 3
boost = "streak_3"
value = 1.1

[[loyalty.streak_boosts]]
days = 7
boost = "streak_7"
value = 1.5
"#;

/// Initialize a new lootbook configuration
/// By default creates the global config at ~/.lootbook/config.toml
/// Use --config to specify a custom path
pub fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("Created: {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_defaults() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        init_command(Some(path.clone()), false).unwrap();
        assert!(path.exists());
        assert!(init_command(Some(path.clone()), false).is_err());
        init_command(Some(path), true).unwrap();
    }
}
