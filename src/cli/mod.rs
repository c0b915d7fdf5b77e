//! CLI command implementations

pub mod catalog;
pub mod config;
pub mod demo;
pub mod export;
pub mod init;
pub mod loyalty;
pub mod progress;

use anyhow::{Context, Result};

use lootbook::Config;
use lootbook::loyalty::{LoyaltyDb, LoyaltyManager};
use lootbook::progress::{ProgressDb, ProgressManager};

/// Open the progress database named by the config
pub fn open_progress(config: &Config) -> Result<ProgressManager> {
    let db = ProgressDb::open_default(config).context("Failed to initialize progress database")?;
    Ok(ProgressManager::new(db))
}

/// Open the loyalty database named by the config
pub fn open_loyalty(config: &Config) -> Result<LoyaltyManager> {
    let db = LoyaltyDb::open_default(config).context("Failed to initialize loyalty database")?;
    Ok(LoyaltyManager::new(db, config.loyalty.clone()))
}
