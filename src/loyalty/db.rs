//! SQLite database connection and schema management for loyalty data
//!
//! Manages the `~/.lootbook/loyalty.db` database.
//! Separate from progress.db: the loyalty player is keyed by username and
//! shares nothing with the progress player.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::config::{Config, DatabaseSettings};

/// Database wrapper for loyalty data
#[derive(Clone)]
pub struct LoyaltyDb {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl LoyaltyDb {
    /// Open or create the loyalty database at the location named by the config
    pub fn open_default(config: &Config) -> Result<Self> {
        Self::open_with(&config.database.loyalty_path(), &config.database)
    }

    /// Open or create the loyalty database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &DatabaseSettings::default())
    }

    pub fn open_with(path: &Path, settings: &DatabaseSettings) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create loyalty dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open loyalty db: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory loyalty db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to create loyalty schema")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Current loyalty schema version
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        Ok(current_version(&conn)?)
    }

    /// Get a reference to the connection
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn current_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM loyalty_schema_version",
        [],
        |r| r.get(0),
    )
}

fn run_migrations(conn: &Connection) -> Result<()> {
    let version = current_version(conn)?;

    // Migration 2: look up grants by boost (boost listings, cascading deletes)
    if version < 2 {
        conn.execute_batch(
            r#"
            CREATE INDEX IF NOT EXISTS idx_player_boost_boost ON player_boost(boost_id);
            INSERT OR REPLACE INTO loyalty_schema_version VALUES (2);
            "#,
        )
        .context("Failed to migrate loyalty schema to version 2")?;
        debug!("Migrated loyalty schema to version 2");
    }

    Ok(())
}

/// SQL schema for the loyalty database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS loyalty_schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO loyalty_schema_version VALUES (1);

CREATE TABLE IF NOT EXISTS player (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at INTEGER NOT NULL,
    username TEXT NOT NULL UNIQUE,
    daily_points INTEGER NOT NULL DEFAULT 0,
    first_login INTEGER,
    next_accrual_available INTEGER,
    current_streak INTEGER NOT NULL DEFAULT 0,
    best_streak INTEGER NOT NULL DEFAULT 0,
    last_login_day TEXT                     -- YYYY-MM-DD (UTC)
);

CREATE TABLE IF NOT EXISTS user_login (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES player(id) ON DELETE CASCADE,
    login_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_user_login_player ON user_login(player_id, login_time);

CREATE TABLE IF NOT EXISTS boost (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    type TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS player_boost (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id INTEGER NOT NULL REFERENCES player(id) ON DELETE CASCADE,
    boost_id INTEGER NOT NULL REFERENCES boost(id) ON DELETE CASCADE,
    value REAL NOT NULL,
    received_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_player_boost_player ON player_boost(player_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reopen_keeps_schema_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loyalty.db");
        assert_eq!(LoyaltyDb::open(&path).unwrap().schema_version().unwrap(), 2);
        assert_eq!(LoyaltyDb::open(&path).unwrap().schema_version().unwrap(), 2);
    }

    #[test]
    fn test_migration_adds_boost_index() {
        let db = LoyaltyDb::open_in_memory().unwrap();
        let conn = db.conn();
        let found: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = 'idx_player_boost_boost')",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(found);
    }
}
