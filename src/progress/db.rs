//! SQLite database connection and schema management for level progress
//!
//! Manages the `~/.lootbook/progress.db` database: players, levels, prizes,
//! per-player level progress and the prize awards tied to completions.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::config::{Config, DatabaseSettings};

/// Database wrapper for progress data
#[derive(Clone)]
pub struct ProgressDb {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl ProgressDb {
    /// Open or create the progress database at the location named by the config
    pub fn open_default(config: &Config) -> Result<Self> {
        Self::open_with(&config.database.progress_path(), &config.database)
    }

    /// Open or create the progress database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &DatabaseSettings::default())
    }

    /// Open or create the progress database with explicit settings
    pub fn open_with(path: &Path, settings: &DatabaseSettings) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create progress dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progress db: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;

        debug!("Opened progress db at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory progress db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Cascading deletes depend on this
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Lock the connection.
    ///
    /// The guard is held for the whole of a workflow's transaction, which is
    /// what makes each workflow single-writer.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to create progress schema")?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .unwrap_or(0);

        // Migration 2: index awards for the unclaimed-prizes lookup
        if version < 2 {
            conn.execute_batch(
                r#"
                CREATE INDEX IF NOT EXISTS idx_level_prize_unclaimed
                    ON level_prize(player_level_id) WHERE is_received = 0;
                "#,
            )?;
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        Ok(())
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        let version = conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?;
        Ok(version)
    }
}

/// SQL schema for the progress database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);

-- ============================================
-- REFERENCE DATA
-- ============================================
CREATE TABLE IF NOT EXISTS player (
    id TEXT PRIMARY KEY CHECK (length(id) <= 100)
);

CREATE TABLE IF NOT EXISTS level (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL CHECK (length(title) <= 100),
    "order" INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS prize (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL
);

-- ============================================
-- PROGRESS (one row per player and level)
-- ============================================
CREATE TABLE IF NOT EXISTS player_level (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id TEXT NOT NULL REFERENCES player(id) ON DELETE CASCADE,
    level_id INTEGER NOT NULL REFERENCES level(id) ON DELETE CASCADE,
    completed_at INTEGER,                   -- ms since epoch, NULL until completed
    is_completed INTEGER NOT NULL DEFAULT 0,
    score INTEGER NOT NULL DEFAULT 0,
    UNIQUE (player_id, level_id),
    CHECK ((is_completed = 0 AND completed_at IS NULL)
        OR (is_completed = 1 AND completed_at IS NOT NULL))
);
CREATE INDEX IF NOT EXISTS idx_player_level_level ON player_level(level_id);

-- ============================================
-- AWARDS (prizes granted for a completion)
-- ============================================
CREATE TABLE IF NOT EXISTS level_prize (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prize_id INTEGER NOT NULL REFERENCES prize(id) ON DELETE CASCADE,
    player_level_id INTEGER NOT NULL REFERENCES player_level(id) ON DELETE CASCADE,
    received_at INTEGER,                    -- ms since epoch, NULL until claimed
    is_received INTEGER NOT NULL DEFAULT 0,
    CHECK ((is_received = 0 AND received_at IS NULL)
        OR (is_received = 1 AND received_at IS NOT NULL))
);
CREATE INDEX IF NOT EXISTS idx_level_prize_player_level ON level_prize(player_level_id);
CREATE INDEX IF NOT EXISTS idx_level_prize_prize ON level_prize(prize_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_init() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("progress.db");
        let db = ProgressDb::open(&db_path).unwrap();

        let conn = db.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in ["player", "level", "prize", "player_level", "level_prize"] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_reopen_keeps_schema_version() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("progress.db");
        assert_eq!(ProgressDb::open(&db_path).unwrap().schema_version().unwrap(), 2);
        assert_eq!(ProgressDb::open(&db_path).unwrap().schema_version().unwrap(), 2);
    }

    #[test]
    fn test_check_constraint_rejects_half_completed_rows() {
        let db = ProgressDb::open_in_memory().unwrap();
        let conn = db.conn();
        conn.execute_batch(
            r#"
            INSERT INTO player (id) VALUES ('p1');
            INSERT INTO level (id, title) VALUES (1, 'Level 1');
            "#,
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO player_level (player_id, level_id, is_completed) VALUES ('p1', 1, 1)",
            [],
        );
        assert!(result.is_err());
    }
}
