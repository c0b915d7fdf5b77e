//! Shared test utilities for progress and loyalty integration tests
#![allow(dead_code)]

use tempfile::TempDir;

use lootbook::progress::{Level, Player, Prize, ProgressDb, ProgressManager};

/// A progress manager over a database file in a temporary directory.
/// Keep the `TempDir` alive for as long as the manager is used.
pub fn temp_manager() -> (TempDir, ProgressManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = ProgressDb::open(&temp_dir.path().join("progress.db"))
        .expect("Failed to open progress db");
    (temp_dir, ProgressManager::new(db))
}

/// Level 1, player `super_unique_id` with level 1 started, prizes 1 and 2
pub fn seed_scenario(manager: &ProgressManager) {
    manager
        .levels()
        .create(&Level::new(1, "Level 1"))
        .expect("Failed to create level");
    manager
        .players()
        .create(&Player::new("super_unique_id"))
        .expect("Failed to create player");
    manager
        .player_levels()
        .start("super_unique_id", 1)
        .expect("Failed to start level");
    manager
        .prizes()
        .create_all(&[Prize::new(1, "Prize 1"), Prize::new(2, "Prize 2")])
        .expect("Failed to create prizes");
}

/// Number of rows in a table
pub fn count_rows(manager: &ProgressManager, table: &str) -> i64 {
    manager
        .db()
        .conn()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .expect("Failed to count rows")
}
