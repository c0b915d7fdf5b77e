//! Level progress and prize awards
//!
//! Tracks which levels each player has started and completed, and the
//! prizes granted for those completions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ProgressManager                            │
//! │  - Player / Level / Prize reference data                        │
//! │  - start -> complete (Completion state machine)                 │
//! │  - award_prizes (one IMMEDIATE transaction per batch)           │
//! │  - claim (ClaimState state machine)                             │
//! │  - paginated export                                             │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                    ~/.lootbook/progress.db
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let manager = ProgressManager::new(ProgressDb::open(&path)?);
//!
//! manager.levels().create(&Level::new(1, "Level 1"))?;
//! manager.players().create(&Player::new("super_unique_id"))?;
//! manager.player_levels().start("super_unique_id", 1)?;
//! manager.complete_level("super_unique_id", 1)?;
//!
//! manager.prizes().create_all(&[Prize::new(1, "Prize 1"), Prize::new(2, "Prize 2")])?;
//! let awards = manager.award_prizes("super_unique_id", 1, &[1, 2])?;
//! for award in &awards {
//!     manager.claim_prize(award.id)?;
//! }
//!
//! manager.exporter().write_csv_file(Path::new("player_levels.csv"))?;
//! ```

mod award;
mod db;
mod export;
pub mod models;
mod repository;
mod transitions;

pub use award::PrizeAwarder;
pub use db::ProgressDb;
pub use export::{CSV_HEADER, DEFAULT_PAGE_SIZE, ExportPages, ExportRow, NO_PRIZE, ProgressExporter};
pub use models::*;
pub use repository::*;

use crate::error::Result;
use crate::time_bucket;

/// Central manager for level progress
///
/// Owns an explicit database handle; every workflow runs in its own
/// transaction on that handle.
#[derive(Clone)]
pub struct ProgressManager {
    db: ProgressDb,
}

impl ProgressManager {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    /// Create a ProgressManager with a database at a custom path
    pub fn with_path(path: &std::path::Path) -> anyhow::Result<Self> {
        Ok(Self::new(ProgressDb::open(path)?))
    }

    /// Create a ProgressManager over a private in-memory database
    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(ProgressDb::open_in_memory()?))
    }

    pub fn db(&self) -> &ProgressDb {
        &self.db
    }

    pub fn players(&self) -> PlayerRepository {
        PlayerRepository::new(self.db.clone())
    }

    pub fn levels(&self) -> LevelRepository {
        LevelRepository::new(self.db.clone())
    }

    pub fn prizes(&self) -> PrizeRepository {
        PrizeRepository::new(self.db.clone())
    }

    pub fn player_levels(&self) -> PlayerLevelRepository {
        PlayerLevelRepository::new(self.db.clone())
    }

    pub fn level_prizes(&self) -> LevelPrizeRepository {
        LevelPrizeRepository::new(self.db.clone())
    }

    pub fn awarder(&self) -> PrizeAwarder {
        PrizeAwarder::new(self.db.clone())
    }

    pub fn exporter(&self) -> ProgressExporter {
        ProgressExporter::new(self.db.clone())
    }

    // ============================================
    // Workflows
    // ============================================

    /// Mark the player's level as completed now.
    ///
    /// `NotFound` if the player never started it, `Conflict` if it is
    /// already completed.
    pub fn complete_level(&self, player_id: &str, level_id: i64) -> Result<PlayerLevel> {
        let mut conn = self.db.conn();
        transitions::complete_level(&mut conn, player_id, level_id, None, time_bucket::now())
    }

    /// Mark the player's level as completed and record the final score
    pub fn complete_level_with_score(
        &self,
        player_id: &str,
        level_id: i64,
        score: i64,
    ) -> Result<PlayerLevel> {
        let mut conn = self.db.conn();
        transitions::complete_level(&mut conn, player_id, level_id, Some(score), time_bucket::now())
    }

    /// Award prizes for a completed level. See [`PrizeAwarder::award`].
    pub fn award_prizes(&self, player_id: &str, level_id: i64, prize_ids: &[i64]) -> Result<Vec<LevelPrize>> {
        self.awarder().award(player_id, level_id, prize_ids)
    }

    /// Claim one award. `NotFound` for an unknown id, `Conflict` if already claimed.
    pub fn claim_prize(&self, award_id: i64) -> Result<LevelPrize> {
        let mut conn = self.db.conn();
        transitions::claim_prize(&mut conn, award_id, time_bucket::now())
    }

    /// Claim every unclaimed award of the player's level.
    /// Already-claimed awards are skipped.
    pub fn claim_all(&self, player_id: &str, level_id: i64) -> Result<Vec<LevelPrize>> {
        let mut conn = self.db.conn();
        transitions::claim_all(&mut conn, player_id, level_id, time_bucket::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded() -> ProgressManager {
        let manager = ProgressManager::in_memory().unwrap();
        manager.levels().create(&Level::new(1, "Level 1")).unwrap();
        manager.players().create(&Player::new("p1")).unwrap();
        manager.player_levels().start("p1", 1).unwrap();
        manager
            .prizes()
            .create_all(&[Prize::new(1, "Prize 1"), Prize::new(2, "Prize 2")])
            .unwrap();
        manager
    }

    #[test]
    fn test_complete_level_persists_both_columns() {
        let manager = seeded();
        let completed = manager.complete_level_with_score("p1", 1, 420).unwrap();
        assert!(completed.is_completed());
        assert_eq!(completed.score, 420);

        let stored = manager.player_levels().find("p1", 1).unwrap().unwrap();
        assert_eq!(stored, completed);

        let (flag, at): (bool, Option<i64>) = manager
            .db()
            .conn()
            .query_row(
                "SELECT is_completed, completed_at FROM player_level WHERE id = ?1",
                [stored.id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert!(flag);
        assert_eq!(at, completed.completed_at().map(time_bucket::to_millis));
    }

    #[test]
    fn test_complete_level_twice_is_conflict() {
        let manager = seeded();
        let first = manager.complete_level("p1", 1).unwrap();

        let err = manager.complete_level("p1", 1).unwrap_err();
        assert!(err.is_conflict());

        let stored = manager.player_levels().find("p1", 1).unwrap().unwrap();
        assert_eq!(stored.completed_at(), first.completed_at());
    }

    #[test]
    fn test_complete_unknown_level_is_not_found() {
        let manager = seeded();
        assert!(manager.complete_level("p1", 99).unwrap_err().is_not_found());
        assert!(manager.complete_level("ghost", 1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_claim_all_skips_claimed_awards() {
        let manager = seeded();
        manager.complete_level("p1", 1).unwrap();
        let awards = manager.award_prizes("p1", 1, &[1, 2]).unwrap();

        manager.claim_prize(awards[0].id).unwrap();
        let claimed = manager.claim_all("p1", 1).unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, awards[1].id);

        assert!(manager.claim_all("p1", 1).unwrap().is_empty());
        assert!(manager.level_prizes().list_unclaimed_for_player("p1").unwrap().is_empty());
    }

    #[test]
    fn test_with_path_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.db");
        {
            let manager = ProgressManager::with_path(&path).unwrap();
            manager.players().create(&Player::new("p1")).unwrap();
        }
        let manager = ProgressManager::with_path(&path).unwrap();
        assert_eq!(manager.players().list().unwrap(), vec![Player::new("p1")]);
    }
}
