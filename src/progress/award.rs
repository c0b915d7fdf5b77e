//! Prize award workflow
//!
//! Grants prizes for a completed level. The completion check and the inserts
//! share one `IMMEDIATE` transaction: SQLite takes the write lock before the
//! check runs, so no other writer can slip between check and insert, and a
//! failed insert rolls back every award of the batch.

use rusqlite::{TransactionBehavior, params};
use tracing::{debug, info};

use super::db::ProgressDb;
use super::models::{ClaimState, LevelPrize};
use super::repository::find_player_level_in;
use crate::error::{Error, Result};

/// Creates award records for completed levels
#[derive(Clone)]
pub struct PrizeAwarder {
    db: ProgressDb,
}

impl PrizeAwarder {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    /// Award `prize_ids` to the player's completion of `level_id`.
    ///
    /// Returns one unclaimed award per prize id, in input order. Duplicate ids
    /// produce duplicate awards. An empty list still validates the
    /// player level but writes nothing.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the player never started the level
    /// - `PreconditionFailed` if the level is not completed
    /// - `Persistence` if any insert fails (e.g. unknown prize id); nothing
    ///   from the batch is kept
    pub fn award(&self, player_id: &str, level_id: i64, prize_ids: &[i64]) -> Result<Vec<LevelPrize>> {
        let mut conn = self.db.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let player_level = find_player_level_in(&tx, player_id, level_id)?.ok_or_else(|| {
            Error::not_found("player-level", format!("player={} level={}", player_id, level_id))
        })?;

        if !player_level.is_completed() {
            return Err(Error::PreconditionFailed(format!(
                "level not completed: player {} has not finished level {}",
                player_id, level_id
            )));
        }

        if prize_ids.is_empty() {
            debug!("No prizes to award for player_level {}", player_level.id);
            return Ok(Vec::new());
        }

        let mut awards = Vec::with_capacity(prize_ids.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO level_prize (prize_id, player_level_id, is_received, received_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for &prize_id in prize_ids {
                let claim = ClaimState::Unclaimed;
                let (is_received, received_at) = claim.to_columns();
                stmt.execute(params![prize_id, player_level.id, is_received, received_at])?;
                awards.push(LevelPrize {
                    id: tx.last_insert_rowid(),
                    prize_id,
                    player_level_id: player_level.id,
                    claim,
                });
            }
        }
        tx.commit()?;

        info!(
            "Awarded {} prize(s) to player {} for level {}",
            awards.len(),
            player_id,
            level_id
        );
        Ok(awards)
    }
}
