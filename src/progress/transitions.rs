//! Persisted state transitions: level completion and prize claims
//!
//! Each transition runs in an IMMEDIATE transaction: the row is re-read under
//! the write lock and the in-memory model rejects a second completion or
//! claim with `Conflict`, including one made by another connection. The
//! UPDATE is still guarded on the old state and a zero-row write is reported
//! as `Conflict`, so the stored timestamp is never overwritten.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior, params};
use tracing::info;

use super::models::{LevelPrize, PlayerLevel};
use super::repository::{find_player_level_in, get_level_prize_in, list_level_prizes_in};
use crate::error::{Error, Result};

/// Mark a player's level as completed, optionally recording the final score
pub(crate) fn complete_level(
    conn: &mut Connection,
    player_id: &str,
    level_id: i64,
    score: Option<i64>,
    at: DateTime<Utc>,
) -> Result<PlayerLevel> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut player_level = find_player_level_in(&tx, player_id, level_id)?.ok_or_else(|| {
        Error::not_found("player-level", format!("player={} level={}", player_id, level_id))
    })?;
    player_level.complete(at)?;
    if let Some(score) = score {
        player_level.score = score;
    }

    let (is_completed, completed_at) = player_level.completion.to_columns();
    let updated = tx.execute(
        r#"
        UPDATE player_level
        SET is_completed = ?1, completed_at = ?2, score = ?3
        WHERE id = ?4 AND is_completed = 0
        "#,
        params![is_completed, completed_at, player_level.score, player_level.id],
    )?;
    if updated == 0 {
        return Err(Error::Conflict(format!(
            "player {} already completed level {}",
            player_id, level_id
        )));
    }
    tx.commit()?;

    info!("Player {} completed level {} (score {})", player_id, level_id, player_level.score);
    Ok(player_level)
}

/// Claim a single award
pub(crate) fn claim_prize(conn: &mut Connection, award_id: i64, at: DateTime<Utc>) -> Result<LevelPrize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut award = get_level_prize_in(&tx, award_id)?
        .ok_or_else(|| Error::not_found("level-prize", award_id))?;
    award.claim(at)?;
    write_claim(&tx, &award)?;
    tx.commit()?;

    info!("Award {} (prize {}) claimed", award.id, award.prize_id);
    Ok(award)
}

/// Claim every unclaimed award of one player level
pub(crate) fn claim_all(
    conn: &mut Connection,
    player_id: &str,
    level_id: i64,
    at: DateTime<Utc>,
) -> Result<Vec<LevelPrize>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let player_level = find_player_level_in(&tx, player_id, level_id)?.ok_or_else(|| {
        Error::not_found("player-level", format!("player={} level={}", player_id, level_id))
    })?;

    let mut claimed = Vec::new();
    for mut award in list_level_prizes_in(&tx, player_level.id)? {
        if award.is_received() {
            continue;
        }
        award.claim(at)?;
        write_claim(&tx, &award)?;
        claimed.push(award);
    }
    tx.commit()?;

    info!(
        "Player {} claimed {} prize(s) for level {}",
        player_id,
        claimed.len(),
        level_id
    );
    Ok(claimed)
}

fn write_claim(conn: &Connection, award: &LevelPrize) -> Result<()> {
    let (is_received, received_at) = award.claim.to_columns();
    let updated = conn.execute(
        "UPDATE level_prize SET is_received = ?1, received_at = ?2 WHERE id = ?3 AND is_received = 0",
        params![is_received, received_at, award.id],
    )?;
    if updated == 0 {
        return Err(Error::Conflict(format!("award {} already claimed", award.id)));
    }
    Ok(())
}
