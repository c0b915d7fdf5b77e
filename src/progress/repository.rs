//! Repository implementations for progress data access
//!
//! The row mappers and `*_in` lookups take a plain `&Connection` so the
//! workflows can run them inside their own transactions.

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use super::db::ProgressDb;
use super::models::{AwardedPrize, ClaimState, Completion, Level, LevelPrize, Player, PlayerLevel, Prize};
use crate::error::{Error, Result};

// ============================================
// ROW MAPPING
// ============================================

const PLAYER_LEVEL_COLUMNS: &str = "id, player_id, level_id, is_completed, completed_at, score";

const LEVEL_PRIZE_COLUMNS: &str = "id, prize_id, player_level_id, is_received, received_at";

pub(crate) fn player_level_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerLevel> {
    let completion =
        Completion::from_columns(row.get(3)?, row.get(4)?).map_err(|e| e.into_row_error(3))?;
    Ok(PlayerLevel {
        id: row.get(0)?,
        player_id: row.get(1)?,
        level_id: row.get(2)?,
        completion,
        score: row.get(5)?,
    })
}

pub(crate) fn level_prize_from_row(row: &Row<'_>) -> rusqlite::Result<LevelPrize> {
    let claim =
        ClaimState::from_columns(row.get(3)?, row.get(4)?).map_err(|e| e.into_row_error(3))?;
    Ok(LevelPrize {
        id: row.get(0)?,
        prize_id: row.get(1)?,
        player_level_id: row.get(2)?,
        claim,
    })
}

/// Row mapper for `LEVEL_PRIZE_COLUMNS` followed by the prize title
fn awarded_prize_from_row(row: &Row<'_>) -> rusqlite::Result<AwardedPrize> {
    Ok(AwardedPrize {
        award: level_prize_from_row(row)?,
        prize_title: row.get(5)?,
    })
}

pub(crate) fn find_player_level_in(
    conn: &Connection,
    player_id: &str,
    level_id: i64,
) -> rusqlite::Result<Option<PlayerLevel>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM player_level WHERE player_id = ?1 AND level_id = ?2",
            PLAYER_LEVEL_COLUMNS
        ),
        params![player_id, level_id],
        player_level_from_row,
    )
    .optional()
}

pub(crate) fn get_level_prize_in(conn: &Connection, id: i64) -> rusqlite::Result<Option<LevelPrize>> {
    conn.query_row(
        &format!("SELECT {} FROM level_prize WHERE id = ?1", LEVEL_PRIZE_COLUMNS),
        params![id],
        level_prize_from_row,
    )
    .optional()
}

pub(crate) fn list_level_prizes_in(
    conn: &Connection,
    player_level_id: i64,
) -> rusqlite::Result<Vec<LevelPrize>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM level_prize WHERE player_level_id = ?1 ORDER BY id",
        LEVEL_PRIZE_COLUMNS
    ))?;
    let awards = stmt
        .query_map(params![player_level_id], level_prize_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(awards)
}

fn exists_in(conn: &Connection, sql: &str, key: &dyn rusqlite::ToSql) -> rusqlite::Result<bool> {
    conn.query_row(sql, &[key], |r| r.get(0))
}

// ============================================
// PLAYER REPOSITORY
// ============================================

/// Repository for Player CRUD operations
pub struct PlayerRepository {
    db: ProgressDb,
}

impl PlayerRepository {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    /// Create a new player
    pub fn create(&self, player: &Player) -> Result<()> {
        let conn = self.db.conn();
        conn.execute("INSERT INTO player (id) VALUES (?1)", params![player.id])
            .map_err(|e| Error::from_insert(e, || format!("player {} already exists", player.id)))?;
        debug!("Created player {}", player.id);
        Ok(())
    }

    /// Get a player by ID
    pub fn get(&self, id: &str) -> Result<Option<Player>> {
        let conn = self.db.conn();
        let player = conn
            .query_row("SELECT id FROM player WHERE id = ?1", params![id], |row| {
                Ok(Player { id: row.get(0)? })
            })
            .optional()?;
        Ok(player)
    }

    /// List all players
    pub fn list(&self) -> Result<Vec<Player>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare("SELECT id FROM player ORDER BY id")?;
        let players = stmt
            .query_map([], |row| Ok(Player { id: row.get(0)? }))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(players)
    }

    /// Delete a player together with its progress and awards.
    /// Returns false if there was no such player.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.db.conn();
        let deleted = conn.execute("DELETE FROM player WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

// ============================================
// LEVEL REPOSITORY
// ============================================

/// Repository for Level CRUD operations
pub struct LevelRepository {
    db: ProgressDb,
}

impl LevelRepository {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    /// Create a new level
    pub fn create(&self, level: &Level) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO level (id, title, "order") VALUES (?1, ?2, ?3)"#,
            params![level.id, level.title, level.order],
        )
        .map_err(|e| Error::from_insert(e, || format!("level {} already exists", level.id)))?;
        Ok(())
    }

    /// Get a level by ID
    pub fn get(&self, id: i64) -> Result<Option<Level>> {
        let conn = self.db.conn();
        let level = conn
            .query_row(
                r#"SELECT id, title, "order" FROM level WHERE id = ?1"#,
                params![id],
                |row| {
                    Ok(Level {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        order: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(level)
    }

    /// List all levels in play order
    pub fn list(&self) -> Result<Vec<Level>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(r#"SELECT id, title, "order" FROM level ORDER BY "order", id"#)?;
        let levels = stmt
            .query_map([], |row| {
                Ok(Level {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    order: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(levels)
    }

    /// Delete a level together with all progress on it
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.db.conn();
        let deleted = conn.execute("DELETE FROM level WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

// ============================================
// PRIZE REPOSITORY
// ============================================

/// Repository for Prize CRUD operations
pub struct PrizeRepository {
    db: ProgressDb,
}

impl PrizeRepository {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    /// Create a new prize
    pub fn create(&self, prize: &Prize) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO prize (id, title) VALUES (?1, ?2)",
            params![prize.id, prize.title],
        )
        .map_err(|e| Error::from_insert(e, || format!("prize {} already exists", prize.id)))?;
        Ok(())
    }

    /// Create several prizes in one transaction
    pub fn create_all(&self, prizes: &[Prize]) -> Result<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO prize (id, title) VALUES (?1, ?2)")?;
            for prize in prizes {
                stmt.execute(params![prize.id, prize.title]).map_err(|e| {
                    Error::from_insert(e, || format!("prize {} already exists", prize.id))
                })?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Get a prize by ID
    pub fn get(&self, id: i64) -> Result<Option<Prize>> {
        let conn = self.db.conn();
        let prize = conn
            .query_row("SELECT id, title FROM prize WHERE id = ?1", params![id], |row| {
                Ok(Prize {
                    id: row.get(0)?,
                    title: row.get(1)?,
                })
            })
            .optional()?;
        Ok(prize)
    }

    /// List all prizes
    pub fn list(&self) -> Result<Vec<Prize>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare("SELECT id, title FROM prize ORDER BY id")?;
        let prizes = stmt
            .query_map([], |row| {
                Ok(Prize {
                    id: row.get(0)?,
                    title: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(prizes)
    }

    /// Delete a prize; awards of it go with it
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.db.conn();
        let deleted = conn.execute("DELETE FROM prize WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

// ============================================
// PLAYER LEVEL REPOSITORY
// ============================================

/// Repository for per-player level progress
pub struct PlayerLevelRepository {
    db: ProgressDb,
}

impl PlayerLevelRepository {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    /// Record that a player started a level.
    ///
    /// Fails with `NotFound` when the player or level is missing and with
    /// `Conflict` when the pair already has a progress record.
    pub fn start(&self, player_id: &str, level_id: i64) -> Result<PlayerLevel> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        if !exists_in(&tx, "SELECT EXISTS(SELECT 1 FROM player WHERE id = ?1)", &player_id)? {
            return Err(Error::not_found("player", player_id));
        }
        if !exists_in(&tx, "SELECT EXISTS(SELECT 1 FROM level WHERE id = ?1)", &level_id)? {
            return Err(Error::not_found("level", level_id));
        }

        let completion = Completion::InProgress;
        let (is_completed, completed_at) = completion.to_columns();
        tx.execute(
            r#"
            INSERT INTO player_level (player_id, level_id, is_completed, completed_at, score)
            VALUES (?1, ?2, ?3, ?4, 0)
            "#,
            params![player_id, level_id, is_completed, completed_at],
        )
        .map_err(|e| {
            Error::from_insert(e, || {
                format!("player {} already started level {}", player_id, level_id)
            })
        })?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Player {} started level {} (player_level {})", player_id, level_id, id);
        Ok(PlayerLevel {
            id,
            player_id: player_id.to_string(),
            level_id,
            completion,
            score: 0,
        })
    }

    /// Find the progress record of a (player, level) pair
    pub fn find(&self, player_id: &str, level_id: i64) -> Result<Option<PlayerLevel>> {
        let conn = self.db.conn();
        Ok(find_player_level_in(&conn, player_id, level_id)?)
    }

    /// Get a progress record by ID
    pub fn get(&self, id: i64) -> Result<Option<PlayerLevel>> {
        let conn = self.db.conn();
        let level = conn
            .query_row(
                &format!("SELECT {} FROM player_level WHERE id = ?1", PLAYER_LEVEL_COLUMNS),
                params![id],
                player_level_from_row,
            )
            .optional()?;
        Ok(level)
    }

    /// List a player's progress records in level order
    pub fn list_for_player(&self, player_id: &str) -> Result<Vec<PlayerLevel>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT pl.id, pl.player_id, pl.level_id, pl.is_completed, pl.completed_at, pl.score
            FROM player_level pl
            JOIN level l ON l.id = pl.level_id
            WHERE pl.player_id = ?1
            ORDER BY l."order", l.id
            "#,
        )?;
        let levels = stmt
            .query_map(params![player_id], player_level_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(levels)
    }
}

// ============================================
// LEVEL PRIZE REPOSITORY
// ============================================

/// Read access to award records. Awards are written only by the workflows.
pub struct LevelPrizeRepository {
    db: ProgressDb,
}

impl LevelPrizeRepository {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    /// Get an award by ID
    pub fn get(&self, id: i64) -> Result<Option<LevelPrize>> {
        let conn = self.db.conn();
        Ok(get_level_prize_in(&conn, id)?)
    }

    /// List the awards of one completion, in award order
    pub fn list_for_player_level(&self, player_level_id: i64) -> Result<Vec<AwardedPrize>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT lp.id, lp.prize_id, lp.player_level_id, lp.is_received, lp.received_at, p.title
            FROM level_prize lp
            JOIN prize p ON p.id = lp.prize_id
            WHERE lp.player_level_id = ?1
            ORDER BY lp.id
            "#,
        )?;
        let awards = stmt
            .query_map(params![player_level_id], awarded_prize_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(awards)
    }

    /// List every award a player has not claimed yet
    pub fn list_unclaimed_for_player(&self, player_id: &str) -> Result<Vec<AwardedPrize>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT lp.id, lp.prize_id, lp.player_level_id, lp.is_received, lp.received_at, p.title
            FROM level_prize lp
            JOIN prize p ON p.id = lp.prize_id
            JOIN player_level pl ON pl.id = lp.player_level_id
            WHERE pl.player_id = ?1 AND lp.is_received = 0
            ORDER BY lp.id
            "#,
        )?;
        let awards = stmt
            .query_map(params![player_id], awarded_prize_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(awards)
    }

    /// Count awards of one completion
    pub fn count_for_player_level(&self, player_level_id: i64) -> Result<usize> {
        let conn = self.db.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM level_prize WHERE player_level_id = ?1",
            params![player_level_id],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }
}
