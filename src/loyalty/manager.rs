//! Loyalty Manager - logins, streaks, daily points and boosts

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tracing::{debug, info};

use super::db::LoyaltyDb;
use super::models::{Boost, LoginOutcome, LoyaltyPlayer, PlayerBoost, PlayerLogin};
use super::streak::StreakInfo;
use crate::config::LoyaltySettings;
use crate::error::{Error, Result};
use crate::time_bucket::{self, day_bucket, from_millis, next_midnight, parse_day_bucket, to_millis};

const PLAYER_COLUMNS: &str = "id, username, created_at, daily_points, first_login, \
     next_accrual_available, current_streak, best_streak, last_login_day";

/// Boost type recorded for boosts created by streak rules
const STREAK_BOOST_KIND: &str = "streak";

/// Main manager for the loyalty program
pub struct LoyaltyManager {
    db: LoyaltyDb,
    settings: LoyaltySettings,
}

impl LoyaltyManager {
    pub fn new(db: LoyaltyDb, settings: LoyaltySettings) -> Self {
        Self { db, settings }
    }

    // ========================================
    // PLAYERS
    // ========================================

    /// Register a new player. `Conflict` if the username is taken.
    pub fn register(&self, username: &str) -> Result<LoyaltyPlayer> {
        self.register_at(username, time_bucket::now())
    }

    pub fn register_at(&self, username: &str, at: DateTime<Utc>) -> Result<LoyaltyPlayer> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO player (username, created_at) VALUES (?1, ?2)",
            params![username, to_millis(at)],
        )
        .map_err(|e| Error::from_insert(e, || format!("username {} is taken", username)))?;

        info!("Registered loyalty player {}", username);
        Ok(LoyaltyPlayer {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            created_at: at,
            daily_points: 0,
            first_login: None,
            next_accrual_available: None,
            streak: StreakInfo::default(),
        })
    }

    /// Get a player, registering it first if needed
    pub fn get_or_register(&self, username: &str) -> Result<LoyaltyPlayer> {
        match self.get_player(username)? {
            Some(player) => Ok(player),
            None => self.register(username),
        }
    }

    pub fn get_player(&self, username: &str) -> Result<Option<LoyaltyPlayer>> {
        let conn = self.db.conn();
        Ok(find_player_in(&conn, username)?)
    }

    // ========================================
    // LOGINS
    // ========================================

    /// Record a login at `at`.
    ///
    /// In one transaction: stores the login, sets `first_login`, advances the
    /// daily streak, accrues daily points when the accrual window is open and
    /// grants the boosts of any streak rule the new streak length hits.
    pub fn record_login(&self, username: &str, at: DateTime<Utc>) -> Result<LoginOutcome> {
        let mut conn = self.db.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut player =
            find_player_in(&tx, username)?.ok_or_else(|| Error::not_found("player", username))?;

        tx.execute(
            "INSERT INTO user_login (player_id, login_time) VALUES (?1, ?2)",
            params![player.id, to_millis(at)],
        )?;
        let login = PlayerLogin {
            id: tx.last_insert_rowid(),
            player_id: player.id,
            login_time: at,
        };

        if player.first_login.is_none() {
            player.first_login = Some(at);
        }

        let advanced = player.streak.advance(at.date_naive());
        let streak_extended = advanced.is_some();
        if let Some(streak) = advanced {
            player.streak = streak;
        }

        let accrual_open = player.next_accrual_available.is_none_or(|next| next <= at);
        let points_accrued = if accrual_open {
            player.daily_points += self.settings.daily_points;
            player.next_accrual_available = Some(next_midnight(at));
            self.settings.daily_points
        } else {
            0
        };

        tx.execute(
            r#"
            UPDATE player SET
                daily_points = ?2,
                first_login = ?3,
                next_accrual_available = ?4,
                current_streak = ?5,
                best_streak = ?6,
                last_login_day = ?7
            WHERE id = ?1
            "#,
            params![
                player.id,
                player.daily_points,
                player.first_login.map(to_millis),
                player.next_accrual_available.map(to_millis),
                player.streak.current,
                player.streak.best,
                player.streak.last_login_day.map(|d| d.format("%Y-%m-%d").to_string()),
            ],
        )?;

        let mut boosts_granted = Vec::new();
        if streak_extended {
            for rule in self
                .settings
                .streak_boosts
                .iter()
                .filter(|rule| rule.days == player.streak.current)
            {
                let boost_id = ensure_boost_in(&tx, &rule.boost)?;
                boosts_granted.push(insert_player_boost_in(
                    &tx,
                    player.id,
                    boost_id,
                    &rule.boost,
                    rule.value,
                    at,
                )?);
            }
        }

        tx.commit()?;

        debug!(
            "Login for {} on {}: streak {}, +{} points",
            username,
            day_bucket(at),
            player.streak.current,
            points_accrued
        );
        for boost in &boosts_granted {
            info!("{} earned boost {} ({})", username, boost.boost_name, boost.value);
        }

        Ok(LoginOutcome {
            login,
            streak: player.streak,
            streak_extended,
            points_accrued,
            daily_points: player.daily_points,
            boosts_granted,
        })
    }

    /// A player's logins, newest first
    pub fn logins_for(&self, username: &str) -> Result<Vec<PlayerLogin>> {
        let conn = self.db.conn();
        let player =
            find_player_in(&conn, username)?.ok_or_else(|| Error::not_found("player", username))?;

        let mut stmt = conn.prepare(
            "SELECT id, player_id, login_time FROM user_login WHERE player_id = ?1 ORDER BY login_time DESC, id DESC",
        )?;
        let logins = stmt
            .query_map(params![player.id], |row| {
                Ok(PlayerLogin {
                    id: row.get(0)?,
                    player_id: row.get(1)?,
                    login_time: millis_column(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logins)
    }

    // ========================================
    // BOOSTS
    // ========================================

    /// Create a boost or update the description and type of an existing one
    pub fn define_boost(&self, name: &str, description: Option<&str>, kind: &str) -> Result<Boost> {
        let conn = self.db.conn();
        conn.execute(
            r#"
            INSERT INTO boost (name, description, type) VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET description = ?2, type = ?3
            "#,
            params![name, description, kind],
        )?;
        let boost = find_boost_in(&conn, name)?.ok_or_else(|| Error::not_found("boost", name))?;
        Ok(boost)
    }

    pub fn list_boosts(&self) -> Result<Vec<Boost>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare("SELECT id, name, description, type FROM boost ORDER BY name")?;
        let boosts = stmt
            .query_map([], boost_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(boosts)
    }

    /// Grant a defined boost to a player
    pub fn grant_boost(
        &self,
        username: &str,
        boost_name: &str,
        value: f64,
        at: DateTime<Utc>,
    ) -> Result<PlayerBoost> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let player =
            find_player_in(&tx, username)?.ok_or_else(|| Error::not_found("player", username))?;
        let boost =
            find_boost_in(&tx, boost_name)?.ok_or_else(|| Error::not_found("boost", boost_name))?;
        let granted = insert_player_boost_in(&tx, player.id, boost.id, &boost.name, value, at)?;
        tx.commit()?;

        info!("Granted boost {} to {}", boost_name, username);
        Ok(granted)
    }

    /// Boosts a player has received, oldest first
    pub fn boosts_for(&self, username: &str) -> Result<Vec<PlayerBoost>> {
        let conn = self.db.conn();
        let player =
            find_player_in(&conn, username)?.ok_or_else(|| Error::not_found("player", username))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT pb.id, pb.player_id, pb.boost_id, b.name, pb.value, pb.received_at
            FROM player_boost pb
            JOIN boost b ON b.id = pb.boost_id
            WHERE pb.player_id = ?1
            ORDER BY pb.received_at, pb.id
            "#,
        )?;
        let boosts = stmt
            .query_map(params![player.id], |row| {
                Ok(PlayerBoost {
                    id: row.get(0)?,
                    player_id: row.get(1)?,
                    boost_id: row.get(2)?,
                    boost_name: row.get(3)?,
                    value: row.get(4)?,
                    received_at: millis_column(row, 5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(boosts)
    }
}

// ========================================
// ROW HELPERS
// ========================================

fn millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    from_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

fn optional_millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(ms) => from_millis(ms)
            .map(Some)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms)),
        None => Ok(None),
    }
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<LoyaltyPlayer> {
    let last_login_day = match row.get::<_, Option<String>>(8)? {
        Some(day) => Some(parse_day_bucket(&day).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(8, "last_login_day".to_string(), Type::Text)
        })?),
        None => None,
    };

    Ok(LoyaltyPlayer {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: millis_column(row, 2)?,
        daily_points: row.get(3)?,
        first_login: optional_millis_column(row, 4)?,
        next_accrual_available: optional_millis_column(row, 5)?,
        streak: StreakInfo {
            current: row.get(6)?,
            best: row.get(7)?,
            last_login_day,
        },
    })
}

fn boost_from_row(row: &Row<'_>) -> rusqlite::Result<Boost> {
    Ok(Boost {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        kind: row.get(3)?,
    })
}

fn find_player_in(conn: &Connection, username: &str) -> rusqlite::Result<Option<LoyaltyPlayer>> {
    conn.query_row(
        &format!("SELECT {} FROM player WHERE username = ?1", PLAYER_COLUMNS),
        params![username],
        player_from_row,
    )
    .optional()
}

fn find_boost_in(conn: &Connection, name: &str) -> rusqlite::Result<Option<Boost>> {
    conn.query_row(
        "SELECT id, name, description, type FROM boost WHERE name = ?1",
        params![name],
        boost_from_row,
    )
    .optional()
}

/// Id of the named boost, creating it as a streak boost when missing
fn ensure_boost_in(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO boost (name, description, type) VALUES (?1, NULL, ?2)",
        params![name, STREAK_BOOST_KIND],
    )?;
    conn.query_row("SELECT id FROM boost WHERE name = ?1", params![name], |r| r.get(0))
}

fn insert_player_boost_in(
    conn: &Connection,
    player_id: i64,
    boost_id: i64,
    boost_name: &str,
    value: f64,
    at: DateTime<Utc>,
) -> rusqlite::Result<PlayerBoost> {
    conn.execute(
        "INSERT INTO player_boost (player_id, boost_id, value, received_at) VALUES (?1, ?2, ?3, ?4)",
        params![player_id, boost_id, value, to_millis(at)],
    )?;
    Ok(PlayerBoost {
        id: conn.last_insert_rowid(),
        player_id,
        boost_id,
        boost_name: boost_name.to_string(),
        value,
        received_at: at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreakBoostRule;
    use chrono::TimeZone;

    fn manager() -> LoyaltyManager {
        LoyaltyManager::new(
            LoyaltyDb::open_in_memory().unwrap(),
            LoyaltySettings::default(),
        )
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_register_twice_is_conflict() {
        let loyalty = manager();
        let player = loyalty.register_at("alice", at(1, 8)).unwrap();
        assert_eq!(player.daily_points, 0);
        assert!(player.first_login.is_none());

        let err = loyalty.register("alice").unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_login_unknown_player_is_not_found() {
        let loyalty = manager();
        let err = loyalty.record_login("ghost", at(1, 8)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_first_login_accrues_and_sets_window() {
        let loyalty = manager();
        loyalty.register("alice").unwrap();

        let outcome = loyalty.record_login("alice", at(1, 8)).unwrap();
        assert_eq!(outcome.points_accrued, 10);
        assert_eq!(outcome.daily_points, 10);
        assert_eq!(outcome.streak.current, 1);
        assert!(outcome.streak_extended);

        let player = loyalty.get_player("alice").unwrap().unwrap();
        assert_eq!(player.first_login, Some(at(1, 8)));
        assert_eq!(player.next_accrual_available, Some(at(2, 0)));
        assert_eq!(player.streak, outcome.streak);
    }

    #[test]
    fn test_second_login_same_day_accrues_nothing() {
        let loyalty = manager();
        loyalty.register("alice").unwrap();
        loyalty.record_login("alice", at(1, 8)).unwrap();

        let outcome = loyalty.record_login("alice", at(1, 20)).unwrap();
        assert_eq!(outcome.points_accrued, 0);
        assert_eq!(outcome.daily_points, 10);
        assert!(!outcome.streak_extended);
        assert_eq!(outcome.streak.current, 1);

        let player = loyalty.get_player("alice").unwrap().unwrap();
        assert_eq!(player.first_login, Some(at(1, 8)));
        assert_eq!(loyalty.logins_for("alice").unwrap().len(), 2);
    }

    #[test]
    fn test_streak_rule_grants_boost_once() {
        let loyalty = manager();
        loyalty.register("alice").unwrap();

        let mut granted = Vec::new();
        for day in 1..=4 {
            let outcome = loyalty.record_login("alice", at(day, 9)).unwrap();
            granted.extend(outcome.boosts_granted);
        }

        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].boost_name, "streak_3");
        assert_eq!(granted[0].received_at, at(3, 9));

        let boosts = loyalty.boosts_for("alice").unwrap();
        assert_eq!(boosts, granted);
        assert_eq!(loyalty.list_boosts().unwrap()[0].kind, "streak");
    }

    #[test]
    fn test_live_streak_lapses_after_missed_day() {
        let loyalty = manager();
        loyalty.register("alice").unwrap();
        loyalty.record_login("alice", at(1, 9)).unwrap();
        loyalty.record_login("alice", at(2, 9)).unwrap();

        let player = loyalty.get_player("alice").unwrap().unwrap();
        assert_eq!(player.live_streak(at(2, 23).date_naive()), 2);
        assert_eq!(player.live_streak(at(3, 12).date_naive()), 2);
        assert_eq!(player.live_streak(at(4, 0).date_naive()), 0);
        assert_eq!(player.streak.current, 2);
    }

    #[test]
    fn test_custom_rules() {
        let settings = LoyaltySettings {
            daily_points: 5,
            streak_boosts: vec![StreakBoostRule {
                days: 1,
                boost: "welcome".to_string(),
                value: 2.0,
            }],
        };
        let loyalty = LoyaltyManager::new(LoyaltyDb::open_in_memory().unwrap(), settings);
        loyalty.register("bob").unwrap();

        let outcome = loyalty.record_login("bob", at(5, 12)).unwrap();
        assert_eq!(outcome.daily_points, 5);
        assert_eq!(outcome.boosts_granted.len(), 1);
        assert_eq!(outcome.boosts_granted[0].value, 2.0);
    }

    #[test]
    fn test_define_boost_upserts() {
        let loyalty = manager();
        let first = loyalty.define_boost("shield", None, "defense").unwrap();
        let second = loyalty
            .define_boost("shield", Some("Blocks one hit"), "defense")
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.description.as_deref(), Some("Blocks one hit"));
        assert_eq!(loyalty.list_boosts().unwrap().len(), 1);
    }

    #[test]
    fn test_grant_boost_requires_both_sides() {
        let loyalty = manager();
        loyalty.register("alice").unwrap();
        loyalty.define_boost("shield", None, "defense").unwrap();

        assert!(
            loyalty
                .grant_boost("ghost", "shield", 1.0, at(1, 1))
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            loyalty
                .grant_boost("alice", "nope", 1.0, at(1, 1))
                .unwrap_err()
                .is_not_found()
        );

        let granted = loyalty.grant_boost("alice", "shield", 1.5, at(1, 1)).unwrap();
        assert_eq!(granted.boost_name, "shield");
        assert_eq!(loyalty.boosts_for("alice").unwrap(), vec![granted]);
    }
}
