//! PlayerLevel model - one player's progress on one level

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, InconsistentColumns, Result};
use crate::time_bucket::{from_millis, to_millis};

/// Completion state of a player level.
///
/// Stored as the `is_completed` / `completed_at` column pair; the pair is only
/// ever produced from this enum, so the two columns cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Completion {
    InProgress,
    Completed { at: DateTime<Utc> },
}

impl Completion {
    pub fn is_completed(&self) -> bool {
        matches!(self, Completion::Completed { .. })
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Completion::InProgress => None,
            Completion::Completed { at } => Some(*at),
        }
    }

    /// Transition `in_progress -> completed`.
    ///
    /// Completing twice is a conflict; the first timestamp is kept.
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<()> {
        match self {
            Completion::InProgress => {
                *self = Completion::Completed { at };
                Ok(())
            }
            Completion::Completed { at: done } => Err(Error::Conflict(format!(
                "level already completed at {}",
                done.to_rfc3339()
            ))),
        }
    }

    /// Project to `(is_completed, completed_at)` columns.
    pub(crate) fn to_columns(self) -> (bool, Option<i64>) {
        match self {
            Completion::InProgress => (false, None),
            Completion::Completed { at } => (true, Some(to_millis(at))),
        }
    }

    pub(crate) fn from_columns(
        is_completed: bool,
        completed_at: Option<i64>,
    ) -> std::result::Result<Self, InconsistentColumns> {
        match (is_completed, completed_at.map(from_millis)) {
            (false, None) => Ok(Completion::InProgress),
            (true, Some(Some(at))) => Ok(Completion::Completed { at }),
            _ => Err(InconsistentColumns {
                flag: "is_completed",
                timestamp: "completed_at",
            }),
        }
    }
}

/// Progress record, unique per (player, level)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLevel {
    pub id: i64,
    pub player_id: String,
    pub level_id: i64,
    pub completion: Completion,
    pub score: i64,
}

impl PlayerLevel {
    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completion.completed_at()
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.completion.complete(at).map_err(|err| match err {
            Error::Conflict(_) => Error::Conflict(format!(
                "player {} already completed level {}",
                self.player_id, self.level_id
            )),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_complete_sets_flag_and_timestamp_together() {
        let mut completion = Completion::InProgress;
        assert!(!completion.is_completed());
        assert_eq!(completion.completed_at(), None);

        completion.complete(at(9)).unwrap();
        assert!(completion.is_completed());
        assert_eq!(completion.completed_at(), Some(at(9)));
        assert_eq!(completion.to_columns(), (true, Some(to_millis(at(9)))));
    }

    #[test]
    fn test_complete_twice_is_conflict() {
        let mut level = PlayerLevel {
            id: 1,
            player_id: "p1".to_string(),
            level_id: 7,
            completion: Completion::InProgress,
            score: 0,
        };
        level.complete(at(9)).unwrap();

        let err = level.complete(at(10)).unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("level 7"));
        assert_eq!(level.completed_at(), Some(at(9)));
    }

    #[test]
    fn test_from_columns_rejects_half_set_pairs() {
        assert_eq!(
            Completion::from_columns(false, None).unwrap(),
            Completion::InProgress
        );
        assert!(Completion::from_columns(true, None).is_err());
        assert!(Completion::from_columns(false, Some(0)).is_err());

        let ms = to_millis(at(12));
        assert_eq!(
            Completion::from_columns(true, Some(ms)).unwrap(),
            Completion::Completed { at: at(12) }
        );
    }
}
