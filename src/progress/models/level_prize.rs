//! LevelPrize model - a prize awarded for a level completion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, InconsistentColumns, Result};
use crate::time_bucket::{from_millis, to_millis};

/// Claim state of an award, stored as `is_received` / `received_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClaimState {
    Unclaimed,
    Claimed { at: DateTime<Utc> },
}

impl ClaimState {
    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimState::Claimed { .. })
    }

    pub fn claimed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ClaimState::Unclaimed => None,
            ClaimState::Claimed { at } => Some(*at),
        }
    }

    /// Transition `unclaimed -> claimed`. Claiming twice is a conflict.
    pub fn claim(&mut self, at: DateTime<Utc>) -> Result<()> {
        match self {
            ClaimState::Unclaimed => {
                *self = ClaimState::Claimed { at };
                Ok(())
            }
            ClaimState::Claimed { at: claimed } => Err(Error::Conflict(format!(
                "prize already claimed at {}",
                claimed.to_rfc3339()
            ))),
        }
    }

    pub(crate) fn to_columns(self) -> (bool, Option<i64>) {
        match self {
            ClaimState::Unclaimed => (false, None),
            ClaimState::Claimed { at } => (true, Some(to_millis(at))),
        }
    }

    pub(crate) fn from_columns(
        is_received: bool,
        received_at: Option<i64>,
    ) -> std::result::Result<Self, InconsistentColumns> {
        match (is_received, received_at.map(from_millis)) {
            (false, None) => Ok(ClaimState::Unclaimed),
            (true, Some(Some(at))) => Ok(ClaimState::Claimed { at }),
            _ => Err(InconsistentColumns {
                flag: "is_received",
                timestamp: "received_at",
            }),
        }
    }
}

/// Award record linking a prize to one player-level completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelPrize {
    pub id: i64,
    pub prize_id: i64,
    pub player_level_id: i64,
    pub claim: ClaimState,
}

impl LevelPrize {
    pub fn is_received(&self) -> bool {
        self.claim.is_claimed()
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.claim.claimed_at()
    }

    pub fn claim(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.claim.claim(at).map_err(|err| match err {
            Error::Conflict(_) => Error::Conflict(format!("award {} already claimed", self.id)),
            other => other,
        })
    }
}

/// An award joined with its prize title, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardedPrize {
    #[serde(flatten)]
    pub award: LevelPrize,
    pub prize_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_claim_lifecycle() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        let mut award = LevelPrize {
            id: 3,
            prize_id: 1,
            player_level_id: 1,
            claim: ClaimState::Unclaimed,
        };
        assert!(!award.is_received());
        assert_eq!(award.claim.to_columns(), (false, None));

        award.claim(now).unwrap();
        assert!(award.is_received());
        assert_eq!(award.received_at(), Some(now));

        let err = award.claim(now).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "conflict: award 3 already claimed");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(ClaimState::Unclaimed).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "unclaimed" }));
    }
}
