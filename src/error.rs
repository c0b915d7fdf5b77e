//! Error taxonomy for the progress and loyalty stores

use std::fmt;

use rusqlite::ffi;

/// Errors surfaced by the progress workflows and the loyalty manager.
///
/// Every workflow runs inside one transaction; when an `Err` is returned the
/// transaction has been rolled back and nothing it wrote is visible.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no such {entity} record: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Error::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Error::PreconditionFailed(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Map a failed INSERT to `Conflict` when it hit a primary key or unique
    /// constraint, otherwise keep it as a persistence error.
    pub(crate) fn from_insert(err: rusqlite::Error, conflict: impl FnOnce() -> String) -> Self {
        if is_duplicate_key(&err) {
            Error::Conflict(conflict())
        } else {
            Error::Persistence(err)
        }
    }
}

fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

/// Stored flag/timestamp columns that disagree with each other.
#[derive(Debug, thiserror::Error)]
#[error("columns {flag} and {timestamp} disagree")]
pub(crate) struct InconsistentColumns {
    pub flag: &'static str,
    pub timestamp: &'static str,
}

impl InconsistentColumns {
    /// Wrap into the rusqlite error a row mapper can return.
    pub(crate) fn into_row_error(self, column: usize) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Integer,
            Box::new(self),
        )
    }
}
