//! Engine error types

use thiserror::Error;

/// Errors raised by the recovery engine and its storage
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// An upstream exercise declared a muscle group outside the taxonomy
    #[error("Unknown muscle group: {0}")]
    UnknownMuscleGroup(String),

    /// Malformed session payload (missing ids, mismatched user)
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// Fold-before-write lost every retry against concurrent writers
    #[error("Write conflict persisted after {attempts} attempts")]
    WriteConflict { attempts: u32 },

    /// A row was changed by another writer between read and write
    #[error("Concurrent update detected")]
    StaleRecord,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl RecoveryError {
    /// Errors that are worth re-reading state and trying the write again
    pub fn is_retryable(&self) -> bool {
        match self {
            RecoveryError::StaleRecord => true,
            RecoveryError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecoveryError>;
