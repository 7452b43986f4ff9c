//! Ledger store error types.

use std::time::Duration;
use thiserror::Error;

/// SQLSTATE codes worth retrying: serialization failure, deadlock,
/// statement timeout, lock not available.
const TRANSIENT_SQLSTATES: [&str; 4] = ["40001", "40P01", "57014", "55P03"];

/// Ledger store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Operation did not finish in time
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Failure reported by a non-SQL backend
    #[error("Store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Timeout(_) => true,
            StoreError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            StoreError::Database(sqlx::Error::Database(db)) => db
                .code()
                .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref())),
            _ => false,
        }
    }
}

/// Result type for ledger store operations
pub type StoreResult<T> = Result<T, StoreError>;
