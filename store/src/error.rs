//! Store error types.

use countrycache_common::CacheError;
use thiserror::Error;

/// Cache store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt metadata: {0}")]
    Corrupt(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),
}

impl From<StoreError> for CacheError {
    fn from(err: StoreError) -> Self {
        CacheError::PersistenceFailure(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
