//! Source gateway error types.

use countrycache_common::{CacheError, DataSource};
use thiserror::Error;

/// Errors that can occur while fetching an external directory.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The request could not be sent or the body could not be read.
    #[error("{origin} request failed: {message}")]
    Transport { origin: DataSource, message: String },

    /// The remote service answered with a non-success status.
    #[error("{origin} responded with HTTP {status}")]
    Status { origin: DataSource, status: u16 },

    /// The response body did not have the expected shape.
    #[error("{origin} payload malformed: {message}")]
    Malformed { origin: DataSource, message: String },

    /// The fetch did not complete within its bound.
    #[error("{origin} fetch timed out after {timeout_ms}ms")]
    Timeout { origin: DataSource, timeout_ms: u64 },

    /// The HTTP client could not be built. Not tied to either directory.
    #[error("HTTP client setup failed: {message}")]
    Client { message: String },
}

impl SourceError {
    /// The directory this error is attributed to, if any.
    pub fn origin(&self) -> Option<DataSource> {
        match self {
            SourceError::Transport { origin, .. }
            | SourceError::Status { origin, .. }
            | SourceError::Malformed { origin, .. }
            | SourceError::Timeout { origin, .. } => Some(*origin),
            SourceError::Client { .. } => None,
        }
    }

    pub(crate) fn transport(origin: DataSource, err: impl std::fmt::Display) -> Self {
        SourceError::Transport {
            origin,
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(origin: DataSource, message: impl Into<String>) -> Self {
        SourceError::Malformed {
            origin,
            message: message.into(),
        }
    }
}

impl From<SourceError> for CacheError {
    fn from(err: SourceError) -> Self {
        match err.origin() {
            Some(origin) => CacheError::SourceUnavailable {
                origin,
                reason: err.to_string(),
            },
            None => CacheError::Internal(err.to_string()),
        }
    }
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_source_unavailable() {
        let err = SourceError::Status {
            origin: DataSource::Countries,
            status: 502,
        };
        assert_eq!(err.to_string(), "countries responded with HTTP 502");

        match CacheError::from(err) {
            CacheError::SourceUnavailable { origin, reason } => {
                assert_eq!(origin, DataSource::Countries);
                assert!(reason.contains("502"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_client_setup_failure_is_internal() {
        let err = SourceError::Client {
            message: "no TLS backend".to_string(),
        };
        assert_eq!(err.origin(), None);

        let cache_err = CacheError::from(err);
        assert!(matches!(cache_err, CacheError::Internal(_)));
        assert!(!cache_err.is_retryable());
    }
}
