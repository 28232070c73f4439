//! Error types for country cache operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The two independent external directories a refresh depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// The country directory.
    Countries,
    /// The currency exchange-rate table.
    Rates,
}

impl DataSource {
    /// Short identifier used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Countries => "countries",
            DataSource::Rates => "rates",
        }
    }

    /// Human-readable name of the remote API.
    pub fn api_name(&self) -> &'static str {
        match self {
            DataSource::Countries => "Countries API",
            DataSource::Rates => "Exchange Rates API",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for country cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An external directory could not be fetched. Nothing was written.
    #[error("Could not fetch data from {}", .origin.api_name())]
    SourceUnavailable { origin: DataSource, reason: String },

    /// The atomic batch failed and was rolled back.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Lookup or delete against an absent key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required input was missing or blank.
    #[error("Validation failed on {field}: {message}")]
    ValidationFailure { field: String, message: String },

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Create a source failure attributed to `origin`.
    pub fn source_unavailable(origin: DataSource, reason: impl Into<String>) -> Self {
        CacheError::SourceUnavailable {
            origin,
            reason: reason.into(),
        }
    }

    /// Create a validation failure for a required field.
    pub fn required(field: impl Into<String>) -> Self {
        CacheError::ValidationFailure {
            field: field.into(),
            message: "is required".to_string(),
        }
    }

    /// Check if retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::SourceUnavailable { .. })
    }

    /// Get the stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            CacheError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            CacheError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            CacheError::NotFound(_) => "NOT_FOUND",
            CacheError::ValidationFailure { .. } => "VALIDATION_FAILURE",
            CacheError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for country cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
