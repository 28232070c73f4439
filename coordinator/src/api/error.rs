//! API error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use countrycache_common::CacheError;
use countrycache_store::StoreError;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};

/// Seconds a client should wait before retrying a refresh.
const RETRY_AFTER_SECS: &str = "30";

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short description.
    pub error: String,
    /// Extra context, when there is any safe to share.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("no route for request")]
    RouteNotFound,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Cache(err.into())
    }
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cache(err) => err.error_code(),
            Self::RouteNotFound => "NOT_FOUND",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Cache(err) => match err {
                CacheError::SourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                CacheError::NotFound(_) => StatusCode::NOT_FOUND,
                CacheError::ValidationFailure { .. } => StatusCode::BAD_REQUEST,
                CacheError::PersistenceFailure(_) | CacheError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::Cache(err @ CacheError::SourceUnavailable { .. }) => ErrorResponse {
                error: "External data source unavailable".to_string(),
                details: Some(Value::String(err.to_string())),
            },
            Self::Cache(CacheError::NotFound(what)) => ErrorResponse {
                error: what.clone(),
                details: None,
            },
            Self::Cache(CacheError::ValidationFailure { field, message }) => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(json!({ field.as_str(): message })),
            },
            Self::Cache(CacheError::PersistenceFailure(_) | CacheError::Internal(_)) => {
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    details: None,
                }
            }
            Self::RouteNotFound => ErrorResponse {
                error: "Not found".to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Cache(CacheError::SourceUnavailable { origin, reason }) => {
                warn!(source = %origin, reason = %reason, "Request failed, source unavailable");
            }
            Self::Cache(err) if status.is_server_error() => {
                error!(code = self.code(), error = %err, "Request failed");
            }
            _ => {}
        }

        let retryable = matches!(&self, Self::Cache(err) if err.is_retryable());
        let body = Json(self.body());
        if retryable {
            (status, [(header::RETRY_AFTER, RETRY_AFTER_SECS)], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use countrycache_common::DataSource;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(CacheError::source_unavailable(DataSource::Rates, "down")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::from(CacheError::PersistenceFailure("locked".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(CacheError::NotFound("Country not found".into())),
                StatusCode::NOT_FOUND,
            ),
            (ApiError::from(CacheError::required("name")), StatusCode::BAD_REQUEST),
            (ApiError::RouteNotFound, StatusCode::NOT_FOUND),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::from(CacheError::PersistenceFailure("UNIQUE constraint failed".into()));
        let body = serde_json::to_value(err.body()).unwrap();

        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[test]
    fn test_validation_body() {
        let body = serde_json::to_value(ApiError::from(CacheError::required("name")).body()).unwrap();

        assert_eq!(
            body,
            json!({ "error": "Validation failed", "details": { "name": "is required" } })
        );
    }
}
