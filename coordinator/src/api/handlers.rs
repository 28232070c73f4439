//! Request handlers.

use std::io::ErrorKind;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use countrycache_common::{iso_millis, CacheError, Timestamp};
use countrycache_store::{CountryFilter, CountryRow, SortOrder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::summary::SUMMARY_CONTENT_TYPE;

/// Response to a committed refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: &'static str,
    pub total_countries: u64,
    #[serde(serialize_with = "iso_millis::serialize")]
    pub last_refreshed_at: Timestamp,
}

/// Cache status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_countries: u64,
    #[serde(serialize_with = "iso_millis::option::serialize")]
    pub last_refreshed_at: Option<Timestamp>,
}

/// Listing query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

impl ListParams {
    fn filter(&self) -> CountryFilter {
        let mut filter = CountryFilter::new().sort(SortOrder::parse(self.sort.as_deref()));
        if let Some(region) = &self.region {
            filter = filter.region(region.as_str());
        }
        if let Some(currency) = &self.currency {
            filter = filter.currency(currency.as_str());
        }
        filter
    }
}

/// Health probe.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Country Cache API" }))
}

/// Refresh the cache from both sources.
pub async fn refresh_countries(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let outcome = state.coordinator.refresh().await?;

    Ok(Json(RefreshResponse {
        message: "Refresh completed",
        total_countries: outcome.total_count,
        last_refreshed_at: outcome.last_refreshed_at,
    }))
}

/// List cached countries.
pub async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<CountryRow>>> {
    let filter = params.filter();
    let rows = state.store.list(&filter).await?;
    debug!(?filter, count = rows.len(), "Listed countries");
    Ok(Json(rows))
}

/// Get one country by name.
pub async fn get_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<CountryRow>> {
    let name = required_name(&name)?;
    let row = state
        .store
        .get_by_name(name)
        .await?
        .ok_or_else(country_not_found)?;
    Ok(Json(row))
}

/// Delete one country by name.
pub async fn delete_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    delete_named(&state, &name).await
}

/// `DELETE /countries/image`: the literal segment shadows `{name}`.
pub async fn delete_country_named_image(
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    delete_named(&state, "image").await
}

async fn delete_named(state: &AppState, name: &str) -> ApiResult<Json<Value>> {
    let name = required_name(name)?;
    if !state.store.delete_by_name(name).await? {
        return Err(country_not_found());
    }
    info!(name, "Country deleted");
    Ok(Json(json!({ "message": "Country deleted" })))
}

/// Serve the latest summary image.
pub async fn get_image(State(state): State<AppState>) -> ApiResult<Response> {
    let path = &state.config.summary.image_path;
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, SUMMARY_CONTENT_TYPE)], bytes).into_response()),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(ApiError::Cache(
            CacheError::NotFound("Summary image not found".to_string()),
        )),
        Err(err) => Err(ApiError::Cache(CacheError::Internal(format!(
            "reading {}: {}",
            path.display(),
            err
        )))),
    }
}

/// Row count and last refresh time.
pub async fn get_status(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    let total_countries = state.store.count().await?;
    let last_refreshed_at = state.store.last_refreshed_at().await?;

    Ok(Json(StatusResponse {
        total_countries,
        last_refreshed_at,
    }))
}

/// Prometheus metrics.
pub async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

/// JSON 404 for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

fn required_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CacheError::required("name").into());
    }
    Ok(trimmed)
}

fn country_not_found() -> ApiError {
    ApiError::Cache(CacheError::NotFound("Country not found".to_string()))
}
