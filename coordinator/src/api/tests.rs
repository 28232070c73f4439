use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use countrycache_common::RawCountry;
use countrycache_sources::{MockCountrySource, MockRateSource};
use countrycache_store::CacheStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use super::{create_router, AppState};
use crate::config::CacheConfig;
use crate::coordinator::RefreshCoordinator;
use crate::reconciler::FixedMultiplier;
use crate::summary::SvgSummaryRenderer;

struct TestApp {
    router: Router,
    rates: Arc<MockRateSource>,
    _dir: TempDir,
}

fn directory() -> Vec<RawCountry> {
    vec![
        RawCountry::named("India")
            .with_region("Asia")
            .with_population(1_000)
            .with_currency("INR"),
        RawCountry::named("China")
            .with_region("Asia")
            .with_population(2_000)
            .with_currency("CNY"),
        RawCountry::named("Nepal")
            .with_region("Asia")
            .with_population(300)
            .with_currency("NPR"),
        RawCountry::named("Japan").with_region("Asia").with_population(50),
        RawCountry::named("France")
            .with_region("Europe")
            .with_population(700)
            .with_currency("EUR"),
    ]
}

async fn app(metrics_enabled: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = CacheConfig::default();
    config.summary.image_path = dir.path().join("cache/summary.svg");
    config.metrics_enabled = metrics_enabled;

    let rates = Arc::new(MockRateSource::new());
    rates.set_rate("INR", 2.0);
    rates.set_rate("CNY", 1.0);
    rates.set_rate("EUR", 0.5);

    let coordinator = RefreshCoordinator::new(
        Arc::new(MockCountrySource::new(directory())),
        rates.clone(),
        CacheStore::in_memory().await.unwrap(),
        Arc::new(SvgSummaryRenderer::new(&config.summary.image_path)),
    )
    .with_multiplier(Arc::new(FixedMultiplier(1000.0)));

    TestApp {
        router: create_router(AppState::new(coordinator, config)),
        rates,
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn json(&self, method: Method, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = self.send(method, uri).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn refresh(&self) -> Value {
        let (status, body) = self.json(Method::POST, "/countries/refresh").await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_root_health() {
    let app = app(true).await;

    let (status, body) = app.json(Method::GET, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Country Cache API" }));
}

#[tokio::test]
async fn test_status_before_and_after_refresh() {
    let app = app(true).await;

    let (_, before) = app.json(Method::GET, "/status").await;
    assert_eq!(before, json!({ "total_countries": 0, "last_refreshed_at": null }));

    let refreshed = app.refresh().await;
    assert_eq!(refreshed["message"], "Refresh completed");
    assert_eq!(refreshed["total_countries"], 5);
    let stamp = refreshed["last_refreshed_at"].as_str().unwrap();
    assert!(stamp.ends_with('Z'));

    let (_, after) = app.json(Method::GET, "/status").await;
    assert_eq!(after["total_countries"], 5);
    assert_eq!(after["last_refreshed_at"], stamp);
}

#[tokio::test]
async fn test_list_by_region_sorted_by_gdp() {
    let app = app(true).await;
    app.refresh().await;

    let (status, body) = app
        .json(Method::GET, "/countries?region=Asia&sort=gdp_desc")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["China", "India", "Japan", "Nepal"]);
    assert_eq!(body[0]["estimated_gdp"], 2_000_000.0);
    assert_eq!(body[0]["exchange_rate"], 1.0);
    assert_eq!(body[2]["currency_code"], Value::Null);
    assert_eq!(body[2]["estimated_gdp"], 0.0);
    assert_eq!(body[3]["estimated_gdp"], Value::Null);
    assert!(body[0]["id"].is_i64());
}

#[tokio::test]
async fn test_list_ignores_empty_filters() {
    let app = app(true).await;
    app.refresh().await;

    let (_, all) = app.json(Method::GET, "/countries?region=&currency=").await;
    assert_eq!(names(&all), vec!["China", "France", "India", "Japan", "Nepal"]);

    let (_, euro) = app.json(Method::GET, "/countries?currency=eur&sort=gdp_asc").await;
    assert_eq!(names(&euro), vec!["France"]);
}

#[tokio::test]
async fn test_get_country() {
    let app = app(true).await;
    app.refresh().await;

    let (status, body) = app.json(Method::GET, "/countries/india").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "India");
    assert_eq!(body["population"], 1_000);
    assert_eq!(body["estimated_gdp"], 500_000.0);

    let (status, body) = app.json(Method::GET, "/countries/Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Country not found" }));
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = app(true).await;
    app.refresh().await;

    let (status, body) = app.json(Method::DELETE, "/countries/Nepal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Country deleted" }));

    let (status, _) = app.json(Method::GET, "/countries/Nepal").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.json(Method::DELETE, "/countries/Nepal").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Country not found" }));

    let (_, status_body) = app.json(Method::GET, "/status").await;
    assert_eq!(status_body["total_countries"], 4);
}

#[tokio::test]
async fn test_delete_image_is_a_country_name() {
    let app = app(true).await;
    app.refresh().await;

    let (status, body) = app.json(Method::DELETE, "/countries/image").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Country not found" }));

    let (status, headers, _) = app.send(Method::GET, "/countries/image").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
}

#[tokio::test]
async fn test_blank_name_is_rejected() {
    let app = app(true).await;

    let (status, body) = app.json(Method::GET, "/countries/%20%20").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "Validation failed", "details": { "name": "is required" } })
    );
}

#[tokio::test]
async fn test_refresh_source_failure_is_503() {
    let app = app(true).await;
    app.rates.fail_with("connection reset");

    let (status, headers, body) = app.send(Method::POST, "/countries/refresh").await;
    let body: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({
            "error": "External data source unavailable",
            "details": "Could not fetch data from Exchange Rates API"
        })
    );
    assert!(headers.contains_key(header::RETRY_AFTER));

    let (_, status_body) = app.json(Method::GET, "/status").await;
    assert_eq!(status_body["total_countries"], 0);
}

#[tokio::test]
async fn test_summary_image() {
    let app = app(true).await;

    let (status, body) = app.json(Method::GET, "/countries/image").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Summary image not found" }));

    app.refresh().await;

    let (status, headers, body) = app.send(Method::GET, "/countries/image").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
    let svg = String::from_utf8(body).unwrap();
    assert!(svg.contains("Total countries: 5"));
    assert!(svg.contains("1. China - 2,000,000"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = app(true).await;

    let (status, body) = app.json(Method::GET, "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_metrics_endpoint_toggle() {
    let enabled = app(true).await;
    enabled.refresh().await;
    let (status, _, body) = enabled.send(Method::GET, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body)
        .unwrap()
        .contains("countrycache_refreshes_success 1"));

    let disabled = app(false).await;
    let (status, _) = disabled.json(Method::GET, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
