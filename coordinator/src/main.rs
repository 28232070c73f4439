//! Country Cache Binary
//!
//! Serves the cached country data over HTTP and refreshes it on demand.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use countrycache_coordinator::api::{create_router, AppState};
use countrycache_coordinator::{
    CacheConfig, Metrics, RefreshCoordinator, SvgSummaryRenderer, UniformMultiplier,
};
use countrycache_sources::HttpGateway;
use countrycache_store::CacheStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let dotenv = dotenvy::dotenv();

    // Load configuration
    let config = CacheConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting Country Cache");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let store = CacheStore::connect(&config.store).await?;
    let gateway = Arc::new(HttpGateway::new(config.sources.clone())?);
    let metrics = Arc::new(Metrics::new());

    let coordinator = RefreshCoordinator::new(
        gateway.clone(),
        gateway,
        store,
        Arc::new(SvgSummaryRenderer::new(&config.summary.image_path)),
    )
    .with_multiplier(Arc::new(UniformMultiplier))
    .with_metrics(metrics)
    .with_fetch_timeout(config.sources.timeout);

    let bind_addr = config.bind_addr();
    let router = create_router(AppState::new(coordinator, config));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!(listen_addr = %bind_addr, "Country Cache listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Country Cache shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
