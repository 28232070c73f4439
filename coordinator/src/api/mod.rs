//! HTTP surface.

pub mod error;
pub mod handlers;
pub mod state;

#[cfg(test)]
mod tests;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/status", get(handlers::get_status))
        .route("/countries", get(handlers::list_countries))
        .route("/countries/refresh", post(handlers::refresh_countries))
        // Static segment wins over the `{name}` capture.
        .route(
            "/countries/image",
            get(handlers::get_image).delete(handlers::delete_country_named_image),
        )
        .route(
            "/countries/{name}",
            get(handlers::get_country).delete(handlers::delete_country),
        );

    if state.config.metrics_enabled {
        router = router.route("/metrics", get(handlers::get_metrics));
    }

    router
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
