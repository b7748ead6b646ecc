//! API layer - HTTP handlers and routing
//!
//! Every endpoint lives under `/api/v1`:
//! - Monitoring endpoints
//! - Catalog endpoints (categories, topics)
//! - User endpoints
//! - Progress endpoints
//! - Study session endpoints

pub mod catalog;
pub mod middleware;
pub mod monitoring;
pub mod progress;
pub mod sessions;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, RequestStats};

/// Build the main API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .merge(monitoring::router())
        .merge(catalog::router())
        .nest("/users", users::router())
        .nest("/progress", progress::router())
        .nest("/sessions", sessions::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE]);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!("Ignoring invalid CORS origin: {}", cors_origin),
    }

    Router::new()
        .nest("/api/v1", build_api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
