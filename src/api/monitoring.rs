//! Monitoring API endpoints
//!
//! - GET /api/v1/monitoring/ - Liveness message and request statistics
//! - GET /api/v1/monitoring/store - Store connectivity and collection sizes
//!
//! The store check reports failure in the body with a 200 status so that
//! health checks can tell a broken store from a broken server.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::AppState;
use crate::db::CollectionInfo;

/// Response for the liveness check
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
}

/// Response for the store check
#[derive(Debug, Serialize)]
pub struct StoreStatusResponse {
    pub message: String,
    pub connected: bool,
    pub driver: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<CollectionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the monitoring router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/monitoring", get(status))
        .route("/monitoring/", get(status))
        .route("/monitoring/store", get(store_status))
}

/// GET /api/v1/monitoring/
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let stats = &state.request_stats;
    Json(StatusResponse {
        message: "Monitoring API is up and running.".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: stats.uptime_seconds(),
        total_requests: stats.total_requests(),
        avg_response_time_ms: stats.avg_response_time_us() / 1000.0,
    })
}

/// GET /api/v1/monitoring/store
async fn store_status(State(state): State<AppState>) -> Json<StoreStatusResponse> {
    let driver = format!("{:?}", state.pool.driver()).to_lowercase();

    let result = match state.pool.ping().await {
        Ok(()) => state.repo.collections().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(collections) => Json(StoreStatusResponse {
            message: "Store connection successful.".to_string(),
            connected: true,
            driver,
            collections,
            error: None,
        }),
        Err(e) => {
            tracing::warn!("Store check failed: {:#}", e);
            Json(StoreStatusResponse {
                message: "Store connection failed.".to_string(),
                connected: false,
                driver,
                collections: Vec::new(),
                error: Some(format!("{:#}", e)),
            })
        }
    }
}
