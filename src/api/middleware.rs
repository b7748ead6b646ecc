//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope returned by every handler
//! - Request statistics collected for the monitoring endpoints

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::db::{DynDatabasePool, DynDocumentRepository};
use crate::models::ValidationError;
use crate::services::{CatalogService, ProgressService, SessionService, UserService};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    /// Total number of requests processed
    total_requests: AtomicU64,
    /// Total response time in microseconds (for calculating average)
    total_response_time_us: AtomicU64,
    /// Application start time
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Record the duration of every request
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;

    let duration_us = start.elapsed().as_micros() as u64;
    state.request_stats.record(duration_us);

    response
}

// ============================================================================
// Application State
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub repo: DynDocumentRepository,
    pub catalog_service: Arc<CatalogService>,
    pub user_service: Arc<UserService>,
    pub progress_service: Arc<ProgressService>,
    pub session_service: Arc<SessionService>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Build every service over one store handle
    pub fn new(pool: DynDatabasePool, repo: DynDocumentRepository) -> Self {
        Self {
            pool,
            catalog_service: Arc::new(CatalogService::new(repo.clone())),
            user_service: Arc::new(UserService::new(repo.clone())),
            progress_service: Arc::new(ProgressService::new(repo.clone())),
            session_service: Arc::new(SessionService::new(repo.clone())),
            repo,
            request_stats: Arc::new(RequestStats::new()),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    /// Validation failure carrying every field error
    pub fn validation(err: &ValidationError) -> Self {
        let details = serde_json::to_value(err).unwrap_or(serde_json::Value::Null);
        Self::with_details("VALIDATION_ERROR", "Request validation failed", details)
    }

    /// Internal failure; the cause is logged, not returned
    pub fn internal_error(err: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {}", err);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::UNPROCESSABLE_ENTITY,
            "CONFLICT" => StatusCode::CONFLICT,
            "INVALID_JSON" => StatusCode::BAD_REQUEST,
            "UNSUPPORTED_MEDIA_TYPE" => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::validation(&err)
    }
}

/// Body extraction failures get the same envelope as every other error
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::new(
                "UNSUPPORTED_MEDIA_TYPE",
                "Expected request with `Content-Type: application/json`",
            ),
            other => Self::new("INVALID_JSON", other.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
