//! Progress API endpoints
//!
//! - POST /api/v1/progress - Record progress on a topic
//! - GET /api/v1/progress/{id} - Get a progress entry
//! - PATCH /api/v1/progress/{id} - Partially update status and notes

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{ProgressCreate, ProgressResponse, ProgressUpdate, Schema};
use crate::services::ProgressServiceError;

impl From<ProgressServiceError> for ApiError {
    fn from(err: ProgressServiceError) -> Self {
        match err {
            ProgressServiceError::Validation(e) => ApiError::validation(&e),
            ProgressServiceError::NotFound(id) => {
                ApiError::not_found(format!("Progress not found: {}", id))
            }
            ProgressServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the progress router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_progress))
        .route("/{id}", get(get_progress).patch(update_progress))
}

/// POST /api/v1/progress
async fn create_progress(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ProgressResponse>), ApiError> {
    let Json(body) = body?;
    let input = ProgressCreate::from_json(&body)?;
    let progress = state.progress_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(progress)))
}

/// GET /api/v1/progress/{id}
async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state.progress_service.get(&id).await?;
    Ok(Json(progress))
}

/// PATCH /api/v1/progress/{id}
///
/// Fields left out of the body keep their stored value.
async fn update_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let Json(body) = body?;
    let update = ProgressUpdate::from_json(&body)?;
    let progress = state.progress_service.update(&id, update).await?;
    Ok(Json(progress))
}
