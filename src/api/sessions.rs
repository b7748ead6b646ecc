//! Study session API endpoints
//!
//! - POST /api/v1/sessions - Open a session over catalog topics
//! - GET /api/v1/sessions/{id} - Get a session

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Schema, SessionRequest, SessionResponse};
use crate::services::SessionServiceError;

impl From<SessionServiceError> for ApiError {
    fn from(err: SessionServiceError) -> Self {
        match err {
            SessionServiceError::Validation(e) => ApiError::validation(&e),
            SessionServiceError::UnknownTopics(ids) => ApiError::with_details(
                "NOT_FOUND",
                format!("Unknown topics: {}", ids.join(", ")),
                json!({ "topic_ids": ids }),
            ),
            SessionServiceError::NotFound(id) => {
                ApiError::not_found(format!("Session not found: {}", id))
            }
            SessionServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the sessions router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(get_session))
}

/// POST /api/v1/sessions
async fn create_session(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let Json(body) = body?;
    let request = SessionRequest::from_json(&body)?;
    let session = state.session_service.create(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.session_service.get(&id).await?;
    Ok(Json(session))
}
