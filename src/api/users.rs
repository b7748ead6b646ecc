//! User API endpoints
//!
//! - POST /api/v1/users - Register a user
//! - GET /api/v1/users/{id} - Get a user
//! - GET /api/v1/users/{id}/progress - Progress entries of a user

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{ProgressResponse, Schema, UserCreate, UserResponse};
use crate::services::UserServiceError;

/// Response for a user's progress list
#[derive(Debug, Serialize)]
pub struct UserProgressResponse {
    pub user_id: String,
    pub progress: Vec<ProgressResponse>,
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::Validation(e) => ApiError::validation(&e),
            UserServiceError::UserExists(msg) => {
                ApiError::conflict(format!("User already exists: {}", msg))
            }
            UserServiceError::NotFound(id) => ApiError::not_found(format!("User not found: {}", id)),
            UserServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the users router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/{id}", get(get_user))
        .route("/{id}/progress", get(list_user_progress))
}

/// POST /api/v1/users
async fn register(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(body) = body?;
    let input = UserCreate::from_json(&body)?;
    let user = state.user_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.get(&id).await?;
    Ok(Json(user))
}

/// GET /api/v1/users/{id}/progress
///
/// The user must exist; an existing user without progress gets an empty list.
async fn list_user_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProgressResponse>, ApiError> {
    state.user_service.get(&id).await?;
    let progress = state.progress_service.list_for_user(&id).await?;
    Ok(Json(UserProgressResponse {
        user_id: id,
        progress,
    }))
}
