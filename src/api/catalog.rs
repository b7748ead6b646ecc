//! Catalog API endpoints
//!
//! - GET /api/v1/categories - All categories
//! - GET /api/v1/topics - All topics, optionally `?category_id=`
//! - GET /api/v1/topics/{id} - One topic

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Category, TopicResponse};
use crate::services::CatalogServiceError;

/// Query parameters for listing topics
#[derive(Debug, Deserialize)]
pub struct ListTopicsQuery {
    pub category_id: Option<String>,
}

/// Response for category list
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

/// Response for topic list
#[derive(Debug, Serialize)]
pub struct TopicListResponse {
    pub topics: Vec<TopicResponse>,
}

impl From<CatalogServiceError> for ApiError {
    fn from(err: CatalogServiceError) -> Self {
        match err {
            CatalogServiceError::TopicNotFound(id) => {
                ApiError::not_found(format!("Topic not found: {}", id))
            }
            CatalogServiceError::InternalError(e) => ApiError::internal_error(format!("{:#}", e)),
        }
    }
}

/// Build the catalog router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/topics", get(list_topics))
        .route("/topics/{id}", get(get_topic))
}

/// GET /api/v1/categories
async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let categories = state.catalog_service.list_categories().await?;
    Ok(Json(CategoryListResponse { categories }))
}

/// GET /api/v1/topics
async fn list_topics(
    State(state): State<AppState>,
    Query(query): Query<ListTopicsQuery>,
) -> Result<Json<TopicListResponse>, ApiError> {
    let topics = state
        .catalog_service
        .list_topics(query.category_id.as_deref())
        .await?;
    Ok(Json(TopicListResponse { topics }))
}

/// GET /api/v1/topics/{id}
async fn get_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TopicResponse>, ApiError> {
    let topic = state.catalog_service.get_topic(&id).await?;
    Ok(Json(topic))
}
