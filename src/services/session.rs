//! Study session service
//!
//! Opens a session over a list of catalog topics. Each topic is copied into
//! the session as a snapshot, in request order.

use crate::db::repositories::{collections, encode, DynDocumentRepository};
use crate::models::{
    Schema, SessionDocument, SessionItem, SessionRequest, SessionResponse, TopicDocument,
    ValidationError,
};
use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

/// Error types for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    /// Validation error (invalid input)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// One or more requested topics do not exist
    #[error("Unknown topics: {}", .0.join(", "))]
    UnknownTopics(Vec<String>),

    /// Session not found
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Study session service
pub struct SessionService {
    repo: DynDocumentRepository,
}

impl SessionService {
    pub fn new(repo: DynDocumentRepository) -> Self {
        Self { repo }
    }

    /// Open a session
    ///
    /// # Errors
    /// - `UnknownTopics` listing every requested id that is not in the catalog
    pub async fn create(
        &self,
        request: SessionRequest,
    ) -> Result<SessionResponse, SessionServiceError> {
        request.validate()?;

        let mut topics = Vec::with_capacity(request.topic_ids.len());
        let mut unknown = Vec::new();
        for topic_id in &request.topic_ids {
            let doc = self
                .repo
                .get(collections::TOPICS, topic_id)
                .await
                .with_context(|| format!("Failed to get topic {}", topic_id))?;

            match doc {
                Some(doc) => {
                    let topic: TopicDocument = doc.decode()?;
                    topics.push(SessionItem {
                        topic_id: doc.id,
                        title: topic.title,
                        category_id: topic.category_id,
                        details: topic.details,
                    });
                }
                None => unknown.push(topic_id.clone()),
            }
        }

        if !unknown.is_empty() {
            return Err(SessionServiceError::UnknownTopics(unknown));
        }

        let session_id = Uuid::new_v4().to_string();
        let doc = SessionDocument {
            user_id: request.user_id,
            created_at: Utc::now(),
            topics,
        };
        let response = doc.clone().into_response(session_id.clone());
        // snapshots are bounded looser than catalog topics; check before storing
        response.validate()?;

        self.repo
            .put(collections::SESSIONS, &session_id, &encode(&doc)?)
            .await
            .context("Failed to store session")?;

        tracing::info!(
            "Opened session {} for user {} with {} topic(s)",
            session_id,
            response.user_id,
            response.topics.len()
        );
        Ok(response)
    }

    /// Look up a session
    pub async fn get(&self, session_id: &str) -> Result<SessionResponse, SessionServiceError> {
        let doc = self
            .repo
            .get(collections::SESSIONS, session_id)
            .await
            .with_context(|| format!("Failed to get session {}", session_id))?
            .ok_or_else(|| SessionServiceError::NotFound(session_id.to_string()))?;

        let session: SessionDocument = doc.decode()?;
        Ok(session.into_response(doc.id))
    }
}
