//! Progress service
//!
//! Creates, reads and partially updates per-user progress entries.

use crate::db::repositories::{collections, encode, DynDocumentRepository};
use crate::models::{
    ProgressCreate, ProgressDocument, ProgressResponse, ProgressUpdate, Schema, ValidationError,
};
use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

/// Error types for progress operations
#[derive(Debug, thiserror::Error)]
pub enum ProgressServiceError {
    /// Validation error (invalid input)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Progress entry not found
    #[error("Progress not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Progress service
pub struct ProgressService {
    repo: DynDocumentRepository,
}

impl ProgressService {
    pub fn new(repo: DynDocumentRepository) -> Self {
        Self { repo }
    }

    /// Record a new progress entry
    pub async fn create(
        &self,
        input: ProgressCreate,
    ) -> Result<ProgressResponse, ProgressServiceError> {
        input.validate()?;

        let id = Uuid::new_v4().to_string();
        let doc = ProgressDocument::new(input, Utc::now());
        self.store(&id, &doc).await?;

        tracing::debug!("Created progress {} for user {}", id, doc.user_id);
        Ok(doc.into_response(id))
    }

    /// Look up a progress entry
    pub async fn get(&self, id: &str) -> Result<ProgressResponse, ProgressServiceError> {
        let doc = self.load(id).await?;
        Ok(doc.into_response(id.to_string()))
    }

    /// Apply a partial update.
    ///
    /// Fields absent from the update are kept. Every accepted update moves
    /// `updated_at` forward, even when no value changed.
    pub async fn update(
        &self,
        id: &str,
        update: ProgressUpdate,
    ) -> Result<ProgressResponse, ProgressServiceError> {
        update.validate()?;

        let mut doc = self.load(id).await?;
        let changed = update.apply(&mut doc);
        doc.updated_at = Utc::now();
        self.store(id, &doc).await?;

        tracing::debug!("Updated progress {} (changed: {})", id, changed);
        Ok(doc.into_response(id.to_string()))
    }

    /// Every progress entry of a user, ordered by id
    pub async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ProgressResponse>, ProgressServiceError> {
        let docs = self
            .repo
            .list(collections::PROGRESS)
            .await
            .context("Failed to list progress")?;

        let mut entries = Vec::new();
        for doc in docs {
            let progress: ProgressDocument = doc.decode()?;
            if progress.user_id == user_id {
                entries.push(progress.into_response(doc.id));
            }
        }
        Ok(entries)
    }

    async fn load(&self, id: &str) -> Result<ProgressDocument, ProgressServiceError> {
        let doc = self
            .repo
            .get(collections::PROGRESS, id)
            .await
            .with_context(|| format!("Failed to get progress {}", id))?
            .ok_or_else(|| ProgressServiceError::NotFound(id.to_string()))?;
        Ok(doc.decode()?)
    }

    async fn store(&self, id: &str, doc: &ProgressDocument) -> Result<(), ProgressServiceError> {
        self.repo
            .put(collections::PROGRESS, id, &encode(doc)?)
            .await
            .with_context(|| format!("Failed to store progress {}", id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentRepository};
    use crate::models::{Patch, Rule};

    async fn setup_service() -> ProgressService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ProgressService::new(SqlxDocumentRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = setup_service().await;

        let created = service
            .create(ProgressCreate::new("user123", "js-closures", "in-progress").unwrap())
            .await
            .unwrap();
        assert_eq!(created.notes, "");
        assert_eq!(created.created_at, created.updated_at);

        let fetched = service.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_update_status_keeps_notes() {
        let service = setup_service().await;
        let created = service
            .create(
                ProgressCreate::with_notes("user123", "js-closures", "in-progress", "halfway")
                    .unwrap(),
            )
            .await
            .unwrap();

        let updated = service
            .update(&created.id, ProgressUpdate::status("completed").unwrap())
            .await
            .unwrap();

        assert_eq!(updated.status, "completed");
        assert_eq!(updated.notes, "halfway");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_null_notes_clears() {
        let service = setup_service().await;
        let created = service
            .create(ProgressCreate::with_notes("u1", "t1", "in-progress", "draft").unwrap())
            .await
            .unwrap();

        let update = ProgressUpdate::new(Patch::Absent, Patch::Null).unwrap();
        let updated = service.update(&created.id, update).await.unwrap();

        assert_eq!(updated.notes, "");
        assert_eq!(updated.status, "in-progress");
        assert_eq!(service.get(&created.id).await.unwrap().notes, "");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_before_write() {
        let service = setup_service().await;
        let created = service
            .create(ProgressCreate::new("u1", "t1", "in-progress").unwrap())
            .await
            .unwrap();

        let update = ProgressUpdate {
            status: Patch::Null,
            notes: Patch::Value("x".repeat(501)),
        };
        match service.update(&created.id, update).await.unwrap_err() {
            ProgressServiceError::Validation(err) => {
                assert!(err.has("status", Rule::NotNull));
                assert!(err.has("notes", Rule::MaxLength));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(service.get(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_missing_entry() {
        let service = setup_service().await;
        let err = service
            .update("missing", ProgressUpdate::notes("x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_for_user() {
        let service = setup_service().await;

        for (user, topic) in [("u1", "t1"), ("u2", "t1"), ("u1", "t2")] {
            service
                .create(ProgressCreate::new(user, topic, "not-started").unwrap())
                .await
                .unwrap();
        }

        let entries = service.list_for_user("u1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.user_id == "u1"));
        assert!(service.list_for_user("nobody").await.unwrap().is_empty());
    }
}
