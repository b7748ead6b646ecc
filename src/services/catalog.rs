//! Catalog service
//!
//! Read access to the seeded categories and topics.

use crate::db::repositories::{collections, DynDocumentRepository};
use crate::models::{Category, CategoryDocument, TopicDocument, TopicResponse};
use anyhow::Context;

/// Error types for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogServiceError {
    /// Topic not found
    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Catalog service
pub struct CatalogService {
    repo: DynDocumentRepository,
}

impl CatalogService {
    pub fn new(repo: DynDocumentRepository) -> Self {
        Self { repo }
    }

    /// All categories, ordered by id
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogServiceError> {
        let docs = self
            .repo
            .list(collections::CATEGORIES)
            .await
            .context("Failed to list categories")?;

        let categories = docs
            .into_iter()
            .map(|doc| {
                let category: CategoryDocument = doc.decode()?;
                Ok(category.into_category(doc.id))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// Topics ordered by id, optionally restricted to one category
    pub async fn list_topics(
        &self,
        category_id: Option<&str>,
    ) -> Result<Vec<TopicResponse>, CatalogServiceError> {
        let docs = self
            .repo
            .list(collections::TOPICS)
            .await
            .context("Failed to list topics")?;

        let mut topics = Vec::with_capacity(docs.len());
        for doc in docs {
            let topic: TopicDocument = doc.decode()?;
            if category_id.is_some_and(|wanted| topic.category_id != wanted) {
                continue;
            }
            topics.push(topic.into_response(doc.id));
        }
        Ok(topics)
    }

    /// Look up one topic
    pub async fn get_topic(&self, id: &str) -> Result<TopicResponse, CatalogServiceError> {
        self.find_topic(id)
            .await?
            .ok_or_else(|| CatalogServiceError::TopicNotFound(id.to_string()))
    }

    /// Look up one topic, `None` when it does not exist
    pub async fn find_topic(&self, id: &str) -> Result<Option<TopicResponse>, CatalogServiceError> {
        let Some(doc) = self
            .repo
            .get(collections::TOPICS, id)
            .await
            .with_context(|| format!("Failed to get topic {}", id))?
        else {
            return Ok(None);
        };

        let topic: TopicDocument = doc.decode()?;
        Ok(Some(topic.into_response(doc.id)))
    }
}
