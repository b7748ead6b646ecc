//! Seed service
//!
//! Imports the static catalog (categories and topics) into the document
//! store, keyed by the identifiers found in the file:
//! - the whole document is checked for both groups before anything is written
//! - categories are written before topics, each group in file order
//! - every entry is validated right before its own write
//! - writes are upserts, so running the import again replaces records in place
//!
//! A malformed entry stops the run by default. Entries written before it stay
//! in the store. With [`InvalidEntryPolicy::Skip`] malformed entries are
//! logged, left out, and listed in the [`SeedReport`].

use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::InvalidEntryPolicy;
use crate::db::repositories::{collections, encode, DynDocumentRepository};
use crate::models::validation::{field_path, index_path};
use crate::models::{
    Category, CategoryDocument, Fields, Schema, TopicCreate, TopicDocument, ValidationError,
    Validator,
};

/// Error types for seed operations
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// Catalog file does not exist
    #[error("Seed file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Catalog file exists but could not be read
    #[error("Failed to read seed file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catalog file is not valid JSON
    #[error("Failed to parse seed file '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Top-level shape is wrong
    #[error("Seed document must contain 'categories' and 'topics' lists: {0}")]
    Structure(String),

    /// An entry failed validation under the abort policy
    #[error("Invalid entry {group}[{index}]: {source}")]
    InvalidEntry {
        group: &'static str,
        index: usize,
        source: ValidationError,
    },

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Raw catalog entries, checked for shape but not yet validated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedCatalog {
    pub categories: Vec<Value>,
    pub topics: Vec<Value>,
}

impl SeedCatalog {
    /// Read a catalog file
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        if !path.exists() {
            return Err(SeedError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| SeedError::Parse {
            path: path.to_path_buf(),
            message: format!("at line {}, column {}: {}", e.line(), e.column(), e),
        })?;

        Self::from_value(value)
    }

    /// Split a parsed document into its two groups
    pub fn from_value(value: Value) -> Result<Self, SeedError> {
        let Value::Object(mut root) = value else {
            return Err(SeedError::Structure("document is not an object".to_string()));
        };

        let mut missing = Vec::new();
        let mut take_group = |name: &'static str| match root.remove(name) {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                missing.push(format!("'{}' is not a list", name));
                Vec::new()
            }
            None => {
                missing.push(format!("'{}' is missing", name));
                Vec::new()
            }
        };

        let categories = take_group(collections::CATEGORIES);
        let topics = take_group(collections::TOPICS);

        if !missing.is_empty() {
            return Err(SeedError::Structure(missing.join(", ")));
        }

        Ok(Self { categories, topics })
    }

    /// Number of entries in both groups
    pub fn len(&self) -> usize {
        self.categories.len() + self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Catalog topic entry: the storage key plus the topic fields
#[derive(Debug, Clone)]
struct TopicEntry {
    id: String,
    topic: TopicCreate,
}

impl Schema for TopicEntry {
    fn read(fields: &Fields<'_>, v: &mut Validator) -> Self {
        Self {
            id: fields.required_string(v, "id"),
            topic: TopicCreate::read(fields, v),
        }
    }

    fn check(&self, v: &mut Validator, prefix: &str) {
        v.min_chars(&field_path(prefix, "id"), &self.id, 1);
        self.topic.check(v, prefix);
    }
}

/// An entry left out under the skip policy
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub group: &'static str,
    pub index: usize,
    pub error: ValidationError,
}

/// Outcome of a seed run
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    /// Categories written
    pub categories: usize,
    /// Topics written
    pub topics: usize,
    /// Malformed entries left out
    pub skipped: Vec<SkippedEntry>,
}

impl SeedReport {
    /// Records written across both groups
    pub fn total(&self) -> usize {
        self.categories + self.topics
    }

    /// Check if every entry was written
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Writes a catalog into the document store
pub struct SeedLoader {
    repo: DynDocumentRepository,
    policy: InvalidEntryPolicy,
}

impl SeedLoader {
    pub fn new(repo: DynDocumentRepository, policy: InvalidEntryPolicy) -> Self {
        Self { repo, policy }
    }

    /// Check a parsed document and import it
    pub async fn seed_value(&self, value: Value) -> Result<SeedReport, SeedError> {
        let catalog = SeedCatalog::from_value(value)?;
        self.seed(&catalog).await
    }

    /// Import a catalog: all categories, then all topics
    pub async fn seed(&self, catalog: &SeedCatalog) -> Result<SeedReport, SeedError> {
        let mut report = SeedReport::default();

        tracing::info!("Seeding {} categories", catalog.categories.len());
        for (index, raw) in catalog.categories.iter().enumerate() {
            let Some(category) =
                self.accept::<Category>(raw, collections::CATEGORIES, index, &mut report)?
            else {
                continue;
            };

            let (id, doc) = CategoryDocument::new(category, Utc::now());
            self.repo
                .put(collections::CATEGORIES, &id, &encode(&doc)?)
                .await?;
            report.categories += 1;
            tracing::info!(
                "Seeded category {} (id: {}), {} so far",
                doc.name,
                id,
                report.categories
            );
        }
        tracing::info!("Categories seeded: {}", report.categories);

        tracing::info!("Seeding {} topics", catalog.topics.len());
        for (index, raw) in catalog.topics.iter().enumerate() {
            let Some(entry) = self.accept::<TopicEntry>(raw, collections::TOPICS, index, &mut report)?
            else {
                continue;
            };

            let doc = TopicDocument::new(entry.topic, Utc::now());
            self.repo
                .put(collections::TOPICS, &entry.id, &encode(&doc)?)
                .await?;
            report.topics += 1;
            tracing::info!(
                "Seeded topic {} (id: {}), {} so far",
                doc.title,
                entry.id,
                report.topics
            );
        }
        tracing::info!("Topics seeded: {}", report.topics);

        Ok(report)
    }

    /// Validate one entry, applying the invalid-entry policy on failure
    fn accept<T: Schema>(
        &self,
        raw: &Value,
        group: &'static str,
        index: usize,
        report: &mut SeedReport,
    ) -> Result<Option<T>, SeedError> {
        match T::from_json_at(raw, &index_path(group, index)) {
            Ok(entry) => Ok(Some(entry)),
            Err(source) => match self.policy {
                InvalidEntryPolicy::Abort => Err(SeedError::InvalidEntry {
                    group,
                    index,
                    source,
                }),
                InvalidEntryPolicy::Skip => {
                    tracing::warn!("Skipping {}[{}]: {}", group, index, source);
                    report.skipped.push(SkippedEntry {
                        group,
                        index,
                        error: source,
                    });
                    Ok(None)
                }
            },
        }
    }
}
