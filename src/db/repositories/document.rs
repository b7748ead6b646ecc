//! Document repository
//!
//! Keyed JSON documents grouped in named collections. A document's key is
//! never part of its body: callers pass the id alongside the fields, and
//! `get`/`list` hand it back separately.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;

/// Collection names used by the application
pub mod collections {
    pub const CATEGORIES: &str = "categories";
    pub const TOPICS: &str = "topics";
    pub const USERS: &str = "users";
    pub const PROGRESS: &str = "progress";
    pub const SESSIONS: &str = "sessions";
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
    /// Time of the last write
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Decode the body into a typed document
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .with_context(|| format!("Failed to decode document '{}'", self.id))
    }
}

/// Encode a typed document into its stored fields
pub fn encode<T: Serialize>(doc: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(doc).context("Failed to encode document")? {
        Value::Object(fields) => Ok(fields),
        other => anyhow::bail!("Document must encode to a JSON object, got {}", other),
    }
}

/// Collection name with its document count
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub count: u64,
}

/// Repository trait for document operations
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Create or fully replace the document stored under `id`
    async fn put(&self, collection: &str, id: &str, fields: &Map<String, Value>) -> Result<()>;

    /// Fetch one document
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Every document of a collection, ordered by id
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    /// Remove a document, returning whether it existed
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Non-empty collections with their sizes, ordered by name
    async fn collections(&self) -> Result<Vec<CollectionInfo>>;

    /// Number of documents in a collection
    async fn count(&self, collection: &str) -> Result<u64>;
}

/// Shared handle to a document repository
pub type DynDocumentRepository = Arc<dyn DocumentRepository>;

/// SQLx-based document repository
pub struct SqlxDocumentRepository {
    pool: DynDatabasePool,
}

impl SqlxDocumentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository
    pub fn boxed(pool: DynDatabasePool) -> DynDocumentRepository {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DocumentRepository for SqlxDocumentRepository {
    async fn put(&self, collection: &str, id: &str, fields: &Map<String, Value>) -> Result<()> {
        let body = serde_json::to_string(fields).context("Failed to serialize document body")?;
        let now = Utc::now();
        let result = match self.pool.driver() {
            DatabaseDriver::Sqlite => put_sqlite(self.pool.sqlite()?, collection, id, &body, now).await,
            DatabaseDriver::Mysql => put_mysql(self.pool.mysql()?, collection, id, &body, now).await,
        };
        result.with_context(|| format!("Failed to write {}/{}", collection, id))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let result = match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.sqlite()?, collection, id).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.mysql()?, collection, id).await,
        };
        result.with_context(|| format!("Failed to read {}/{}", collection, id))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let result = match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.sqlite()?, collection).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.mysql()?, collection).await,
        };
        result.with_context(|| format!("Failed to list {}", collection))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                    .bind(collection)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await?
                    .rows_affected()
            }
            DatabaseDriver::Mysql => {
                sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                    .bind(collection)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await?
                    .rows_affected()
            }
        };
        Ok(affected > 0)
    }

    async fn collections(&self) -> Result<Vec<CollectionInfo>> {
        const SQL: &str = "SELECT collection, COUNT(*) AS count FROM documents GROUP BY collection ORDER BY collection";
        let infos = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SQL)
                .fetch_all(self.pool.sqlite()?)
                .await?
                .iter()
                .map(|r| CollectionInfo {
                    name: r.get("collection"),
                    count: r.get::<i64, _>("count") as u64,
                })
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(SQL)
                .fetch_all(self.pool.mysql()?)
                .await?
                .iter()
                .map(|r| CollectionInfo {
                    name: r.get("collection"),
                    count: r.get::<i64, _>("count") as u64,
                })
                .collect(),
        };
        Ok(infos)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        const SQL: &str = "SELECT COUNT(*) AS count FROM documents WHERE collection = ?";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(SQL)
                .bind(collection)
                .fetch_one(self.pool.sqlite()?)
                .await?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(SQL)
                .bind(collection)
                .fetch_one(self.pool.mysql()?)
                .await?
                .get("count"),
        };
        Ok(count as u64)
    }
}

fn parse_body(collection: &str, id: &str, body: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(body)
        .with_context(|| format!("Corrupt document body in {}/{}", collection, id))?
    {
        Value::Object(fields) => Ok(fields),
        _ => anyhow::bail!("Document body in {}/{} is not an object", collection, id),
    }
}

// SQLite implementations
async fn put_sqlite(
    pool: &SqlitePool,
    collection: &str,
    id: &str,
    body: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO documents (collection, id, body, updated_at) VALUES (?, ?, ?, ?)
         ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
    )
    .bind(collection)
    .bind(id)
    .bind(body)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

async fn get_sqlite(pool: &SqlitePool, collection: &str, id: &str) -> Result<Option<Document>> {
    let row = sqlx::query("SELECT id, body, updated_at FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| {
        let id: String = r.get("id");
        let body: String = r.get("body");
        Ok(Document {
            fields: parse_body(collection, &id, &body)?,
            id,
            updated_at: r.get("updated_at"),
        })
    })
    .transpose()
}

async fn list_sqlite(pool: &SqlitePool, collection: &str) -> Result<Vec<Document>> {
    let rows = sqlx::query("SELECT id, body, updated_at FROM documents WHERE collection = ? ORDER BY id")
        .bind(collection)
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|r| {
            let id: String = r.get("id");
            let body: String = r.get("body");
            Ok(Document {
                fields: parse_body(collection, &id, &body)?,
                id,
                updated_at: r.get("updated_at"),
            })
        })
        .collect()
}

// MySQL implementations
async fn put_mysql(
    pool: &MySqlPool,
    collection: &str,
    id: &str,
    body: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO documents (collection, id, body, updated_at) VALUES (?, ?, ?, ?)
         ON DUPLICATE KEY UPDATE body = VALUES(body), updated_at = VALUES(updated_at)",
    )
    .bind(collection)
    .bind(id)
    .bind(body)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

async fn get_mysql(pool: &MySqlPool, collection: &str, id: &str) -> Result<Option<Document>> {
    let row = sqlx::query("SELECT id, body, updated_at FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| {
        let id: String = r.get("id");
        let body: String = r.get("body");
        Ok(Document {
            fields: parse_body(collection, &id, &body)?,
            id,
            updated_at: r.get("updated_at"),
        })
    })
    .transpose()
}

async fn list_mysql(pool: &MySqlPool, collection: &str) -> Result<Vec<Document>> {
    let rows = sqlx::query("SELECT id, body, updated_at FROM documents WHERE collection = ? ORDER BY id")
        .bind(collection)
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|r| {
            let id: String = r.get("id");
            let body: String = r.get("body");
            Ok(Document {
                fields: parse_body(collection, &id, &body)?,
                id,
                updated_at: r.get("updated_at"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn setup_repo() -> SqlxDocumentRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxDocumentRepository::new(pool)
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    /// Ids differing only in case are separate documents, listed in byte order
    async fn assert_case_distinct_keys(repo: &SqlxDocumentRepository) {
        repo.put("topics", "js-closures", &fields(json!({ "title": "lower" })))
            .await
            .unwrap();
        repo.put("topics", "JS-Closures", &fields(json!({ "title": "upper" })))
            .await
            .unwrap();

        assert_eq!(repo.count("topics").await.unwrap(), 2);
        let lower = repo.get("topics", "js-closures").await.unwrap().unwrap();
        assert_eq!(lower.fields["title"], "lower");

        let ids: Vec<String> = repo
            .list("topics")
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        assert_eq!(ids, vec!["JS-Closures", "js-closures"]);
    }

    #[tokio::test]
    async fn test_case_distinct_keys() {
        let repo = setup_repo().await;
        assert_case_distinct_keys(&repo).await;
    }

    // To run MySQL tests, set the MYSQL_TEST_URL environment variable to an empty database
    #[tokio::test]
    #[ignore = "Requires MySQL server"]
    async fn test_mysql_case_distinct_keys() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/test".to_string());
        let config = crate::config::DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
        };
        let pool = crate::db::create_pool(&config).await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxDocumentRepository::new(pool);
        for doc in repo.list("topics").await.unwrap() {
            repo.delete("topics", &doc.id).await.unwrap();
        }

        assert_case_distinct_keys(&repo).await;
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let repo = setup_repo().await;
        let body = fields(json!({ "name": "JavaScript", "icon": "js.svg" }));

        repo.put(collections::CATEGORIES, "js", &body).await.unwrap();

        let doc = repo.get(collections::CATEGORIES, "js").await.unwrap().unwrap();
        assert_eq!(doc.id, "js");
        assert_eq!(doc.fields, body);
        assert!(doc.fields.get("id").is_none());
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = setup_repo().await;
        assert!(repo.get(collections::TOPICS, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_document() {
        let repo = setup_repo().await;

        repo.put("topics", "t1", &fields(json!({ "title": "Old", "extra": true })))
            .await
            .unwrap();
        repo.put("topics", "t1", &fields(json!({ "title": "New" })))
            .await
            .unwrap();

        let doc = repo.get("topics", "t1").await.unwrap().unwrap();
        assert_eq!(doc.fields, fields(json!({ "title": "New" })));
        assert_eq!(repo.count("topics").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let repo = setup_repo().await;

        repo.put("categories", "js", &fields(json!({ "name": "JS" }))).await.unwrap();
        repo.put("topics", "js", &fields(json!({ "title": "JS" }))).await.unwrap();

        let category = repo.get("categories", "js").await.unwrap().unwrap();
        assert_eq!(category.fields["name"], "JS");
        assert_eq!(repo.count("categories").await.unwrap(), 1);
        assert_eq!(repo.count("topics").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_ordered_by_id() {
        let repo = setup_repo().await;

        for id in ["c", "a", "b"] {
            repo.put("topics", id, &fields(json!({ "title": id }))).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list("topics")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(repo.list("sessions").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup_repo().await;

        repo.put("users", "u1", &fields(json!({ "username": "a" }))).await.unwrap();
        assert!(repo.delete("users", "u1").await.unwrap());
        assert!(!repo.delete("users", "u1").await.unwrap());
        assert!(repo.get("users", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collections_listing() {
        let repo = setup_repo().await;
        assert!(repo.collections().await.unwrap().is_empty());

        repo.put("topics", "a", &fields(json!({}))).await.unwrap();
        repo.put("topics", "b", &fields(json!({}))).await.unwrap();
        repo.put("categories", "x", &fields(json!({}))).await.unwrap();

        let infos = repo.collections().await.unwrap();
        assert_eq!(
            infos,
            vec![
                CollectionInfo { name: "categories".to_string(), count: 1 },
                CollectionInfo { name: "topics".to_string(), count: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_encode_decode_typed_document() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Sample {
            title: String,
            details: Vec<String>,
        }

        let repo = setup_repo().await;
        let sample = Sample {
            title: "Closures".to_string(),
            details: vec!["scope".to_string()],
        };

        repo.put("topics", "js-closures", &encode(&sample).unwrap()).await.unwrap();
        let doc = repo.get("topics", "js-closures").await.unwrap().unwrap();
        assert_eq!(doc.decode::<Sample>().unwrap(), sample);
    }

    #[test]
    fn test_encode_rejects_non_object() {
        assert!(encode(&vec![1, 2, 3]).is_err());
        assert!(encode(&"text").is_err());
    }
}
