//! Database connection pool abstraction
//!
//! One interface over the SQLite and MySQL backends. The backend is picked
//! from `DatabaseConfig::driver`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// Connection handle to the document store's backing database.
///
/// Repositories branch on [`driver`](Self::driver) and borrow the concrete
/// pool through [`sqlite`](Self::sqlite) or [`mysql`](Self::mysql).
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run DDL or other statements without result rows (used by migrations)
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Round-trip a trivial query (used by the store checks)
    async fn ping(&self) -> Result<()>;

    async fn close(&self);

    fn driver(&self) -> DatabaseDriver;

    fn as_sqlite(&self) -> Option<&SqlitePool>;

    fn as_mysql(&self) -> Option<&MySqlPool>;

    /// SQLite pool, or an error when the driver says otherwise
    fn sqlite(&self) -> Result<&SqlitePool> {
        self.as_sqlite()
            .context("SQLite driver selected but no SQLite pool available")
    }

    /// MySQL pool, or an error when the driver says otherwise
    fn mysql(&self) -> Result<&MySqlPool> {
        self.as_mysql()
            .context("MySQL driver selected but no MySQL pool available")
    }
}

/// SQLite backend, a file or `:memory:`
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open `url`, creating the file and its parent directories if missing
    pub async fn new(url: &str) -> Result<Self> {
        let target = SqliteTarget::parse(url);

        let options = match &target {
            // every connection to :memory: opens its own empty database
            SqliteTarget::Memory => SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            SqliteTarget::File { path, .. } => {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).with_context(|| {
                            format!("Failed to create store directory: {}", parent.display())
                        })?;
                    }
                }
                SqlitePoolOptions::new().max_connections(20)
            }
        };

        let pool = options
            .connect(&target.connection_url())
            .await
            .with_context(|| format!("Failed to open SQLite store: {}", url))?;

        Ok(Self { pool })
    }
}

/// Where a configured SQLite url points
#[derive(Debug, PartialEq, Eq)]
enum SqliteTarget {
    Memory,
    /// `path` without the scheme or query, `url` ready for sqlx
    File { path: String, url: String },
}

impl SqliteTarget {
    /// Accepts bare paths, `sqlite:` urls and both spellings of in-memory
    fn parse(url: &str) -> Self {
        if url == ":memory:" || url.starts_with("sqlite::memory:") {
            return Self::Memory;
        }
        let bare = url.strip_prefix("sqlite:").unwrap_or(url);
        let path = bare.split('?').next().unwrap_or(bare).to_string();
        let url = if bare.contains('?') {
            format!("sqlite:{}", bare)
        } else {
            format!("sqlite:{}?mode=rwc", bare)
        };
        Self::File { path, url }
    }

    fn connection_url(&self) -> String {
        match self {
            Self::Memory => "sqlite::memory:".to_string(),
            Self::File { url, .. } => url.clone(),
        }
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Store did not answer ping")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

/// MySQL backend; the database itself must already exist
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to `url`, with or without the `mysql://` scheme
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(30)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to open MySQL store: {}", url))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Statement failed: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Store did not answer ping")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Shared handle to whichever backend is configured
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Create a database connection pool based on configuration.
///
/// Prefer [`StoreConnector`](super::StoreConnector), which also runs the
/// migrations and makes sure a process opens the store once.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    match config.driver {
        DatabaseDriver::Sqlite => {
            let db = SqliteDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
        DatabaseDriver::Mysql => {
            let db = MysqlDatabase::new(&config.url).await?;
            Ok(Arc::new(db))
        }
    }
}

/// Empty in-memory store for tests; migrations are not applied
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}
