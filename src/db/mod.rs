//! Database layer
//!
//! A document store over SQLx. It supports:
//! - SQLite (default, single file or in memory)
//! - MySQL
//!
//! The database driver is selected based on configuration.
//!
//! # Usage
//!
//! ```ignore
//! use studytrack::config::DatabaseConfig;
//! use studytrack::db::{StoreConnector, SqlxDocumentRepository, collections};
//!
//! let connector = StoreConnector::new(DatabaseConfig::default());
//! let pool = connector.initialize().await?;
//! let repo = SqlxDocumentRepository::boxed(pool);
//!
//! let topics = repo.list(collections::TOPICS).await?;
//! ```

pub mod connector;
pub mod migrations;
pub mod pool;
pub mod repositories;

pub use connector::StoreConnector;
pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
pub use repositories::{
    collections, CollectionInfo, Document, DocumentRepository, DynDocumentRepository,
    SqlxDocumentRepository,
};
