//! Database repositories
//!
//! Repository pattern implementations for database access.

pub mod document;

pub use document::{
    collections, encode, CollectionInfo, Document, DocumentRepository, DynDocumentRepository,
    SqlxDocumentRepository,
};
