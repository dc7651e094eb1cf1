//! # dbcatalog - Database Schema Catalog
//!
//! Turns MySQL and PostgreSQL schema dumps into a searchable catalog graph.
//!
//! dbcatalog provides:
//! - A tolerant DDL parser producing a dialect-agnostic table model
//! - A catalog builder issuing idempotent entity/relation upserts with tag heuristics
//! - SQLite-backed storage with term and vector search
//! - Hierarchical result formatting (database, then table, then column)

pub mod schema;
pub mod key;
pub mod entity;
pub mod ddl;
pub mod catalog;
pub mod storage;
pub mod query;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use catalog::{CatalogBuilder, CatalogReport, CatalogStore, Taxonomy, build_catalog};
pub use ddl::Dialect;
pub use entity::{EntityKind, RelationKind};
pub use key::EntityKey;
pub use schema::{Column, ForeignKey, Index, Table, TableMap};
pub use storage::SqliteStore;

use std::path::PathBuf;

/// Result type alias for dbcatalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dbcatalog operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot read DDL source {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("{0}")]
    Store(#[from] catalog::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
