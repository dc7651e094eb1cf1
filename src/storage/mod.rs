//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - entities(name, entity_type, description, properties)
//! - relations(source, target, relation_type, description, keywords, weight, properties)
//! - embeddings(name, vector)

pub mod schema;
pub mod sqlite;

pub use sqlite::{CatalogStats, SqliteStore};
