//! Catalog graph - idempotent entity/relation upserts over an injected store
//!
//! The builder never talks to a concrete backend. It issues creates against
//! a [`CatalogStore`] and treats "already exists" as success, so running a
//! build twice converges to the same graph.

mod build;
mod builder;
mod taxonomy;

pub use build::{CatalogReport, StepFailure, build_catalog, resolve_source};
pub use builder::{CatalogBuilder, column_tags};
pub use taxonomy::{
    DatabaseMeta, Owner, TagDef, Taxonomy, default_databases, default_tags, tags,
};

use crate::Result;
use crate::entity::Properties;
use crate::key::EntityKey;
use serde::Serialize;
use thiserror::Error;

/// Failure reported by a catalog store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Store failure: {0}")]
    Failure(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Failure(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Failure(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Whether an upsert created the target or found it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Existing,
}

impl UpsertOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created)
    }
}

/// Write side of the catalog backend.
///
/// A create on an existing name (entities) or on an existing
/// `(source, target, relation_type)` triple (relations) must fail with
/// [`StoreError::AlreadyExists`].
pub trait CatalogStore {
    fn create_entity(&self, name: &str, properties: &Properties) -> StoreResult<()>;

    fn create_relation(&self, source: &str, target: &str, properties: &Properties) -> StoreResult<()>;

    fn upsert_entity(&self, name: &str, properties: &Properties) -> StoreResult<UpsertOutcome> {
        match self.create_entity(name, properties) {
            Ok(()) => Ok(UpsertOutcome::Created),
            Err(StoreError::AlreadyExists(_)) => Ok(UpsertOutcome::Existing),
            Err(err) => Err(err),
        }
    }

    fn upsert_relation(
        &self,
        source: &str,
        target: &str,
        properties: &Properties,
    ) -> StoreResult<UpsertOutcome> {
        match self.create_relation(source, target, properties) {
            Ok(()) => Ok(UpsertOutcome::Created),
            Err(StoreError::AlreadyExists(_)) => Ok(UpsertOutcome::Existing),
            Err(err) => Err(err),
        }
    }
}

/// Read side used by the formatter: full description text of an entity.
/// An unknown key yields an empty string.
pub trait DescriptionLookup {
    fn describe(&self, key: &str) -> Result<String>;
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub key: EntityKey,
    pub score: f32,
}

impl SearchHit {
    pub fn new(key: EntityKey, score: f32) -> Self {
        Self { key, score }
    }
}

/// Ranked retrieval over catalog entities.
pub trait EntitySearch {
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>>;
}
