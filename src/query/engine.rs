//! Query engine implementation
//!
//! Runs a search over the catalog and hands the ranked hits to the
//! hierarchical formatter.

use super::embedding::EmbeddingEngine;
use super::formatter::{FormattedChunks, format_hierarchical};
use crate::catalog::{EntitySearch, SearchHit};
use crate::storage::SqliteStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How hits are retrieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Term match over keys and descriptions
    #[default]
    Text,
    /// Cosine similarity over stored embeddings
    Vector,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Vector => "vector",
        }
    }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "vector" | "semantic" => Ok(Self::Vector),
            other => Err(Error::Config(format!("Unknown search mode: {}", other))),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Query engine over a catalog store
pub struct QueryEngine<'a> {
    store: &'a SqliteStore,
    embeddings: Option<&'a EmbeddingEngine>,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine (text search only)
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store, embeddings: None }
    }

    /// Enable vector search
    pub fn with_embeddings(mut self, engine: &'a EmbeddingEngine) -> Self {
        self.embeddings = Some(engine);
        self
    }

    /// Ranked hits for `text`
    pub fn search(&self, text: &str, top_k: usize, mode: SearchMode) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        match mode {
            SearchMode::Text => self.store.query(text, top_k),
            SearchMode::Vector => {
                let engine = self.embeddings.ok_or_else(|| {
                    Error::Embedding("Vector search requires an embedding engine".to_string())
                })?;
                if self.store.count_embeddings()? == 0 {
                    tracing::warn!("No embeddings stored, run `dbcatalog embed` first");
                    return Ok(Vec::new());
                }
                let vector = engine.embed_query(text)?;
                self.store.search_by_vector(&vector, top_k)
            }
        }
    }

    /// Search, then expand hits into ancestor-first chunks
    pub fn query(&self, text: &str, top_k: usize, mode: SearchMode) -> Result<FormattedChunks> {
        let hits = self.search(text, top_k, mode)?;
        tracing::debug!(query = %text, %mode, hits = hits.len(), "Search complete");
        Ok(format_hierarchical(&hits, self.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use crate::entity::{EntityKind, entity_properties};

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for (name, kind, description) in [
            ("Database:shop", EntityKind::Database, "Database: shop\nType: MySQL"),
            ("Table:shop.users", EntityKind::Table, "Table: users"),
            ("Table:shop.orders", EntityKind::Table, "Table: orders"),
            ("Column:shop.users.email", EntityKind::Column, "Column: email\nType: VARCHAR(255)"),
        ] {
            store.create_entity(name, &entity_properties(kind, description)).unwrap();
        }
        store
    }

    #[test]
    fn test_text_query_is_hierarchical() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);

        let chunks = engine.query("email", 10, SearchMode::Text).unwrap();
        assert_eq!(
            chunks.entities(),
            vec!["Database:shop", "Table:shop.users", "Column:shop.users.email"]
        );
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents[1], "Table: users");
    }

    #[test]
    fn test_zero_top_k_is_empty() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);
        assert!(engine.query("users", 0, SearchMode::Text).unwrap().is_empty());
    }

    #[test]
    fn test_vector_mode_without_engine_fails() {
        let store = seeded_store();
        let engine = QueryEngine::new(&store);
        assert!(matches!(
            engine.search("users", 5, SearchMode::Vector),
            Err(Error::Embedding(_))
        ));
    }

    #[test]
    fn test_search_mode_parsing() {
        assert_eq!("TEXT".parse::<SearchMode>().unwrap(), SearchMode::Text);
        assert_eq!("semantic".parse::<SearchMode>().unwrap(), SearchMode::Vector);
        assert!("hybrid".parse::<SearchMode>().is_err());
        assert_eq!(SearchMode::Vector.to_string(), "vector");
    }
}
