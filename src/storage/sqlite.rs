//! SQLite storage implementation

use super::schema;
use crate::catalog::{
    CatalogStore, DescriptionLookup, EntitySearch, SearchHit, StoreError, StoreResult,
};
use crate::entity::{EntityKind, EntityRecord, Properties, RelationKind, RelationRecord, description_of};
use crate::key::EntityKey;
use crate::Result;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite-backed storage for the catalog graph
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Entity Operations ==========

    /// Get an entity by name
    pub fn get_entity(&self, name: &str) -> Result<Option<EntityRecord>> {
        self.conn
            .query_row(
                "SELECT name, entity_type, description, properties FROM entities WHERE name = ?1",
                [name],
                |row| self.row_to_entity(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// All entities, ordered by name
    pub fn list_entities(&self) -> Result<Vec<EntityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, entity_type, description, properties FROM entities ORDER BY name",
        )?;

        let entities = stmt
            .query_map([], |row| self.row_to_entity(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entities)
    }

    /// Count all entities
    pub fn count_entities(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_entity(&self, row: &rusqlite::Row) -> rusqlite::Result<EntityRecord> {
        let properties: String = row.get(3)?;
        let properties: Properties = serde_json::from_str(&properties).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(EntityRecord {
            name: row.get(0)?,
            entity_type: row.get(1)?,
            description: row.get(2)?,
            properties,
        })
    }

    // ========== Relation Operations ==========

    /// All relations, ordered by endpoints and type
    pub fn list_relations(&self) -> Result<Vec<RelationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, target, relation_type, description, weight, properties
             FROM relations ORDER BY source, target, relation_type",
        )?;

        let relations = stmt
            .query_map([], |row| self.row_to_relation(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(relations)
    }

    /// Count all relations
    pub fn count_relations(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM relations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn row_to_relation(&self, row: &rusqlite::Row) -> rusqlite::Result<RelationRecord> {
        let relation_type: String = row.get(2)?;
        let properties: String = row.get(5)?;
        let properties: Properties = serde_json::from_str(&properties).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(RelationRecord {
            source: row.get(0)?,
            target: row.get(1)?,
            relation_type: (!relation_type.is_empty()).then_some(relation_type),
            description: row.get(3)?,
            weight: row.get(4)?,
            properties,
        })
    }

    // ========== Search Operations ==========

    /// Term search over entity keys and descriptions.
    ///
    /// The score is the fraction of distinct query terms found in the key
    /// or description. Ties are broken by key so results are stable.
    pub fn search_terms(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare("SELECT name, description FROM entities")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut scored = Vec::new();
        for row in rows {
            let (name, description) = row?;
            let haystack = format!("{} {}", name, description).to_lowercase();
            let found = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
            if found > 0 {
                scored.push((name, found as f32 / terms.len() as f32));
            }
        }

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(name, score)| SearchHit::new(EntityKey::parse(&name), score))
            .collect())
    }

    // ========== Embedding Operations ==========

    /// Insert or replace an embedding
    pub fn insert_embedding(&self, name: &str, vector: &[f32]) -> Result<()> {
        let blob: Vec<u8> = vector.iter().flat_map(|f| f.to_le_bytes()).collect();

        self.conn.execute(
            "INSERT OR REPLACE INTO embeddings (name, vector) VALUES (?1, ?2)",
            params![name, blob],
        )?;
        Ok(())
    }

    /// Entities that have no embedding yet, as (name, description)
    pub fn entities_without_embedding(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.name, e.description FROM entities e
             LEFT JOIN embeddings v ON v.name = e.name
             WHERE v.name IS NULL ORDER BY e.name",
        )?;

        let pending = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(pending)
    }

    /// Count embeddings
    pub fn count_embeddings(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Search for entities by vector similarity
    pub fn search_by_vector(&self, query_vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let mut stmt = self.conn.prepare("SELECT name, vector FROM embeddings")?;

        let candidates = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((name, decode_vector(&blob)))
        })?;

        let mut scored_results = Vec::new();
        for candidate in candidates {
            let (name, vector) = candidate?;
            let score = cosine_similarity(query_vector, &vector);
            scored_results.push((name, score));
        }

        scored_results.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(scored_results
            .into_iter()
            .take(limit)
            .map(|(name, score)| SearchHit::new(EntityKey::parse(&name), score))
            .collect())
    }

    // ========== Bulk Operations ==========

    /// Begin a transaction for bulk operations
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Delete all data (for a rebuild from scratch)
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM embeddings", [])?;
        self.conn.execute("DELETE FROM relations", [])?;
        self.conn.execute("DELETE FROM entities", [])?;
        Ok(())
    }

    /// Get catalog statistics
    ///
    /// Every entity and relation kind is listed, with zero when absent.
    pub fn stats(&self) -> Result<CatalogStats> {
        let mut entities = self.count_grouped(
            "SELECT COALESCE(entity_type, 'unknown'), COUNT(*) FROM entities GROUP BY 1",
        )?;
        for kind in EntityKind::all() {
            entities.entry(kind.as_str().to_string()).or_insert(0);
        }

        let mut relations = self.count_grouped(
            "SELECT CASE relation_type WHEN '' THEN 'UNTYPED' ELSE relation_type END, COUNT(*)
             FROM relations GROUP BY 1",
        )?;
        for kind in RelationKind::all() {
            relations.entry(kind.as_str().to_string()).or_insert(0);
        }

        Ok(CatalogStats {
            entities,
            relations,
            embeddings: self.count_embeddings()?,
        })
    }

    fn count_grouped(&self, sql: &str) -> Result<BTreeMap<String, usize>> {
        let mut stmt = self.conn.prepare(sql)?;
        let counts = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, count as usize))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(counts)
    }
}

impl CatalogStore for SqliteStore {
    fn create_entity(&self, name: &str, properties: &Properties) -> StoreResult<()> {
        let entity_type = properties.get("entity_type").and_then(Value::as_str);
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO entities (name, entity_type, description, properties)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                entity_type,
                description_of(properties),
                serde_json::to_string(properties)?,
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    fn create_relation(&self, source: &str, target: &str, properties: &Properties) -> StoreResult<()> {
        let relation_type = properties.get("relation_type").and_then(Value::as_str).unwrap_or("");
        let keywords = properties.get("keywords").and_then(Value::as_str).unwrap_or("");
        let weight = properties.get("weight").and_then(Value::as_f64).unwrap_or(1.0);

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO relations
             (source, target, relation_type, description, keywords, weight, properties)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                source,
                target,
                relation_type,
                description_of(properties),
                keywords,
                weight,
                serde_json::to_string(properties)?,
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(format!(
                "{} -[{}]-> {}",
                source, relation_type, target
            )));
        }
        Ok(())
    }
}

impl DescriptionLookup for SqliteStore {
    fn describe(&self, key: &str) -> Result<String> {
        let description: Option<String> = self
            .conn
            .query_row("SELECT description FROM entities WHERE name = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(description.unwrap_or_default())
    }
}

impl EntitySearch for SqliteStore {
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        self.search_terms(text, top_k)
    }
}

/// Lowercase alphanumeric terms, deduplicated in first-seen order.
fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
    {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

fn decode_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogStats {
    /// Entity count per entity type
    pub entities: BTreeMap<String, usize>,
    /// Relation count per relation type
    pub relations: BTreeMap<String, usize>,
    pub embeddings: usize,
}

impl CatalogStats {
    pub fn total_entities(&self) -> usize {
        self.entities.values().sum()
    }

    pub fn total_relations(&self) -> usize {
        self.relations.values().sum()
    }

    pub fn entities_of(&self, entity_type: &str) -> usize {
        self.entities.get(entity_type).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Catalog Statistics:")?;
        writeln!(f, "  Entities: {}", self.total_entities())?;
        for (kind, count) in &self.entities {
            writeln!(f, "    {}: {}", kind, count)?;
        }
        writeln!(f, "  Relations: {}", self.total_relations())?;
        for (kind, count) in &self.relations {
            writeln!(f, "    {}: {}", kind, count)?;
        }
        writeln!(f, "  Embeddings: {}", self.embeddings)
    }
}
