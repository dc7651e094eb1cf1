//! Hierarchical result formatting
//!
//! Flat search hits are expanded into ordered chunks so that every column
//! arrives after its database and table, and every table after its
//! database. Each ancestor is emitted at most once per call.

use crate::catalog::{DescriptionLookup, SearchHit};
use crate::key::EntityKey;
use serde::Serialize;
use serde::ser::{SerializeMap, SerializeStruct};
use std::collections::HashSet;

/// One emitted chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `chunk1`, `chunk2`, ... in emission order
    pub label: String,
    pub entity: String,
    pub content: String,
}

/// Ordered chunks of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedChunks {
    chunks: Vec<Chunk>,
}

impl FormattedChunks {
    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Entity keys in emission order.
    pub fn entities(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.entity.as_str()).collect()
    }

    fn push(&mut self, entity: String, content: String) {
        let label = format!("chunk{}", self.chunks.len() + 1);
        self.chunks.push(Chunk {
            label,
            entity,
            content,
        });
    }
}

#[derive(Serialize)]
struct ChunkBody<'a> {
    #[serde(rename = "Entity")]
    entity: &'a str,
    #[serde(rename = "Content")]
    content: &'a str,
}

struct ChunkMap<'a>(&'a [Chunk]);

impl Serialize for ChunkMap<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for chunk in self.0 {
            map.serialize_entry(
                &chunk.label,
                &ChunkBody {
                    entity: &chunk.entity,
                    content: &chunk.content,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for FormattedChunks {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("FormattedChunks", 2)?;
        state.serialize_field("total_chunks", &self.chunks.len())?;
        state.serialize_field("chunks", &ChunkMap(&self.chunks))?;
        state.end()
    }
}

/// Description of `key`, or `placeholder` when the lookup is empty or fails.
fn describe_or<L: DescriptionLookup + ?Sized>(lookup: &L, key: &str, placeholder: String) -> String {
    match lookup.describe(key) {
        Ok(description) if !description.is_empty() => description,
        Ok(_) => placeholder,
        Err(e) => {
            tracing::warn!(entity = %key, error = %e, "Description lookup failed, using placeholder");
            placeholder
        }
    }
}

/// Expand ranked hits into ancestor-first chunks.
///
/// - Column hit: database and table chunks first (once each), then the column.
/// - Table hit: database chunk once, then the table unless already emitted.
/// - Anything else is emitted as-is; a database hit counts as seen.
pub fn format_hierarchical<L>(hits: &[SearchHit], lookup: &L) -> FormattedChunks
where
    L: DescriptionLookup + ?Sized,
{
    let mut out = FormattedChunks::default();
    let mut seen_databases: HashSet<String> = HashSet::new();
    let mut seen_tables: HashSet<String> = HashSet::new();

    let mut emit_database = |out: &mut FormattedChunks, database: &str| {
        let key = EntityKey::database(database).to_key_string();
        if seen_databases.insert(key.clone()) {
            let content = describe_or(lookup, &key, format!("Database: {}", database));
            out.push(key, content);
        }
    };

    for hit in hits {
        let raw = hit.key.to_key_string();
        match &hit.key {
            EntityKey::Column { database, table, .. } => {
                emit_database(&mut out, database);

                let table_key = EntityKey::table(database.as_str(), table.as_str()).to_key_string();
                if seen_tables.insert(table_key.clone()) {
                    let content = describe_or(
                        lookup,
                        &table_key,
                        format!("Table: {} in database {}", table, database),
                    );
                    out.push(table_key, content);
                }

                let content = describe_or(lookup, &raw, raw.clone());
                out.push(raw, content);
            }
            EntityKey::Table { database, .. } => {
                emit_database(&mut out, database);

                if seen_tables.insert(raw.clone()) {
                    let content = describe_or(lookup, &raw, raw.clone());
                    out.push(raw, content);
                }
            }
            EntityKey::Database { database } => {
                emit_database(&mut out, database);
                // a database hit is emitted even when it was already an ancestor
                if out.chunks.last().map(|c| c.entity.as_str()) != Some(raw.as_str()) {
                    let content = describe_or(lookup, &raw, raw.clone());
                    out.push(raw, content);
                }
            }
            EntityKey::Named(_) => {
                let content = describe_or(lookup, &raw, raw.clone());
                out.push(raw, content);
            }
        }
    }

    tracing::debug!(hits = hits.len(), chunks = out.total_chunks(), "Formatted chunks");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeLookup {
        descriptions: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeLookup {
        fn with(entries: &[(&str, &str)]) -> Self {
            Self {
                descriptions: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Self::default()
            }
        }
    }

    impl DescriptionLookup for FakeLookup {
        fn describe(&self, key: &str) -> crate::Result<String> {
            self.calls.borrow_mut().push(key.to_string());
            Ok(self.descriptions.get(key).cloned().unwrap_or_default())
        }
    }

    struct BrokenLookup;

    impl DescriptionLookup for BrokenLookup {
        fn describe(&self, key: &str) -> crate::Result<String> {
            Err(Error::Store(crate::catalog::StoreError::Failure(format!("cannot read {}", key))))
        }
    }

    fn hit(key: &str) -> SearchHit {
        SearchHit::new(EntityKey::parse(key), 1.0)
    }

    #[test]
    fn test_ancestors_come_first() {
        let lookup = FakeLookup::with(&[
            ("Database:db", "Database: db\nType: MySQL"),
            ("Column:db.users.email", "Column: email"),
        ]);
        let hits = [hit("Column:db.users.email"), hit("Table:db.orders")];

        let chunks = format_hierarchical(&hits, &lookup);
        assert_eq!(
            chunks.entities(),
            vec![
                "Database:db",
                "Table:db.users",
                "Column:db.users.email",
                "Table:db.orders"
            ]
        );

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents[0], "Database: db\nType: MySQL");
        assert_eq!(contents[1], "Table: users in database db");
        assert_eq!(contents[2], "Column: email");
        assert_eq!(contents[3], "Table:db.orders");

        let labels: Vec<&str> = chunks.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["chunk1", "chunk2", "chunk3", "chunk4"]);
    }

    #[test]
    fn test_table_hit_after_its_column_is_not_repeated() {
        let lookup = FakeLookup::default();
        let hits = [
            hit("Column:db.users.email"),
            hit("Column:db.users.id"),
            hit("Table:db.users"),
        ];

        let chunks = format_hierarchical(&hits, &lookup);
        assert_eq!(
            chunks.entities(),
            vec![
                "Database:db",
                "Table:db.users",
                "Column:db.users.email",
                "Column:db.users.id"
            ]
        );
    }

    #[test]
    fn test_other_entities_pass_through() {
        let lookup = FakeLookup::with(&[("PII", "Personally Identifiable Information")]);
        let hits = [hit("PII"), hit("Column:broken"), hit("Database:db"), hit("Table:db.t")];

        let chunks = format_hierarchical(&hits, &lookup);
        assert_eq!(
            chunks.entities(),
            vec!["PII", "Column:broken", "Database:db", "Table:db.t"]
        );
        assert_eq!(chunks.iter().next().unwrap().content, "Personally Identifiable Information");
    }

    #[test]
    fn test_lookups_follow_emission_order() {
        let lookup = FakeLookup::default();
        format_hierarchical(&[hit("Column:db.t.c")], &lookup);
        assert_eq!(
            *lookup.calls.borrow(),
            vec!["Database:db", "Table:db.t", "Column:db.t.c"]
        );
    }

    #[test]
    fn test_failed_lookup_degrades_to_placeholder() {
        let chunks = format_hierarchical(&[hit("Column:db.t.c")], &BrokenLookup);
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["Database: db", "Table: t in database db", "Column:db.t.c"]);
    }

    #[test]
    fn test_serialized_shape() {
        let lookup = FakeLookup::default();
        let chunks = format_hierarchical(&[hit("Table:db.t")], &lookup);

        let json = serde_json::to_string(&chunks).unwrap();
        assert_eq!(
            json,
            r#"{"total_chunks":2,"chunks":{"chunk1":{"Entity":"Database:db","Content":"Database: db"},"chunk2":{"Entity":"Table:db.t","Content":"Table:db.t"}}}"#
        );
    }

    #[test]
    fn test_empty_hits() {
        let chunks = format_hierarchical(&[], &FakeLookup::default());
        assert!(chunks.is_empty());
        assert_eq!(serde_json::to_value(&chunks).unwrap()["total_chunks"], 0);
    }
}
