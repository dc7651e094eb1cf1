//! Catalog vocabulary - entity and relation kinds
//!
//! Every catalog node is one of five entity kinds:
//! - `Owner`: the team responsible for the tables
//! - `Tag`: a column classification
//! - `Database`, `Table`, `Column`: the schema hierarchy
//!
//! Relations between them reduce to five directed kinds:
//! - `HasTable`: database → table
//! - `HasColumn`: table → column
//! - `OwnedBy`: table → owner
//! - `References`: table → table
//! - `Tagged`: column → tag

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form property bag attached to entities and relations.
///
/// The `description` field holds the text used for retrieval.
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Owner,
    Tag,
    Database,
    Table,
    Column,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Owner => "owner",
            EntityKind::Tag => "tag",
            EntityKind::Database => "database",
            EntityKind::Table => "table",
            EntityKind::Column => "column",
        }
    }

    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Owner,
            EntityKind::Tag,
            EntityKind::Database,
            EntityKind::Table,
            EntityKind::Column,
        ]
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    HasTable,
    HasColumn,
    OwnedBy,
    References,
    Tagged,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::HasTable => "HAS_TABLE",
            RelationKind::HasColumn => "HAS_COLUMN",
            RelationKind::OwnedBy => "OWNED_BY",
            RelationKind::References => "REFERENCES",
            RelationKind::Tagged => "TAGGED",
        }
    }

    pub fn all() -> &'static [RelationKind] {
        &[
            RelationKind::HasTable,
            RelationKind::HasColumn,
            RelationKind::OwnedBy,
            RelationKind::References,
            RelationKind::Tagged,
        ]
    }

    /// Ranking weight attached to relations of this kind.
    pub fn weight(&self) -> f64 {
        match self {
            RelationKind::HasTable => 1.5,
            RelationKind::HasColumn => 1.0,
            RelationKind::OwnedBy => 1.0,
            RelationKind::References => 2.0,
            RelationKind::Tagged => 0.8,
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Property bag for a new entity of `kind` with the given description.
pub fn entity_properties(kind: EntityKind, description: impl Into<String>) -> Properties {
    let mut props = Properties::new();
    props.insert("description".to_string(), Value::String(description.into()));
    props.insert("entity_type".to_string(), Value::String(kind.as_str().to_string()));
    props
}

/// Property bag for a new relation of `kind`.
pub fn relation_properties(
    kind: RelationKind,
    description: impl Into<String>,
    keywords: impl Into<String>,
) -> Properties {
    let mut props = Properties::new();
    props.insert("description".to_string(), Value::String(description.into()));
    props.insert("keywords".to_string(), Value::String(keywords.into()));
    props.insert("weight".to_string(), Value::from(kind.weight()));
    props.insert("relation_type".to_string(), Value::String(kind.as_str().to_string()));
    props
}

/// Read the `description` field of a property bag.
pub fn description_of(props: &Properties) -> &str {
    props.get("description").and_then(Value::as_str).unwrap_or("")
}

/// An entity as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub entity_type: Option<String>,
    pub description: String,
    pub properties: Properties,
}

/// A relation as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub source: String,
    pub target: String,
    pub relation_type: Option<String>,
    pub description: String,
    pub weight: f64,
    pub properties: Properties,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_names_match_serde() {
        for kind in EntityKind::all() {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn test_relation_kind_names_match_serde() {
        for kind in RelationKind::all() {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }

    #[test]
    fn test_relation_properties() {
        let props = relation_properties(RelationKind::References, "orders → users", "foreign_key");
        assert_eq!(description_of(&props), "orders → users");
        assert_eq!(props["relation_type"], "REFERENCES");
        assert_eq!(props["weight"], 2.0);
    }
}
