//! Entity keys - stable composite identity for catalog entities
//!
//! Format:
//! - `Database:<db>`
//! - `Table:<db>.<table>`
//! - `Column:<db>.<table>.<column>`
//!
//! Owners and tags are keyed by their bare display name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key of a catalog entity.
///
/// Used as the entity name in the store, as relation endpoints and as the
/// identity carried by search hits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Database { database: String },
    Table { database: String, table: String },
    Column { database: String, table: String, column: String },
    /// Owner, tag, or any key outside the hierarchical grammar
    Named(String),
}

impl EntityKey {
    pub fn database(database: impl Into<String>) -> Self {
        Self::Database { database: database.into() }
    }

    pub fn table(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self::Table {
            database: database.into(),
            table: table.into(),
        }
    }

    pub fn column(
        database: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self::Column {
            database: database.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Parse a key string. Anything that does not follow the hierarchical
    /// grammar becomes [`EntityKey::Named`].
    ///
    /// Table and column names never contain dots, so the path is split from
    /// the right and a dotted database name survives intact.
    pub fn parse(key: &str) -> Self {
        if let Some(db) = key.strip_prefix("Database:") {
            if !db.is_empty() {
                return Self::database(db);
            }
        } else if let Some(path) = key.strip_prefix("Table:") {
            if let Some((db, table)) = path.rsplit_once('.') {
                if !db.is_empty() && !table.is_empty() {
                    return Self::table(db, table);
                }
            }
        } else if let Some(path) = key.strip_prefix("Column:") {
            let mut parts = path.rsplitn(3, '.');
            if let (Some(column), Some(table), Some(db)) = (parts.next(), parts.next(), parts.next()) {
                if !db.is_empty() && !table.is_empty() && !column.is_empty() {
                    return Self::column(db, table, column);
                }
            }
        }
        Self::Named(key.to_string())
    }

    /// Convert to key string
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Database { database } => format!("Database:{}", database),
            Self::Table { database, table } => format!("Table:{}.{}", database, table),
            Self::Column { database, table, column } => {
                format!("Column:{}.{}.{}", database, table, column)
            }
            Self::Named(name) => name.clone(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key_string())
    }
}

impl Serialize for EntityKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_key_string())
    }
}

impl<'de> Deserialize<'de> for EntityKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(EntityKey::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strings() {
        assert_eq!(EntityKey::database("shop").to_key_string(), "Database:shop");
        assert_eq!(EntityKey::table("shop", "users").to_key_string(), "Table:shop.users");
        assert_eq!(
            EntityKey::column("shop", "users", "email").to_key_string(),
            "Column:shop.users.email"
        );
        assert_eq!(EntityKey::named("PII").to_key_string(), "PII");
    }

    #[test]
    fn test_parse_hierarchy() {
        let key = EntityKey::parse("Column:shop.users.email");
        assert_eq!(key, EntityKey::column("shop", "users", "email"));
        assert_eq!(EntityKey::parse("Table:shop.users"), EntityKey::table("shop", "users"));
        assert_eq!(EntityKey::parse("Database:shop"), EntityKey::database("shop"));
    }

    #[test]
    fn test_dotted_database_name() {
        let key = EntityKey::parse("Column:prod.eu.users.email");
        assert_eq!(key, EntityKey::column("prod.eu", "users", "email"));
        let table = EntityKey::parse("Table:prod.eu.users");
        assert_eq!(table, EntityKey::table("prod.eu", "users"));
    }

    #[test]
    fn test_malformed_keys_are_named() {
        assert_eq!(EntityKey::parse("Column:users.email"), EntityKey::named("Column:users.email"));
        assert_eq!(EntityKey::parse("Table:users"), EntityKey::named("Table:users"));
        assert_eq!(EntityKey::parse("Database Team"), EntityKey::named("Database Team"));
        assert_eq!(EntityKey::parse("Database:"), EntityKey::named("Database:"));
    }
}
