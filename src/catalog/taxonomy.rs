//! Owner, tag and database metadata fed into the builder.

use crate::ddl::Dialect;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Names of the tags assigned by the column heuristic.
pub mod tags {
    pub const PII: &str = "PII";
    pub const AUTHENTICATION: &str = "Authentication";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const FOREIGN_KEY: &str = "Foreign_Key";
    pub const PRIMARY_KEY: &str = "Primary_Key";
    pub const REQUIRED: &str = "Required";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub email: String,
}

impl Default for Owner {
    fn default() -> Self {
        Self {
            name: "Database Team".to_string(),
            email: "db-team@company.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDef {
    pub name: String,
    pub description: String,
}

impl TagDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

pub fn default_tags() -> Vec<TagDef> {
    vec![
        TagDef::new(
            tags::PII,
            "Personally Identifiable Information - sensitive data requiring protection",
        ),
        TagDef::new(tags::AUTHENTICATION, "Authentication and security related fields"),
        TagDef::new(tags::TIMESTAMP, "Time-based tracking fields"),
        TagDef::new(tags::FOREIGN_KEY, "Foreign key relationships"),
        TagDef::new(tags::PRIMARY_KEY, "Primary key identifier"),
        TagDef::new(tags::REQUIRED, "NOT NULL fields that must have values"),
    ]
}

/// Classification vocabulary of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub owner: Owner,
    #[serde(default = "default_tags")]
    pub tags: Vec<TagDef>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            owner: Owner::default(),
            tags: default_tags(),
        }
    }
}

impl Taxonomy {
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }
}

/// One database whose dump feeds the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMeta {
    pub name: String,
    #[serde(default = "default_cluster")]
    pub cluster: String,
    pub dialect: Dialect,
    #[serde(default)]
    pub description: String,
    /// Dump file; relative paths resolve against the data directory.
    pub sql_file: PathBuf,
}

fn default_cluster() -> String {
    "production".to_string()
}

impl DatabaseMeta {
    /// Display name of the database engine.
    pub fn db_type(&self) -> &'static str {
        self.dialect.display_name()
    }
}

pub fn default_databases() -> Vec<DatabaseMeta> {
    vec![
        DatabaseMeta {
            name: "mysql_application_db".to_string(),
            cluster: default_cluster(),
            dialect: Dialect::MySql,
            description: "MySQL production database containing user management and business workflow tables"
                .to_string(),
            sql_file: PathBuf::from("vd.sql"),
        },
        DatabaseMeta {
            name: "postgres_legacy_db".to_string(),
            cluster: default_cluster(),
            dialect: Dialect::PostgreSql,
            description: "PostgreSQL production database containing legacy system data and operational tables"
                .to_string(),
            sql_file: PathBuf::from("sqlfile.sql"),
        },
    ]
}
