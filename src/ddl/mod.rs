//! DDL parsing - recovers table structure from MySQL and PostgreSQL dumps
//!
//! Parsing is best-effort: statements that are not understood are skipped,
//! and a malformed element inside a `CREATE TABLE` body costs only that
//! element. The only hard failure is a source that cannot be read.

mod encoding;
mod lexer;
mod mysql;
mod parser;
mod postgres;

pub use encoding::decode;
pub use lexer::{Lexer, Token};

use crate::schema::{Table, TableMap};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// SQL dialect of a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgres", alias = "postgresql")]
    PostgreSql,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::PostgreSql => "postgres",
        }
    }

    /// Name used in catalog descriptions.
    pub fn display_name(&self) -> &'static str {
        match self {
            Dialect::MySql => "MySQL",
            Dialect::PostgreSql => "PostgreSQL",
        }
    }

    pub fn default_engine(&self) -> &'static str {
        match self {
            Dialect::MySql => "InnoDB",
            Dialect::PostgreSql => "PostgreSQL",
        }
    }

    pub fn default_charset(&self) -> &'static str {
        match self {
            Dialect::MySql => "utf8mb4",
            Dialect::PostgreSql => "UTF8",
        }
    }

    pub fn default_collation(&self) -> &'static str {
        match self {
            Dialect::MySql => "utf8mb4_unicode_ci",
            Dialect::PostgreSql => "en_US.UTF-8",
        }
    }

    /// Empty table carrying this dialect's storage defaults.
    pub fn new_table(&self, name: &str, database: &str) -> Table {
        Table::new(
            name,
            database,
            self.default_engine(),
            self.default_charset(),
            self.default_collation(),
        )
    }

    /// Name the server would give an index declared without one.
    pub fn implicit_index_name(&self, table: &str, columns: &[String], is_unique: bool) -> String {
        match self {
            Dialect::MySql => columns.first().cloned().unwrap_or_else(|| table.to_string()),
            Dialect::PostgreSql => {
                let suffix = if is_unique { "key" } else { "idx" };
                format!("{}_{}_{}", table, columns.join("_"), suffix)
            }
        }
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::PostgreSql),
            _ => Err(Error::Config(format!("Unknown SQL dialect: {}", s))),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a dump file.
pub fn parse(path: impl AsRef<Path>, dialect: Dialect, database: &str) -> Result<TableMap> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let text = decode(&bytes);
    let tables = parse_str(&text, dialect, database);
    tracing::info!(
        path = %path.display(),
        dialect = %dialect,
        tables = tables.len(),
        columns = tables.column_count(),
        "Parsed schema dump"
    );
    Ok(tables)
}

/// Parse dump text already in memory.
pub fn parse_str(text: &str, dialect: Dialect, database: &str) -> TableMap {
    let tokens = Lexer::new(text, dialect).tokenize();
    parser::Parser::new(&tokens, dialect, database).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CREATE TABLE t (id INT PRIMARY KEY);").unwrap();

        let tables = parse(file.path(), Dialect::MySql, "db").unwrap();
        assert_eq!(tables.get("t").unwrap().primary_keys, vec!["id"]);
    }

    #[test]
    fn test_missing_source() {
        let err = parse("/nonexistent/dump.sql", Dialect::MySql, "db").unwrap_err();
        assert!(matches!(err, Error::SourceUnreadable { .. }));
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::PostgreSql);
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert!("oracle".parse::<Dialect>().is_err());
        assert_eq!(Dialect::PostgreSql.display_name(), "PostgreSQL");
    }

    #[test]
    fn test_redefinition_keeps_first_position() {
        let sql = "CREATE TABLE a (x int); CREATE TABLE b (y int); CREATE TABLE a (z int);";
        let tables = parse_str(sql, Dialect::MySql, "db");
        assert_eq!(tables.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(tables.get("a").unwrap().columns[0].name, "z");
    }
}
