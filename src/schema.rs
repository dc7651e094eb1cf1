//! Schema model - dialect-agnostic description of parsed tables
//!
//! A [`TableMap`] is produced once per DDL source by the parser and is
//! read-only afterwards. Every table exclusively owns its columns, keys
//! and indexes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Referential action used when a dump does not spell one out.
pub const NO_ACTION: &str = "NO ACTION";

/// A single column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub auto_increment: bool,
}

impl Column {
    /// Create a nullable column with no attributes.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            comment: None,
            is_primary_key: false,
            is_foreign_key: false,
            auto_increment: false,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.data_type)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        if self.is_primary_key {
            write!(f, " PRIMARY KEY")?;
        }
        if self.auto_increment {
            write!(f, " AUTO_INCREMENT")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", default)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " -- {}", comment)?;
        }
        Ok(())
    }
}

/// A single-column foreign key. Composite keys are split into one record
/// per column pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
    pub constraint_name: Option<String>,
    pub on_delete: String,
    pub on_update: String,
}

impl ForeignKey {
    pub fn new(
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            ref_table: ref_table.into(),
            ref_column: ref_column.into(),
            constraint_name: None,
            on_delete: NO_ACTION.to_string(),
            on_update: NO_ACTION.to_string(),
        }
    }

    /// Sample join between the owning table and the referenced one.
    pub fn join_pattern(&self, table: &str) -> String {
        format!(
            "SELECT * FROM {} JOIN {} ON {}.{} = {}.{}",
            table, self.ref_table, table, self.column, self.ref_table, self.ref_column
        )
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FK: {} -> {}.{}", self.column, self.ref_table, self.ref_column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub index_type: Option<String>,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: Vec<String>, is_unique: bool) -> Self {
        Self {
            name: name.into(),
            columns,
            is_unique,
            index_type: None,
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unique = if self.is_unique { "UNIQUE " } else { "" };
        write!(f, "{}INDEX {} ({})", unique, self.name, self.columns.join(", "))
    }
}

/// A parsed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub database: String,
    pub columns: Vec<Column>,
    pub primary_keys: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<Index>,
    pub engine: String,
    pub charset: String,
    pub collation: String,
    pub comment: Option<String>,
}

impl Table {
    pub fn new(
        name: impl Into<String>,
        database: impl Into<String>,
        engine: impl Into<String>,
        charset: impl Into<String>,
        collation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            database: database.into(),
            columns: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            engine: engine.into(),
            charset: charset.into(),
            collation: collation.into(),
            comment: None,
        }
    }

    /// Append a column. A later column with an existing name replaces the
    /// earlier definition in place, key membership included.
    pub fn add_column(&mut self, column: Column) {
        if column.is_primary_key {
            if !self.primary_keys.contains(&column.name) {
                self.primary_keys.push(column.name.clone());
            }
        } else {
            self.primary_keys.retain(|name| *name != column.name);
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Extend the primary-key set and flag the matching columns.
    pub fn mark_primary_keys(&mut self, names: &[String]) {
        for name in names {
            if !self.primary_keys.contains(name) {
                self.primary_keys.push(name.clone());
            }
        }
        for column in &mut self.columns {
            if names.contains(&column.name) {
                column.is_primary_key = true;
            }
        }
    }

    /// Record a foreign key and flag its source column.
    pub fn add_foreign_key(&mut self, fk: ForeignKey) {
        if let Some(column) = self.get_column_mut(&fk.column) {
            column.is_foreign_key = true;
        }
        self.foreign_keys.push(fk);
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Render Markdown documentation for the table.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            format!("# {} Table", self.name.to_uppercase()),
            String::new(),
            "## Table Overview".to_string(),
            format!("- **Table Name**: `{}`", self.name),
            format!("- **Database**: {}", self.database),
            format!("- **Storage Engine**: {}", self.engine),
            format!("- **Character Set**: {}", self.charset),
            format!("- **Collation**: {}", self.collation),
        ];

        if self.primary_keys.is_empty() {
            lines.push("- **Primary Key**: Not defined".to_string());
        } else {
            lines.push(format!("- **Primary Key**: {}", self.primary_keys.join(", ")));
        }

        match &self.comment {
            Some(comment) => lines.push(format!("\n**Purpose**: {}", comment)),
            None => lines.push("\n**Purpose**: *(Add business purpose here)*".to_string()),
        }

        lines.extend([String::new(), "## Columns".to_string(), String::new()]);
        for col in &self.columns {
            let mut line = format!("- **{}**: {}", col.name, col.data_type);
            if !col.nullable {
                line.push_str(" - NOT NULL");
            }
            if let Some(default) = &col.default {
                line.push_str(&format!(" - DEFAULT {}", default));
            }
            if let Some(comment) = &col.comment {
                line.push_str(&format!(" - {}", comment));
            }
            lines.push(line);
        }

        if !self.foreign_keys.is_empty() {
            lines.extend([String::new(), "## Foreign Keys".to_string(), String::new()]);
            for fk in &self.foreign_keys {
                lines.push(format!(
                    "- **{}** references `{}.{}`",
                    fk.column, fk.ref_table, fk.ref_column
                ));
                if fk.on_delete != NO_ACTION {
                    lines.push(format!("  - ON DELETE {}", fk.on_delete));
                }
                if fk.on_update != NO_ACTION {
                    lines.push(format!("  - ON UPDATE {}", fk.on_update));
                }
            }
        }

        if !self.indexes.is_empty() {
            lines.extend([String::new(), "## Indexes".to_string(), String::new()]);
            for idx in &self.indexes {
                lines.push(format!("- **{}**: {}", idx.name, idx.columns.join(", ")));
                if idx.is_unique {
                    lines.push("  - UNIQUE".to_string());
                }
            }
        }

        lines.extend([
            String::new(),
            "## Business Rules".to_string(),
            "*(Add business logic, validation rules, and constraints here)*".to_string(),
            String::new(),
        ]);

        lines.join("\n")
    }
}

/// Tables keyed by name, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMap {
    tables: Vec<Table>,
    positions: HashMap<String, usize>,
}

impl TableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a table. Re-inserting a known name replaces the table but keeps
    /// its original position.
    pub fn insert(&mut self, table: Table) {
        match self.positions.get(&table.name) {
            Some(&pos) => self.tables[pos] = table,
            None => {
                self.positions.insert(table.name.clone(), self.tables.len());
                self.tables.push(table);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.positions.get(name).map(|&pos| &self.tables[pos])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Table> {
        match self.positions.get(name) {
            Some(&pos) => self.tables.get_mut(pos),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

impl<'a> IntoIterator for &'a TableMap {
    type Item = &'a Table;
    type IntoIter = std::slice::Iter<'a, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

impl Serialize for TableMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.tables.serialize(serializer)
    }
}
