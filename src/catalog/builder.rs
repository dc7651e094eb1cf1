use super::taxonomy::{DatabaseMeta, Taxonomy, tags};
use super::{CatalogStore, UpsertOutcome};
use crate::Result;
use crate::entity::{EntityKind, RelationKind, entity_properties, relation_properties};
use crate::key::EntityKey;
use crate::schema::{Column, Table, TableMap};
use serde_json::Value;

/// Turns parsed tables into catalog entities and relations.
///
/// Every step is an idempotent upsert. When an entity already exists its
/// relations and tags are still ensured, so a re-run repairs a partially
/// built graph.
pub struct CatalogBuilder<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
    taxonomy: &'a Taxonomy,
}

impl<'a, S: CatalogStore + ?Sized> CatalogBuilder<'a, S> {
    pub fn new(store: &'a S, taxonomy: &'a Taxonomy) -> Self {
        Self { store, taxonomy }
    }

    pub fn create_owner_entity(&self) -> Result<UpsertOutcome> {
        let owner = &self.taxonomy.owner;
        let mut props = entity_properties(
            EntityKind::Owner,
            format!("Owner: {} ({})", owner.name, owner.email),
        );
        props.insert("email".to_string(), Value::from(owner.email.as_str()));

        let outcome = self.store.upsert_entity(&owner.name, &props)?;
        log_outcome(outcome, "Owner", &owner.name);
        Ok(outcome)
    }

    /// Returns the number of tags newly created.
    pub fn create_tags(&self) -> Result<usize> {
        let mut created = 0;
        for tag in &self.taxonomy.tags {
            let props = entity_properties(EntityKind::Tag, tag.description.as_str());
            let outcome = self.store.upsert_entity(&tag.name, &props)?;
            log_outcome(outcome, "Tag", &tag.name);
            created += usize::from(outcome.is_created());
        }
        Ok(created)
    }

    pub fn create_database_entity(&self, db: &DatabaseMeta) -> Result<UpsertOutcome> {
        let key = EntityKey::database(&db.name);
        let mut props = entity_properties(
            EntityKind::Database,
            format!(
                "Database: {}\nType: {}\nCluster: {}\nDescription: {}",
                db.name,
                db.db_type(),
                db.cluster,
                db.description
            ),
        );
        props.insert("db_type".to_string(), Value::from(db.db_type()));
        props.insert("cluster".to_string(), Value::from(db.cluster.as_str()));

        let outcome = self.store.upsert_entity(&key.to_key_string(), &props)?;
        log_outcome(outcome, "Database", &db.name);
        Ok(outcome)
    }

    /// Table entities with their HAS_TABLE and OWNED_BY relations. Returns
    /// the number of tables processed.
    pub fn create_table_entities(&self, db: &DatabaseMeta, tables: &TableMap) -> Result<usize> {
        tracing::info!(database = %db.name, tables = tables.len(), "Creating table entities");

        let db_key = EntityKey::database(&db.name).to_key_string();
        let owner = &self.taxonomy.owner.name;

        for table in tables {
            let key = EntityKey::table(&db.name, &table.name).to_key_string();

            let mut props = entity_properties(EntityKind::Table, table_description(db, table));
            props.insert("database".to_string(), Value::from(db.name.as_str()));
            props.insert("engine".to_string(), Value::from(table.engine.as_str()));
            props.insert("column_count".to_string(), Value::from(table.columns.len()));
            let outcome = self.store.upsert_entity(&key, &props)?;
            log_outcome(outcome, "Table", &key);

            let has_table = relation_properties(
                RelationKind::HasTable,
                format!("Database {} contains table {}", db.name, table.name),
                "has_table contains database_structure",
            );
            self.store.upsert_relation(&db_key, &key, &has_table)?;

            let owned_by = relation_properties(
                RelationKind::OwnedBy,
                format!("Table {} is owned by {}", table.name, owner),
                "owned_by ownership responsibility",
            );
            self.store.upsert_relation(&key, owner, &owned_by)?;
        }
        Ok(tables.len())
    }

    /// Column entities, HAS_COLUMN relations and tags. Returns the number of
    /// columns newly created.
    pub fn create_column_entities(&self, db: &DatabaseMeta, tables: &TableMap) -> Result<usize> {
        tracing::info!(database = %db.name, columns = tables.column_count(), "Creating column entities");

        let mut created = 0;
        for table in tables {
            let table_key = EntityKey::table(&db.name, &table.name).to_key_string();

            for (idx, column) in table.columns.iter().enumerate() {
                let ordinal = idx + 1;
                let key = EntityKey::column(&db.name, &table.name, &column.name).to_key_string();

                let mut props = entity_properties(
                    EntityKind::Column,
                    column_description(db, table, column, ordinal),
                );
                props.insert("table".to_string(), Value::from(table.name.as_str()));
                props.insert("database".to_string(), Value::from(db.name.as_str()));
                props.insert("dtype".to_string(), Value::from(column.data_type.as_str()));
                props.insert("nullable".to_string(), Value::from(column.nullable));
                props.insert("ordinal".to_string(), Value::from(ordinal));
                props.insert("comment".to_string(), Value::from(column.comment.clone()));

                let outcome = self.store.upsert_entity(&key, &props)?;
                if outcome.is_created() {
                    created += 1;
                    tracing::debug!(column = %key, data_type = %column.data_type, "Created column");
                } else {
                    tracing::debug!(column = %key, "Column already exists");
                }

                let mut has_column = relation_properties(
                    RelationKind::HasColumn,
                    format!(
                        "Table {} has column {} at position {}",
                        table.name, column.name, ordinal
                    ),
                    "has_column schema_structure column_definition",
                );
                has_column.insert("ordinal".to_string(), Value::from(ordinal));
                self.store.upsert_relation(&table_key, &key, &has_column)?;

                for tag in column_tags(column) {
                    if !self.taxonomy.has_tag(tag) {
                        continue;
                    }
                    let tagged = relation_properties(
                        RelationKind::Tagged,
                        format!("Column {} is tagged as {}", key, tag),
                        format!("tagged classification {}", tag.to_lowercase()),
                    );
                    self.store.upsert_relation(&key, tag, &tagged)?;
                }
            }
        }

        tracing::info!(database = %db.name, created, "Column entities done");
        Ok(created)
    }

    /// REFERENCES relations between tables of the same database. Foreign
    /// keys to tables outside the set are skipped. Returns the number of
    /// relations newly created.
    pub fn create_foreign_key_relations(&self, db: &DatabaseMeta, tables: &TableMap) -> Result<usize> {
        let mut created = 0;
        for table in tables {
            let from_key = EntityKey::table(&db.name, &table.name).to_key_string();

            for fk in &table.foreign_keys {
                if !tables.contains(&fk.ref_table) {
                    tracing::warn!(
                        table = %table.name,
                        column = %fk.column,
                        referenced = %fk.ref_table,
                        "Referenced table not found, foreign key skipped"
                    );
                    continue;
                }

                let to_key = EntityKey::table(&db.name, &fk.ref_table).to_key_string();
                let description = format!(
                    "Foreign Key Relationship: {table} → {ref_table}\n\n\
                     Column Mapping:\n\
                     - {table}.{column} references {ref_table}.{ref_column}\n\n\
                     Constraint: {constraint}\n\
                     ON DELETE: {on_delete}\n\
                     ON UPDATE: {on_update}\n\n\
                     Join Pattern:\n\
                     {join}",
                    table = table.name,
                    ref_table = fk.ref_table,
                    column = fk.column,
                    ref_column = fk.ref_column,
                    constraint = fk.constraint_name.as_deref().unwrap_or("N/A"),
                    on_delete = fk.on_delete,
                    on_update = fk.on_update,
                    join = fk.join_pattern(&table.name),
                );

                let mut props = relation_properties(
                    RelationKind::References,
                    description,
                    format!("foreign_key references {} {} join", fk.column, fk.ref_column),
                );
                props.insert("from_column".to_string(), Value::from(fk.column.as_str()));
                props.insert("to_column".to_string(), Value::from(fk.ref_column.as_str()));

                // One relation per table pair: a second FK between the same
                // tables lands on the existing triple.
                let outcome = self.store.upsert_relation(&from_key, &to_key, &props)?;
                if outcome.is_created() {
                    created += 1;
                    tracing::info!(
                        "FK: {}.{} → {}.{}",
                        table.name,
                        fk.column,
                        fk.ref_table,
                        fk.ref_column
                    );
                }
            }
        }
        Ok(created)
    }
}

fn log_outcome(outcome: UpsertOutcome, kind: &str, name: &str) {
    match outcome {
        UpsertOutcome::Created => tracing::info!("{}: {} created", kind, name),
        UpsertOutcome::Existing => tracing::debug!("{}: {} already exists", kind, name),
    }
}

/// Tags assigned to a column by name and key flags. Matching is
/// case-insensitive.
pub fn column_tags(column: &Column) -> Vec<&'static str> {
    let name = column.name.to_lowercase();
    let mut assigned = Vec::new();

    if column.is_primary_key {
        assigned.push(tags::PRIMARY_KEY);
    }
    if column.is_foreign_key {
        assigned.push(tags::FOREIGN_KEY);
    }
    if !column.nullable {
        assigned.push(tags::REQUIRED);
    }
    if name.contains("password") || name.contains("email") {
        assigned.push(tags::PII);
    }
    if name.contains("time") || name.contains("date") {
        assigned.push(tags::TIMESTAMP);
    }
    if matches!(name.as_str(), "password" | "token" | "secret") {
        assigned.push(tags::AUTHENTICATION);
    }
    assigned
}

fn table_description(db: &DatabaseMeta, table: &Table) -> String {
    let columns = if table.columns.is_empty() {
        "No columns".to_string()
    } else {
        table
            .columns
            .iter()
            .map(|col| {
                let mut line = format!("- {}: {}", col.name, col.data_type);
                if !col.nullable {
                    line.push_str(" NOT NULL");
                }
                if col.is_primary_key {
                    line.push_str(" PRIMARY KEY");
                }
                if let Some(comment) = &col.comment {
                    line.push_str(&format!(" -- {}", comment));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let foreign_keys = if table.foreign_keys.is_empty() {
        "No foreign keys".to_string()
    } else {
        table
            .foreign_keys
            .iter()
            .map(|fk| format!("- {} → {}.{}", fk.column, fk.ref_table, fk.ref_column))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Table: {}\nDatabase: {} ({})\nEngine: {}\nCharset: {}\nComment: {}\n\nColumns:\n{}\n\nForeign Keys:\n{}",
        table.name,
        db.name,
        db.db_type(),
        table.engine,
        table.charset,
        table.comment.as_deref().unwrap_or("N/A"),
        columns,
        foreign_keys
    )
}

fn column_description(db: &DatabaseMeta, table: &Table, column: &Column, ordinal: usize) -> String {
    format!(
        "Column: {}\nTable: {}\nDatabase: {}\nData Type: {}\nNullable: {}\nPosition: {}\n\
         Primary Key: {}\nForeign Key: {}\nDefault: {}\nComment: {}",
        column.name,
        table.name,
        db.name,
        column.data_type,
        column.nullable,
        ordinal,
        column.is_primary_key,
        column.is_foreign_key,
        column.default.as_deref().unwrap_or("None"),
        column.comment.as_deref().unwrap_or("N/A"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StoreError, StoreResult};
    use crate::ddl::{Dialect, parse_str};
    use crate::entity::Properties;
    use crate::schema::ForeignKey;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    /// In-memory store keyed like the SQLite one.
    #[derive(Default)]
    struct MemoryStore {
        entities: RefCell<BTreeMap<String, Properties>>,
        relations: RefCell<BTreeMap<(String, String, String), Properties>>,
    }

    impl CatalogStore for MemoryStore {
        fn create_entity(&self, name: &str, properties: &Properties) -> StoreResult<()> {
            let mut entities = self.entities.borrow_mut();
            if entities.contains_key(name) {
                return Err(StoreError::AlreadyExists(name.to_string()));
            }
            entities.insert(name.to_string(), properties.clone());
            Ok(())
        }

        fn create_relation(&self, source: &str, target: &str, properties: &Properties) -> StoreResult<()> {
            let kind = properties["relation_type"].as_str().unwrap_or_default().to_string();
            let key = (source.to_string(), target.to_string(), kind);
            let mut relations = self.relations.borrow_mut();
            if relations.contains_key(&key) {
                return Err(StoreError::AlreadyExists(format!("{} -> {}", source, target)));
            }
            relations.insert(key, properties.clone());
            Ok(())
        }
    }

    fn meta() -> DatabaseMeta {
        DatabaseMeta {
            name: "shop".to_string(),
            cluster: "production".to_string(),
            dialect: Dialect::MySql,
            description: "Web shop".to_string(),
            sql_file: PathBuf::from("shop.sql"),
        }
    }

    fn tables() -> TableMap {
        parse_str(
            r#"
CREATE TABLE users (
  id INT NOT NULL AUTO_INCREMENT,
  email VARCHAR(255) NOT NULL,
  password VARCHAR(64),
  updated_at DATETIME,
  PRIMARY KEY (id)
);
CREATE TABLE orders (
  id INT PRIMARY KEY,
  user_id INT NOT NULL,
  warehouse_id INT,
  FOREIGN KEY (user_id) REFERENCES users (id),
  FOREIGN KEY (warehouse_id) REFERENCES warehouses (id)
);
"#,
            Dialect::MySql,
            "shop",
        )
    }

    fn tags_of(store: &MemoryStore, column_key: &str) -> Vec<String> {
        store
            .relations
            .borrow()
            .keys()
            .filter(|(source, _, kind)| source == column_key && kind == "TAGGED")
            .map(|(_, target, _)| target.clone())
            .collect()
    }

    #[test]
    fn test_email_column_tags() {
        let mut email = Column::new("email", "VARCHAR(255)");
        email.nullable = false;

        let mut assigned = column_tags(&email);
        assigned.sort();
        assert_eq!(assigned, vec![tags::PII, tags::REQUIRED]);
    }

    #[test]
    fn test_authentication_is_exact_match() {
        let password = Column::new("Password", "TEXT");
        assert!(column_tags(&password).contains(&tags::AUTHENTICATION));

        let hash = Column::new("password_hash", "TEXT");
        assert_eq!(column_tags(&hash), vec![tags::PII]);

        let mut created = Column::new("created_at", "DATETIME");
        created.is_foreign_key = true;
        assert_eq!(column_tags(&created), vec![tags::FOREIGN_KEY]);
        assert_eq!(column_tags(&Column::new("date_of_birth", "DATE")), vec![tags::TIMESTAMP]);
    }

    #[test]
    fn test_full_build_sequence() {
        let store = MemoryStore::default();
        let taxonomy = Taxonomy::default();
        let builder = CatalogBuilder::new(&store, &taxonomy);
        let db = meta();
        let tables = tables();

        builder.create_owner_entity().unwrap();
        assert_eq!(builder.create_tags().unwrap(), 6);
        builder.create_database_entity(&db).unwrap();
        assert_eq!(builder.create_table_entities(&db, &tables).unwrap(), 2);
        assert_eq!(builder.create_column_entities(&db, &tables).unwrap(), 7);
        assert_eq!(builder.create_foreign_key_relations(&db, &tables).unwrap(), 1);

        let entities = store.entities.borrow();
        assert!(entities.contains_key("Database Team"));
        assert!(entities.contains_key("Database:shop"));
        assert!(entities.contains_key("Table:shop.orders"));
        assert!(entities.contains_key("Column:shop.users.email"));
        assert_eq!(
            entities["Database:shop"]["description"],
            "Database: shop\nType: MySQL\nCluster: production\nDescription: Web shop"
        );

        let relations = store.relations.borrow();
        assert!(relations.contains_key(&(
            "Table:shop.orders".to_string(),
            "Table:shop.users".to_string(),
            "REFERENCES".to_string()
        )));
        // dangling reference to warehouses is omitted
        assert!(!relations.keys().any(|(_, target, _)| target.contains("warehouses")));

        let has_column = &relations[&(
            "Table:shop.users".to_string(),
            "Column:shop.users.email".to_string(),
            "HAS_COLUMN".to_string(),
        )];
        assert_eq!(has_column["ordinal"], 2);
        drop(relations);

        let mut email_tags = tags_of(&store, "Column:shop.users.email");
        email_tags.sort();
        assert_eq!(email_tags, vec!["PII", "Required"]);
    }

    #[test]
    fn test_table_description_sections() {
        let tables = tables();
        let description = table_description(&meta(), tables.get("orders").unwrap());
        assert!(description.starts_with("Table: orders\nDatabase: shop (MySQL)\nEngine: InnoDB"));
        assert!(description.contains("- id: INT PRIMARY KEY"));
        assert!(description.contains("- user_id → users.id"));

        let empty = crate::schema::Table::new("empty", "shop", "InnoDB", "utf8mb4", "utf8mb4_unicode_ci");
        let description = table_description(&meta(), &empty);
        assert!(description.contains("Columns:\nNo columns"));
        assert!(description.contains("Foreign Keys:\nNo foreign keys"));
    }

    #[test]
    fn test_rerun_creates_nothing_new() {
        let store = MemoryStore::default();
        let taxonomy = Taxonomy::default();
        let builder = CatalogBuilder::new(&store, &taxonomy);
        let db = meta();
        let tables = tables();

        builder.create_column_entities(&db, &tables).unwrap();
        let relations_before = store.relations.borrow().len();

        assert_eq!(builder.create_column_entities(&db, &tables).unwrap(), 0);
        assert_eq!(builder.create_foreign_key_relations(&db, &tables).unwrap(), 1);
        assert_eq!(builder.create_foreign_key_relations(&db, &tables).unwrap(), 0);
        assert_eq!(store.relations.borrow().len(), relations_before + 1);
    }

    #[test]
    fn test_tags_outside_taxonomy_are_not_linked() {
        let store = MemoryStore::default();
        let taxonomy = Taxonomy {
            tags: vec![crate::catalog::TagDef::new(tags::PII, "sensitive")],
            ..Taxonomy::default()
        };
        let builder = CatalogBuilder::new(&store, &taxonomy);
        builder.create_column_entities(&meta(), &tables()).unwrap();

        assert_eq!(tags_of(&store, "Column:shop.users.email"), vec!["PII"]);
    }

    #[test]
    fn test_foreign_key_description_has_join_pattern() {
        let store = MemoryStore::default();
        let taxonomy = Taxonomy::default();
        let builder = CatalogBuilder::new(&store, &taxonomy);

        let mut tables = TableMap::new();
        let mut users = Table::new("users", "shop", "InnoDB", "utf8mb4", "utf8mb4_unicode_ci");
        users.add_column(Column::new("id", "INT"));
        let mut orders = Table::new("orders", "shop", "InnoDB", "utf8mb4", "utf8mb4_unicode_ci");
        orders.add_column(Column::new("user_id", "INT"));
        orders.add_foreign_key(ForeignKey::new("user_id", "users", "id"));
        tables.insert(users);
        tables.insert(orders);

        builder.create_foreign_key_relations(&meta(), &tables).unwrap();
        let relations = store.relations.borrow();
        let (_, props) = relations.iter().next().unwrap();
        let description = props["description"].as_str().unwrap();
        assert!(description.contains("SELECT * FROM orders JOIN users ON orders.user_id = users.id"));
        assert!(description.contains("Constraint: N/A"));
        assert_eq!(props["weight"], 2.0);
    }
}
