use super::builder::CatalogBuilder;
use super::taxonomy::{DatabaseMeta, Taxonomy};
use super::CatalogStore;
use crate::ddl;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A build step that failed. The run carries on past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// `None` for the global owner/tag steps
    pub database: Option<String>,
    pub step: String,
    pub error: String,
}

/// Outcome of a full catalog build
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogReport {
    pub success: bool,
    /// Databases whose dump was parsed
    pub databases: usize,
    /// Tags newly created
    pub tags: usize,
    /// Tables processed
    pub tables: usize,
    /// Columns newly created
    pub columns: usize,
    /// REFERENCES relations newly created
    pub foreign_keys: usize,
    /// Databases skipped because their dump could not be read
    pub skipped: Vec<String>,
    pub failures: Vec<StepFailure>,
}

impl CatalogReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record<T>(&mut self, database: Option<&str>, step: &str, result: crate::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(database = database.unwrap_or("-"), step, error = %e, "Catalog step failed");
                self.failures.push(StepFailure {
                    database: database.map(str::to_string),
                    step: step.to_string(),
                    error: e.to_string(),
                });
                None
            }
        }
    }
}

/// Location of a database's dump; relative paths live under `data_dir`.
pub fn resolve_source(db: &DatabaseMeta, data_dir: &Path) -> PathBuf {
    if db.sql_file.is_absolute() {
        db.sql_file.clone()
    } else {
        data_dir.join(&db.sql_file)
    }
}

/// Build the whole catalog: owner and tags once, then per database the
/// database entity, tables, columns and foreign keys, in that order.
///
/// An unreadable dump skips its database. A failing step is recorded in the
/// report and the remaining steps still run. Safe to re-run.
pub fn build_catalog<S>(
    store: &S,
    taxonomy: &Taxonomy,
    databases: &[DatabaseMeta],
    data_dir: &Path,
) -> CatalogReport
where
    S: CatalogStore + ?Sized,
{
    let builder = CatalogBuilder::new(store, taxonomy);
    let mut report = CatalogReport::default();

    tracing::info!(databases = databases.len(), "Building catalog");

    report.record(None, "owner", builder.create_owner_entity());
    if let Some(created) = report.record(None, "tags", builder.create_tags()) {
        report.tags = created;
    }

    for db in databases {
        let path = resolve_source(db, data_dir);
        let tables = match ddl::parse(&path, db.dialect, &db.name) {
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!(database = %db.name, error = %e, "Skipping database");
                report.skipped.push(db.name.clone());
                continue;
            }
        };
        report.databases += 1;

        let name = Some(db.name.as_str());
        report.record(name, "database", builder.create_database_entity(db));
        if let Some(n) = report.record(name, "tables", builder.create_table_entities(db, &tables)) {
            report.tables += n;
        }
        if let Some(n) = report.record(name, "columns", builder.create_column_entities(db, &tables)) {
            report.columns += n;
        }
        if let Some(n) = report.record(
            name,
            "foreign_keys",
            builder.create_foreign_key_relations(db, &tables),
        ) {
            report.foreign_keys += n;
        }
    }

    report.success = report.is_success();
    tracing::info!(
        databases = report.databases,
        tables = report.tables,
        columns = report.columns,
        foreign_keys = report.foreign_keys,
        failures = report.failures.len(),
        "Catalog build finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StoreError, StoreResult};
    use crate::ddl::Dialect;
    use crate::entity::Properties;
    use crate::storage::SqliteStore;
    use std::fs;

    const MYSQL_DUMP: &str = r#"
CREATE TABLE `users` (
  `id` int(11) NOT NULL AUTO_INCREMENT,
  `email` varchar(255) NOT NULL,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;

CREATE TABLE `orders` (
  `id` int(11) NOT NULL AUTO_INCREMENT,
  `user_id` int(11) NOT NULL,
  PRIMARY KEY (`id`),
  CONSTRAINT `fk_orders_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE
) ENGINE=InnoDB;
"#;

    const POSTGRES_DUMP: &str = r#"
CREATE TABLE public.accounts (
    id integer NOT NULL,
    created_at timestamp without time zone DEFAULT now()
);
CREATE TABLE public.sessions (
    id integer NOT NULL,
    account_id integer
);
ALTER TABLE ONLY public.sessions
    ADD CONSTRAINT sessions_account_fk FOREIGN KEY (account_id) REFERENCES public.accounts(id);
"#;

    fn databases() -> Vec<DatabaseMeta> {
        vec![
            DatabaseMeta {
                name: "app".to_string(),
                cluster: "production".to_string(),
                dialect: Dialect::MySql,
                description: "Application".to_string(),
                sql_file: PathBuf::from("app.sql"),
            },
            DatabaseMeta {
                name: "legacy".to_string(),
                cluster: "production".to_string(),
                dialect: Dialect::PostgreSql,
                description: "Legacy".to_string(),
                sql_file: PathBuf::from("legacy.sql"),
            },
        ]
    }

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.sql"), MYSQL_DUMP).unwrap();
        fs::write(dir.path().join("legacy.sql"), POSTGRES_DUMP).unwrap();
        dir
    }

    #[test]
    fn test_build_twice_is_identical() {
        let dir = data_dir();
        let store = SqliteStore::open_in_memory().unwrap();
        let taxonomy = Taxonomy::default();

        let first = build_catalog(&store, &taxonomy, &databases(), dir.path());
        assert!(first.is_success());
        assert_eq!(first.databases, 2);
        assert_eq!(first.tables, 4);
        assert_eq!(first.columns, 8);
        assert_eq!(first.foreign_keys, 2);

        let entities = store.list_entities().unwrap();
        let relations = store.list_relations().unwrap();

        let second = build_catalog(&store, &taxonomy, &databases(), dir.path());
        assert!(second.success);
        assert_eq!(second.tags, 0);
        assert_eq!(second.columns, 0);
        assert_eq!(second.foreign_keys, 0);

        assert_eq!(store.list_entities().unwrap(), entities);
        assert_eq!(store.list_relations().unwrap(), relations);
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("legacy.sql"), POSTGRES_DUMP).unwrap();
        let store = SqliteStore::open_in_memory().unwrap();

        let report = build_catalog(&store, &Taxonomy::default(), &databases(), dir.path());
        assert!(report.is_success());
        assert_eq!(report.skipped, vec!["app".to_string()]);
        assert_eq!(report.databases, 1);
        assert!(store.get_entity("Database:app").unwrap().is_none());
        assert!(store.get_entity("Table:legacy.sessions").unwrap().is_some());
        assert!(store.get_entity("Database Team").unwrap().is_some());
    }

    /// Accepts everything except HAS_COLUMN relations.
    struct BrokenColumnStore {
        inner: SqliteStore,
    }

    impl CatalogStore for BrokenColumnStore {
        fn create_entity(&self, name: &str, properties: &Properties) -> StoreResult<()> {
            self.inner.create_entity(name, properties)
        }

        fn create_relation(&self, source: &str, target: &str, properties: &Properties) -> StoreResult<()> {
            if properties["relation_type"] == "HAS_COLUMN" {
                return Err(StoreError::Failure("disk full".to_string()));
            }
            self.inner.create_relation(source, target, properties)
        }
    }

    #[test]
    fn test_step_failure_is_recorded_and_run_continues() {
        let dir = data_dir();
        let store = BrokenColumnStore {
            inner: SqliteStore::open_in_memory().unwrap(),
        };

        let report = build_catalog(&store, &Taxonomy::default(), &databases(), dir.path());
        assert!(!report.success);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].database.as_deref(), Some("app"));
        assert_eq!(report.failures[0].step, "columns");
        assert!(report.failures[0].error.contains("disk full"));
        assert_eq!(report.failures[1].database.as_deref(), Some("legacy"));

        // the foreign key step still ran after the failed column step
        assert_eq!(report.foreign_keys, 2);
    }

    #[test]
    fn test_absolute_source_path() {
        let mut db = databases().remove(0);
        db.sql_file = PathBuf::from("/srv/dumps/app.sql");
        assert_eq!(resolve_source(&db, Path::new("data")), PathBuf::from("/srv/dumps/app.sql"));
        db.sql_file = PathBuf::from("app.sql");
        assert_eq!(resolve_source(&db, Path::new("data")), PathBuf::from("data/app.sql"));
    }
}
