//! dbcatalog CLI - build and query a catalog of database schemas

use clap::{Parser, Subcommand};
use dbcatalog::catalog::{DatabaseMeta, build_catalog, resolve_source};
use dbcatalog::config::{self, CatalogConfig};
use dbcatalog::ddl::{self, Dialect};
use dbcatalog::query::{EmbeddingEngine, QueryEngine, SearchMode};
use dbcatalog::storage::SqliteStore;
use dbcatalog::ui::{self, BatchProgress, Icons, Spinner, TableBuilder};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "dbcatalog")]
#[command(version)]
#[command(about = "Database schema catalog - searchable graph of tables, columns and keys")]
#[command(long_about = r#"
dbcatalog turns MySQL and PostgreSQL schema dumps into a catalog graph, enabling:
  • Search over databases, tables and columns
  • Hierarchical answers (database, then table, then column)
  • PII / authentication / key tagging of columns

Example usage:
  dbcatalog init
  dbcatalog build
  dbcatalog query --query "user email address"
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./dbcatalog.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and create the catalog directory
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Parse a single dump and print the tables found
    Parse {
        /// Dump file
        #[arg(short, long)]
        file: PathBuf,

        /// SQL dialect (mysql, postgres)
        #[arg(short = 'D', long)]
        dialect: Dialect,

        /// Database name used in keys
        #[arg(short, long, default_value = "db")]
        name: String,

        /// Print tables as markdown
        #[arg(long)]
        markdown: bool,

        /// Print tables as JSON
        #[arg(long, conflicts_with = "markdown")]
        json: bool,
    },

    /// Build the catalog from every configured database
    Build {
        /// Only build these databases (by name)
        #[arg(short, long)]
        database: Vec<String>,

        /// Drop all catalog data first
        #[arg(long)]
        rebuild: bool,
    },

    /// Compute embeddings for entities that have none
    Embed,

    /// Search the catalog
    Query {
        /// Search query
        #[arg(short, long)]
        query: String,

        /// Number of hits to expand
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Use vector similarity instead of term search
        #[arg(long)]
        vector: bool,

        /// Print the chunk document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show catalog statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Serve the catalog over HTTP
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Init { force } => run_init(&config_path, force),
        Commands::Parse {
            file,
            dialect,
            name,
            markdown,
            json,
        } => run_parse(&file, dialect, &name, markdown, json),
        Commands::Build { database, rebuild } => run_build(&load(&config_path)?, &database, rebuild),
        Commands::Embed => run_embed(&load(&config_path)?),
        Commands::Query {
            query,
            top_k,
            vector,
            json,
        } => {
            let config = load(&config_path)?;
            run_query(&config, &query, top_k.unwrap_or(config.top_k), vector, json)
        }
        Commands::Stats { json } => run_stats(&load(&config_path)?, json),
        Commands::Serve { port } => {
            let config = load(&config_path)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(dbcatalog::server::start_server(port, config))
        }
    }
}

/// Config file contents, or the built-in defaults when there is no file.
fn load(config_path: &Path) -> anyhow::Result<CatalogConfig> {
    Ok(config::load_config(Some(config_path))?.unwrap_or_default())
}

fn open_store(config: &CatalogConfig) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(&config.database)?;
    Ok(SqliteStore::open(&config.database)?)
}

fn run_init(config_path: &Path, force: bool) -> anyhow::Result<()> {
    let config = CatalogConfig::default();
    config::write_config(config_path, &config, force)?;

    let root = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let database = config::default_database_path_in(root);
    config::ensure_db_dir(&database)?;
    config::ensure_gitignore(root)?;

    ui::success(&format!("Wrote {}", config_path.display()));
    ui::info("Catalog", &database.display().to_string());
    ui::info("Dumps", &root.join(&config.data_dir).display().to_string());
    Ok(())
}

fn run_parse(file: &Path, dialect: Dialect, name: &str, markdown: bool, json: bool) -> anyhow::Result<()> {
    let tables = ddl::parse(file, dialect, name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }
    if markdown {
        for table in &tables {
            println!("{}", table.to_markdown());
        }
        return Ok(());
    }

    ui::header(&format!("{} ({})", file.display(), dialect.display_name()));
    let mut builder = TableBuilder::new();
    for table in &tables {
        builder.add_row(
            &table.name,
            &format!(
                "{} columns, {} foreign keys, {} indexes",
                table.columns.len(),
                table.foreign_keys.len(),
                table.indexes.len()
            ),
        );
    }
    println!("{}", builder.build());
    ui::summary_row("Tables:", &tables.len().to_string());
    ui::summary_row("Columns:", &tables.column_count().to_string());
    Ok(())
}

fn selected_databases(config: &CatalogConfig, names: &[String]) -> anyhow::Result<Vec<DatabaseMeta>> {
    if names.is_empty() {
        return Ok(config.databases.clone());
    }
    names
        .iter()
        .map(|name| {
            config
                .find_database(name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no database named {} in config", name))
        })
        .collect()
}

fn run_build(config: &CatalogConfig, names: &[String], rebuild: bool) -> anyhow::Result<()> {
    let databases = selected_databases(config, names)?;
    let taxonomy = config.taxonomy();
    let mut store = open_store(config)?;

    ui::header("Building catalog");
    for db in &databases {
        ui::info(&db.name, &resolve_source(db, &config.data_dir).display().to_string());
    }

    let start = Instant::now();
    let spinner = Spinner::new("Parsing dumps and writing entities...");

    if rebuild {
        store.clear_all()?;
    }
    store.begin_transaction()?;
    let report = build_catalog(&store, &taxonomy, &databases, &config.data_dir);
    store.commit()?;
    spinner.clear();

    for name in &report.skipped {
        ui::warn(&format!("Skipped {}: dump not readable", name));
    }
    for failure in &report.failures {
        ui::error(&format!(
            "{} / {}: {}",
            failure.database.as_deref().unwrap_or("global"),
            failure.step,
            failure.error
        ));
    }

    ui::progress::finish_with_summary(start.elapsed(), report.databases, report.tables, report.columns);
    ui::summary_row("New tags:", &report.tags.to_string());
    ui::summary_row("New foreign keys:", &report.foreign_keys.to_string());

    if !report.is_success() {
        anyhow::bail!("{} build step(s) failed", report.failures.len());
    }
    Ok(())
}

fn run_embed(config: &CatalogConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let pending = store.entities_without_embedding()?.len();
    if pending == 0 {
        ui::success("All entities already embedded");
        return Ok(());
    }

    ui::phase("Embedding entity descriptions");
    let spinner = Spinner::new("Loading embedding model...");
    let engine = EmbeddingEngine::new()?;
    spinner.clear();

    let start = Instant::now();
    let progress = BatchProgress::new(pending, "Embedding");
    let embedded = engine.index_pending(&store, |done, _| progress.set_position(done))?;
    progress.finish();

    ui::success(&format!("Embedded {} entities", embedded));
    ui::timing(&format!("{:.2?}", start.elapsed()));
    Ok(())
}

fn run_query(config: &CatalogConfig, query: &str, top_k: usize, vector: bool, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let mode = if vector { SearchMode::Vector } else { SearchMode::Text };

    let embeddings = if vector { Some(EmbeddingEngine::new()?) } else { None };
    let mut engine = QueryEngine::new(&store);
    if let Some(embeddings) = embeddings.as_ref() {
        engine = engine.with_embeddings(embeddings);
    }

    let chunks = engine.query(query, top_k, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    if chunks.is_empty() {
        ui::warn(&format!("No results for \"{}\"", query));
        return Ok(());
    }

    println!("{} {} ({} mode)", Icons::SEARCH, query.bold(), mode);
    for chunk in chunks.iter() {
        ui::chunk(&chunk.label, &chunk.entity, &chunk.content);
    }
    ui::summary_row("Chunks:", &chunks.total_chunks().to_string());
    Ok(())
}

fn run_stats(config: &CatalogConfig, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} dbcatalog Statistics ({})", Icons::STATS, config.database.display());
    let mut builder = TableBuilder::new();
    for (kind, count) in &stats.entities {
        builder.add_row(kind, &count.to_string());
    }
    for (kind, count) in &stats.relations {
        builder.add_row(kind, &count.to_string());
    }
    builder.add_row("embeddings", &stats.embeddings.to_string());
    println!("{}", builder.build());
    ui::summary_row("Entities:", &stats.total_entities().to_string());
    ui::summary_row("Relations:", &stats.total_relations().to_string());
    Ok(())
}
