use crate::catalog::{DatabaseMeta, Owner, TagDef, Taxonomy, default_databases, default_tags};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// SQLite catalog file
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
    /// Directory that relative dump paths resolve against
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default = "default_tags")]
    pub tags: Vec<TagDef>,
    #[serde(default = "default_databases")]
    pub databases: Vec<DatabaseMeta>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            data_dir: default_data_dir(),
            top_k: DEFAULT_TOP_K,
            owner: Owner::default(),
            tags: default_tags(),
            databases: default_databases(),
        }
    }
}

impl CatalogConfig {
    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy {
            owner: self.owner.clone(),
            tags: self.tags.clone(),
        }
    }

    pub fn find_database(&self, name: &str) -> Option<&DatabaseMeta> {
        self.databases.iter().find(|db| db.name == name)
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from(".dbcatalog").join("catalog.db")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("dbcatalog.toml")
}

/// Catalog database location next to a config file in `base`.
pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(default_database_path())
}

/// Load the config file, or `None` when it does not exist.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CatalogConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CatalogConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), databases = config.databases.len(), "Loaded config");
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &CatalogConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".dbcatalog/";

    let mut content = if gitignore_path.exists() {
        std::fs::read_to_string(&gitignore_path)?
    } else {
        String::new()
    };
    if content.lines().any(|line| line.trim() == entry) {
        return Ok(());
    }

    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
