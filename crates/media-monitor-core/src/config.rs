use crate::error::Error;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_WATCH_DIR: &str = "./WATCH_DIR";
pub const DEFAULT_CATALOG_PATH: &str = "catalog.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ordered watch list; the first entry is the watch root.
    pub watch_paths: Vec<String>,
    pub catalog_path: String,
    /// Classify and log events without applying them.
    pub dry_run: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watch_paths: vec![DEFAULT_WATCH_DIR.to_string()],
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            dry_run: false,
        }
    }
}

impl AppConfig {
    pub fn watch_root(&self) -> Result<PathBuf, Error> {
        self.watch_paths
            .first()
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::NotFound("watch_paths[0]".to_string()).into())
    }

    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog_path)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        debug!("Configuration written to {}", path.display());
        Ok(())
    }
}

fn builder_with_defaults() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    let defaults = AppConfig::default();
    Config::builder()
        .set_default("watch_paths", defaults.watch_paths)?
        .set_default("catalog_path", defaults.catalog_path)?
        .set_default("dry_run", defaults.dry_run)
}

/// Defaults, then an optional `Config.*` file, then `MEDIA_MONITOR_*` env vars.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    builder_with_defaults()?
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("MEDIA_MONITOR"))
        .build()?
        .try_deserialize::<AppConfig>()
}

/// Defaults overlaid with one explicit file, which may be missing.
pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    builder_with_defaults()?
        .add_source(ConfigFile::from(path).required(false))
        .build()?
        .try_deserialize::<AppConfig>()
}
