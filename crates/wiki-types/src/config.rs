//! Configuration loading for wiki-sync.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/wiki-sync/config.toml.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::WikiError;

/// Which search engine the reconciliation loop publishes to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// Embedded Tantivy index on local disk (default)
    #[default]
    Tantivy,
    /// Remote Meilisearch instance over HTTP
    Meilisearch,
}

/// Search engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub backend: SearchBackend,

    /// Directory holding one Tantivy index per collection
    #[serde(default = "default_search_index_path")]
    pub index_path: String,

    /// Meilisearch base URL
    #[serde(default = "default_meili_host")]
    pub meili_host: String,

    /// Meilisearch API key (set through WIKI_SEARCH__MEILI_API_KEY, not the config file)
    #[serde(default)]
    pub meili_api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per batch push before the push is reported as failed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_search_index_path() -> String {
    ProjectDirs::from("", "", "wiki-sync")
        .map(|p| p.data_local_dir().join("search-index"))
        .unwrap_or_else(|| PathBuf::from("./search-index"))
        .to_string_lossy()
        .to_string()
}

fn default_meili_host() -> String {
    "http://localhost:7700".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            backend: SearchBackend::default(),
            index_path: default_search_index_path(),
            meili_host: default_meili_host(),
            meili_api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Backlink worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacklinkSettings {
    /// Concurrent tasks per backlink pass
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
}

fn default_worker_count() -> usize {
    4
}

impl Default for BacklinkSettings {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
        }
    }
}

/// Reconciliation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSettings {
    /// Records fetched per FETCH round
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    1000
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB storage directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub backlinks: BacklinkSettings,

    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "wiki-sync")
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            search: SearchSettings::default(),
            backlinks: BacklinkSettings::default(),
            reconcile: ReconcileSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/wiki-sync/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (WIKI_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, WikiError> {
        let config_dir = ProjectDirs::from("", "", "wiki-sync")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| WikiError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| WikiError::Config(e.to_string()))?
            .set_default("search.index_path", default_search_index_path())
            .map_err(|e| WikiError::Config(e.to_string()))?
            .set_default("search.meili_host", default_meili_host())
            .map_err(|e| WikiError::Config(e.to_string()))?
            .set_default("backlinks.worker_count", default_worker_count() as i64)
            .map_err(|e| WikiError::Config(e.to_string()))?
            .set_default("reconcile.batch_size", default_batch_size() as i64)
            .map_err(|e| WikiError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // WIKI_DB_PATH, WIKI_SEARCH__BACKEND, WIKI_RECONCILE__BATCH_SIZE, ...
        builder = builder.add_source(
            Environment::with_prefix("WIKI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| WikiError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| WikiError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), WikiError> {
        if self.backlinks.worker_count == 0 {
            return Err(WikiError::Config(
                "backlinks.worker_count must be > 0".to_string(),
            ));
        }
        if self.reconcile.batch_size == 0 {
            return Err(WikiError::Config(
                "reconcile.batch_size must be > 0".to_string(),
            ));
        }
        if self.search.backend == SearchBackend::Meilisearch
            && self.search.meili_host.trim().is_empty()
        {
            return Err(WikiError::Config(
                "search.meili_host is required for the meilisearch backend".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// Expand ~ in search.index_path to the home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        expand_home(&self.search.index_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
