//! Runner configuration.
//!
//! Settings come from an optional TOML file and from `AIFLOW_`-prefixed
//! environment variables, with `__` separating nested keys
//! (`AIFLOW_STORE__KIND=http`). Environment values win over the file.

use aiflow_workflow::DEFAULT_HISTORY_LIMIT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level runner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Where workflows are stored.
    #[serde(default)]
    pub store: StoreConfig,

    /// How modules are executed.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Undo snapshots kept by the editor.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// JSON module catalog to use instead of the built-in one.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,

    /// Directory for the file store.
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,

    /// Base URL of the workflow service, for the http store.
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Simulated,
    Echo,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Base URL of the module server, for the http backend.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Artificial latency of the simulated backend, in milliseconds.
    #[serde(default = "default_simulated_delay_ms")]
    pub simulated_delay_ms: u64,
}

impl BackendConfig {
    #[must_use]
    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./workflows")
}

fn default_simulated_delay_ms() -> u64 {
    500
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            dir: default_store_dir(),
            base_url: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: None,
            simulated_delay_ms: default_simulated_delay_ms(),
        }
    }
}

impl RunnerConfig {
    /// Loads configuration from `file` (if given) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or a value has the wrong type.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix("AIFLOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
