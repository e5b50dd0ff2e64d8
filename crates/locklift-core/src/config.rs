use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::constants::{CONFIG_FILE, DEFAULT_COMPILER, DEFAULT_INCLUDE_PATH};

#[derive(Debug, Clone, Deserialize)]
pub struct LockliftConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,
}

impl LockliftConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str::<Self>(text)?)
    }

    /// Looks up the connection settings for `network`.
    pub fn network(&self, network: &str) -> Option<&NetworkConfig> {
        self.networks.get(network)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompilerConfig {
    #[serde(default = "default_compiler")]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_include_path")]
    pub include_path: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_compiler(),
            args: Vec::new(),
            include_path: default_include_path(),
        }
    }
}

fn default_compiler() -> String {
    DEFAULT_COMPILER.to_string()
}

fn default_include_path() -> PathBuf {
    PathBuf::from(DEFAULT_INCLUDE_PATH)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    pub endpoint: String,
    pub giver: Option<String>,
}

/// Loads a resolved configuration from a path.
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<LockliftConfig>;
}

/// Reads `locklift.toml`-style files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlConfigLoader;

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    #[instrument(skip(self))]
    async fn load(&self, path: &Path) -> Result<LockliftConfig> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let cfg = LockliftConfig::from_toml(&text)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))?;
        debug!("loaded config with {} network(s)", cfg.networks.len());
        Ok(cfg)
    }
}

/// An unresolved reference to a configuration file.
///
/// Parsing arguments only records the path. The file is read when a command
/// hook calls [`ConfigRef::resolve`], so commands that never run never touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRef {
    path: PathBuf,
}

impl ConfigRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn resolve(&self, loader: &dyn ConfigLoader) -> Result<LockliftConfig> {
        loader.load(&self.path).await
    }
}

impl Default for ConfigRef {
    fn default() -> Self {
        Self::new(CONFIG_FILE)
    }
}
