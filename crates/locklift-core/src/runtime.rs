use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::{LockliftConfig, NetworkConfig};

/// A session bound to one configured network.
///
/// Produced by the runtime-init step and handed to command actions and
/// initializers. The artifact index is shared: initializers may add to it
/// concurrently, so it sits behind a lock.
#[derive(Debug)]
pub struct Runtime {
    pub network: String,
    pub connection: NetworkConfig,
    pub contracts_dir: PathBuf,
    pub build_dir: PathBuf,
    artifacts: RwLock<BTreeMap<String, PathBuf>>,
}

impl Runtime {
    pub fn new(
        network: impl Into<String>,
        connection: NetworkConfig,
        contracts_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            network: network.into(),
            connection,
            contracts_dir: contracts_dir.into(),
            build_dir: build_dir.into(),
            artifacts: RwLock::new(BTreeMap::new()),
        }
    }

    /// Records a compiled contract artifact under `name`.
    ///
    /// Returns the previously recorded path if one existed.
    pub async fn register_artifact(
        &self,
        name: impl Into<String>,
        path: PathBuf,
    ) -> Option<PathBuf> {
        self.artifacts.write().await.insert(name.into(), path)
    }

    pub async fn artifact(&self, name: &str) -> Option<PathBuf> {
        self.artifacts.read().await.get(name).cloned()
    }

    /// Snapshot of all recorded artifacts, sorted by name.
    pub async fn artifacts(&self) -> Vec<(String, PathBuf)> {
        self.artifacts
            .read()
            .await
            .iter()
            .map(|(name, path)| (name.clone(), path.clone()))
            .collect()
    }
}

/// State shared with every extender initializer during one invocation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub runtime: Arc<Runtime>,
    pub config: Arc<LockliftConfig>,
    pub network: String,
}

impl ExecutionContext {
    pub fn new(runtime: Arc<Runtime>, config: Arc<LockliftConfig>) -> Self {
        let network = runtime.network.clone();
        Self {
            runtime,
            config,
            network,
        }
    }
}
