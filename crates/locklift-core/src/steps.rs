//! Preparatory steps run by an injected command's hook before its action.

use std::ffi::OsString;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::config::{ConfigLoader, LockliftConfig, TomlConfigLoader};
use crate::error::LoaderError;
use crate::options::CommandOptions;
use crate::runtime::Runtime;

/// Compiles contract sources into the build directory.
#[async_trait]
pub trait BuildStep: Send + Sync {
    async fn build(&self, config: &LockliftConfig, options: &CommandOptions) -> Result<()>;
}

/// Establishes a session with the selected network.
#[async_trait]
pub trait RuntimeInitStep: Send + Sync {
    async fn init(&self, config: &LockliftConfig, options: &CommandOptions) -> Result<Runtime>;
}

/// Runs the configured compiler executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompilerBuildStep;

impl CompilerBuildStep {
    fn argv(config: &LockliftConfig, options: &CommandOptions) -> Vec<OsString> {
        let mut argv: Vec<OsString> = config.compiler.args.iter().map(OsString::from).collect();
        argv.push(options.contracts.clone().into_os_string());
        argv.push("--output-dir".into());
        argv.push(options.build.clone().into_os_string());
        if !options.disable_include_path {
            argv.push("--include-path".into());
            argv.push(config.compiler.include_path.clone().into_os_string());
        }
        argv
    }
}

#[async_trait]
impl BuildStep for CompilerBuildStep {
    #[instrument(skip_all, fields(contracts = %options.contracts.display()))]
    async fn build(&self, config: &LockliftConfig, options: &CommandOptions) -> Result<()> {
        tokio::fs::create_dir_all(&options.build)
            .await
            .with_context(|| format!("failed to create build dir '{}'", options.build.display()))?;

        let program = &config.compiler.program;
        let args = Self::argv(config, options);
        debug!("spawning compiler {} {:?}", program, args);

        let status = Command::new(program)
            .args(&args)
            .status()
            .await
            .with_context(|| format!("failed to start compiler '{program}'"))?;

        if !status.success() {
            return Err(LoaderError::CompilerFailed {
                program: program.clone(),
                status,
            }
            .into());
        }

        info!(target: "locklift",
            "built {} into {}",
            options.contracts.display(),
            options.build.display()
        );
        Ok(())
    }
}

/// Builds a [`Runtime`] from the network's configuration entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionInitStep;

#[async_trait]
impl RuntimeInitStep for SessionInitStep {
    #[instrument(skip_all, fields(network = %options.network))]
    async fn init(&self, config: &LockliftConfig, options: &CommandOptions) -> Result<Runtime> {
        let connection = config
            .network(&options.network)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownNetwork(options.network.clone()))?;

        info!(target: "locklift", "connected to {} at {}", options.network, connection.endpoint);
        Ok(Runtime::new(
            options.network.clone(),
            connection,
            options.contracts.clone(),
            options.build.clone(),
        ))
    }
}

/// The collaborators an injected command's hook calls into.
#[derive(Clone)]
pub struct Steps {
    pub loader: Arc<dyn ConfigLoader>,
    pub build: Arc<dyn BuildStep>,
    pub runtime: Arc<dyn RuntimeInitStep>,
}

impl Default for Steps {
    fn default() -> Self {
        Self {
            loader: Arc::new(TomlConfigLoader),
            build: Arc::new(CompilerBuildStep),
            runtime: Arc::new(SessionInitStep),
        }
    }
}

impl std::fmt::Debug for Steps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Steps").finish_non_exhaustive()
    }
}
