//! Bundled extender that indexes compiled artifacts and provides `locklift artifacts`.
//!
//! The command only reads what a previous build produced, so the extender
//! opts out of the build step.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Arg, ArgAction, Command};
use serde_json::json;
use tracing::{debug, warn};

use locklift_core::constants::ABI_SUFFIX;
use locklift_core::{CommandBuilder, ExecutionContext, Extender, Initializer, Invocation, Runtime};

pub const EXTENDER_NAME: &str = "artifacts";

const ARG_JSON: &str = "json";

pub fn extender() -> Extender {
    Extender::new(EXTENDER_NAME)
        .skip_build()
        .with_initializer(ArtifactIndexer)
        .with_command(ArtifactsCommand)
}

/// Records every `*.abi.json` in the build directory on the runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArtifactIndexer;

#[async_trait]
impl Initializer for ArtifactIndexer {
    async fn initialize(&self, ctx: &ExecutionContext) -> Result<()> {
        let count = index_artifacts(&ctx.runtime).await?;
        debug!("indexed {} artifact(s) in {}", count, ctx.runtime.build_dir.display());
        Ok(())
    }
}

/// Scans the runtime's build directory and returns how many artifacts were found.
pub async fn index_artifacts(runtime: &Runtime) -> Result<usize> {
    let dir = &runtime.build_dir;
    let exists = tokio::fs::try_exists(dir)
        .await
        .with_context(|| format!("failed to access build dir '{}'", dir.display()))?;
    if !exists {
        warn!("build dir '{}' does not exist, no artifacts indexed", dir.display());
        return Ok(0);
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read build dir '{}'", dir.display()))?;
    let mut count = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed to read build dir '{}'", dir.display()))?
    {
        let path = entry.path();
        let Some(name) = contract_name(&path) else {
            continue;
        };
        runtime.register_artifact(name, path).await;
        count += 1;
    }
    Ok(count)
}

fn contract_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.strip_suffix(ABI_SUFFIX)?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Lists the artifacts recorded on the runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArtifactsCommand;

#[async_trait]
impl CommandBuilder for ArtifactsCommand {
    fn build(&self, base: Command) -> Command {
        base.name("artifacts")
            .about("List compiled contract artifacts")
            .arg(
                Arg::new(ARG_JSON)
                    .long(ARG_JSON)
                    .action(ArgAction::SetTrue)
                    .help("Output machine-readable JSON"),
            )
    }

    async fn run(&self, invocation: &Invocation) -> Result<()> {
        let output = render(&invocation.runtime, invocation.matches.get_flag(ARG_JSON)).await?;
        println!("{output}");
        Ok(())
    }
}

async fn render(runtime: &Runtime, as_json: bool) -> Result<String> {
    let artifacts = runtime.artifacts().await;
    if as_json {
        let items = artifacts
            .iter()
            .map(|(name, path)| json!({ "name": name, "abi": path.display().to_string() }))
            .collect::<Vec<_>>();
        let body = json!({ "network": runtime.network, "artifacts": items });
        return Ok(serde_json::to_string_pretty(&body)?);
    }

    if artifacts.is_empty() {
        return Ok(format!("no artifacts in {}", runtime.build_dir.display()));
    }
    Ok(artifacts
        .iter()
        .map(|(name, path)| format!("{name}\t{}", path.display()))
        .collect::<Vec<_>>()
        .join("\n"))
}
