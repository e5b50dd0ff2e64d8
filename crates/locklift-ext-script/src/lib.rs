//! Bundled extender providing `locklift run`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Arg, Command};
use tokio::process::Command as Process;
use tracing::{info, instrument};

use locklift_core::options::ARG_SCRIPT;
use locklift_core::{CommandBuilder, Extender, Invocation, LoaderError, Runtime};

pub const EXTENDER_NAME: &str = "script";

const ARG_SCRIPT_ARGS: &str = "script-args";

pub fn extender() -> Extender {
    Extender::new(EXTENDER_NAME).with_command(RunCommand)
}

/// Executes a user script with the initialized runtime described in its environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunCommand;

#[async_trait]
impl CommandBuilder for RunCommand {
    fn build(&self, base: Command) -> Command {
        base.name("run")
            .about("Run a script against the selected network")
            .arg(
                Arg::new(ARG_SCRIPT_ARGS)
                    .num_args(1..)
                    .last(true)
                    .help("Arguments passed through to the script"),
            )
    }

    #[instrument(skip_all, fields(network = %invocation.runtime.network))]
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        let script = invocation
            .options
            .script
            .as_ref()
            .ok_or(LoaderError::MissingOption(ARG_SCRIPT))?;
        let args = invocation
            .matches
            .get_many::<String>(ARG_SCRIPT_ARGS)
            .map(|values| values.cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        let program = script_path(script)?;
        info!(target: "locklift", "run {}", program.display());
        let status = Process::new(&program)
            .args(&args)
            .envs(script_env(&invocation.runtime))
            .status()
            .await
            .with_context(|| format!("failed to start script '{}'", script.display()))?;

        if !status.success() {
            bail!("script '{}' failed with status {}", script.display(), status);
        }
        Ok(())
    }
}

/// Resolves `script` against the working directory so bare file names are not looked up on `PATH`.
pub fn script_path(script: &Path) -> Result<PathBuf> {
    if script.is_absolute() {
        return Ok(script.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    Ok(cwd.join(script))
}

/// Environment handed to scripts so they can reach the runtime's network.
pub fn script_env(runtime: &Runtime) -> Vec<(&'static str, OsString)> {
    let mut env = vec![
        ("LOCKLIFT_NETWORK", OsString::from(&runtime.network)),
        ("LOCKLIFT_ENDPOINT", OsString::from(&runtime.connection.endpoint)),
        ("LOCKLIFT_BUILD_DIR", runtime.build_dir.clone().into_os_string()),
        ("LOCKLIFT_CONTRACTS_DIR", runtime.contracts_dir.clone().into_os_string()),
    ];
    if let Some(giver) = &runtime.connection.giver {
        env.push(("LOCKLIFT_GIVER", OsString::from(giver)));
    }
    env
}
