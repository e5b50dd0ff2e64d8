use std::ffi::OsString;

use anyhow::Result;
use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};

use locklift_core::constants::{CONFIG_FILE, DEFAULT_CONTRACTS_DIR};
use locklift_core::{inject_commands, ExtenderRegistry, LoaderError, Steps};
use tracing::debug;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

mod init;
mod styles;

use styles as s;

/// The command-line interface for Locklift.
#[derive(Debug, Parser)]
#[command(name = "locklift")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(about = "Development and testing framework for smart contracts")]
#[command(
    long_about = "Locklift compiles contracts, connects to a configured network and runs
commands against it. Plugins contribute their own commands; every plugin
command accepts the same project options (--network, --config, --build, ...).

Bundled Commands:
  init              Create locklift.toml and the contracts folder
  run               Run a script against the selected network
  artifacts         List compiled contract artifacts
"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Option<BuiltinCommand>,
}

#[derive(Debug, Subcommand)]
enum BuiltinCommand {
    /// Initialize a new locklift.toml in the current directory
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub(crate) struct InitArgs {
    /// Path of the config file to create.
    #[arg(long, default_value = CONFIG_FILE)]
    config: String,
    /// Contracts folder to create.
    #[arg(long, default_value = DEFAULT_CONTRACTS_DIR)]
    contracts: String,
    /// Overwrite the config file if it already exists.
    #[arg(long, default_value_t = false)]
    force: bool,
}

/// Extenders shipped with the binary.
fn bundled_extenders() -> ExtenderRegistry {
    let mut registry = ExtenderRegistry::default();
    registry.register(locklift_ext_script::extender());
    registry.register(locklift_ext_artifacts::extender());
    registry
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    match run(std::env::args_os(), &bundled_extenders(), &Steps::default()).await {
        Err(err) if is_fatal(&err) => {
            eprintln!("{}{}{}", s::ERROR.render(), err, s::ERROR.render_reset());
            std::process::exit(1);
        }
        other => other,
    }
}

fn is_fatal(err: &anyhow::Error) -> bool {
    err.downcast_ref::<LoaderError>()
        .is_some_and(LoaderError::is_fatal_precondition)
}

async fn run<I, T>(args: I, registry: &ExtenderRegistry, steps: &Steps) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let (mut root, injected) = inject_commands(Cli::command(), registry);
    debug!("command tree ready with {} injected command(s)", injected.len());

    let matches = root.clone().get_matches_from(args);
    if injected.dispatch(&matches, steps, registry).await? {
        return Ok(());
    }

    let cli = Cli::from_arg_matches(&matches)?;
    debug!("parsed cli arguments: {:?}", cli);
    match &cli.command {
        Some(BuiltinCommand::Init(args)) => init::run(args),
        None => {
            root.print_help()?;
            println!(); // Add a newline after help
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locklift_core::Extender;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn bundled_extenders_contribute_commands() {
        let registry = bundled_extenders();
        let (root, injected) = inject_commands(Cli::command(), &registry);
        assert_eq!(injected.names().collect::<Vec<_>>(), vec!["run", "artifacts"]);
        assert!(root.find_subcommand("init").is_some());
        assert!(injected.find("artifacts").unwrap().skip_steps().build);
        assert!(!injected.find("run").unwrap().skip_steps().build);
    }

    #[test]
    fn cli_definition_is_consistent() {
        let (root, _) = inject_commands(Cli::command(), &bundled_extenders());
        root.debug_assert();
    }

    #[tokio::test]
    async fn builtin_init_runs_without_extenders() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("locklift.toml");
        let contracts = dir.path().join("contracts");
        let mut registry = ExtenderRegistry::default();
        registry.register(Extender::new("inert"));

        run(
            [
                "locklift".into(),
                OsString::from("init"),
                "--config".into(),
                config.clone().into_os_string(),
                "--contracts".into(),
                contracts.clone().into_os_string(),
            ],
            &registry,
            &Steps::default(),
        )
        .await
        .expect("init should succeed");

        assert!(fs::read_to_string(config).unwrap().contains("[networks.local]"));
        assert!(contracts.is_dir());
    }

    #[test]
    fn only_loader_preconditions_are_fatal() {
        assert!(is_fatal(&LoaderError::UnknownNetwork("testnet".to_string()).into()));
        assert!(!is_fatal(&anyhow::anyhow!("compilation failed")));
    }
}
