use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::ConfigRef;
use crate::constants::{CONFIG_FILE, DEFAULT_BUILD_DIR, DEFAULT_CONTRACTS_DIR};
use crate::error::LoaderError;

pub const ARG_CONTRACTS: &str = "contracts";
pub const ARG_BUILD: &str = "build";
pub const ARG_DISABLE_INCLUDE_PATH: &str = "disable-include-path";
pub const ARG_NETWORK: &str = "network";
pub const ARG_CONFIG: &str = "config";
pub const ARG_SCRIPT: &str = "script";

/// Attaches the options every injected command accepts.
pub fn with_standard_options(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CONTRACTS)
                .short('c')
                .long(ARG_CONTRACTS)
                .value_name("contracts")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_CONTRACTS_DIR)
                .help("Path to the contracts folder"),
        )
        .arg(
            Arg::new(ARG_BUILD)
                .short('b')
                .long(ARG_BUILD)
                .value_name("build")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_BUILD_DIR)
                .help("Path to the build folder"),
        )
        .arg(
            Arg::new(ARG_DISABLE_INCLUDE_PATH)
                .long(ARG_DISABLE_INCLUDE_PATH)
                .action(ArgAction::SetTrue)
                .help("Disables including node_modules. Use this with old compiler versions"),
        )
        .arg(
            Arg::new(ARG_NETWORK)
                .short('n')
                .long(ARG_NETWORK)
                .value_name("network")
                .required(true)
                .help("Network to use, choose from configuration"),
        )
        .arg(
            Arg::new(ARG_CONFIG)
                .long(ARG_CONFIG)
                .value_name("config")
                .value_parser(|raw: &str| -> Result<ConfigRef, String> { Ok(ConfigRef::new(raw)) })
                .default_value(CONFIG_FILE)
                .help("Path to the config file"),
        )
        .arg(
            Arg::new(ARG_SCRIPT)
                .short('s')
                .long(ARG_SCRIPT)
                .value_name("script")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Script to run"),
        )
}

/// Parsed values of the standard options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOptions {
    pub contracts: PathBuf,
    pub build: PathBuf,
    pub disable_include_path: bool,
    pub network: String,
    pub config: ConfigRef,
    pub script: Option<PathBuf>,
}

impl CommandOptions {
    /// Reads the standard options out of a subcommand's matches.
    ///
    /// # Errors
    /// Returns [`LoaderError::MissingOption`] when `--network` is absent,
    /// which only happens if the matches did not come from a command built
    /// with [`with_standard_options`].
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, LoaderError> {
        let network = matches
            .get_one::<String>(ARG_NETWORK)
            .cloned()
            .ok_or(LoaderError::MissingOption(ARG_NETWORK))?;

        Ok(Self {
            contracts: matches
                .get_one::<PathBuf>(ARG_CONTRACTS)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTRACTS_DIR)),
            build: matches
                .get_one::<PathBuf>(ARG_BUILD)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR)),
            disable_include_path: matches.get_flag(ARG_DISABLE_INCLUDE_PATH),
            network,
            config: matches
                .get_one::<ConfigRef>(ARG_CONFIG)
                .cloned()
                .unwrap_or_default(),
            script: matches.get_one::<PathBuf>(ARG_SCRIPT).cloned(),
        })
    }
}
