//! Core logic and abstractions for Locklift's extension loader.
//!
//! This crate defines the extender model and registry, the concurrent
//! initializer orchestrator, the command injector with its pre-execution
//! hook, and the configuration, build and runtime-init collaborators those
//! pieces call into.

pub mod config;
pub mod constants;
pub mod error;
pub mod extension;
pub mod options;
pub mod runtime;
pub mod steps;

pub use config::{ConfigLoader, ConfigRef, LockliftConfig, NetworkConfig, TomlConfigLoader};
pub use error::LoaderError;
pub use extension::injector::{inject_commands, InjectedCommand, InjectedCommands};
pub use extension::orchestrator::initialize_extenders;
pub use extension::{CommandBuilder, Extender, ExtenderRegistry, Initializer, Invocation, SkipSteps};
pub use options::CommandOptions;
pub use runtime::{ExecutionContext, Runtime};
pub use steps::{BuildStep, CompilerBuildStep, RuntimeInitStep, SessionInitStep, Steps};
