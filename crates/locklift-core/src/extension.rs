use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::{ArgMatches, Command};
use tracing::debug;

use crate::config::LockliftConfig;
use crate::options::CommandOptions;
use crate::runtime::{ExecutionContext, Runtime};

pub mod injector;
pub mod orchestrator;

/// Prepares shared runtime state before a command action runs.
///
/// Initializers from different extenders run concurrently against the same
/// [`ExecutionContext`] and must not rely on each other having run.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn initialize(&self, ctx: &ExecutionContext) -> Result<()>;
}

/// Contributes one subcommand to the command tree.
#[async_trait]
pub trait CommandBuilder: Send + Sync {
    /// Turns the base command, which already carries the standard options,
    /// into the finished subcommand. Implementations are expected to set the
    /// command name.
    fn build(&self, base: Command) -> Command;

    /// The command's action. Runs after the pre-execution hook has bound a
    /// runtime to `invocation`.
    async fn run(&self, invocation: &Invocation) -> Result<()>;
}

/// Standard hook steps an extender opts out of.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SkipSteps {
    pub build: bool,
}

/// A plugin-supplied bundle of an optional initializer and command builders.
///
/// Both capabilities are optional; an extender with neither is accepted and
/// simply does nothing.
pub struct Extender {
    name: String,
    initializer: Option<Arc<dyn Initializer>>,
    command_builders: Vec<Arc<dyn CommandBuilder>>,
    skip_steps: SkipSteps,
}

impl Extender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initializer: None,
            command_builders: Vec::new(),
            skip_steps: SkipSteps::default(),
        }
    }

    pub fn with_initializer(mut self, initializer: impl Initializer + 'static) -> Self {
        self.initializer = Some(Arc::new(initializer));
        self
    }

    /// Appends a command builder. Builders are injected in the order added.
    pub fn with_command(mut self, builder: impl CommandBuilder + 'static) -> Self {
        self.command_builders.push(Arc::new(builder));
        self
    }

    pub fn with_skip_steps(mut self, skip_steps: SkipSteps) -> Self {
        self.skip_steps = skip_steps;
        self
    }

    pub fn skip_build(self) -> Self {
        self.with_skip_steps(SkipSteps { build: true })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initializer(&self) -> Option<&Arc<dyn Initializer>> {
        self.initializer.as_ref()
    }

    pub fn command_builders(&self) -> &[Arc<dyn CommandBuilder>] {
        &self.command_builders
    }

    pub fn skip_steps(&self) -> SkipSteps {
        self.skip_steps
    }
}

impl fmt::Debug for Extender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extender")
            .field("name", &self.name)
            .field("initializer", &self.initializer.is_some())
            .field("command_builders", &self.command_builders.len())
            .field("skip_steps", &self.skip_steps)
            .finish()
    }
}

/// Everything an injected command's action gets to see.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub options: CommandOptions,
    pub matches: ArgMatches,
    pub config: Arc<LockliftConfig>,
    pub runtime: Arc<Runtime>,
}

impl Invocation {
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(Arc::clone(&self.runtime), Arc::clone(&self.config))
    }
}

/// The extenders registered for this process, in registration order.
///
/// Filled before the CLI starts and only read afterwards.
#[derive(Debug, Default)]
pub struct ExtenderRegistry {
    extenders: Vec<Extender>,
}

impl ExtenderRegistry {
    /// Registers a new extender into the registry.
    pub fn register(&mut self, extender: Extender) {
        debug!(
            "registering extender '{}' (initializer: {}, commands: {})",
            extender.name,
            extender.initializer.is_some(),
            extender.command_builders.len()
        );
        self.extenders.push(extender);
    }

    pub fn len(&self) -> usize {
        self.extenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extenders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extender> {
        self.extenders.iter()
    }

    /// Extenders that carry an initializer, with their names.
    pub fn initializers(&self) -> impl Iterator<Item = (&str, &Arc<dyn Initializer>)> {
        self.extenders
            .iter()
            .filter_map(|ext| ext.initializer().map(|init| (ext.name(), init)))
    }

    /// Extenders that contribute at least one command.
    pub fn command_extenders(&self) -> impl Iterator<Item = &Extender> {
        self.extenders
            .iter()
            .filter(|ext| !ext.command_builders.is_empty())
    }
}
