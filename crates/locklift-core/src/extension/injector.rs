use std::sync::Arc;

use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::{debug, info, instrument, warn};

use crate::error::LoaderError;
use crate::extension::orchestrator::initialize_extenders;
use crate::extension::{CommandBuilder, ExtenderRegistry, Invocation, SkipSteps};
use crate::options::{with_standard_options, CommandOptions};
use crate::steps::Steps;

/// A subcommand contributed by an extender, with the hook settings it was
/// injected under.
pub struct InjectedCommand {
    name: String,
    extender: String,
    skip_steps: SkipSteps,
    builder: Arc<dyn CommandBuilder>,
}

impl InjectedCommand {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extender(&self) -> &str {
        &self.extender
    }

    pub fn skip_steps(&self) -> SkipSteps {
        self.skip_steps
    }

    /// The pre-execution hook.
    ///
    /// Loads the configuration, checks the selected network, builds unless
    /// the extender opted out, then initializes the runtime. Each step
    /// finishes before the next begins.
    ///
    /// # Errors
    /// [`LoaderError::UnknownNetwork`] when the network is not configured;
    /// nothing past the config load runs in that case. Build and runtime-init
    /// failures are returned unchanged.
    #[instrument(skip_all, fields(command = %self.name))]
    pub async fn prepare(&self, matches: &ArgMatches, steps: &Steps) -> Result<Invocation> {
        let options = CommandOptions::from_matches(matches)?;
        let config = options.config.resolve(steps.loader.as_ref()).await?;

        if config.network(&options.network).is_none() {
            return Err(LoaderError::UnknownNetwork(options.network).into());
        }

        if self.skip_steps.build {
            debug!("build step skipped by extender '{}'", self.extender);
        } else {
            steps.build.build(&config, &options).await?;
        }

        let runtime = steps.runtime.init(&config, &options).await?;

        Ok(Invocation {
            options,
            matches: matches.clone(),
            config: Arc::new(config),
            runtime: Arc::new(runtime),
        })
    }
}

impl std::fmt::Debug for InjectedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectedCommand")
            .field("name", &self.name)
            .field("extender", &self.extender)
            .field("skip_steps", &self.skip_steps)
            .finish_non_exhaustive()
    }
}

/// The commands added to the root by [`inject_commands`].
#[derive(Debug, Default)]
pub struct InjectedCommands {
    commands: Vec<InjectedCommand>,
}

impl InjectedCommands {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn find(&self, name: &str) -> Option<&InjectedCommand> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|cmd| cmd.name.as_str())
    }

    /// Runs the selected subcommand if an extender contributed it.
    ///
    /// Order: pre-execution hook, then every extender initializer against the
    /// fresh runtime, then the command's action. Returns `Ok(false)` without
    /// side effects when the selected subcommand is not an injected one.
    pub async fn dispatch(
        &self,
        matches: &ArgMatches,
        steps: &Steps,
        registry: &ExtenderRegistry,
    ) -> Result<bool> {
        let Some((name, sub_matches)) = matches.subcommand() else {
            return Ok(false);
        };
        let Some(command) = self.find(name) else {
            return Ok(false);
        };

        let invocation = command.prepare(sub_matches, steps).await?;
        initialize_extenders(&invocation.context(), registry).await?;

        info!(target: "locklift", "running {} on {}", command.name, invocation.options.network);
        command.builder.run(&invocation).await?;
        Ok(true)
    }
}

/// Adds every extender-provided command to `root`.
///
/// Each builder receives a fresh command carrying the standard options.
/// A command whose name is already taken in `root` is skipped with a
/// warning; the earlier registration wins.
pub fn inject_commands(root: Command, registry: &ExtenderRegistry) -> (Command, InjectedCommands) {
    let mut injected = InjectedCommands::default();
    if registry.is_empty() {
        return (root, injected);
    }

    let mut root = root;
    for extender in registry.command_extenders() {
        for (index, builder) in extender.command_builders().iter().enumerate() {
            let placeholder = format!("{}-{}", extender.name(), index);
            let base = with_standard_options(Command::new(placeholder));
            let command = builder.build(base);
            let name = command.get_name().to_string();

            if root.find_subcommand(&name).is_some() {
                warn!(
                    "command '{}' from extender '{}' conflicts with an existing command, skipping",
                    name,
                    extender.name()
                );
                continue;
            }

            debug!("injecting command '{}' from extender '{}'", name, extender.name());
            root = root.subcommand(command);
            injected.commands.push(InjectedCommand {
                name,
                extender: extender.name().to_string(),
                skip_steps: extender.skip_steps(),
                builder: Arc::clone(builder),
            });
        }
    }

    (root, injected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigLoader, LockliftConfig};
    use crate::extension::{Extender, Initializer};
    use crate::runtime::{ExecutionContext, Runtime};
    use crate::steps::{BuildStep, RuntimeInitStep};
    use async_trait::async_trait;
    use clap::Arg;
    use std::path::Path;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct FakeLoader(Log);

    #[async_trait]
    impl ConfigLoader for FakeLoader {
        async fn load(&self, path: &Path) -> Result<LockliftConfig> {
            self.0.lock().unwrap().push(format!("load:{}", path.display()));
            LockliftConfig::from_toml(
                r#"
                [networks.mainnet]
                endpoint = "https://mainnet.evercloud.dev"
                "#,
            )
        }
    }

    struct FakeBuild(Log);

    #[async_trait]
    impl BuildStep for FakeBuild {
        async fn build(&self, _config: &LockliftConfig, options: &CommandOptions) -> Result<()> {
            self.0.lock().unwrap().push(format!("build:{}", options.build.display()));
            Ok(())
        }
    }

    struct FakeRuntime(Log);

    #[async_trait]
    impl RuntimeInitStep for FakeRuntime {
        async fn init(&self, config: &LockliftConfig, options: &CommandOptions) -> Result<Runtime> {
            self.0.lock().unwrap().push("runtime".to_string());
            let connection = config
                .network(&options.network)
                .cloned()
                .ok_or_else(|| LoaderError::UnknownNetwork(options.network.clone()))?;
            Ok(Runtime::new(
                options.network.clone(),
                connection,
                options.contracts.clone(),
                options.build.clone(),
            ))
        }
    }

    struct BrokenBuild;

    #[async_trait]
    impl BuildStep for BrokenBuild {
        async fn build(&self, _config: &LockliftConfig, _options: &CommandOptions) -> Result<()> {
            anyhow::bail!("compilation failed")
        }
    }

    struct RecordingCommand {
        name: &'static str,
        log: Log,
    }

    #[async_trait]
    impl CommandBuilder for RecordingCommand {
        fn build(&self, base: Command) -> Command {
            base.name(self.name)
                .about("test command")
                .arg(Arg::new("verbose").long("verbose").action(clap::ArgAction::SetTrue))
        }

        async fn run(&self, invocation: &Invocation) -> Result<()> {
            self.log.lock().unwrap().push(format!(
                "run:{}:{}:{}",
                self.name,
                invocation.runtime.network,
                invocation.matches.get_flag("verbose")
            ));
            Ok(())
        }
    }

    struct RecordingInit(Log);

    #[async_trait]
    impl Initializer for RecordingInit {
        async fn initialize(&self, ctx: &ExecutionContext) -> Result<()> {
            self.0.lock().unwrap().push(format!("init:{}", ctx.network));
            Ok(())
        }
    }

    fn steps(log: &Log) -> Steps {
        Steps {
            loader: Arc::new(FakeLoader(log.clone())),
            build: Arc::new(FakeBuild(log.clone())),
            runtime: Arc::new(FakeRuntime(log.clone())),
        }
    }

    fn root() -> Command {
        Command::new("locklift").subcommand(Command::new("init"))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn registry_with(log: &Log, extender: Extender) -> ExtenderRegistry {
        let mut registry = ExtenderRegistry::default();
        registry.register(extender.with_command(RecordingCommand {
            name: "run",
            log: log.clone(),
        }));
        registry
    }

    #[test]
    fn empty_registry_leaves_root_untouched() {
        let registry = ExtenderRegistry::default();
        let (cmd, injected) = inject_commands(root(), &registry);
        assert!(injected.is_empty());
        let names = cmd.get_subcommands().map(|c| c.get_name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["init"]);
    }

    #[test]
    fn injects_builders_in_order_with_standard_options() {
        let log = Log::default();
        let mut registry = ExtenderRegistry::default();
        registry.register(Extender::new("no-commands"));
        registry.register(
            Extender::new("pair")
                .with_command(RecordingCommand { name: "first", log: log.clone() })
                .with_command(RecordingCommand { name: "second", log: log.clone() }),
        );
        registry.register(
            Extender::new("single")
                .skip_build()
                .with_command(RecordingCommand { name: "third", log: log.clone() }),
        );

        let (cmd, injected) = inject_commands(root(), &registry);
        assert_eq!(injected.names().collect::<Vec<_>>(), vec!["first", "second", "third"]);
        assert_eq!(injected.find("second").map(InjectedCommand::extender), Some("pair"));
        assert!(injected.find("third").unwrap().skip_steps().build);

        let first = cmd.find_subcommand("first").expect("first injected");
        let ids = first
            .get_arguments()
            .map(|a| a.get_id().as_str())
            .collect::<Vec<_>>();
        for expected in [
            "contracts",
            "build",
            "disable-include-path",
            "network",
            "config",
            "script",
            "verbose",
        ] {
            assert!(ids.contains(&expected), "missing option {expected}");
        }
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn conflicting_command_is_skipped() {
        let log = Log::default();
        let mut registry = ExtenderRegistry::default();
        registry.register(Extender::new("a").with_command(RecordingCommand {
            name: "init",
            log: log.clone(),
        }));
        registry.register(Extender::new("b").with_command(RecordingCommand {
            name: "run",
            log: log.clone(),
        }));
        registry.register(Extender::new("c").with_command(RecordingCommand {
            name: "run",
            log: log.clone(),
        }));

        let (cmd, injected) = inject_commands(root(), &registry);
        assert_eq!(injected.names().collect::<Vec<_>>(), vec!["run"]);
        assert_eq!(injected.find("run").map(InjectedCommand::extender), Some("b"));
        assert_eq!(cmd.get_subcommands().count(), 2);
    }

    #[tokio::test]
    async fn builds_before_runtime_init() {
        let log = Log::default();
        let registry = registry_with(&log, Extender::new("script"));
        let (cmd, injected) = inject_commands(root(), &registry);
        let matches = cmd
            .try_get_matches_from(["locklift", "run", "-n", "mainnet", "--verbose"])
            .unwrap();

        let handled = injected.dispatch(&matches, &steps(&log), &registry).await.unwrap();
        assert!(handled);
        assert_eq!(
            entries(&log),
            vec![
                "load:locklift.toml",
                "build:build",
                "runtime",
                "run:run:mainnet:true"
            ]
        );
    }

    #[tokio::test]
    async fn skip_build_goes_straight_to_runtime() {
        let log = Log::default();
        let registry = registry_with(&log, Extender::new("artifacts").skip_build());
        let (cmd, injected) = inject_commands(root(), &registry);
        let matches = cmd
            .try_get_matches_from(["locklift", "run", "--network", "mainnet"])
            .unwrap();

        injected.dispatch(&matches, &steps(&log), &registry).await.unwrap();
        assert_eq!(
            entries(&log),
            vec!["load:locklift.toml", "runtime", "run:run:mainnet:false"]
        );
    }

    #[tokio::test]
    async fn unknown_network_stops_before_any_step() {
        let log = Log::default();
        let registry = registry_with(&log, Extender::new("script"));
        let (cmd, injected) = inject_commands(root(), &registry);
        let matches = cmd
            .try_get_matches_from(["locklift", "run", "--network", "testnet"])
            .unwrap();

        let err = injected
            .dispatch(&matches, &steps(&log), &registry)
            .await
            .expect_err("unknown network must fail");
        assert_eq!(err.to_string(), "Can't find configuration for testnet network!");
        assert!(matches!(
            err.downcast_ref::<LoaderError>(),
            Some(e) if e.is_fatal_precondition()
        ));
        assert_eq!(entries(&log), vec!["load:locklift.toml"]);
    }

    #[tokio::test]
    async fn config_is_loaded_only_on_dispatch() {
        let log = Log::default();
        let registry = registry_with(&log, Extender::new("script"));
        let (cmd, injected) = inject_commands(root(), &registry);
        let matches = cmd
            .try_get_matches_from(["locklift", "run", "-n", "mainnet", "--config", "custom.toml"])
            .unwrap();

        let loads = |log: &Log| entries(log).iter().filter(|e| e.starts_with("load:")).count();
        assert_eq!(loads(&log), 0);

        injected.dispatch(&matches, &steps(&log), &registry).await.unwrap();
        assert_eq!(loads(&log), 1);
        assert_eq!(entries(&log)[0], "load:custom.toml");
    }

    #[tokio::test]
    async fn initializers_run_between_hook_and_action() {
        let log = Log::default();
        let mut registry = registry_with(&log, Extender::new("script"));
        registry.register(Extender::new("warmup").with_initializer(RecordingInit(log.clone())));
        let (cmd, injected) = inject_commands(root(), &registry);
        let matches = cmd.try_get_matches_from(["locklift", "run", "-n", "mainnet"]).unwrap();

        injected.dispatch(&matches, &steps(&log), &registry).await.unwrap();
        assert_eq!(
            entries(&log),
            vec![
                "load:locklift.toml",
                "build:build",
                "runtime",
                "init:mainnet",
                "run:run:mainnet:false"
            ]
        );
    }

    #[tokio::test]
    async fn build_failure_propagates_and_skips_runtime() {
        let log = Log::default();
        let registry = registry_with(&log, Extender::new("script"));
        let (cmd, injected) = inject_commands(root(), &registry);
        let matches = cmd.try_get_matches_from(["locklift", "run", "-n", "mainnet"]).unwrap();

        let mut failing = steps(&log);
        failing.build = Arc::new(BrokenBuild);
        let err = injected
            .dispatch(&matches, &failing, &registry)
            .await
            .expect_err("build failure must propagate");
        assert_eq!(err.to_string(), "compilation failed");
        assert_eq!(entries(&log), vec!["load:locklift.toml"]);
    }

    #[tokio::test]
    async fn foreign_subcommand_is_not_handled() {
        let log = Log::default();
        let registry = registry_with(&log, Extender::new("script"));
        let (cmd, injected) = inject_commands(root(), &registry);
        let matches = cmd.try_get_matches_from(["locklift", "init"]).unwrap();

        let handled = injected.dispatch(&matches, &steps(&log), &registry).await.unwrap();
        assert!(!handled);
        assert!(entries(&log).is_empty());
    }
}
