use clap::Command;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use locklift_core::{
    inject_commands, CommandBuilder, Extender, ExtenderRegistry, Invocation, LockliftConfig,
};

fn bench_config_parse(c: &mut Criterion) {
    let toml_text = r#"
[compiler]
program = "sold"
args = ["--tvm-version", "ever"]
include_path = "node_modules"

[networks.local]
endpoint = "http://localhost"

[networks.mainnet]
endpoint = "https://mainnet.evercloud.dev"
giver = "0:ece57bcc6c530283becbbd8a3b24d3c5987cdddc3c8b7b33be6e4a6312490415"
"#;

    c.bench_function("parse_config", |b| {
        b.iter(|| {
            let _cfg = LockliftConfig::from_toml(black_box(toml_text)).unwrap();
        })
    });
}

struct Named(&'static str);

#[async_trait::async_trait]
impl CommandBuilder for Named {
    fn build(&self, base: Command) -> Command {
        base.name(self.0)
    }

    async fn run(&self, _invocation: &Invocation) -> anyhow::Result<()> {
        Ok(())
    }
}

fn bench_inject(c: &mut Criterion) {
    let mut registry = ExtenderRegistry::default();
    registry.register(
        Extender::new("bench")
            .with_command(Named("run"))
            .with_command(Named("deploy"))
            .with_command(Named("verify")),
    );

    c.bench_function("inject_commands", |b| {
        b.iter(|| {
            let (_root, injected) = inject_commands(Command::new("locklift"), black_box(&registry));
            injected.len()
        })
    });
}

criterion_group!(benches, bench_config_parse, bench_inject);
criterion_main!(benches);
