use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};

use crate::InitArgs;
use tracing::{info, instrument};

const CONFIG_TEMPLATE: &str = r#"# Locklift project configuration.

[compiler]
program = "sold"
args = []
include_path = "node_modules"

[networks.local]
endpoint = "http://localhost"

# [networks.mainnet]
# endpoint = "https://mainnet.evercloud.dev"
# giver = "0:..."
"#;

/// Runs the `init` command to bootstrap a new Locklift project.
#[instrument]
pub fn run(args: &InitArgs) -> Result<()> {
    write_if_absent(&args.config, CONFIG_TEMPLATE, args.force)
        .with_context(|| format!("failed to write '{}'", args.config))?;

    fs::create_dir_all(&args.contracts)
        .with_context(|| format!("failed to create directory '{}'", args.contracts))?;

    info!("init complete: config={}, contracts={}", args.config, args.contracts);
    println!("next: run 'locklift run --network local --script <script>'");

    Ok(())
}

fn write_if_absent(path: &str, content: &str, force: bool) -> Result<()> {
    let output = Path::new(path);

    if output.exists() && !force {
        return Err(anyhow!(
            "'{}' already exists. Re-run with --force to overwrite",
            path
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }

    fs::write(output, content)
        .with_context(|| format!("failed to write file '{}'", output.display()))
}
