use anyhow::Result;
use futures::future::try_join_all;
use tracing::{debug, instrument};

use crate::extension::ExtenderRegistry;
use crate::runtime::ExecutionContext;

/// Runs every registered initializer concurrently against `ctx`.
///
/// All initializers are started before any of them is awaited, in no
/// particular order. The first error is returned as-is; initializers still
/// pending at that point are dropped.
#[instrument(skip_all, fields(network = %ctx.network))]
pub async fn initialize_extenders(
    ctx: &ExecutionContext,
    registry: &ExtenderRegistry,
) -> Result<()> {
    let initializers = registry.initializers().collect::<Vec<_>>();
    if initializers.is_empty() {
        debug!("no extender initializers registered");
        return Ok(());
    }

    debug!("starting {} extender initializer(s)", initializers.len());
    try_join_all(initializers.into_iter().map(|(name, init)| async move {
        debug!("initializing extender '{}'", name);
        init.initialize(ctx).await
    }))
    .await?;

    Ok(())
}
