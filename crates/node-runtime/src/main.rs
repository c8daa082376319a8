//! # Forkcast Node Runtime
//!
//! Entry point of a Forkcast node.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging
//! 2. Load configuration from the environment
//! 3. Open the chain database and restore the chain
//! 4. Start the ENR updater and the dev block producer
//! 5. Run until Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use tracing::info;

use node_runtime::{init_logging, NodeConfig, NodeRuntime, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("Failed to initialize logging")?;

    let config = NodeConfig::from_env();

    let mut runtime = NodeRuntime::new(config)?;
    runtime.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await?;
    Ok(())
}
