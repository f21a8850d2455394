#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cli;

use clap::Parser;
use cli::FixtureArgs;
use eyre::{Result, WrapErr};
use redpanda_fixture::{RedpandaContainer, RedpandaError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = FixtureArgs::parse();
    args.logging.init_tracing()?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
        }
        signal.cancel();
    });

    let redpanda = match RedpandaContainer::start_with_cancellation(&args.settings(), &shutdown)
        .await
    {
        Ok(redpanda) => redpanda,
        Err(RedpandaError::Cancelled) => {
            info!("Interrupted before Redpanda was ready");
            return Ok(());
        }
        Err(e) => return Err(e).wrap_err("Failed to start Redpanda"),
    };

    let endpoints = redpanda.endpoints().await.wrap_err("Failed to resolve endpoints")?;
    println!("{endpoints}");

    if let Some(path) = &args.output {
        endpoints
            .write_to_file(path)
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote endpoints");
    }

    info!("Redpanda is running, press Ctrl+C to stop");
    shutdown.cancelled().await;

    redpanda.terminate().await.wrap_err("Failed to terminate Redpanda")?;
    Ok(())
}
