//! codelabs command-line tool

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use codelabs::cli::Cli;

/// How long exit waits for blocking filesystem work left behind by a timed-out scan
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Built by hand so exit is not held up by a stuck blocking read
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let result = runtime.block_on(cli.execute());
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}
