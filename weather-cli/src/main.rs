//! Binary crate for the `weather-widget` terminal host.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and merging them with the stored configuration
//! - Setting up logging
//! - Printing each render state the core produces

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_logging(cmd.debug);
    cmd.run().await
}

/// Logs go to stderr so stdout only carries the rendered widget.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
