//! `conduct` binary.
//!
//! Manages bundles on a ConductR cluster through its control API and
//! packages exported OCI images as bundles. Log verbosity follows
//! `RUST_LOG` and defaults to warnings only.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use conduct_cli::commands::{dispatch, Cli};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
