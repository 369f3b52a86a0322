//! Searchbridge CLI
//!
//! Keeps Typesense collections in step with host index definitions.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use searchbridge_cli::{Args, commands};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,searchbridge=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(command = ?args.command, "Starting searchbridge");

    commands::run(args).await
}
