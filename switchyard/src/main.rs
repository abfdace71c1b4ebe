#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
mod commands;

use args::Args;
use clap::Parser;
use switchyard_config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    switchyard_telemetry::init(&config.log)?;

    tracing::debug!(
        config_path = %args.config.display(),
        "starting switchyard"
    );

    commands::run(&config, args.command).await
}
