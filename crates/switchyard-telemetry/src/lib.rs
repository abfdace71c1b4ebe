//! Logging setup for Switchyard
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! formatting layer chosen by the `[log]` config section.

use switchyard_config::{LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber from configuration
///
/// `RUST_LOG` takes precedence over the configured filter when set.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let filter = build_filter(config)?;

    let result = match config.format {
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
        }
    };

    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}

fn build_filter(config: &LogConfig) -> anyhow::Result<EnvFilter> {
    if let Ok(directive) = std::env::var(EnvFilter::DEFAULT_ENV)
        && !directive.trim().is_empty()
    {
        return EnvFilter::try_new(&directive).map_err(|e| anyhow::anyhow!("invalid RUST_LOG directive: {e}"));
    }

    EnvFilter::try_new(&config.filter).map_err(|e| anyhow::anyhow!("invalid log filter '{}': {e}", config.filter))
}
