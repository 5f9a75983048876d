//! Tracing subscriber setup. Logs go to stderr; stdout carries command output.

use anyhow::{Context, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
///
/// # Errors
///
/// Fails on an invalid filter directive or if a subscriber is already set.
pub fn init(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .with_context(|| format!("invalid logging.level '{}'", cfg.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match cfg.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!(e).context("failed to install tracing subscriber"))
}
