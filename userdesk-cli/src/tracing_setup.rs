//! Tracing setup for the userdesk CLI
//!
//! Usage:
//!   DEBUG=true userdesk serve            # Debug logging to console
//!   RUST_LOG=userdesk_server=debug ...    # Fine-grained log control
//!
//! Environment variables:
//!   RUST_LOG                             # Log filter (default: info)

use std::io::IsTerminal;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Enable debug logging (used when RUST_LOG is not set)
    pub debug: bool,
}

/// Initialize console tracing.
pub fn init(config: &TracingConfig) -> Result<()> {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.debug) // Show targets in debug mode
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
