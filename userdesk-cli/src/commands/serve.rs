//! HTTP server command
//!
//! Configuration is resolved before binding, so missing credentials stop the
//! process at startup instead of surfacing on the first request.

use anyhow::{Context, Result};
use clap::Parser;

use userdesk_server::{run_server, AppConfig, ConfigSources};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides HOST, default 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides PORT, default 8000)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, sources: &ConfigSources) -> Result<()> {
    let mut config = AppConfig::from_sources(sources).context("Invalid configuration")?;

    if let Some(host) = args.host {
        config.bind_host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.cors_permissive |= args.cors_permissive;

    tracing::info!(
        database = %config.db.masked_url(),
        environment = %config.environment,
        debug = config.debug,
        request_timeout_secs = config.request_timeout.as_secs(),
        "Configuration loaded"
    );

    // Run server (blocks until shutdown)
    run_server(config).await.context("Server error")?;

    Ok(())
}
