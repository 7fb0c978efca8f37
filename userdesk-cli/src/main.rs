//! userdesk CLI - run and diagnose the userdesk service
//!
//! - `serve`: run the HTTP API (health, info, database and user routes)
//! - `check`: connection diagnostic for the configured database
//! - `init-db`: create and seed the users table from the command line
//!
//! Settings come from the process environment, then the env file
//! (`--env-file`, default `./.env`), then `DATABASE_URL`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use userdesk_server::config::{DEBUG, DEFAULT_ENV_FILE};
use userdesk_server::ConfigSources;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "userdesk",
    author,
    version,
    about = "Minimal JSON service over a PostgreSQL users table",
    long_about = "Serve health, introspection and user endpoints backed by PostgreSQL, \
                  or diagnose the configured database connection."
)]
struct Cli {
    /// Env file read beneath the process environment (missing file is fine)
    #[arg(long, global = true, env = "USERDESK_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(commands::serve::ServeArgs),
    /// Check database configuration and connectivity
    Check(commands::check::CheckArgs),
    /// Create the users table and insert the seed rows
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let sources = ConfigSources::from_env()
        .with_env_file(&cli.env_file)
        .with_context(|| format!("Failed to load {}", cli.env_file.display()))?;

    tracing_setup::init(&tracing_setup::TracingConfig {
        debug: sources.flag(DEBUG),
    })
    .ok();

    match sources.env_file() {
        Some(path) => tracing::debug!(
            path = %path.display(),
            keys = sources.file_len(),
            "loaded env file"
        ),
        None => tracing::debug!(path = %cli.env_file.display(), "no env file found"),
    }

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, &sources).await?,
        Commands::Check(args) => commands::run_check(args, &sources).await?,
        Commands::InitDb => commands::run_init_db(&sources).await?,
    }
    Ok(())
}
