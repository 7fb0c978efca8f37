//! Schema initialization from the command line

use anyhow::{Context, Result};

use userdesk_server::{ops, ConfigSources, DbConfig};

/// Create the users table and insert the seed rows (idempotent).
pub async fn run_init_db(sources: &ConfigSources) -> Result<()> {
    let db = DbConfig::from_sources(sources).context("Invalid configuration")?;

    let inserted = ops::init_schema(&db)
        .await
        .with_context(|| format!("Failed to initialize {}", db.target()))?;

    println!(
        "✓ users table ready on {} ({} seed rows inserted)",
        db.target(),
        inserted
    );
    Ok(())
}
