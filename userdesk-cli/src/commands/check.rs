//! Database connection diagnostic
//!
//! Reports which credentials resolved (password masked), dials the server,
//! prints its version and the public tables, then a summary. Exits non-zero
//! when any step fails.

use anyhow::{bail, Result};
use clap::Parser;
use serde::Serialize;

use userdesk_server::config::{DB_PASSWORD, REQUIRED_DB_KEYS};
use userdesk_server::{ops, ConfigError, ConfigSources, DbConfig, ErrorKind};

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Outcome of a check run
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub missing: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_version: Option<String>,
    pub tables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckReport {
    fn failed_config(e: ConfigError) -> Self {
        let kind = e.kind();
        let missing = match &e {
            ConfigError::Missing { keys } => keys.clone(),
            _ => Vec::new(),
        };
        Self {
            missing,
            error_kind: Some(kind),
            error: Some(e.to_string()),
            ..Default::default()
        }
    }

    pub fn passed(&self) -> bool {
        self.connected && self.error.is_none()
    }
}

/// Run the connection diagnostic
pub async fn run_check(args: CheckArgs, sources: &ConfigSources) -> Result<()> {
    let resolved = DbConfig::from_sources(sources);

    if !args.json {
        print_parameters(sources, resolved.as_ref().ok());
    }

    let report = match resolved {
        Ok(db) => diagnose(&db, !args.json).await,
        Err(e) => CheckReport::failed_config(e),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if !report.passed() {
        bail!("database check failed");
    }
    Ok(())
}

/// Version query, then table listing, each on its own connection.
async fn diagnose(db: &DbConfig, verbose: bool) -> CheckReport {
    let mut report = CheckReport {
        target: Some(db.target()),
        ..Default::default()
    };

    if verbose {
        println!("\nConnecting to {}", db.masked_url());
    }

    match ops::database_version(db).await {
        Ok(version) => {
            report.connected = true;
            if verbose {
                println!("  ✓ Connected");
                println!("\nPostgreSQL version:\n  {}", version);
            }
            report.database_version = Some(version);
        }
        Err(e) => {
            if verbose {
                println!("  ✗ Connection failed: {}", e);
            }
            report.error_kind = Some(e.kind());
            report.error = Some(e.to_string());
            return report;
        }
    }

    match ops::list_tables(db).await {
        Ok(tables) => {
            if verbose {
                println!("\nTables in database ({}):", tables.len());
                if tables.is_empty() {
                    println!("  (no tables found)");
                }
                for table in &tables {
                    println!("  - {}", table);
                }
            }
            report.tables = tables;
        }
        Err(e) => {
            if verbose {
                println!("  ✗ Listing tables failed: {}", e);
            }
            report.error_kind = Some(e.kind());
            report.error = Some(e.to_string());
        }
    }

    report
}

fn print_parameters(sources: &ConfigSources, db: Option<&DbConfig>) {
    println!("Required variables:");
    match db {
        Some(db) => {
            let password = db.masked_password();
            for (key, value) in REQUIRED_DB_KEYS.into_iter().zip([
                db.host.as_str(),
                db.name.as_str(),
                db.user.as_str(),
                password.as_str(),
            ]) {
                println!("  ✓ {} = {}", key, value);
            }

            println!("\nOptional variables:");
            println!("  · DB_PORT = {}", db.port);
            println!("  · DB_SSLMODE = {}", db.ssl_mode);
        }
        None => {
            for key in REQUIRED_DB_KEYS {
                match sources.get(key) {
                    Some(value) if key == DB_PASSWORD => {
                        println!("  ✓ {} = {}", key, "*".repeat(value.chars().count()))
                    }
                    Some(value) => println!("  ✓ {} = {}", key, value),
                    None => println!("  ✗ {} (not set)", key),
                }
            }
        }
    }
}

fn print_summary(report: &CheckReport) {
    println!("\nSummary:");
    if report.passed() {
        println!("  ✅ Database connection is working!");
        return;
    }

    if let Some(error) = &report.error {
        println!("  ❌ {}", error);
    }

    if report.error_kind == Some(ErrorKind::Connection) {
        println!("\nCommon issues:");
        println!("  1. Incorrect credentials (username/password)");
        println!("  2. Firewall blocking the connection");
        println!("  3. TLS requirements (try DB_SSLMODE=require or disable)");
        println!("  4. Network connectivity issues");
        println!("  5. Database server not running or not accessible");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_carried_into_report() {
        let report = CheckReport::failed_config(ConfigError::Missing {
            keys: vec!["DB_HOST", "DB_PASSWORD"],
        });

        assert!(!report.passed());
        assert_eq!(report.missing, vec!["DB_HOST", "DB_PASSWORD"]);
        assert_eq!(report.error_kind, Some(ErrorKind::Configuration));
    }

    #[test]
    fn connected_without_error_passes() {
        let report = CheckReport {
            connected: true,
            ..Default::default()
        };
        assert!(report.passed());
    }

    #[test]
    fn json_omits_absent_fields() {
        let json = serde_json::to_value(CheckReport::default()).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["connected"], false);
    }
}
