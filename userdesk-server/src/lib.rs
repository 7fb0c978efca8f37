//! userdesk-server: JSON HTTP service over a PostgreSQL `users` table
//!
//! Exposes health, introspection and user listing endpoints. Configuration
//! is resolved once into an immutable [`AppConfig`]; every database
//! operation dials its own connection and closes it before returning.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod ops;

pub use config::{AppConfig, ConfigError, ConfigSources, DbConfig, SslMode};
pub use db::DbError;
pub use error::ErrorKind;
pub use http::{build_router, run_server, AppState, ServerError};
