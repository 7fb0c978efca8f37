//! Operations behind the HTTP routes and CLI commands
//!
//! Each database operation dials its own connection through
//! [`with_connection`] and runs exactly one statement, or the fixed
//! schema-initialization transaction.

use crate::config::DbConfig;
use crate::db::{catalog, with_connection, DbError, User, UserRepo};

/// Application name reported by `/info`.
pub const APP_NAME: &str = "userdesk";

/// Build identity: crate version plus target platform.
pub fn runtime_version() -> String {
    format!(
        "{} {} ({}-{})",
        APP_NAME,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// `SELECT 1` against a fresh connection.
pub async fn ping(db: &DbConfig) -> Result<(), DbError> {
    with_connection(db, |conn| Box::pin(catalog::ping(conn))).await
}

pub async fn database_version(db: &DbConfig) -> Result<String, DbError> {
    with_connection(db, |conn| Box::pin(catalog::server_version(conn))).await
}

pub async fn list_tables(db: &DbConfig) -> Result<Vec<String>, DbError> {
    with_connection(db, |conn| Box::pin(catalog::public_tables(conn))).await
}

/// Create the users table and seed it. Returns the number of newly
/// inserted seed rows.
pub async fn init_schema(db: &DbConfig) -> Result<u64, DbError> {
    let inserted = with_connection(db, |conn| {
        Box::pin(async move { UserRepo::new(conn).init_schema().await })
    })
    .await?;

    tracing::info!(inserted, "database initialized");
    Ok(inserted)
}

pub async fn list_users(db: &DbConfig) -> Result<Vec<User>, DbError> {
    with_connection(db, |conn| {
        Box::pin(async move { UserRepo::new(conn).list().await })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_version_names_build() {
        let version = runtime_version();
        assert!(version.starts_with("userdesk "));
        assert!(version.contains(env!("CARGO_PKG_VERSION")));
        assert!(version.contains(std::env::consts::OS));
    }
}
