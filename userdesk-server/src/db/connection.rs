//! Request-scoped connection lifecycle
//!
//! Every operation dials its own `PgConnection` through [`with_connection`],
//! which closes it again on success, failure and timeout alike.

use futures::future::BoxFuture;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;
use tokio::time::timeout;

use crate::config::{DbConfig, SslMode};
use crate::error::ErrorKind;

/// Reported to the server as `application_name`.
const APPLICATION_NAME: &str = "userdesk";

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("could not connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("connection to {target} timed out after {seconds}s")]
    ConnectTimeout { target: String, seconds: u64 },

    #[error("{0}")]
    Query(#[from] sqlx::Error),

    #[error("query timed out after {seconds}s")]
    QueryTimeout { seconds: u64 },
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. } | Self::ConnectTimeout { .. } => ErrorKind::Connection,
            // The link can still drop after a successful dial.
            Self::Query(e) if is_transport_error(e) => ErrorKind::Connection,
            Self::Query(_) | Self::QueryTimeout { .. } => ErrorKind::Query,
        }
    }
}

fn is_transport_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}

impl From<SslMode> for PgSslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Allow => PgSslMode::Allow,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
            SslMode::VerifyCa => PgSslMode::VerifyCa,
            SslMode::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

/// Build sqlx connect options from resolved settings.
///
/// `~/.pgpass` is deliberately not consulted; credentials come only from
/// [`DbConfig`].
pub fn connect_options(config: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new_without_pgpass()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(config.password.expose_secret())
        .database(&config.name)
        .ssl_mode(config.ssl_mode.into())
        .application_name(APPLICATION_NAME)
}

/// Dial a single connection, bounded by `connect_timeout`.
pub async fn connect(config: &DbConfig) -> Result<PgConnection, DbError> {
    let target = config.target();
    let options = connect_options(config);

    tracing::debug!(%target, ssl_mode = %config.ssl_mode, "dialing database");

    match timeout(config.connect_timeout, PgConnection::connect_with(&options)).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(source)) => Err(DbError::Connect { target, source }),
        Err(_) => Err(DbError::ConnectTimeout {
            target,
            seconds: config.connect_timeout.as_secs(),
        }),
    }
}

/// Run `op` against a freshly dialed connection and close it afterwards.
///
/// The operation is bounded by `query_timeout`. A failure while closing is
/// logged and never replaces the operation's own result.
///
/// # Example
///
/// ```ignore
/// let version = with_connection(&config, |conn| Box::pin(catalog::server_version(conn))).await?;
/// ```
pub async fn with_connection<T, F>(config: &DbConfig, op: F) -> Result<T, DbError>
where
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DbError>>,
{
    let mut conn = connect(config).await?;

    let result = match timeout(config.query_timeout, op(&mut conn)).await {
        Ok(result) => result,
        Err(_) => Err(DbError::QueryTimeout {
            seconds: config.query_timeout.as_secs(),
        }),
    };

    // Dropping the connection on a stuck close still tears the socket down.
    match timeout(config.connect_timeout, conn.close()).await {
        Ok(Ok(())) => tracing::trace!("database connection closed"),
        Ok(Err(e)) => tracing::warn!(error = %e, "failed to close database connection"),
        Err(_) => tracing::warn!("timed out closing database connection"),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ConfigSources, DB_CONNECT_TIMEOUT, DB_HOST, DB_NAME, DB_PASSWORD, DB_PORT, DB_SSLMODE,
        DB_USER,
    };
    use crate::db::catalog;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Nothing listens on port 1, so the dial is refused immediately.
    fn unreachable() -> DbConfig {
        DbConfig::from_sources(&ConfigSources::from_pairs([
            (DB_HOST, "127.0.0.1"),
            (DB_PORT, "1"),
            (DB_NAME, "testdb"),
            (DB_USER, "u"),
            (DB_PASSWORD, "p"),
            (DB_SSLMODE, "disable"),
            (DB_CONNECT_TIMEOUT, "5"),
        ]))
        .unwrap()
    }

    #[test]
    fn options_follow_config() {
        let config = unreachable();
        let options = connect_options(&config);

        assert_eq!(options.get_host(), "127.0.0.1");
        assert_eq!(options.get_port(), 1);
        assert_eq!(options.get_username(), "u");
        assert_eq!(options.get_database(), Some("testdb"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Disable));
        assert_eq!(options.get_application_name(), Some(APPLICATION_NAME));
    }

    #[test]
    fn ssl_modes_map_one_to_one() {
        assert!(matches!(PgSslMode::from(SslMode::Require), PgSslMode::Require));
        assert!(matches!(PgSslMode::from(SslMode::VerifyFull), PgSslMode::VerifyFull));
    }

    #[test]
    fn error_kinds() {
        let connect = DbError::ConnectTimeout {
            target: "h:5432/d".into(),
            seconds: 10,
        };
        assert_eq!(connect.kind(), ErrorKind::Connection);

        let io = DbError::Query(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        )));
        assert_eq!(io.kind(), ErrorKind::Connection);

        assert_eq!(DbError::Query(sqlx::Error::RowNotFound).kind(), ErrorKind::Query);
        assert_eq!(DbError::QueryTimeout { seconds: 30 }.kind(), ErrorKind::Query);
    }

    #[tokio::test]
    async fn refused_dial_is_connection_error() {
        let err = connect(&unreachable()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("127.0.0.1:1/testdb"));
    }

    #[tokio::test]
    async fn operation_not_run_when_dial_fails() {
        let called = AtomicBool::new(false);

        let result = with_connection(&unreachable(), |conn| {
            called.store(true, Ordering::SeqCst);
            Box::pin(catalog::ping(conn))
        })
        .await;

        assert!(result.is_err());
        assert!(!called.load(Ordering::SeqCst));
    }
}
