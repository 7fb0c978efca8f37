//! Server and catalog introspection queries

use sqlx::postgres::PgConnection;

use super::DbError;

/// Liveness probe.
pub async fn ping(conn: &mut PgConnection) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(conn).await?;
    Ok(())
}

/// Server version string, exactly as `version()` reports it.
pub async fn server_version(conn: &mut PgConnection) -> Result<String, DbError> {
    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(conn)
        .await?;
    Ok(version)
}

/// Table names in the `public` schema, sorted by name.
///
/// `table_name` is a `sql_identifier` domain, cast to text for decoding.
pub async fn public_tables(conn: &mut PgConnection) -> Result<Vec<String>, DbError> {
    let tables: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT table_name::text
        FROM information_schema.tables
        WHERE table_schema = 'public'
        ORDER BY table_name
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(tables)
}
