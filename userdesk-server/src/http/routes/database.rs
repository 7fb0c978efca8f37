//! Database introspection and schema setup
//!
//! GET /db/test    - server version
//! GET /db/tables  - tables in the public schema
//! GET /init-db    - create and seed the users table (idempotent)

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use super::SUCCESS;
use crate::http::{ApiError, AppState};
use crate::ops;

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub database_version: String,
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub status: &'static str,
    pub count: usize,
    pub tables: Vec<String>,
}

impl TablesResponse {
    pub fn new(tables: Vec<String>) -> Self {
        Self {
            status: SUCCESS,
            count: tables.len(),
            tables,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InitResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// Seed rows inserted by this call; 0 when they already existed.
    pub inserted: u64,
}

/// GET /db/test
async fn test_connection(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VersionResponse>, ApiError> {
    let database_version = ops::database_version(&state.config.db).await?;

    Ok(Json(VersionResponse {
        status: SUCCESS,
        message: "Database connection successful",
        database_version,
    }))
}

/// GET /db/tables
async fn list_tables(State(state): State<Arc<AppState>>) -> Result<Json<TablesResponse>, ApiError> {
    let tables = ops::list_tables(&state.config.db).await?;
    Ok(Json(TablesResponse::new(tables)))
}

/// GET /init-db
async fn init_db(State(state): State<Arc<AppState>>) -> Result<Json<InitResponse>, ApiError> {
    let inserted = ops::init_schema(&state.config.db).await?;

    Ok(Json(InitResponse {
        status: SUCCESS,
        message: "Database initialized successfully",
        inserted,
    }))
}

/// Database routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/db/test", get(test_connection))
        .route("/db/tables", get(list_tables))
        .route("/init-db", get(init_db))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_list_is_success() {
        let body = serde_json::to_value(TablesResponse::new(Vec::new())).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["count"], 0);
        assert_eq!(body["tables"], serde_json::json!([]));
    }

    #[test]
    fn count_matches_tables() {
        let response = TablesResponse::new(vec!["orders".into(), "users".into()]);
        assert_eq!(response.count, response.tables.len());
    }
}
