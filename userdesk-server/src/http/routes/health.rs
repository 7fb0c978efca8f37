//! Health check endpoint
//!
//! Always 200: a down database shows up in the body, not the status code,
//! so probes can tell "process alive" from "dependency down".

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::http::AppState;
use crate::ops;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseState {
    Connected,
    Error,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub database: DatabaseState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_error: Option<String>,
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (database, database_error) = match ops::ping(&state.config.db).await {
        Ok(()) => (DatabaseState::Connected, None),
        Err(e) => {
            tracing::warn!(kind = %e.kind(), error = %e, "health check: database unavailable");
            (DatabaseState::Error, Some(e.to_string()))
        }
    };

    Json(HealthResponse {
        status: "healthy",
        message: "Application is running",
        version: env!("CARGO_PKG_VERSION"),
        database,
        database_error,
    })
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_error_omitted_when_connected() {
        let body = serde_json::to_value(HealthResponse {
            status: "healthy",
            message: "Application is running",
            version: "1.0.0",
            database: DatabaseState::Connected,
            database_error: None,
        })
        .unwrap();

        assert_eq!(body["database"], "connected");
        assert!(body.get("database_error").is_none());
    }
}
