//! Static metadata endpoints - no database access, never fail

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::http::AppState;
use crate::ops::{self, APP_NAME};

/// Paths listed by the index.
const ENDPOINTS: [&str; 7] = [
    "/health",
    "/info",
    "/test",
    "/db/test",
    "/db/tables",
    "/init-db",
    "/users",
];

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub app: &'static str,
    pub endpoints: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub app: &'static str,
    pub version: &'static str,
    pub runtime_version: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub message: &'static str,
    pub runtime_version: String,
}

/// GET /
async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        app: APP_NAME,
        endpoints: &ENDPOINTS,
    })
}

/// GET /info
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        app: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
        runtime_version: ops::runtime_version(),
        environment: state.config.environment.clone(),
    })
}

/// GET /test
async fn smoke_test() -> Json<TestResponse> {
    Json(TestResponse {
        message: "Test endpoint working!",
        runtime_version: ops::runtime_version(),
    })
}

/// Info routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/info", get(info))
        .route("/test", get(smoke_test))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn smoke_test_reports_build() {
        let Json(body) = smoke_test().await;
        assert_eq!(body.message, "Test endpoint working!");
        assert!(!body.runtime_version.is_empty());
    }
}
