//! API error types with IntoResponse
//!
//! Failures become `{status: "error", kind, message}` where `message` is the
//! underlying cause text.

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Connection or query failure (500, logged)
    Database(DbError),

    /// No route matched (404)
    NotFound { path: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Database(e) => {
                tracing::error!(kind = %e.kind(), error = %e, "database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "status": "error",
                        "kind": e.kind(),
                        "message": e.to_string()
                    }),
                )
            }
            Self::NotFound { path } => (
                StatusCode::NOT_FOUND,
                json!({
                    "status": "error",
                    "kind": "not_found",
                    "message": format!("no route for '{}'", path)
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

/// Router fallback.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        path: uri.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn query_error_is_500_with_cause() {
        let err = ApiError::from(DbError::Query(sqlx::Error::RowNotFound));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "query");
        assert!(!body["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn timeout_is_connection_kind() {
        let err = ApiError::from(DbError::ConnectTimeout {
            target: "db:5432/app".into(),
            seconds: 10,
        });
        let body = body_json(err.into_response()).await;

        assert_eq!(body["kind"], "connection");
        assert_eq!(body["message"], "connection to db:5432/app timed out after 10s");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let response = not_found("/missing".parse().unwrap()).await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
