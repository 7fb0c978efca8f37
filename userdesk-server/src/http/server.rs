//! Axum server setup
//!
//! Server skeleton with:
//! - Tracing middleware
//! - Request timeout on every route but `/health`
//! - Localhost-only CORS by default
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::sync::Arc;

use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use super::{error, routes};
use crate::config::AppConfig;

/// Shared application state
///
/// Read-only; nothing is mutated between requests.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

/// Build the router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;
    let cors = cors_layer(state.config.cors_permissive);

    // `/health` answers 200 no matter how long the database takes, so it
    // stays outside the timeout.
    let bounded = Router::new()
        .merge(routes::info::router())
        .merge(routes::database::router())
        .merge(routes::users::router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    Router::new()
        .merge(routes::health::router())
        .merge(bounded)
        .fallback(error::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// CORS configuration
fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }

    // Localhost only, any port
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            |origin: &HeaderValue, _: &Parts| is_local_origin(origin),
        ))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn is_local_origin(origin: &HeaderValue) -> bool {
    origin
        .to_str()
        .ok()
        .and_then(|raw| Url::parse(raw).ok())
        .is_some_and(|url| matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]")))
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
///
/// # Example
///
/// ```ignore
/// let config = AppConfig::load(None)?;
/// run_server(config).await?;
/// ```
pub async fn run_server(config: AppConfig) -> Result<(), ServerError> {
    let bind = (config.bind_host.clone(), config.port);
    let app = build_router(AppState::new(config));

    // Bind listener
    let listener = TcpListener::bind(&bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
