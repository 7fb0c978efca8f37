//! HTTP server layer
//!
//! Axum server with:
//! - Request tracing, CORS and a request timeout (`/health` exempt)
//! - Graceful shutdown
//! - JSON error responses carrying an error kind

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerError};
