//! Route handlers, one module per resource
//!
//! - info: index, build and environment metadata (no database)
//! - health: liveness with database probe
//! - database: connectivity test, table listing, schema initialization
//! - users: user listing

pub mod database;
pub mod health;
pub mod info;
pub mod users;

/// `status` value of every successful JSON body.
pub const SUCCESS: &str = "success";
