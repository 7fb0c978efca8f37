//! Database layer - connection lifecycle and queries
//!
//! # Design Principles
//!
//! - One connection per operation, dialed on demand and always closed
//! - No pool, no retry: a failed dial is reported, not repeated
//! - Rely on DB constraints (`ON CONFLICT`) rather than check-then-insert
//! - Transactions for multi-step operations

pub mod catalog;
pub mod connection;
pub mod users;

pub use connection::{connect, connect_options, with_connection, DbError};
pub use users::{User, UserRepo, SEED_USERS};
