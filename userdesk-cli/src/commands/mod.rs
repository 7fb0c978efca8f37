//! Command implementations for the userdesk CLI

pub mod check;
pub mod init_db;
pub mod serve;

// Re-export main dispatcher functions for flat access from main.rs
pub use check::run_check;
pub use init_db::run_init_db;
pub use serve::run_serve;
