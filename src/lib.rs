//! Songbook server library
//!
//! This module exposes the internal components for testing purposes.

pub mod catalog;
pub mod catalog_store;
pub mod config;
pub mod error;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use error::{ServiceError, ServiceResult};
pub use server::{run_server, RequestsLoggingLevel};
pub use user::{SqliteUserStore, UserRole, UserStore};
