//! # growhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`AuditLog`](growhub_app::ports::AuditLog) port
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between audit records and database rows
//!
//! ## Dependency rule
//! Depends on `growhub-app` (for port traits) and `growhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod audit_log;
pub mod error;
pub mod pool;

pub use audit_log::SqliteAuditLog;
pub use pool::{Config, Database};
