//! # growhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the JSON API used by the operator app and the companion node
//!   (`/status`, `/control`, `/pump`, `/history`, `/thresholds`)
//! - Stream published snapshots over Server-Sent Events (`/status/stream`)
//! - Map HTTP requests into control-loop messages (driving adapter)
//! - Map outcomes and errors into `{status, message}` JSON bodies
//!
//! Every route is served under `/api` and, for the companion firmware which
//! predates the prefix, at the bare path as well.
//!
//! ## Dependency rule
//! Depends on `growhub-app` (for the control handle and port traits) and
//! `growhub-domain` (for request and response types). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
