//! # growhub-app
//!
//! Application layer — the control core and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `OutputDriver` — write relay output lines
//!   - `SensorDriver` — sample temperature and humidity
//!   - `AuditLog` — append & query readings, commands and system events
//!   - `StatePublisher` — mirror snapshots and acknowledgments outward
//! - Own the control state:
//!   - `ActuatorController` — hysteresis evaluation, the only actuator mutator
//!   - `ConnectivityMonitor` — companion-node liveness
//!   - `CommandDispatcher` — dedup, arbitration, audit and acknowledgments
//!   - `ControlLoop` / `ControlHandle` — single-owner task and its client
//! - Run the periodic activities (`SyncScheduler`) and the outbound writer
//! - Provide **in-process infrastructure** (snapshot bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `growhub-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod audit_writer;
pub mod connectivity;
pub mod control;
pub mod controller;
pub mod dedup;
pub mod dispatcher;
pub mod ports;
pub mod scheduler;
pub mod snapshot_bus;
