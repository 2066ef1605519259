//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the control core and the outside world.
//! They are defined here (in `app`) so that both the control layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod audit_log;
pub mod output;
pub mod publisher;
pub mod sensor;

pub use audit_log::AuditLog;
pub use output::OutputDriver;
pub use publisher::StatePublisher;
pub use sensor::SensorDriver;
