//! Shared application state for axum handlers.

use std::sync::Arc;

use growhub_app::control::ControlHandle;
use growhub_app::ports::AuditLog;
use growhub_app::snapshot_bus::SnapshotBus;

/// Application state shared across all axum handlers.
///
/// Generic over the audit log to avoid dynamic dispatch. `Clone` is
/// implemented manually so the log itself does not need to be `Clone`.
pub struct AppState<L> {
    /// Entry point into the control loop.
    pub control: ControlHandle,
    /// Audit log, read for the history endpoint.
    pub audit_log: Arc<L>,
    /// Published snapshots, fanned out to SSE clients.
    pub snapshots: SnapshotBus,
}

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            control: self.control.clone(),
            audit_log: Arc::clone(&self.audit_log),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<L> AppState<L>
where
    L: AuditLog + Send + Sync + 'static,
{
    /// Create a new application state.
    pub fn new(control: ControlHandle, audit_log: Arc<L>, snapshots: SnapshotBus) -> Self {
        Self {
            control,
            audit_log,
            snapshots,
        }
    }
}
