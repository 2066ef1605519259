//! In-process snapshot bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use growhub_domain::command::Acknowledgment;
use growhub_domain::error::GrowHubError;
use growhub_domain::snapshot::StateSnapshot;

use crate::ports::StatePublisher;

/// Fans published snapshots out to in-process subscribers (the SSE stream).
///
/// Publishing succeeds even when there are no active subscribers
/// (the snapshot is simply dropped).
#[derive(Debug, Clone)]
pub struct SnapshotBus {
    sender: broadcast::Sender<StateSnapshot>,
}

impl SnapshotBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to snapshots published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateSnapshot> {
        self.sender.subscribe()
    }
}

impl StatePublisher for SnapshotBus {
    async fn publish(&self, snapshot: StateSnapshot) -> Result<(), GrowHubError> {
        // send only fails without receivers
        let _ = self.sender.send(snapshot);
        Ok(())
    }

    async fn acknowledge(&self, _ack: Acknowledgment) -> Result<(), GrowHubError> {
        Ok(())
    }

    async fn mark_offline(&self) -> Result<(), GrowHubError> {
        Ok(())
    }
}
