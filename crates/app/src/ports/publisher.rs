//! State publisher port — pushes snapshots and acknowledgments outward.

use std::future::Future;
use std::sync::Arc;

use growhub_domain::command::Acknowledgment;
use growhub_domain::error::GrowHubError;
use growhub_domain::snapshot::StateSnapshot;

/// External mirror of the controller state.
///
/// Failures are reported as [`GrowHubError::Publication`] and are only ever
/// logged by callers.
pub trait StatePublisher {
    /// Push the latest snapshot.
    fn publish(
        &self,
        snapshot: StateSnapshot,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send;

    /// Let the originator of an external command observe its result.
    fn acknowledge(
        &self,
        ack: Acknowledgment,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send;

    /// Mark the controller as offline. Best effort, called at shutdown.
    fn mark_offline(&self) -> impl Future<Output = Result<(), GrowHubError>> + Send;
}

impl<T: StatePublisher + Send + Sync> StatePublisher for Arc<T> {
    fn publish(
        &self,
        snapshot: StateSnapshot,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        (**self).publish(snapshot)
    }

    fn acknowledge(
        &self,
        ack: Acknowledgment,
    ) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        (**self).acknowledge(ack)
    }

    fn mark_offline(&self) -> impl Future<Output = Result<(), GrowHubError>> + Send {
        (**self).mark_offline()
    }
}

/// A disabled publisher does nothing.
impl<T: StatePublisher + Send + Sync> StatePublisher for Option<T> {
    async fn publish(&self, snapshot: StateSnapshot) -> Result<(), GrowHubError> {
        match self {
            Some(inner) => inner.publish(snapshot).await,
            None => Ok(()),
        }
    }

    async fn acknowledge(&self, ack: Acknowledgment) -> Result<(), GrowHubError> {
        match self {
            Some(inner) => inner.acknowledge(ack).await,
            None => Ok(()),
        }
    }

    async fn mark_offline(&self) -> Result<(), GrowHubError> {
        match self {
            Some(inner) => inner.mark_offline().await,
            None => Ok(()),
        }
    }
}

/// Fan out to two publishers. Both are always attempted; the first error wins.
impl<A, B> StatePublisher for (A, B)
where
    A: StatePublisher + Send + Sync,
    B: StatePublisher + Send + Sync,
{
    async fn publish(&self, snapshot: StateSnapshot) -> Result<(), GrowHubError> {
        let first = self.0.publish(snapshot).await;
        let second = self.1.publish(snapshot).await;
        first.and(second)
    }

    async fn acknowledge(&self, ack: Acknowledgment) -> Result<(), GrowHubError> {
        let first = self.0.acknowledge(ack.clone()).await;
        let second = self.1.acknowledge(ack).await;
        first.and(second)
    }

    async fn mark_offline(&self) -> Result<(), GrowHubError> {
        let first = self.0.mark_offline().await;
        let second = self.1.mark_offline().await;
        first.and(second)
    }
}
