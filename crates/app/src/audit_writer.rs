//! Outbound queue between the control loop and slow IO.
//!
//! The control loop never awaits persistence or publication: it pushes audit
//! entries and acknowledgments with `try_send`, and a separate
//! [`AuditWriter`] task drains them into the [`AuditLog`] and
//! [`StatePublisher`] ports.

use growhub_domain::audit::AuditEntry;
use growhub_domain::command::Acknowledgment;
use tokio::sync::mpsc;

use crate::ports::{AuditLog, StatePublisher};

/// Something the control loop wants written outside its own task.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Audit(AuditEntry),
    Ack(Acknowledgment),
}

/// Non-blocking producer side of the outbound queue.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    sender: mpsc::Sender<OutboundMessage>,
}

/// Create a bounded outbound queue.
#[must_use]
pub fn outbound_queue(capacity: usize) -> (OutboundQueue, mpsc::Receiver<OutboundMessage>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (OutboundQueue { sender }, receiver)
}

impl OutboundQueue {
    /// Enqueue without waiting. A full or closed queue drops the message.
    pub fn push(&self, message: OutboundMessage) {
        match self.sender.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                tracing::warn!(dropped = ?dropped, "outbound queue full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("outbound queue closed");
            }
        }
    }

    pub fn audit(&self, entry: impl Into<AuditEntry>) {
        self.push(OutboundMessage::Audit(entry.into()));
    }

    pub fn acknowledge(&self, ack: Acknowledgment) {
        self.push(OutboundMessage::Ack(ack));
    }
}

/// Drains the outbound queue until every producer is gone.
pub struct AuditWriter<L, P> {
    receiver: mpsc::Receiver<OutboundMessage>,
    log: L,
    publisher: P,
}

impl<L, P> AuditWriter<L, P>
where
    L: AuditLog,
    P: StatePublisher,
{
    pub fn new(receiver: mpsc::Receiver<OutboundMessage>, log: L, publisher: P) -> Self {
        Self {
            receiver,
            log,
            publisher,
        }
    }

    /// Run until the queue is closed and empty. Failures are logged only.
    pub async fn run(mut self) {
        while let Some(message) = self.receiver.recv().await {
            self.handle(message).await;
        }
        tracing::debug!("audit writer stopped");
    }

    async fn handle(&self, message: OutboundMessage) {
        let result = match message {
            OutboundMessage::Audit(AuditEntry::Reading(record)) => {
                self.log.record_reading(record).await
            }
            OutboundMessage::Audit(AuditEntry::Command(record)) => {
                self.log.record_command(record).await
            }
            OutboundMessage::Audit(AuditEntry::Event(event)) => self.log.record_event(event).await,
            OutboundMessage::Ack(ack) => self.publisher.acknowledge(ack).await,
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "outbound write failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use growhub_domain::actuator::ActuatorId;
    use growhub_domain::audit::{
        CommandOutcome, CommandRecord, ReadingRecord, SystemEvent, SystemEventType,
    };
    use growhub_domain::command::{Command, CommandOrigin};
    use growhub_domain::error::GrowHubError;
    use growhub_domain::snapshot::StateSnapshot;
    use growhub_domain::time::{Timestamp, now};
    use std::sync::{Arc, Mutex};

    /// Keeps everything in memory.
    #[derive(Default)]
    pub(crate) struct InMemoryAuditLog {
        pub(crate) readings: Mutex<Vec<ReadingRecord>>,
        pub(crate) commands: Mutex<Vec<CommandRecord>>,
        pub(crate) events: Mutex<Vec<SystemEvent>>,
        pub(crate) failing: Mutex<bool>,
    }

    impl InMemoryAuditLog {
        fn check(&self) -> Result<(), GrowHubError> {
            if *self.failing.lock().unwrap() {
                return Err(GrowHubError::Storage("disk full".into()));
            }
            Ok(())
        }
    }

    impl AuditLog for InMemoryAuditLog {
        async fn record_reading(&self, record: ReadingRecord) -> Result<(), GrowHubError> {
            self.check()?;
            self.readings.lock().unwrap().push(record);
            Ok(())
        }

        async fn record_command(&self, record: CommandRecord) -> Result<(), GrowHubError> {
            self.check()?;
            self.commands.lock().unwrap().push(record);
            Ok(())
        }

        async fn record_event(&self, event: SystemEvent) -> Result<(), GrowHubError> {
            self.check()?;
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        async fn readings_since(
            &self,
            since: Timestamp,
        ) -> Result<Vec<ReadingRecord>, GrowHubError> {
            let mut found: Vec<_> = self
                .readings
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.recorded_at >= since)
                .copied()
                .collect();
            found.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
            Ok(found)
        }

        async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, GrowHubError> {
            let mut readings = self.readings.lock().unwrap();
            let before = readings.len();
            readings.retain(|r| r.recorded_at >= cutoff);
            Ok((before - readings.len()) as u64)
        }
    }

    /// Collects everything it is asked to publish.
    #[derive(Default)]
    pub(crate) struct RecordingPublisher {
        pub(crate) snapshots: Mutex<Vec<StateSnapshot>>,
        pub(crate) acks: Mutex<Vec<Acknowledgment>>,
        pub(crate) offline: Mutex<bool>,
    }

    impl StatePublisher for RecordingPublisher {
        async fn publish(&self, snapshot: StateSnapshot) -> Result<(), GrowHubError> {
            self.snapshots.lock().unwrap().push(snapshot);
            Ok(())
        }

        async fn acknowledge(&self, ack: Acknowledgment) -> Result<(), GrowHubError> {
            self.acks.lock().unwrap().push(ack);
            Ok(())
        }

        async fn mark_offline(&self) -> Result<(), GrowHubError> {
            *self.offline.lock().unwrap() = true;
            Ok(())
        }
    }

    fn ack() -> Acknowledgment {
        Acknowledgment {
            command_id: "cmd-1".parse().unwrap(),
            origin: CommandOrigin::Operator,
            node_id: None,
            success: true,
            message: "heater turned ON".to_string(),
            processed_at: now(),
        }
    }

    #[tokio::test]
    async fn should_route_entries_to_log_and_acks_to_publisher() {
        let log = Arc::new(InMemoryAuditLog::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let (queue, receiver) = outbound_queue(8);
        let writer = AuditWriter::new(receiver, Arc::clone(&log), Arc::clone(&publisher));

        let command = Command::operator(None, ActuatorId::Heater, true, now());
        queue.audit(CommandRecord::for_command(
            &command,
            CommandOutcome::Applied,
            now(),
        ));
        queue.audit(SystemEvent::new(SystemEventType::Startup, "started", now()));
        queue.acknowledge(ack());
        drop(queue);

        writer.run().await;

        assert_eq!(log.commands.lock().unwrap().len(), 1);
        assert_eq!(log.events.lock().unwrap().len(), 1);
        assert_eq!(publisher.acks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_keep_draining_after_storage_failure() {
        let log = Arc::new(InMemoryAuditLog::default());
        *log.failing.lock().unwrap() = true;
        let publisher = Arc::new(RecordingPublisher::default());
        let (queue, receiver) = outbound_queue(8);
        let writer = AuditWriter::new(receiver, Arc::clone(&log), Arc::clone(&publisher));

        queue.audit(SystemEvent::new(SystemEventType::Startup, "started", now()));
        queue.acknowledge(ack());
        drop(queue);

        writer.run().await;

        assert!(log.events.lock().unwrap().is_empty());
        assert_eq!(publisher.acks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_drop_messages_when_queue_is_full() {
        let (queue, mut receiver) = outbound_queue(1);
        queue.acknowledge(ack());
        queue.acknowledge(ack());
        drop(queue);

        let mut received = 0;
        while receiver.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 1);
    }
}
