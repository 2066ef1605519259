//! Periodic activities that run beside the control loop.
//!
//! Sampling, evaluation, publication, reading log and retention each run as
//! their own tokio task on their own interval. They reach control state only
//! through the [`ControlHandle`], and stop at the next tick boundary once the
//! cancellation token fires.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::TimeDelta;
use growhub_domain::audit::{ReadingRecord, SystemEvent, SystemEventType};
use growhub_domain::error::GrowHubError;
use growhub_domain::snapshot::StateSnapshot;
use growhub_domain::time::now;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::control::ControlHandle;
use crate::ports::{AuditLog, SensorDriver, StatePublisher};

/// Cadence of every periodic activity.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub sample_interval: Duration,
    pub evaluate_interval: Duration,
    pub publish_interval: Duration,
    /// Upper bound for a single publication attempt.
    pub publish_timeout: Duration,
    pub log_interval: Duration,
    pub purge_interval: Duration,
    pub retention: TimeDelta,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(10),
            evaluate_interval: Duration::from_secs(5),
            publish_interval: Duration::from_secs(5),
            publish_timeout: Duration::from_secs(3),
            log_interval: Duration::from_secs(60),
            purge_interval: Duration::from_secs(3600),
            retention: TimeDelta::days(30),
        }
    }
}

/// Snapshot-driven synchronisation with the outside world.
///
/// Never mutates control state except by handing fresh readings to the
/// control loop.
pub struct SyncScheduler<S, P, L> {
    handle: ControlHandle,
    sensor: Arc<S>,
    publisher: Arc<P>,
    log: Arc<L>,
    config: SchedulerConfig,
    cancel: CancellationToken,
    sensor_failing: AtomicBool,
}

impl<S, P, L> SyncScheduler<S, P, L>
where
    S: SensorDriver + Send + Sync + 'static,
    P: StatePublisher + Send + Sync + 'static,
    L: AuditLog + Send + Sync + 'static,
{
    pub fn new(
        handle: ControlHandle,
        sensor: Arc<S>,
        publisher: Arc<P>,
        log: Arc<L>,
        config: SchedulerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            handle,
            sensor,
            publisher,
            log,
            config,
            cancel,
            sensor_failing: AtomicBool::new(false),
        }
    }

    /// A consistent view of the control state, taken by the control loop.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::ControlLoopClosed`] once the loop has stopped.
    pub async fn snapshot(&self) -> Result<StateSnapshot, GrowHubError> {
        self.handle.snapshot().await
    }

    /// Spawn every periodic activity.
    #[must_use]
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        let this = Arc::new(self);
        vec![
            this.spawn_every(this.config.sample_interval, "sampling", |s| s.sample_once()),
            this.spawn_every(this.config.evaluate_interval, "evaluation", |s| {
                s.evaluate_once()
            }),
            this.spawn_every(this.config.publish_interval, "publication", |s| {
                s.publish_once()
            }),
            this.spawn_every(this.config.log_interval, "reading log", |s| s.log_once()),
            this.spawn_every(this.config.purge_interval, "retention", |s| s.purge_once()),
        ]
    }

    fn spawn_every<F, Fut>(
        self: &Arc<Self>,
        period: Duration,
        name: &'static str,
        tick: F,
    ) -> JoinHandle<()>
    where
        F: Fn(Arc<Self>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let this = Arc::clone(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(task = name, ?period, "periodic task started");
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => tick(Arc::clone(&this)).await,
                }
            }
            tracing::debug!(task = name, "periodic task stopped");
        })
    }

    /// Read the sensor and hand the reading to the control loop.
    ///
    /// A failure keeps the previous reading. Only the first failure of a
    /// streak is written to the audit log.
    pub async fn sample_once(self: Arc<Self>) {
        match self.sensor.read().await {
            Ok(reading) => {
                tracing::debug!(
                    temperature = reading.temperature,
                    humidity = reading.humidity,
                    "sensor sampled"
                );
                self.sensor_recovered();
                if let Err(err) = self.handle.publish_reading(reading).await {
                    tracing::debug!(error = %err, "reading not delivered");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "sensor unavailable, keeping previous reading");
                if self.sensor_failed() {
                    let event = SystemEvent::new(
                        SystemEventType::SensorFailure,
                        format!("sensor read failed: {err}"),
                        now(),
                    );
                    if let Err(err) = self.log.record_event(event).await {
                        tracing::warn!(error = %err, "could not record sensor failure");
                    }
                }
            }
        }
    }

    /// Ask the control loop for one automatic evaluation.
    pub async fn evaluate_once(self: Arc<Self>) {
        match self.handle.evaluate().await {
            Ok(outcomes) if !outcomes.is_empty() => {
                tracing::debug!(count = outcomes.len(), "automatic commands applied");
            }
            Ok(_) => {}
            Err(err) => tracing::debug!(error = %err, "evaluation skipped"),
        }
    }

    /// Push the latest snapshot outward, bounded by the publish timeout.
    pub async fn publish_once(self: Arc<Self>) {
        let snapshot = match self.handle.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::debug!(error = %err, "publication skipped");
                return;
            }
        };
        match tokio::time::timeout(self.config.publish_timeout, self.publisher.publish(snapshot))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "state publication failed"),
            Err(_) => tracing::warn!(
                timeout = ?self.config.publish_timeout,
                "state publication timed out"
            ),
        }
    }

    /// Persist the current reading with the actuator states.
    pub async fn log_once(self: Arc<Self>) {
        let Ok(snapshot) = self.handle.snapshot().await else {
            return;
        };
        let Some(record) = ReadingRecord::from_snapshot(&snapshot) else {
            tracing::debug!("no reading to log yet");
            return;
        };
        if let Err(err) = self.log.record_reading(record).await {
            tracing::warn!(error = %err, "could not log reading");
        }
    }

    /// Drop audit records older than the retention period.
    pub async fn purge_once(self: Arc<Self>) {
        let cutoff = now() - self.config.retention;
        match self.log.purge_before(cutoff).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, %cutoff, "old audit records purged"),
            Err(err) => tracing::warn!(error = %err, "retention purge failed"),
        }
    }

    fn sensor_failed(&self) -> bool {
        !self.sensor_failing.swap(true, Ordering::Relaxed)
    }

    fn sensor_recovered(&self) {
        if self.sensor_failing.swap(false, Ordering::Relaxed) {
            tracing::info!("sensor recovered");
        }
    }
}
