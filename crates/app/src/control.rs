//! The control loop — single owner of all mutable control state.
//!
//! Every mutation and every snapshot travels as a [`ControlMessage`] on one
//! mpsc channel and is handled one at a time by [`ControlLoop::run`]. Callers
//! hold a cheap, cloneable [`ControlHandle`].

use growhub_domain::command::{Submission, SubmitOutcome};
use growhub_domain::error::{GrowHubError, ValidationError};
use growhub_domain::reading::SensorReading;
use growhub_domain::snapshot::StateSnapshot;
use growhub_domain::threshold::{ThresholdUpdate, Thresholds};
use growhub_domain::time::now;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::controller::ActuatorController;
use crate::dispatcher::CommandDispatcher;
use crate::ports::OutputDriver;

/// Default depth of the control channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

enum ControlMessage {
    Submit {
        submission: Submission,
        reply: oneshot::Sender<Result<SubmitOutcome, GrowHubError>>,
    },
    Evaluate {
        reply: oneshot::Sender<Vec<SubmitOutcome>>,
    },
    Reading(SensorReading),
    UpdateThresholds {
        update: ThresholdUpdate,
        reply: oneshot::Sender<Result<Thresholds, ValidationError>>,
    },
    Snapshot {
        reply: oneshot::Sender<StateSnapshot>,
    },
}

/// Client side of the control loop.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    sender: mpsc::Sender<ControlMessage>,
}

impl std::fmt::Debug for ControlMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Submit { .. } => "Submit",
            Self::Evaluate { .. } => "Evaluate",
            Self::Reading(_) => "Reading",
            Self::UpdateThresholds { .. } => "UpdateThresholds",
            Self::Snapshot { .. } => "Snapshot",
        };
        f.write_str(name)
    }
}

impl ControlHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ControlMessage,
    ) -> Result<T, GrowHubError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| GrowHubError::ControlLoopClosed)?;
        response.await.map_err(|_| GrowHubError::ControlLoopClosed)
    }

    /// Submit a command or a companion report and wait for its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::ControlLoopClosed`] once the loop has stopped,
    /// or the dispatcher's own error.
    pub async fn submit(
        &self,
        submission: impl Into<Submission>,
    ) -> Result<SubmitOutcome, GrowHubError> {
        let submission = submission.into();
        self.request(|reply| ControlMessage::Submit { submission, reply })
            .await?
    }

    /// Run one automatic evaluation cycle.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::ControlLoopClosed`] once the loop has stopped.
    pub async fn evaluate(&self) -> Result<Vec<SubmitOutcome>, GrowHubError> {
        self.request(|reply| ControlMessage::Evaluate { reply }).await
    }

    /// Replace the latest reading.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::ControlLoopClosed`] once the loop has stopped.
    pub async fn publish_reading(&self, reading: SensorReading) -> Result<(), GrowHubError> {
        self.sender
            .send(ControlMessage::Reading(reading))
            .await
            .map_err(|_| GrowHubError::ControlLoopClosed)
    }

    /// Apply a partial threshold change and return the resulting set.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::Validation`] when the result is invalid, or
    /// [`GrowHubError::ControlLoopClosed`].
    pub async fn update_thresholds(
        &self,
        update: ThresholdUpdate,
    ) -> Result<Thresholds, GrowHubError> {
        Ok(self
            .request(|reply| ControlMessage::UpdateThresholds { update, reply })
            .await??)
    }

    /// Take a consistent snapshot of the whole control state.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::ControlLoopClosed`] once the loop has stopped.
    pub async fn snapshot(&self) -> Result<StateSnapshot, GrowHubError> {
        self.request(|reply| ControlMessage::Snapshot { reply }).await
    }
}

/// Server side of the control loop.
pub struct ControlLoop<O> {
    dispatcher: CommandDispatcher<O>,
    receiver: mpsc::Receiver<ControlMessage>,
    cancel: CancellationToken,
}

/// Wrap `dispatcher` in a control loop stopped by `cancel`.
pub fn control_loop<O: OutputDriver>(
    dispatcher: CommandDispatcher<O>,
    capacity: usize,
    cancel: CancellationToken,
) -> (ControlHandle, ControlLoop<O>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        ControlHandle { sender },
        ControlLoop {
            dispatcher,
            receiver,
            cancel,
        },
    )
}

impl<O: OutputDriver> ControlLoop<O> {
    /// Process messages until cancelled or until every handle is dropped,
    /// then disengage every actuator.
    ///
    /// Returns the controller so the caller can release the output driver
    /// once nothing can drive it anymore.
    pub async fn run(mut self) -> ActuatorController<O> {
        tracing::info!("control loop started");
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                message = self.receiver.recv() => match message {
                    Some(message) => self.handle(message),
                    None => break,
                },
            }
        }
        self.receiver.close();
        self.dispatcher.shutdown(now());
        tracing::info!("control loop stopped");
        self.dispatcher.into_controller()
    }

    fn handle(&mut self, message: ControlMessage) {
        let at = now();
        match message {
            ControlMessage::Submit { submission, reply } => {
                let _ = reply.send(self.dispatcher.submit(submission, at));
            }
            ControlMessage::Evaluate { reply } => {
                let _ = reply.send(self.dispatcher.evaluate(at));
            }
            ControlMessage::Reading(reading) => self.dispatcher.update_reading(reading),
            ControlMessage::UpdateThresholds { update, reply } => {
                let _ = reply.send(self.dispatcher.update_thresholds(&update, at));
            }
            ControlMessage::Snapshot { reply } => {
                let _ = reply.send(self.dispatcher.snapshot(at));
            }
        }
    }
}
