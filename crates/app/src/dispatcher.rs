//! Command dispatcher — arbitration of every actuator change.
//!
//! The dispatcher is the one place where automatic, operator and companion
//! requests meet. It owns the [`ActuatorController`], the
//! [`ConnectivityMonitor`], the latest reading and the threshold set, so all
//! of them are mutated by a single caller: the control loop.

use chrono::TimeDelta;
use growhub_domain::actuator::ActuatorId;
use growhub_domain::audit::{CommandOutcome, CommandRecord, SystemEvent, SystemEventType};
use growhub_domain::command::{
    Acknowledgment, ApplyOutcome, Command, CommandOrigin, CompanionReport, Submission,
    SubmitOutcome,
};
use growhub_domain::error::{GrowHubError, ValidationError};
use growhub_domain::reading::SensorReading;
use growhub_domain::snapshot::StateSnapshot;
use growhub_domain::threshold::{ThresholdUpdate, Thresholds};
use growhub_domain::time::Timestamp;

use crate::audit_writer::OutboundQueue;
use crate::connectivity::{ConnectivityMonitor, DEFAULT_CONTACT_TIMEOUT};
use crate::controller::ActuatorController;
use crate::dedup::{self, RecentCommands};
use crate::ports::OutputDriver;

/// Tunables of the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Actuator driven by companion pump requests.
    pub companion_target: ActuatorId,
    pub contact_timeout: TimeDelta,
    pub dedup_window: TimeDelta,
    pub dedup_capacity: usize,
    pub thresholds: Thresholds,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            companion_target: ActuatorId::AuxiliaryPump,
            contact_timeout: DEFAULT_CONTACT_TIMEOUT,
            dedup_window: dedup::DEFAULT_WINDOW,
            dedup_capacity: dedup::DEFAULT_CAPACITY,
            thresholds: Thresholds::default(),
        }
    }
}

pub struct CommandDispatcher<O> {
    controller: ActuatorController<O>,
    connectivity: ConnectivityMonitor,
    recent: RecentCommands,
    reading: Option<SensorReading>,
    thresholds: Thresholds,
    companion_target: ActuatorId,
    outbound: OutboundQueue,
}

impl<O: OutputDriver> CommandDispatcher<O> {
    pub fn new(
        controller: ActuatorController<O>,
        config: DispatcherConfig,
        outbound: OutboundQueue,
    ) -> Self {
        Self {
            controller,
            connectivity: ConnectivityMonitor::new(config.contact_timeout),
            recent: RecentCommands::new(config.dedup_window, config.dedup_capacity),
            reading: None,
            thresholds: config.thresholds,
            companion_target: config.companion_target,
            outbound,
        }
    }

    /// Put every line in its released state and record the startup.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::Output`] when a line cannot be initialised.
    pub fn initialize(&mut self, now: Timestamp) -> Result<(), GrowHubError> {
        self.controller.initialize()?;
        self.outbound.audit(
            SystemEvent::new(SystemEventType::Startup, "controller started", now).with_data(
                serde_json::json!({
                    "thresholds": self.thresholds,
                    "companion_target": self.companion_target,
                }),
            ),
        );
        Ok(())
    }

    /// Disengage every actuator and record the shutdown.
    pub fn shutdown(&mut self, now: Timestamp) {
        if let Err(err) = self.controller.disengage_all() {
            tracing::error!(error = %err, "could not disengage every actuator on shutdown");
        }
        self.outbound.audit(SystemEvent::new(
            SystemEventType::Shutdown,
            "controller stopped, actuators disengaged",
            now,
        ));
    }

    /// Replace the latest reading wholesale.
    pub fn update_reading(&mut self, reading: SensorReading) {
        self.reading = Some(reading);
    }

    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Apply a partial threshold change. Nothing changes if the result is
    /// invalid.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] of the resulting set.
    pub fn update_thresholds(
        &mut self,
        update: &ThresholdUpdate,
        now: Timestamp,
    ) -> Result<Thresholds, ValidationError> {
        let next = self.thresholds.apply(update)?;
        let previous = std::mem::replace(&mut self.thresholds, next);
        tracing::info!(?previous, current = ?next, "thresholds updated");
        self.outbound.audit(
            SystemEvent::new(SystemEventType::ThresholdsUpdated, "thresholds updated", now)
                .with_data(serde_json::json!({ "previous": previous, "current": next })),
        );
        Ok(next)
    }

    /// A consistent view of everything this dispatcher owns.
    #[must_use]
    pub fn snapshot(&self, now: Timestamp) -> StateSnapshot {
        StateSnapshot {
            reading: self.reading,
            actuators: self.controller.states(),
            thresholds: self.thresholds,
            companion: self.connectivity.status(now),
            taken_at: now,
        }
    }

    /// Run the hysteresis rule against the latest reading and submit what it
    /// asks for. Nothing happens before the first reading.
    pub fn evaluate(&mut self, now: Timestamp) -> Vec<SubmitOutcome> {
        let Some(reading) = self.reading else {
            tracing::debug!("no reading yet, skipping evaluation");
            return Vec::new();
        };
        let commands = self.controller.evaluate(&reading, &self.thresholds, now);
        let mut outcomes = Vec::with_capacity(commands.len());
        for command in commands {
            match self.submit(command.into(), now) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    tracing::warn!(error = %err, "automatic command failed");
                }
            }
        }
        outcomes
    }

    /// Process one submission.
    ///
    /// External submissions whose id was seen from the same origin within the
    /// dedup window return [`SubmitOutcome::DuplicateIgnored`] with no effect
    /// beyond a fresh acknowledgment. A duplicate companion report still counts
    /// as contact from the node.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::Output`] when the output driver fails.
    pub fn submit(
        &mut self,
        submission: Submission,
        now: Timestamp,
    ) -> Result<SubmitOutcome, GrowHubError> {
        let origin = submission.origin();
        if origin.is_external() && self.recent.contains(origin, submission.id(), now) {
            tracing::debug!(command_id = %submission.id(), %origin, "duplicate command ignored");
            if let Submission::Companion(_) = &submission {
                self.connectivity.record_contact(now);
            }
            let outcome = SubmitOutcome::DuplicateIgnored;
            self.acknowledge(&submission, &outcome, now);
            return Ok(outcome);
        }

        let result = match &submission {
            Submission::Command(command) => self.submit_command(command, now),
            Submission::Companion(report) => self.submit_report(report, now),
        };

        match &result {
            Ok(outcome) => {
                if origin.is_external() && outcome.is_success() {
                    self.recent.insert(origin, submission.id().clone(), now);
                }
                self.acknowledge(&submission, outcome, now);
            }
            Err(err) if origin.is_external() => {
                self.acknowledge_failure(&submission, err, now);
            }
            Err(_) => {}
        }
        result
    }

    fn submit_command(
        &mut self,
        command: &Command,
        now: Timestamp,
    ) -> Result<SubmitOutcome, GrowHubError> {
        let outcome = self.apply(command, now)?;
        self.outbound.audit(CommandRecord::for_command(
            command,
            CommandOutcome::from(&outcome),
            now,
        ));
        if let (CommandOrigin::Operator, SubmitOutcome::Processed(applied)) =
            (command.origin, &outcome)
        {
            self.outbound.audit(
                SystemEvent::new(
                    SystemEventType::RelayControl,
                    format!(
                        "{} set {} by operator",
                        applied.target,
                        if applied.engaged { "ON" } else { "OFF" }
                    ),
                    now,
                )
                .with_data(serde_json::json!({
                    "command_id": command.id,
                    "actuator": applied.target,
                    "engaged": applied.engaged,
                })),
            );
        }
        Ok(outcome)
    }

    fn submit_report(
        &mut self,
        report: &CompanionReport,
        now: Timestamp,
    ) -> Result<SubmitOutcome, GrowHubError> {
        self.connectivity.record_contact(now);
        tracing::debug!(
            command_id = %report.id,
            node_id = report.node_id.as_deref().unwrap_or("-"),
            water_state = %report.water_state,
            action = %report.requested_action,
            "companion report received"
        );

        let Some(command) = report.to_command(self.companion_target) else {
            self.outbound.audit(CommandRecord::for_report(
                report,
                None,
                CommandOutcome::Recorded,
                now,
            ));
            return Ok(SubmitOutcome::Recorded);
        };

        let outcome = self.apply(&command, now).inspect_err(|_| {
            self.outbound.audit(CommandRecord::for_report(
                report,
                Some(command.target),
                CommandOutcome::Failed,
                now,
            ));
        })?;
        self.outbound.audit(CommandRecord::for_report(
            report,
            Some(command.target),
            CommandOutcome::from(&outcome),
            now,
        ));
        Ok(outcome)
    }

    fn apply(&mut self, command: &Command, now: Timestamp) -> Result<SubmitOutcome, GrowHubError> {
        match self.controller.apply(command) {
            Ok(ApplyOutcome::Applied(applied)) => Ok(SubmitOutcome::Processed(applied)),
            Ok(ApplyOutcome::Rejected(err)) => {
                tracing::warn!(command_id = %command.id, error = %err, "command rejected");
                Ok(SubmitOutcome::InvalidTarget(err.actuator))
            }
            Err(err) => {
                if command.origin != CommandOrigin::CompanionNode {
                    self.outbound.audit(CommandRecord::for_command(
                        command,
                        CommandOutcome::Failed,
                        now,
                    ));
                }
                Err(err)
            }
        }
    }

    fn acknowledge(&self, submission: &Submission, outcome: &SubmitOutcome, now: Timestamp) {
        if !submission.origin().is_external() {
            return;
        }
        self.outbound.acknowledge(Acknowledgment {
            command_id: submission.id().clone(),
            origin: submission.origin(),
            node_id: node_id(submission),
            success: outcome.is_success(),
            message: outcome.message(),
            processed_at: now,
        });
    }

    fn acknowledge_failure(&self, submission: &Submission, err: &GrowHubError, now: Timestamp) {
        self.outbound.acknowledge(Acknowledgment {
            command_id: submission.id().clone(),
            origin: submission.origin(),
            node_id: node_id(submission),
            success: false,
            message: err.to_string(),
            processed_at: now,
        });
    }

    /// Hand the controller back, for releasing the driver.
    pub fn into_controller(self) -> ActuatorController<O> {
        self.controller
    }
}

fn node_id(submission: &Submission) -> Option<String> {
    match submission {
        Submission::Companion(report) => report.node_id.clone(),
        Submission::Command(_) => None,
    }
}
