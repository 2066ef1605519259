//! Append-only audit records.
//!
//! Once written these are never updated, only purged by retention.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actuator::{ActuatorId, ActuatorStates};
use crate::command::{
    Command, CommandOrigin, CompanionReport, RequestedAction, SubmitOutcome, WaterState,
};
use crate::id::{CommandId, CommandRecordId, ReadingRecordId, SystemEventId};
use crate::snapshot::StateSnapshot;
use crate::time::Timestamp;

/// A logged sensor sample together with the actuator states at that time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub id: ReadingRecordId,
    pub recorded_at: Timestamp,
    pub temperature: f64,
    pub humidity: f64,
    pub actuators: ActuatorStates,
}

impl ReadingRecord {
    /// Build a record from a snapshot. `None` until a first reading exists.
    #[must_use]
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Option<Self> {
        snapshot.reading.map(|reading| Self {
            id: ReadingRecordId::new(),
            recorded_at: snapshot.taken_at,
            temperature: reading.temperature,
            humidity: reading.humidity,
            actuators: snapshot.actuators,
        })
    }
}

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    Applied,
    Unchanged,
    Recorded,
    Rejected,
    Failed,
}

impl CommandOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Unchanged => "unchanged",
            Self::Recorded => "recorded",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&SubmitOutcome> for CommandOutcome {
    fn from(outcome: &SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Processed(applied) if applied.changed => Self::Applied,
            SubmitOutcome::Processed(_) | SubmitOutcome::DuplicateIgnored => Self::Unchanged,
            SubmitOutcome::Recorded => Self::Recorded,
            SubmitOutcome::InvalidTarget(_) => Self::Rejected,
        }
    }
}

/// A logged command, from any origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: CommandRecordId,
    pub command_id: CommandId,
    pub origin: CommandOrigin,
    pub target: Option<ActuatorId>,
    pub action: RequestedAction,
    pub water_state: Option<WaterState>,
    pub min_sensor: Option<f64>,
    pub max_sensor: Option<f64>,
    pub outcome: CommandOutcome,
    pub recorded_at: Timestamp,
}

impl CommandRecord {
    #[must_use]
    pub fn for_command(command: &Command, outcome: CommandOutcome, recorded_at: Timestamp) -> Self {
        Self {
            id: CommandRecordId::new(),
            command_id: command.id.clone(),
            origin: command.origin,
            target: Some(command.target),
            action: RequestedAction::from_desired_state(command.desired_state),
            water_state: None,
            min_sensor: None,
            max_sensor: None,
            outcome,
            recorded_at,
        }
    }

    /// `target` is `None` for reports that asked for no pump action.
    #[must_use]
    pub fn for_report(
        report: &CompanionReport,
        target: Option<ActuatorId>,
        outcome: CommandOutcome,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            id: CommandRecordId::new(),
            command_id: report.id.clone(),
            origin: CommandOrigin::CompanionNode,
            target,
            action: report.requested_action,
            water_state: Some(report.water_state),
            min_sensor: report.min_sensor,
            max_sensor: report.max_sensor,
            outcome,
            recorded_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemEventType {
    Startup,
    Shutdown,
    RelayControl,
    ThresholdsUpdated,
    SensorFailure,
}

impl SystemEventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::RelayControl => "relay_control",
            Self::ThresholdsUpdated => "thresholds_updated",
            Self::SensorFailure => "sensor_failure",
        }
    }
}

impl fmt::Display for SystemEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form lifecycle or operational event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    pub id: SystemEventId,
    pub event_type: SystemEventType,
    pub description: String,
    pub data: Option<serde_json::Value>,
    pub recorded_at: Timestamp,
}

impl SystemEvent {
    #[must_use]
    pub fn new(
        event_type: SystemEventType,
        description: impl Into<String>,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            id: SystemEventId::new(),
            event_type,
            description: description.into(),
            data: None,
            recorded_at,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Everything the dispatcher hands to the audit log.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEntry {
    Reading(ReadingRecord),
    Command(CommandRecord),
    Event(SystemEvent),
}

impl From<ReadingRecord> for AuditEntry {
    fn from(value: ReadingRecord) -> Self {
        Self::Reading(value)
    }
}

impl From<CommandRecord> for AuditEntry {
    fn from(value: CommandRecord) -> Self {
        Self::Command(value)
    }
}

impl From<SystemEvent> for AuditEntry {
    fn from(value: SystemEvent) -> Self {
        Self::Event(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Applied;
    use crate::reading::SensorReading;
    use crate::snapshot::CompanionStatus;
    use crate::threshold::Thresholds;
    use crate::time::now;

    #[test]
    fn should_skip_reading_record_without_reading() {
        let snapshot = StateSnapshot {
            reading: None,
            actuators: ActuatorStates::default(),
            thresholds: Thresholds::default(),
            companion: CompanionStatus {
                last_contact_at: None,
                live: false,
            },
            taken_at: now(),
        };
        assert!(ReadingRecord::from_snapshot(&snapshot).is_none());

        let with_reading = StateSnapshot {
            reading: Some(SensorReading::new(26.0, 70.0, now())),
            ..snapshot
        };
        let record = ReadingRecord::from_snapshot(&with_reading).unwrap();
        assert!((record.temperature - 26.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_classify_submit_outcomes() {
        let changed = SubmitOutcome::Processed(Applied {
            target: ActuatorId::Heater,
            engaged: true,
            changed: true,
        });
        let same = SubmitOutcome::Processed(Applied {
            target: ActuatorId::Heater,
            engaged: true,
            changed: false,
        });
        assert_eq!(CommandOutcome::from(&changed), CommandOutcome::Applied);
        assert_eq!(CommandOutcome::from(&same), CommandOutcome::Unchanged);
        assert_eq!(
            CommandOutcome::from(&SubmitOutcome::InvalidTarget(ActuatorId::Heater)),
            CommandOutcome::Rejected
        );
    }

    #[test]
    fn should_record_water_state_for_companion_report() {
        let report = CompanionReport::builder()
            .water_state(WaterState::Low)
            .requested_action(RequestedAction::None)
            .min_sensor(1.0)
            .build()
            .unwrap();
        let record = CommandRecord::for_report(&report, None, CommandOutcome::Recorded, now());
        assert_eq!(record.water_state, Some(WaterState::Low));
        assert_eq!(record.target, None);
        assert_eq!(record.min_sensor, Some(1.0));
    }

    #[test]
    fn should_attach_payload_to_system_event() {
        let event = SystemEvent::new(SystemEventType::Startup, "controller started", now())
            .with_data(serde_json::json!({"version": "0.1.0"}));
        assert_eq!(event.data.unwrap()["version"], "0.1.0");
    }
}
