//! Point-in-time views of the whole control state.

use serde::Serialize;

use crate::actuator::ActuatorStates;
use crate::reading::SensorReading;
use crate::threshold::Thresholds;
use crate::time::Timestamp;

/// Liveness of the companion node as seen at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompanionStatus {
    pub last_contact_at: Option<Timestamp>,
    pub live: bool,
}

/// A consistent read of reading, actuators, thresholds and connectivity.
///
/// Has no identity of its own; it is only meaningful at `taken_at`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub reading: Option<SensorReading>,
    pub actuators: ActuatorStates,
    pub thresholds: Thresholds,
    pub companion: CompanionStatus,
    pub taken_at: Timestamp,
}

/// The published status document.
///
/// Served by `GET /status` and mirrored to the realtime transport, so both
/// share one wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct StatusDocument {
    pub sensor: Option<SensorDocument>,
    pub actuators: ActuatorStates,
    pub thresholds: Thresholds,
    pub companion: CompanionDocument,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorDocument {
    pub temperature: f64,
    pub humidity: f64,
    pub last_reading_time: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionDocument {
    pub last_contact_time: Option<Timestamp>,
    pub live: bool,
}

impl From<&StateSnapshot> for StatusDocument {
    fn from(snapshot: &StateSnapshot) -> Self {
        Self {
            sensor: snapshot.reading.map(|reading| SensorDocument {
                temperature: reading.temperature,
                humidity: reading.humidity,
                last_reading_time: reading.observed_at,
            }),
            actuators: snapshot.actuators,
            thresholds: snapshot.thresholds,
            companion: CompanionDocument {
                last_contact_time: snapshot.companion.last_contact_at,
                live: snapshot.companion.live,
            },
            timestamp: snapshot.taken_at,
        }
    }
}
