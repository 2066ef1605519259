//! Inbound request bodies shared by every transport.
//!
//! Field names follow the camelCase API; the snake_case names used by the
//! companion firmware and older clients are accepted as aliases. Payloads are
//! deserialized permissively and then converted, so a missing field surfaces
//! as a [`ValidationError`] naming it rather than as a parser message.

use serde::Deserialize;

use crate::actuator::ActuatorId;
use crate::command::{Command, CompanionReport, RequestedAction, WaterState};
use crate::error::ValidationError;
use crate::id::CommandId;
use crate::threshold::ThresholdUpdate;
use crate::time::Timestamp;

/// A blank id counts as absent.
fn command_id(raw: Option<String>) -> Result<Option<CommandId>, ValidationError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw.parse().map(Some),
        _ => Ok(None),
    }
}

/// Operator request to switch one actuator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayControlPayload {
    #[serde(alias = "relay")]
    pub actuator: Option<String>,
    #[serde(alias = "state", alias = "desired_state")]
    pub desired_state: Option<bool>,
    #[serde(alias = "command_id")]
    pub command_id: Option<String>,
}

impl RelayControlPayload {
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a missing field or an unrecognised
    /// actuator name.
    pub fn into_command(self, issued_at: Timestamp) -> Result<Command, ValidationError> {
        let target: ActuatorId = self
            .actuator
            .ok_or(ValidationError::MissingField("actuator"))?
            .parse()?;
        let desired_state = self
            .desired_state
            .ok_or(ValidationError::MissingField("desiredState"))?;
        Ok(Command::operator(
            command_id(self.command_id)?,
            target,
            desired_state,
            issued_at,
        ))
    }
}

/// Water-level report from the companion node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionPayload {
    #[serde(alias = "command_id")]
    pub command_id: Option<String>,
    #[serde(alias = "node_id")]
    pub node_id: Option<String>,
    #[serde(alias = "water_state")]
    pub water_state: Option<String>,
    #[serde(alias = "pump_command")]
    pub requested_action: Option<String>,
    #[serde(alias = "min_sensor")]
    pub min_sensor: Option<f64>,
    #[serde(alias = "max_sensor")]
    pub max_sensor: Option<f64>,
}

impl CompanionPayload {
    /// A missing action means no pump request; a missing water state is
    /// [`WaterState::Unknown`]. `node_id` fills in when the body names none.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidField`] for an unparseable action.
    pub fn into_report(
        self,
        node_id: Option<&str>,
        received_at: Timestamp,
    ) -> Result<CompanionReport, ValidationError> {
        let action = match self.requested_action.as_deref() {
            Some(raw) => raw.parse()?,
            None => RequestedAction::None,
        };
        let mut builder = CompanionReport::builder()
            .water_state(
                self.water_state
                    .as_deref()
                    .map_or(WaterState::Unknown, WaterState::parse_lenient),
            )
            .requested_action(action)
            .received_at(received_at);
        if let Some(id) = command_id(self.command_id)? {
            builder = builder.id(id);
        }
        if let Some(node) = self.node_id.as_deref().or(node_id) {
            builder = builder.node_id(node);
        }
        if let Some(value) = self.min_sensor {
            builder = builder.min_sensor(value);
        }
        if let Some(value) = self.max_sensor {
            builder = builder.max_sensor(value);
        }
        builder.build()
    }
}

/// One quantity's bounds inside a [`ThresholdPayload`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsPayload {
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
}

/// Partial threshold change, nested or in the legacy flat form.
///
/// When both forms name the same bound the nested one wins.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ThresholdPayload {
    pub temperature: Option<BoundsPayload>,
    pub humidity: Option<BoundsPayload>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_max: Option<f64>,
}

impl ThresholdPayload {
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when no bound is given.
    pub fn into_update(self) -> Result<ThresholdUpdate, ValidationError> {
        let temperature = self.temperature.unwrap_or_default();
        let humidity = self.humidity.unwrap_or_default();
        let update = ThresholdUpdate {
            temperature_lower: temperature.lower_bound.or(self.temp_min),
            temperature_upper: temperature.upper_bound.or(self.temp_max),
            humidity_lower: humidity.lower_bound.or(self.humidity_min),
            humidity_upper: humidity.upper_bound.or(self.humidity_max),
        };
        if update.is_empty() {
            return Err(ValidationError::MissingField("thresholds"));
        }
        Ok(update)
    }
}
