//! Actuators — the closed set of on/off outputs and their physical lines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{UnknownActuatorError, ValidationError};

/// Identity of every actuator the enclosure can drive.
///
/// Adding or removing an actuator is a change to this enum, never a string
/// lookup deep in the control path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorId {
    Heater,
    Humidifier,
    /// The mains water pump, driven by the operator only.
    PrimaryPump,
    /// The aquarium pump, driven by the companion water-level node.
    AuxiliaryPump,
}

impl ActuatorId {
    /// Every actuator, in output-table order.
    pub const ALL: [Self; 4] = [
        Self::Heater,
        Self::Humidifier,
        Self::PrimaryPump,
        Self::AuxiliaryPump,
    ];

    /// Canonical wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heater => "heater",
            Self::Humidifier => "humidifier",
            Self::PrimaryPump => "primary_pump",
            Self::AuxiliaryPump => "auxiliary_pump",
        }
    }

    /// Whether the automatic evaluator ever drives this actuator.
    #[must_use]
    pub fn is_automatic(self) -> bool {
        matches!(self, Self::Heater | Self::Humidifier)
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActuatorId {
    type Err = ValidationError;

    /// Accepts canonical names plus the relay-board names used by older
    /// clients (`WATER_PUMP`, `AQUARIUM_PUMP`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heater" => Ok(Self::Heater),
            "humidifier" => Ok(Self::Humidifier),
            "primary_pump" | "water_pump" => Ok(Self::PrimaryPump),
            "auxiliary_pump" | "aquarium_pump" => Ok(Self::AuxiliaryPump),
            _ => Err(ValidationError::UnrecognisedActuator(s.to_owned())),
        }
    }
}

/// Logical on/off state of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub id: ActuatorId,
    pub engaged: bool,
}

/// The engaged flag of every actuator, serialized as a name → bool map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorStates {
    pub heater: bool,
    pub humidifier: bool,
    pub primary_pump: bool,
    pub auxiliary_pump: bool,
}

impl ActuatorStates {
    /// Whether `id` is currently engaged.
    #[must_use]
    pub fn is_engaged(&self, id: ActuatorId) -> bool {
        match id {
            ActuatorId::Heater => self.heater,
            ActuatorId::Humidifier => self.humidifier,
            ActuatorId::PrimaryPump => self.primary_pump,
            ActuatorId::AuxiliaryPump => self.auxiliary_pump,
        }
    }

    pub fn set(&mut self, id: ActuatorId, engaged: bool) {
        let slot = match id {
            ActuatorId::Heater => &mut self.heater,
            ActuatorId::Humidifier => &mut self.humidifier,
            ActuatorId::PrimaryPump => &mut self.primary_pump,
            ActuatorId::AuxiliaryPump => &mut self.auxiliary_pump,
        };
        *slot = engaged;
    }

    /// Per-actuator view, in [`ActuatorId::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = ActuatorState> + '_ {
        ActuatorId::ALL.into_iter().map(|id| ActuatorState {
            id,
            engaged: self.is_engaged(id),
        })
    }
}

/// Electrical level of a digital output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
    Low,
    High,
}

/// A physical digital-output line (BCM pin number plus polarity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub pin: u8,
    /// Relay boards that close on LOW are active-low.
    pub active_low: bool,
}

impl OutputLine {
    /// Level to drive so the relay is engaged (`true`) or released.
    #[must_use]
    pub fn level_for(self, engaged: bool) -> OutputLevel {
        if engaged == self.active_low {
            OutputLevel::Low
        } else {
            OutputLevel::High
        }
    }
}

/// Static mapping of actuators to output lines.
///
/// An actuator without a pin is known to the domain but physically absent;
/// commands for it are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub heater: Option<u8>,
    pub humidifier: Option<u8>,
    pub primary_pump: Option<u8>,
    pub auxiliary_pump: Option<u8>,
    pub active_low: bool,
}

impl Default for PinMap {
    /// Four-channel relay board wiring.
    fn default() -> Self {
        Self {
            heater: Some(21),
            humidifier: Some(18),
            primary_pump: Some(19),
            auxiliary_pump: Some(20),
            active_low: true,
        }
    }
}

impl PinMap {
    /// Output line of `id`, if one is wired.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownActuatorError`] when `id` has no pin.
    pub fn line(&self, id: ActuatorId) -> Result<OutputLine, UnknownActuatorError> {
        let pin = match id {
            ActuatorId::Heater => self.heater,
            ActuatorId::Humidifier => self.humidifier,
            ActuatorId::PrimaryPump => self.primary_pump,
            ActuatorId::AuxiliaryPump => self.auxiliary_pump,
        };
        pin.map(|pin| OutputLine {
            pin,
            active_low: self.active_low,
        })
        .ok_or(UnknownActuatorError { actuator: id })
    }

    /// Check that no two actuators share a pin.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidField`] naming the duplicated pin.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = Vec::with_capacity(ActuatorId::ALL.len());
        for id in ActuatorId::ALL {
            if let Ok(line) = self.line(id) {
                if seen.contains(&line.pin) {
                    return Err(ValidationError::InvalidField {
                        field: "outputs",
                        value: format!("pin {} is assigned twice", line.pin),
                    });
                }
                seen.push(line.pin);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_canonical_and_legacy_names() {
        assert_eq!("heater".parse::<ActuatorId>(), Ok(ActuatorId::Heater));
        assert_eq!("HUMIDIFIER".parse::<ActuatorId>(), Ok(ActuatorId::Humidifier));
        assert_eq!("WATER_PUMP".parse::<ActuatorId>(), Ok(ActuatorId::PrimaryPump));
        assert_eq!(
            "aquarium_pump".parse::<ActuatorId>(),
            Ok(ActuatorId::AuxiliaryPump)
        );
    }

    #[test]
    fn should_reject_unrecognised_actuator_name() {
        assert_eq!(
            "fan".parse::<ActuatorId>(),
            Err(ValidationError::UnrecognisedActuator("fan".to_string()))
        );
    }

    #[test]
    fn should_serialize_as_snake_case() {
        let json = serde_json::to_string(&ActuatorId::PrimaryPump).unwrap();
        assert_eq!(json, "\"primary_pump\"");
    }

    #[test]
    fn should_only_automate_heater_and_humidifier() {
        let automatic: Vec<_> = ActuatorId::ALL
            .into_iter()
            .filter(|id| id.is_automatic())
            .collect();
        assert_eq!(automatic, vec![ActuatorId::Heater, ActuatorId::Humidifier]);
    }

    #[test]
    fn should_start_with_everything_disengaged() {
        let states = ActuatorStates::default();
        assert!(states.iter().all(|s| !s.engaged));
    }

    #[test]
    fn should_set_single_actuator() {
        let mut states = ActuatorStates::default();
        states.set(ActuatorId::AuxiliaryPump, true);
        assert!(states.is_engaged(ActuatorId::AuxiliaryPump));
        assert!(!states.is_engaged(ActuatorId::PrimaryPump));
    }

    #[test]
    fn should_drive_active_low_relay_low_when_engaged() {
        let line = OutputLine {
            pin: 21,
            active_low: true,
        };
        assert_eq!(line.level_for(true), OutputLevel::Low);
        assert_eq!(line.level_for(false), OutputLevel::High);
    }

    #[test]
    fn should_drive_active_high_line_high_when_engaged() {
        let line = OutputLine {
            pin: 5,
            active_low: false,
        };
        assert_eq!(line.level_for(true), OutputLevel::High);
    }

    #[test]
    fn should_map_default_relay_board_pins() {
        let pins = PinMap::default();
        assert_eq!(pins.line(ActuatorId::Heater).unwrap().pin, 21);
        assert_eq!(pins.line(ActuatorId::Humidifier).unwrap().pin, 18);
        assert_eq!(pins.line(ActuatorId::PrimaryPump).unwrap().pin, 19);
        assert_eq!(pins.line(ActuatorId::AuxiliaryPump).unwrap().pin, 20);
    }

    #[test]
    fn should_report_unmapped_actuator() {
        let pins = PinMap {
            auxiliary_pump: None,
            ..PinMap::default()
        };
        assert_eq!(
            pins.line(ActuatorId::AuxiliaryPump),
            Err(UnknownActuatorError {
                actuator: ActuatorId::AuxiliaryPump
            })
        );
    }

    #[test]
    fn should_reject_duplicated_pin() {
        let pins = PinMap {
            humidifier: Some(21),
            ..PinMap::default()
        };
        assert!(pins.validate().is_err());
        assert!(PinMap::default().validate().is_ok());
    }
}
