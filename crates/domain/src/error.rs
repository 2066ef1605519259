//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`GrowHubError`]
//! via `From`. Adapter failures travel as boxed typed sources so the core never
//! names adapter crates.

use crate::actuator::ActuatorId;

/// Boxed error source used for adapter-originated failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for every operation of the control core.
#[derive(Debug, thiserror::Error)]
pub enum GrowHubError {
    /// An inbound payload or a requested change violated a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The actuator exists in the closed set but has no output line mapped.
    #[error("unknown actuator")]
    UnknownActuator(#[from] UnknownActuatorError),

    /// The sensor driver could not produce a reading.
    #[error("sensor unavailable")]
    SensorUnavailable(#[source] BoxError),

    /// The digital-output driver failed to write a line.
    #[error("actuator output failure")]
    Output(#[source] BoxError),

    /// The audit log could not be read or written.
    #[error("persistence failure")]
    Storage(#[source] BoxError),

    /// The external state mirror could not be updated.
    #[error("publication failure")]
    Publication(#[source] BoxError),

    /// The control loop task has stopped and no longer accepts messages.
    #[error("control loop is not running")]
    ControlLoopClosed,
}

/// Invariant violations and malformed inbound payloads.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {value}")]
    InvalidField { field: &'static str, value: String },

    #[error("lower bound {lower} must be below upper bound {upper}")]
    InvertedBounds { lower: f64, upper: f64 },

    #[error("threshold bounds must be finite numbers")]
    NonFiniteBound,

    #[error("command id must not be empty")]
    EmptyCommandId,

    #[error("unrecognised actuator `{0}`")]
    UnrecognisedActuator(String),
}

/// Raised when an actuator has no physical output line in the pin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("actuator {actuator} has no output line")]
pub struct UnknownActuatorError {
    pub actuator: ActuatorId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_validation_error_with_from() {
        let err: GrowHubError = ValidationError::MissingField("actuator").into();
        assert!(matches!(
            err,
            GrowHubError::Validation(ValidationError::MissingField("actuator"))
        ));
    }

    #[test]
    fn should_render_unknown_actuator_message() {
        let err = UnknownActuatorError {
            actuator: ActuatorId::AuxiliaryPump,
        };
        assert_eq!(err.to_string(), "actuator auxiliary_pump has no output line");
    }

    #[test]
    fn should_render_inverted_bounds_message() {
        let err = ValidationError::InvertedBounds {
            lower: 30.0,
            upper: 28.0,
        };
        assert_eq!(
            err.to_string(),
            "lower bound 30 must be below upper bound 28"
        );
    }
}
