//! Commands — requests to change an actuator, and what became of them.
//!
//! Three origins feed the dispatcher: the automatic evaluator, the operator
//! and the companion water-level node. Operator and automatic requests are
//! plain [`Command`]s; the companion sends a [`CompanionReport`] that only
//! becomes a command when it asks for a pump change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::actuator::ActuatorId;
use crate::error::{UnknownActuatorError, ValidationError};
use crate::id::CommandId;
use crate::time::Timestamp;

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOrigin {
    Automatic,
    Operator,
    CompanionNode,
}

impl CommandOrigin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Operator => "operator",
            Self::CompanionNode => "companion_node",
        }
    }

    /// External origins are deduplicated and acknowledged.
    #[must_use]
    pub fn is_external(self) -> bool {
        !matches!(self, Self::Automatic)
    }
}

impl fmt::Display for CommandOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable request to drive one actuator to a given state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub origin: CommandOrigin,
    pub target: ActuatorId,
    pub desired_state: bool,
    pub issued_at: Timestamp,
}

impl Command {
    #[must_use]
    pub fn new(
        id: CommandId,
        origin: CommandOrigin,
        target: ActuatorId,
        desired_state: bool,
        issued_at: Timestamp,
    ) -> Self {
        Self {
            id,
            origin,
            target,
            desired_state,
            issued_at,
        }
    }

    /// A command produced by the hysteresis evaluator, with a fresh id.
    #[must_use]
    pub fn automatic(target: ActuatorId, desired_state: bool, issued_at: Timestamp) -> Self {
        Self::new(
            CommandId::generate(),
            CommandOrigin::Automatic,
            target,
            desired_state,
            issued_at,
        )
    }

    /// An operator command. Without a caller-supplied id a fresh one is issued,
    /// which opts the command out of retransmission dedup.
    #[must_use]
    pub fn operator(
        id: Option<CommandId>,
        target: ActuatorId,
        desired_state: bool,
        issued_at: Timestamp,
    ) -> Self {
        Self::new(
            id.unwrap_or_else(CommandId::generate),
            CommandOrigin::Operator,
            target,
            desired_state,
            issued_at,
        )
    }
}

/// Water level reported by the companion node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaterState {
    Low,
    Normal,
    High,
    Unknown,
}

impl WaterState {
    /// Lenient parse: anything unrecognised is [`WaterState::Unknown`].
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Self::Low,
            "NORMAL" | "OK" => Self::Normal,
            "HIGH" | "FULL" => Self::High,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for WaterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pump action requested by the companion node (`"ON"`, `"OFF"`, `"NONE"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedAction {
    Engage,
    Disengage,
    None,
}

impl RequestedAction {
    /// The actuator state this action asks for, if any.
    #[must_use]
    pub fn desired_state(self) -> Option<bool> {
        match self {
            Self::Engage => Some(true),
            Self::Disengage => Some(false),
            Self::None => None,
        }
    }

    #[must_use]
    pub fn from_desired_state(engaged: bool) -> Self {
        if engaged { Self::Engage } else { Self::Disengage }
    }

    /// Wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Engage => "ON",
            Self::Disengage => "OFF",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for RequestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestedAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" | "ENGAGE" => Ok(Self::Engage),
            "OFF" | "DISENGAGE" => Ok(Self::Disengage),
            "NONE" | "" => Ok(Self::None),
            _ => Err(ValidationError::InvalidField {
                field: "requestedAction",
                value: s.to_owned(),
            }),
        }
    }
}

/// A report pushed by the companion water-level node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionReport {
    pub id: CommandId,
    pub node_id: Option<String>,
    pub water_state: WaterState,
    pub requested_action: RequestedAction,
    pub min_sensor: Option<f64>,
    pub max_sensor: Option<f64>,
    pub received_at: Timestamp,
}

impl CompanionReport {
    #[must_use]
    pub fn builder() -> CompanionReportBuilder {
        CompanionReportBuilder::default()
    }

    /// The pump command this report asks for, if any.
    ///
    /// The command keeps the report's id so acknowledgments line up.
    #[must_use]
    pub fn to_command(&self, target: ActuatorId) -> Option<Command> {
        self.requested_action.desired_state().map(|desired_state| {
            Command::new(
                self.id.clone(),
                CommandOrigin::CompanionNode,
                target,
                desired_state,
                self.received_at,
            )
        })
    }
}

/// Step-by-step builder for [`CompanionReport`].
#[derive(Debug, Default)]
pub struct CompanionReportBuilder {
    id: Option<CommandId>,
    node_id: Option<String>,
    water_state: Option<WaterState>,
    requested_action: Option<RequestedAction>,
    min_sensor: Option<f64>,
    max_sensor: Option<f64>,
    received_at: Option<Timestamp>,
}

impl CompanionReportBuilder {
    #[must_use]
    pub fn id(mut self, id: CommandId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    #[must_use]
    pub fn water_state(mut self, water_state: WaterState) -> Self {
        self.water_state = Some(water_state);
        self
    }

    #[must_use]
    pub fn requested_action(mut self, action: RequestedAction) -> Self {
        self.requested_action = Some(action);
        self
    }

    #[must_use]
    pub fn min_sensor(mut self, value: f64) -> Self {
        self.min_sensor = Some(value);
        self
    }

    #[must_use]
    pub fn max_sensor(mut self, value: f64) -> Self {
        self.max_sensor = Some(value);
        self
    }

    #[must_use]
    pub fn received_at(mut self, at: Timestamp) -> Self {
        self.received_at = Some(at);
        self
    }

    /// Consume the builder.
    ///
    /// Missing id → a fresh one; missing water state → `Unknown`; missing
    /// timestamp → now.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when no action was given.
    pub fn build(self) -> Result<CompanionReport, ValidationError> {
        let requested_action = self
            .requested_action
            .ok_or(ValidationError::MissingField("requestedAction"))?;
        Ok(CompanionReport {
            id: self.id.unwrap_or_else(CommandId::generate),
            node_id: self.node_id,
            water_state: self.water_state.unwrap_or(WaterState::Unknown),
            requested_action,
            min_sensor: self.min_sensor,
            max_sensor: self.max_sensor,
            received_at: self.received_at.unwrap_or_else(crate::time::now),
        })
    }
}

/// Anything the dispatcher accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Command(Command),
    Companion(CompanionReport),
}

impl Submission {
    #[must_use]
    pub fn id(&self) -> &CommandId {
        match self {
            Self::Command(command) => &command.id,
            Self::Companion(report) => &report.id,
        }
    }

    #[must_use]
    pub fn origin(&self) -> CommandOrigin {
        match self {
            Self::Command(command) => command.origin,
            Self::Companion(_) => CommandOrigin::CompanionNode,
        }
    }
}

impl From<Command> for Submission {
    fn from(value: Command) -> Self {
        Self::Command(value)
    }
}

impl From<CompanionReport> for Submission {
    fn from(value: CompanionReport) -> Self {
        Self::Companion(value)
    }
}

/// A successful write of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Applied {
    pub target: ActuatorId,
    pub engaged: bool,
    /// `false` when the actuator already was in the requested state.
    pub changed: bool,
}

/// Result of `ActuatorController::apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(Applied),
    Rejected(UnknownActuatorError),
}

/// Result of `CommandDispatcher::submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Processed(Applied),
    /// A companion report without a pump request: contact and audit only.
    Recorded,
    DuplicateIgnored,
    InvalidTarget(ActuatorId),
}

impl SubmitOutcome {
    /// Whether the originator should see this as a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::InvalidTarget(_))
    }

    /// Human readable summary, used for acknowledgments and API responses.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Processed(applied) => {
                let state = if applied.engaged { "ON" } else { "OFF" };
                if applied.changed {
                    format!("{} turned {state}", applied.target)
                } else {
                    format!("{} already {state}", applied.target)
                }
            }
            Self::Recorded => "report recorded, no pump action".to_string(),
            Self::DuplicateIgnored => "duplicate command ignored".to_string(),
            Self::InvalidTarget(target) => format!("actuator {target} has no output line"),
        }
    }
}

/// Written back for every externally sourced command once processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub command_id: CommandId,
    pub origin: CommandOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub success: bool,
    pub message: String,
    pub processed_at: Timestamp,
}
