//! Decoding of inbox payloads.

use growhub_domain::command::Submission;
use growhub_domain::payload::{CompanionPayload, RelayControlPayload, ThresholdPayload};
use growhub_domain::threshold::ThresholdUpdate;
use growhub_domain::time::Timestamp;

use crate::error::MqttError;
use crate::topics::Inbox;

/// What an inbox message asks the controller to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Submit(Submission),
    UpdateThresholds(ThresholdUpdate),
}

/// Decode one inbox payload.
///
/// An empty payload is a cleared inbox and yields `None`.
///
/// # Errors
///
/// Returns [`MqttError::PayloadParse`] for malformed JSON and
/// [`MqttError::Domain`] for a payload that fails validation.
pub fn decode(
    inbox: &Inbox,
    payload: &[u8],
    received_at: Timestamp,
) -> Result<Option<Inbound>, MqttError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let inbound = match inbox {
        Inbox::RelayControl => {
            let body: RelayControlPayload =
                serde_json::from_slice(payload).map_err(MqttError::PayloadParse)?;
            Inbound::Submit(body.into_command(received_at)?.into())
        }
        Inbox::Thresholds => {
            let body: ThresholdPayload =
                serde_json::from_slice(payload).map_err(MqttError::PayloadParse)?;
            Inbound::UpdateThresholds(body.into_update()?)
        }
        Inbox::Companion { node_id } => {
            let body: CompanionPayload =
                serde_json::from_slice(payload).map_err(MqttError::PayloadParse)?;
            Inbound::Submit(body.into_report(Some(node_id), received_at)?.into())
        }
    };
    Ok(Some(inbound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use growhub_domain::actuator::ActuatorId;
    use growhub_domain::command::{CommandOrigin, RequestedAction};
    use growhub_domain::error::GrowHubError;
    use growhub_domain::time::now;

    #[test]
    fn should_treat_empty_payload_as_cleared_inbox() {
        assert_eq!(decode(&Inbox::RelayControl, b"", now()).unwrap(), None);
        assert_eq!(decode(&Inbox::Thresholds, b" \n", now()).unwrap(), None);
    }

    #[test]
    fn should_decode_relay_command() {
        let payload = br#"{"command_id": "-Nx1", "relay": "WATER_PUMP", "state": true}"#;

        let inbound = decode(&Inbox::RelayControl, payload, now()).unwrap().unwrap();

        let Inbound::Submit(Submission::Command(command)) = inbound else {
            panic!("expected a command");
        };
        assert_eq!(command.id.as_str(), "-Nx1");
        assert_eq!(command.origin, CommandOrigin::Operator);
        assert_eq!(command.target, ActuatorId::PrimaryPump);
        assert!(command.desired_state);
    }

    #[test]
    fn should_take_node_id_from_topic() {
        let inbox = Inbox::Companion {
            node_id: "esp32-garage".to_string(),
        };
        let payload = br#"{"command_id": "c9", "water_state": "HIGH", "pump_command": "OFF"}"#;

        let inbound = decode(&inbox, payload, now()).unwrap().unwrap();

        let Inbound::Submit(Submission::Companion(report)) = inbound else {
            panic!("expected a companion report");
        };
        assert_eq!(report.node_id.as_deref(), Some("esp32-garage"));
        assert_eq!(report.requested_action, RequestedAction::Disengage);
    }

    #[test]
    fn should_decode_threshold_update() {
        let payload = br#"{"humidity": {"upperBound": 85.0}}"#;

        let inbound = decode(&Inbox::Thresholds, payload, now()).unwrap().unwrap();

        assert_eq!(
            inbound,
            Inbound::UpdateThresholds(ThresholdUpdate {
                humidity_upper: Some(85.0),
                ..ThresholdUpdate::default()
            })
        );
    }

    #[test]
    fn should_report_malformed_json() {
        let result = decode(&Inbox::RelayControl, b"{oops", now());
        assert!(matches!(result, Err(MqttError::PayloadParse(_))));
    }

    #[test]
    fn should_report_validation_failure() {
        let result = decode(&Inbox::RelayControl, br#"{"relay": "HEATER"}"#, now());
        assert!(matches!(
            result,
            Err(MqttError::Domain(GrowHubError::Validation(_)))
        ));
    }
}
