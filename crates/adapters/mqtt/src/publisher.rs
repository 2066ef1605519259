//! [`StatePublisher`] over MQTT.

use rumqttc::{AsyncClient, QoS};

use growhub_app::ports::StatePublisher;
use growhub_domain::command::{Acknowledgment, CommandOrigin};
use growhub_domain::error::GrowHubError;
use growhub_domain::snapshot::{StateSnapshot, StatusDocument};

use crate::error::MqttError;
use crate::topics::{OFFLINE, Topics};

/// Publishes the status mirror and acknowledgments.
///
/// Acknowledgments use a non-blocking send so a stalled broker connection
/// never holds up the audit writer; snapshot and offline publication wait
/// for room and are bounded by their callers' timeouts.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    topics: Topics,
}

impl MqttPublisher {
    pub(crate) fn new(client: AsyncClient, topics: Topics) -> Self {
        Self { client, topics }
    }

    /// Response topic for `ack`: per command for the operator, per node for
    /// the companion.
    fn response_topic(&self, ack: &Acknowledgment) -> String {
        match (ack.origin, ack.node_id.as_deref()) {
            (CommandOrigin::CompanionNode, Some(node_id)) => self.topics.companion_response(node_id),
            _ => self.topics.command_response(ack.command_id.as_str()),
        }
    }
}

impl StatePublisher for MqttPublisher {
    async fn publish(&self, snapshot: StateSnapshot) -> Result<(), GrowHubError> {
        let document =
            serde_json::to_vec(&StatusDocument::from(&snapshot)).map_err(MqttError::PayloadEncode)?;
        self.client
            .publish(self.topics.status_mirror(), QoS::AtLeastOnce, true, document)
            .await
            .map_err(MqttError::from)?;
        Ok(())
    }

    async fn acknowledge(&self, ack: Acknowledgment) -> Result<(), GrowHubError> {
        let body = serde_json::to_vec(&ack).map_err(MqttError::PayloadEncode)?;
        self.client
            .try_publish(self.response_topic(&ack), QoS::AtLeastOnce, false, body)
            .map_err(MqttError::from)?;
        tracing::debug!(command_id = %ack.command_id, success = ack.success, "acknowledgment queued");
        Ok(())
    }

    async fn mark_offline(&self) -> Result<(), GrowHubError> {
        self.client
            .publish(
                self.topics.device_status(),
                QoS::AtLeastOnce,
                true,
                OFFLINE.as_bytes().to_vec(),
            )
            .await
            .map_err(MqttError::from)?;
        Ok(())
    }
}
