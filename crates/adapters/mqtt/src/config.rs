//! MQTT transport configuration.

use serde::Deserialize;

/// Configuration for the MQTT transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Base topic prefix for all growhub MQTT communication.
    pub base_topic: String,
    /// Identifier of this controller inside the topic tree.
    pub device_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "growhub".to_string(),
            base_topic: "growhub".to_string(),
            device_id: "enclosure".to_string(),
            keep_alive_secs: 30,
        }
    }
}
