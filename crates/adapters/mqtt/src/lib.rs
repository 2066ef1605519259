//! # growhub-adapter-mqtt
//!
//! MQTT adapter — the realtime push/subscribe transport between the
//! controller, the operator app and the companion node.
//!
//! ## Responsibilities
//! - Connect to an MQTT broker, announcing `online` and leaving an `offline`
//!   last will on the device status topic
//! - Mirror every published snapshot as a retained status document
//! - Subscribe to the command inboxes and turn their payloads into
//!   control-loop submissions
//! - Write acknowledgments back, keyed by command id or companion node id
//! - Clear processed inbox entries with an empty retained payload
//!
//! See [`topics`] for the topic layout.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `growhub-app` and `growhub-domain`.

pub mod config;
pub mod error;
pub mod inbound;
pub mod listener;
pub mod publisher;
pub mod topics;

pub use config::MqttConfig;
pub use error::MqttError;
pub use listener::MqttListener;
pub use publisher::MqttPublisher;

use rumqttc::{AsyncClient, LastWill, MqttOptions, QoS};

use crate::topics::Topics;

/// Capacity of the request channel between the client and its event loop.
const CLIENT_CAPACITY: usize = 32;

/// Build the client side ([`MqttPublisher`]) and the event-loop side
/// ([`MqttListener`]) of one broker connection.
///
/// Nothing goes over the wire until the listener runs.
#[must_use]
pub fn connect(config: &MqttConfig) -> (MqttPublisher, MqttListener) {
    let topics = Topics::new(&config.base_topic, &config.device_id);

    let mut options = MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
    options.set_keep_alive(std::time::Duration::from_secs(u64::from(
        config.keep_alive_secs,
    )));
    options.set_last_will(LastWill::new(
        topics.device_status(),
        topics::OFFLINE.as_bytes().to_vec(),
        QoS::AtLeastOnce,
        true,
    ));

    let (client, eventloop) = AsyncClient::new(options, CLIENT_CAPACITY);
    (
        MqttPublisher::new(client.clone(), topics.clone()),
        MqttListener::new(client, eventloop, topics),
    )
}
