//! Event-loop side of the broker connection.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet, Publish, QoS};
use tokio_util::sync::CancellationToken;

use growhub_app::control::ControlHandle;
use growhub_domain::time::now;

use crate::error::MqttError;
use crate::inbound::{Inbound, decode};
use crate::topics::{ONLINE, Topics};

/// Pause after a connection error before polling again.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Upper bound on flushing queued requests once cancelled.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Drives the rumqttc event loop and feeds inbox messages to the control
/// loop.
pub struct MqttListener {
    eventloop: EventLoop,
    session: Session,
}

/// Client half used while handling events. Kept apart from the event loop so
/// it can be borrowed across awaits.
struct Session {
    client: AsyncClient,
    topics: Topics,
}

impl MqttListener {
    pub(crate) fn new(client: AsyncClient, eventloop: EventLoop, topics: Topics) -> Self {
        Self {
            eventloop,
            session: Session { client, topics },
        }
    }

    /// Poll until `cancel` fires, then flush queued requests and disconnect.
    ///
    /// The event loop reconnects on its own on the next poll after an error;
    /// subscriptions and the `online` announcement are re-issued on every
    /// `ConnAck` since the broker may have dropped the session.
    ///
    /// Requests queued before cancellation (such as the `offline` status) are
    /// written ahead of the disconnect, so publishers must be done before
    /// `cancel` fires.
    pub async fn run(mut self, control: ControlHandle, cancel: CancellationToken) {
        tracing::info!(device = %self.session.topics.device_status(), "mqtt listener started");
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = self.eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => self.session.on_connected(),
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.session.on_publish(&control, &publish).await;
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        tracing::warn!("mqtt disconnected by broker");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(error = %err, "mqtt connection error");
                        tokio::select! {
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(RECONNECT_DELAY) => {}
                        }
                    }
                },
            }
        }
        self.disconnect().await;
        tracing::info!("mqtt listener stopped");
    }

    /// Queue a disconnect behind pending requests and poll until it is
    /// written, the connection fails, or [`DISCONNECT_TIMEOUT`] elapses.
    async fn disconnect(&mut self) {
        if let Err(err) = self.session.client.try_disconnect() {
            tracing::warn!(error = %err, "failed to queue mqtt disconnect");
            return;
        }
        let flush = async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::debug!(error = %err, "mqtt connection closed while disconnecting");
                        break;
                    }
                }
            }
        };
        if tokio::time::timeout(DISCONNECT_TIMEOUT, flush).await.is_err() {
            tracing::warn!("mqtt disconnect timed out");
        }
    }
}

// Requests issued from here use the non-blocking `try_*` calls: the listener
// task is the one draining the request channel.
impl Session {
    fn on_connected(&self) {
        tracing::info!("mqtt connected");
        for filter in self.topics.subscriptions() {
            if let Err(err) = self.client.try_subscribe(&filter, QoS::AtLeastOnce) {
                tracing::error!(%filter, error = %err, "mqtt subscribe failed");
            }
        }
        if let Err(err) = self.client.try_publish(
            self.topics.device_status(),
            QoS::AtLeastOnce,
            true,
            ONLINE.as_bytes().to_vec(),
        ) {
            tracing::warn!(error = %err, "failed to announce online status");
        }
    }

    async fn on_publish(&self, control: &ControlHandle, publish: &Publish) {
        let Some(inbox) = self.topics.inbox(&publish.topic) else {
            tracing::debug!(topic = %publish.topic, "ignoring message outside the inboxes");
            return;
        };
        let inbound = match decode(&inbox, &publish.payload, now()) {
            Ok(Some(inbound)) => inbound,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(topic = %publish.topic, error = %err, "rejected inbox message");
                self.clear(&publish.topic);
                return;
            }
        };

        match dispatch(control, inbound).await {
            Ok(summary) => tracing::info!(topic = %publish.topic, %summary, "inbox message processed"),
            Err(err) => tracing::warn!(topic = %publish.topic, error = %err, "inbox message failed"),
        }
        self.clear(&publish.topic);
    }

    /// Empty retained payload removes the retained inbox entry.
    fn clear(&self, topic: &str) {
        if let Err(err) = self
            .client
            .try_publish(topic, QoS::AtLeastOnce, true, Vec::new())
        {
            tracing::warn!(%topic, error = %err, "failed to clear inbox");
        }
    }
}

async fn dispatch(control: &ControlHandle, inbound: Inbound) -> Result<String, MqttError> {
    match inbound {
        Inbound::Submit(submission) => Ok(control.submit(submission).await?.message()),
        Inbound::UpdateThresholds(update) => {
            let thresholds = control.update_thresholds(update).await?;
            Ok(format!("thresholds now {thresholds:?}"))
        }
    }
}
