//! Topic layout.
//!
//! | topic | direction |
//! |-------|-----------|
//! | `{base}/devices/{device}/status` | out, retained: `online` / `offline` |
//! | `{base}/device_status/{device}` | out, retained: status document |
//! | `{base}/commands/{device}/relay_control` | in: operator relay command |
//! | `{base}/commands/{device}/thresholds` | in: threshold update |
//! | `{base}/companion_commands/{node}` | in: companion report |
//! | `{base}/command_responses/{command_id}` | out: operator acknowledgment |
//! | `{base}/companion_responses/{node}` | out: companion acknowledgment |

pub const ONLINE: &str = "online";
pub const OFFLINE: &str = "offline";

/// An inbox a message arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbox {
    RelayControl,
    Thresholds,
    Companion { node_id: String },
}

/// Topic names for one controller.
#[derive(Debug, Clone)]
pub struct Topics {
    base: String,
    device_id: String,
}

impl Topics {
    #[must_use]
    pub fn new(base: &str, device_id: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            device_id: device_id.to_string(),
        }
    }

    #[must_use]
    pub fn device_status(&self) -> String {
        format!("{}/devices/{}/status", self.base, self.device_id)
    }

    #[must_use]
    pub fn status_mirror(&self) -> String {
        format!("{}/device_status/{}", self.base, self.device_id)
    }

    #[must_use]
    pub fn relay_control(&self) -> String {
        format!("{}/commands/{}/relay_control", self.base, self.device_id)
    }

    #[must_use]
    pub fn thresholds(&self) -> String {
        format!("{}/commands/{}/thresholds", self.base, self.device_id)
    }

    /// Wildcard filter covering every companion node.
    #[must_use]
    pub fn companion_filter(&self) -> String {
        format!("{}/companion_commands/+", self.base)
    }

    #[must_use]
    pub fn command_response(&self, command_id: &str) -> String {
        format!("{}/command_responses/{command_id}", self.base)
    }

    #[must_use]
    pub fn companion_response(&self, node_id: &str) -> String {
        format!("{}/companion_responses/{node_id}", self.base)
    }

    /// Every filter the listener subscribes to.
    #[must_use]
    pub fn subscriptions(&self) -> [String; 3] {
        [
            self.relay_control(),
            self.thresholds(),
            self.companion_filter(),
        ]
    }

    /// Classify an incoming topic. `None` for anything outside our inboxes.
    #[must_use]
    pub fn inbox(&self, topic: &str) -> Option<Inbox> {
        if topic == self.relay_control() {
            return Some(Inbox::RelayControl);
        }
        if topic == self.thresholds() {
            return Some(Inbox::Thresholds);
        }
        let node_id = topic
            .strip_prefix(self.base.as_str())?
            .strip_prefix("/companion_commands/")?;
        if node_id.is_empty() || node_id.contains('/') {
            return None;
        }
        Some(Inbox::Companion {
            node_id: node_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Topics {
        Topics::new("growhub/", "tent")
    }

    #[test]
    fn should_lay_out_outbound_topics() {
        let t = topics();
        assert_eq!(t.device_status(), "growhub/devices/tent/status");
        assert_eq!(t.status_mirror(), "growhub/device_status/tent");
        assert_eq!(t.command_response("c-1"), "growhub/command_responses/c-1");
        assert_eq!(t.companion_response("esp32"), "growhub/companion_responses/esp32");
    }

    #[test]
    fn should_classify_inbox_topics() {
        let t = topics();
        assert_eq!(
            t.inbox("growhub/commands/tent/relay_control"),
            Some(Inbox::RelayControl)
        );
        assert_eq!(
            t.inbox("growhub/commands/tent/thresholds"),
            Some(Inbox::Thresholds)
        );
        assert_eq!(
            t.inbox("growhub/companion_commands/esp32"),
            Some(Inbox::Companion {
                node_id: "esp32".to_string()
            })
        );
    }

    #[test]
    fn should_ignore_foreign_topics() {
        let t = topics();
        assert_eq!(t.inbox("growhub/commands/other/relay_control"), None);
        assert_eq!(t.inbox("growhub/companion_commands/"), None);
        assert_eq!(t.inbox("growhub/companion_commands/a/b"), None);
        assert_eq!(t.inbox("elsewhere/companion_commands/esp32"), None);
    }
}
