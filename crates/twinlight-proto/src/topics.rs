//! MQTT topic scheme for twin traffic.
//!
//! Topic structure: `{prefix}/{device_id}/twin/{message_type}`
//!
//! The default prefix `$hw/events/device` is the one the edge core's
//! event bus bridges to the cloud side.

use serde::{Deserialize, Serialize};

/// Default topic prefix.
pub const DEFAULT_PREFIX: &str = "$hw/events/device";

/// Topic scheme configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicScheme {
    /// Topic prefix (default: "$hw/events/device")
    pub prefix: String,
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl TopicScheme {
    /// Create a topic scheme with a custom prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn base(&self, device_id: &str) -> String {
        format!("{}/{}/twin", self.prefix, device_id)
    }

    /// Topic on which the device receives desired-value documents.
    #[must_use]
    pub fn command(&self, device_id: &str) -> String {
        format!("{}/update/document", self.base(device_id))
    }

    /// Topic on which the device publishes its reported value.
    #[must_use]
    pub fn report(&self, device_id: &str) -> String {
        format!("{}/update", self.base(device_id))
    }

    /// Parse a topic to extract components.
    ///
    /// Returns `(device_id, message_type)` if the topic belongs to this scheme.
    #[must_use]
    pub fn parse(&self, topic: &str) -> Option<(String, MessageType)> {
        let remainder = topic.strip_prefix(&self.prefix)?.strip_prefix('/')?;
        let (device_id, rest) = remainder.split_once('/')?;
        if device_id.is_empty() {
            return None;
        }

        let msg_type = match rest {
            "twin/update/document" => MessageType::Command,
            "twin/update" => MessageType::Report,
            _ => return None,
        };

        Some((device_id.to_string(), msg_type))
    }
}

/// Message types carried on twin topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Desired-value document (edge core to device)
    Command,
    /// Reported value (device to edge core)
    Report,
}
