//! Wire messages exchanged over the twin topics.
//!
//! Both directions are JSON. Reports carry the device's `actual` value;
//! commands carry a desired value in one of the [`CommandShape`] layouts.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use twinlight_core::document::TwinMetadata;
use uuid::Uuid;

/// Periodic report of the device's actual value.
///
/// ```json
/// {"event_id": "...", "timestamp": 1704067200000,
///  "twin": {"color": {"actual": {"value": "RED"}, "metadata": {"type": "string"}}}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    /// Unique event identifier
    pub event_id: String,
    /// Milliseconds since UNIX epoch
    pub timestamp: i64,
    /// Reported properties by name
    pub twin: BTreeMap<String, ReportedProperty>,
}

/// One reported property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedProperty {
    /// Actual value on the device
    pub actual: ActualValue,
    /// Value metadata
    pub metadata: TwinMetadata,
}

/// Wrapper for an actual value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualValue {
    /// The value
    pub value: String,
}

impl ReportMessage {
    /// Create a report of `value` for `property`, stamped now.
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        let mut twin = BTreeMap::new();
        twin.insert(
            property.into(),
            ReportedProperty {
                actual: ActualValue {
                    value: value.into(),
                },
                metadata: TwinMetadata::string(),
            },
        );

        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            twin,
        }
    }

    /// The actual value reported for `property`.
    #[must_use]
    pub fn actual(&self, property: &str) -> Option<&str> {
        self.twin.get(property).map(|p| p.actual.value.as_str())
    }

    /// Serialize to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, MessageError> {
        serde_json::to_vec(self).map_err(|e| MessageError::Serialize(e.to_string()))
    }

    /// Deserialize from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_json(bytes: &[u8]) -> Result<Self, MessageError> {
        serde_json::from_slice(bytes).map_err(|e| MessageError::Deserialize(e.to_string()))
    }
}

/// Layouts in which edge runtimes deliver a desired value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandShape {
    /// `twin.<property>.current.expected.value`
    Nested,
    /// `twin.<property>.expected.value`
    Flat,
    /// `twin.<property>.desired.value`
    Legacy,
}

impl CommandShape {
    /// All shapes, highest priority first.
    pub const ALL: [Self; 3] = [Self::Nested, Self::Flat, Self::Legacy];

    /// Encode a command document requesting `value` for `property`.
    #[must_use]
    pub fn encode(self, property: &str, value: &str) -> Value {
        let expected = json!({"value": value, "metadata": {"type": "string"}});
        let node = match self {
            Self::Nested => json!({"current": {"expected": expected}}),
            Self::Flat => json!({"expected": expected}),
            Self::Legacy => json!({"desired": expected}),
        };

        let mut twin = serde_json::Map::new();
        twin.insert(property.to_string(), node);

        json!({
            "event_id": Uuid::new_v4().to_string(),
            "timestamp": Utc::now().timestamp_millis(),
            "twin": twin,
        })
    }
}

impl FromStr for CommandShape {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nested" => Ok(Self::Nested),
            "flat" => Ok(Self::Flat),
            "legacy" => Ok(Self::Legacy),
            other => Err(MessageError::UnknownShape(other.to_string())),
        }
    }
}

/// Errors for message serialization/deserialization.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MessageError {
    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// Deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialize(String),
    /// Unrecognized command shape name
    #[error("unknown command shape: {0}")]
    UnknownShape(String),
}
