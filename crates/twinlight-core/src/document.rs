//! Registry document model for device twins.
//!
//! The registry stores one document per device. Its `status.twins` list
//! pairs each property with an optional `reported` value (written on behalf
//! of the device) and an optional `desired` value (written by controllers).
//! Every level is optional on the wire; absent levels read as empty.

use crate::STRING_TYPE;
use serde::{Deserialize, Deserializer, Serialize};

/// A registry document as returned by `get_twin`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinDocument {
    /// Device status section
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TwinStatus,
}

/// The `status` section of a registry document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinStatus {
    /// Ordered twin entries, one per property
    #[serde(default, deserialize_with = "null_as_default")]
    pub twins: Vec<TwinEntry>,
}

/// One property's twin entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwinEntry {
    /// Property name (e.g. "color")
    #[serde(default)]
    pub property_name: String,
    /// Value the device last reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<TwinValue>,
    /// Value a controller last requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<TwinValue>,
}

/// A twin value with its declared type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinValue {
    /// Raw value
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    /// Value metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TwinMetadata>,
}

/// Metadata attached to a twin value.
///
/// On the wire this is a free-form string map; only `type` is modeled and
/// other keys (e.g. `timestamp`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinMetadata {
    /// Declared value type, empty if not declared
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub value_type: String,
}

impl TwinMetadata {
    /// Metadata for string-typed values.
    #[must_use]
    pub fn string() -> Self {
        Self {
            value_type: STRING_TYPE.to_string(),
        }
    }
}

/// Reported/desired pair for one device property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTwin {
    /// Device identifier
    pub device_id: String,
    /// Tracked property
    pub property_name: String,
    /// Last reported value, if any (never empty)
    pub reported: Option<String>,
    /// Last desired value, if any (never empty)
    pub desired: Option<String>,
}

impl TwinDocument {
    /// Extract the twin for `property` from this document.
    ///
    /// An empty twin list or a list without the property yields a twin with
    /// neither value set. If several entries name the property the last
    /// one wins. Empty strings are treated as absent.
    #[must_use]
    pub fn twin(&self, device_id: &str, property: &str) -> DeviceTwin {
        let entry = self
            .status
            .twins
            .iter()
            .rev()
            .find(|entry| entry.property_name == property);

        DeviceTwin {
            device_id: device_id.to_string(),
            property_name: property.to_string(),
            reported: entry.and_then(|e| non_empty(e.reported.as_ref())),
            desired: entry.and_then(|e| non_empty(e.desired.as_ref())),
        }
    }
}

fn non_empty(value: Option<&TwinValue>) -> Option<String> {
    value
        .map(|v| v.value.as_str())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A patch setting the desired value of one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TwinPatch(TwinDocument);

impl TwinPatch {
    /// Build a patch requesting `value` for `property`.
    ///
    /// The value is forwarded verbatim; no validation is performed.
    #[must_use]
    pub fn desired(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self(TwinDocument {
            status: TwinStatus {
                twins: vec![TwinEntry {
                    property_name: property.into(),
                    reported: None,
                    desired: Some(TwinValue {
                        value: value.into(),
                        metadata: Some(TwinMetadata::string()),
                    }),
                }],
            },
        })
    }

    /// The document form of this patch.
    #[must_use]
    pub fn document(&self) -> &TwinDocument {
        &self.0
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Scalars as their string form; null and containers as empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> TwinDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn extracts_reported_and_desired() {
        let document = doc(json!({
            "apiVersion": "devices.kubeedge.io/v1alpha2",
            "status": {
                "twins": [
                    {"propertyName": "brightness", "reported": {"value": "80"}},
                    {
                        "propertyName": "color",
                        "reported": {"value": "RED", "metadata": {"type": "string"}},
                        "desired": {"value": "GREEN", "metadata": {"type": "string"}}
                    }
                ]
            }
        }));

        let twin = document.twin("light-01", "color");
        assert_eq!(twin.device_id, "light-01");
        assert_eq!(twin.reported.as_deref(), Some("RED"));
        assert_eq!(twin.desired.as_deref(), Some("GREEN"));
    }

    #[test]
    fn missing_sections_read_as_empty() {
        for value in [
            json!({}),
            json!({"status": null}),
            json!({"status": {}}),
            json!({"status": {"twins": null}}),
            json!({"status": {"twins": []}}),
            json!({"status": {"twins": [{"propertyName": "other"}]}}),
        ] {
            let twin = doc(value).twin("light-01", "color");
            assert!(twin.reported.is_none());
            assert!(twin.desired.is_none());
        }
    }

    #[test]
    fn empty_values_are_absent() {
        let document = doc(json!({
            "status": {"twins": [{
                "propertyName": "color",
                "reported": {"value": ""},
                "desired": {}
            }]}
        }));

        let twin = document.twin("light-01", "color");
        assert!(twin.reported.is_none());
        assert!(twin.desired.is_none());
    }

    #[test]
    fn metadata_without_type_is_accepted() {
        let document = doc(json!({
            "status": {"twins": [{
                "propertyName": "color",
                "reported": {"value": "RED", "metadata": {"timestamp": "1700000000000"}},
                "desired": {"value": "GREEN", "metadata": {"type": "string", "timestamp": "1700000000001"}}
            }]}
        }));

        let twin = document.twin("light-01", "color");
        assert_eq!(twin.reported.as_deref(), Some("RED"));
        assert_eq!(twin.desired.as_deref(), Some("GREEN"));
    }

    #[test]
    fn odd_values_do_not_fail_the_document() {
        let document = doc(json!({
            "status": {"twins": [
                {"propertyName": "brightness", "reported": {"value": null}, "desired": {"value": {"nested": 1}}},
                {"propertyName": "level", "reported": {"value": 80}},
                {"reported": {"value": "orphan"}},
                {"propertyName": "color", "reported": {"value": null}, "desired": {"value": "RED", "metadata": null}}
            ]}
        }));

        let color = document.twin("light-01", "color");
        assert!(color.reported.is_none());
        assert_eq!(color.desired.as_deref(), Some("RED"));
        assert_eq!(
            document.twin("light-01", "level").reported.as_deref(),
            Some("80")
        );
        assert!(document.twin("light-01", "brightness").desired.is_none());
    }

    #[test]
    fn last_matching_entry_wins() {
        let document = doc(json!({
            "status": {"twins": [
                {"propertyName": "color", "reported": {"value": "RED"}},
                {"propertyName": "color", "reported": {"value": "YELLOW"}}
            ]}
        }));

        assert_eq!(
            document.twin("light-01", "color").reported.as_deref(),
            Some("YELLOW")
        );
    }

    #[test]
    fn desired_patch_shape() {
        let patch = TwinPatch::desired("color", "YELLOW");
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({
                "status": {
                    "twins": [{
                        "propertyName": "color",
                        "desired": {"value": "YELLOW", "metadata": {"type": "string"}}
                    }]
                }
            })
        );
    }
}
