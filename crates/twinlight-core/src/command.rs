//! Extraction of desired values from inbound twin update messages.
//!
//! Different edge runtime versions deliver the desired value under different
//! paths. Each known layout is a [`Shape`]: a pure function locating the node
//! that carries `value` in the decoded payload. Shapes are tried in priority
//! order and the first shape whose node is present is selected; its `value`
//! must then be a non-empty string, otherwise the message carries no value.
//! Later shapes are not consulted once one is selected.
//!
//! | Priority | Shape | Selected when present | Value |
//! |----------|-------|-----------------------|-------|
//! | 1 | nested | `twin.<property>.current.expected` | `.value` |
//! | 2 | flat | `twin.<property>.expected` | `.value` |
//! | 3 | legacy | `twin.<property>.desired` | `.value` |
//!
//! Messages that match no shape, or are not JSON at all, are expected
//! traffic from mismatched protocol versions and simply yield no value.

use serde_json::Value;

/// Locator of a shape: `(payload, property) -> node holding "value"`.
pub type SelectFn = for<'a> fn(&'a Value, &str) -> Option<&'a Value>;

/// One recognized message layout.
#[derive(Clone, Copy)]
pub struct Shape {
    /// Name used in logs
    pub name: &'static str,
    select: SelectFn,
}

impl Shape {
    /// `twin.<property>.current.expected`
    pub const NESTED: Self = Self::new("nested", |payload, property| {
        node_at(payload, property, &["current", "expected"])
    });

    /// `twin.<property>.expected`
    pub const FLAT: Self = Self::new("flat", |payload, property| {
        node_at(payload, property, &["expected"])
    });

    /// `twin.<property>.desired`
    pub const LEGACY: Self = Self::new("legacy", |payload, property| {
        node_at(payload, property, &["desired"])
    });

    /// Define a new shape.
    #[must_use]
    pub const fn new(name: &'static str, select: SelectFn) -> Self {
        Self { name, select }
    }

    /// Whether this shape's node is present in `payload`.
    #[must_use]
    pub fn matches(&self, payload: &Value, property: &str) -> bool {
        (self.select)(payload, property).is_some()
    }

    /// Read the value of this shape, if its node is present and carries a
    /// non-empty string.
    #[must_use]
    pub fn extract(&self, payload: &Value, property: &str) -> Option<String> {
        (self.select)(payload, property)?
            .get("value")?
            .as_str()
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Shape").field(&self.name).finish()
    }
}

/// Walk `twin.<property>.<path...>`; `null` counts as absent.
fn node_at<'a>(payload: &'a Value, property: &str, path: &[&str]) -> Option<&'a Value> {
    let mut node = payload.get("twin")?.get(property)?;
    for key in path {
        node = node.get(key)?;
    }
    (!node.is_null()).then_some(node)
}

/// Prioritized multi-shape parser for one property.
#[derive(Debug, Clone)]
pub struct CommandParser {
    property: String,
    shapes: Vec<Shape>,
}

impl CommandParser {
    /// Parser for `property` with the nested, flat and legacy shapes.
    #[must_use]
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            shapes: vec![Shape::NESTED, Shape::FLAT, Shape::LEGACY],
        }
    }

    /// Append a shape, tried after all existing ones.
    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Property this parser extracts.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Extract the desired value from a raw payload.
    ///
    /// Returns `None` for payloads that are not JSON or match no shape.
    #[must_use]
    pub fn parse(&self, payload: &[u8]) -> Option<String> {
        match serde_json::from_slice::<Value>(payload) {
            Ok(decoded) => self.parse_value(&decoded),
            Err(err) => {
                tracing::debug!(error = %err, payload_len = payload.len(), "Ignoring non-JSON command");
                None
            }
        }
    }

    /// Extract the desired value from a decoded payload.
    #[must_use]
    pub fn parse_value(&self, payload: &Value) -> Option<String> {
        let shape = self
            .shapes
            .iter()
            .find(|shape| shape.matches(payload, &self.property))?;

        let value = shape.extract(payload, &self.property);
        match &value {
            Some(value) => {
                tracing::debug!(shape = shape.name, value = %value, "Matched command shape");
            }
            None => {
                tracing::debug!(shape = shape.name, "Command shape carries no value");
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(payload: &Value) -> Option<String> {
        CommandParser::new("color").parse(payload.to_string().as_bytes())
    }

    #[test]
    fn nested_shape() {
        let payload = json!({"twin": {"color": {"current": {"expected": {"value": "RED"}}}}});
        assert_eq!(parse(&payload).as_deref(), Some("RED"));
    }

    #[test]
    fn flat_shape() {
        let payload = json!({"twin": {"color": {"expected": {"value": "GREEN"}}}});
        assert_eq!(parse(&payload).as_deref(), Some("GREEN"));
    }

    #[test]
    fn legacy_shape() {
        let payload = json!({"twin": {"color": {"desired": {"value": "YELLOW"}}}});
        assert_eq!(parse(&payload).as_deref(), Some("YELLOW"));
    }

    #[test]
    fn nested_takes_priority() {
        let payload = json!({
            "event_id": "e1",
            "twin": {"color": {
                "desired": {"value": "YELLOW"},
                "expected": {"value": "GREEN"},
                "current": {"expected": {"value": "RED"}, "actual": {"value": "OFF"}},
                "last": {"expected": {"value": "PURPLE"}}
            }}
        });
        assert_eq!(parse(&payload).as_deref(), Some("RED"));
    }

    #[test]
    fn flat_beats_legacy() {
        let payload = json!({"twin": {"color": {
            "desired": {"value": "YELLOW"},
            "expected": {"value": "GREEN"}
        }}});
        assert_eq!(parse(&payload).as_deref(), Some("GREEN"));
    }

    #[test]
    fn selected_shape_without_value_stops_search() {
        for node in [json!({"value": ""}), json!({}), json!({"value": 7})] {
            let payload = json!({"twin": {"color": {
                "current": {"expected": node},
                "expected": {"value": "GREEN"},
                "desired": {"value": "YELLOW"}
            }}});
            assert_eq!(parse(&payload), None, "payload: {payload}");
        }

        let payload = json!({"twin": {"color": {
            "expected": {"value": ""},
            "desired": {"value": "YELLOW"}
        }}});
        assert_eq!(parse(&payload), None);
    }

    #[test]
    fn current_without_expected_uses_next_shape() {
        let payload = json!({"twin": {"color": {
            "current": {"actual": {"value": "RED"}},
            "desired": {"value": "YELLOW"}
        }}});
        assert_eq!(parse(&payload).as_deref(), Some("YELLOW"));
    }

    #[test]
    fn no_value_cases() {
        for payload in [
            json!({"twin": {"color": {}}}),
            json!({"twin": {}}),
            json!({}),
            json!([]),
            json!("RED"),
            json!({"twin": {"color": {"expected": {"value": ""}}}}),
            json!({"twin": {"color": {"expected": {"value": 3}}}}),
            json!({"twin": {"color": {"current": "RED"}}}),
            json!({"twin": {"color": {"desired": null}}}),
            json!({"twin": {"brightness": {"expected": {"value": "80"}}}}),
        ] {
            assert_eq!(parse(&payload), None, "payload: {payload}");
        }
    }

    #[test]
    fn invalid_json_is_no_value() {
        let parser = CommandParser::new("color");
        assert_eq!(parser.parse(b"not json"), None);
        assert_eq!(parser.parse(b"{\"twin\":"), None);
        assert_eq!(parser.parse(&[0xff, 0xfe]), None);
        assert_eq!(parser.parse(b""), None);
    }

    #[test]
    fn other_property() {
        let parser = CommandParser::new("brightness");
        let payload = json!({"twin": {
            "color": {"expected": {"value": "RED"}},
            "brightness": {"expected": {"value": "80"}}
        }});
        assert_eq!(parser.parse_value(&payload).as_deref(), Some("80"));
    }

    #[test]
    fn custom_shape_appended_last() {
        const STATE: Shape = Shape::new("state", |payload, property| {
            payload.get("state")?.get("desired")?.get(property)
        });

        let parser = CommandParser::new("color").with_shape(STATE);
        let payload = json!({"state": {"desired": {"color": {"value": "GREEN"}}}});
        assert_eq!(parser.parse_value(&payload).as_deref(), Some("GREEN"));

        let payload = json!({
            "state": {"desired": {"color": {"value": "GREEN"}}},
            "twin": {"color": {"desired": {"value": "RED"}}}
        });
        assert_eq!(parser.parse_value(&payload).as_deref(), Some("RED"));
    }
}
