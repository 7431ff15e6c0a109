//! Human-readable labels for twin values.

use std::collections::HashMap;

/// Mapping from canonical values to localized display text.
///
/// The value domain is open: values without an entry are shown verbatim.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: HashMap<String, String>,
}

impl LabelTable {
    /// An empty table; every value translates to itself.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            labels: HashMap::new(),
        }
    }

    /// Add or replace a label.
    #[must_use]
    pub fn with(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(value.into(), label.into());
        self
    }

    /// Translate `value`, falling back to the raw value.
    #[must_use]
    pub fn translate<'a>(&'a self, value: &'a str) -> &'a str {
        self.labels.get(value).map_or(value, String::as_str)
    }
}

impl Default for LabelTable {
    /// Vietnamese labels for the traffic light values.
    fn default() -> Self {
        Self::empty()
            .with("RED", "ĐỎ")
            .with("GREEN", "XANH")
            .with("YELLOW", "VÀNG")
            .with("OFF", "TẮT")
            .with("WAITING", "ĐANG KHỞI ĐỘNG")
    }
}
