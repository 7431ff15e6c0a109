//! Reconciliation of desired vs. reported into what the controller shows.

use crate::cache::TwinCache;
use crate::document::DeviceTwin;
use crate::label::LabelTable;
use serde::Serialize;

/// Controller-side view of a twin. Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    /// Reported color to render
    pub color: String,
    /// Localized text (of the desired value while converging)
    pub label: String,
    /// A desired value is pending that differs from the reported one
    pub converging: bool,
    /// Desired value being converged to, if any
    pub target: Option<String>,
}

impl DisplayState {
    /// State for when no fresh twin could be read: the cached color, not converging.
    #[must_use]
    pub fn cached(cache: &TwinCache, labels: &LabelTable) -> Self {
        let color = cache.get();
        Self {
            label: labels.translate(&color).to_string(),
            color,
            converging: false,
            target: None,
        }
    }
}

/// Fold a freshly read twin into the cache and derive the display state.
///
/// The cache only ever learns from `reported`; `desired` affects the label
/// and the converging flag alone.
#[must_use]
pub fn reconcile(twin: &DeviceTwin, cache: &TwinCache, labels: &LabelTable) -> DisplayState {
    cache.set(twin.reported.as_deref());
    let color = cache.get();

    match twin.desired.as_deref() {
        Some(desired) if desired != color => DisplayState {
            label: labels.translate(desired).to_string(),
            target: Some(desired.to_string()),
            color,
            converging: true,
        },
        _ => DisplayState {
            label: labels.translate(&color).to_string(),
            color,
            converging: false,
            target: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twin(reported: Option<&str>, desired: Option<&str>) -> DeviceTwin {
        DeviceTwin {
            device_id: "light-01".to_string(),
            property_name: "color".to_string(),
            reported: reported.map(str::to_string),
            desired: desired.map(str::to_string),
        }
    }

    #[test]
    fn converging_when_desired_differs() {
        let cache = TwinCache::new();
        let labels = LabelTable::default();

        for (reported, desired) in [("RED", "GREEN"), ("GREEN", "YELLOW"), ("OFF", "PURPLE")] {
            let state = reconcile(&twin(Some(reported), Some(desired)), &cache, &labels);
            assert!(state.converging);
            assert_eq!(state.color, reported);
            assert_eq!(state.label, labels.translate(desired));
            assert_eq!(state.target.as_deref(), Some(desired));
        }
    }

    #[test]
    fn settled_when_desired_absent_or_equal() {
        let cache = TwinCache::new();
        let labels = LabelTable::default();

        let state = reconcile(&twin(Some("RED"), None), &cache, &labels);
        assert!(!state.converging);
        assert_eq!(state.label, "ĐỎ");

        let state = reconcile(&twin(Some("GREEN"), Some("GREEN")), &cache, &labels);
        assert!(!state.converging);
        assert_eq!(state.color, "GREEN");
        assert_eq!(state.label, "XANH");
        assert!(state.target.is_none());
    }

    #[test]
    fn missing_report_keeps_cached_color() {
        let cache = TwinCache::new();
        let labels = LabelTable::default();

        let _ = reconcile(&twin(Some("YELLOW"), None), &cache, &labels);
        let state = reconcile(&twin(None, None), &cache, &labels);
        assert_eq!(state.color, "YELLOW");
        assert!(!state.converging);
    }

    #[test]
    fn desired_compared_against_cached_color() {
        let cache = TwinCache::new();
        let labels = LabelTable::default();

        let _ = reconcile(&twin(Some("GREEN"), None), &cache, &labels);
        let state = reconcile(&twin(None, Some("GREEN")), &cache, &labels);
        assert!(!state.converging);

        let state = reconcile(&twin(None, Some("RED")), &cache, &labels);
        assert!(state.converging);
        assert_eq!(state.color, "GREEN");
    }

    #[test]
    fn desired_never_reaches_cache() {
        let cache = TwinCache::new();
        let labels = LabelTable::default();

        let _ = reconcile(&twin(None, Some("RED")), &cache, &labels);
        assert_eq!(cache.get(), "OFF");
    }

    #[test]
    fn cached_state_is_not_converging() {
        let cache = TwinCache::new();
        cache.set(Some("RED"));

        let state = DisplayState::cached(&cache, &LabelTable::default());
        assert_eq!(state.color, "RED");
        assert_eq!(state.label, "ĐỎ");
        assert!(!state.converging);
    }
}
