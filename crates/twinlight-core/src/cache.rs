//! Last-known-good cache for reported values.
//!
//! The controller renders whatever this cache holds. It is only ever fed
//! from reported values, so a registry outage or a twin without a report
//! keeps showing the last value the device confirmed.

use crate::OFF;
use std::sync::{PoisonError, RwLock};

/// Last-writer-wins holder of the most recent non-empty reported value.
#[derive(Debug)]
pub struct TwinCache {
    value: RwLock<String>,
}

impl TwinCache {
    /// Create a cache starting at `OFF`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_default(OFF)
    }

    /// Create a cache starting at `initial`.
    #[must_use]
    pub fn with_default(initial: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(initial.into()),
        }
    }

    /// The cached value, or the default if nothing has been cached yet.
    #[must_use]
    pub fn get(&self) -> String {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Overwrite the cache with `value` if it is present and non-empty.
    ///
    /// Returns `true` if the cached value changed.
    pub fn set(&self, value: Option<&str>) -> bool {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            return false;
        };

        let mut current = self.value.write().unwrap_or_else(PoisonError::into_inner);
        if *current == value {
            return false;
        }

        tracing::debug!(previous = %*current, value, "Cache updated");
        *current = value.to_string();
        true
    }
}

impl Default for TwinCache {
    fn default() -> Self {
        Self::new()
    }
}
