//! In-process twin registry.
//!
//! Holds documents in memory and applies patches per property: a patched
//! entry updates only the values it carries and other entries are kept.
//! This is how the edge core folds twin updates, not how the API server
//! applies a JSON merge patch, which replaces `status.twins` as a whole
//! (see [`KubeClient`](crate::KubeClient)). Used for local runs without a
//! cluster and in tests, where [`MemoryShadow::set_unavailable`] simulates
//! an outage.

use crate::shadow::{RegistryError, ShadowApi};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use twinlight_core::document::{TwinEntry, TwinMetadata, TwinValue};
use twinlight_core::{TwinDocument, TwinPatch};

/// Registry keeping one document per device in memory.
#[derive(Debug, Default)]
pub struct MemoryShadow {
    documents: Mutex<HashMap<String, TwinDocument>>,
    unavailable: AtomicBool,
}

impl MemoryShadow {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Record a value reported by the device, as the edge core would.
    pub fn report(&self, device_id: &str, property: &str, value: &str) {
        self.update(device_id, property, |entry| {
            entry.reported = Some(TwinValue {
                value: value.to_string(),
                metadata: Some(TwinMetadata::string()),
            });
        });
    }

    /// Current desired value of `property`, if any.
    #[must_use]
    pub fn desired(&self, device_id: &str, property: &str) -> Option<String> {
        self.document(device_id).twin(device_id, property).desired
    }

    /// Snapshot of a device document (empty if never written).
    #[must_use]
    pub fn document(&self, device_id: &str) -> TwinDocument {
        self.lock().get(device_id).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TwinDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, device_id: &str, property: &str, apply: impl FnOnce(&mut TwinEntry)) {
        let mut documents = self.lock();
        let twins = &mut documents
            .entry(device_id.to_string())
            .or_default()
            .status
            .twins;

        let index = if let Some(index) = twins.iter().position(|e| e.property_name == property) {
            index
        } else {
            twins.push(TwinEntry {
                property_name: property.to_string(),
                reported: None,
                desired: None,
            });
            twins.len() - 1
        };

        apply(&mut twins[index]);
    }

    fn check_available(&self) -> Result<(), RegistryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::Request("registry unavailable".to_string()));
        }
        Ok(())
    }
}

impl ShadowApi for MemoryShadow {
    async fn get_twin(&self, device_id: &str) -> Result<TwinDocument, RegistryError> {
        self.check_available()?;
        Ok(self.document(device_id))
    }

    async fn patch_twin(&self, device_id: &str, patch: &TwinPatch) -> Result<(), RegistryError> {
        self.check_available()?;
        for patched in &patch.document().status.twins {
            self.update(device_id, &patched.property_name, |entry| {
                if let Some(desired) = &patched.desired {
                    entry.desired = Some(desired.clone());
                }
                if let Some(reported) = &patched.reported {
                    entry.reported = Some(reported.clone());
                }
            });
        }
        Ok(())
    }
}
