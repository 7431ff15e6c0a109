//! Twin reconciliation on the controller side.

use serde::Serialize;
use std::str::FromStr;
use twinlight_adapter_kube::{RegistryError, ShadowApi};
use twinlight_core::{reconcile, DisplayState, LabelTable, TwinCache, TwinPatch};

/// What to do when the registry cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFailurePolicy {
    /// Show the cached color, not converging, with the error as a diagnostic
    #[default]
    CacheFallback,
    /// Return the registry error to the caller
    Surface,
}

impl FromStr for ReadFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache" => Ok(Self::CacheFallback),
            "surface" => Ok(Self::Surface),
            other => Err(format!("unknown read failure policy '{other}'")),
        }
    }
}

/// Result of a display read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadOutcome {
    /// State to render
    pub state: DisplayState,
    /// Why the state may be stale, if the registry read failed
    pub diagnostic: Option<String>,
}

/// Errors surfaced by the controller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ControllerError {
    /// Registry read failed and the policy is to surface it
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Controller for one device property.
pub struct TwinController<R> {
    registry: R,
    device_id: String,
    property: String,
    cache: TwinCache,
    labels: LabelTable,
    policy: ReadFailurePolicy,
}

impl<R: ShadowApi> TwinController<R> {
    /// Create a controller with default labels, an `OFF` cache and cache fallback.
    #[must_use]
    pub fn new(registry: R, device_id: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            registry,
            device_id: device_id.into(),
            property: property.into(),
            cache: TwinCache::new(),
            labels: LabelTable::default(),
            policy: ReadFailurePolicy::default(),
        }
    }

    /// Replace the label table.
    #[must_use]
    pub fn with_labels(mut self, labels: LabelTable) -> Self {
        self.labels = labels;
        self
    }

    /// Replace the read failure policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReadFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Device this controller addresses.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Registry backing this controller.
    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Last known reported value.
    #[must_use]
    pub fn cached(&self) -> String {
        self.cache.get()
    }

    /// Read the twin and derive what to display.
    ///
    /// # Errors
    ///
    /// Only with [`ReadFailurePolicy::Surface`], when the registry read fails.
    pub async fn read_display_state(&self) -> Result<ReadOutcome, ControllerError> {
        match self.registry.get_twin(&self.device_id).await {
            Ok(document) => {
                let twin = document.twin(&self.device_id, &self.property);
                let state = reconcile(&twin, &self.cache, &self.labels);
                tracing::debug!(
                    device_id = %self.device_id,
                    reported = ?twin.reported,
                    desired = ?twin.desired,
                    color = %state.color,
                    converging = state.converging,
                    "Reconciled twin"
                );
                Ok(ReadOutcome {
                    state,
                    diagnostic: None,
                })
            }
            Err(err) => match self.policy {
                ReadFailurePolicy::Surface => Err(err.into()),
                ReadFailurePolicy::CacheFallback => {
                    tracing::warn!(
                        device_id = %self.device_id,
                        error = %err,
                        "Twin read failed, showing cached state"
                    );
                    Ok(ReadOutcome {
                        state: DisplayState::cached(&self.cache, &self.labels),
                        diagnostic: Some(err.to_string()),
                    })
                }
            },
        }
    }

    /// Request `value` as the desired value.
    ///
    /// Fire-and-forget: failures are logged, never retried. Returns whether
    /// the registry accepted the patch.
    pub async fn request(&self, value: &str) -> bool {
        let patch = TwinPatch::desired(&self.property, value);
        match self.registry.patch_twin(&self.device_id, &patch).await {
            Ok(()) => {
                tracing::info!(device_id = %self.device_id, value, "Requested desired value");
                true
            }
            Err(err) => {
                tracing::warn!(
                    device_id = %self.device_id,
                    value,
                    error = %err,
                    "Failed to patch desired value"
                );
                false
            }
        }
    }
}
