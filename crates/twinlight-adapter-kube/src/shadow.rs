//! Request/response access to device twin documents.

use std::future::Future;
use std::sync::Arc;
use twinlight_core::{TwinDocument, TwinPatch};

/// A registry holding one twin document per device.
pub trait ShadowApi: Send + Sync {
    /// Fetch the twin document of `device_id`.
    fn get_twin(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<TwinDocument, RegistryError>> + Send;

    /// Apply `patch` to the twin document of `device_id`.
    fn patch_twin(
        &self,
        device_id: &str,
        patch: &TwinPatch,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;
}

impl<T: ShadowApi> ShadowApi for Arc<T> {
    async fn get_twin(&self, device_id: &str) -> Result<TwinDocument, RegistryError> {
        (**self).get_twin(device_id).await
    }

    async fn patch_twin(&self, device_id: &str, patch: &TwinPatch) -> Result<(), RegistryError> {
        (**self).patch_twin(device_id, patch).await
    }
}

/// Errors that can occur talking to the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// Credentials could not be discovered or read
    #[error("config error: {0}")]
    Config(String),
    /// Request could not be sent or timed out
    #[error("request error: {0}")]
    Request(String),
    /// API returned an error status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
    /// Response body was not a twin document
    #[error("parse error: {0}")]
    Parse(String),
}
