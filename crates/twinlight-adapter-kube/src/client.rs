//! HTTP client for device resources on a Kubernetes API server.

use crate::encoding::resource_path;
use crate::shadow::{RegistryError, ShadowApi};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use twinlight_core::{TwinDocument, TwinPatch};

const MERGE_PATCH: &str = "application/merge-patch+json";

/// Kubernetes client configuration.
///
/// TLS material can be given as file paths or as PEM bytes (as found inline
/// in kubeconfig files); inline bytes take precedence.
#[derive(Debug, Clone)]
pub struct KubeClientConfig {
    /// Base URL of the API server (e.g., <http://127.0.0.1:8001> behind `kubectl proxy`)
    pub api_server: String,
    /// Namespace holding the device resources
    pub namespace: String,
    /// API group of the device resource
    pub group: String,
    /// API version of the device resource
    pub version: String,
    /// Plural resource name
    pub plural: String,
    /// Request timeout
    pub timeout: Duration,
    /// Optional bearer token for authentication
    pub bearer_token: Option<String>,
    /// Custom CA certificate path for self-signed server certs (PEM format)
    pub ca_cert_path: Option<PathBuf>,
    /// Custom CA certificate (PEM bytes)
    pub ca_cert_pem: Option<Vec<u8>>,
    /// Client certificate path for mTLS authentication (PEM format)
    pub client_cert_path: Option<PathBuf>,
    /// Client certificate (PEM bytes)
    pub client_cert_pem: Option<Vec<u8>>,
    /// Client private key path for mTLS authentication (PEM format)
    pub client_key_path: Option<PathBuf>,
    /// Client private key (PEM bytes)
    pub client_key_pem: Option<Vec<u8>>,
    /// Skip server certificate verification
    pub accept_invalid_certs: bool,
}

impl Default for KubeClientConfig {
    fn default() -> Self {
        Self {
            api_server: "http://127.0.0.1:8001".to_string(),
            namespace: "default".to_string(),
            group: "devices.kubeedge.io".to_string(),
            version: "v1alpha2".to_string(),
            plural: "devices".to_string(),
            timeout: Duration::from_secs(10),
            bearer_token: None,
            ca_cert_path: None,
            ca_cert_pem: None,
            client_cert_path: None,
            client_cert_pem: None,
            client_key_path: None,
            client_key_pem: None,
            accept_invalid_certs: false,
        }
    }
}

/// PEM bytes from inline data or a file, whichever is configured.
fn load_pem(
    inline: Option<&[u8]>,
    path: Option<&Path>,
    what: &str,
) -> Result<Option<Vec<u8>>, RegistryError> {
    if let Some(pem) = inline {
        return Ok(Some(pem.to_vec()));
    }
    path.map(|path| {
        fs::read(path).map_err(|e| {
            RegistryError::Init(format!("failed to read {what} {}: {e}", path.display()))
        })
    })
    .transpose()
}

/// HTTP client for KubeEdge device resources.
pub struct KubeClient {
    client: Client,
    config: KubeClientConfig,
}

impl KubeClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created, or if TLS
    /// material cannot be read or parsed.
    pub fn new(config: KubeClientConfig) -> Result<Self, RegistryError> {
        let mut builder = Client::builder().timeout(config.timeout);

        if config.api_server.starts_with("https://") {
            builder = builder
                .use_rustls_tls()
                .danger_accept_invalid_certs(config.accept_invalid_certs);

            let ca = load_pem(
                config.ca_cert_pem.as_deref(),
                config.ca_cert_path.as_deref(),
                "CA certificate",
            )?;
            if let Some(ca) = ca {
                let cert = reqwest::Certificate::from_pem(&ca).map_err(|e| {
                    RegistryError::Init(format!("failed to parse CA certificate: {e}"))
                })?;
                builder = builder.add_root_certificate(cert);
                tracing::debug!("Loaded cluster CA certificate");
            }

            let cert = load_pem(
                config.client_cert_pem.as_deref(),
                config.client_cert_path.as_deref(),
                "client certificate",
            )?;
            let key = load_pem(
                config.client_key_pem.as_deref(),
                config.client_key_path.as_deref(),
                "client key",
            )?;
            if let (Some(mut identity_pem), Some(key)) = (cert, key) {
                identity_pem.extend_from_slice(&key);
                let identity = reqwest::Identity::from_pem(&identity_pem).map_err(|e| {
                    RegistryError::Init(format!("failed to create client identity: {e}"))
                })?;
                builder = builder.identity(identity);
                tracing::debug!("Loaded client identity for mTLS");
            }
        }

        let client = builder
            .build()
            .map_err(|e| RegistryError::Init(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// URL of the device resource named `device_id`.
    #[must_use]
    pub fn device_url(&self, device_id: &str) -> String {
        format!(
            "{}{}",
            self.config.api_server.trim_end_matches('/'),
            resource_path(
                &self.config.group,
                &self.config.version,
                &self.config.namespace,
                &self.config.plural,
                device_id,
            )
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Get the raw device resource.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn get_device(&self, device_id: &str) -> Result<Value, RegistryError> {
        let url = self.device_url(device_id);

        tracing::debug!(device_id, url, "GET device");

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RegistryError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::Parse(e.to_string()))
    }

    /// Merge-patch the device resource.
    ///
    /// # Errors
    ///
    /// Returns error on network or API errors.
    pub async fn patch_device(&self, device_id: &str, body: &Value) -> Result<(), RegistryError> {
        let url = self.device_url(device_id);

        tracing::debug!(device_id, url, "PATCH device");

        let request = self
            .client
            .patch(&url)
            .header("Content-Type", MERGE_PATCH)
            .body(body.to_string());

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RegistryError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

/// Patches are sent as `application/merge-patch+json`. JSON merge patches
/// replace arrays wholesale, so a desired patch leaves `status.twins`
/// holding only the patched entry until the edge core writes the next
/// reported value back.
impl ShadowApi for KubeClient {
    async fn get_twin(&self, device_id: &str) -> Result<TwinDocument, RegistryError> {
        let device = self.get_device(device_id).await?;
        serde_json::from_value(device).map_err(|e| RegistryError::Parse(e.to_string()))
    }

    async fn patch_twin(&self, device_id: &str, patch: &TwinPatch) -> Result<(), RegistryError> {
        let body = serde_json::to_value(patch).map_err(|e| RegistryError::Parse(e.to_string()))?;
        self.patch_device(device_id, &body).await
    }
}
