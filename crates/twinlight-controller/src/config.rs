//! Controller configuration.

use crate::controller::ReadFailurePolicy;
use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use twinlight_adapter_kube::{in_cluster, load_kubeconfig, KubeClientConfig, SERVICE_ACCOUNT_DIR};
use twinlight_core::{DEFAULT_DEVICE_ID, DEFAULT_PROPERTY};

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Device whose twin is controlled
    pub device_id: String,

    /// Twin property to track
    pub property: String,

    /// Registry connection
    pub registry: KubeClientConfig,

    /// Dashboard listen address
    pub bind: SocketAddr,

    /// Behavior on registry read failures
    pub read_failure: ReadFailurePolicy,

    /// Dashboard auto-refresh interval in seconds
    pub refresh_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.to_string(),
            property: DEFAULT_PROPERTY.to_string(),
            registry: KubeClientConfig::default(),
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            read_failure: ReadFailurePolicy::CacheFallback,
            refresh_secs: 1,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables.
    ///
    /// Registry credentials are discovered first, from the first source
    /// present:
    ///
    /// 1. `TWINLIGHT_KUBECONFIG` (context from `TWINLIGHT_KUBE_CONTEXT`)
    /// 2. the first file listed in `KUBECONFIG`
    /// 3. `$HOME/.kube/config`, if it exists
    /// 4. the pod service account, if `KUBERNETES_SERVICE_HOST` is set
    /// 5. a local `kubectl proxy` at `http://127.0.0.1:8001`
    ///
    /// The registry variables below then override individual fields.
    ///
    /// # Environment Variables
    ///
    /// - `TWINLIGHT_DEVICE_ID`: Device resource name
    /// - `TWINLIGHT_PROPERTY`: Twin property name
    /// - `TWINLIGHT_KUBE_API`: API server base URL
    /// - `TWINLIGHT_NAMESPACE`: Namespace of the device resource
    /// - `TWINLIGHT_BEARER_TOKEN`: Bearer token
    /// - `TWINLIGHT_CA_CERT`, `TWINLIGHT_CLIENT_CERT`, `TWINLIGHT_CLIENT_KEY`: TLS material
    /// - `TWINLIGHT_HTTP_TIMEOUT_SECS`: Registry request timeout
    /// - `TWINLIGHT_BIND`: Dashboard listen address
    /// - `TWINLIGHT_READ_FAILURE`: "cache" or "surface"
    /// - `TWINLIGHT_REFRESH_SECS`: Dashboard auto-refresh interval
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but malformed, or if a
    /// discovered credential source cannot be loaded.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self {
            registry: discover_registry(&lookup)?,
            ..Self::default()
        };

        if let Some(device_id) = lookup("TWINLIGHT_DEVICE_ID") {
            config.device_id = device_id;
        }

        if let Some(property) = lookup("TWINLIGHT_PROPERTY") {
            config.property = property;
        }

        if let Some(url) = lookup("TWINLIGHT_KUBE_API") {
            config.registry.api_server = url;
        }

        if let Some(namespace) = lookup("TWINLIGHT_NAMESPACE") {
            config.registry.namespace = namespace;
        }

        if let Some(token) = lookup("TWINLIGHT_BEARER_TOKEN") {
            config.registry.bearer_token = Some(token);
        }

        if let Some(path) = lookup("TWINLIGHT_CA_CERT") {
            config.registry.ca_cert_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("TWINLIGHT_CLIENT_CERT") {
            config.registry.client_cert_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("TWINLIGHT_CLIENT_KEY") {
            config.registry.client_key_path = Some(PathBuf::from(path));
        }

        if let Some(secs) = lookup("TWINLIGHT_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .context("Invalid TWINLIGHT_HTTP_TIMEOUT_SECS")?;
            config.registry.timeout = Duration::from_secs(secs);
        }

        if let Some(bind) = lookup("TWINLIGHT_BIND") {
            config.bind = bind.parse().context("Invalid TWINLIGHT_BIND")?;
        }

        if let Some(policy) = lookup("TWINLIGHT_READ_FAILURE") {
            config.read_failure = policy
                .parse::<ReadFailurePolicy>()
                .map_err(|e| anyhow!(e))
                .context("Invalid TWINLIGHT_READ_FAILURE")?;
        }

        if let Some(secs) = lookup("TWINLIGHT_REFRESH_SECS") {
            config.refresh_secs = secs.parse().context("Invalid TWINLIGHT_REFRESH_SECS")?;
        }

        Ok(config)
    }
}

fn discover_registry(lookup: &impl Fn(&str) -> Option<String>) -> Result<KubeClientConfig> {
    let context = lookup("TWINLIGHT_KUBE_CONTEXT");

    let explicit = lookup("TWINLIGHT_KUBECONFIG").or_else(|| {
        lookup("KUBECONFIG")?
            .split(':')
            .find(|path| !path.is_empty())
            .map(str::to_string)
    });
    if let Some(path) = explicit {
        tracing::info!(path = %path, "Using kubeconfig");
        return load_kubeconfig(Path::new(&path), context.as_deref())
            .with_context(|| format!("Failed to load kubeconfig {path}"));
    }

    if let Some(home) = lookup("HOME") {
        let path = Path::new(&home).join(".kube").join("config");
        if path.is_file() {
            tracing::info!(path = %path.display(), "Using kubeconfig");
            return load_kubeconfig(&path, context.as_deref())
                .with_context(|| format!("Failed to load kubeconfig {}", path.display()));
        }
    }

    if let Some(host) = lookup("KUBERNETES_SERVICE_HOST") {
        let port = lookup("KUBERNETES_SERVICE_PORT").unwrap_or_else(|| "443".to_string());
        tracing::info!(host = %host, "Using in-cluster service account");
        return in_cluster(&host, &port, Path::new(SERVICE_ACCOUNT_DIR))
            .context("Failed to load in-cluster credentials");
    }

    Ok(KubeClientConfig::default())
}
