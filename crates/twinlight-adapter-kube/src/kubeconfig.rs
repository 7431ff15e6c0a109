//! Credential discovery: kubeconfig files and in-cluster service accounts.
//!
//! Only static credentials are understood: bearer tokens (inline or
//! `tokenFile`), client certificates and CA certificates, each either inline
//! (`*-data`, base64) or as a path relative to the kubeconfig file. Exec and
//! auth-provider plugins are not run.

use crate::client::KubeClientConfig;
use crate::shadow::RegistryError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Where pods find their service account credentials.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Kubeconfig {
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    users: Vec<NamedUser>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    current_context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: Cluster,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Cluster {
    server: String,
    #[serde(default)]
    certificate_authority: Option<PathBuf>,
    #[serde(default)]
    certificate_authority_data: Option<String>,
    #[serde(default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    #[serde(default)]
    user: User,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct User {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "tokenFile")]
    token_file: Option<PathBuf>,
    #[serde(default)]
    client_certificate: Option<PathBuf>,
    #[serde(default)]
    client_certificate_data: Option<String>,
    #[serde(default)]
    client_key: Option<PathBuf>,
    #[serde(default)]
    client_key_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: Context,
}

#[derive(Debug, Deserialize)]
struct Context {
    cluster: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    namespace: Option<String>,
}

fn config_error(message: impl Into<String>) -> RegistryError {
    RegistryError::Config(message.into())
}

/// Load a kubeconfig file and resolve `context` (or its current context).
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed, or if the context,
/// its cluster or a referenced credential file is missing.
pub fn load_kubeconfig(path: &Path, context: Option<&str>) -> Result<KubeClientConfig, RegistryError> {
    let text = fs::read_to_string(path)
        .map_err(|e| config_error(format!("failed to read kubeconfig {}: {e}", path.display())))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_kubeconfig(&text, base, context)
}

/// Resolve a kubeconfig document. Relative paths are taken from `base`.
///
/// # Errors
///
/// See [`load_kubeconfig`].
pub fn parse_kubeconfig(
    yaml: &str,
    base: &Path,
    context: Option<&str>,
) -> Result<KubeClientConfig, RegistryError> {
    let kubeconfig: Kubeconfig = serde_yaml::from_str(yaml)
        .map_err(|e| config_error(format!("invalid kubeconfig: {e}")))?;

    let context_name = context
        .map(str::to_string)
        .or(kubeconfig.current_context)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| config_error("kubeconfig has no current context"))?;

    let context = kubeconfig
        .contexts
        .into_iter()
        .find(|c| c.name == context_name)
        .map(|c| c.context)
        .ok_or_else(|| config_error(format!("context '{context_name}' not found")))?;

    let cluster = kubeconfig
        .clusters
        .into_iter()
        .find(|c| c.name == context.cluster)
        .map(|c| c.cluster)
        .ok_or_else(|| config_error(format!("cluster '{}' not found", context.cluster)))?;

    let user = kubeconfig
        .users
        .into_iter()
        .find(|u| u.name == context.user)
        .map(|u| u.user)
        .unwrap_or_default();

    let mut config = KubeClientConfig {
        api_server: cluster.server,
        accept_invalid_certs: cluster.insecure_skip_tls_verify,
        ..KubeClientConfig::default()
    };
    if let Some(namespace) = context.namespace.filter(|ns| !ns.is_empty()) {
        config.namespace = namespace;
    }

    config.ca_cert_pem = decode_data(cluster.certificate_authority_data.as_deref(), "certificate-authority-data")?;
    config.ca_cert_path = cluster.certificate_authority.map(|p| base.join(p));

    config.client_cert_pem = decode_data(user.client_certificate_data.as_deref(), "client-certificate-data")?;
    config.client_cert_path = user.client_certificate.map(|p| base.join(p));
    config.client_key_pem = decode_data(user.client_key_data.as_deref(), "client-key-data")?;
    config.client_key_path = user.client_key.map(|p| base.join(p));

    config.bearer_token = match (user.token, user.token_file) {
        (Some(token), _) => Some(token),
        (None, Some(file)) => Some(read_token(&base.join(file))?),
        (None, None) => None,
    };

    tracing::debug!(
        context = %context_name,
        api_server = %config.api_server,
        namespace = %config.namespace,
        "Resolved kubeconfig context"
    );

    Ok(config)
}

/// Credentials of the pod's service account, found under `dir`.
///
/// `host` and `port` come from `KUBERNETES_SERVICE_HOST` and
/// `KUBERNETES_SERVICE_PORT`.
///
/// # Errors
///
/// Returns error if the token cannot be read.
pub fn in_cluster(host: &str, port: &str, dir: &Path) -> Result<KubeClientConfig, RegistryError> {
    let host = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    };

    let namespace = fs::read_to_string(dir.join("namespace"))
        .ok()
        .map(|ns| ns.trim().to_string())
        .filter(|ns| !ns.is_empty());

    let mut config = KubeClientConfig {
        api_server: format!("https://{host}:{port}"),
        bearer_token: Some(read_token(&dir.join("token"))?),
        ca_cert_path: Some(dir.join("ca.crt")),
        ..KubeClientConfig::default()
    };
    if let Some(namespace) = namespace {
        config.namespace = namespace;
    }

    Ok(config)
}

fn decode_data(data: Option<&str>, field: &str) -> Result<Option<Vec<u8>>, RegistryError> {
    data.map(|data| {
        STANDARD
            .decode(data.trim())
            .map_err(|e| config_error(format!("invalid {field}: {e}")))
    })
    .transpose()
}

fn read_token(path: &Path) -> Result<String, RegistryError> {
    let token = fs::read_to_string(path)
        .map_err(|e| config_error(format!("failed to read token {}: {e}", path.display())))?;
    Ok(token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KUBECONFIG: &str = r"
apiVersion: v1
kind: Config
current-context: edge
clusters:
  - name: edge-cluster
    cluster:
      server: https://10.0.0.1:6443
      certificate-authority-data: Q0EtUEVN
  - name: lab
    cluster:
      server: https://lab:6443
      certificate-authority: certs/ca.crt
      insecure-skip-tls-verify: true
users:
  - name: admin
    user:
      client-certificate-data: Q0VSVA==
      client-key-data: S0VZ
  - name: robot
    user:
      token: abc123
contexts:
  - name: edge
    context:
      cluster: edge-cluster
      user: admin
      namespace: traffic
  - name: lab
    context:
      cluster: lab
      user: robot
";

    #[test]
    fn current_context_with_inline_data() {
        let config = parse_kubeconfig(KUBECONFIG, Path::new("/home/u/.kube"), None).unwrap();

        assert_eq!(config.api_server, "https://10.0.0.1:6443");
        assert_eq!(config.namespace, "traffic");
        assert_eq!(config.ca_cert_pem.as_deref(), Some(b"CA-PEM".as_slice()));
        assert_eq!(config.client_cert_pem.as_deref(), Some(b"CERT".as_slice()));
        assert_eq!(config.client_key_pem.as_deref(), Some(b"KEY".as_slice()));
        assert!(config.bearer_token.is_none());
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.group, "devices.kubeedge.io");
    }

    #[test]
    fn explicit_context_with_token_and_relative_paths() {
        let config =
            parse_kubeconfig(KUBECONFIG, Path::new("/home/u/.kube"), Some("lab")).unwrap();

        assert_eq!(config.api_server, "https://lab:6443");
        assert_eq!(config.namespace, "default");
        assert_eq!(config.bearer_token.as_deref(), Some("abc123"));
        assert_eq!(
            config.ca_cert_path,
            Some(PathBuf::from("/home/u/.kube/certs/ca.crt"))
        );
        assert!(config.ca_cert_pem.is_none());
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn token_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("token"), "file-token\n").unwrap();
        fs::write(
            dir.path().join("config"),
            r"
current-context: c
clusters: [{name: k, cluster: {server: 'http://127.0.0.1:8001'}}]
users: [{name: u, user: {tokenFile: token}}]
contexts: [{name: c, context: {cluster: k, user: u}}]
",
        )
        .unwrap();

        let config = load_kubeconfig(&dir.path().join("config"), None).unwrap();
        assert_eq!(config.bearer_token.as_deref(), Some("file-token"));
        assert_eq!(config.api_server, "http://127.0.0.1:8001");
    }

    #[test]
    fn resolution_errors() {
        let base = Path::new(".");
        assert!(parse_kubeconfig(KUBECONFIG, base, Some("missing")).is_err());
        assert!(parse_kubeconfig("clusters: []", base, None).is_err());
        assert!(parse_kubeconfig(": not yaml", base, None).is_err());

        let dangling = r"
current-context: c
contexts: [{name: c, context: {cluster: gone}}]
";
        let err = parse_kubeconfig(dangling, base, None).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
        assert!(err.to_string().contains("cluster 'gone' not found"));

        assert!(load_kubeconfig(Path::new("/nonexistent/kubeconfig"), None).is_err());
    }

    #[test]
    fn service_account_credentials() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("token"), "sa-token\n").unwrap();
        fs::write(dir.path().join("namespace"), "edge\n").unwrap();

        let config = in_cluster("10.96.0.1", "443", dir.path()).unwrap();
        assert_eq!(config.api_server, "https://10.96.0.1:443");
        assert_eq!(config.bearer_token.as_deref(), Some("sa-token"));
        assert_eq!(config.namespace, "edge");
        assert_eq!(config.ca_cert_path, Some(dir.path().join("ca.crt")));

        let v6 = in_cluster("fd00::1", "6443", dir.path()).unwrap();
        assert_eq!(v6.api_server, "https://[fd00::1]:6443");
    }

    #[test]
    fn service_account_without_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(in_cluster("10.96.0.1", "443", dir.path()).is_err());
    }
}
