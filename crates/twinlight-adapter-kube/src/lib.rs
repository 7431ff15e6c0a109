//! # Kubernetes registry adapter
//!
//! Reads and patches device twins stored as KubeEdge `Device` custom
//! resources, addressed as
//! `/apis/{group}/{version}/namespaces/{namespace}/{plural}/{name}`.
//!
//! The [`ShadowApi`] trait is the seam controllers are written against;
//! [`KubeClient`] talks to a real API server and [`MemoryShadow`] keeps
//! documents in process. [`load_kubeconfig`] and [`in_cluster`] build a
//! [`KubeClientConfig`] from the usual credential sources.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod encoding;
pub mod kubeconfig;
pub mod memory;
pub mod shadow;

pub use client::{KubeClient, KubeClientConfig};
pub use encoding::{encode_path_segment, resource_path};
pub use kubeconfig::{in_cluster, load_kubeconfig, parse_kubeconfig, SERVICE_ACCOUNT_DIR};
pub use memory::MemoryShadow;
pub use shadow::{RegistryError, ShadowApi};
