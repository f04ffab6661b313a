//! Bosun Config - Kubeconfig loading and context resolution
//!
//! This crate turns a multi-context kubeconfig document into a concrete,
//! authenticated [`Connection`]:
//! - **Kubeconfig model**: serde types for contexts, clusters and users
//! - **Resolution**: active context -> endpoint + credential material
//! - **Credential persistence**: embedded base64 certificate/key material is
//!   decoded and written to a securely-permissioned per-process location
//! - **In-cluster config**: service-account token pickup for workloads
//!   running inside a cluster

pub mod error;
pub mod kubeconfig;
pub mod resolver;

pub use error::{ConfigError, Result};
pub use kubeconfig::{
    Cluster, Context, Kubeconfig, NamedCluster, NamedContext, NamedUser, User, default_path,
};
pub use resolver::{AuthMaterial, Connection, SERVICE_ACCOUNT_DIR, in_cluster, resolve};
