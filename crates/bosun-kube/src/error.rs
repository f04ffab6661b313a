//! Error types for bosun-kube

use thiserror::Error;

use crate::transport::TransportError;

/// Result type for bosun-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during resource operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Resource (or sub-object) does not exist on the server
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// The descriptor does not support the attempted operation
    #[error("{kind} does not support {operation}: {reason}")]
    UnsupportedOperation {
        operation: &'static str,
        kind: String,
        reason: String,
    },

    /// Optimistic concurrency failure: the object's resourceVersion is stale
    #[error("conflict updating {kind} '{name}': {message}")]
    Conflict {
        kind: String,
        name: String,
        message: String,
    },

    /// Failure propagated unchanged from the transport
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Manifest text could not be interpreted as a resource document
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Connection descriptor cannot back a transport
    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] bosun_config::ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::InvalidManifest(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a missing-resource error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::NotFound { .. })
    }

    /// Check if this is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Conflict { .. })
    }

    /// Check if this is a capability failure
    pub fn is_unsupported(&self) -> bool {
        matches!(self, KubeError::UnsupportedOperation { .. })
    }
}
