//! Error types for bosun-config

use thiserror::Error;

/// Result type for bosun-config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or resolving a kubeconfig
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// Kubeconfig document is unreadable or structurally invalid
    #[error("failed to parse kubeconfig: {0}")]
    Parse(String),

    /// A referenced entity is missing from the document
    #[error("{kind} '{name}' not found in kubeconfig")]
    NotFound { kind: &'static str, name: String },

    /// The resolved user carries no recognized credential material
    #[error("user '{user}' has no supported authentication material (expected token or client certificate)")]
    UnsupportedAuth { user: String },

    /// Embedded credential material is not valid base64
    #[error("invalid base64 in '{field}': {message}")]
    InvalidCredentialData { field: &'static str, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl ConfigError {
    /// Check if this is a missing context/cluster/user error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}
