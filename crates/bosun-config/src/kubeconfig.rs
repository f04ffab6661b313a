//! Serde model of the kubeconfig document
//!
//! Mirrors the on-disk layout used by kubectl: named lists of contexts,
//! clusters and users plus a `current-context` pointer. Unknown fields are
//! ignored so documents written by other tooling keep loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Environment variable overriding the default kubeconfig location
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// A parsed kubeconfig document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kubeconfig {
    /// Named cluster entries
    pub clusters: Vec<NamedCluster>,

    /// Named context entries (ordered as in the document)
    pub contexts: Vec<NamedContext>,

    /// Named user entries
    pub users: Vec<NamedUser>,

    /// Name of the context to use when none is given explicitly
    #[serde(rename = "current-context", skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
}

/// A cluster entry with its name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

/// Connection details for a single cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// API server endpoint, e.g. `https://10.0.0.1:6443`
    pub server: String,

    #[serde(
        rename = "certificate-authority",
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_authority: Option<String>,

    #[serde(
        rename = "certificate-authority-data",
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_authority_data: Option<String>,

    #[serde(
        rename = "insecure-skip-tls-verify",
        skip_serializing_if = "Option::is_none"
    )]
    pub insecure_skip_tls_verify: Option<bool>,
}

/// A context entry with its name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

/// Pairing of a cluster and a user, optionally with a default namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub cluster: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// A user entry with its name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: User,
}

/// Credential material for a single user
///
/// Exactly which fields are set decides the authentication mode during
/// resolution; see [`crate::resolver::resolve`] for the precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(rename = "client-certificate", skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,

    #[serde(rename = "client-key", skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,

    #[serde(
        rename = "client-certificate-data",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_certificate_data: Option<String>,

    #[serde(rename = "client-key-data", skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
}

impl Kubeconfig {
    /// Load a kubeconfig document from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml(&text)
    }

    /// Parse a kubeconfig document from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the document from `$KUBECONFIG` or the default location
    pub fn load_default() -> Result<Self> {
        let path = default_path().ok_or_else(|| {
            ConfigError::Parse("no kubeconfig found: $KUBECONFIG unset and home directory unknown".to_string())
        })?;
        Self::load(path)
    }

    /// Find a context by name
    pub fn find_context(&self, name: &str) -> Option<&NamedContext> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Find a cluster by name
    pub fn find_cluster(&self, name: &str) -> Option<&NamedCluster> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// Find a user by name
    pub fn find_user(&self, name: &str) -> Option<&NamedUser> {
        self.users.iter().find(|u| u.name == name)
    }
}

/// Default kubeconfig path: `$KUBECONFIG` if set, else `~/.kube/config`
pub fn default_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(KUBECONFIG_ENV)
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
apiVersion: v1
kind: Config
current-context: c1
clusters:
  - name: k
    cluster:
      server: https://10.0.0.1:6443
      insecure-skip-tls-verify: true
contexts:
  - name: c1
    context:
      cluster: k
      user: u
      namespace: team-a
users:
  - name: u
    user:
      token: abc123
"#;

    #[test]
    fn test_parse_sample_document() {
        let config = Kubeconfig::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.current_context.as_deref(), Some("c1"));
        assert_eq!(config.clusters.len(), 1);
        assert_eq!(config.clusters[0].cluster.server, "https://10.0.0.1:6443");
        assert_eq!(
            config.clusters[0].cluster.insecure_skip_tls_verify,
            Some(true)
        );
        assert_eq!(config.contexts[0].context.namespace.as_deref(), Some("team-a"));
        assert_eq!(config.users[0].user.token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_certificate_fields() {
        let yaml = r#"
clusters:
  - name: k
    cluster:
      server: https://example:6443
      certificate-authority-data: Y2EtcGVt
contexts:
  - name: c
    context:
      cluster: k
      user: u
users:
  - name: u
    user:
      client-certificate: /pki/client.crt
      client-key: /pki/client.key
"#;
        let config = Kubeconfig::from_yaml(yaml).unwrap();

        assert_eq!(
            config.clusters[0].cluster.certificate_authority_data.as_deref(),
            Some("Y2EtcGVt")
        );
        let user = &config.users[0].user;
        assert_eq!(user.client_certificate.as_deref(), Some("/pki/client.crt"));
        assert_eq!(user.client_key.as_deref(), Some("/pki/client.key"));
        assert!(user.token.is_none());
    }

    #[test]
    fn test_missing_top_level_key_is_parse_error() {
        // No `users` list at all
        let yaml = r#"
clusters:
  - name: k
    cluster:
      server: https://example:6443
contexts:
  - name: c
    context:
      cluster: k
      user: u
"#;
        let err = Kubeconfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let yaml = r#"
apiVersion: v1
kind: Config
preferences: {}
clusters:
  - name: k
    cluster:
      server: https://example:6443
      extensions: []
contexts:
  - name: c
    context:
      cluster: k
      user: u
users:
  - name: u
    user:
      token: t
"#;
        assert!(Kubeconfig::from_yaml(yaml).is_ok());
    }

    #[test]
    fn test_find_helpers() {
        let config = Kubeconfig::from_yaml(SAMPLE).unwrap();

        assert!(config.find_context("c1").is_some());
        assert!(config.find_context("missing").is_none());
        assert_eq!(config.find_cluster("k").unwrap().cluster.server, "https://10.0.0.1:6443");
        assert!(config.find_user("u").is_some());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Kubeconfig::load(&path).unwrap();
        assert_eq!(config.contexts.len(), 1);

        let err = Kubeconfig::load(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
