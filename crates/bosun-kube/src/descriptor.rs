//! Static per-kind resource metadata
//!
//! A [`ResourceDescriptor`] carries everything the generic client needs to
//! address a resource kind: API group/version, plural path segment, and
//! explicit capability flags (namespace scope, status subresource, log
//! retrieval). Capabilities are data, not duck typing: callers can inspect
//! them without attempting a call, and the client checks them before any
//! request is issued.

/// Static metadata for one resource kind
///
/// Immutable and shared read-only across every client of that kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Kind name as it appears in manifests, e.g. `Pod`
    pub kind: String,

    /// Plural path segment, e.g. `pods`
    pub plural: String,

    /// API group; empty for the core group
    pub group: String,

    /// API version within the group, e.g. `v1`
    pub version: String,

    /// Whether requests are scoped under a namespace
    pub namespaced: bool,

    /// Whether the kind exposes a `/status` subresource
    pub has_status: bool,

    /// Whether the kind exposes log retrieval
    pub supports_logs: bool,
}

impl ResourceDescriptor {
    /// Create a descriptor for a namespaced kind with no extra capabilities
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            plural: plural.into(),
            group: group.into(),
            version: version.into(),
            namespaced: true,
            has_status: false,
            supports_logs: false,
        }
    }

    /// Mark the kind as cluster-scoped
    pub fn cluster_scoped(mut self) -> Self {
        self.namespaced = false;
        self
    }

    /// Mark the kind as exposing a `/status` subresource
    pub fn with_status(mut self) -> Self {
        self.has_status = true;
        self
    }

    /// Mark the kind as exposing log retrieval
    pub fn with_logs(mut self) -> Self {
        self.supports_logs = true;
        self
    }

    /// `apiVersion` value for manifests of this kind
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Kind name of the list wrapper, e.g. `PodList`
    pub fn list_kind(&self) -> String {
        format!("{}List", self.kind)
    }

    /// API path prefix: `/api/v1` for core, `/apis/{group}/{version}` else
    pub fn api_base(&self) -> String {
        if self.group.is_empty() {
            format!("/api/{}", self.version)
        } else {
            format!("/apis/{}/{}", self.group, self.version)
        }
    }

    /// Collection path, inserting `/namespaces/{ns}/` when bound
    pub fn collection_path(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) if self.namespaced => {
                format!("{}/namespaces/{}/{}", self.api_base(), ns, self.plural)
            }
            _ => format!("{}/{}", self.api_base(), self.plural),
        }
    }

    /// Path of a single named resource
    pub fn resource_path(&self, namespace: Option<&str>, name: &str) -> String {
        format!("{}/{}", self.collection_path(namespace), name)
    }

    /// Path of the `/status` subresource
    pub fn status_path(&self, namespace: Option<&str>, name: &str) -> String {
        format!("{}/status", self.resource_path(namespace, name))
    }

    /// Path of the log sub-path
    pub fn log_path(&self, namespace: Option<&str>, name: &str) -> String {
        format!("{}/log", self.resource_path(namespace, name))
    }

    // Built-in kinds. Descriptors are plain values; nothing stops callers
    // from defining their own for custom resources.

    /// `v1` Namespace (cluster-scoped)
    pub fn namespaces() -> Self {
        Self::new("", "v1", "Namespace", "namespaces")
            .cluster_scoped()
            .with_status()
    }

    /// `v1` Node (cluster-scoped)
    pub fn nodes() -> Self {
        Self::new("", "v1", "Node", "nodes")
            .cluster_scoped()
            .with_status()
    }

    /// `v1` Pod
    pub fn pods() -> Self {
        Self::new("", "v1", "Pod", "pods").with_status().with_logs()
    }

    /// `v1` Service
    pub fn services() -> Self {
        Self::new("", "v1", "Service", "services").with_status()
    }

    /// `v1` ConfigMap
    pub fn config_maps() -> Self {
        Self::new("", "v1", "ConfigMap", "configmaps")
    }

    /// `v1` Secret
    pub fn secrets() -> Self {
        Self::new("", "v1", "Secret", "secrets")
    }

    /// `v1` ServiceAccount
    pub fn service_accounts() -> Self {
        Self::new("", "v1", "ServiceAccount", "serviceaccounts")
    }

    /// `v1` Event
    pub fn events() -> Self {
        Self::new("", "v1", "Event", "events")
    }

    /// `apps/v1` Deployment
    pub fn deployments() -> Self {
        Self::new("apps", "v1", "Deployment", "deployments").with_status()
    }
}
