//! Wrappers over decoded resource documents
//!
//! [`ResourceObject`] is a thin mutable view over an untyped document:
//! identity and label/annotation accessors plus raw access for
//! kind-specific spec/status. Mutations touch only the in-memory copy; an
//! explicit `update`/`patch` through the originating client is required to
//! persist them. [`ListResult`] and [`StatusResult`] wrap the two other
//! response shapes the API produces.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::descriptor::ResourceDescriptor;
use crate::error::{KubeError, Result};

/// A mutable view over a decoded resource document
///
/// Not safe for concurrent mutation from multiple threads without external
/// synchronization; it is a plain value holder.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceObject {
    value: Value,
    namespaced: bool,
}

impl ResourceObject {
    /// Wrap a decoded document, recording the descriptor's scope
    pub fn wrap(value: Value, descriptor: &ResourceDescriptor) -> Self {
        Self {
            value,
            namespaced: descriptor.namespaced,
        }
    }

    /// `apiVersion` field
    pub fn api_version(&self) -> Option<&str> {
        self.value.get("apiVersion").and_then(Value::as_str)
    }

    /// `kind` field
    pub fn kind(&self) -> Option<&str> {
        self.value.get("kind").and_then(Value::as_str)
    }

    /// `metadata.name`
    pub fn name(&self) -> Option<&str> {
        self.metadata().and_then(|m| m.get("name")).and_then(Value::as_str)
    }

    /// `metadata.namespace`
    ///
    /// Fails for cluster-scoped kinds, which have no namespace concept.
    pub fn namespace(&self) -> Result<Option<&str>> {
        if !self.namespaced {
            return Err(KubeError::UnsupportedOperation {
                operation: "namespace",
                kind: self.kind().unwrap_or("resource").to_string(),
                reason: "kind is cluster-scoped".to_string(),
            });
        }
        Ok(self
            .metadata()
            .and_then(|m| m.get("namespace"))
            .and_then(Value::as_str))
    }

    /// `metadata.resourceVersion`, when the server has assigned one
    pub fn resource_version(&self) -> Option<&str> {
        self.metadata()
            .and_then(|m| m.get("resourceVersion"))
            .and_then(Value::as_str)
    }

    /// `metadata.labels` as an owned map
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.string_map("labels")
    }

    /// Replace `metadata.labels` in the in-memory copy
    pub fn set_labels(&mut self, labels: BTreeMap<String, String>) {
        self.set_string_map("labels", labels);
    }

    /// `metadata.annotations` as an owned map
    pub fn annotations(&self) -> BTreeMap<String, String> {
        self.string_map("annotations")
    }

    /// Replace `metadata.annotations` in the in-memory copy
    pub fn set_annotations(&mut self, annotations: BTreeMap<String, String>) {
        self.set_string_map("annotations", annotations);
    }

    /// Borrow the underlying document
    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// Mutably borrow the underlying document (spec/status edits)
    pub fn raw_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Unwrap into the underlying document
    pub fn into_raw(self) -> Value {
        self.value
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.value.get("metadata").and_then(Value::as_object)
    }

    fn string_map(&self, field: &str) -> BTreeMap<String, String> {
        self.metadata()
            .and_then(|m| m.get(field))
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn set_string_map(&mut self, field: &str, entries: BTreeMap<String, String>) {
        let Some(root) = self.value.as_object_mut() else {
            return;
        };
        let metadata = root
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(metadata) = metadata.as_object_mut() {
            let map: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            metadata.insert(field.to_string(), Value::Object(map));
        }
    }
}

/// Raw list response: `kind` suffixed "List" plus unwrapped items
///
/// Produced only by the explicit list operation; `get()` with no argument
/// or a selector returns wrapped [`ResourceObject`]s instead.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResult {
    /// List kind, e.g. `PodList`
    pub kind: String,

    /// API version of the list, e.g. `v1`
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Raw resource documents, in server order
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Outcome reported by the server for a delete (or similar) operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Success,
    Failure,
}

/// Server-reported operation status, possibly embedding a resource
///
/// Deletion is not always immediate: some kinds answer with the resource
/// itself in a terminal phase (e.g. a namespace entering `Terminating`)
/// instead of a bare `Status` document. That resource is surfaced here
/// rather than swallowed.
#[derive(Debug, Clone)]
pub struct StatusResult {
    /// Success or Failure as reported by the server
    pub outcome: StatusOutcome,

    /// Machine-readable reason, when present
    pub reason: Option<String>,

    /// Human-readable message, when present
    pub message: Option<String>,

    /// Embedded resource, when the server answered with the object
    pub resource: Option<ResourceObject>,
}

impl StatusResult {
    /// Classify a response document into a status result
    pub fn from_response(value: Value, descriptor: &ResourceDescriptor) -> Self {
        if value.get("kind").and_then(Value::as_str) == Some("Status") {
            let outcome = match value.get("status").and_then(Value::as_str) {
                Some("Failure") => StatusOutcome::Failure,
                _ => StatusOutcome::Success,
            };
            Self {
                outcome,
                reason: value
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                message: value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                resource: None,
            }
        } else {
            Self {
                outcome: StatusOutcome::Success,
                reason: None,
                message: None,
                resource: Some(ResourceObject::wrap(value, descriptor)),
            }
        }
    }

    /// True exactly when the server reported a Failure outcome
    pub fn is_failure(&self) -> bool {
        self.outcome == StatusOutcome::Failure
    }
}
