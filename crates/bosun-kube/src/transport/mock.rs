//! Mock transport for testing
//!
//! An in-memory API server speaking the same path and payload conventions
//! as a real cluster, useful for unit tests without network access. Objects
//! live under registered collection paths; the mock implements list/get,
//! create, optimistic-concurrency replace, RFC 7386 merge patch, delete
//! with graceful-termination semantics, and canned log output.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::{Method, Request, RequestBody, TextChunks, Transport, TransportError};
use crate::descriptor::ResourceDescriptor;

/// In-memory transport for testing
#[derive(Clone, Default)]
pub struct MockTransport {
    /// Storage: collection path -> name -> object
    store: Arc<RwLock<HashMap<String, BTreeMap<String, Value>>>>,
    /// Canned log text: resource path -> text
    logs: Arc<RwLock<HashMap<String, String>>>,
    /// Monotonic resourceVersion source
    versions: Arc<AtomicU64>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
    pub patches: usize,
    pub deletes: usize,
    pub log_requests: usize,
}

impl OperationCounts {
    /// Total number of requests that reached the transport
    pub fn total(&self) -> usize {
        self.gets
            + self.lists
            + self.creates
            + self.updates
            + self.patches
            + self.deletes
            + self.log_requests
    }
}

impl MockTransport {
    /// Create a new empty mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty collection so lists against it succeed
    pub fn register(&self, descriptor: &ResourceDescriptor, namespace: Option<&str>) {
        let mut store = self.store.write().unwrap();
        store
            .entry(descriptor.collection_path(namespace))
            .or_default();
    }

    /// Seed an object into its collection, assigning a resourceVersion
    pub fn insert(&self, descriptor: &ResourceDescriptor, namespace: Option<&str>, object: Value) {
        let mut object = object;
        self.assign_version(&mut object);
        let name = object_name(&object);

        let mut store = self.store.write().unwrap();
        store
            .entry(descriptor.collection_path(namespace))
            .or_default()
            .insert(name, object);
    }

    /// Seed canned log text for a named resource
    pub fn set_logs(
        &self,
        descriptor: &ResourceDescriptor,
        namespace: Option<&str>,
        name: &str,
        text: &str,
    ) {
        let mut logs = self.logs.write().unwrap();
        logs.insert(descriptor.resource_path(namespace, name), text.to_string());
    }

    /// Look up a stored object (for assertions)
    pub fn stored(
        &self,
        descriptor: &ResourceDescriptor,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<Value> {
        let store = self.store.read().unwrap();
        store
            .get(&descriptor.collection_path(namespace))
            .and_then(|collection| collection.get(name))
            .cloned()
    }

    /// Count stored objects across all collections
    pub fn object_count(&self) -> usize {
        let store = self.store.read().unwrap();
        store.values().map(BTreeMap::len).sum()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        let mut ops = self.operations.write().unwrap();
        *ops = OperationCounts::default();
    }

    fn count(&self, bump: impl FnOnce(&mut OperationCounts)) {
        let mut ops = self.operations.write().unwrap();
        bump(&mut ops);
    }

    fn assign_version(&self, object: &mut Value) {
        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(metadata) = object
            .as_object_mut()
            .map(|root| {
                root.entry("metadata")
                    .or_insert_with(|| Value::Object(Map::new()))
            })
            .and_then(Value::as_object_mut)
        {
            metadata.insert(
                "resourceVersion".to_string(),
                Value::String(version.to_string()),
            );
        }
    }

    fn handle_get(&self, request: &Request) -> Result<Value, TransportError> {
        let path = request.path.strip_suffix("/status").unwrap_or(&request.path);

        {
            let store = self.store.read().unwrap();
            if let Some(collection) = store.get(path) {
                self.count(|ops| ops.lists += 1);
                let selector = request.query_param("labelSelector");
                let items: Vec<Value> = collection
                    .values()
                    .filter(|object| matches_selector(object, selector))
                    .cloned()
                    .collect();
                return Ok(list_document(collection, items));
            }
        }

        let (collection_path, name) = split_resource_path(path)?;
        let store = self.store.read().unwrap();
        let found = store
            .get(collection_path)
            .and_then(|collection| collection.get(name))
            .cloned();
        match found {
            Some(object) => {
                self.count(|ops| ops.gets += 1);
                Ok(object)
            }
            None => Err(not_found(name)),
        }
    }

    fn handle_create(&self, request: &Request) -> Result<Value, TransportError> {
        self.count(|ops| ops.creates += 1);

        let mut object = request_json(request)?;
        self.assign_version(&mut object);
        let name = object_name(&object);

        let mut store = self.store.write().unwrap();
        let collection = store.entry(request.path.clone()).or_default();
        if collection.contains_key(&name) {
            return Err(TransportError::Api {
                code: 409,
                reason: "AlreadyExists".to_string(),
                message: format!("\"{name}\" already exists"),
            });
        }
        collection.insert(name, object.clone());
        Ok(object)
    }

    fn handle_replace(&self, request: &Request) -> Result<Value, TransportError> {
        self.count(|ops| ops.updates += 1);

        let mut object = request_json(request)?;
        let (collection_path, name) = split_resource_path(&request.path)?;

        let mut store = self.store.write().unwrap();
        let stored = store
            .get_mut(collection_path)
            .and_then(|collection| collection.get_mut(name))
            .ok_or_else(|| not_found(name))?;

        let sent = resource_version(&object);
        let current = resource_version(stored);
        if let (Some(sent), Some(current)) = (&sent, &current)
            && sent != current
        {
            return Err(TransportError::Api {
                code: 409,
                reason: "Conflict".to_string(),
                message: format!(
                    "Operation cannot be fulfilled on \"{name}\": the object has been modified"
                ),
            });
        }

        self.assign_version(&mut object);
        *stored = object.clone();
        Ok(object)
    }

    fn handle_patch(&self, request: &Request) -> Result<Value, TransportError> {
        self.count(|ops| ops.patches += 1);

        let patch = match &request.body {
            Some(RequestBody::MergePatch(value)) => value.clone(),
            _ => {
                return Err(TransportError::Api {
                    code: 415,
                    reason: "UnsupportedMediaType".to_string(),
                    message: "expected a merge-patch body".to_string(),
                });
            }
        };

        let path = request.path.strip_suffix("/status").unwrap_or(&request.path);
        let (collection_path, name) = split_resource_path(path)?;

        let mut store = self.store.write().unwrap();
        let stored = store
            .get_mut(collection_path)
            .and_then(|collection| collection.get_mut(name))
            .ok_or_else(|| not_found(name))?;

        merge_patch(stored, &patch);
        self.assign_version(stored);
        Ok(stored.clone())
    }

    fn handle_delete(&self, request: &Request) -> Result<Value, TransportError> {
        self.count(|ops| ops.deletes += 1);

        let (collection_path, name) = split_resource_path(&request.path)?;

        let mut store = self.store.write().unwrap();
        let collection = store
            .get_mut(collection_path)
            .ok_or_else(|| not_found(name))?;
        let object = collection.get_mut(name).ok_or_else(|| not_found(name))?;

        // Objects held back by finalizers linger in a Terminating phase
        // instead of vanishing, like a real namespace deletion.
        if has_finalizers(object) {
            if let Some(status) = object
                .as_object_mut()
                .map(|root| {
                    root.entry("status")
                        .or_insert_with(|| Value::Object(Map::new()))
                })
                .and_then(Value::as_object_mut)
            {
                status.insert("phase".to_string(), Value::String("Terminating".to_string()));
            }
            return Ok(object.clone());
        }

        collection.remove(name);
        Ok(json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Success",
            "details": {"name": name}
        }))
    }

    fn log_text(&self, request: &Request) -> Result<String, TransportError> {
        self.count(|ops| ops.log_requests += 1);

        let Some(path) = request.path.strip_suffix("/log") else {
            return Err(TransportError::Api {
                code: 404,
                reason: "NotFound".to_string(),
                message: format!("no text endpoint at {}", request.path),
            });
        };

        let logs = self.logs.read().unwrap();
        let text = logs
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path.rsplit('/').next().unwrap_or(path)))?;

        match request
            .query_param("tailLines")
            .and_then(|n| n.parse::<usize>().ok())
        {
            Some(tail) => {
                let lines: Vec<&str> = text.lines().collect();
                let skip = lines.len().saturating_sub(tail);
                Ok(lines[skip..].join("\n"))
            }
            None => Ok(text),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exchange(&self, request: Request) -> Result<Value, TransportError> {
        match request.method {
            Method::Get => self.handle_get(&request),
            Method::Post => self.handle_create(&request),
            Method::Put => self.handle_replace(&request),
            Method::Patch => self.handle_patch(&request),
            Method::Delete => self.handle_delete(&request),
        }
    }

    async fn exchange_text(&self, request: Request) -> Result<String, TransportError> {
        self.log_text(&request)
    }

    async fn open_stream(&self, request: Request) -> Result<TextChunks, TransportError> {
        let text = self.log_text(&request)?;
        let chunks: Vec<Result<String, TransportError>> =
            text.lines().map(|line| Ok(line.to_string())).collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// RFC 7386 merge patch: objects merge recursively, null deletes, anything
/// else replaces
fn merge_patch(target: &mut Value, patch: &Value) {
    let Some(patch_map) = patch.as_object() else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Some(target_map) = target.as_object_mut() {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}

fn list_document(collection: &BTreeMap<String, Value>, items: Vec<Value>) -> Value {
    let first = collection.values().next();
    let kind = first
        .and_then(|o| o.get("kind"))
        .and_then(Value::as_str)
        .map(|kind| format!("{kind}List"))
        .unwrap_or_else(|| "List".to_string());
    let api_version = first
        .and_then(|o| o.get("apiVersion"))
        .and_then(Value::as_str)
        .unwrap_or("v1");

    json!({
        "kind": kind,
        "apiVersion": api_version,
        "items": items
    })
}

fn matches_selector(object: &Value, selector: Option<&str>) -> bool {
    let Some(selector) = selector else {
        return true;
    };
    let labels = object
        .get("metadata")
        .and_then(|m| m.get("labels"))
        .and_then(Value::as_object);

    selector.split(',').all(|term| {
        let Some((key, expected)) = term.split_once('=') else {
            return false;
        };
        labels
            .and_then(|l| l.get(key.trim()))
            .and_then(Value::as_str)
            .is_some_and(|actual| actual == expected.trim())
    })
}

fn request_json(request: &Request) -> Result<Value, TransportError> {
    match &request.body {
        Some(RequestBody::Json(value)) => Ok(value.clone()),
        _ => Err(TransportError::Api {
            code: 400,
            reason: "BadRequest".to_string(),
            message: "expected a JSON body".to_string(),
        }),
    }
}

fn split_resource_path(path: &str) -> Result<(&str, &str), TransportError> {
    path.rsplit_once('/').ok_or_else(|| TransportError::Api {
        code: 404,
        reason: "NotFound".to_string(),
        message: format!("malformed resource path: {path}"),
    })
}

fn object_name(object: &Value) -> String {
    object
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn resource_version(object: &Value) -> Option<String> {
    object
        .get("metadata")
        .and_then(|m| m.get("resourceVersion"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn has_finalizers(object: &Value) -> bool {
    object
        .get("metadata")
        .and_then(|m| m.get("finalizers"))
        .and_then(Value::as_array)
        .is_some_and(|finalizers| !finalizers.is_empty())
}

fn not_found(name: &str) -> TransportError {
    TransportError::Api {
        code: 404,
        reason: "NotFound".to_string(),
        message: format!("\"{name}\" not found"),
    }
}
