//! Bosun Kube - generic Kubernetes resource client
//!
//! This crate provides:
//! - **Resource Descriptors**: static per-kind metadata with explicit
//!   capability flags (namespace scope, status subresource, log retrieval)
//! - **Resource Client**: one descriptor-driven client implementing
//!   get/list/create/update/patch/delete/status/logs for every kind
//! - **Object Wrappers**: mutable views over decoded documents, plus list
//!   and status result types
//! - **Transport**: the HTTP exchange behind the client, with a reqwest
//!   implementation for real clusters and an in-memory mock for tests

pub mod client;
pub mod descriptor;
pub mod error;
pub mod object;
pub mod transport;

pub use client::{
    GetArg, GetResponse, ListOptions, LogOptions, LogOutput, Manifest, ResourceClient,
};
pub use descriptor::ResourceDescriptor;
pub use error::{KubeError, Result};
pub use object::{ListResult, ResourceObject, StatusOutcome, StatusResult};
pub use transport::{
    HttpTransport, Method, MockTransport, OperationCounts, Request, RequestBody, TextChunks,
    Transport, TransportError,
};
