//! Transport layer: the HTTP exchange behind the resource client
//!
//! The client describes each call as a [`Request`] and hands it to a
//! [`Transport`] implementation. Timeouts, retries and connection pooling
//! are the transport's business; the client issues exactly one logical
//! request per operation. Two implementations ship with the crate:
//! [`HttpTransport`] over reqwest for real clusters and [`MockTransport`],
//! an in-memory API server for tests.

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::{MockTransport, OperationCounts};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

/// Stream of text chunks produced by a follow-mode log request
///
/// Finite per connection: the stream ends when the server closes it, and a
/// reissued request restarts from the current point rather than resuming.
pub type TextChunks = BoxStream<'static, std::result::Result<String, TransportError>>;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Request payload, deciding the content type on the wire
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// `application/json`
    Json(Value),

    /// `application/merge-patch+json` (RFC 7386)
    MergePatch(Value),
}

/// A single logical request against the cluster API
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl Request {
    /// Create a request with no query parameters or body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a merge-patch body
    pub fn with_merge_patch(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::MergePatch(body));
        self
    }

    /// Look up a query parameter by key
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Failures reported by a transport
///
/// Propagated unchanged through the client except where a structured server
/// rejection maps onto a typed client error (404 on a named get, 409 on an
/// optimistic-concurrency update).
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// Structured server-side rejection, parsed from the API's Status body
    #[error("server rejected request ({code} {reason}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// Connectivity or protocol failure below the API layer
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be decoded
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status code of a structured server rejection
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// The HTTP exchange behind the resource client
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request against a JSON endpoint and decode the body
    async fn exchange(&self, request: Request) -> std::result::Result<Value, TransportError>;

    /// Issue a request against a plain-text endpoint (log retrieval)
    async fn exchange_text(&self, request: Request)
    -> std::result::Result<String, TransportError>;

    /// Open a chunked text stream (follow-mode log retrieval)
    async fn open_stream(&self, request: Request)
    -> std::result::Result<TextChunks, TransportError>;
}
