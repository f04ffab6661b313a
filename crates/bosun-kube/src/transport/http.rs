//! HTTP transport over reqwest
//!
//! Builds a TLS-capable client from a resolved [`Connection`]: bearer tokens
//! become a default `Authorization` header (marked sensitive so it never
//! appears in logs), client certificates become a PEM identity for mutual
//! TLS. The cluster CA and the insecure-skip-verify flag are honored when
//! the connection carries them.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tracing::debug;
use url::Url;

use bosun_config::{AuthMaterial, Connection};

use super::{Method, Request, RequestBody, TextChunks, Transport, TransportError};
use crate::error::{KubeError, Result};

const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

/// Transport implementation backed by a reqwest client
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Build a transport from a resolved connection
    pub fn new(connection: &Connection) -> Result<Self> {
        if connection.server.is_empty() {
            return Err(KubeError::InvalidConnection(
                "connection has no server endpoint".to_string(),
            ));
        }
        let base = Url::parse(&connection.server).map_err(|e| {
            KubeError::InvalidConnection(format!(
                "invalid server endpoint '{}': {}",
                connection.server, e
            ))
        })?;

        let mut builder = reqwest::Client::builder().use_rustls_tls();

        match &connection.auth {
            AuthMaterial::BearerToken(token) => {
                let mut headers = reqwest::header::HeaderMap::new();
                let mut value =
                    reqwest::header::HeaderValue::from_str(&format!("Bearer {token}")).map_err(
                        |e| {
                            KubeError::InvalidConnection(format!(
                                "bearer token is not a valid header value: {e}"
                            ))
                        },
                    )?;
                value.set_sensitive(true);
                headers.insert(reqwest::header::AUTHORIZATION, value);
                builder = builder.default_headers(headers);
            }
            AuthMaterial::ClientCert { certificate, key } => {
                let mut pem = std::fs::read(certificate)?;
                pem.extend(std::fs::read(key)?);
                let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                    KubeError::InvalidConnection(format!(
                        "invalid client certificate material: {e}"
                    ))
                })?;
                builder = builder.identity(identity);
            }
        }

        if let Some(ca) = &connection.certificate_authority {
            let pem = std::fs::read(ca)?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                KubeError::InvalidConnection(format!("invalid cluster CA certificate: {e}"))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        if connection.insecure_skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| KubeError::InvalidConnection(e.to_string()))?;

        Ok(Self { client, base })
    }

    fn build_request(
        &self,
        request: &Request,
    ) -> std::result::Result<reqwest::RequestBuilder, TransportError> {
        let url = self
            .base
            .join(&request.path)
            .map_err(|e| TransportError::Http(format!("invalid request path: {e}")))?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        match &request.body {
            Some(RequestBody::Json(body)) => builder = builder.json(body),
            Some(RequestBody::MergePatch(body)) => {
                let bytes = serde_json::to_vec(body)
                    .map_err(|e| TransportError::Decode(e.to_string()))?;
                builder = builder
                    .header(reqwest::header::CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE)
                    .body(bytes);
            }
            None => {}
        }

        Ok(builder)
    }

    async fn send(
        &self,
        request: Request,
    ) -> std::result::Result<reqwest::Response, TransportError> {
        debug!(method = request.method.as_str(), path = %request.path, "issuing request");

        let response = self
            .build_request(&request)?
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_failure(status, &body))
    }
}

/// Turn a non-success response into a structured failure, preferring the
/// reason/message of the API's Status body when one was returned
fn api_failure(status: reqwest::StatusCode, body: &str) -> TransportError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |key: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    TransportError::Api {
        code: status.as_u16(),
        reason: field("reason")
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string()),
        message: field("message").unwrap_or_else(|| body.to_string()),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, request: Request) -> std::result::Result<Value, TransportError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn exchange_text(
        &self,
        request: Request,
    ) -> std::result::Result<String, TransportError> {
        let response = self.send(request).await?;
        response
            .text()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn open_stream(
        &self,
        request: Request,
    ) -> std::result::Result<TextChunks, TransportError> {
        let response = self.send(request).await?;
        let chunks = response
            .bytes_stream()
            .map(|chunk| match chunk {
                Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => Err(TransportError::Http(e.to_string())),
            })
            .boxed();
        Ok(chunks)
    }
}
