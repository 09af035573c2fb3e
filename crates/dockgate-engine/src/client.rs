//! The typed engine client adapter.
//!
//! Provides inspect/list/create/update/remove helpers that round-trip JSON,
//! and a raw `dial` for byte-level forwarding used by the streaming
//! passthrough and the distribution permission probe. This is the only
//! component in the workspace that opens the engine socket.

use std::path::PathBuf;

use bytes::Bytes;
use dockgate_core::{BodyStream, EngineResponse, Error, ResourceKind, Result};
use futures_util::TryStreamExt;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use tracing::debug;

use crate::unix_transport::{socket_uri, UnixConnector};

/// Typed client for the engine's HTTP control API, dialed over a Unix
/// domain socket.
#[derive(Clone)]
pub struct EngineClient {
    http: Client<UnixConnector, Full<Bytes>>,
}

impl EngineClient {
    /// Build a client pinned to the given socket path. Does not connect
    /// eagerly — dialing happens lazily per request, matching the way
    /// `hyper_util`'s legacy client pools connections on demand.
    pub fn new(socket_path: PathBuf) -> Self {
        let http = Client::builder(TokioExecutor::new()).build(UnixConnector::new(socket_path));
        Self { http }
    }

    /// Low-level request/response round trip returning the raw status and
    /// parsed JSON body (or `Value::Null` for an empty body).
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        extra_headers: HeaderMap,
        body: Option<&Value>,
    ) -> Result<(StatusCode, Value)> {
        let body_bytes = match body {
            Some(v) => serde_json::to_vec(v)?,
            None => Vec::new(),
        };

        let mut builder = http::Request::builder()
            .method(method)
            .uri(socket_uri(path));
        if body.is_some() {
            builder = builder.header(http::header::CONTENT_TYPE, "application/json");
        }
        for (name, value) in extra_headers.iter() {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(Full::new(Bytes::from(body_bytes)))
            .map_err(|e| Error::internal(format!("malformed engine request: {e}")))?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status();
        let collected = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::transport(e.to_string()))?
            .to_bytes();

        let value = if collected.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&collected).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&collected).into_owned())
            })
        };

        Ok((status, value))
    }

    /// Inspect a resource by id. `Ok(None)` on a 404; any other non-success
    /// status is an error. Ownership checks treat every failure mode
    /// (engine error or not-found) as "not owned" — see
    /// `dockgate-policy::oracle` — so callers don't need to distinguish
    /// these cases themselves.
    pub async fn inspect(&self, kind: ResourceKind, id: &str) -> Result<Option<Value>> {
        let path = format!("/{}/{}", kind.path_segment(), id);
        let (status, body) = self
            .request_json(Method::GET, &path, HeaderMap::new(), None)
            .await?;
        match status {
            StatusCode::OK => Ok(Some(body)),
            StatusCode::NOT_FOUND => Ok(None),
            other => Err(Error::engine_response(format!(
                "inspect {} {id}: engine returned {other}",
                kind.label()
            ))),
        }
    }

    /// List resources of a kind, optionally with an engine-side filter
    /// expression (forwarded verbatim as the `filters` query parameter).
    pub async fn list(&self, kind: ResourceKind, filters: Option<&Value>) -> Result<Vec<Value>> {
        let mut path = format!("/{}", kind.path_segment());
        if let Some(filters) = filters {
            let encoded = serde_json::to_string(filters)?;
            path.push_str("?filters=");
            path.push_str(&urlencoding_escape(&encoded));
        }
        let (status, body) = self
            .request_json(Method::GET, &path, HeaderMap::new(), None)
            .await?;
        if status != StatusCode::OK {
            return Err(Error::engine_response(format!(
                "list {}: engine returned {status}",
                kind.label()
            )));
        }
        match body {
            Value::Array(items) => Ok(items),
            _ => Ok(Vec::new()),
        }
    }

    /// Create a resource. `extra_headers` carries the brokered
    /// `X-Registry-Auth` header for service creates, when applicable.
    pub async fn create(
        &self,
        kind: ResourceKind,
        body: &Value,
        extra_headers: HeaderMap,
    ) -> Result<(StatusCode, Value)> {
        let path = format!("/{}/create", kind.path_segment());
        self.request_json(Method::POST, &path, extra_headers, Some(body))
            .await
    }

    /// Update a resource, forwarding the optimistic-concurrency `version`
    /// query parameter verbatim.
    pub async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        version: Option<&str>,
        body: &Value,
        extra_headers: HeaderMap,
    ) -> Result<(StatusCode, Value)> {
        let mut path = format!("/{}/{}/update", kind.path_segment(), id);
        if let Some(v) = version {
            path.push_str("?version=");
            path.push_str(&urlencoding_escape(v));
        }
        self.request_json(Method::POST, &path, extra_headers, Some(body))
            .await
    }

    /// Remove (delete) a resource.
    pub async fn remove(&self, kind: ResourceKind, id: &str) -> Result<(StatusCode, Value)> {
        let path = format!("/{}/{}", kind.path_segment(), id);
        self.request_json(Method::DELETE, &path, HeaderMap::new(), None)
            .await
    }

    /// Raw byte-level forwarding: used by the streaming passthrough (logs,
    /// ping, distribution lookups) and anywhere the router simply relays an
    /// allow-listed path verbatim. Headers and status are returned eagerly;
    /// the body streams lazily so the caller never buffers an unbounded
    /// response.
    pub async fn dial(
        &self,
        method: Method,
        path_and_query: &str,
        mut headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<EngineResponse> {
        debug!(%method, path = %path_and_query, "dialing engine");
        headers.remove(http::header::HOST);
        headers.remove(http::header::CONTENT_LENGTH);

        let mut builder = http::Request::builder()
            .method(method)
            .uri(socket_uri(path_and_query));
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|e| Error::internal(format!("malformed engine request: {e}")))?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let body_stream: BodyStream = Box::pin(
            response
                .into_body()
                .into_data_stream()
                .map_err(|e| Error::transport(e.to_string())),
        );

        Ok(EngineResponse::new(status, response_headers, body_stream))
    }

    /// Permission probe: `GET /distribution/{image}/json` with an optional
    /// `X-Registry-Auth` header, used to verify pull credentials before
    /// committing a service create/update (see
    /// "Permission probe"). Returns the engine's status code; the caller
    /// decides what to do with a non-200.
    pub async fn check_distribution(
        &self,
        image: &str,
        registry_auth_header: Option<&str>,
    ) -> Result<StatusCode> {
        let path = format!("/distribution/{image}/json");
        let mut headers = HeaderMap::new();
        if let Some(value) = registry_auth_header {
            headers.insert(
                "x-registry-auth",
                HeaderValue::from_str(value)
                    .map_err(|e| Error::internal(format!("invalid registry auth header: {e}")))?,
            );
        }
        let response = self.dial(Method::GET, &path, headers, None).await?;
        Ok(response.status)
    }
}

/// Minimal percent-encoding for query-string values. The engine API only
/// ever needs this for JSON filter expressions and opaque version tokens,
/// so a small hand-rolled escaper (rather than pulling in a general URL
/// crate just for this) keeps the dependency list honest.
fn urlencoding_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// A convenience header map builder used by callers constructing the
/// `X-Registry-Auth` header without pulling in `http::HeaderMap`'s more
/// verbose builder API at every call site.
pub fn header_map(pairs: impl IntoIterator<Item = (http::HeaderName, HeaderValue)>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(name, value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoding_escape_is_idempotent_on_safe_chars() {
        assert_eq!(urlencoding_escape("abc-123_.~"), "abc-123_.~");
    }

    #[test]
    fn urlencoding_escape_percent_encodes_json() {
        assert_eq!(urlencoding_escape("{\"a\":1}"), "%7B%22a%22%3A1%7D");
    }
}
