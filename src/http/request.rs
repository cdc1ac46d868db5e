//! Outgoing request value and target resolution.
//!
//! # Design Decisions
//! - Requests are plain values; transports never mutate them
//! - Headers use `http::HeaderMap` (case-insensitive, multi-valued)
//! - Targets are a path (+ query) relative to the base URI, or absolute

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// An HTTP request to be sent through a client.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path and query, or an absolute URL.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of the named header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Set a header, replacing any existing values.
    pub fn with_header(mut self, name: &str, value: &str) -> ClientResult<Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Append a header value, keeping existing values.
    pub fn add_header(mut self, name: &str, value: &str) -> ClientResult<Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    pub fn with_json<T: serde::Serialize>(mut self, value: &T) -> ClientResult<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| ClientError::invalid_argument("body", e.to_string()))?;
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        self.body = Bytes::from(body);
        Ok(self)
    }

    /// Append a form-urlencoded query parameter to the target.
    pub fn add_query_parameter(mut self, name: &str, value: &str) -> Self {
        let encoded: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(name, value)
            .finish();
        let separator = if self.target.contains('?') { '&' } else { '?' };
        self.target.push(separator);
        self.target.push_str(&encoded);
        self
    }
}

fn header_pair(name: &str, value: &str) -> ClientResult<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ClientError::invalid_argument("header name", e.to_string()))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| ClientError::invalid_argument("header value", e.to_string()))?;
    Ok((name, value))
}

/// Whether `target` is already an absolute HTTP or WebSocket URL.
pub fn is_absolute(target: &str) -> bool {
    ["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|prefix| target.starts_with(prefix))
}

/// Resolve a request target against the base URI.
///
/// Absolute targets are used as-is. Relative targets are appended to the
/// base with its trailing `/` removed.
pub fn resolve_url(base: &Url, target: &str) -> ClientResult<Url> {
    let raw = if is_absolute(target) {
        target.to_string()
    } else {
        let base = base.as_str().trim_end_matches('/');
        if target.is_empty() || target.starts_with('/') || target.starts_with('?') {
            format!("{base}{target}")
        } else {
            format!("{base}/{target}")
        }
    };
    Url::parse(&raw).map_err(|e| ClientError::invalid_argument("request", format!("`{raw}`: {e}")))
}

/// Path and query of a target, for transports that carry no authority.
pub fn origin_form(target: &str) -> ClientResult<String> {
    if is_absolute(target) {
        let url = Url::parse(target)
            .map_err(|e| ClientError::invalid_argument("request", e.to_string()))?;
        return Ok(match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        });
    }
    Ok(if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{target}")
    })
}
