//! Request ID filter.
//!
//! Adds an `x-request-id` header (UUID v4) to requests that carry none, so
//! exchanges can be correlated with server-side logs.

use http::header::HeaderValue;
use uuid::Uuid;

use crate::error::ClientResult;
use crate::filter::{Filter, Next};
use crate::http::{Request, Response, X_REQUEST_ID};

/// A request ID wrapper type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extension trait for reading the request ID.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<RequestId>;
}

impl RequestIdExt for Request {
    fn request_id(&self) -> Option<RequestId> {
        self.header(X_REQUEST_ID).map(|id| RequestId(id.to_string()))
    }
}

impl RequestIdExt for Response {
    fn request_id(&self) -> Option<RequestId> {
        self.header(X_REQUEST_ID).map(|id| RequestId(id.to_string()))
    }
}

/// Filter that assigns a request ID when none is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddRequestId;

impl Filter for AddRequestId {
    fn filter(&self, mut request: Request, next: Next<'_>) -> ClientResult<Response> {
        if request.request_id().is_none() {
            let id = RequestId::new();
            // uuid strings are always valid header values
            if let Ok(value) = HeaderValue::from_str(id.as_str()) {
                request.headers_mut().insert(X_REQUEST_ID, value);
            }
        }
        next.run(request)
    }
}
