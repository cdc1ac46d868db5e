//! User-Agent filter.

use http::header::{HeaderValue, USER_AGENT};

use crate::error::{ClientError, ClientResult};
use crate::filter::{Filter, Next};
use crate::http::{Request, Response};

/// Sets `User-Agent` on requests that carry none.
#[derive(Debug, Clone)]
pub struct AddUserAgent {
    value: HeaderValue,
}

impl AddUserAgent {
    pub fn new(user_agent: &str) -> ClientResult<Self> {
        let value = HeaderValue::from_str(user_agent)
            .map_err(|e| ClientError::invalid_argument("user_agent", e.to_string()))?;
        Ok(Self { value })
    }
}

impl Filter for AddUserAgent {
    fn filter(&self, mut request: Request, next: Next<'_>) -> ClientResult<Response> {
        if !request.headers().contains_key(USER_AGENT) {
            request.headers_mut().insert(USER_AGENT, self.value.clone());
        }
        next.run(request)
    }
}
