//! Exchange tracing filter.
//!
//! Logs each request/response pair and records request metrics. Bodies are
//! never logged; only their sizes.

use std::time::Instant;

use crate::error::ClientResult;
use crate::filter::{Filter, Next};
use crate::http::{Request, Response, X_REQUEST_ID};
use crate::observability::metrics;

/// Filter that logs exchanges at `debug` and failures at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceExchange;

impl Filter for TraceExchange {
    fn filter(&self, request: Request, next: Next<'_>) -> ClientResult<Response> {
        let start = Instant::now();
        let method = request.method().to_string();
        let target = request.target().to_string();
        let request_id = request.header(X_REQUEST_ID).unwrap_or("none").to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            target = %target,
            body_bytes = request.body().len(),
            "Sending request"
        );

        let result = next.run(request);
        match &result {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    status = %response.status(),
                    body_bytes = response.body().len(),
                    elapsed = ?start.elapsed(),
                    "Response received"
                );
                metrics::record_request(&method, Some(response.status().as_u16()), start);
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    target = %target,
                    error = %e,
                    "Request failed"
                );
                metrics::record_request(&method, None, start);
            }
        }
        result
    }
}
