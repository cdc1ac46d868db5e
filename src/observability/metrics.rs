//! Metrics collection.
//!
//! # Responsibilities
//! - Define client metrics (requests, latency, open sockets)
//! - Record through the `metrics` facade; the embedding process picks the exporter
//!
//! # Metrics
//! - `http_client_requests_total` (counter): requests by method, status
//! - `http_client_request_duration_seconds` (histogram): latency distribution
//! - `http_client_open_sockets` (gauge): WebSockets currently open
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Transport failures are labelled `status="error"`
//! - Without an installed recorder every call is a no-op

use std::time::Instant;

use metrics::{counter, gauge, histogram};

/// Record one finished exchange. `status` is `None` for transport failures.
pub fn record_request(method: &str, status: Option<u16>, start: Instant) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());

    counter!(
        "http_client_requests_total",
        "method" => method.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "http_client_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a WebSocket opening.
pub fn record_socket_opened() {
    gauge!("http_client_open_sockets").increment(1.0);
}

/// Record a WebSocket closing.
pub fn record_socket_closed() {
    gauge!("http_client_open_sockets").decrement(1.0);
}
