//! HTTP message values exchanged through a client.
//!
//! # Data Flow
//! ```text
//! caller builds Request
//!     → filter chain (may rewrite)
//!     → transport resolves target against base URI, sends
//!     → Response (fully buffered body) back through the chain
//!     → caller owns Response
//! ```

pub mod request;
pub mod response;

pub use request::{resolve_url, Request, X_REQUEST_ID};
pub use response::Response;

pub use http::{HeaderMap, HeaderValue, Method, StatusCode};
