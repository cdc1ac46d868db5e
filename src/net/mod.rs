//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ClientConfig.base_uri
//!     → selector.rs (scheme decides: unix → domain socket, else network)
//!     → network.rs | unix.rs (bound to the shared engine's pools)
//!     → Transport trait object owned by one client
//!
//! Per request:
//!     Request → Transport::send → Response
//!     Request → Transport::upgrade → SocketChannel
//! ```
//!
//! # Design Decisions
//! - One transport per client, fixed at construction
//! - Protocol work (HTTP, TLS, framing, pooling) stays in the libraries
//! - Transports return futures so one engine drives all of them

pub mod engine;
pub mod network;
pub mod selector;
#[cfg(unix)]
pub mod unix;

use futures_util::future::BoxFuture;
use http::HeaderMap;
use tokio_tungstenite::tungstenite::client::ClientRequestBuilder;

use crate::error::TransportError;
use crate::http::{Request, Response};
use crate::websocket::SocketChannel;

pub use engine::Engine;
pub use network::NetworkTransport;
pub use selector::{select_transport, TransportKind, TransportTarget};
#[cfg(unix)]
pub use unix::UnixTransport;

/// A concrete mechanism for exchanging requests and upgrading connections.
///
/// Implementations delegate protocol work to a networking library. The
/// returned futures are driven on the shared [`Engine`].
pub trait Transport: Send + Sync + 'static {
    fn kind(&self) -> TransportKind;

    /// Send a request once and read the whole response.
    fn send(&self, request: Request) -> BoxFuture<'static, Result<Response, TransportError>>;

    /// Perform the WebSocket handshake for `request`.
    fn upgrade(&self, request: Request) -> BoxFuture<'static, Result<SocketChannel, TransportError>>;
}

/// Headers owned by the handshake itself.
const HANDSHAKE_HEADERS: &[&str] = &[
    "host",
    "connection",
    "upgrade",
    "sec-websocket-key",
    "sec-websocket-version",
    "sec-websocket-protocol",
];

/// Build a handshake request carrying the caller's headers.
pub(crate) fn handshake_request(
    uri: &str,
    headers: &HeaderMap,
) -> Result<ClientRequestBuilder, TransportError> {
    let uri: http::Uri = uri
        .parse()
        .map_err(|e: http::uri::InvalidUri| TransportError::InvalidRequest(e.to_string()))?;
    let mut builder = ClientRequestBuilder::new(uri);

    for value in headers.get_all(http::header::SEC_WEBSOCKET_PROTOCOL) {
        if let Ok(protocols) = value.to_str() {
            for protocol in protocols.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                builder = builder.with_sub_protocol(protocol);
            }
        }
    }

    for (name, value) in headers {
        if HANDSHAKE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        match value.to_str() {
            Ok(value) => builder = builder.with_header(name.as_str(), value),
            Err(_) => tracing::warn!(header = %name, "Skipping non-UTF-8 header on handshake"),
        }
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    #[test]
    fn test_handshake_keeps_caller_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer t".parse().unwrap());
        headers.insert("sec-websocket-protocol", "v1, v2".parse().unwrap());
        headers.insert("upgrade", "nope".parse().unwrap());

        let request = handshake_request("ws://localhost:9222/devtools", &headers)
            .unwrap()
            .into_client_request()
            .unwrap();

        assert_eq!(request.headers()["authorization"], "Bearer t");
        assert_eq!(request.headers()["upgrade"], "websocket");
        assert_eq!(request.headers()["sec-websocket-protocol"], "v1, v2");
        assert!(request.headers().contains_key("sec-websocket-key"));
    }

    #[test]
    fn test_handshake_rejects_bad_uri() {
        let err = handshake_request("ws://bad host", &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}
