//! TCP/TLS transport.
//!
//! # Responsibilities
//! - Resolve request targets against the base URI
//! - Send through the engine's shared network pool
//! - Upgrade to WebSocket over `ws`/`wss`

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use url::Url;

use crate::config::WebSocketConfig;
use crate::error::TransportError;
use crate::http::{resolve_url, Request, Response};
use crate::net::{handshake_request, Transport, TransportKind};
use crate::websocket::channel::protocol_config;
use crate::websocket::SocketChannel;

/// Transport bound to a host/port base URI.
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    client: reqwest::Client,
    base: Url,
    websocket: WebSocketConfig,
}

impl NetworkTransport {
    pub fn new(client: reqwest::Client, base: Url, websocket: WebSocketConfig) -> Self {
        Self {
            client,
            base,
            websocket,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, target: &str) -> Result<Url, TransportError> {
        resolve_url(&self.base, target).map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }

    /// WebSocket URL for `target`: `http` becomes `ws`, `https` becomes `wss`.
    pub fn socket_url(&self, target: &str) -> Result<Url, TransportError> {
        let mut url = self.url_for(target)?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(TransportError::InvalidRequest(format!(
                    "scheme `{other}` cannot be upgraded"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| TransportError::InvalidRequest(format!("cannot use scheme {scheme}")))?;
        Ok(url)
    }
}

impl Transport for NetworkTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Network
    }

    fn send(&self, request: Request) -> BoxFuture<'static, Result<Response, TransportError>> {
        let client = self.client.clone();
        let url = self.url_for(request.target());
        async move {
            let url = url?;
            let mut builder = client
                .request(request.method().clone(), url)
                .headers(request.headers().clone());
            if !request.body().is_empty() {
                builder = builder.body(request.body().clone());
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body: Bytes = response.bytes().await?;
            Ok(Response::from_parts(status, headers, body))
        }
        .boxed()
    }

    fn upgrade(&self, request: Request) -> BoxFuture<'static, Result<SocketChannel, TransportError>> {
        let url = self.socket_url(request.target());
        let config = protocol_config(&self.websocket);
        async move {
            let url = url?;
            let handshake = handshake_request(url.as_str(), request.headers())?;
            let (ws, response) =
                tokio_tungstenite::connect_async_with_config(handshake, Some(config), true).await?;
            tracing::debug!(url = %url, status = %response.status(), "WebSocket handshake complete");
            Ok(SocketChannel::from_websocket(ws))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> NetworkTransport {
        NetworkTransport::new(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            WebSocketConfig::default(),
        )
    }

    #[test]
    fn test_socket_url_scheme_mapping() {
        let plain = transport("http://127.0.0.1:9222/");
        assert_eq!(
            plain.socket_url("/devtools/page/1").unwrap().as_str(),
            "ws://127.0.0.1:9222/devtools/page/1"
        );

        let secure = transport("https://grid.example.com/wd/hub");
        assert_eq!(
            secure.socket_url("/session/1/se/bidi").unwrap().as_str(),
            "wss://grid.example.com/wd/hub/session/1/se/bidi"
        );
    }

    #[test]
    fn test_socket_url_keeps_absolute_ws_target() {
        let t = transport("http://127.0.0.1:4444");
        assert_eq!(
            t.socket_url("ws://127.0.0.1:9222/x").unwrap().as_str(),
            "ws://127.0.0.1:9222/x"
        );
    }
}
