//! Unix domain socket transport.
//!
//! # Responsibilities
//! - Connect every request to one socket file
//! - Reuse connections through a pooled `hyper-util` client
//! - Upgrade to WebSocket over the same socket
//!
//! # Design Decisions
//! - The socket path is not an authority; requests carry `localhost`
//! - The connector ignores the request URI entirely

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http::Uri;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::{Connected, Connection};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::UnixStream;
use tower::Service;

use crate::config::WebSocketConfig;
use crate::error::TransportError;
use crate::http::request::origin_form;
use crate::http::{Request, Response};
use crate::net::{handshake_request, Transport, TransportKind};
use crate::websocket::channel::protocol_config;
use crate::websocket::SocketChannel;

/// Authority sent on requests carried over a domain socket.
pub const SOCKET_AUTHORITY: &str = "localhost";

/// Pooled HTTP client whose connections all go to one socket.
pub type UnixClient = Client<UnixConnector, Full<Bytes>>;

/// Build a pooled client for `socket_path`.
pub fn build_client(socket_path: &Path, connect_timeout: Duration) -> UnixClient {
    Client::builder(TokioExecutor::new()).build(UnixConnector::new(socket_path, connect_timeout))
}

async fn connect(socket_path: &Path, connect_timeout: Duration) -> io::Result<UnixStream> {
    match tokio::time::timeout(connect_timeout, UnixStream::connect(socket_path)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connecting to {} timed out", socket_path.display()),
        )),
    }
}

/// Connector that dials a fixed socket file.
#[derive(Debug, Clone)]
pub struct UnixConnector {
    socket_path: Arc<PathBuf>,
    connect_timeout: Duration,
}

impl UnixConnector {
    pub fn new(socket_path: &Path, connect_timeout: Duration) -> Self {
        Self {
            socket_path: Arc::new(socket_path.to_path_buf()),
            connect_timeout,
        }
    }
}

impl Service<Uri> for UnixConnector {
    type Response = UnixIo;
    type Error = io::Error;
    type Future = Pin<Box<dyn Future<Output = io::Result<UnixIo>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _uri: Uri) -> Self::Future {
        let socket_path = Arc::clone(&self.socket_path);
        let connect_timeout = self.connect_timeout;
        Box::pin(async move {
            let stream = connect(&socket_path, connect_timeout).await?;
            tracing::trace!(socket_path = %socket_path.display(), "Socket connection opened");
            Ok(UnixIo {
                inner: TokioIo::new(stream),
            })
        })
    }
}

/// A socket connection usable by the pooled client.
#[derive(Debug)]
pub struct UnixIo {
    inner: TokioIo<UnixStream>,
}

impl Connection for UnixIo {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}

impl hyper::rt::Read for UnixIo {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: hyper::rt::ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        hyper::rt::Read::poll_read(Pin::new(&mut self.inner), cx, buf)
    }
}

impl hyper::rt::Write for UnixIo {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        hyper::rt::Write::poll_write(Pin::new(&mut self.inner), cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        hyper::rt::Write::poll_flush(Pin::new(&mut self.inner), cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        hyper::rt::Write::poll_shutdown(Pin::new(&mut self.inner), cx)
    }

    fn is_write_vectored(&self) -> bool {
        hyper::rt::Write::is_write_vectored(&self.inner)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        hyper::rt::Write::poll_write_vectored(Pin::new(&mut self.inner), cx, bufs)
    }
}

/// Transport bound to a Unix domain socket.
#[derive(Debug, Clone)]
pub struct UnixTransport {
    client: UnixClient,
    socket_path: Arc<PathBuf>,
    connect_timeout: Duration,
    websocket: WebSocketConfig,
}

impl UnixTransport {
    pub fn new(
        client: UnixClient,
        socket_path: &Path,
        connect_timeout: Duration,
        websocket: WebSocketConfig,
    ) -> Self {
        Self {
            client,
            socket_path: Arc::new(socket_path.to_path_buf()),
            connect_timeout,
            websocket,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

fn request_uri(scheme: &str, target: &str) -> Result<String, TransportError> {
    let path = origin_form(target).map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
    Ok(format!("{scheme}://{SOCKET_AUTHORITY}{path}"))
}

impl Transport for UnixTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::DomainSocket
    }

    fn send(&self, request: Request) -> BoxFuture<'static, Result<Response, TransportError>> {
        let client = self.client.clone();
        async move {
            let uri = request_uri("http", request.target())?;
            let mut outgoing = http::Request::builder()
                .method(request.method().clone())
                .uri(uri)
                .body(Full::new(request.body().clone()))
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            *outgoing.headers_mut() = request.headers().clone();

            let response = client.request(outgoing).await?;
            let (parts, body) = response.into_parts();
            let body = body.collect().await?.to_bytes();
            Ok(Response::from_parts(parts.status, parts.headers, body))
        }
        .boxed()
    }

    fn upgrade(&self, request: Request) -> BoxFuture<'static, Result<SocketChannel, TransportError>> {
        let socket_path = Arc::clone(&self.socket_path);
        let connect_timeout = self.connect_timeout;
        let config = protocol_config(&self.websocket);
        async move {
            let uri = request_uri("ws", request.target())?;
            let handshake = handshake_request(&uri, request.headers())?;
            let stream = connect(&socket_path, connect_timeout).await?;
            let (ws, response) =
                tokio_tungstenite::client_async_with_config(handshake, stream, Some(config)).await?;
            tracing::debug!(
                socket_path = %socket_path.display(),
                status = %response.status(),
                "WebSocket handshake complete"
            );
            Ok(SocketChannel::from_websocket(ws))
        }
        .boxed()
    }
}
