//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::{stream, FutureExt, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use switchyard::config::EngineConfig;
use switchyard::http::StatusCode;
use switchyard::net::Transport;
use switchyard::websocket::{FrameSink, SocketChannel};
use switchyard::{
    ClientError, Engine, Listener, Message, Request, Response, TransportError, TransportKind,
};

/// A small engine for one test.
pub fn engine() -> Arc<Engine> {
    Engine::new(&EngineConfig {
        worker_threads: Some(2),
        thread_name: "switchyard-test".into(),
    })
    .unwrap()
}

/// A fresh socket path under the temp directory.
pub fn socket_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("switchyard-{tag}-{}.sock", uuid::Uuid::new_v4()))
}

/// Poll `condition` until it holds or five seconds pass.
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Read one HTTP request: the head plus a `Content-Length` body.
async fn read_request<S: AsyncRead + Unpin>(socket: &mut S) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Answer one request with its own text as the body.
async fn echo_request<S: AsyncRead + AsyncWrite + Unpin>(mut socket: S, status: &'static str) {
    let request = read_request(&mut socket).await;
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        request.len(),
        request
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start an HTTP backend on the engine that echoes each request back.
pub fn start_echo_backend(engine: &Engine, status: &'static str) -> SocketAddr {
    let listener = engine
        .block_on(TcpListener::bind("127.0.0.1:0"))
        .unwrap()
        .unwrap();
    let addr = listener.local_addr().unwrap();

    engine
        .spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(echo_request(socket, status));
            }
        })
        .unwrap();
    addr
}

/// Start an echo backend on a Unix domain socket.
#[cfg(unix)]
pub fn start_unix_echo_backend(engine: &Engine, path: &Path) {
    let listener = {
        let _guard = engine.handle().enter();
        tokio::net::UnixListener::bind(path).unwrap()
    };

    engine
        .spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(echo_request(socket, "200 OK"));
            }
        })
        .unwrap();
}

/// Start a backend that answers every request with `302 Found` to `/moved`.
///
/// Returns the address and a counter of requests served.
pub fn start_redirect_backend(engine: &Engine) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = engine
        .block_on(TcpListener::bind("127.0.0.1:0"))
        .unwrap()
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&hits);
    engine
        .spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    let response = "HTTP/1.1 302 Found\r\nLocation: /moved\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        })
        .unwrap();
    (addr, hits)
}

/// Push "a", "b", "c" to a new WebSocket peer, then echo its text frames.
async fn serve_websocket<S>(socket: S)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
        return;
    };
    for text in ["a", "b", "c"] {
        if ws.send(WsMessage::Text(text.into())).await.is_err() {
            return;
        }
    }
    while let Some(Ok(frame)) = ws.next().await {
        match frame {
            WsMessage::Text(text) => {
                let reply = format!("echo:{}", text.as_str());
                if ws.send(WsMessage::Text(reply.into())).await.is_err() {
                    return;
                }
            }
            // keep reading so the close reply is flushed; the stream then ends
            _ => {}
        }
    }
}

/// Start a WebSocket server on TCP.
pub fn start_ws_server(engine: &Engine) -> SocketAddr {
    let listener = engine
        .block_on(TcpListener::bind("127.0.0.1:0"))
        .unwrap()
        .unwrap();
    let addr = listener.local_addr().unwrap();

    engine
        .spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve_websocket(socket));
            }
        })
        .unwrap();
    addr
}

/// Start a WebSocket server on a Unix domain socket.
#[cfg(unix)]
pub fn start_unix_ws_server(engine: &Engine, path: &Path) {
    let listener = {
        let _guard = engine.handle().enter();
        tokio::net::UnixListener::bind(path).unwrap()
    };

    engine
        .spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve_websocket(socket));
            }
        })
        .unwrap();
}

/// What a [`MockTransport`] upgrade hands back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpgradeScript {
    /// "a", "b", "c", then a normal close.
    #[default]
    Frames,
    /// "a", then a read error.
    ReadError,
    /// "a", then the stream ends without a close frame.
    EndsAbruptly,
    /// The handshake never completes.
    Hang,
    /// Reads stay pending and every write fails.
    WriteFails,
}

/// Transport double that counts calls and never touches the network.
#[derive(Default)]
pub struct MockTransport {
    pub sends: AtomicUsize,
    pub upgrades: AtomicUsize,
    pub last_request: Mutex<Option<Request>>,
    pub script: UpgradeScript,
}

impl MockTransport {
    pub fn scripted(script: UpgradeScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }
}

fn draining_sink() -> FrameSink {
    Box::pin(futures_util::sink::drain::<Message>().sink_map_err(
        |never: std::convert::Infallible| -> TransportError { match never {} },
    ))
}

fn failing_sink() -> FrameSink {
    Box::pin(futures_util::sink::unfold((), |(), _message: Message| async {
        Err::<(), TransportError>(TransportError::InvalidRequest("peer went away".into()))
    }))
}

impl Transport for MockTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Network
    }

    fn send(&self, request: Request) -> BoxFuture<'static, Result<Response, TransportError>> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        async { Ok(Response::new(StatusCode::OK).with_body("mock body")) }.boxed()
    }

    fn upgrade(&self, _request: Request) -> BoxFuture<'static, Result<SocketChannel, TransportError>> {
        self.upgrades.fetch_add(1, Ordering::SeqCst);
        let script = self.script;
        async move {
            let first: Result<Message, TransportError> = Ok(Message::Text("a".into()));
            let channel = match script {
                UpgradeScript::Frames => {
                    let frames = stream::iter(vec![
                        first,
                        Ok(Message::Text("b".into())),
                        Ok(Message::Text("c".into())),
                        Ok(Message::Close {
                            code: 1000,
                            reason: "done".into(),
                        }),
                    ]);
                    SocketChannel::new(draining_sink(), frames.boxed())
                }
                UpgradeScript::ReadError => {
                    let frames = stream::iter(vec![
                        first,
                        Err(TransportError::InvalidRequest("corrupt frame".into())),
                    ]);
                    SocketChannel::new(draining_sink(), frames.boxed())
                }
                UpgradeScript::EndsAbruptly => {
                    SocketChannel::new(draining_sink(), stream::iter(vec![first]).boxed())
                }
                UpgradeScript::Hang => {
                    return futures_util::future::pending::<Result<SocketChannel, TransportError>>()
                        .await;
                }
                UpgradeScript::WriteFails => {
                    SocketChannel::new(failing_sink(), stream::pending().boxed())
                }
            };
            Ok(channel)
        }
        .boxed()
    }
}

/// An event seen by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Text(String),
    Binary(Bytes),
    Close(u16),
    Error(String),
}

/// Listener that records every callback in order.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> bool {
        self.events()
            .iter()
            .any(|event| matches!(event, Event::Close(_)))
    }
}

impl Listener for RecordingListener {
    fn on_text(&self, text: String) {
        self.events.lock().unwrap().push(Event::Text(text));
    }

    fn on_binary(&self, data: Bytes) {
        self.events.lock().unwrap().push(Event::Binary(data));
    }

    fn on_close(&self, code: u16, _reason: String) {
        self.events.lock().unwrap().push(Event::Close(code));
    }

    fn on_error(&self, error: ClientError) {
        self.events.lock().unwrap().push(Event::Error(error.to_string()));
    }
}
