//! Reader/writer tasks behind a [`WebSocket`] handle.
//!
//! # Responsibilities
//! - Deliver incoming frames to the listener, one at a time, in wire order
//! - Drain the outgoing queue into the transport sink
//! - Report post-handshake failures to the listener, once
//!
//! # Design Decisions
//! - One reader task per socket; the listener is never called concurrently
//! - Writer failures are handed to the reader, which reports them
//! - The handle can await the writer, so a close frame is flushed before exit
//! - Outgoing frames are queued so `send` never blocks the caller
//! - A stream ending without a close frame reports `1006`

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{ClientError, ClientResult, TransportError};
use crate::net::Engine;
use crate::observability::metrics;
use crate::websocket::channel::{FrameSink, FrameStream, SocketChannel};
use crate::websocket::{Listener, Message, WebSocket};

/// Close code reported when the peer vanished without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

static SOCKET_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an open socket, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(u64);

impl SocketId {
    pub fn new() -> Self {
        Self(SOCKET_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ws-{}", self.0)
    }
}

/// Start dispatching `channel` to `listener` and return the caller's handle.
pub(crate) fn start(
    engine: &Engine,
    channel: SocketChannel,
    listener: Arc<dyn Listener>,
) -> ClientResult<WebSocket> {
    let id = SocketId::new();
    let closed = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::unbounded_channel();
    let (failed_tx, failed_rx) = oneshot::channel();
    let (done_tx, done_rx) = watch::channel(false);

    engine.spawn(write_loop(id, channel.sink, rx, failed_tx, done_tx))?;
    engine.spawn(read_loop(id, channel.stream, failed_rx, listener, Arc::clone(&closed)))?;

    metrics::record_socket_opened();
    tracing::debug!(socket_id = %id, "WebSocket dispatch started");
    Ok(WebSocket::new(id, tx, closed, done_rx))
}

async fn read_loop(
    id: SocketId,
    stream: FrameStream,
    writer_failed: oneshot::Receiver<TransportError>,
    listener: Arc<dyn Listener>,
    closed: Arc<AtomicBool>,
) {
    deliver(id, stream, writer_failed, listener.as_ref()).await;
    closed.store(true, Ordering::SeqCst);
    metrics::record_socket_closed();
}

/// Feed frames to `listener` until the session ends.
///
/// Writer failures arrive on `writer_failed` and are reported from here, so
/// every listener call happens on this task.
async fn deliver(
    id: SocketId,
    mut stream: FrameStream,
    mut writer_failed: oneshot::Receiver<TransportError>,
    listener: &dyn Listener,
) {
    let mut writer_running = true;
    loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            outcome = &mut writer_failed, if writer_running => {
                writer_running = false;
                match outcome {
                    Ok(e) => {
                        listener.on_error(ClientError::Transport(e));
                        return;
                    }
                    // writer finished normally
                    Err(_) => continue,
                }
            }
        };

        match frame {
            Some(Ok(Message::Text(text))) => listener.on_text(text),
            Some(Ok(Message::Binary(data))) => listener.on_binary(data),
            Some(Ok(Message::Close { code, reason })) => {
                tracing::debug!(socket_id = %id, code, reason = %reason, "WebSocket closed by peer");
                listener.on_close(code, reason);
                return;
            }
            Some(Err(e)) => {
                tracing::warn!(socket_id = %id, error = %e, "WebSocket read failed");
                listener.on_error(ClientError::Transport(e));
                return;
            }
            None => break,
        }
    }

    tracing::debug!(socket_id = %id, "WebSocket stream ended without close frame");
    listener.on_close(ABNORMAL_CLOSURE, "connection closed without close frame".to_string());
}

async fn write_loop(
    id: SocketId,
    sink: FrameSink,
    rx: mpsc::UnboundedReceiver<Message>,
    failed: oneshot::Sender<TransportError>,
    done: watch::Sender<bool>,
) {
    if let Err(e) = drain(sink, rx).await {
        tracing::warn!(socket_id = %id, error = %e, "WebSocket write failed");
        // the reader may already be gone
        let _ = failed.send(e);
    }
    done.send_replace(true);
    tracing::trace!(socket_id = %id, "WebSocket writer finished");
}

async fn drain(
    mut sink: FrameSink,
    mut rx: mpsc::UnboundedReceiver<Message>,
) -> Result<(), TransportError> {
    while let Some(message) = rx.recv().await {
        let closing = matches!(message, Message::Close { .. });
        sink.send(message).await?;
        if closing {
            break;
        }
    }
    let _ = sink.close().await;
    Ok(())
}
