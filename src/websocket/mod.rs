//! WebSocket upgrade handling.
//!
//! # Responsibilities
//! - Define the frames and listener callbacks exposed to callers
//! - Turn an upgraded transport channel into a caller-owned handle
//! - Bidirectional frame forwarding
//!
//! # Data Flow
//! ```text
//! open_socket(request, listener)
//!     → transport.upgrade (handshake, synchronous to the caller)
//!     → channel.rs (library frames → Message)
//!     → dispatch.rs (reader task → listener, writer task ← handle)
//! ```
//!
//! # Design Decisions
//! - WebSocket handled separately from HTTP request/response
//! - Upgrade requests do not pass through the filter chain
//! - Close frames propagated in both directions
//! - Ping/pong handled transparently

pub mod channel;
pub mod dispatch;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

use crate::error::{ClientError, ClientResult};

pub use channel::{FrameSink, FrameStream, SocketChannel};
pub use dispatch::{SocketId, ABNORMAL_CLOSURE};

/// Close code sent by [`WebSocket::close`].
pub const NORMAL_CLOSURE: u16 = 1000;

/// A WebSocket message as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Bytes),
    Close { code: u16, reason: String },
}

/// Callbacks receiving asynchronous WebSocket events.
///
/// Invoked from the engine's runtime, one event at a time, in the order
/// frames arrived. Implementations must not block for long.
pub trait Listener: Send + Sync + 'static {
    fn on_text(&self, _text: String) {}

    fn on_binary(&self, _data: Bytes) {}

    fn on_close(&self, _code: u16, _reason: String) {}

    fn on_error(&self, _error: ClientError) {}
}

/// Handle to an open WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocket {
    id: SocketId,
    outgoing: mpsc::UnboundedSender<Message>,
    closed: Arc<AtomicBool>,
    writer_done: watch::Receiver<bool>,
}

impl WebSocket {
    pub(crate) fn new(
        id: SocketId,
        outgoing: mpsc::UnboundedSender<Message>,
        closed: Arc<AtomicBool>,
        writer_done: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            outgoing,
            closed,
            writer_done,
        }
    }

    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Queue a message for sending.
    pub fn send(&self, message: Message) -> ClientResult<()> {
        if self.is_closed() {
            return Err(ClientError::SocketClosed);
        }
        if matches!(message, Message::Close { .. }) {
            self.closed.store(true, Ordering::SeqCst);
        }
        self.outgoing
            .send(message)
            .map_err(|_| ClientError::SocketClosed)
    }

    pub fn send_text(&self, text: impl Into<String>) -> ClientResult<()> {
        self.send(Message::Text(text.into()))
    }

    pub fn send_binary(&self, data: impl Into<Bytes>) -> ClientResult<()> {
        self.send(Message::Binary(data.into()))
    }

    /// Send a normal close frame. Closing twice is a no-op.
    pub fn close(&self) {
        if self.is_closed() {
            return;
        }
        let _ = self.send(Message::Close {
            code: NORMAL_CLOSURE,
            reason: String::new(),
        });
    }

    /// Whether the socket was closed by either side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.outgoing.is_closed()
    }

    /// Wait until the writer task has stopped.
    ///
    /// The writer stops after flushing a close frame or after a failed write.
    /// Await this after [`WebSocket::close`] to know the close frame left
    /// the process.
    pub async fn writer_finished(&self) {
        let mut done = self.writer_done.clone();
        let _ = done.wait_for(|finished| *finished).await;
    }
}
