//! Frame channel produced by a transport upgrade.
//!
//! Transports hand back a sink/stream pair of [`Message`]s; everything
//! library-specific is converted here.

use std::pin::Pin;

use futures_util::future;
use futures_util::stream::BoxStream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig as WsConfig};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

use crate::config::WebSocketConfig;
use crate::error::TransportError;
use crate::websocket::Message;

/// Outgoing half of an upgraded connection.
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = TransportError> + Send>>;

/// Incoming half of an upgraded connection.
pub type FrameStream = BoxStream<'static, Result<Message, TransportError>>;

/// A bidirectional frame channel over an upgraded connection.
pub struct SocketChannel {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl SocketChannel {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }

    /// Wrap a tungstenite stream, hiding control frames.
    pub fn from_websocket<S>(ws: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, stream) = ws.split();
        let sink = sink
            .sink_map_err(TransportError::WebSocket)
            .with(|message: Message| future::ready(Ok::<_, TransportError>(to_wire(message))));
        let stream = stream.filter_map(|frame| {
            future::ready(match frame {
                Ok(message) => from_wire(message).map(Ok),
                Err(e) => Some(Err(TransportError::WebSocket(e))),
            })
        });
        Self {
            sink: Box::pin(sink),
            stream: stream.boxed(),
        }
    }
}

impl std::fmt::Debug for SocketChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SocketChannel(..)")
    }
}

/// Library limits for the configured WebSocket settings.
pub(crate) fn protocol_config(config: &WebSocketConfig) -> WsConfig {
    let mut ws = WsConfig::default();
    ws.max_message_size = config.max_message_size;
    ws.max_frame_size = config.max_frame_size;
    ws
}

fn to_wire(message: Message) -> WsMessage {
    match message {
        Message::Text(text) => WsMessage::Text(text.into()),
        Message::Binary(data) => WsMessage::Binary(data),
        Message::Close { code, reason } => WsMessage::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: reason.into(),
        })),
    }
}

fn from_wire(message: WsMessage) -> Option<Message> {
    match message {
        WsMessage::Text(text) => Some(Message::Text(text.as_str().to_owned())),
        WsMessage::Binary(data) => Some(Message::Binary(data)),
        WsMessage::Close(Some(frame)) => Some(Message::Close {
            code: u16::from(frame.code),
            reason: frame.reason.as_str().to_owned(),
        }),
        WsMessage::Close(None) => Some(Message::Close {
            code: 1005,
            reason: String::new(),
        }),
        // ping/pong are answered by the library
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => None,
    }
}
