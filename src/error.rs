//! Error taxonomy for the client.
//!
//! # Design Decisions
//! - Caller contract violations fail at the call that introduced them
//! - Every transport-level failure is a single kind carrying its cause
//! - Handshake failures are distinct from exchange failures
//! - Nothing is retried or recovered internally

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An argument violated the operation's contract.
    #[error("invalid argument `{param}`: {reason}")]
    InvalidArgument {
        param: &'static str,
        reason: String,
    },

    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The request could not be exchanged over the transport.
    #[error("transport failure: {0}")]
    Transport(#[source] TransportError),

    /// The WebSocket handshake did not complete.
    #[error("websocket upgrade failed: {0}")]
    Upgrade(#[source] TransportError),

    /// The WebSocket handle has been closed.
    #[error("websocket is closed")]
    SocketClosed,

    /// No factory is registered under the requested name.
    #[error("no client factory registered under `{0}`")]
    UnknownFactory(String),

    /// The shared engine was shut down.
    #[error("transport engine has been shut down")]
    EngineShutdown,

    /// A blocking call was made on a current-thread async runtime.
    #[error("blocking call from a current-thread runtime; use the async variant")]
    BlockingInAsyncContext,
}

impl ClientError {
    /// Shorthand for [`ClientError::InvalidArgument`].
    pub fn invalid_argument(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param,
            reason: reason.into(),
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Causes of a transport failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connect error: {0}")]
    Connect(#[from] std::io::Error),

    /// The exchange did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Network transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Domain-socket transport error.
    #[error("http error: {0}")]
    Hyper(#[from] hyper_util::client::legacy::Error),

    /// Response body could not be read.
    #[error("body error: {0}")]
    Body(#[from] hyper::Error),

    /// WebSocket protocol error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The engine runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(std::io::Error),

    /// The request could not be mapped onto the wire.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
