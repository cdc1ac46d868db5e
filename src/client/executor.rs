//! Request execution over a transport.
//!
//! # Responsibilities
//! - Present a blocking `execute` over an asynchronous transport
//! - Bound each exchange by the read timeout
//! - Map every failure to a single transport-failure kind
//!
//! # Design Decisions
//! - Sent exactly once; retrying is the caller's decision
//! - The future is driven on the shared engine, never a private runtime

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ClientError, ClientResult, TransportError};
use crate::http::{Request, Response};
use crate::net::{Engine, Transport};

/// Anything that turns a request into a response.
pub trait Executor: Send + Sync {
    fn execute(&self, request: Request) -> ClientResult<Response>;
}

/// The innermost executor: one transport send, nothing else.
pub(crate) struct TransportExecutor {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) engine: Arc<Engine>,
    read_timeout: Duration,
}

impl TransportExecutor {
    pub(crate) fn new(transport: Arc<dyn Transport>, engine: Arc<Engine>, read_timeout: Duration) -> Self {
        Self {
            transport,
            engine,
            read_timeout,
        }
    }
}

impl Executor for TransportExecutor {
    fn execute(&self, request: Request) -> ClientResult<Response> {
        let send = self.transport.send(request);
        let read_timeout = self.read_timeout;
        let outcome = self
            .engine
            .block_on(async move { tokio::time::timeout(read_timeout, send).await })?;

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ClientError::Transport(e)),
            Err(_) => Err(ClientError::Transport(TransportError::Timeout(read_timeout))),
        }
    }
}
