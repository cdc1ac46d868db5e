//! The client surface handed to callers.
//!
//! # Data Flow
//! ```text
//! registry.rs (name → factory constructor)
//!     → factory.rs (ClientConfig → select transport → HttpClient)
//!     → HttpClient
//!         execute     → filters → executor.rs → transport.send
//!         open_socket → transport.upgrade → websocket dispatch
//!         with        → new HttpClient with one more filter
//! ```
//!
//! # Design Decisions
//! - Clients are cheap to clone; the transport and engine are shared
//! - `with` never mutates the receiver
//! - Socket upgrades bypass the filter chain

pub mod executor;
pub mod factory;
pub mod registry;

use std::sync::Arc;

use http::Method;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, TransportError};
use crate::filter::{AddUserAgent, Filter, Next};
use crate::http::{Request, Response};
use crate::net::{Engine, Transport, TransportKind};
use crate::websocket::{dispatch, Listener, WebSocket};

pub use executor::Executor;
pub use factory::{ClientFactory, DefaultClientFactory};
pub use registry::{ClientRegistry, DEFAULT_FACTORY, FACTORY_ENV};

use executor::TransportExecutor;

/// An HTTP client bound to one transport.
#[derive(Clone)]
pub struct HttpClient {
    core: Arc<TransportExecutor>,
    filters: Arc<Vec<Arc<dyn Filter>>>,
    config: Arc<ClientConfig>,
}

impl HttpClient {
    /// Build a client around an already selected transport.
    ///
    /// The configured user agent and initial filter are registered first,
    /// in that order.
    pub fn from_transport(
        transport: Arc<dyn Transport>,
        engine: Arc<Engine>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let mut filters: Vec<Arc<dyn Filter>> = Vec::new();
        if let Some(agent) = config.user_agent.as_deref() {
            filters.push(Arc::new(AddUserAgent::new(agent)?));
        }
        if let Some(initial) = &config.filter {
            filters.push(Arc::clone(&initial.0));
        }

        let core = TransportExecutor::new(transport, engine, config.read_timeout());
        Ok(Self {
            core: Arc::new(core),
            filters: Arc::new(filters),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.core.transport.kind()
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.core.engine
    }

    /// Number of filters wrapped around the transport.
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Send `request` through the filter chain and wait for the response.
    ///
    /// Blocks the calling thread. From async code use
    /// [`HttpClient::execute_async`].
    pub fn execute(&self, request: Request) -> ClientResult<Response> {
        Next::new(&self.filters, self.core.as_ref()).run(request)
    }

    /// [`HttpClient::execute`] for callers inside an async context.
    pub async fn execute_async(&self, request: Request) -> ClientResult<Response> {
        let client = self.clone();
        let task = self.core.engine.spawn_blocking(move || client.execute(request))?;
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(ClientError::EngineShutdown),
        }
    }

    /// A new client whose chain ends with `filter`. `self` is unchanged.
    pub fn with(&self, filter: impl Filter) -> Self {
        let mut filters = Vec::with_capacity(self.filters.len() + 1);
        filters.extend(self.filters.iter().cloned());
        filters.push(Arc::new(filter) as Arc<dyn Filter>);
        Self {
            core: Arc::clone(&self.core),
            filters: Arc::new(filters),
            config: Arc::clone(&self.config),
        }
    }

    /// Upgrade `request` to a WebSocket delivering events to `listener`.
    ///
    /// Returns once the handshake completed. The request does not pass
    /// through this client's filters.
    pub fn open_socket(
        &self,
        request: Request,
        listener: Arc<dyn Listener>,
    ) -> ClientResult<WebSocket> {
        check_upgrade_request(&request)?;

        let upgrade = self.core.transport.upgrade(request);
        let handshake_timeout = self.config.connect_timeout();
        let outcome = self
            .core
            .engine
            .block_on(async move { tokio::time::timeout(handshake_timeout, upgrade).await })?;

        let channel = match outcome {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "WebSocket handshake failed");
                return Err(ClientError::Upgrade(e));
            }
            Err(_) => {
                return Err(ClientError::Upgrade(TransportError::Timeout(handshake_timeout)));
            }
        };
        dispatch::start(&self.core.engine, channel, listener)
    }

    /// [`HttpClient::open_socket`] for callers inside an async context.
    pub async fn open_socket_async(
        &self,
        request: Request,
        listener: Arc<dyn Listener>,
    ) -> ClientResult<WebSocket> {
        let client = self.clone();
        let task = self
            .core
            .engine
            .spawn_blocking(move || client.open_socket(request, listener))?;
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(ClientError::EngineShutdown),
        }
    }
}

impl Executor for HttpClient {
    fn execute(&self, request: Request) -> ClientResult<Response> {
        HttpClient::execute(self, request)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_uri", &self.config.base_uri)
            .field("transport", &self.transport_kind())
            .field("filters", &self.filters.len())
            .finish()
    }
}

fn check_upgrade_request(request: &Request) -> ClientResult<()> {
    if request.method() != Method::GET {
        return Err(ClientError::invalid_argument(
            "request",
            format!("websocket upgrade requires GET, got {}", request.method()),
        ));
    }
    if request.target().trim().is_empty() {
        return Err(ClientError::invalid_argument("request", "target must be set"));
    }
    Ok(())
}
