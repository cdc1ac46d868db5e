//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::filter::Filter;

/// Root configuration loaded from a file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    /// Name of the registered factory used to build clients.
    pub factory: String,

    /// Client settings.
    pub client: ClientConfig,

    /// Shared transport engine settings.
    pub engine: EngineConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for SwitchyardConfig {
    fn default() -> Self {
        Self {
            factory: crate::client::registry::DEFAULT_FACTORY.to_string(),
            client: ClientConfig::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration of a single client instance.
///
/// Immutable once handed to a factory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base endpoint, e.g. `http://127.0.0.1:4444` or `unix:///run/app.sock`.
    pub base_uri: String,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// WebSocket limits.
    pub websocket: WebSocketConfig,

    /// User agent added to requests that carry none.
    pub user_agent: Option<String>,

    /// Initial filter, registered after the user-agent filter.
    #[serde(skip)]
    pub filter: Option<FilterHandle>,
}

impl ClientConfig {
    /// Configuration for the given base URI with default settings.
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            ..Self::default()
        }
    }

    /// Replace the initial filter.
    pub fn with_filter(mut self, filter: impl Filter) -> Self {
        self.filter = Some(FilterHandle::new(filter));
        self
    }

    /// Replace the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.connect_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.read_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_uri: "http://127.0.0.1:4444".to_string(),
            timeouts: TimeoutConfig::default(),
            websocket: WebSocketConfig::default(),
            user_agent: Some(format!("switchyard/{} (rust)", env!("CARGO_PKG_VERSION"))),
            filter: None,
        }
    }
}

/// Timeout configuration for client operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment (and WebSocket handshake) timeout in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one request/response exchange in seconds.
    pub read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            read_secs: 180,
        }
    }
}

/// WebSocket limits. `None` means unlimited.
///
/// Fragmented messages are always aggregated before delivery.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    pub max_message_size: Option<usize>,
    pub max_frame_size: Option<usize>,
}

/// Shared transport engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads of the shared runtime. `None` uses one per core.
    pub worker_threads: Option<usize>,

    /// Name given to runtime threads.
    pub thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "switchyard-io".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "switchyard=info".to_string(),
        }
    }
}

/// Shareable handle to a filter held in configuration.
#[derive(Clone)]
pub struct FilterHandle(pub(crate) Arc<dyn Filter>);

impl FilterHandle {
    pub fn new(filter: impl Filter) -> Self {
        Self(Arc::new(filter))
    }
}

impl fmt::Debug for FilterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FilterHandle(..)")
    }
}
