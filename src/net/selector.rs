//! Transport selection from the configured base URI.
//!
//! # Design Decisions
//! - Scheme `unix` selects the domain-socket transport; http/https the network one
//! - `unix:///path` names the socket by its percent-decoded URL path; a host is rejected
//! - Configuration problems are caller errors: reported at once, never retried

use std::path::PathBuf;
use std::sync::Arc;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::{validate_client_config, ClientConfig, ConfigError};
use crate::error::{ClientError, ClientResult};
use crate::net::{Engine, NetworkTransport, Transport};

/// Scheme denoting a local domain socket.
pub const UNIX_SCHEME: &str = "unix";

/// Filesystem path named by a `unix:///path` URI.
pub(crate) fn socket_path(url: &Url) -> PathBuf {
    PathBuf::from(percent_decode_str(url.path()).decode_utf8_lossy().into_owned())
}

/// Which kind of transport a client is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    DomainSocket,
    Network,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::DomainSocket => f.write_str("domain-socket"),
            TransportKind::Network => f.write_str("network"),
        }
    }
}

/// Endpoint a transport will be bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTarget {
    Unix { socket_path: PathBuf },
    Network { base: Url },
}

impl TransportTarget {
    /// Validate `config` and decide which transport it needs.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        validate_client_config(config).map_err(ConfigError::Validation)?;

        let url = Url::parse(&config.base_uri)
            .map_err(|e| ClientError::invalid_argument("base_uri", e.to_string()))?;
        if url.scheme() == UNIX_SCHEME {
            Ok(Self::Unix {
                socket_path: socket_path(&url),
            })
        } else {
            Ok(Self::Network { base: url })
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Unix { .. } => TransportKind::DomainSocket,
            Self::Network { .. } => TransportKind::Network,
        }
    }
}

/// Build the transport `config` calls for, bound to `engine`'s pools.
pub fn select_transport(
    config: &ClientConfig,
    engine: &Engine,
) -> ClientResult<Arc<dyn Transport>> {
    let target = TransportTarget::from_config(config)?;
    tracing::info!(
        base_uri = %config.base_uri,
        transport = %target.kind(),
        "Transport selected"
    );

    match target {
        TransportTarget::Network { base } => {
            let client = engine.network_client(config.connect_timeout())?;
            Ok(Arc::new(NetworkTransport::new(client, base, config.websocket.clone())))
        }
        #[cfg(unix)]
        TransportTarget::Unix { socket_path } => {
            let client = engine.socket_client(&socket_path, config.connect_timeout())?;
            Ok(Arc::new(crate::net::UnixTransport::new(
                client,
                &socket_path,
                config.connect_timeout(),
                config.websocket.clone(),
            )))
        }
        #[cfg(not(unix))]
        TransportTarget::Unix { .. } => Err(ClientError::invalid_argument(
            "base_uri",
            "domain sockets are not supported on this platform",
        )),
    }
}
