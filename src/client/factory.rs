//! Client factories.

use std::sync::Arc;

use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::net::{select_transport, Engine};

/// Builds clients from configuration.
pub trait ClientFactory: Send + Sync {
    fn create_client(&self, config: ClientConfig) -> ClientResult<HttpClient>;
}

/// The built-in factory: `unix` base URIs get the domain-socket transport,
/// everything else the network transport.
#[derive(Debug, Clone)]
pub struct DefaultClientFactory {
    engine: Arc<Engine>,
}

impl DefaultClientFactory {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl ClientFactory for DefaultClientFactory {
    fn create_client(&self, config: ClientConfig) -> ClientResult<HttpClient> {
        let transport = select_transport(&config, &self.engine)?;
        HttpClient::from_transport(transport, Arc::clone(&self.engine), config)
    }
}
