//! Named factory registry.
//!
//! # Responsibilities
//! - Map names to factory constructors, populated at startup
//! - Resolve the default factory, overridable from the environment
//!
//! # Design Decisions
//! - Registration is explicit; nothing is discovered implicitly
//! - Re-registering a name replaces the previous constructor

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::factory::{ClientFactory, DefaultClientFactory};
use crate::error::{ClientError, ClientResult};
use crate::net::Engine;

/// Name of the built-in factory.
pub const DEFAULT_FACTORY: &str = "default";

/// Environment variable selecting the factory used by [`ClientRegistry::create_default`].
pub const FACTORY_ENV: &str = "SWITCHYARD_HTTP_FACTORY";

type FactoryConstructor = Arc<dyn Fn(Arc<Engine>) -> Arc<dyn ClientFactory> + Send + Sync>;

/// Registry of client factories by name.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    factories: HashMap<String, FactoryConstructor>,
}

impl ClientRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in factory.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT_FACTORY, |engine| {
            Arc::new(DefaultClientFactory::new(engine)) as Arc<dyn ClientFactory>
        });
        registry
    }

    /// Register a factory constructor under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(Arc<Engine>) -> Arc<dyn ClientFactory> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Arc::new(constructor)).is_some() {
            tracing::debug!(factory = %name, "Replaced client factory");
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Construct the factory registered under `name`.
    pub fn factory(&self, name: &str, engine: Arc<Engine>) -> ClientResult<Arc<dyn ClientFactory>> {
        let constructor = self
            .factories
            .get(name)
            .ok_or_else(|| ClientError::UnknownFactory(name.to_string()))?;
        Ok(constructor(engine))
    }

    /// Name chosen by the environment, or [`DEFAULT_FACTORY`].
    pub fn default_name() -> String {
        std::env::var(FACTORY_ENV)
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FACTORY.to_string())
    }

    /// Construct the factory named by [`ClientRegistry::default_name`].
    pub fn create_default(&self, engine: Arc<Engine>) -> ClientResult<Arc<dyn ClientFactory>> {
        self.factory(&Self::default_name(), engine)
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("factories", &self.names())
            .finish()
    }
}
