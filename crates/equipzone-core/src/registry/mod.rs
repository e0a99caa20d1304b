//! Plugin-based collaborator registry
//!
//! The registry maps collaborator names to factories so that transports and
//! remote fetchers can be chosen from configuration at runtime, avoiding
//! hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use equipzone_core::registry::Registry;
//! use equipzone_core::config::DirectoryConfig;
//!
//! let registry = Registry::with_defaults();
//!
//! let config = DirectoryConfig::new("ns1.example.com");
//! let transport = registry.create_transport(&config)?;
//! ```
//!
//! ## Registration
//!
//! Implementations register themselves during initialization:
//!
//! ```rust,ignore
//! // In equipzone-fetch-http
//! pub fn register(registry: &Registry) {
//!     registry.register_fetch("http", Box::new(HttpFetchFactory::default()));
//! }
//! ```

use crate::config::{DirectoryConfig, InventorySourceConfig};
use crate::error::{Error, Result};
use crate::traits::{RemoteFetch, RemoteFetchFactory, Transport, TransportFactory};
use crate::transport::MemoryTransportFactory;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of transport and remote fetch factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct Registry {
    /// Registered transport factories
    transports: RwLock<HashMap<String, Box<dyn TransportFactory>>>,

    /// Registered remote fetch factories
    fetchers: RwLock<HashMap<String, Box<dyn RemoteFetchFactory>>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in in-memory transport as `"memory"`
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_transport("memory", Box::new(MemoryTransportFactory::default()));
        registry
    }

    /// Register a transport factory
    ///
    /// # Parameters
    ///
    /// - `name`: Transport name referenced by `DirectoryConfig::transport`
    /// - `factory`: Factory object for creating transport instances
    pub fn register_transport(&self, name: impl Into<String>, factory: Box<dyn TransportFactory>) {
        let mut transports = self.transports.write().unwrap_or_else(PoisonError::into_inner);
        transports.insert(name.into(), factory);
    }

    /// Register a remote fetch factory
    ///
    /// # Parameters
    ///
    /// - `name`: Fetcher name referenced by `InventorySourceConfig::Remote::fetcher`
    /// - `factory`: Factory object for creating fetch instances
    pub fn register_fetch(&self, name: impl Into<String>, factory: Box<dyn RemoteFetchFactory>) {
        let mut fetchers = self.fetchers.write().unwrap_or_else(PoisonError::into_inner);
        fetchers.insert(name.into(), factory);
    }

    /// Create the transport named by a directory configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Transport>)`: Created transport instance
    /// - `Err(Error::Config)`: If the transport is not registered
    pub fn create_transport(&self, config: &DirectoryConfig) -> Result<Box<dyn Transport>> {
        let transports = self.transports.read().unwrap_or_else(PoisonError::into_inner);

        let factory = transports
            .get(&config.transport)
            .ok_or_else(|| Error::config(format!("Unknown transport: {}", config.transport)))?;

        factory.create(config)
    }

    /// Create the fetcher named by a remote inventory source
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RemoteFetch>)`: Created fetch instance
    /// - `Err(Error::Config)`: If the source is not remote or the fetcher is not registered
    pub fn create_fetch(&self, config: &InventorySourceConfig) -> Result<Box<dyn RemoteFetch>> {
        let InventorySourceConfig::Remote { fetcher, .. } = config else {
            return Err(Error::config(format!(
                "Inventory source '{}' is not fetched remotely",
                config.type_name()
            )));
        };

        let fetchers = self.fetchers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = fetchers
            .get(fetcher)
            .ok_or_else(|| Error::config(format!("Unknown fetcher: {}", fetcher)))?;

        factory.create(config)
    }

    /// List all registered transport names
    pub fn list_transports(&self) -> Vec<String> {
        let transports = self.transports.read().unwrap_or_else(PoisonError::into_inner);
        transports.keys().cloned().collect()
    }

    /// List all registered fetcher names
    pub fn list_fetchers(&self) -> Vec<String> {
        let fetchers = self.fetchers.read().unwrap_or_else(PoisonError::into_inner);
        fetchers.keys().cloned().collect()
    }

    pub fn has_transport(&self, name: &str) -> bool {
        let transports = self.transports.read().unwrap_or_else(PoisonError::into_inner);
        transports.contains_key(name)
    }

    pub fn has_fetch(&self, name: &str) -> bool {
        let fetchers = self.fetchers.read().unwrap_or_else(PoisonError::into_inner);
        fetchers.contains_key(name)
    }
}
