//! Configuration types for equipzone
//!
//! This module defines all configuration structures used throughout the crate.

use crate::traits::transport::{TsigAlgorithm, TsigKey};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Default name service port
pub const DEFAULT_DIRECTORY_PORT: u16 = 53;

/// Default port of a remote inventory snapshot service
pub const DEFAULT_REMOTE_PORT: u16 = 9001;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Directory server and credentials
    pub directory: DirectoryConfig,

    /// Where inventories come from
    pub inventory: InventorySourceConfig,

    /// Reconciliation settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl ZoneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let InventorySourceConfig::Local { .. } = self.inventory {
            self.directory.validate()?;
        }
        self.inventory.validate()?;
        self.reconcile.validate()?;

        Ok(())
    }
}

/// Directory server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Server host, optionally with `:port`
    pub server: String,

    /// Port used when the server carries none
    #[serde(default)]
    pub port: Option<u16>,

    /// Transport collaborator to use
    #[serde(default = "default_transport")]
    pub transport: String,

    /// Key for authenticated updates
    #[serde(default)]
    pub key: Option<TsigConfig>,
}

impl DirectoryConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: None,
            transport: default_transport(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: TsigConfig) -> Self {
        self.key = Some(key);
        self
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.server.trim().is_empty() {
            return Err(crate::Error::config("Directory server cannot be empty"));
        }
        if self.port == Some(0) {
            return Err(crate::Error::config("Directory port must be > 0"));
        }
        if let Some(key) = &self.key {
            key.validate()?;
        }
        Ok(())
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_DIRECTORY_PORT)
    }
}

/// Shared-secret signing key
#[derive(Clone, Serialize, Deserialize)]
pub struct TsigConfig {
    /// Key name
    pub name: String,

    /// Base64 shared secret
    /// ⚠️ NEVER log this value
    pub secret: String,

    #[serde(default)]
    pub algorithm: TsigAlgorithm,
}

impl std::fmt::Debug for TsigConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsigConfig")
            .field("name", &self.name)
            .field("secret", &"<REDACTED>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl TsigConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config("Key name cannot be empty"));
        }
        if self.secret.is_empty() {
            return Err(crate::Error::config("Key secret cannot be empty"));
        }
        Ok(())
    }

    pub fn to_key(&self) -> TsigKey {
        TsigKey::new(&self.name, &self.secret).with_algorithm(self.algorithm)
    }
}

/// Inventory source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InventorySourceConfig {
    /// Build from zone transfers
    Local {
        /// Forward zones holding address, alias and descriptive records
        forward_zones: Vec<String>,
        /// Reverse zones holding pointer records
        #[serde(default)]
        reverse_zones: Vec<String>,
    },

    /// Fetch a pre-built snapshot
    Remote {
        /// Snapshot URL, absolute or relative to the server
        url: String,
        /// Port used for relative URLs
        #[serde(default)]
        port: Option<u16>,
        /// Fetch collaborator to use
        #[serde(default = "default_fetcher")]
        fetcher: String,
    },
}

impl InventorySourceConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            InventorySourceConfig::Local {
                forward_zones,
                reverse_zones,
            } => {
                if forward_zones.is_empty() {
                    return Err(crate::Error::config("At least one forward zone is required"));
                }
                if forward_zones
                    .iter()
                    .chain(reverse_zones.iter())
                    .any(|z| z.trim().is_empty())
                {
                    return Err(crate::Error::config("Zone names cannot be empty"));
                }
                Ok(())
            }
            InventorySourceConfig::Remote { url, fetcher, .. } => {
                if url.is_empty() {
                    return Err(crate::Error::config("Remote inventory URL cannot be empty"));
                }
                if fetcher.is_empty() {
                    return Err(crate::Error::config("Remote fetcher cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// URL of a remote snapshot
    ///
    /// Absolute URLs are used as given. A relative path is joined to
    /// `http://<server>:<port>`. A port carried by the server itself wins,
    /// otherwise the configured port is used, defaulting to 9001.
    pub fn remote_url(&self, server: &str) -> Result<String, crate::Error> {
        let InventorySourceConfig::Remote { url, port, .. } = self else {
            return Err(crate::Error::config("Inventory source is not remote"));
        };

        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(url.clone());
        }
        if server.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "Relative inventory URL {} needs a server",
                url
            )));
        }

        let authority = authority(server.trim(), port.unwrap_or(DEFAULT_REMOTE_PORT))?;
        Ok(format!("http://{}/{}", authority, url.trim_start_matches('/')))
    }

    /// Get the source type name
    pub fn type_name(&self) -> &str {
        match self {
            InventorySourceConfig::Local { .. } => "local",
            InventorySourceConfig::Remote { fetcher, .. } => fetcher,
        }
    }
}

/// `host:port` for a server that may already carry a port
fn authority(server: &str, port: u16) -> Result<String, crate::Error> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr.to_string());
    }
    if let Ok(ip) = server.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port).to_string());
    }

    match server.rsplit_once(':') {
        Some((host, given)) => {
            let given: u16 = given.parse().map_err(|_| {
                crate::Error::config(format!("Invalid port in server {}", server))
            })?;
            Ok(format!("{}:{}", host, given))
        }
        None => Ok(format!("{}:{}", server, port)),
    }
}

impl Default for InventorySourceConfig {
    fn default() -> Self {
        InventorySourceConfig::Local {
            forward_zones: Vec::new(),
            reverse_zones: Vec::new(),
        }
    }
}

/// Reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Forward zone updates are addressed to
    #[serde(default)]
    pub zone: String,

    /// TTL stamped on inserted records
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl ReconcileConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl == 0 {
            return Err(crate::Error::config("Reconcile TTL must be > 0"));
        }
        Ok(())
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            zone: String::new(),
            ttl: default_ttl(),
        }
    }
}

fn default_transport() -> String {
    "memory".to_string()
}

fn default_fetcher() -> String {
    "http".to_string()
}

fn default_ttl() -> u32 {
    3600
}
