// # HTTP Remote Fetch
//
// This crate provides the HTTP/JSON implementation of `RemoteFetch`.
//
// ## Purpose
//
// Some deployments publish a pre-built inventory snapshot (a JSON array of
// devices) instead of granting zone transfers. This fetcher retrieves such
// a snapshot with one GET request per call.
//
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401, 403, 404, 5xx)
// - ✅ `null` collections in the snapshot accepted as empty
// - ❌ NO retry logic (owned by the caller)
// - ❌ NO caching
//
// Relative snapshot paths are joined to `http://<server>:<port>` by
// `InventorySourceConfig::remote_url` before they reach this crate.

use equipzone_core::config::InventorySourceConfig;
use equipzone_core::traits::{RemoteFetch, RemoteFetchFactory};
use equipzone_core::{Device, Error, Inventory, Registry, Result};
use std::time::Duration;

/// Default HTTP timeout for snapshot requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP/JSON inventory fetcher
///
/// # Trust Level: Untrusted
///
/// One request per call. The body is decoded into devices and returned as
/// a sorted inventory; nothing is kept between calls.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: reqwest::Client,
}

impl HttpFetch {
    /// Create a fetcher with the default timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a fetcher with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

impl Default for HttpFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RemoteFetch for HttpFetch {
    async fn fetch(&self, url: &str) -> Result<Inventory> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::fetch(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            // Map HTTP status codes to specific errors
            return match status.as_u16() {
                401 | 403 => Err(Error::fetch(format!(
                    "Authentication failed: access to {} refused. Status: {}",
                    url, status
                ))),
                404 => Err(Error::not_found(format!("Inventory not found: {}", url))),
                500..=599 => Err(Error::fetch(format!(
                    "Inventory server error (transient): {} - {}",
                    status, error_text
                ))),
                _ => Err(Error::fetch(format!(
                    "Inventory request failed: {} - {}",
                    status, error_text
                ))),
            };
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(format!("Failed to read response: {}", e)))?;

        let devices: Vec<Device> = serde_json::from_str(&body)
            .map_err(|e| Error::fetch(format!("Invalid inventory from {}: {}", url, e)))?;

        tracing::debug!("Fetched {} devices from {}", devices.len(), url);
        Ok(Inventory::new(devices))
    }

    fn fetch_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP fetchers
#[derive(Debug, Default)]
pub struct HttpFetchFactory;

impl RemoteFetchFactory for HttpFetchFactory {
    fn create(&self, config: &InventorySourceConfig) -> Result<Box<dyn RemoteFetch>> {
        match config {
            InventorySourceConfig::Remote { .. } => Ok(Box::new(HttpFetch::new())),
            _ => Err(Error::config("Invalid config for HTTP fetcher")),
        }
    }
}

/// Register the HTTP fetcher with a registry
pub fn register(registry: &Registry) {
    registry.register_fetch("http", Box::new(HttpFetchFactory));
}
