// # Remote Fetch Trait
//
// Defines the interface for retrieving a pre-built inventory snapshot from
// a remote service instead of building it from zone transfers.
//
// ## Implementations
//
// - HTTP/JSON: `equipzone-fetch-http` crate

use crate::inventory::Inventory;
use async_trait::async_trait;

/// Trait for remote inventory retrieval
///
/// # Trust Level: Untrusted
///
/// Fetchers perform one request per call and return the decoded snapshot.
/// They never retry, cache or merge snapshots.
#[async_trait]
pub trait RemoteFetch: Send + Sync {
    /// Fetch and decode the inventory published at `url`
    ///
    /// # Returns
    ///
    /// - `Ok(Inventory)`: The snapshot, sorted by device name
    /// - `Err(Error::Fetch)`: The request failed or the body could not be decoded
    async fn fetch(&self, url: &str) -> Result<Inventory, crate::Error>;

    /// Get the fetcher name (for logging/debugging)
    fn fetch_name(&self) -> &'static str;
}

/// Helper trait for constructing fetchers from configuration
pub trait RemoteFetchFactory: Send + Sync {
    fn create(
        &self,
        config: &crate::config::InventorySourceConfig,
    ) -> Result<Box<dyn RemoteFetch>, crate::Error>;
}
