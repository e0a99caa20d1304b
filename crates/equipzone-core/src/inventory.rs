//! Device inventories
//!
//! An [`Inventory`] is an immutable list of devices sorted by name. Queries
//! return new inventories holding clones of the matching devices.

use crate::builder::InventoryBuilder;
use crate::device::Device;
use crate::directory::DirectoryService;
use crate::error::Result;
use crate::traits::RemoteFetch;
use ipnetwork::IpNetwork;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Sorted, read-only list of devices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Device>", into = "Vec<Device>")]
pub struct Inventory {
    devices: Vec<Device>,
}

impl Inventory {
    /// Create an inventory, sorting devices by name
    pub fn new(mut devices: Vec<Device>) -> Self {
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        Self { devices }
    }

    /// Build from zone transfers of the forward and reverse zones
    pub async fn load_local(
        directory: &DirectoryService,
        forward_zones: &[String],
        reverse_zones: &[String],
    ) -> Result<Self> {
        InventoryBuilder::new(directory)
            .build(forward_zones, reverse_zones)
            .await
    }

    /// Fetch a pre-built snapshot
    pub async fn load_remote(fetch: &dyn RemoteFetch, url: &str) -> Result<Self> {
        tracing::debug!("Fetching inventory from {} via {}", url, fetch.fetch_name());
        fetch.fetch(url).await
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn into_devices(self) -> Vec<Device> {
        self.devices
    }

    /// Device with exactly this name
    pub fn find(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Device whose primary address is `ip`
    pub fn find_by_address(&self, ip: IpAddr) -> Option<&Device> {
        self.devices.iter().find(|d| d.ip == ip)
    }

    fn filter(&self, keep: impl Fn(&Device) -> bool) -> Inventory {
        Inventory {
            devices: self.devices.iter().filter(|d| keep(d)).cloned().collect(),
        }
    }

    pub fn list_by_model(&self, model: &str) -> Inventory {
        self.filter(|d| d.has_model(model))
    }

    pub fn list_by_code(&self, code: &str) -> Inventory {
        self.filter(|d| d.has_code(code))
    }

    pub fn list_by_place(&self, place: &str) -> Inventory {
        self.filter(|d| d.at_place(place))
    }

    pub fn list_by_model_and_code(&self, model: &str, code: &str) -> Inventory {
        self.filter(|d| d.has_model(model) && d.has_code(code))
    }

    /// Devices with a primary or reverse address inside the network
    pub fn list_by_network(&self, network: &IpNetwork) -> Inventory {
        self.filter(|d| d.in_network(network))
    }

    pub fn match_by_name(&self, pattern: &str) -> Result<Inventory> {
        let re = Regex::new(pattern)?;
        Ok(self.filter(|d| re.is_match(&d.name)))
    }

    pub fn match_by_model(&self, pattern: &str) -> Result<Inventory> {
        let re = Regex::new(pattern)?;
        Ok(self.filter(|d| re.is_match(&d.model)))
    }

    pub fn match_by_place(&self, pattern: &str) -> Result<Inventory> {
        let re = Regex::new(pattern)?;
        Ok(self.filter(|d| re.is_match(&d.place)))
    }
}

impl From<Vec<Device>> for Inventory {
    fn from(devices: Vec<Device>) -> Self {
        Self::new(devices)
    }
}

impl From<Inventory> for Vec<Device> {
    fn from(inventory: Inventory) -> Self {
        inventory.devices
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a Device;
    type IntoIter = std::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}
