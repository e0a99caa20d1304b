//! Inventory construction from zone transfers
//!
//! Devices are correlated across zones in two phases over an arena of
//! devices indexed by lowercase name:
//!
//! 1. identity: every address record seeds a device (name + primary address)
//! 2. enrichment: aliases, reverse addresses, secondary mappings and the
//!    descriptive records are attached to the devices found in phase 1
//!
//! Because identity is settled before anything else is looked at, the order
//! in which a transfer delivers records does not matter.
//!
//! Malformed entries (a PTR outside its zone, an alias naming itself) are
//! logged and skipped. A failed transfer aborts the whole build.

use crate::device::Device;
use crate::directory::DirectoryService;
use crate::error::Result;
use crate::inventory::Inventory;
use crate::record::projector::apply_description;
use crate::record::{Record, RecordData, address_from_reverse, name_key};
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use tracing::{debug, info, trace, warn};

/// Builds inventories from the forward and reverse zones of a directory
#[derive(Debug)]
pub struct InventoryBuilder<'a> {
    directory: &'a DirectoryService,
}

/// Alias table entry
struct AliasTarget {
    /// Alias name as published
    alias: String,
    /// Arena index of the device it points at
    device: usize,
}

/// Devices under construction
#[derive(Default)]
struct Arena {
    devices: Vec<Device>,
    index: HashMap<String, usize>,
}

impl Arena {
    fn get(&self, name: &str) -> Option<usize> {
        self.index.get(&name_key(name)).copied()
    }

    /// Record an address; the first address seen for a name is primary,
    /// except that an IPv4 address takes over from an IPv6 one.
    fn seed(&mut self, name: &str, ip: IpAddr) {
        match self.get(name) {
            Some(i) => {
                let device = &mut self.devices[i];
                if device.ip.is_ipv6() && ip.is_ipv4() {
                    debug!("Preferring {} over {} as primary address of {}", ip, device.ip, name);
                    device.ip = ip;
                }
            }
            None => {
                self.index.insert(name_key(name), self.devices.len());
                self.devices.push(Device::new(name, ip));
            }
        }
    }
}

impl<'a> InventoryBuilder<'a> {
    pub fn new(directory: &'a DirectoryService) -> Self {
        Self { directory }
    }

    /// Transfer the zones and correlate their records into devices
    ///
    /// # Errors
    ///
    /// - `Error::Transfer`: any zone could not be transferred completely;
    ///   nothing built so far is returned
    /// - `Error::Transport`/`Error::NotFound`: the server could not be resolved
    pub async fn build(&self, forward_zones: &[String], reverse_zones: &[String]) -> Result<Inventory> {
        let mut ptrs = BTreeMap::new();
        for zone in reverse_zones {
            let records = self.directory.transfer(zone).await?;
            collect_pointers(zone, &records, &mut ptrs);
        }

        let mut records = Vec::new();
        for zone in forward_zones {
            records.extend(self.directory.transfer(zone).await?);
        }

        let inventory = correlate(&records, &ptrs);

        info!(
            "Built inventory of {} devices from {} forward and {} reverse zones",
            inventory.len(),
            forward_zones.len(),
            reverse_zones.len()
        );
        Ok(inventory)
    }
}

/// Extract `address -> target` from the pointer records of a reverse zone
fn collect_pointers(zone: &str, records: &[Record], ptrs: &mut BTreeMap<IpAddr, String>) {
    for record in records {
        let RecordData::Pointer(target) = &record.data else {
            continue;
        };

        let ip = match address_from_reverse(&record.name, zone) {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Skipping pointer {} -> {}: {}", record.name, target, e);
                continue;
            }
        };

        match ptrs.get(&ip) {
            Some(existing) if existing != target => {
                warn!("Ignoring extra pointer {} -> {} (already {})", ip, target, existing);
            }
            Some(_) => {}
            None => {
                trace!("Pointer {} -> {}", ip, target);
                ptrs.insert(ip, target.clone());
            }
        }
    }
}

/// Correlate forward zone records and reverse pointers into an inventory
fn correlate(records: &[Record], ptrs: &BTreeMap<IpAddr, String>) -> Inventory {
    let mut arena = Arena::default();

    // identity: address records only
    for record in records {
        if let RecordData::Address(ip) = record.data {
            arena.seed(&record.name, ip);
        }
    }

    // aliases
    let mut aliases: HashMap<String, AliasTarget> = HashMap::new();
    for record in records {
        let RecordData::Alias(target) = &record.data else {
            continue;
        };

        if name_key(&record.name) == name_key(target) {
            warn!("Skipping alias {} pointing at itself", record.name);
            continue;
        }
        if arena.get(&record.name).is_some() {
            warn!("Skipping alias {} -> {}: name is a device", record.name, target);
            continue;
        }
        let Some(device) = arena.get(target) else {
            debug!("Skipping alias {} -> {}: no such device", record.name, target);
            continue;
        };
        if let Some(seen) = aliases.get(&name_key(&record.name)) {
            if seen.device != device {
                warn!(
                    "Skipping alias {} -> {}: already an alias of another device",
                    record.name, target
                );
            }
            continue;
        }

        arena.devices[device].aliases.push(record.name.clone());
        aliases.insert(
            name_key(&record.name),
            AliasTarget {
                alias: record.name.clone(),
                device,
            },
        );
    }

    // reverse addresses and secondary mappings
    for (ip, target) in ptrs {
        if let Some(i) = arena.get(target) {
            arena.devices[i].reverse.push(*ip);
        } else if let Some(entry) = aliases.get(&name_key(target)) {
            arena.devices[entry.device].mapping.insert(entry.alias.clone(), *ip);
        } else {
            debug!("Pointer {} -> {} matches no device", ip, target);
        }
    }

    // descriptive records
    for record in records {
        let Some(i) = arena.get(&record.name) else {
            continue;
        };
        match &record.data {
            RecordData::Unsupported { rtype } => {
                trace!("Ignoring type {} record at {}", rtype, record.name);
            }
            data => {
                apply_description(&mut arena.devices[i], data);
            }
        }
    }

    for device in &mut arena.devices {
        device.reverse.sort();
        device.aliases.sort();
    }

    Inventory::new(arena.devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_alias_before_address_is_kept() {
        let records = vec![
            Record::alias("alt.example.com.", "host.example.com."),
            Record::new(
                "host.example.com.",
                0,
                RecordData::Text(vec!["Harbour".to_string()]),
            ),
            Record::address("host.example.com.", ip("192.168.1.5")),
        ];

        let inventory = correlate(&records, &BTreeMap::new());
        let device = inventory.find("host.example.com.").unwrap();
        assert_eq!(device.aliases, vec!["alt.example.com."]);
        assert_eq!(device.place, "Harbour");
    }

    #[test]
    fn test_ipv4_preferred_as_primary() {
        let records = vec![
            Record::address("host.example.com.", ip("2001:db8::5")),
            Record::address("host.example.com.", ip("192.168.1.5")),
            Record::address("host.example.com.", ip("192.168.1.6")),
        ];

        let inventory = correlate(&records, &BTreeMap::new());
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.devices()[0].ip, ip("192.168.1.5"));
    }

    #[test]
    fn test_malformed_aliases_skipped() {
        let records = vec![
            Record::address("host.example.com.", ip("192.168.1.5")),
            Record::address("other.example.com.", ip("192.168.1.6")),
            Record::alias("loop.example.com.", "loop.example.com."),
            Record::alias("other.example.com.", "host.example.com."),
            Record::alias("dangling.example.com.", "nowhere.example.com."),
        ];

        let inventory = correlate(&records, &BTreeMap::new());
        assert!(inventory.iter().all(|d| d.aliases.is_empty()));
        assert_eq!(inventory.len(), 2);
    }

    #[test]
    fn test_repeated_alias_attached_once() {
        let records = vec![
            Record::address("host.example.com.", ip("192.168.1.5")),
            Record::address("other.example.com.", ip("192.168.1.6")),
            Record::alias("alt.example.com.", "host.example.com."),
            Record::alias("ALT.example.com.", "host.example.com."),
            Record::alias("alt.example.com.", "other.example.com."),
        ];

        let mut ptrs = BTreeMap::new();
        ptrs.insert(ip("192.168.1.9"), "alt.example.com.".to_string());

        let inventory = correlate(&records, &ptrs);
        let host = inventory.find("host.example.com.").unwrap();
        assert_eq!(host.aliases, vec!["alt.example.com."]);
        assert_eq!(host.mapping.len(), 1);
        assert!(inventory.find("other.example.com.").unwrap().aliases.is_empty());
    }

    #[test]
    fn test_pointers_outside_zone_skipped() {
        let records = vec![
            Record::pointer("5.1.168.192.in-addr.arpa.", "host.example.com."),
            Record::pointer("5.0.0.10.in-addr.arpa.", "host.example.com."),
            Record::new("168.192.in-addr.arpa.", 0, RecordData::Unsupported { rtype: 6 }),
        ];

        let mut ptrs = BTreeMap::new();
        collect_pointers("168.192.in-addr.arpa.", &records, &mut ptrs);
        assert_eq!(ptrs.len(), 1);
        assert_eq!(ptrs[&ip("192.168.1.5")], "host.example.com.");
    }
}
