// # Memory Transport
//
// In-process implementation of Transport.
//
// ## Purpose
//
// Serves zones held in memory as if they lived on an authoritative server:
// host resolution from a static table, zone transfers, plain queries and
// signed updates (RFC 2136 insert / remove-record / remove-rrset /
// remove-name) checked
// against a table of shared keys.
//
// Every signed message received is appended to a journal so callers can
// see exactly which mutations were issued.
//
// ## When to Use
//
// - Testing environments
// - Embedding equipzone without a network stack
// - Dry runs: reconcile against a copy, then inspect the journal

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::config::DirectoryConfig;
use crate::record::{Record, RecordData, RecordType, name_key};
use crate::traits::transport::{
    Query, Rcode, Response, Transport, TransportFactory, TsigKey, UpdateMessage, UpdateOp,
};
use crate::Error;

#[derive(Debug, Default)]
struct MemoryState {
    hosts: HashMap<String, Vec<IpAddr>>,
    zones: BTreeMap<String, Vec<Record>>,
    keys: HashMap<String, String>,
    failing_transfers: HashSet<String>,
    journal: Vec<UpdateMessage>,
}

impl MemoryState {
    /// Zone holding `name`: the longest served zone that is a suffix of it
    fn zone_for(&self, name: &str) -> Option<String> {
        let name = name_key(name);
        self.zones
            .keys()
            .filter(|zone| in_zone(&name, zone))
            .max_by_key(|zone| zone.len())
            .cloned()
    }
}

fn in_zone(name: &str, zone: &str) -> bool {
    zone == "." || name == zone || name.ends_with(&format!(".{}", zone))
}

fn host_key(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn matches_type(record: &Record, rtype: RecordType) -> bool {
    rtype == RecordType::Any || record.record_type() == Some(rtype)
}

/// Same owner and same data; domain names in the data compare case-insensitively
fn same_record(a: &Record, b: &Record) -> bool {
    if name_key(&a.name) != name_key(&b.name) {
        return false;
    }
    match (&a.data, &b.data) {
        (RecordData::Pointer(x), RecordData::Pointer(y))
        | (RecordData::Alias(x), RecordData::Alias(y)) => name_key(x) == name_key(y),
        (x, y) => x == y,
    }
}

/// In-memory transport implementation
///
/// Clones share the same zones, keys and journal.
///
/// # Example
///
/// ```rust,no_run
/// use equipzone_core::record::Record;
/// use equipzone_core::transport::MemoryTransport;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let transport = MemoryTransport::new();
///     transport.add_host("ns1.example.com", "192.0.2.53".parse()?).await;
///     transport.add_key("update-key", "c2VjcmV0").await;
///     transport
///         .add_zone("example.com.", vec![Record::address("host.example.com.", "192.0.2.1".parse()?)])
///         .await;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryTransport {
    /// Create a transport serving nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address for a host name
    pub async fn add_host(&self, host: &str, ip: IpAddr) {
        let mut guard = self.inner.write().await;
        guard.hosts.entry(host_key(host)).or_default().push(ip);
    }

    /// Serve a zone, replacing any previous content
    pub async fn add_zone(&self, zone: &str, records: Vec<Record>) {
        let mut guard = self.inner.write().await;
        guard.zones.insert(name_key(zone), records);
    }

    /// Accept signed updates made with this key
    pub async fn add_key(&self, name: &str, secret: &str) {
        let mut guard = self.inner.write().await;
        guard.keys.insert(name_key(name), secret.to_string());
    }

    /// Make transfers of a zone abort
    pub async fn fail_transfer(&self, zone: &str) {
        let mut guard = self.inner.write().await;
        guard.failing_transfers.insert(name_key(zone));
    }

    /// Current content of a zone
    pub async fn zone_records(&self, zone: &str) -> Vec<Record> {
        let guard = self.inner.read().await;
        guard.zones.get(&name_key(zone)).cloned().unwrap_or_default()
    }

    /// Every signed message received, in arrival order
    pub async fn journal(&self) -> Vec<UpdateMessage> {
        self.inner.read().await.journal.clone()
    }

    /// Forget the journal
    pub async fn clear_journal(&self) {
        self.inner.write().await.journal.clear();
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, Error> {
        let guard = self.inner.read().await;
        match guard.hosts.get(&host_key(host)) {
            Some(addresses) if !addresses.is_empty() => Ok(addresses.clone()),
            _ => Err(Error::not_found(format!("no addresses for host {}", host))),
        }
    }

    async fn transfer_zone(&self, _server: SocketAddr, zone: &str) -> Result<Vec<Record>, Error> {
        let key = name_key(zone);
        let guard = self.inner.read().await;

        if guard.failing_transfers.contains(&key) {
            return Err(Error::transfer(zone, "transfer aborted mid-stream"));
        }

        guard
            .zones
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::transfer(zone, "zone not served (NOTAUTH)"))
    }

    async fn exchange(&self, _server: SocketAddr, query: &Query) -> Result<Response, Error> {
        let guard = self.inner.read().await;

        let Some(zone) = guard.zone_for(&query.name) else {
            return Ok(Response::new(Rcode::Refused));
        };

        let name = name_key(&query.name);
        let at_name: Vec<&Record> = guard.zones[&zone]
            .iter()
            .filter(|r| name_key(&r.name) == name)
            .collect();

        if at_name.is_empty() {
            return Ok(Response::new(Rcode::NxDomain));
        }

        let answers = at_name
            .into_iter()
            .filter(|r| matches_type(r, query.rtype))
            .cloned()
            .collect();

        Ok(Response::new(Rcode::NoError).with_answers(answers))
    }

    async fn authenticated_exchange(
        &self,
        _server: SocketAddr,
        message: &UpdateMessage,
        key: &TsigKey,
    ) -> Result<Response, Error> {
        let mut guard = self.inner.write().await;
        guard.journal.push(message.clone());

        match guard.keys.get(&name_key(&key.name)) {
            None => return Ok(Response::new(Rcode::BadKey)),
            Some(secret) if *secret != key.secret => return Ok(Response::new(Rcode::BadSig)),
            Some(_) => {}
        }

        let zone = name_key(&message.zone);
        if !guard.zones.contains_key(&zone) {
            return Ok(Response::new(Rcode::NotAuth));
        }

        // prescan: the whole message is rejected if any name is outside the zone
        let outside = message.operations.iter().any(|op| match op {
            UpdateOp::Insert(Record {
                data: RecordData::Extension { .. },
                ..
            })
            | UpdateOp::RemoveRecord(Record {
                data: RecordData::Extension { .. },
                ..
            })
            | UpdateOp::RemoveRrset {
                rtype: RecordType::Opt,
                ..
            } => false,
            UpdateOp::Insert(record) | UpdateOp::RemoveRecord(record) => {
                !in_zone(&name_key(&record.name), &zone)
            }
            UpdateOp::RemoveRrset { name, .. } | UpdateOp::RemoveName { name } => {
                !in_zone(&name_key(name), &zone)
            }
        });
        if outside {
            return Ok(Response::new(Rcode::NotZone));
        }

        let records = guard.zones.entry(zone).or_default();
        for op in &message.operations {
            match op {
                UpdateOp::Insert(record) => {
                    if let RecordData::Extension { .. } = record.data {
                        continue;
                    }
                    match records.iter_mut().find(|r| same_record(r, record)) {
                        Some(r) => r.ttl = record.ttl,
                        None => records.push(record.clone()),
                    }
                }
                UpdateOp::RemoveRecord(record) => {
                    records.retain(|r| !same_record(r, record));
                }
                UpdateOp::RemoveRrset { name, rtype } => {
                    if *rtype == RecordType::Opt {
                        continue;
                    }
                    let name = name_key(name);
                    records.retain(|r| !(name_key(&r.name) == name && matches_type(r, *rtype)));
                }
                UpdateOp::RemoveName { name } => {
                    let name = name_key(name);
                    records.retain(|r| name_key(&r.name) != name);
                }
            }
        }

        Ok(Response::new(Rcode::NoError))
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory handing out handles to one shared in-memory transport
#[derive(Debug, Clone, Default)]
pub struct MemoryTransportFactory {
    transport: MemoryTransport,
}

impl MemoryTransportFactory {
    pub fn new(transport: MemoryTransport) -> Self {
        Self { transport }
    }
}

impl TransportFactory for MemoryTransportFactory {
    fn create(&self, _config: &DirectoryConfig) -> Result<Box<dyn Transport>, Error> {
        Ok(Box::new(self.transport.clone()))
    }
}
