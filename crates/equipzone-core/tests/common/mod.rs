//! Test doubles and common fixtures for contract tests
//!
//! - a seeded [`MemoryTransport`] holding one forward and two reverse zones
//! - [`ScriptedTransport`], answering every signed update with a fixed rcode

#![allow(dead_code)]

use equipzone_core::error::{Error, Result};
use equipzone_core::geo::{Loc, Position};
use equipzone_core::record::{Record, RecordData};
use equipzone_core::traits::{Query, Rcode, Response, Transport, TsigKey, UpdateMessage};
use equipzone_core::{DirectoryService, MemoryTransport};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ZONE: &str = "example.com.";
pub const SERVER: &str = "ns1.example.com";
pub const KEY_NAME: &str = "update-key";
pub const KEY_SECRET: &str = "c2VjcmV0";

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn forward_zones() -> Vec<String> {
    vec![ZONE.to_string()]
}

pub fn reverse_zones() -> Vec<String> {
    vec![
        "168.192.in-addr.arpa.".to_string(),
        "10.in-addr.arpa.".to_string(),
    ]
}

/// Forward zone content, with the alias deliberately ahead of its target
pub fn forward_records() -> Vec<Record> {
    vec![
        Record::new(ZONE, 3600, RecordData::Unsupported { rtype: 6 }),
        Record::alias("alt.example.com.", "host.example.com."),
        Record::address("host.example.com.", ip("192.168.1.5")),
        Record::new(
            "host.example.com.",
            3600,
            RecordData::Text(vec!["Wellington Harbour".to_string()]),
        ),
        Record::new(
            "host.example.com.",
            3600,
            RecordData::Classification {
                model: "NetR9".to_string(),
                code: "WGTN".to_string(),
            },
        ),
        Record::new(
            "host.example.com.",
            3600,
            RecordData::Location(Loc::from_position(Position::new(
                -41.290438888888886,
                174.7815961111111,
                21.0,
            ))),
        ),
        Record::address("gauge.example.com.", ip("10.1.0.7")),
    ]
}

pub fn private_records() -> Vec<Record> {
    vec![
        Record::pointer("5.1.168.192.in-addr.arpa.", "host.example.com."),
        Record::pointer("9.1.168.192.in-addr.arpa.", "alt.example.com."),
    ]
}

pub fn ten_records() -> Vec<Record> {
    vec![
        Record::pointer("7.0.1.10.in-addr.arpa.", "gauge.example.com."),
        Record::pointer("8.0.1.10.in-addr.arpa.", "host.example.com."),
    ]
}

/// Transport serving the fixture zones and accepting the fixture key
pub async fn seeded_transport() -> MemoryTransport {
    let transport = MemoryTransport::new();
    transport.add_host(SERVER, ip("192.0.2.53")).await;
    transport.add_key(KEY_NAME, KEY_SECRET).await;
    transport.add_zone(ZONE, forward_records()).await;
    transport.add_zone("168.192.in-addr.arpa.", private_records()).await;
    transport.add_zone("10.in-addr.arpa.", ten_records()).await;
    transport
}

/// Directory signing with the fixture key
pub fn directory(transport: &MemoryTransport) -> DirectoryService {
    DirectoryService::new(SERVER, Box::new(transport.clone()))
        .with_key(TsigKey::new(KEY_NAME, KEY_SECRET))
}

/// A transport answering every signed update with a fixed rcode
///
/// Lookups and transfers return nothing.
#[derive(Clone)]
pub struct ScriptedTransport {
    rcode: Rcode,
    /// Call counter for authenticated_exchange()
    update_call_count: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(rcode: Rcode) -> Self {
        Self {
            rcode,
            update_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times authenticated_exchange() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>> {
        Ok(vec![ip("192.0.2.53")])
    }

    async fn transfer_zone(&self, _server: SocketAddr, _zone: &str) -> Result<Vec<Record>> {
        Ok(Vec::new())
    }

    async fn exchange(&self, _server: SocketAddr, _query: &Query) -> Result<Response> {
        Ok(Response::new(Rcode::NxDomain))
    }

    async fn authenticated_exchange(
        &self,
        _server: SocketAddr,
        _message: &UpdateMessage,
        _key: &TsigKey,
    ) -> Result<Response> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(Response::new(self.rcode))
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

/// A transport whose every call fails at the network level
pub struct UnreachableTransport;

#[async_trait::async_trait]
impl Transport for UnreachableTransport {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>> {
        Err(Error::transport(format!("cannot resolve {}", host)))
    }

    async fn transfer_zone(&self, _server: SocketAddr, _zone: &str) -> Result<Vec<Record>> {
        Err(Error::transport("connection reset"))
    }

    async fn exchange(&self, _server: SocketAddr, _query: &Query) -> Result<Response> {
        Err(Error::transport("connection reset"))
    }

    async fn authenticated_exchange(
        &self,
        _server: SocketAddr,
        _message: &UpdateMessage,
        _key: &TsigKey,
    ) -> Result<Response> {
        Err(Error::transport("connection reset"))
    }

    fn transport_name(&self) -> &'static str {
        "unreachable"
    }
}
