//! Directory service
//!
//! Owns the server/port of the authoritative name service and executes
//! every exchange with it through a [`Transport`]:
//!
//! - zone transfers and plain lookups (unsigned)
//! - insert, remove-record, remove-rrset and remove-name updates (signed, one
//!   transaction each)
//!
//! ## Failure Mapping
//!
//! | Outcome                              | Error                 |
//! |--------------------------------------|-----------------------|
//! | resolution/network failure           | `Error::Transport`    |
//! | no signing key, NOTAUTH/BADSIG/...   | `Error::Auth`         |
//! | any other non-success rcode          | `Error::Protocol`     |
//! | transfer aborted                     | `Error::Transfer`     |
//!
//! Nothing here retries. Retry policy belongs to the caller.

use crate::config::{DEFAULT_DIRECTORY_PORT, DirectoryConfig};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::record::{Record, RecordData, RecordProjector, RecordType, reverse_name};
use crate::traits::{Query, Rcode, Transport, TsigKey, UpdateMessage};
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, info};

/// Authenticated access to the directory server
pub struct DirectoryService {
    /// Server host, optionally with `:port`
    server: String,

    /// Port used when the server carries none
    port: u16,

    /// Key for signed updates
    key: Option<TsigKey>,

    /// Name-service stack
    transport: Box<dyn Transport>,

    projector: RecordProjector,
}

impl std::fmt::Debug for DirectoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryService")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("key", &self.key)
            .field("transport", &self.transport.transport_name())
            .finish()
    }
}

impl DirectoryService {
    /// Create a service for `server` using the default port
    pub fn new(server: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            server: server.into(),
            port: DEFAULT_DIRECTORY_PORT,
            key: None,
            transport,
            projector: RecordProjector::default(),
        }
    }

    /// Create a service from configuration
    pub fn from_config(config: &DirectoryConfig, transport: Box<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let mut service = Self::new(config.server.clone(), transport).with_port(config.port_or_default());
        if let Some(key) = &config.key {
            service = service.with_key(key.to_key());
        }
        Ok(service)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_key(mut self, key: TsigKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Resolve the configured server to a concrete endpoint
    ///
    /// A port embedded in the server string wins over the configured port.
    /// Host names are resolved through the transport and the first address used.
    pub async fn server_port(&self) -> Result<SocketAddr> {
        let server = self.server.trim();

        if let Ok(addr) = server.parse::<SocketAddr>() {
            return Ok(addr);
        }
        if let Ok(ip) = server.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        let (host, port) = match server.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| Error::transport(format!("invalid port in server {}", server)))?;
                (host, port)
            }
            None => (server, self.port),
        };

        let addresses = self.transport.resolve(host).await?;
        let ip = addresses
            .first()
            .copied()
            .ok_or_else(|| Error::not_found(format!("no addresses for host {}", host)))?;

        Ok(SocketAddr::new(ip, port))
    }

    /// Transfer every record of a zone
    pub async fn transfer(&self, zone: &str) -> Result<Vec<Record>> {
        let server = self.server_port().await?;

        let records = self
            .transport
            .transfer_zone(server, zone)
            .await
            .map_err(|e| match e {
                Error::Transfer { .. } => e,
                other => Error::transfer(zone, other.to_string()),
            })?;

        debug!("Transferred {} records from {} ({})", records.len(), zone, server);
        Ok(records)
    }

    /// Look up records of one type at a name
    ///
    /// A name that does not exist yields no answers rather than an error.
    pub async fn lookup(&self, name: &str, rtype: RecordType) -> Result<Vec<Record>> {
        let server = self.server_port().await?;
        let response = self.transport.exchange(server, &Query::new(name, rtype)).await?;

        match response.rcode {
            Rcode::NoError => Ok(response.answers),
            Rcode::NxDomain => Ok(Vec::new()),
            rcode => Err(Error::protocol(name, format!("lookup {}", rtype), rcode)),
        }
    }

    /// Rebuild a single device from individual lookups
    ///
    /// Returns `Ok(None)` when the name has no address record. Descriptive
    /// lookups are best-effort.
    pub async fn find(&self, name: &str) -> Result<Option<Device>> {
        let mut records = self.lookup(name, RecordType::A).await?;
        if records.is_empty() {
            return Ok(None);
        }

        for rtype in [RecordType::Txt, RecordType::Hinfo, RecordType::Loc] {
            match self.lookup(name, rtype).await {
                Ok(answers) => records.extend(answers),
                Err(e) => debug!("Ignoring failed {} lookup for {}: {}", rtype, name, e),
            }
        }

        Ok(self.projector.decode(&records))
    }

    /// Find the device an address reverse-resolves to
    pub async fn find_by_address(&self, ip: IpAddr) -> Result<Option<Device>> {
        let answers = self.lookup(&reverse_name(ip), RecordType::Ptr).await?;

        let target = answers.into_iter().find_map(|r| match r.data {
            RecordData::Pointer(target) => Some(target),
            _ => None,
        });

        match target {
            Some(target) => self.find(&target).await,
            None => Ok(None),
        }
    }

    /// Insert a record set
    pub async fn insert(&self, zone: &str, records: Vec<Record>) -> Result<()> {
        self.execute(UpdateMessage::new(zone).insert(records)).await
    }

    /// Remove exactly the given records, leaving the rest of their RRsets
    pub async fn remove(&self, zone: &str, records: Vec<Record>) -> Result<()> {
        self.execute(UpdateMessage::new(zone).remove_records(records)).await
    }

    /// Remove the RRsets the given records belong to
    pub async fn remove_rrset(&self, zone: &str, records: Vec<Record>) -> Result<()> {
        self.execute(UpdateMessage::new(zone).remove_rrset(records)).await
    }

    /// Remove every record at a name
    pub async fn remove_name(&self, zone: &str, name: &str) -> Result<()> {
        self.execute(UpdateMessage::new(zone).remove_name(name)).await
    }

    /// Publish a device's descriptive records
    pub async fn update_info(&self, zone: &str, device: &Device) -> Result<()> {
        self.insert(zone, self.projector.project(device)).await
    }

    /// Remove a device's descriptive records, usually prior to an update
    pub async fn remove_info(&self, zone: &str, device: &Device) -> Result<()> {
        self.remove_rrset(zone, self.projector.project(device)).await
    }

    /// Remove everything published at a device's name
    pub async fn remove_all(&self, zone: &str, device: &Device) -> Result<()> {
        self.remove_name(zone, &device.name).await
    }

    /// Sign and send one update transaction
    async fn execute(&self, message: UpdateMessage) -> Result<()> {
        let operation = message.describe();

        let key = self
            .key
            .as_ref()
            .ok_or_else(|| Error::auth(&message.zone, operation, "no signing key configured"))?;

        let server = self.server_port().await?;
        let response = self
            .transport
            .authenticated_exchange(server, &message, key)
            .await?;

        if response.rcode.is_auth_failure() {
            return Err(Error::auth(&message.zone, operation, response.rcode.to_string()));
        }
        if !response.rcode.is_success() {
            return Err(Error::protocol(&message.zone, operation, response.rcode));
        }

        info!(
            "Applied {} ({} ops) to {}",
            operation,
            message.operations.len(),
            message.zone
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    fn service(transport: &MemoryTransport, server: &str) -> DirectoryService {
        DirectoryService::new(server, Box::new(transport.clone()))
    }

    #[tokio::test]
    async fn test_server_port_forms() {
        let transport = MemoryTransport::new();
        transport
            .add_host("ns1.example.com", "192.0.2.53".parse().unwrap())
            .await;

        let addr = service(&transport, "ns1.example.com").server_port().await.unwrap();
        assert_eq!(addr, "192.0.2.53:53".parse().unwrap());

        let addr = service(&transport, "ns1.example.com:5353").server_port().await.unwrap();
        assert_eq!(addr, "192.0.2.53:5353".parse().unwrap());

        let addr = service(&transport, "ns1.example.com")
            .with_port(8053)
            .server_port()
            .await
            .unwrap();
        assert_eq!(addr.port(), 8053);

        let addr = service(&transport, "198.51.100.1").server_port().await.unwrap();
        assert_eq!(addr, "198.51.100.1:53".parse().unwrap());

        let addr = service(&transport, "[2001:db8::53]:54").server_port().await.unwrap();
        assert_eq!(addr, "[2001:db8::53]:54".parse().unwrap());
    }

    #[tokio::test]
    async fn test_unknown_host_fails_resolution() {
        let transport = MemoryTransport::new();
        let err = service(&transport, "nowhere.example.com")
            .server_port()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = service(&transport, "ns1.example.com:notaport")
            .server_port()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_update_without_key_is_auth_error() {
        let transport = MemoryTransport::new();
        let directory = service(&transport, "192.0.2.53");

        let err = directory
            .remove_name("example.com.", "host.example.com.")
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert!(transport.journal().await.is_empty());
    }
}
