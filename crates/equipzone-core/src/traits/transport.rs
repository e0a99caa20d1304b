// # Transport Trait
//
// Defines the interface to the name-service stack: host resolution, zone
// transfer, plain query exchange and signed update exchange.
//
// ## Implementations
//
// - In-memory: `equipzone_core::transport::MemoryTransport`
// - Network stacks plug in through `TransportFactory` and the `Registry`
//
// ## Usage
//
// ```rust,ignore
// use equipzone_core::Transport;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let transport = /* Transport implementation */;
//
//     let server = transport.resolve("ns1.example.com").await?[0];
//     let records = transport
//         .transfer_zone((server, 53).into(), "example.com.")
//         .await?;
//
//     Ok(())
// }
// ```

use crate::record::{Record, RecordType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Default allowed clock skew for signed messages, in seconds
pub const DEFAULT_FUDGE_SECS: u16 = 300;

/// Response codes, including the signature errors of RFC 8945
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rcode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    YxDomain,
    YxRrset,
    NxRrset,
    NotAuth,
    NotZone,
    BadSig,
    BadKey,
    BadTime,
    Other(u16),
}

impl Rcode {
    pub fn is_success(self) -> bool {
        self == Rcode::NoError
    }

    /// The server rejected the signature or key
    pub fn is_auth_failure(self) -> bool {
        matches!(
            self,
            Rcode::NotAuth | Rcode::BadSig | Rcode::BadKey | Rcode::BadTime
        )
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rcode::NoError => f.write_str("NOERROR"),
            Rcode::FormErr => f.write_str("FORMERR"),
            Rcode::ServFail => f.write_str("SERVFAIL"),
            Rcode::NxDomain => f.write_str("NXDOMAIN"),
            Rcode::NotImp => f.write_str("NOTIMP"),
            Rcode::Refused => f.write_str("REFUSED"),
            Rcode::YxDomain => f.write_str("YXDOMAIN"),
            Rcode::YxRrset => f.write_str("YXRRSET"),
            Rcode::NxRrset => f.write_str("NXRRSET"),
            Rcode::NotAuth => f.write_str("NOTAUTH"),
            Rcode::NotZone => f.write_str("NOTZONE"),
            Rcode::BadSig => f.write_str("BADSIG"),
            Rcode::BadKey => f.write_str("BADKEY"),
            Rcode::BadTime => f.write_str("BADTIME"),
            Rcode::Other(code) => write!(f, "RCODE{}", code),
        }
    }
}

/// A single-question query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub name: String,
    pub rtype: RecordType,
    pub recursion_desired: bool,
}

impl Query {
    pub fn new(name: impl AsRef<str>, rtype: RecordType) -> Self {
        Self {
            name: crate::record::fqdn(name.as_ref()),
            rtype,
            recursion_desired: true,
        }
    }
}

/// Response to a query or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub rcode: Rcode,
    pub answers: Vec<Record>,
}

impl Response {
    pub fn new(rcode: Rcode) -> Self {
        Self {
            rcode,
            answers: Vec::new(),
        }
    }

    pub fn with_answers(mut self, answers: Vec<Record>) -> Self {
        self.answers = answers;
        self
    }
}

/// One operation of an update message (RFC 2136 §2.5)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOp {
    /// Add records to an RRset
    Insert(Record),
    /// Delete an RRset
    RemoveRrset { name: String, rtype: RecordType },
    /// Delete one record from an RRset, matched on name, type and data
    RemoveRecord(Record),
    /// Delete all RRsets at a name
    RemoveName { name: String },
}

impl UpdateOp {
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateOp::Insert(_) => "insert",
            UpdateOp::RemoveRrset { .. } => "remove-rrset",
            UpdateOp::RemoveRecord(_) => "remove-record",
            UpdateOp::RemoveName { .. } => "remove-name",
        }
    }
}

/// An update message addressed to one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMessage {
    pub zone: String,
    pub operations: Vec<UpdateOp>,
}

impl UpdateMessage {
    pub fn new(zone: impl AsRef<str>) -> Self {
        Self {
            zone: crate::record::fqdn(zone.as_ref()),
            operations: Vec::new(),
        }
    }

    pub fn insert(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.operations
            .extend(records.into_iter().map(UpdateOp::Insert));
        self
    }

    pub fn remove_rrset(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.operations.extend(records.into_iter().filter_map(|r| {
            r.record_type().map(|rtype| UpdateOp::RemoveRrset {
                name: r.name,
                rtype,
            })
        }));
        self
    }

    pub fn remove_records(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.operations
            .extend(records.into_iter().map(UpdateOp::RemoveRecord));
        self
    }

    pub fn remove_name(mut self, name: impl AsRef<str>) -> Self {
        self.operations.push(UpdateOp::RemoveName {
            name: crate::record::fqdn(name.as_ref()),
        });
        self
    }

    /// Operation label used in logs and errors
    pub fn describe(&self) -> &'static str {
        self.operations.first().map(UpdateOp::kind).unwrap_or("empty")
    }
}

/// Message authentication algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TsigAlgorithm {
    #[default]
    #[serde(rename = "hmac-md5")]
    HmacMd5,
    #[serde(rename = "hmac-sha1")]
    HmacSha1,
    #[serde(rename = "hmac-sha256")]
    HmacSha256,
}

impl TsigAlgorithm {
    /// Algorithm name as carried on the wire
    pub fn name(self) -> &'static str {
        match self {
            TsigAlgorithm::HmacMd5 => "hmac-md5.sig-alg.reg.int.",
            TsigAlgorithm::HmacSha1 => "hmac-sha1.",
            TsigAlgorithm::HmacSha256 => "hmac-sha256.",
        }
    }
}

/// Signing key for authenticated updates
///
/// The Debug implementation does NOT expose the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct TsigKey {
    pub name: String,
    pub secret: String,
    pub algorithm: TsigAlgorithm,
    pub fudge: u16,
}

impl TsigKey {
    pub fn new(name: impl AsRef<str>, secret: impl Into<String>) -> Self {
        Self {
            name: crate::record::fqdn(name.as_ref()),
            secret: secret.into(),
            algorithm: TsigAlgorithm::default(),
            fudge: DEFAULT_FUDGE_SECS,
        }
    }

    pub fn with_algorithm(mut self, algorithm: TsigAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

impl fmt::Debug for TsigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TsigKey")
            .field("name", &self.name)
            .field("secret", &"<REDACTED>")
            .field("algorithm", &self.algorithm)
            .field("fudge", &self.fudge)
            .finish()
    }
}

/// Trait for name-service transport implementations
///
/// Every method is one complete request/response exchange. Implementations
/// must be thread-safe and usable across async tasks.
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (retry is a caller concern)
/// - ❌ Return a partial zone: a transfer either delivers every record or fails
/// - ❌ Interpret record content (owned by the builder and reconciler)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolve a host name to its addresses
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<IpAddr>)`: At least one address
    /// - `Err(Error::NotFound)`: The host has no addresses
    /// - `Err(Error::Transport)`: Resolution failed
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, crate::Error>;

    /// Transfer every record of a zone
    ///
    /// Must deliver the complete zone before returning; an error part way
    /// through makes whatever was received unusable.
    async fn transfer_zone(
        &self,
        server: SocketAddr,
        zone: &str,
    ) -> Result<Vec<Record>, crate::Error>;

    /// Exchange a plain query
    async fn exchange(&self, server: SocketAddr, query: &Query) -> Result<Response, crate::Error>;

    /// Sign and exchange an update message
    ///
    /// # Returns
    ///
    /// - `Ok(Response)`: The server's answer, whatever its rcode
    /// - `Err(Error::Auth)`: Signing failed or the response signature did not verify
    /// - `Err(Error::Transport)`: Network failure
    async fn authenticated_exchange(
        &self,
        server: SocketAddr,
        message: &UpdateMessage,
        key: &TsigKey,
    ) -> Result<Response, crate::Error>;

    /// Get the transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}

/// Helper trait for constructing transports from configuration
pub trait TransportFactory: Send + Sync {
    fn create(
        &self,
        config: &crate::config::DirectoryConfig,
    ) -> Result<Box<dyn Transport>, crate::Error>;
}
