//! Resource record model
//!
//! Records exchanged with the directory are a closed set of kinds. Anything
//! a zone transfer yields outside that set (SOA, NS, SRV, ...) is carried as
//! [`RecordData::Unsupported`] so consumers must reject it explicitly.
//!
//! - [`reverse`]: address <-> reverse-pointer name arithmetic
//! - [`projector`]: Device <-> record set mapping

pub mod projector;
pub mod reverse;

pub use projector::RecordProjector;
pub use reverse::{address_from_reverse, reverse_name};

use crate::geo::Loc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Default EDNS payload size advertised by the extension record
pub const DEFAULT_UDP_PAYLOAD_SIZE: u16 = 4096;

/// Record kinds understood by equipzone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Ptr,
    Cname,
    Txt,
    Hinfo,
    Loc,
    Opt,
    /// Every type at a name (only meaningful for removals and queries)
    Any,
}

impl RecordType {
    /// Wire type code
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Cname => 5,
            RecordType::Hinfo => 13,
            RecordType::Ptr => 12,
            RecordType::Txt => 16,
            RecordType::Aaaa => 28,
            RecordType::Loc => 29,
            RecordType::Opt => 41,
            RecordType::Any => 255,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Ptr => "PTR",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Hinfo => "HINFO",
            RecordType::Loc => "LOC",
            RecordType::Opt => "OPT",
            RecordType::Any => "ANY",
        };
        f.write_str(s)
    }
}

/// Typed record payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RecordData {
    /// A or AAAA
    Address(IpAddr),
    /// PTR target
    Pointer(String),
    /// CNAME target
    Alias(String),
    /// TXT character-strings
    Text(Vec<String>),
    /// HINFO, with the model in the cpu field and the code in the os field
    Classification { model: String, code: String },
    /// LOC
    Location(Loc),
    /// OPT, advertising a larger message size; carries no data
    Extension { udp_payload_size: u16 },
    /// Any other type code seen in a transfer
    Unsupported { rtype: u16 },
}

impl RecordData {
    /// Record type of this payload, `None` for unsupported codes
    pub fn record_type(&self) -> Option<RecordType> {
        match self {
            RecordData::Address(IpAddr::V4(_)) => Some(RecordType::A),
            RecordData::Address(IpAddr::V6(_)) => Some(RecordType::Aaaa),
            RecordData::Pointer(_) => Some(RecordType::Ptr),
            RecordData::Alias(_) => Some(RecordType::Cname),
            RecordData::Text(_) => Some(RecordType::Txt),
            RecordData::Classification { .. } => Some(RecordType::Hinfo),
            RecordData::Location(_) => Some(RecordType::Loc),
            RecordData::Extension { .. } => Some(RecordType::Opt),
            RecordData::Unsupported { .. } => None,
        }
    }
}

/// A named, typed unit of published data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Owner name
    pub name: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Payload
    pub data: RecordData,
}

impl Record {
    pub fn new(name: impl AsRef<str>, ttl: u32, data: RecordData) -> Self {
        Self {
            name: fqdn(name.as_ref()),
            ttl,
            data,
        }
    }

    pub fn address(name: impl AsRef<str>, ip: IpAddr) -> Self {
        Self::new(name, 0, RecordData::Address(ip))
    }

    pub fn pointer(name: impl AsRef<str>, target: impl AsRef<str>) -> Self {
        Self::new(name, 0, RecordData::Pointer(fqdn(target.as_ref())))
    }

    pub fn alias(name: impl AsRef<str>, target: impl AsRef<str>) -> Self {
        Self::new(name, 0, RecordData::Alias(fqdn(target.as_ref())))
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn record_type(&self) -> Option<RecordType> {
        self.data.record_type()
    }
}

/// Make a name absolute by appending the root label if missing
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Case-insensitive comparison of domain names, ignoring a trailing root label
pub fn names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Lookup key for a domain name
pub(crate) fn name_key(name: &str) -> String {
    fqdn(name).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqdn_and_name_equality() {
        assert_eq!(fqdn("host.example.com"), "host.example.com.");
        assert_eq!(fqdn("host.example.com."), "host.example.com.");
        assert!(names_equal("HOST.example.com", "host.Example.COM."));
        assert!(!names_equal("host.example.com", "other.example.com"));
        assert_eq!(name_key("Host.Example.com"), "host.example.com.");
    }

    #[test]
    fn test_record_types() {
        let a = Record::address("host.example.com", "192.0.2.1".parse().unwrap());
        assert_eq!(a.name, "host.example.com.");
        assert_eq!(a.record_type(), Some(RecordType::A));

        let aaaa = Record::address("host.example.com", "2001:db8::1".parse().unwrap());
        assert_eq!(aaaa.record_type(), Some(RecordType::Aaaa));

        let soa = Record::new("example.com.", 3600, RecordData::Unsupported { rtype: 6 });
        assert_eq!(soa.record_type(), None);
        assert_eq!(RecordType::Loc.code(), 29);
        assert_eq!(RecordType::Cname.to_string(), "CNAME");
    }
}
