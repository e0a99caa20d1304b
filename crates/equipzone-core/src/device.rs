//! Equipment records reconstructed from the directory
//!
//! Each device has a single address record naming its definitive name and
//! primary address. Aliases come from CNAME records, reverse addresses from
//! PTR records pointing at the device, and secondary mappings from PTR
//! records pointing at one of its aliases. Place (TXT), model and code
//! (HINFO) and position (LOC) complete the picture.

use crate::geo::{self, Position};
use crate::record::names_equal;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// One piece of equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Fully-qualified name (A)
    pub name: String,
    /// Primary address (A/AAAA)
    pub ip: IpAddr,
    /// Addresses resolving back to this device (PTR)
    #[serde(default, deserialize_with = "nullable")]
    pub reverse: Vec<IpAddr>,
    /// Other names whose reverse lookup lands on an alias of this device (PTR/CNAME)
    #[serde(default, deserialize_with = "nullable")]
    pub mapping: BTreeMap<String, IpAddr>,
    /// Alternate names (CNAME)
    #[serde(default, deserialize_with = "nullable")]
    pub aliases: Vec<String>,
    /// Place description (TXT)
    #[serde(default)]
    pub place: String,
    /// Equipment model (HINFO cpu)
    #[serde(default)]
    pub model: String,
    /// Site or instrument code (HINFO os)
    #[serde(default)]
    pub code: String,
    /// Degrees north (LOC)
    #[serde(default)]
    pub latitude: f64,
    /// Degrees east (LOC)
    #[serde(default)]
    pub longitude: f64,
    /// Metres above the spheroid (LOC)
    #[serde(default)]
    pub height: f64,
}

/// Treat an explicit JSON `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Device {
    pub fn new(name: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            name: name.into(),
            ip,
            reverse: Vec::new(),
            mapping: BTreeMap::new(),
            aliases: Vec::new(),
            place: String::new(),
            model: String::new(),
            code: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            height: 0.0,
        }
    }

    /// First label of the name
    pub fn hostname(&self) -> &str {
        self.name
            .split('.')
            .find(|label| !label.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude, self.height)
    }

    /// Encoded LOC values `(lat, lon, alt)`
    pub fn location(&self) -> (u32, u32, u32) {
        geo::encode(self.position())
    }

    /// Set the position from encoded LOC values
    pub fn set_location(&mut self, lat: u32, lon: u32, alt: u32) {
        let position = geo::decode(lat, lon, alt);
        self.latitude = position.latitude;
        self.longitude = position.longitude;
        self.height = position.height;
    }

    pub fn has_name(&self, name: &str) -> bool {
        names_equal(&self.name, name)
    }

    /// Primary or any reverse address matches
    pub fn has_address(&self, ip: IpAddr) -> bool {
        self.ip == ip || self.has_reverse(ip)
    }

    /// Primary or any reverse address lies within the network
    pub fn in_network(&self, network: &IpNetwork) -> bool {
        network.contains(self.ip) || self.reverse.iter().any(|a| network.contains(*a))
    }

    pub fn at_place(&self, place: &str) -> bool {
        self.place.eq_ignore_ascii_case(place)
    }

    pub fn at_location(&self, lat: u32, lon: u32, alt: u32) -> bool {
        self.location() == (lat, lon, alt)
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code)
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.model == model
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| names_equal(a, alias))
    }

    pub fn has_reverse(&self, ip: IpAddr) -> bool {
        self.reverse.contains(&ip)
    }

    /// Any secondary mapping resolves to the address
    pub fn has_ip(&self, ip: IpAddr) -> bool {
        self.mapping.values().any(|a| *a == ip)
    }

    pub fn has_mapping(&self, name: &str, ip: IpAddr) -> bool {
        self.mapping
            .iter()
            .any(|(n, a)| names_equal(n, name) && *a == ip)
    }

    /// Whether publishing `other` over `self` would change nothing observable:
    /// same name, `other`'s primary address known here, same code and model,
    /// and the same encoded location.
    pub fn is_equivalent(&self, other: &Device) -> bool {
        let (lat, lon, alt) = other.location();

        self.has_name(&other.name)
            && self.has_address(other.ip)
            && self.has_code(&other.code)
            && self.has_model(&other.model)
            && self.at_location(lat, lon, alt)
    }
}
