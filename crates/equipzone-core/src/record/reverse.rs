// # Reverse names
//
// Address arithmetic for reverse-pointer owner names:
//
//   192.168.1.5   <->  5.1.168.192.in-addr.arpa.
//   2001:db8::1   <->  1.0.0.0. ... .8.b.d.0.1.0.0.2.ip6.arpa.
//
// A PTR seen in a transfer of `168.192.in-addr.arpa.` is named relative to
// that zone; the address is recovered by re-rooting the zone-relative labels
// under the zone's own octets and reversing the whole label sequence.

use super::name_key;
use crate::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const IN_ADDR_ARPA: &str = "in-addr.arpa.";
const IP6_ARPA: &str = "ip6.arpa.";

/// Reverse-pointer owner name for an address
pub fn reverse_name(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{}.{}.{}.{}.{}", d, c, b, a, IN_ADDR_ARPA)
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(72);
            for byte in v6.octets().iter().rev() {
                name.push_str(&format!("{:x}.{:x}.", byte & 0x0f, byte >> 4));
            }
            name.push_str(IP6_ARPA);
            name
        }
    }
}

/// Decimal octet label in canonical form: no sign, no leading zeros
fn octet(label: &str) -> Option<u8> {
    let canonical = !label.is_empty()
        && label.bytes().all(|b| b.is_ascii_digit())
        && (label == "0" || !label.starts_with('0'));
    if canonical { label.parse().ok() } else { None }
}

/// Recover the address named by a reverse-pointer owner name within `zone`
///
/// Fails with [`Error::Correlation`] when the name is outside the zone or
/// does not spell a complete address.
pub fn address_from_reverse(name: &str, zone: &str) -> Result<IpAddr> {
    let name = name_key(name);
    let zone = name_key(zone);

    if !(name == zone || name.ends_with(&format!(".{}", zone)) || zone == ".") {
        return Err(Error::correlation(format!(
            "reverse name {} is outside zone {}",
            name, zone
        )));
    }

    if let Some(labels) = name.strip_suffix(IN_ADDR_ARPA) {
        let mut octets = labels
            .trim_end_matches('.')
            .split('.')
            .map(octet)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::correlation(format!("malformed reverse name {}", name)))?;
        if octets.len() != 4 {
            return Err(Error::correlation(format!(
                "reverse name {} does not name a single address",
                name
            )));
        }
        octets.reverse();
        return Ok(IpAddr::V4(Ipv4Addr::new(
            octets[0], octets[1], octets[2], octets[3],
        )));
    }

    if let Some(labels) = name.strip_suffix(IP6_ARPA) {
        let nibbles = labels
            .trim_end_matches('.')
            .split('.')
            .map(|label| match label.len() {
                1 => u8::from_str_radix(label, 16).ok(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::correlation(format!("malformed reverse name {}", name)))?;
        if nibbles.len() != 32 {
            return Err(Error::correlation(format!(
                "reverse name {} does not name a single address",
                name
            )));
        }
        let mut octets = [0u8; 16];
        for (i, pair) in nibbles.rchunks(2).enumerate() {
            octets[i] = (pair[1] << 4) | pair[0];
        }
        return Ok(IpAddr::V6(Ipv6Addr::from(octets)));
    }

    Err(Error::correlation(format!(
        "{} is not a reverse-pointer name",
        name
    )))
}
