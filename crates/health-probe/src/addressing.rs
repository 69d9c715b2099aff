//! Address enumeration for a single node.

use crate::types::{Address, Node};
use std::net::IpAddr;

/// Which address slot of a node an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSlot {
    PrimaryV4,
    PrimaryV6,
    Secondary(usize),
}

/// Address family, decided by looking at the string alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

/// One address of a node together with where it sits.
#[derive(Debug, Clone, Copy)]
pub struct IndexedAddress<'a> {
    pub slot: AddressSlot,
    pub address: &'a Address,
    /// Primary slots report their own enabled flag; secondaries are never primary.
    pub primary: bool,
}

impl IndexedAddress<'_> {
    pub fn ip(&self) -> &str {
        &self.address.ip
    }

    pub fn is_probeable(&self) -> bool {
        is_probeable(self.address)
    }
}

/// Enumerate every address slot of `node`.
///
/// Nothing is filtered here: disabled and malformed entries are returned too
/// and callers apply [`is_probeable`] themselves.
pub fn addresses_of(node: &Node) -> Vec<IndexedAddress<'_>> {
    let mut addresses = Vec::with_capacity(2 + node.secondary_addresses.len());

    if let Some(v4) = &node.primary_ipv4 {
        addresses.push(IndexedAddress {
            slot: AddressSlot::PrimaryV4,
            address: v4,
            primary: v4.enabled,
        });
    }
    if let Some(v6) = &node.primary_ipv6 {
        addresses.push(IndexedAddress {
            slot: AddressSlot::PrimaryV6,
            address: v6,
            primary: v6.enabled,
        });
    }
    for (idx, address) in node.secondary_addresses.iter().enumerate() {
        addresses.push(IndexedAddress {
            slot: AddressSlot::Secondary(idx),
            address,
            primary: false,
        });
    }

    addresses
}

/// Whether an address should be handed to resolution and probing.
///
/// Malformed strings still pass: they fail resolution and get recorded as such.
pub fn is_probeable(address: &Address) -> bool {
    let ip = address.ip.trim();
    address.enabled && !ip.is_empty() && ip != "<nil>"
}

/// Classify an address string. Anything containing a colon is treated as IPv6.
pub fn family_of(ip: &str) -> IpFamily {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => IpFamily::V4,
        Ok(IpAddr::V6(_)) => IpFamily::V6,
        Err(_) if ip.contains(':') => IpFamily::V6,
        Err(_) => IpFamily::V4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> Node {
        Node::new("node-a")
            .with_ipv4(Address::new("10.0.0.1"))
            .with_ipv6(Address::disabled("fd00::1"))
            .with_secondary(Address::new("10.1.0.1"))
            .with_secondary(Address::disabled("10.2.0.1"))
    }

    #[test]
    fn test_addresses_of_tags_primary_by_enabled_flag() {
        let node = sample_node();
        let addresses = addresses_of(&node);
        assert_eq!(addresses.len(), 4);

        assert_eq!(addresses[0].slot, AddressSlot::PrimaryV4);
        assert!(addresses[0].primary);
        assert_eq!(addresses[1].slot, AddressSlot::PrimaryV6);
        assert!(!addresses[1].primary);
        assert_eq!(addresses[2].slot, AddressSlot::Secondary(0));
        assert!(!addresses[2].primary);
        assert_eq!(addresses[3].slot, AddressSlot::Secondary(1));
        assert!(!addresses[3].primary);
    }

    #[test]
    fn test_addresses_of_keeps_disabled_entries() {
        let node = sample_node();
        let probeable: Vec<_> = addresses_of(&node)
            .into_iter()
            .filter(|a| a.is_probeable())
            .map(|a| a.ip().to_string())
            .collect();
        assert_eq!(probeable, vec!["10.0.0.1", "10.1.0.1"]);
    }

    #[test]
    fn test_missing_primaries_are_skipped() {
        let node = Node::new("bare").with_secondary(Address::new("10.9.0.1"));
        let addresses = addresses_of(&node);
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].slot, AddressSlot::Secondary(0));
    }

    #[test]
    fn test_is_probeable_rejects_placeholders() {
        assert!(is_probeable(&Address::new("1.1.1.1")));
        assert!(is_probeable(&Address::new("not-an-ip")));
        assert!(!is_probeable(&Address::new("")));
        assert!(!is_probeable(&Address::new("<nil>")));
        assert!(!is_probeable(&Address::disabled("1.1.1.1")));
    }

    #[test]
    fn test_family_of() {
        assert_eq!(family_of("192.168.0.1"), IpFamily::V4);
        assert_eq!(family_of("::1"), IpFamily::V6);
        assert_eq!(family_of("fe80::1%eth0"), IpFamily::V6);
        assert_eq!(family_of("garbage"), IpFamily::V4);
    }
}
