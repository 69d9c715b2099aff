//! Current cluster membership.
//!
//! A [`Registry`] is built once per membership update and never mutated after
//! it is published; updates replace it wholesale.

use crate::types::Node;
use std::collections::HashMap;
use std::net::IpAddr;

/// A node that owns a given network address, as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressOwner {
    /// Index into [`Registry::nodes`]
    pub node: usize,
    /// Address string exactly as the membership source wrote it
    pub ip: String,
}

/// Membership view: node list plus an index from resolved address to owners.
///
/// The index is keyed by whatever the resolver returned for each address
/// string, so replies reported for that address find their owners even when
/// the string itself is not a plain literal (`fe80::1%eth0`, stray spaces).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    nodes: Vec<Node>,
    owners: HashMap<IpAddr, Vec<AddressOwner>>,
}

impl Registry {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            owners: HashMap::new(),
        }
    }

    /// Record that node `node` reaches `addr` through the address string `ip`.
    pub fn add_owner(&mut self, addr: IpAddr, node: usize, ip: &str) {
        let owner = AddressOwner {
            node,
            ip: ip.to_string(),
        };
        let list = self.owners.entry(addr).or_default();
        if !list.contains(&owner) {
            list.push(owner);
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    /// Every (node, address string) pair currently claiming `addr`.
    pub fn owners_of(&self, addr: &IpAddr) -> &[AddressOwner] {
        self.owners.get(addr).map_or(&[], Vec::as_slice)
    }
}
