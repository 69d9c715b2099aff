//! Latest path status per probed address.
//!
//! Entries are created the first time an address is dispatched and are never
//! removed, so addresses of nodes that left the cluster linger here. Nothing
//! reads them once their node is gone, but the memory is not reclaimed.

use crate::config::AddressSharing;
use crate::types::{ConnectivityStatus, PathKind, PathStatus};
use std::collections::HashMap;

/// Key of a result entry.
///
/// With [`AddressSharing::Shared`] the owner is `None` and every slot carrying
/// the same address string shares one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResultKey {
    pub owner: Option<String>,
    pub ip: String,
}

impl ResultKey {
    pub fn new(sharing: AddressSharing, node: &str, ip: &str) -> Self {
        let owner = match sharing {
            AddressSharing::Shared => None,
            AddressSharing::PerNode => Some(node.to_string()),
        };
        Self {
            owner,
            ip: ip.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResultStore {
    results: HashMap<ResultKey, PathStatus>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite one path of the entry for `key`, creating the entry if needed.
    pub fn record(&mut self, key: ResultKey, kind: PathKind, status: ConnectivityStatus) {
        self.results
            .entry(key)
            .or_insert_with_key(|key| PathStatus::new(key.ip.clone()))
            .set_path(kind, status);
    }

    /// Deep copy of the entry for `key`.
    pub fn snapshot(&self, key: &ResultKey) -> Option<PathStatus> {
        self.results.get(key).cloned()
    }

    pub fn get(&self, key: &ResultKey) -> Option<&PathStatus> {
        self.results.get(key)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.results.len()
    }
}
