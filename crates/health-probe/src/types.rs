//! Data shapes for membership input and status output.
//!
//! These types are designed for JSON/YAML serialization so that node lists can
//! be loaded from disk and snapshots handed to whatever serves them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder written when an echo was dispatched but no reply arrived yet.
pub const STATUS_TIMED_OUT: &str = "Connection timed out";
/// Terminal status for an address that could not be resolved.
pub const STATUS_RESOLVE_FAILED: &str = "Failed to resolve IP";

/// A single address of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// IP address in string form
    pub ip: String,
    /// Whether the address should be probed
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Address {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            enabled: true,
        }
    }

    pub fn disabled(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            enabled: false,
        }
    }
}

/// One cluster member as supplied by the membership source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node name, unique within a registry
    pub name: String,
    /// Primary IPv4 address
    #[serde(default, rename = "primaryIPv4")]
    pub primary_ipv4: Option<Address>,
    /// Primary IPv6 address
    #[serde(default, rename = "primaryIPv6")]
    pub primary_ipv6: Option<Address>,
    /// Additional addresses, in the order the membership source lists them
    #[serde(default)]
    pub secondary_addresses: Vec<Address>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_ipv4: None,
            primary_ipv6: None,
            secondary_addresses: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_ipv4(mut self, address: Address) -> Self {
        self.primary_ipv4 = Some(address);
        self
    }

    #[must_use]
    pub fn with_ipv6(mut self, address: Address) -> Self {
        self.primary_ipv6 = Some(address);
        self
    }

    #[must_use]
    pub fn with_secondary(mut self, address: Address) -> Self {
        self.secondary_addresses.push(address);
        self
    }

    /// The address reported as the node's primary: IPv4 when enabled,
    /// otherwise whatever IPv6 address is configured.
    pub fn primary_ip(&self) -> &str {
        match &self.primary_ipv4 {
            Some(v4) if v4.enabled => &v4.ip,
            _ => self.primary_ipv6.as_ref().map_or("", |v6| v6.ip.as_str()),
        }
    }
}

/// Result of the most recent probe on one path.
///
/// Exactly one of `latency_nanoseconds` and a non-empty `status_message` is
/// set; use the constructors to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityStatus {
    /// Round-trip time of the last successful probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_nanoseconds: Option<u64>,
    /// Human-readable failure reason, empty on success
    #[serde(default)]
    pub status_message: String,
}

impl ConnectivityStatus {
    pub fn reachable(rtt: Duration) -> Self {
        Self {
            latency_nanoseconds: Some(u64::try_from(rtt.as_nanos()).unwrap_or(u64::MAX)),
            status_message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            latency_nanoseconds: None,
            status_message: message.into(),
        }
    }

    pub fn timed_out() -> Self {
        Self::failed(STATUS_TIMED_OUT)
    }

    pub fn resolve_failed() -> Self {
        Self::failed(STATUS_RESOLVE_FAILED)
    }

    pub fn is_reachable(&self) -> bool {
        self.latency_nanoseconds.is_some()
    }
}

/// Logical path a probe travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathKind {
    Icmp,
    DirectPort,
    ViaL7Proxy,
    ViaService,
    ViaServiceL7,
}

/// Latest status per path kind for one address.
///
/// Only `icmp` is populated by the prober; the other slots are carried
/// through serialization untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStatus {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp: Option<ConnectivityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_port: Option<ConnectivityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_l7_proxy: Option<ConnectivityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_service: Option<ConnectivityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_service_l7: Option<ConnectivityStatus>,
}

impl PathStatus {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Default::default()
        }
    }

    pub fn path(&self, kind: PathKind) -> Option<&ConnectivityStatus> {
        match kind {
            PathKind::Icmp => self.icmp.as_ref(),
            PathKind::DirectPort => self.direct_port.as_ref(),
            PathKind::ViaL7Proxy => self.via_l7_proxy.as_ref(),
            PathKind::ViaService => self.via_service.as_ref(),
            PathKind::ViaServiceL7 => self.via_service_l7.as_ref(),
        }
    }

    pub fn set_path(&mut self, kind: PathKind, status: ConnectivityStatus) {
        let slot = match kind {
            PathKind::Icmp => &mut self.icmp,
            PathKind::DirectPort => &mut self.direct_port,
            PathKind::ViaL7Proxy => &mut self.via_l7_proxy,
            PathKind::ViaService => &mut self.via_service,
            PathKind::ViaServiceL7 => &mut self.via_service_l7,
        };
        *slot = Some(status);
    }
}

/// Host-level status of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    /// Status of the node's primary address, if it was ever probed
    pub primary_address: Option<PathStatus>,
    /// Status of every enabled secondary address, in node order
    #[serde(default)]
    pub secondary_addresses: Vec<Option<PathStatus>>,
}

/// Point-in-time view of one node's reachability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub name: String,
    pub host: HostStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reachable_clears_message() {
        let status = ConnectivityStatus::reachable(Duration::from_millis(2));
        assert_eq!(status.latency_nanoseconds, Some(2_000_000));
        assert!(status.status_message.is_empty());
        assert!(status.is_reachable());
    }

    #[test]
    fn test_failure_statuses_carry_message() {
        let timed_out = ConnectivityStatus::timed_out();
        assert_eq!(timed_out.latency_nanoseconds, None);
        assert_eq!(timed_out.status_message, STATUS_TIMED_OUT);

        let unresolved = ConnectivityStatus::resolve_failed();
        assert_eq!(unresolved.status_message, STATUS_RESOLVE_FAILED);
        assert!(!unresolved.is_reachable());
    }

    #[test]
    fn test_primary_ip_prefers_enabled_ipv4() {
        let node = Node::new("a")
            .with_ipv4(Address::new("10.0.0.1"))
            .with_ipv6(Address::new("fd00::1"));
        assert_eq!(node.primary_ip(), "10.0.0.1");

        let node = Node::new("b")
            .with_ipv4(Address::disabled("10.0.0.2"))
            .with_ipv6(Address::new("fd00::2"));
        assert_eq!(node.primary_ip(), "fd00::2");

        assert_eq!(Node::new("c").primary_ip(), "");
    }

    #[test]
    fn test_reserved_slots_survive_serialization() {
        let mut status = PathStatus::new("10.0.0.1");
        status.set_path(PathKind::Icmp, ConnectivityStatus::timed_out());
        status.set_path(
            PathKind::ViaServiceL7,
            ConnectivityStatus::reachable(Duration::from_micros(350)),
        );

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["icmp"]["statusMessage"], STATUS_TIMED_OUT);
        assert_eq!(json["viaServiceL7"]["latencyNanoseconds"], 350_000);
        assert!(json.get("directPort").is_none());

        let back: PathStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, status);
        assert!(back.path(PathKind::ViaServiceL7).is_some());
    }

    #[test]
    fn test_node_deserializes_with_defaults() {
        let yaml = r#"
name: worker-1
primaryIPv4:
  ip: 192.168.1.10
secondaryAddresses:
  - ip: 10.1.0.10
    enabled: false
"#;
        let node: Node = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(node.name, "worker-1");
        assert!(node.primary_ipv4.as_ref().unwrap().enabled);
        assert!(node.primary_ipv6.is_none());
        assert!(!node.secondary_addresses[0].enabled);
    }
}
