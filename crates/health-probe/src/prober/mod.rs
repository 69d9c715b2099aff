//! The probe engine.
//!
//! A [`Prober`] owns the current [`Registry`] and the [`ResultStore`] behind a
//! single reader/writer lock. Membership updates swap the registry and write
//! provisional statuses in one critical section; echo replies are queued by
//! the transport and applied one at a time by a coordinating task, so no
//! caller ever performs a read-then-write against the store.
//!
//! ```text
//!   set_nodes ──► resolve ──► [write lock: swap registry + provisional status]
//!                                   │
//!                                   └──► transport.register(addr)
//!
//!   transport ──EchoSink──► mpsc ──► coordinator ──► [write lock: icmp = rtt]
//!
//!   get_results ──► [read lock: registry + store] ──► Vec<NodeSnapshot>
//! ```

mod lifecycle;

pub use lifecycle::ProbeLoop;

use crate::addressing::addresses_of;
use crate::config::{AddressSharing, ProberConfig};
use crate::error::Result;
use crate::registry::Registry;
use crate::store::{ResultKey, ResultStore};
use crate::transport::{EchoReply, EchoSink, EchoTransport, ProbeEvent, Resolver};
use crate::types::{ConnectivityStatus, HostStatus, Node, NodeSnapshot, PathKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

/// Registry and results, guarded together.
#[derive(Debug, Default)]
struct ProbeState {
    registry: Arc<Registry>,
    results: ResultStore,
}

impl ProbeState {
    /// Record a reply for every current owner of its address.
    ///
    /// Returns the name of the first owning node, or `None` if the address no
    /// longer belongs to any node.
    fn apply_echo(&mut self, reply: EchoReply, sharing: AddressSharing) -> Option<String> {
        let registry = Arc::clone(&self.registry);
        let owners = registry.owners_of(&reply.addr);

        let mut first = None;
        for owner in owners {
            let Some(node) = registry.node(owner.node) else {
                continue;
            };
            let key = ResultKey::new(sharing, &node.name, &owner.ip);
            self.results
                .record(key, PathKind::Icmp, ConnectivityStatus::reachable(reply.rtt));
            first.get_or_insert_with(|| node.name.clone());
        }
        first
    }
}

/// Continuously probes cluster nodes and serves reachability snapshots.
pub struct Prober {
    config: ProberConfig,
    state: Arc<RwLock<ProbeState>>,
    transport: Arc<dyn EchoTransport>,
    resolver: Arc<dyn Resolver>,
    sink: EchoSink,
    coordinator: JoinHandle<()>,
}

impl Prober {
    /// Create a prober with an empty registry.
    ///
    /// Spawns the coordinating task, so this must be called from within a
    /// tokio runtime.
    pub fn new(
        config: ProberConfig,
        transport: Arc<dyn EchoTransport>,
        resolver: Arc<dyn Resolver>,
    ) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(RwLock::new(ProbeState::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = tokio::spawn(coordinate(
            Arc::clone(&state),
            config.address_sharing,
            rx,
        ));

        Ok(Self {
            config,
            state,
            transport,
            resolver,
            sink: EchoSink::new(tx),
            coordinator,
        })
    }

    pub fn config(&self) -> &ProberConfig {
        &self.config
    }

    /// Sink through which replies for this prober are delivered.
    pub fn sink(&self) -> EchoSink {
        self.sink.clone()
    }

    /// Replace the cluster membership and start probing its addresses.
    ///
    /// Every enabled address is resolved again, even if it was already known.
    /// Resolution failures are recorded as status, never returned.
    pub async fn set_nodes(&self, nodes: Vec<Node>) {
        let mut registry = Registry::new(nodes);
        let sharing = self.config.address_sharing;

        let mut statuses = Vec::new();
        let mut targets = Vec::new();
        let mut owners = Vec::new();
        for (idx, node) in registry.nodes().iter().enumerate() {
            for entry in addresses_of(node) {
                if !entry.is_probeable() {
                    continue;
                }
                let key = ResultKey::new(sharing, &node.name, entry.ip());

                match self.resolver.resolve(entry.ip()) {
                    Ok(addr) => {
                        debug!(
                            node = %node.name,
                            ip = entry.ip(),
                            slot = ?entry.slot,
                            primary = entry.primary,
                            "Probing for connectivity to node"
                        );
                        statuses.push((key, ConnectivityStatus::timed_out()));
                        owners.push((addr, idx, entry.ip().to_string()));
                        targets.push(addr);
                    }
                    Err(e) => {
                        debug!(
                            node = %node.name,
                            ip = entry.ip(),
                            slot = ?entry.slot,
                            primary = entry.primary,
                            error = %e,
                            "Skipping probe for node"
                        );
                        statuses.push((key, ConnectivityStatus::resolve_failed()));
                    }
                }
            }
        }

        // Replies report the resolved address, so that is what owners are
        // looked up by.
        for (addr, idx, ip) in owners {
            registry.add_owner(addr, idx, &ip);
        }

        {
            let mut state = self.state.write().await;
            state.registry = Arc::new(registry);
            for (key, status) in statuses {
                state.results.record(key, PathKind::Icmp, status);
            }
        }

        // Registered only after the provisional status is in place, so a
        // fast reply can never be overwritten by it.
        for addr in targets {
            self.transport.register(addr);
        }
    }

    /// Send one round of probes.
    ///
    /// Returns once the transport finished dispatching; replies keep being
    /// applied in the background afterwards.
    pub async fn run_once(&self) -> Result<()> {
        self.transport
            .run_round(self.config.probe_deadline, &self.sink)
            .await?;
        Ok(())
    }

    /// Start probing every `interval` in the background.
    pub fn run_loop(self: &Arc<Self>) -> ProbeLoop {
        ProbeLoop::start(Arc::clone(self))
    }

    /// Wait until every reply queued so far has been applied to the store.
    pub async fn flush(&self) {
        if let Some(ack) = self.sink.flush() {
            let _ = ack.await;
        }
    }

    /// Snapshot of every node in the current registry.
    ///
    /// Nodes sharing a name are reported once. The order of the returned
    /// snapshots is unspecified.
    pub async fn get_results(&self) -> Vec<NodeSnapshot> {
        let sharing = self.config.address_sharing;
        let state = self.state.read().await;

        let mut by_name: HashMap<&str, NodeSnapshot> = HashMap::new();
        for node in state.registry.nodes() {
            if by_name.contains_key(node.name.as_str()) {
                continue;
            }

            let primary = ResultKey::new(sharing, &node.name, node.primary_ip());
            let secondary_addresses = node
                .secondary_addresses
                .iter()
                .filter(|address| address.enabled)
                .map(|address| {
                    state
                        .results
                        .snapshot(&ResultKey::new(sharing, &node.name, &address.ip))
                })
                .collect();

            by_name.insert(
                node.name.as_str(),
                NodeSnapshot {
                    name: node.name.clone(),
                    host: HostStatus {
                        primary_address: state.results.snapshot(&primary),
                        secondary_addresses,
                    },
                },
            );
        }

        by_name.into_values().collect()
    }
}

impl Drop for Prober {
    fn drop(&mut self) {
        self.coordinator.abort();
    }
}

/// Apply queued events to the shared state, one at a time.
async fn coordinate(
    state: Arc<RwLock<ProbeState>>,
    sharing: AddressSharing,
    mut events: mpsc::UnboundedReceiver<ProbeEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            ProbeEvent::Echo(reply) => {
                let owner = state.write().await.apply_echo(reply, sharing);
                match owner {
                    Some(node) => debug!(
                        node = %node,
                        ip = %reply.addr,
                        rtt = ?reply.rtt,
                        "Probe successful"
                    ),
                    None => debug!(
                        ip = %reply.addr,
                        rtt = ?reply.rtt,
                        "Node disappeared, skip result"
                    ),
                }
            }
            ProbeEvent::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
