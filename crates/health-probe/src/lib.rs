//! Cluster Health Prober
//!
//! This crate continuously checks whether every node of a cluster is
//! reachable and keeps the latest result per address, ready to be served as a
//! consistent point-in-time snapshot.
//!
//! - **Membership**: a complete node list is handed in and replaces the
//!   previous one wholesale
//! - **Probing**: every enabled address is resolved and registered with an
//!   echo transport, which is driven in rounds at a fixed cadence
//! - **Results**: replies are applied by a single coordinating task; results
//!   survive membership changes
//! - **Snapshots**: one deduplicated view per node, deep-copied under a read lock
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Prober                               │
//! │                                                                  │
//! │   set_nodes ──► Registry ──┐          ┌──► get_results            │
//! │                            ▼          │                           │
//! │                  ┌──────────────────────────┐                    │
//! │                  │ RwLock<Registry + Store> │                    │
//! │                  └──────────────────────────┘                    │
//! │                            ▲                                      │
//! │                 coordinator task (serial writes)                 │
//! │                            ▲                                      │
//! │           EchoSink ◄── EchoTransport ◄── ProbeLoop (interval)     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use saorsa_health_probe::{Prober, ProberConfig, SystemPingTransport, SystemResolver};
//!
//! let config = ProberConfig::default();
//! let transport = Arc::new(SystemPingTransport::new(&config.ping_command));
//! let prober = Arc::new(Prober::new(config, transport, Arc::new(SystemResolver))?);
//!
//! prober.set_nodes(nodes).await;
//! let probe_loop = prober.run_loop();
//! let snapshot = prober.get_results().await;
//!
//! probe_loop.stop();
//! probe_loop.stopped().await;
//! ```

pub mod addressing;
pub mod config;
pub mod error;
pub mod logging;
pub mod prober;
pub mod registry;
pub mod store;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{AddressSharing, ProberConfig, StopPolicy};
pub use error::{ProbeError, Result, TransportError};
pub use prober::{ProbeLoop, Prober};
pub use registry::Registry;
pub use transport::{
    EchoReply, EchoSink, EchoTransport, Resolver, SystemPingTransport, SystemResolver,
};
pub use types::{
    Address, ConnectivityStatus, HostStatus, Node, NodeSnapshot, PathKind, PathStatus,
};
