//! Echo-probe and address-resolution capabilities consumed by the prober.
//!
//! The prober never talks to the network itself. It registers resolved
//! addresses with an [`EchoTransport`], asks it to run rounds, and receives
//! replies as events through an [`EchoSink`]. Replies may arrive while a
//! round is running or at any time after it returned.

mod ping;

pub use ping::SystemPingTransport;

use crate::addressing::{IpFamily, family_of};
use crate::error::{ProbeError, TransportError};
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// A single echo reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub addr: IpAddr,
    pub rtt: Duration,
}

/// Events consumed by the prober's coordinating task.
#[derive(Debug)]
pub(crate) enum ProbeEvent {
    Echo(EchoReply),
    /// Acknowledged once every event queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

/// Handle a transport uses to report echo replies.
///
/// Cheap to clone; replies are queued and applied in arrival order.
#[derive(Debug, Clone)]
pub struct EchoSink {
    tx: mpsc::UnboundedSender<ProbeEvent>,
}

impl EchoSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ProbeEvent>) -> Self {
        Self { tx }
    }

    /// Queue a reply. Returns `false` once the prober has shut down.
    pub fn deliver(&self, addr: IpAddr, rtt: Duration) -> bool {
        self.tx.send(ProbeEvent::Echo(EchoReply { addr, rtt })).is_ok()
    }

    pub(crate) fn flush(&self) -> Option<oneshot::Receiver<()>> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(ProbeEvent::Flush(tx)).ok().map(|()| rx)
    }
}

/// Something that can send echo probes to a set of registered addresses.
#[async_trait]
pub trait EchoTransport: Send + Sync {
    /// Add an address to the probe set. Registering the same address twice
    /// is allowed.
    fn register(&self, addr: IpAddr);

    /// Send one echo to every registered address and report replies through
    /// `sink`, waiting at most `deadline`. Replies for addresses that never
    /// answer are simply not reported.
    async fn run_round(&self, deadline: Duration, sink: &EchoSink) -> Result<(), TransportError>;
}

/// Turns an address string into a network address.
pub trait Resolver: Send + Sync {
    fn resolve(&self, ip: &str) -> Result<IpAddr, ProbeError>;
}

/// Resolves literal IP strings only; no DNS lookups.
///
/// A trailing IPv6 zone (`fe80::1%eth0`) is accepted and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, ip: &str) -> Result<IpAddr, ProbeError> {
        let family = family_of(ip);
        let literal = match family {
            IpFamily::V6 => ip.split('%').next().unwrap_or(ip),
            IpFamily::V4 => ip,
        };

        let addr: IpAddr = literal.trim().parse().map_err(|e| ProbeError::Resolve {
            ip: ip.to_string(),
            reason: format!("{e}"),
        })?;

        match (family, addr) {
            (IpFamily::V4, IpAddr::V4(_)) | (IpFamily::V6, IpAddr::V6(_)) => Ok(addr),
            _ => Err(ProbeError::Resolve {
                ip: ip.to_string(),
                reason: "address family mismatch".to_string(),
            }),
        }
    }
}
