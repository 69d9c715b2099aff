//! In-process transport and resolver doubles used by the unit tests.

use crate::error::{ProbeError, TransportError};
use crate::transport::{EchoSink, EchoTransport, Resolver, SystemResolver};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Transport that records registrations and answers with scripted replies.
#[derive(Default)]
pub struct RecordingTransport {
    registrations: DashMap<IpAddr, usize>,
    replies: DashMap<IpAddr, Duration>,
    rounds: AtomicUsize,
    fail_rounds: AtomicBool,
    round_delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each round sleeps this long before delivering its replies.
    pub fn with_round_delay(delay: Duration) -> Self {
        Self {
            round_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn reply(&self, ip: &str, rtt: Duration) {
        self.replies.insert(ip.parse().unwrap(), rtt);
    }

    pub fn fail_rounds(&self, fail: bool) {
        self.fail_rounds.store(fail, Ordering::SeqCst);
    }

    pub fn registrations(&self, ip: &str) -> usize {
        let addr: IpAddr = ip.parse().unwrap();
        self.registrations.get(&addr).map_or(0, |count| *count)
    }

    pub fn rounds(&self) -> usize {
        self.rounds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EchoTransport for RecordingTransport {
    fn register(&self, addr: IpAddr) {
        *self.registrations.entry(addr).or_insert(0) += 1;
    }

    async fn run_round(&self, _deadline: Duration, sink: &EchoSink) -> Result<(), TransportError> {
        self.rounds.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.round_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_rounds.load(Ordering::SeqCst) {
            return Err(TransportError::Other("scripted failure".into()));
        }

        let replies: Vec<(IpAddr, Duration)> = self
            .replies
            .iter()
            .filter(|entry| self.registrations.contains_key(entry.key()))
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        for (addr, rtt) in replies {
            sink.deliver(addr, rtt);
        }
        Ok(())
    }
}

/// Resolves literals like [`SystemResolver`] except for a deny list.
#[derive(Default)]
pub struct MapResolver {
    unresolvable: DashSet<String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(&self, ip: &str) {
        self.unresolvable.insert(ip.to_string());
    }

    pub fn allow(&self, ip: &str) {
        self.unresolvable.remove(ip);
    }
}

impl Resolver for MapResolver {
    fn resolve(&self, ip: &str) -> Result<IpAddr, ProbeError> {
        if self.unresolvable.contains(ip) {
            return Err(ProbeError::Resolve {
                ip: ip.to_string(),
                reason: "denied".to_string(),
            });
        }
        SystemResolver.resolve(ip)
    }
}
