//! Echo transport backed by the system `ping` utility.

use super::{EchoSink, EchoTransport};
use crate::error::TransportError;
use async_trait::async_trait;
use dashmap::DashSet;
use futures::future::join_all;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, trace};

/// Sends one ICMP echo per registered address by running `ping -c 1`.
///
/// Using the system binary avoids needing raw-socket privileges in this
/// process. Registered addresses are kept for the transport's lifetime.
pub struct SystemPingTransport {
    program: String,
    targets: DashSet<IpAddr>,
}

impl SystemPingTransport {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            targets: DashSet::new(),
        }
    }

    pub fn registered(&self) -> usize {
        self.targets.len()
    }

    async fn ping_one(&self, addr: IpAddr, deadline: Duration) -> std::io::Result<Option<Duration>> {
        // ping only accepts whole seconds for -W
        let wait_secs = deadline.as_secs().max(1);

        let mut cmd = Command::new(&self.program);
        if addr.is_ipv6() {
            cmd.arg("-6");
        }
        cmd.args(["-n", "-c", "1", "-W"])
            .arg(wait_secs.to_string())
            .arg(addr.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let started = Instant::now();
        let child = cmd.spawn()?;

        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                trace!(%addr, "Echo request hit the round deadline");
                return Ok(None);
            }
        };
        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        // Fall back to wall-clock time if the output format is unfamiliar.
        Ok(Some(parse_rtt(&stdout).unwrap_or_else(|| started.elapsed())))
    }
}

#[async_trait]
impl EchoTransport for SystemPingTransport {
    fn register(&self, addr: IpAddr) {
        self.targets.insert(addr);
    }

    async fn run_round(&self, deadline: Duration, sink: &EchoSink) -> Result<(), TransportError> {
        let targets: Vec<IpAddr> = self.targets.iter().map(|addr| *addr).collect();
        if targets.is_empty() {
            return Ok(());
        }
        debug!(targets = targets.len(), ?deadline, "Sending echo round");

        let outcomes = join_all(targets.iter().map(|&addr| async move {
            let outcome = self.ping_one(addr, deadline).await;
            if let Ok(Some(rtt)) = outcome {
                sink.deliver(addr, rtt);
            }
            outcome
        }))
        .await;

        let total = outcomes.len();
        let mut errors: Vec<std::io::Error> = outcomes.into_iter().filter_map(Result::err).collect();
        match errors.len() {
            0 => Ok(()),
            n if n == total => Err(TransportError::Spawn {
                program: self.program.clone(),
                source: errors.swap_remove(0),
            }),
            failed => Err(TransportError::Partial { failed, total }),
        }
    }
}

/// Extract the round-trip time from ping output (`time=0.042 ms`, `time<1ms`).
pub(crate) fn parse_rtt(output: &str) -> Option<Duration> {
    let start = output.find("time=").or_else(|| output.find("time<"))? + "time=".len();
    let rest = &output[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let millis: f64 = rest[..end].parse().ok()?;
    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(millis / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_parse_rtt_linux_output() {
        let output = "PING 10.0.0.1 (10.0.0.1) 56(84) bytes of data.\n\
                      64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.042 ms\n";
        assert_eq!(parse_rtt(output), Some(Duration::from_micros(42)));
    }

    #[test]
    fn test_parse_rtt_variants() {
        assert_eq!(parse_rtt("time=12 ms"), Some(Duration::from_millis(12)));
        assert_eq!(parse_rtt("Reply from 10.0.0.1: time<1ms TTL=128"), Some(Duration::from_millis(1)));
        assert_eq!(parse_rtt("100% packet loss"), None);
        assert_eq!(parse_rtt("time=abc ms"), None);
    }

    #[test]
    fn test_register_is_idempotent() {
        let transport = SystemPingTransport::new("ping");
        let addr: IpAddr = "10.0.0.1".parse().unwrap();
        transport.register(addr);
        transport.register(addr);
        assert_eq!(transport.registered(), 1);
    }

    #[tokio::test]
    async fn test_empty_round_is_ok() {
        let transport = SystemPingTransport::new("ping");
        let (tx, _rx) = mpsc::unbounded_channel();
        let sink = EchoSink::new(tx);
        assert!(transport.run_round(Duration::from_millis(10), &sink).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program_fails_round() {
        let transport = SystemPingTransport::new("/nonexistent/ping-binary");
        transport.register("127.0.0.1".parse().unwrap());
        let (tx, _rx) = mpsc::unbounded_channel();
        let sink = EchoSink::new(tx);

        let err = transport
            .run_round(Duration::from_millis(100), &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Spawn { .. }));
    }
}
