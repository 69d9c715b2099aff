//! Prober configuration.

use crate::error::{ProbeError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What `stop()` does with a round that is still in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopPolicy {
    /// Let the in-flight round finish and apply queued replies before
    /// reporting the loop as stopped.
    #[default]
    Drain,
    /// Abort the in-flight round and report stopped right away. Replies the
    /// transport already queued may still land in the store afterwards.
    Discard,
}

/// How slots that carry the same address string are tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressSharing {
    /// One result entry per address string, shared by every slot using it.
    #[default]
    Shared,
    /// One result entry per (node name, address string).
    PerNode,
}

/// Configuration for a [`Prober`](crate::Prober).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProberConfig {
    /// Time between two rounds of the probe loop
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Maximum time a round waits for echo replies
    #[serde(with = "humantime_serde")]
    pub probe_deadline: Duration,
    pub stop_policy: StopPolicy,
    pub address_sharing: AddressSharing,
    /// Program invoked by the system ping transport
    pub ping_command: String,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            probe_deadline: Duration::from_secs(1),
            stop_policy: StopPolicy::default(),
            address_sharing: AddressSharing::default(),
            ping_command: "ping".to_string(),
        }
    }
}

impl ProberConfig {
    /// Load a configuration file, accepting JSON or YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = load_document(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ProbeError::Config("interval must be non-zero".into()));
        }
        if self.probe_deadline.is_zero() {
            return Err(ProbeError::Config("probe_deadline must be non-zero".into()));
        }
        if self.probe_deadline > self.interval {
            return Err(ProbeError::Config(format!(
                "probe_deadline ({:?}) exceeds interval ({:?})",
                self.probe_deadline, self.interval
            )));
        }
        if self.ping_command.trim().is_empty() {
            return Err(ProbeError::Config("ping_command must not be empty".into()));
        }
        Ok(())
    }
}

/// Read a JSON or YAML document from disk.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| ProbeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content)
        .or_else(|_| serde_yaml::from_str(&content))
        .map_err(|e| ProbeError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
