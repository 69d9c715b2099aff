//! Error types for the prober.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the probe engine and its collaborators.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// An address string could not be turned into a network address.
    #[error("failed to resolve {ip}: {reason}")]
    Resolve { ip: String, reason: String },

    /// The echo transport failed to dispatch a round.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration was rejected by validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A configuration or node file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration or node file could not be parsed as JSON or YAML.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Errors raised by an [`EchoTransport`](crate::transport::EchoTransport)
/// while running a round.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{failed} of {total} echo requests could not be dispatched")]
    Partial { failed: usize, total: usize },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
