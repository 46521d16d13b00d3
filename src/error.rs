//! Error types for salmap.
//!
//! Uses `thiserror` for ergonomic error definitions.

use crate::types::{PortSpecError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single packet exchange.
///
/// Cloneable so it can travel inside probe results and liveness outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to open raw channel: {0}")]
    Channel(String),

    #[error("Failed to send packet: {0}")]
    Send(String),

    #[error("Failed to receive reply: {0}")]
    Receive(String),

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("No usable source address: {0}")]
    SourceAddress(String),

    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),
}

impl TransportError {
    /// Classify an I/O error raised while opening a raw channel.
    pub(crate) fn from_channel_io(e: &std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied("raw socket access requires root/sudo privileges".to_string())
        } else {
            Self::Channel(e.to_string())
        }
    }
}

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("invalid setting '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    InvalidSpec(#[from] PortSpecError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("raw sockets require root privileges; run with: sudo salmap {0}")]
    InsufficientPrivileges(String),

    #[error("the usage agreement was not accepted")]
    DisclaimerDeclined,

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
