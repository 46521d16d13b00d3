//! Scanner module - liveness checks and concurrent SYN port scanning.
//!
//! - [`liveness`] sends a single ICMP echo request.
//! - [`probe`] runs the half-open handshake against one port.
//! - [`coordinator`] fans probes out over a bounded worker pool and
//!   collects the verdicts into a [`ScanReport`].

pub mod coordinator;
pub mod liveness;
pub mod probe;

use crate::error::TransportError;
use crate::types::Port;
use std::fmt;
use std::time::Duration;

pub use coordinator::{scan, scan_with, ScanReport};
pub use liveness::{check_liveness, probe_liveness, Liveness, DEFAULT_LIVENESS_TIMEOUT};
pub use probe::{probe_port, DEFAULT_PROBE_TIMEOUT};

/// Default number of probes allowed in flight at once.
pub const DEFAULT_POOL_WIDTH: usize = 50;

/// Verdict for a single probed port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// The port answered SYN with SYN/ACK.
    Open,
    /// No reply, or any reply other than an exact SYN/ACK.
    ClosedOrFiltered,
    /// The probe could not be sent or its reply could not be read.
    ///
    /// Reported like `ClosedOrFiltered`, but kept distinct so callers can
    /// tell a silent port from a broken probe.
    Error(TransportError),
}

impl fmt::Display for ProbeVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::ClosedOrFiltered => write!(f, "closed|filtered"),
            Self::Error(e) => write!(f, "error ({e})"),
        }
    }
}

/// Outcome of probing one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// The port that was probed.
    pub port: Port,
    /// What the probe concluded.
    pub verdict: ProbeVerdict,
    /// Time from sending the SYN to reaching a verdict.
    pub elapsed: Duration,
}

impl ProbeResult {
    pub fn new(port: Port, verdict: ProbeVerdict, elapsed: Duration) -> Self {
        Self {
            port,
            verdict,
            elapsed,
        }
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.verdict == ProbeVerdict::Open
    }

    /// Check if the probe failed at the transport level.
    pub fn is_error(&self) -> bool {
        matches!(self.verdict, ProbeVerdict::Error(_))
    }
}

/// Tunables for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Maximum probes in flight at once. A width of 0 runs probes one at
    /// a time, as if it were 1.
    pub pool_width: usize,
    /// How long each probe waits for a reply.
    pub probe_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            pool_width: DEFAULT_POOL_WIDTH,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ScanOptions {
    /// Set the pool width.
    pub fn with_pool_width(mut self, pool_width: usize) -> Self {
        self.pool_width = pool_width;
        self
    }

    /// Set the per-probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}
