//! JSON output formatting.

use crate::scanner::{Liveness, ScanReport};
use crate::types::Target;
use serde::Serialize;
use std::io::{self, Write};
use std::net::Ipv4Addr;

/// Serializable form of a liveness check.
#[derive(Debug, Serialize)]
pub struct LivenessRecord<'a> {
    pub target: &'a str,
    pub ip_address: Ipv4Addr,
    pub alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtt_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> LivenessRecord<'a> {
    pub fn new(target: &'a Target, liveness: &Liveness) -> Self {
        let (rtt_ms, error) = match liveness {
            Liveness::Up { rtt } => (Some(rtt.as_micros() as f64 / 1000.0), None),
            Liveness::Down => (None, None),
            Liveness::Error(e) => (None, Some(e.to_string())),
        };
        Self {
            target: &target.original,
            ip_address: target.ip,
            alive: liveness.is_up(),
            rtt_ms,
            error,
        }
    }
}

/// Print results in JSON format.
pub fn print_json(report: &ScanReport) -> io::Result<()> {
    write_json(&mut io::stdout().lock(), report)
}

/// Print a liveness result in JSON format.
pub fn print_liveness_json(target: &Target, liveness: &Liveness) -> io::Result<()> {
    write_json(&mut io::stdout().lock(), &LivenessRecord::new(target, liveness))
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::other)?;
    writeln!(out)
}
