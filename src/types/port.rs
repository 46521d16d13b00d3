//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortSet` is the parsed form of a textual port specification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortSpecError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortSpecError::OutOfRange(i64::from(value)))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Why a port specification was rejected.
///
/// Every variant is an "invalid spec": the scan is refused before any
/// packet is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortSpecError {
    #[error("empty port specification")]
    Empty,
    #[error("invalid port number: '{0}'")]
    InvalidNumber(String),
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(i64),
    #[error("invalid port range: '{0}' (expected START-END)")]
    MalformedRange(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    ReversedRange(u16, u16),
}

/// The set of ports named by a port specification.
///
/// Accepted forms, checked in this order:
/// - Range: "1-1024" (inclusive, start must not exceed end)
/// - Comma-separated: "22,80,443"
/// - Single port: "80"
///
/// Mixed forms such as "22,80-90" are rejected. Ports are kept sorted and
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PortSet {
    ports: Vec<Port>,
}

impl PortSet {
    /// The twenty most common TCP service ports.
    pub const COMMON: [u16; 20] = [
        21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 993, 995, 1723, 3306, 3389,
        5900, 8080,
    ];

    /// Create an empty port set.
    pub const fn new() -> Self {
        Self { ports: Vec::new() }
    }

    /// The common-ports set offered by the interactive menu.
    pub fn common() -> Self {
        Self::COMMON.iter().copied().filter_map(Port::new).collect()
    }

    /// Ports in ascending order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, port: Port) -> bool {
        self.ports.binary_search(&port).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Port> + '_ {
        self.ports.iter().copied()
    }
}

impl FromIterator<Port> for PortSet {
    fn from_iter<I: IntoIterator<Item = Port>>(iter: I) -> Self {
        let mut ports: Vec<Port> = iter.into_iter().collect();
        ports.sort_unstable();
        ports.dedup();
        Self { ports }
    }
}

impl FromStr for PortSet {
    type Err = PortSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortSpecError::Empty);
        }

        if s.contains('-') {
            let bounds: Vec<&str> = s.split('-').collect();
            if bounds.len() != 2 {
                return Err(PortSpecError::MalformedRange(s.to_string()));
            }
            let start = parse_port(bounds[0])?;
            let end = parse_port(bounds[1])?;
            if start > end {
                return Err(PortSpecError::ReversedRange(start.0, end.0));
            }
            return Ok((start.0..=end.0).map(Port).collect());
        }

        if s.contains(',') {
            return s.split(',').map(parse_port).collect();
        }

        parse_port(s).map(|port| Self { ports: vec![port] })
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ports.iter().map(Port::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Parse one integer token into a validated port.
fn parse_port(token: &str) -> Result<Port, PortSpecError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(PortSpecError::InvalidNumber(token.to_string()));
    }
    let value: i64 = token
        .parse()
        .map_err(|_| PortSpecError::InvalidNumber(token.to_string()))?;
    u16::try_from(value)
        .ok()
        .and_then(Port::new)
        .ok_or(PortSpecError::OutOfRange(value))
}
