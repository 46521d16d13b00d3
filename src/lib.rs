//! # salmap - An Ethical Network Scanner
//!
//! salmap checks whether an IPv4 host answers an ICMP echo request and finds
//! open TCP ports with half-open SYN probes run concurrently under a bounded
//! worker pool.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use salmap::scanner::{scan, ScanOptions};
//! use salmap::transport::{RawTransport, SharedTransport};
//! use salmap::types::{PortSet, Target};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport: SharedTransport = Arc::new(RawTransport::new());
//!     let target = Target::resolve("192.168.1.1").await?;
//!     let ports: PortSet = "20-25,80,443".parse()?;
//!
//!     let report = scan(transport, &target, &ports, &ScanOptions::default()).await;
//!     for port in &report.open_ports {
//!         println!("Port {port} is OPEN");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port, port set and target types
//! - [`transport`] - Raw packet I/O behind the `PacketTransport` trait
//! - [`scanner`] - Liveness prober, port prober and scan coordinator
//! - [`config`] - Settings file handling
//! - [`output`] - Plain, JSON and CSV rendering
//! - [`cli`] - Subcommands, preflight checks and the interactive menu
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, TransportError};
pub use scanner::{check_liveness, probe_liveness, probe_port, scan, ProbeVerdict, ScanReport};
pub use transport::{PacketTransport, RawTransport, SharedTransport};
pub use types::{Port, PortSet, PortSpecError, Target};
