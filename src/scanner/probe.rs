//! Single-port SYN probe.
//!
//! Performs half-open TCP scanning of one port:
//!
//! 1. Send a TCP SYN from a random ephemeral source port
//! 2. Wait a bounded time for the reply:
//!    - SYN/ACK, exactly: port is open
//!    - anything else, or nothing: closed or filtered
//! 3. After a SYN/ACK, send RST so neither side keeps half-open state

use crate::scanner::{ProbeResult, ProbeVerdict};
use crate::transport::{Packet, PacketTransport, Reply, TcpFlags};
use crate::types::Port;
use rand::Rng;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default time to wait for a reply to a SYN.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Source ports are drawn from the IANA dynamic range.
pub const EPHEMERAL_PORTS: RangeInclusive<u16> = 49152..=65535;

/// Probe one port on `target`.
///
/// Never fails: transport problems become [`ProbeVerdict::Error`].
pub async fn probe_port(
    transport: &dyn PacketTransport,
    target: Ipv4Addr,
    port: Port,
    timeout: Duration,
) -> ProbeResult {
    let (source_port, sequence) = probe_identity();
    let start = Instant::now();

    let syn = Packet::Tcp {
        destination: target,
        source_port,
        destination_port: port.as_u16(),
        sequence,
        flags: TcpFlags::SYN,
    };

    let reply = match transport.send_and_await_reply(syn, timeout).await {
        Ok(reply) => reply,
        Err(e) => {
            debug!(%target, %port, error = %e, "probe failed");
            return ProbeResult::new(port, ProbeVerdict::Error(e), start.elapsed());
        }
    };
    let elapsed = start.elapsed();

    if !is_syn_ack(reply.as_ref()) {
        trace!(%target, %port, ?reply, "closed or filtered");
        return ProbeResult::new(port, ProbeVerdict::ClosedOrFiltered, elapsed);
    }

    trace!(%target, %port, ?elapsed, "open");
    let rst = Packet::Tcp {
        destination: target,
        source_port,
        destination_port: port.as_u16(),
        sequence: sequence.wrapping_add(1),
        flags: TcpFlags::RST,
    };
    if let Err(e) = transport.send(rst).await {
        debug!(%target, %port, error = %e, "failed to send RST after SYN/ACK");
    }

    ProbeResult::new(port, ProbeVerdict::Open, elapsed)
}

/// Only a TCP reply carrying exactly SYN and ACK counts as open.
fn is_syn_ack(reply: Option<&Reply>) -> bool {
    matches!(reply, Some(Reply::Tcp { flags, .. }) if *flags == TcpFlags::SYN_ACK)
}

/// Random source port and initial sequence number for one probe.
fn probe_identity() -> (u16, u32) {
    let mut rng = rand::thread_rng();
    (rng.gen_range(EPHEMERAL_PORTS), rng.gen())
}
