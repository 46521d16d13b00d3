//! Host liveness check with a single ICMP echo request.

use crate::error::TransportError;
use crate::transport::{Packet, PacketTransport};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default time to wait for an echo reply.
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of a liveness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    /// An echo reply arrived.
    Up { rtt: Duration },
    /// Nothing arrived before the timeout.
    Down,
    /// The request could not be sent or the reply could not be read.
    /// The host is treated as down.
    Error(TransportError),
}

impl Liveness {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up { .. })
    }
}

/// Ping `target` once and report whether it answered within `timeout`.
pub async fn check_liveness(
    transport: &dyn PacketTransport,
    target: Ipv4Addr,
    timeout: Duration,
) -> Liveness {
    let request = Packet::EchoRequest {
        destination: target,
        identifier: echo_identifier(),
        sequence: rand::random(),
    };
    let start = Instant::now();

    match transport.send_and_await_reply(request, timeout).await {
        Ok(Some(reply)) => {
            let rtt = start.elapsed();
            debug!(%target, ?reply, ?rtt, "echo reply");
            Liveness::Up { rtt }
        }
        Ok(None) => {
            debug!(%target, ?timeout, "no echo reply");
            Liveness::Down
        }
        Err(e) => {
            warn!(%target, error = %e, "ping failed");
            Liveness::Error(e)
        }
    }
}

/// Boolean form of [`check_liveness`]: true iff the host answered.
pub async fn probe_liveness(
    transport: &dyn PacketTransport,
    target: Ipv4Addr,
    timeout: Duration,
) -> bool {
    check_liveness(transport, target, timeout).await.is_up()
}

/// Echo identifier shared by every request from this process.
fn echo_identifier() -> u16 {
    (std::process::id() & 0xFFFF) as u16
}
