//! Packet transport abstraction.
//!
//! The probers never touch sockets. They describe what to send as a
//! [`Packet`] and hand it to a [`PacketTransport`], which either fires it
//! off or waits a bounded time for the matching [`Reply`]. The raw socket
//! implementation lives in [`raw`]; tests substitute their own.

pub mod raw;

use crate::error::TransportResult;
use async_trait::async_trait;
use std::fmt;
use std::net::Ipv4Addr;
use std::ops::BitOr;
use std::sync::Arc;
use std::time::Duration;

pub use raw::RawTransport;

/// TCP control flags as they appear in the header's flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TcpFlags(u8);

impl TcpFlags {
    pub const FIN: Self = Self(0x01);
    pub const SYN: Self = Self(0x02);
    pub const RST: Self = Self(0x04);
    pub const PSH: Self = Self(0x08);
    pub const ACK: Self = Self(0x10);
    pub const URG: Self = Self(0x20);
    pub const ECE: Self = Self(0x40);
    pub const CWR: Self = Self(0x80);

    /// SYN and ACK together, the reply of a listening port.
    pub const SYN_ACK: Self = Self(0x12);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every flag in `other` is also set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TcpFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(TcpFlags, &str); 8] = [
            (TcpFlags::CWR, "CWR"),
            (TcpFlags::ECE, "ECE"),
            (TcpFlags::URG, "URG"),
            (TcpFlags::ACK, "ACK"),
            (TcpFlags::PSH, "PSH"),
            (TcpFlags::RST, "RST"),
            (TcpFlags::SYN, "SYN"),
            (TcpFlags::FIN, "FIN"),
        ];
        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", set.join("|"))
        }
    }
}

/// An outgoing packet, described by intent rather than bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// ICMP echo request.
    EchoRequest {
        destination: Ipv4Addr,
        identifier: u16,
        sequence: u16,
    },
    /// A bare TCP segment with no payload.
    Tcp {
        destination: Ipv4Addr,
        source_port: u16,
        destination_port: u16,
        sequence: u32,
        flags: TcpFlags,
    },
}

impl Packet {
    /// Address the packet is sent to.
    pub fn destination(&self) -> Ipv4Addr {
        match self {
            Self::EchoRequest { destination, .. } | Self::Tcp { destination, .. } => *destination,
        }
    }
}

/// A reply matched to a previously sent [`Packet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Tcp {
        source: Ipv4Addr,
        source_port: u16,
        destination_port: u16,
        flags: TcpFlags,
    },
    Icmp {
        source: Ipv4Addr,
        icmp_type: u8,
    },
}

/// Capability to put packets on the wire.
///
/// Implementations must be safe to call from many tasks at once; each call
/// is an independent exchange.
#[async_trait]
pub trait PacketTransport: Send + Sync {
    /// Send a packet without waiting for anything back.
    async fn send(&self, packet: Packet) -> TransportResult<()>;

    /// Send a packet and wait up to `timeout` for the reply that answers it.
    ///
    /// `Ok(None)` means nothing matching arrived in time.
    async fn send_and_await_reply(
        &self,
        packet: Packet,
        timeout: Duration,
    ) -> TransportResult<Option<Reply>>;
}

/// A transport shared between worker tasks.
pub type SharedTransport = Arc<dyn PacketTransport>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syn_ack_is_exact_pair() {
        assert_eq!(TcpFlags::SYN | TcpFlags::ACK, TcpFlags::SYN_ACK);
        assert_eq!(TcpFlags::SYN_ACK.bits(), 0x12);
        assert!(TcpFlags::from_bits(0x52).contains(TcpFlags::SYN_ACK));
        assert_ne!(TcpFlags::from_bits(0x52), TcpFlags::SYN_ACK);
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(TcpFlags::SYN_ACK.to_string(), "ACK|SYN");
        assert_eq!((TcpFlags::RST | TcpFlags::ACK).to_string(), "ACK|RST");
        assert_eq!(TcpFlags::default().to_string(), "none");
    }

    #[test]
    fn test_packet_destination() {
        let dst = Ipv4Addr::new(198, 51, 100, 7);
        let packet = Packet::Tcp {
            destination: dst,
            source_port: 50000,
            destination_port: 22,
            sequence: 1,
            flags: TcpFlags::SYN,
        };
        assert_eq!(packet.destination(), dst);
    }
}
