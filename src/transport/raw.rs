//! Raw socket transport built on `pnet` layer-4 channels.
//!
//! Every exchange opens its own channel, so concurrent probes never share
//! a receive queue: each one sees its own copy of incoming traffic and
//! keeps only the packet that answers it (matched by remote address and
//! ports, or by ICMP identifier and sequence).
//!
//! # Privileges Required
//!
//! Raw sockets need root (or `CAP_NET_RAW` on Linux). Without them every
//! call fails with [`TransportError::PermissionDenied`].
//!
//! The kernel writes the IPv4 header. The TCP checksum covers a pseudo
//! header containing the source address, so that address is looked up per
//! destination through the routing table unless an interface was given.

use crate::error::{TransportError, TransportResult};
use crate::transport::{Packet, PacketTransport, Reply, TcpFlags};
use async_trait::async_trait;
use pnet::datalink::{self, NetworkInterface};
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::{self, MutableEchoRequestPacket};
use pnet::packet::icmp::{IcmpPacket, IcmpTypes};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::tcp::{self, MutableTcpPacket, TcpPacket};
use pnet::packet::Packet as _;
use pnet::transport::TransportChannelType::Layer4;
use pnet::transport::TransportProtocol::Ipv4;
use pnet::transport::{
    icmp_packet_iter, tcp_packet_iter, transport_channel, TransportReceiver, TransportSender,
};
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::{Duration, Instant};

const CHANNEL_BUFFER: usize = 4096;
const TCP_HEADER_LEN: usize = 20;
const ECHO_PAYLOAD_LEN: usize = 32;
const TCP_WINDOW: u16 = 1024;

/// Transport that sends real packets through raw sockets.
#[derive(Debug, Clone, Default)]
pub struct RawTransport {
    source: Option<Ipv4Addr>,
}

impl RawTransport {
    /// Pick source addresses from the routing table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the IPv4 address of the named interface as the source address.
    pub fn with_interface(name: &str) -> TransportResult<Self> {
        let interface = find_interface(name)?;
        let source = interface_ipv4(&interface)?;
        Ok(Self {
            source: Some(source),
        })
    }

    fn source_for(&self, destination: Ipv4Addr) -> TransportResult<Ipv4Addr> {
        match self.source {
            Some(source) => Ok(source),
            None => route_source(destination),
        }
    }

    async fn exchange(
        &self,
        packet: Packet,
        timeout: Option<Duration>,
    ) -> TransportResult<Option<Reply>> {
        let source = self.source_for(packet.destination())?;
        tokio::task::spawn_blocking(move || exchange_blocking(source, &packet, timeout))
            .await
            .map_err(|e| TransportError::Receive(format!("exchange task failed: {e}")))?
    }
}

#[async_trait]
impl PacketTransport for RawTransport {
    async fn send(&self, packet: Packet) -> TransportResult<()> {
        self.exchange(packet, None).await.map(|_| ())
    }

    async fn send_and_await_reply(
        &self,
        packet: Packet,
        timeout: Duration,
    ) -> TransportResult<Option<Reply>> {
        self.exchange(packet, Some(timeout)).await
    }
}

/// Send one packet and, if a timeout is given, wait for its reply.
fn exchange_blocking(
    source: Ipv4Addr,
    packet: &Packet,
    timeout: Option<Duration>,
) -> TransportResult<Option<Reply>> {
    match *packet {
        Packet::Tcp {
            destination,
            source_port,
            destination_port,
            ..
        } => {
            let (mut tx, mut rx) = open_channel(IpNextHeaderProtocols::Tcp)?;
            let segment = build_tcp_segment(source, packet)?;
            let wire = TcpPacket::new(&segment)
                .ok_or_else(|| TransportError::InvalidPacket("TCP segment too short".into()))?;
            send_to(&mut tx, wire, destination)?;

            match timeout {
                Some(timeout) => await_tcp_reply(
                    &mut rx,
                    destination,
                    destination_port,
                    source_port,
                    timeout,
                ),
                None => Ok(None),
            }
        }
        Packet::EchoRequest {
            destination,
            identifier,
            sequence,
        } => {
            let (mut tx, mut rx) = open_channel(IpNextHeaderProtocols::Icmp)?;
            let request = build_echo_request(identifier, sequence)?;
            let wire = IcmpPacket::new(&request)
                .ok_or_else(|| TransportError::InvalidPacket("ICMP packet too short".into()))?;
            send_to(&mut tx, wire, destination)?;

            match timeout {
                Some(timeout) => {
                    await_echo_reply(&mut rx, destination, identifier, sequence, timeout)
                }
                None => Ok(None),
            }
        }
    }
}

fn open_channel(
    protocol: pnet::packet::ip::IpNextHeaderProtocol,
) -> TransportResult<(TransportSender, TransportReceiver)> {
    transport_channel(CHANNEL_BUFFER, Layer4(Ipv4(protocol)))
        .map_err(|e| TransportError::from_channel_io(&e))
}

fn send_to<T: pnet::packet::Packet>(
    tx: &mut TransportSender,
    packet: T,
    destination: Ipv4Addr,
) -> TransportResult<()> {
    tx.send_to(packet, IpAddr::V4(destination))
        .map(|_| ())
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                TransportError::PermissionDenied(e.to_string())
            } else {
                TransportError::Send(e.to_string())
            }
        })
}

/// Build a bare TCP header (no options, no payload) with a valid checksum.
pub(crate) fn build_tcp_segment(source: Ipv4Addr, packet: &Packet) -> TransportResult<Vec<u8>> {
    let Packet::Tcp {
        destination,
        source_port,
        destination_port,
        sequence,
        flags,
    } = *packet
    else {
        return Err(TransportError::InvalidPacket(
            "expected a TCP packet".to_string(),
        ));
    };

    let mut buffer = vec![0u8; TCP_HEADER_LEN];
    let mut segment = MutableTcpPacket::new(&mut buffer)
        .ok_or_else(|| TransportError::InvalidPacket("Failed to create TCP packet".into()))?;

    segment.set_source(source_port);
    segment.set_destination(destination_port);
    segment.set_sequence(sequence);
    segment.set_acknowledgement(0);
    segment.set_data_offset(5);
    segment.set_reserved(0);
    segment.set_flags(flags.bits().into());
    segment.set_window(TCP_WINDOW);
    segment.set_urgent_ptr(0);

    let checksum = tcp::ipv4_checksum(&segment.to_immutable(), &source, &destination);
    segment.set_checksum(checksum);

    Ok(buffer)
}

/// Build an ICMP echo request with a random payload.
pub(crate) fn build_echo_request(identifier: u16, sequence: u16) -> TransportResult<Vec<u8>> {
    let header_len = MutableEchoRequestPacket::minimum_packet_size();
    let mut buffer = vec![0u8; header_len + ECHO_PAYLOAD_LEN];
    rand::thread_rng().fill(&mut buffer[header_len..]);

    let mut echo = MutableEchoRequestPacket::new(&mut buffer)
        .ok_or_else(|| TransportError::InvalidPacket("Failed to create ICMP packet".into()))?;
    echo.set_icmp_type(IcmpTypes::EchoRequest);
    echo.set_icmp_code(echo_request::IcmpCodes::NoCode);
    echo.set_identifier(identifier);
    echo.set_sequence_number(sequence);
    let checksum = pnet::util::checksum(echo.packet(), 1);
    echo.set_checksum(checksum);

    Ok(buffer)
}

/// Wait for the TCP segment that answers our probe.
fn await_tcp_reply(
    rx: &mut TransportReceiver,
    remote: Ipv4Addr,
    remote_port: u16,
    local_port: u16,
    timeout: Duration,
) -> TransportResult<Option<Reply>> {
    let deadline = Instant::now() + timeout;
    let mut iter = tcp_packet_iter(rx);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        match iter.next_with_timeout(remaining) {
            Ok(Some((segment, from))) => {
                if let Some(reply) = match_tcp_reply(&segment, from, remote, remote_port, local_port)
                {
                    return Ok(Some(reply));
                }
            }
            Ok(None) => return Ok(None),
            Err(e) => return Err(TransportError::Receive(e.to_string())),
        }
    }
}

/// Wait for the echo reply carrying our identifier and sequence number.
fn await_echo_reply(
    rx: &mut TransportReceiver,
    remote: Ipv4Addr,
    identifier: u16,
    sequence: u16,
    timeout: Duration,
) -> TransportResult<Option<Reply>> {
    let deadline = Instant::now() + timeout;
    let mut iter = icmp_packet_iter(rx);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        match iter.next_with_timeout(remaining) {
            Ok(Some((packet, from))) => {
                if let Some(reply) = match_echo_reply(&packet, from, remote, identifier, sequence)
                {
                    return Ok(Some(reply));
                }
            }
            Ok(None) => return Ok(None),
            Err(e) => return Err(TransportError::Receive(e.to_string())),
        }
    }
}

fn match_tcp_reply(
    segment: &TcpPacket<'_>,
    from: IpAddr,
    remote: Ipv4Addr,
    remote_port: u16,
    local_port: u16,
) -> Option<Reply> {
    if from != IpAddr::V4(remote)
        || segment.get_source() != remote_port
        || segment.get_destination() != local_port
    {
        return None;
    }

    Some(Reply::Tcp {
        source: remote,
        source_port: remote_port,
        destination_port: local_port,
        // Drops the NS bit where pnet exposes nine flag bits.
        flags: TcpFlags::from_bits(segment.get_flags() as u8),
    })
}

fn match_echo_reply(
    packet: &IcmpPacket<'_>,
    from: IpAddr,
    remote: Ipv4Addr,
    identifier: u16,
    sequence: u16,
) -> Option<Reply> {
    if from != IpAddr::V4(remote) || packet.get_icmp_type() != IcmpTypes::EchoReply {
        return None;
    }
    let echo = EchoReplyPacket::new(packet.packet())?;
    if echo.get_identifier() != identifier || echo.get_sequence_number() != sequence {
        return None;
    }

    Some(Reply::Icmp {
        source: remote,
        icmp_type: packet.get_icmp_type().0,
    })
}

/// Ask the routing table which local address would reach `destination`.
///
/// Connecting a UDP socket sends nothing; it only binds a route.
fn route_source(destination: Ipv4Addr) -> TransportResult<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|e| TransportError::SourceAddress(e.to_string()))?;
    socket
        .connect((destination, 9))
        .map_err(|e| TransportError::SourceAddress(format!("no route to {destination}: {e}")))?;

    match socket.local_addr() {
        Ok(addr) => match addr.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
            other => Err(TransportError::SourceAddress(format!(
                "route to {destination} uses unusable address {other}"
            ))),
        },
        Err(e) => Err(TransportError::SourceAddress(e.to_string())),
    }
}

/// Find a network interface by name.
fn find_interface(name: &str) -> TransportResult<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| TransportError::InterfaceNotFound(name.to_string()))
}

/// Get the IPv4 address of an interface.
fn interface_ipv4(interface: &NetworkInterface) -> TransportResult<Ipv4Addr> {
    interface
        .ips
        .iter()
        .find_map(|ip| match ip.ip() {
            IpAddr::V4(addr) => Some(addr),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| {
            TransportError::SourceAddress(format!(
                "interface {} has no IPv4 address",
                interface.name
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);
    const TARGET: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 20);

    fn syn(source_port: u16, destination_port: u16) -> Packet {
        Packet::Tcp {
            destination: TARGET,
            source_port,
            destination_port,
            sequence: 0xdead_beef,
            flags: TcpFlags::SYN,
        }
    }

    #[test]
    fn test_build_syn_segment() {
        let buffer = build_tcp_segment(SOURCE, &syn(50123, 443)).unwrap();
        let segment = TcpPacket::new(&buffer).unwrap();

        assert_eq!(segment.get_source(), 50123);
        assert_eq!(segment.get_destination(), 443);
        assert_eq!(segment.get_sequence(), 0xdead_beef);
        assert_eq!(segment.get_data_offset(), 5);
        assert_eq!(
            u16::from(segment.get_flags()),
            u16::from(TcpFlags::SYN.bits())
        );
        assert_eq!(
            segment.get_checksum(),
            tcp::ipv4_checksum(&segment, &SOURCE, &TARGET)
        );
    }

    #[test]
    fn test_build_segment_rejects_echo() {
        let echo = Packet::EchoRequest {
            destination: TARGET,
            identifier: 1,
            sequence: 1,
        };
        assert!(build_tcp_segment(SOURCE, &echo).is_err());
    }

    #[test]
    fn test_build_echo_request() {
        let buffer = build_echo_request(0x1234, 7).unwrap();
        let echo = echo_request::EchoRequestPacket::new(&buffer).unwrap();

        assert_eq!(echo.get_icmp_type(), IcmpTypes::EchoRequest);
        assert_eq!(echo.get_identifier(), 0x1234);
        assert_eq!(echo.get_sequence_number(), 7);
        assert_eq!(echo.get_checksum(), pnet::util::checksum(&buffer, 1));
    }

    #[test]
    fn test_match_tcp_reply_requires_our_ports() {
        // A SYN/ACK from the target: its source is the probed port.
        let mut buffer = build_tcp_segment(TARGET, &syn(443, 50123)).unwrap();
        {
            let mut segment = MutableTcpPacket::new(&mut buffer).unwrap();
            segment.set_flags(TcpFlags::SYN_ACK.bits().into());
        }
        let segment = TcpPacket::new(&buffer).unwrap();

        let reply = match_tcp_reply(&segment, IpAddr::V4(TARGET), TARGET, 443, 50123);
        assert_eq!(
            reply,
            Some(Reply::Tcp {
                source: TARGET,
                source_port: 443,
                destination_port: 50123,
                flags: TcpFlags::SYN_ACK,
            })
        );

        assert!(match_tcp_reply(&segment, IpAddr::V4(TARGET), TARGET, 443, 50124).is_none());
        assert!(match_tcp_reply(&segment, IpAddr::V4(TARGET), TARGET, 80, 50123).is_none());
        assert!(match_tcp_reply(&segment, IpAddr::V4(SOURCE), TARGET, 443, 50123).is_none());
    }

    #[test]
    fn test_match_echo_reply_requires_identifier() {
        let mut buffer = build_echo_request(42, 3).unwrap();
        buffer[0] = IcmpTypes::EchoReply.0;
        let packet = IcmpPacket::new(&buffer).unwrap();

        assert!(match_echo_reply(&packet, IpAddr::V4(TARGET), TARGET, 42, 3).is_some());
        assert!(match_echo_reply(&packet, IpAddr::V4(TARGET), TARGET, 43, 3).is_none());
        assert!(match_echo_reply(&packet, IpAddr::V4(SOURCE), TARGET, 42, 3).is_none());

        // Our own request echoed back by a loopback socket is not a reply.
        let request = build_echo_request(42, 3).unwrap();
        let packet = IcmpPacket::new(&request).unwrap();
        assert!(match_echo_reply(&packet, IpAddr::V4(TARGET), TARGET, 42, 3).is_none());
    }

    #[test]
    fn test_route_source_for_loopback() {
        assert_eq!(
            route_source(Ipv4Addr::LOCALHOST).unwrap(),
            Ipv4Addr::LOCALHOST
        );
    }

    #[test]
    fn test_unknown_interface() {
        let result = RawTransport::with_interface("definitely-not-an-interface0");
        assert!(matches!(result, Err(TransportError::InterfaceNotFound(_))));
    }
}
