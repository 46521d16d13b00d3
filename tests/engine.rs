//! Scan engine tests against an in-memory network.

use async_trait::async_trait;
use salmap::error::{TransportError, TransportResult};
use salmap::scanner::{probe_liveness, scan, scan_with, ScanOptions};
use salmap::transport::{Packet, PacketTransport, Reply, SharedTransport, TcpFlags};
use salmap::types::{Port, PortSet, Target};
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::block_on;

const HOST_A: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
const HOST_B: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

/// Answers SYNs for listed open ports with SYN+ACK, everything else with
/// RST+ACK, and echo requests only from live hosts.
#[derive(Default)]
struct FakeNetwork {
    open: HashMap<Ipv4Addr, HashSet<u16>>,
    alive: HashSet<Ipv4Addr>,
    failing: HashSet<u16>,
    delay: Option<fn(u16) -> Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    resets: Mutex<Vec<(Ipv4Addr, u16)>>,
}

impl FakeNetwork {
    fn with_open(mut self, host: Ipv4Addr, ports: &[u16]) -> Self {
        self.open.entry(host).or_default().extend(ports);
        self
    }

    fn with_alive(mut self, host: Ipv4Addr) -> Self {
        self.alive.insert(host);
        self
    }

    fn with_delay(mut self, delay: fn(u16) -> Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_failing(mut self, port: u16) -> Self {
        self.failing.insert(port);
        self
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PacketTransport for FakeNetwork {
    async fn send(&self, packet: Packet) -> TransportResult<()> {
        if let Packet::Tcp {
            destination,
            destination_port,
            flags,
            ..
        } = packet
        {
            if flags.contains(TcpFlags::RST) {
                self.resets
                    .lock()
                    .unwrap()
                    .push((destination, destination_port));
            }
        }
        Ok(())
    }

    async fn send_and_await_reply(
        &self,
        packet: Packet,
        timeout: Duration,
    ) -> TransportResult<Option<Reply>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let reply = match packet {
            Packet::EchoRequest { destination, .. } => {
                if self.alive.contains(&destination) {
                    Ok(Some(Reply::Icmp {
                        source: destination,
                        icmp_type: 0,
                    }))
                } else {
                    tokio::time::sleep(timeout).await;
                    Ok(None)
                }
            }
            Packet::Tcp {
                destination,
                source_port,
                destination_port,
                ..
            } => {
                let pause = self
                    .delay
                    .map(|delay| delay(destination_port))
                    .unwrap_or(Duration::from_millis(1));
                tokio::time::sleep(pause).await;

                if self.failing.contains(&destination_port) {
                    Err(TransportError::Send("network unreachable".into()))
                } else {
                    let is_open = self
                        .open
                        .get(&destination)
                        .is_some_and(|ports| ports.contains(&destination_port));
                    let flags = if is_open {
                        TcpFlags::SYN_ACK
                    } else {
                        TcpFlags::RST | TcpFlags::ACK
                    };
                    Ok(Some(Reply::Tcp {
                        source: destination,
                        source_port: destination_port,
                        destination_port: source_port,
                        flags,
                    }))
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

fn ports(spec: &str) -> PortSet {
    spec.parse().unwrap()
}

fn port(n: u16) -> Port {
    Port::new(n).unwrap()
}

fn options(pool_width: usize) -> ScanOptions {
    ScanOptions::default()
        .with_pool_width(pool_width)
        .with_probe_timeout(Duration::from_millis(200))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_open_port_in_range() {
    let network = Arc::new(FakeNetwork::default().with_open(HOST_A, &[21]));
    let transport: SharedTransport = network.clone();
    let target = Target::new("T", HOST_A);

    let report = scan(transport, &target, &ports("20-22"), &options(50)).await;

    assert_eq!(report.target, "T");
    assert_eq!(report.ports_scanned, 3);
    assert_eq!(report.open_ports, vec![port(21)]);
    assert_eq!(report.closed_or_filtered, 2);
    assert_eq!(report.errors, 0);
    assert_eq!(*network.resets.lock().unwrap(), vec![(HOST_A, 21)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_narrower_than_port_count() {
    let open: Vec<u16> = (1..=200).filter(|p| p % 7 == 0).collect();
    let network = Arc::new(
        FakeNetwork::default()
            .with_open(HOST_A, &open)
            .with_delay(|_| Duration::from_millis(2)),
    );
    let transport: SharedTransport = network.clone();
    let target = Target::new("10.0.0.1", HOST_A);

    let report = scan(transport, &target, &ports("1-200"), &options(8)).await;

    let expected: Vec<Port> = open.iter().copied().map(port).collect();
    assert_eq!(report.open_ports, expected);
    assert_eq!(report.ports_scanned, 200);
    assert_eq!(report.closed_or_filtered + report.open_ports.len(), 200);
    assert!(network.peak() <= 8, "peak in flight was {}", network.peak());
    assert!(network.peak() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_result_arrives_before_return() {
    // Later ports answer sooner, so completion order is the reverse of
    // submission order.
    let network = Arc::new(
        FakeNetwork::default()
            .with_open(HOST_A, &[1, 5, 10])
            .with_delay(|p| Duration::from_millis(u64::from(11 - p) * 5)),
    );
    let transport: SharedTransport = network;
    let target = Target::new("10.0.0.1", HOST_A);
    let mut seen = Vec::new();

    let report = scan_with(transport, &target, &ports("1-10"), &options(10), |result| {
        seen.push(result.port.as_u16());
    })
    .await;

    assert_eq!(seen.len(), 10);
    let mut sorted = seen.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (1..=10).collect::<Vec<_>>());
    assert_eq!(report.open_ports, vec![port(1), port(5), port(10)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_ports_probed_once() {
    let network = Arc::new(FakeNetwork::default().with_open(HOST_A, &[80]));
    let transport: SharedTransport = network;
    let target = Target::new("10.0.0.1", HOST_A);

    let report = scan(transport, &target, &ports("80,80,80,443"), &options(4)).await;

    assert_eq!(report.ports_scanned, 2);
    assert_eq!(report.open_ports, vec![port(80)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_probe_errors_do_not_abort_scan() {
    let network = Arc::new(
        FakeNetwork::default()
            .with_open(HOST_A, &[22, 443])
            .with_failing(80),
    );
    let transport: SharedTransport = network;
    let target = Target::new("10.0.0.1", HOST_A);

    let report = scan(transport, &target, &ports("22,80,443"), &options(2)).await;

    assert_eq!(report.open_ports, vec![port(22), port(443)]);
    assert_eq!(report.errors, 1);
    assert_eq!(report.closed_or_filtered, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_pool_width_runs_one_at_a_time() {
    let network = Arc::new(
        FakeNetwork::default()
            .with_open(HOST_A, &[3])
            .with_delay(|_| Duration::from_millis(2)),
    );
    let transport: SharedTransport = network.clone();
    let target = Target::new("10.0.0.1", HOST_A);
    let set = ports("1-6");

    let report = scan(transport, &target, &set, &options(0)).await;

    assert_eq!(report.open_ports, vec![port(3)]);
    assert_eq!(report.ports_scanned, 6);
    assert_eq!(network.peak(), 1);
}

#[test]
fn test_empty_port_set_is_empty_report() {
    let network = Arc::new(FakeNetwork::default().with_open(HOST_A, &[80]));
    let transport: SharedTransport = network.clone();
    let target = Target::new("10.0.0.1", HOST_A);

    let report = block_on(scan(transport, &target, &PortSet::new(), &options(50)));

    assert!(report.open_ports.is_empty());
    assert_eq!(report.ports_scanned, 0);
    assert_eq!(network.peak(), 0);
}

#[tokio::test]
async fn test_silent_host_is_not_alive() {
    let network = FakeNetwork::default();
    assert!(!probe_liveness(&network, HOST_A, Duration::from_millis(50)).await);
}

#[tokio::test]
async fn test_answering_host_is_alive() {
    let network = FakeNetwork::default().with_alive(HOST_A);
    assert!(probe_liveness(&network, HOST_A, Duration::from_millis(50)).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ping_and_scan_run_side_by_side() {
    let network = Arc::new(
        FakeNetwork::default()
            .with_alive(HOST_A)
            .with_open(HOST_B, &[443]),
    );
    let transport: SharedTransport = network;
    let scan_target = Target::new("10.0.0.2", HOST_B);
    let ping_transport = Arc::clone(&transport);
    let set = ports("440-445");
    let opts = options(3);

    let (alive, report) = tokio::join!(
        async move { probe_liveness(&*ping_transport, HOST_A, Duration::from_millis(100)).await },
        scan(transport, &scan_target, &set, &opts),
    );

    assert!(alive);
    assert_eq!(report.open_ports, vec![port(443)]);
    assert_eq!(report.ports_scanned, 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_keep_separate_results() {
    let network = Arc::new(
        FakeNetwork::default()
            .with_open(HOST_A, &[22])
            .with_open(HOST_B, &[80]),
    );
    let transport: SharedTransport = network;
    let a = Target::new("10.0.0.1", HOST_A);
    let b = Target::new("10.0.0.2", HOST_B);
    let set = ports("20-90");
    let opts = options(5);

    let (report_a, report_b) = tokio::join!(
        scan(Arc::clone(&transport), &a, &set, &opts),
        scan(Arc::clone(&transport), &b, &set, &opts),
    );

    assert_eq!(report_a.open_ports, vec![port(22)]);
    assert_eq!(report_b.open_ports, vec![port(80)]);
}
