//! Scan coordination with bounded concurrency.
//!
//! One worker task is spawned per port. A semaphore caps how many of them
//! may be talking to the network at once. Workers hand their verdicts back
//! through a `JoinSet`; only the coordinator touches the session, so no
//! lock is ever held while a probe waits for a reply.

use crate::scanner::probe::probe_port;
use crate::scanner::{ProbeResult, ProbeVerdict, ScanOptions};
use crate::transport::SharedTransport;
use crate::types::{Port, PortSet, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Complete scan results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub target: String,
    pub ip_address: Ipv4Addr,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub ports_scanned: usize,
    /// Open ports in ascending order.
    pub open_ports: Vec<Port>,
    pub closed_or_filtered: usize,
    pub errors: usize,
}

/// Mutable state of one scan, owned by the coordinator for its duration.
struct ScanSession {
    started_at: DateTime<Utc>,
    clock: Instant,
    open: Vec<Port>,
    closed_or_filtered: usize,
    errors: usize,
}

impl ScanSession {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            clock: Instant::now(),
            open: Vec::new(),
            closed_or_filtered: 0,
            errors: 0,
        }
    }

    fn record(&mut self, result: &ProbeResult) {
        match result.verdict {
            ProbeVerdict::Open => self.open.push(result.port),
            ProbeVerdict::ClosedOrFiltered => self.closed_or_filtered += 1,
            ProbeVerdict::Error(_) => self.errors += 1,
        }
    }

    fn finish(mut self, target: &Target, ports_scanned: usize) -> ScanReport {
        self.open.sort_unstable();
        ScanReport {
            target: target.original.clone(),
            ip_address: target.ip,
            started_at: self.started_at,
            duration_ms: self.clock.elapsed().as_millis() as u64,
            ports_scanned,
            open_ports: self.open,
            closed_or_filtered: self.closed_or_filtered,
            errors: self.errors,
        }
    }
}

/// Scan every port in `ports` and return once all probes have finished.
pub async fn scan(
    transport: SharedTransport,
    target: &Target,
    ports: &PortSet,
    options: &ScanOptions,
) -> ScanReport {
    scan_with(transport, target, ports, options, |_| {}).await
}

/// Like [`scan`], calling `on_result` as each probe completes.
///
/// Results arrive in completion order, not port order. The report itself is
/// only available after the last probe has reported.
pub async fn scan_with<F>(
    transport: SharedTransport,
    target: &Target,
    ports: &PortSet,
    options: &ScanOptions,
    mut on_result: F,
) -> ScanReport
where
    F: FnMut(&ProbeResult),
{
    let mut session = ScanSession::start();
    let pool_width = options.pool_width.max(1);
    info!(
        target = %target,
        ports = ports.len(),
        pool_width,
        timeout = ?options.probe_timeout,
        "starting SYN scan"
    );

    let permits = Arc::new(Semaphore::new(pool_width));
    let mut workers = JoinSet::new();

    for port in ports.iter() {
        let transport = Arc::clone(&transport);
        let permits = Arc::clone(&permits);
        let ip = target.ip;
        let timeout = options.probe_timeout;

        workers.spawn(async move {
            // The semaphore is never closed, so acquiring cannot fail.
            let _permit = permits.acquire_owned().await;
            probe_port(&*transport, ip, port, timeout).await
        });
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(result) => {
                on_result(&result);
                session.record(&result);
            }
            Err(e) => {
                warn!(target = %target, error = %e, "probe worker did not finish");
                session.errors += 1;
            }
        }
    }

    let report = session.finish(target, ports.len());
    info!(
        target = %target,
        open = report.open_ports.len(),
        errors = report.errors,
        duration_ms = report.duration_ms,
        "scan complete"
    );
    report
}
