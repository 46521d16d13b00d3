//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{Liveness, ScanReport};
use crate::types::{Port, Target};
use console::style;
use std::io::{self, Write};

const RULE: &str = "════════════════════════════════════════════════════════════";

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &Target, ports: usize, pool_width: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("salmap").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Scan type: {}", style("•").dim(), style("TCP SYN").yellow());
    println!("{} Target: {}", style("•").dim(), style(target).white().bold());
    println!(
        "{} Scanning {} ports with {} workers...",
        style("•").dim(),
        style(ports).white().bold(),
        pool_width
    );
    println!();
}

/// Line announcing an open port as soon as it is found.
pub fn open_port_line(port: Port) -> String {
    format!("{} Port {} is open", style("[+]").green().bold(), port)
}

/// Print results in human-readable plain text format.
pub fn print_plain(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    write_plain(&mut stdout.lock(), report)
}

/// Render a scan report.
pub fn write_plain(out: &mut impl Write, report: &ScanReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "  {} {}", style("Target:").bold(), report.target)?;
    writeln!(out, "  {} {}", style("IP Address:").bold(), report.ip_address)?;
    writeln!(
        out,
        "  {} {} ports scanned in {:.2}s",
        style("Statistics:").bold(),
        report.ports_scanned,
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "               {} open, {} closed|filtered, {} errors",
        style(report.open_ports.len()).green().bold(),
        style(report.closed_or_filtered).red(),
        style(report.errors).yellow()
    )?;
    writeln!(out)?;

    if report.open_ports.is_empty() {
        writeln!(
            out,
            "  {}",
            style("No open TCP ports found in the specified range.").yellow()
        )?;
    } else {
        let ports: Vec<String> = report.open_ports.iter().map(Port::to_string).collect();
        writeln!(
            out,
            "  {} {}",
            style("Open ports found:").cyan().bold(),
            ports.join(", ")
        )?;
    }

    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;
    Ok(())
}

/// Print the outcome of a liveness check.
pub fn print_liveness(target: &Target, liveness: &Liveness) -> io::Result<()> {
    let stdout = io::stdout();
    write_liveness(&mut stdout.lock(), target, liveness)
}

/// Render the outcome of a liveness check.
pub fn write_liveness(out: &mut impl Write, target: &Target, liveness: &Liveness) -> io::Result<()> {
    match liveness {
        Liveness::Up { rtt } => writeln!(
            out,
            "{} Host {} is up ({:.1} ms)",
            style("[+]").green().bold(),
            target,
            rtt.as_micros() as f64 / 1000.0
        ),
        Liveness::Down => writeln!(
            out,
            "{} Host {} appears to be down or is not responding to pings.",
            style("[-]").red().bold(),
            target
        ),
        Liveness::Error(e) => writeln!(
            out,
            "{} Ping to {} failed: {}",
            style("[!]").red().bold(),
            target,
            e
        ),
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("[*]").yellow().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use chrono::Utc;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn report(open: &[u16]) -> ScanReport {
        ScanReport {
            target: "host.lan".to_string(),
            ip_address: Ipv4Addr::new(10, 1, 2, 3),
            started_at: Utc::now(),
            duration_ms: 1500,
            ports_scanned: 3,
            open_ports: open.iter().filter_map(|&p| Port::new(p)).collect(),
            closed_or_filtered: 3 - open.len(),
            errors: 0,
        }
    }

    fn render(report: &ScanReport) -> String {
        let mut buf = Vec::new();
        write_plain(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_lists_open_ports() {
        let text = render(&report(&[21, 443]));
        assert!(text.contains("host.lan"));
        assert!(text.contains("21, 443"));
        assert!(text.contains("1.50s"));
    }

    #[test]
    fn test_plain_reports_nothing_open() {
        let text = render(&report(&[]));
        assert!(text.contains("No open TCP ports found"));
    }

    #[test]
    fn test_liveness_lines() {
        let target = Target::new("10.0.0.9", Ipv4Addr::new(10, 0, 0, 9));
        let mut buf = Vec::new();
        write_liveness(&mut buf, &target, &Liveness::Up { rtt: Duration::from_millis(12) })
            .unwrap();
        write_liveness(&mut buf, &target, &Liveness::Down).unwrap();
        write_liveness(
            &mut buf,
            &target,
            &Liveness::Error(TransportError::PermissionDenied("not root".into())),
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("is up (12.0 ms)"));
        assert!(text.contains("appears to be down"));
        assert!(text.contains("not root"));
    }
}
