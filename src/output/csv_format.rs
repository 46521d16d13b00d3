//! CSV output formatting.

use crate::scanner::ScanReport;
use std::io::{self, Write};

/// Print results in CSV format.
pub fn print_csv(report: &ScanReport) -> io::Result<()> {
    write_csv(io::stdout().lock(), report)
}

/// One row per open port.
pub fn write_csv(out: impl Write, report: &ScanReport) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["target", "ip_address", "port", "state"])?;
    let ip = report.ip_address.to_string();
    for port in &report.open_ports {
        wtr.write_record([report.target.as_str(), &ip, &port.to_string(), "open"])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Port;
    use chrono::Utc;
    use std::net::Ipv4Addr;

    #[test]
    fn test_csv_rows() {
        let report = ScanReport {
            target: "T".to_string(),
            ip_address: Ipv4Addr::new(192, 0, 2, 1),
            started_at: Utc::now(),
            duration_ms: 10,
            ports_scanned: 3,
            open_ports: vec![Port::new(21).unwrap()],
            closed_or_filtered: 2,
            errors: 0,
        };
        let mut buf = Vec::new();
        write_csv(&mut buf, &report).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "target,ip_address,port,state\nT,192.0.2.1,21,open\n"
        );
    }
}
