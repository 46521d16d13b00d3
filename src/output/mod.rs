//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of scan results.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::{print_csv, write_csv};
pub use json_format::{print_json, print_liveness_json, LivenessRecord};
pub use plain::{
    open_port_line, print_error, print_info, print_liveness, print_plain, print_scan_header,
    print_warning, write_liveness, write_plain,
};

use crate::cli::OutputFormat;
use crate::scanner::{Liveness, ScanReport};
use crate::types::Target;
use std::io;

/// Format and print scan results according to the specified format.
pub fn print_report(report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => print_plain(report),
        OutputFormat::Json => print_json(report),
        OutputFormat::Csv => print_csv(report),
    }
}

/// Print a liveness result. CSV has no liveness form and falls back to plain.
pub fn print_liveness_result(
    target: &Target,
    liveness: &Liveness,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => print_liveness_json(target, liveness),
        OutputFormat::Plain | OutputFormat::Csv => print_liveness(target, liveness),
    }
}
