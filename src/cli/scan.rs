//! Scan subcommand implementation.
//!
//! Handles the `salmap scan <target>` command for port scanning.

use crate::cli::{Context, OutputFormat};
use crate::error::CliResult;
use crate::output;
use crate::scanner::{scan_with, ProbeResult, ScanOptions, ScanReport};
use crate::types::{PortSet, Target};
use clap::Parser;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Scan a target for open TCP ports.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Target to scan (IPv4 address or hostname)
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Ports to scan: "80", "22,80,443" or "1-1024" (default from settings)
    #[arg(short, long, conflicts_with = "common")]
    pub ports: Option<String>,

    /// Scan the 20 most common TCP ports
    #[arg(long)]
    pub common: bool,

    /// Maximum number of probes in flight (default from settings: 50)
    #[arg(
        short = 'w',
        long,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub workers: Option<usize>,

    /// Reply timeout per port in milliseconds (default from settings: 1000)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        // Invalid specs are rejected before anything touches the network.
        let ports: PortSet = if self.common {
            PortSet::common()
        } else {
            self.ports
                .as_deref()
                .unwrap_or(ctx.settings.default_ports.as_str())
                .parse()?
        };

        let mut options = ctx.settings.scan_options();
        if let Some(workers) = self.workers {
            options = options.with_pool_width(workers);
        }
        if let Some(timeout_ms) = self.timeout {
            options = options.with_probe_timeout(Duration::from_millis(timeout_ms));
        }

        let target = Target::resolve(&self.target).await?;
        run_port_scan(ctx, &target, &ports, &options, self.output).await?;
        Ok(())
    }
}

/// Scan `ports` on `target`, showing progress, then print the report.
pub(crate) async fn run_port_scan(
    ctx: &Context,
    target: &Target,
    ports: &PortSet,
    options: &ScanOptions,
    format: OutputFormat,
) -> CliResult<ScanReport> {
    let interactive = !ctx.quiet && format == OutputFormat::Plain;
    if interactive {
        output::print_scan_header(target, ports.len(), options.pool_width);
    }

    let progress = if interactive && Term::stdout().is_term() {
        let pb = ProgressBar::new(ports.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let report = scan_with(
        Arc::clone(&ctx.transport),
        target,
        ports,
        options,
        |result: &ProbeResult| {
            progress.inc(1);
            if !result.is_open() || format != OutputFormat::Plain {
                return;
            }
            let line = output::open_port_line(result.port);
            if progress.is_hidden() {
                println!("{line}");
            } else {
                progress.println(line);
            }
        },
    )
    .await;

    progress.finish_and_clear();
    if format == OutputFormat::Plain && report.errors > 0 && report.errors == report.ports_scanned
    {
        output::print_warning("every probe failed; check privileges and the network interface");
    }
    output::print_report(&report, format)?;
    Ok(report)
}
