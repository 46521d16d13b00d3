//! CLI subcommand definitions and handlers.
//!
//! - `salmap ping <target>` - Check whether a host answers ICMP echo
//! - `salmap scan <target>` - SYN scan a set of ports
//! - `salmap menu` - Interactive menu (the default)

mod menu;
mod ping;
mod preflight;
mod scan;

pub use menu::MenuCommand;
pub use ping::PingCommand;
pub use preflight::is_root;
pub use scan::ScanCommand;

use crate::config::Settings;
use crate::error::CliResult;
use crate::transport::{RawTransport, SharedTransport};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// salmap - an ethical network scanner.
///
/// Checks whether a host answers ICMP echo requests and finds open TCP
/// ports with half-open SYN probes. Raw sockets require root.
#[derive(Parser, Debug)]
#[command(name = "salmap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "ICMP liveness checks and concurrent TCP SYN port scans", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (defaults to the interactive menu)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Accept the usage agreement without prompting
    #[arg(short = 'y', long = "yes", global = true)]
    pub accept_disclaimer: bool,

    /// Network interface whose address is used as the probe source
    #[arg(short = 'i', long, global = true, value_name = "NAME")]
    pub interface: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check if a host is online with one ICMP echo request
    #[command(alias = "p")]
    Ping(PingCommand),

    /// Scan a target for open TCP ports
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Interactive menu
    #[command(alias = "m")]
    Menu(MenuCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Ping(_) => "ping",
            Self::Scan(_) => "scan",
            Self::Menu(_) => "menu",
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Everything a command handler needs once preflight checks have passed.
pub struct Context {
    pub settings: Settings,
    pub transport: SharedTransport,
    pub quiet: bool,
}

/// Run the parsed command line.
pub async fn run(cli: Cli) -> CliResult<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.interface.is_some() {
        settings.interface = cli.interface.clone();
    }

    let command = cli
        .command
        .unwrap_or(Commands::Menu(MenuCommand::default()));

    if !cli.accept_disclaimer {
        preflight::confirm_disclaimer()?;
    }
    preflight::ensure_root(command.name())?;

    let transport: SharedTransport = match settings.interface.as_deref() {
        Some(name) => Arc::new(RawTransport::with_interface(name)?),
        None => Arc::new(RawTransport::new()),
    };

    let ctx = Context {
        settings,
        transport,
        quiet: cli.quiet,
    };

    match command {
        Commands::Ping(cmd) => cmd.execute(&ctx).await,
        Commands::Scan(cmd) => cmd.execute(&ctx).await,
        Commands::Menu(cmd) => cmd.execute(&ctx).await,
    }
}
