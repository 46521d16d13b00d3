use clap::Parser;
use salmap::cli::{self, Cli};
use salmap::error::CliError;
use salmap::output;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli::run(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(CliError::DisclaimerDeclined) => {
            println!("Agreement not given. Exiting.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            output::print_error(&e.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Diagnostics go to stderr so they never mix with JSON or CSV output.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("SALMAP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}
