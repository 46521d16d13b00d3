//! Ping subcommand implementation.

use crate::cli::{Context, OutputFormat};
use crate::error::CliResult;
use crate::output;
use crate::scanner::{check_liveness, Liveness};
use crate::types::Target;
use clap::Parser;
use std::time::Duration;

/// Check if a host is online with one ICMP echo request.
#[derive(Parser, Debug)]
pub struct PingCommand {
    /// Target IPv4 address or hostname
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Reply timeout in milliseconds (default from settings: 2000)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Output format for the result
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,
}

impl PingCommand {
    /// Execute the ping command.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let target = Target::resolve(&self.target).await?;
        let timeout = self
            .timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| ctx.settings.liveness_timeout());

        ping_target(ctx, &target, timeout, self.output).await?;
        Ok(())
    }
}

/// Ping a resolved target and print the outcome.
pub(crate) async fn ping_target(
    ctx: &Context,
    target: &Target,
    timeout: Duration,
    format: OutputFormat,
) -> CliResult<Liveness> {
    if !ctx.quiet && format == OutputFormat::Plain {
        output::print_info(&format!("Pinging {target} to check its status..."));
    }

    let liveness = check_liveness(&*ctx.transport, target.ip, timeout).await;
    output::print_liveness_result(target, &liveness, format)?;
    Ok(liveness)
}
