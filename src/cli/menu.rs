//! Interactive menu.
//!
//! Keeps one current target and offers ping, a common-ports scan and a
//! custom scan against it. A failed action is reported and the menu comes
//! back; only "Exit" or end of input leaves the loop.

use crate::cli::ping::ping_target;
use crate::cli::scan::run_port_scan;
use crate::cli::{Context, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::types::{PortSet, Target};
use clap::Parser;
use console::{style, Term};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Interactive menu.
#[derive(Parser, Debug, Default)]
pub struct MenuCommand {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    SetTarget,
    Ping,
    ScanCommon,
    ScanCustom,
    Exit,
}

impl MenuChoice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::SetTarget),
            "2" => Some(Self::Ping),
            "3" => Some(Self::ScanCommon),
            "4" => Some(Self::ScanCustom),
            "9" => Some(Self::Exit),
            _ => None,
        }
    }

    fn needs_target(self) -> bool {
        matches!(self, Self::Ping | Self::ScanCommon | Self::ScanCustom)
    }

    /// Whether to wait for Enter before the screen is cleared again.
    fn pauses_after(self, failed: bool) -> bool {
        failed || self.needs_target()
    }
}

impl MenuCommand {
    /// Run the menu loop.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let term = Term::stdout();
        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let mut target: Option<Target> = None;

        loop {
            if term.is_term() {
                term.clear_screen()?;
            }
            render_menu(&term, target.as_ref())?;

            let Some(line) = prompt(&term, &mut input, "Enter your choice: ").await? else {
                return Ok(());
            };
            let Some(choice) = MenuChoice::parse(&line) else {
                output::print_error("Invalid choice. Please try again.");
                if !pause(&term, &mut input).await? {
                    return Ok(());
                }
                continue;
            };

            if choice == MenuChoice::Exit {
                term.write_line(
                    &style("Thank you for using salmap ethically. Goodbye!")
                        .blue()
                        .to_string(),
                )?;
                return Ok(());
            }

            let outcome = match (choice, target.as_ref()) {
                (MenuChoice::SetTarget, _) => {
                    let Some(host) =
                        prompt(&term, &mut input, "Enter target IP or domain: ").await?
                    else {
                        return Ok(());
                    };
                    Target::resolve(&host)
                        .await
                        .map(|resolved| target = Some(resolved))
                        .map_err(CliError::from)
                }
                (_, None) => Err(CliError::Other("Please set a target first.".to_string())),
                (MenuChoice::Ping, Some(current)) => {
                    ping_target(ctx, current, ctx.settings.liveness_timeout(), OutputFormat::Plain)
                        .await
                        .map(|_| ())
                }
                (MenuChoice::ScanCommon, Some(current)) => {
                    scan_ports(ctx, current, &PortSet::common()).await
                }
                (MenuChoice::ScanCustom, Some(current)) => {
                    let Some(spec) = prompt(
                        &term,
                        &mut input,
                        "Enter port range (e.g., 1-1024 or 80,443): ",
                    )
                    .await?
                    else {
                        return Ok(());
                    };
                    match spec.parse::<PortSet>() {
                        Ok(ports) => scan_ports(ctx, current, &ports).await,
                        Err(e) => Err(e.into()),
                    }
                }
                (MenuChoice::Exit, Some(_)) => Ok(()),
            };

            let failed = outcome.is_err();
            if let Err(e) = outcome {
                output::print_error(&e.to_string());
            }

            if choice.pauses_after(failed) && !pause(&term, &mut input).await? {
                return Ok(());
            }
        }
    }
}

async fn scan_ports(ctx: &Context, target: &Target, ports: &PortSet) -> CliResult<()> {
    let options = ctx.settings.scan_options();
    run_port_scan(ctx, target, ports, &options, OutputFormat::Plain).await?;
    Ok(())
}

fn render_menu(term: &Term, target: Option<&Target>) -> CliResult<()> {
    term.write_line(&style("salmap - Main Menu").cyan().to_string())?;
    term.write_line("--------------------")?;
    match target {
        Some(target) => term.write_line(
            &style(format!("Current Target: {target}\n"))
                .green()
                .to_string(),
        )?,
        None => term.write_line(&style("No target set.\n").yellow().to_string())?,
    }
    term.write_line("1. Set Target (IP or Domain)")?;
    term.write_line("2. Check if Host is Online (Ping)")?;
    term.write_line("3. Scan Top 20 Common Ports")?;
    term.write_line("4. Scan Custom Port Range (e.g., 1-1000)")?;
    term.write_line("")?;
    term.write_line("9. Exit")?;
    term.write_line("--------------------")?;
    Ok(())
}

/// Ask a question and read one line; `None` at end of input.
async fn prompt(
    term: &Term,
    input: &mut Lines<BufReader<Stdin>>,
    question: &str,
) -> CliResult<Option<String>> {
    term.write_str(&style(question).cyan().to_string())?;
    term.flush()?;
    Ok(input.next_line().await?)
}

/// Hold the screen until Enter; false at end of input.
async fn pause(term: &Term, input: &mut Lines<BufReader<Stdin>>) -> CliResult<bool> {
    Ok(prompt(term, input, "Press Enter to return to the menu...")
        .await?
        .is_some())
}
