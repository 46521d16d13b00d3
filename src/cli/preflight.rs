//! Checks that run before any packet is sent: the usage agreement and
//! root privileges.

use crate::error::{CliError, CliResult};
use console::{style, Term};

const BANNER: &str = r"
   ███████╗ █████╗ ██╗     ███╗   ███╗ █████╗ ██████╗
   ██╔════╝██╔══██╗██║     ████╗ ████║██╔══██╗██╔══██╗
   ███████╗███████║██║     ██╔████╔██║███████║██████╔╝
   ╚════██║██╔══██║██║     ██║╚██╔╝██║██╔══██║██╔═══╝
   ███████║██║  ██║███████╗██║ ╚═╝ ██║██║  ██║██║
   ╚══════╝╚═╝  ╚═╝╚══════╝╚═╝     ╚═╝╚═╝  ╚═╝╚═╝
";

/// Show the banner and usage agreement; succeed only on an explicit "yes".
pub(crate) fn confirm_disclaimer() -> CliResult<()> {
    let term = Term::stdout();
    let rule = style("=".repeat(60)).red();

    term.write_line(&style(BANNER).cyan().to_string())?;
    term.write_line(&format!(
        "       {}",
        style("An Ethical Network Scanner").yellow()
    ))?;
    term.write_line(&rule.to_string())?;
    term.write_line(&format!(
        "{:^60}",
        style("*** LEGAL & ETHICAL USE DISCLAIMER ***").yellow()
    ))?;
    term.write_line(&rule.to_string())?;
    term.write_line("1. This tool is intended for ethical and authorized security auditing.")?;
    term.write_line("2. You must have explicit, written permission from the network")?;
    term.write_line("   owner before scanning any system.")?;
    term.write_line("3. Unauthorized scanning is illegal. The authors are not responsible")?;
    term.write_line("   for any misuse or damage caused by this tool.")?;
    term.write_line("")?;
    term.write_str(
        &style("Do you agree to use this tool ethically and legally? (yes/no): ")
            .cyan()
            .to_string(),
    )?;

    let answer = term.read_line()?;
    if accepts(&answer) {
        Ok(())
    } else {
        Err(CliError::DisclaimerDeclined)
    }
}

/// Only the full word "yes" counts as agreement.
fn accepts(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Fail unless running as root, naming the command to re-run with sudo.
pub(crate) fn ensure_root(command: &str) -> CliResult<()> {
    if is_root() {
        Ok(())
    } else {
        Err(CliError::InsufficientPrivileges(command.to_string()))
    }
}

/// Check if running with root privileges.
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
