//! Pure formatting functions for UI output.
//!
//! Messages meant for the user go through here. Diagnostics go to stderr;
//! reports are written to the `out` handle the workflows are given.

use crate::domain::{CheckLevel, CheckResult};
use crate::workflow::warning::BumpWarning;
use console::{style, StyledObject};
use std::io::{self, Write};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("error:").red().bold(), message);
}

/// Format and print a warning message in yellow.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("warning:").yellow().bold(), message);
}

/// Display a bump warning to the user.
pub fn display_bump_warning(warning: &BumpWarning) {
    display_warning(&warning.to_string());
}

/// Format and print a success message with green checkmark.
pub fn display_success(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", style("✓").green(), message)
}

/// Format and print a status message with yellow arrow.
pub fn display_status(out: &mut dyn Write, message: &str) -> io::Result<()> {
    writeln!(out, "{} {}", style("→").yellow(), message)
}

fn styled_level(level: CheckLevel) -> StyledObject<&'static str> {
    let name = match level {
        CheckLevel::Info => "INFO",
        CheckLevel::Warning => "WARNING",
        CheckLevel::Error => "ERROR",
    };
    match level {
        CheckLevel::Info => style(name).cyan(),
        CheckLevel::Warning => style(name).yellow(),
        CheckLevel::Error => style(name).red(),
    }
}

/// `LEVEL (subject): message`
pub fn format_check(check: &CheckResult) -> String {
    format!(
        "{} ({}): {}",
        styled_level(check.level),
        style(&check.on).yellow(),
        check.message
    )
}

/// Print every check, one per line, with `prefix` in front
pub fn display_checks(out: &mut dyn Write, checks: &[CheckResult], prefix: &str) -> io::Result<()> {
    for check in checks {
        writeln!(out, "{}{}", prefix, format_check(check))?;
    }
    Ok(())
}

/// Print `name` right-aligned to `width` followed by `message`
pub fn display_aligned(out: &mut dyn Write, name: &str, width: usize, message: &str) -> io::Result<()> {
    writeln!(
        out,
        "{}{} {}",
        " ".repeat(width.saturating_sub(name.len())),
        style(name).yellow(),
        message
    )
}

/// Show a version change for one file
pub fn display_version_change(
    out: &mut dyn Write,
    path: &str,
    from: &str,
    to: &str,
) -> io::Result<()> {
    writeln!(
        out,
        "  {}: {} → {}",
        style(path).cyan(),
        style(from).red(),
        style(to).green()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(bytes: Vec<u8>) -> String {
        console::strip_ansi_codes(&String::from_utf8(bytes).unwrap()).to_string()
    }

    #[test]
    fn test_format_check() {
        let check = CheckResult::warning("foo", "missing $.author");
        let text = console::strip_ansi_codes(&format_check(&check)).to_string();
        assert_eq!(text, "WARNING (foo): missing $.author");
    }

    #[test]
    fn test_display_aligned() {
        let mut out = Vec::new();
        display_aligned(&mut out, "ab", 5, "no commits").unwrap();
        assert_eq!(plain(out), "   ab no commits\n");
    }

    #[test]
    fn test_display_version_change() {
        let mut out = Vec::new();
        display_version_change(&mut out, "package.yaml", "1.0.0", "1.1.0").unwrap();
        assert_eq!(plain(out), "  package.yaml: 1.0.0 → 1.1.0\n");
    }

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }
}
