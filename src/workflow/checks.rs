use crate::domain::checks_status;
use crate::error::Result;
use crate::model::Subject;
use crate::plugins::collect_checks;
use crate::ui;
use crate::workflow::Context;
use console::style;
use std::io::Write;
use std::time::Instant;

/// Run every check of `subject` (and of the packages of a monorepo) and
/// report them. Returns 1 on errors, or on warnings if
/// `warnings_as_errors`.
pub fn run_checks(subject: &Subject, warnings_as_errors: bool, ctx: &mut Context<'_>) -> Result<i32> {
    let start = Instant::now();
    let mut checks = Vec::new();
    for member in subject.with_members()? {
        checks.extend(collect_checks(&member, ctx.config)?);
    }
    let elapsed = start.elapsed();

    writeln!(ctx.out)?;
    ui::display_checks(ctx.out, &checks, "  ")?;
    if !checks.is_empty() {
        writeln!(ctx.out)?;
    }
    writeln!(
        ctx.out,
        "run {} check{} for {} in {:.3}s",
        checks.len(),
        if checks.len() == 1 { "" } else { "s" },
        style(subject.name()).yellow(),
        elapsed.as_secs_f64()
    )?;

    Ok(checks_status(&checks, warnings_as_errors))
}
