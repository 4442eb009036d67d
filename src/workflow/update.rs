use crate::domain::checks_status;
use crate::error::Result;
use crate::model::Subject;
use crate::plugins::{collect_checks, collect_files, FileToRender, RenderContext};
use crate::ui;
use crate::workflow::{relative_display, Context};
use console::style;
use std::io::Write;

fn rendered_files(subject: &Subject, ctx: &Context<'_>) -> Result<Vec<FileToRender>> {
    let render_context = RenderContext { repo: ctx.repo };
    let mut files = Vec::new();
    for member in subject.with_members()? {
        files.extend(collect_files(&member, ctx.config, &render_context)?);
    }
    Ok(files)
}

/// Render and write every generated file of `subject`
pub fn update(subject: &Subject, skip_checks: bool, dry: bool, ctx: &mut Context<'_>) -> Result<i32> {
    if !skip_checks {
        let mut checks = Vec::new();
        for member in subject.with_members()? {
            checks.extend(collect_checks(&member, ctx.config)?);
        }
        if checks_status(&checks, false) != 0 {
            ui::display_checks(ctx.out, &checks, "")?;
            ui::display_error("checks failed, use --skip-checks to update anyway");
            return Ok(1);
        }
    }

    let base = subject.directory().to_path_buf();
    let files = rendered_files(subject, ctx)?;
    for file in &files {
        let path = relative_display(&file.path, &base);
        if file.is_up_to_date() {
            writeln!(ctx.out, "{} {}", style("unchanged").dim(), path)?;
        } else if dry {
            writeln!(ctx.out, "{} {}", style("would write").yellow(), path)?;
        } else {
            file.write_to_disk()?;
            writeln!(ctx.out, "{} {}", style("write").green(), path)?;
        }
    }
    Ok(0)
}

/// Check that every generated file is up to date and, with `tag`, that the
/// tag belongs to exactly one package of the subject.
pub fn verify(subject: &Subject, tag: Option<&str>, ctx: &mut Context<'_>) -> Result<i32> {
    let base = subject.directory().to_path_buf();
    let mut status = 0;

    for file in rendered_files(subject, ctx)? {
        let path = relative_display(&file.path, &base);
        if !file.path.exists() {
            ui::display_error(&format!("{} is missing, run `shore update`", path));
            status = 1;
        } else if !file.is_up_to_date() {
            ui::display_error(&format!("{} is outdated, run `shore update`", path));
            status = 1;
        }
    }

    if let Some(tag) = tag {
        let members = subject.with_members()?;
        let matching: Vec<&Subject> = members
            .iter()
            .filter(|member| !member.is_monorepo())
            .filter(|member| member.version().is_some_and(|v| member.tag(v) == tag))
            .collect();
        match matching.as_slice() {
            [member] => {
                ui::display_success(
                    ctx.out,
                    &format!("tag {} matches {}", tag, member.name()),
                )?;
            }
            [] => {
                ui::display_error(&format!("tag {} does not match any package", tag));
                status = 1;
            }
            _ => {
                ui::display_error(&format!("tag {} matches multiple packages", tag));
                status = 1;
            }
        }
    }

    if status == 0 {
        ui::display_success(ctx.out, "all files are up to date")?;
    }
    Ok(status)
}
