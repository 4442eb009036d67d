use crate::error::{Result, ShoreError};
use crate::model::Subject;
use crate::plugins::{plugins_for, BuildTarget, PublishTarget};
use crate::process::Runner;
use crate::ui;
use crate::workflow::{relative_display, Context};
use console::style;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Whether a target id is selected by `filter` (exact id or `id:` prefix)
pub fn target_matches(id: &str, filter: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(filter) => {
            id == filter
                || id
                    .strip_prefix(filter)
                    .is_some_and(|rest| rest.starts_with(':'))
        }
    }
}

struct MemberTargets {
    member: Subject,
    builds: Vec<Box<dyn BuildTarget>>,
    publishers: Vec<Box<dyn PublishTarget>>,
}

fn member_targets(subject: &Subject, ctx: &Context<'_>) -> Result<Vec<MemberTargets>> {
    let mut members = Vec::new();
    for member in subject.with_members()? {
        let mut builds = Vec::new();
        let mut publishers = Vec::new();
        for plugin in plugins_for(&member, ctx.config) {
            builds.extend(plugin.build_targets(&member));
            publishers.extend(plugin.publish_targets(&member));
        }
        if !builds.is_empty() || !publishers.is_empty() {
            members.push(MemberTargets {
                member,
                builds,
                publishers,
            });
        }
    }
    Ok(members)
}

/// The build directory for `subject`: `build_dir` if given, otherwise the
/// configured default relative to the subject directory.
pub fn resolve_build_dir(subject: &Subject, build_dir: Option<&Path>, ctx: &Context<'_>) -> PathBuf {
    match build_dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => subject.directory().join(dir),
        None => subject.directory().join(&ctx.config.defaults.build_dir),
    }
}

/// Run every selected build target and collect their artifacts. With
/// `reuse`, targets whose artifacts already exist are not rebuilt.
fn run_builds(
    targets: &MemberTargets,
    filter: Option<&str>,
    build_dir: &Path,
    reuse: bool,
    runner: &dyn Runner,
    ctx: &mut Context<'_>,
) -> Result<std::result::Result<Vec<PathBuf>, String>> {
    let base = targets.member.directory().to_path_buf();
    let mut artifacts = Vec::new();
    for target in targets.builds.iter().filter(|t| target_matches(&t.id(), filter)) {
        let label = format!("{} {}", targets.member.name(), target.id());
        if reuse {
            let existing = target.existing_artifacts(build_dir)?;
            if !existing.is_empty() {
                writeln!(ctx.out, "{} {}", style("reuse").dim(), label)?;
                artifacts.extend(existing);
                continue;
            }
        }

        writeln!(ctx.out, "{} {}", style("build").cyan(), label)?;
        match target.build(build_dir, runner) {
            Ok(files) => {
                for file in &files {
                    writeln!(ctx.out, "  {}", relative_display(file, &base))?;
                }
                artifacts.extend(files);
            }
            Err(e) => {
                warn!("build {} failed: {}", label, e);
                return Ok(Err(format!("{}: {}", label, e)));
            }
        }
    }
    Ok(Ok(artifacts))
}

/// Build the distributions of `subject`
pub fn build(
    subject: &Subject,
    filter: Option<&str>,
    build_dir: Option<&Path>,
    runner: &dyn Runner,
    ctx: &mut Context<'_>,
) -> Result<i32> {
    let members = member_targets(subject, ctx)?;
    let selected = members
        .iter()
        .any(|m| m.builds.iter().any(|t| target_matches(&t.id(), filter)));
    if !selected {
        return Err(ShoreError::usage(match filter {
            Some(filter) => format!("no build target matches '{}'", filter),
            None => format!("{} has no build targets", subject.name()),
        }));
    }

    let mut failures = Vec::new();
    for targets in &members {
        let build_dir = resolve_build_dir(&targets.member, build_dir, ctx);
        if let Err(failure) = run_builds(targets, filter, &build_dir, false, runner, ctx)? {
            failures.push(failure);
        }
    }

    report_failures("build", &failures)
}

/// Build and upload the distributions of `subject`. Every publisher runs
/// even if another one failed.
#[allow(clippy::too_many_arguments)]
pub fn publish(
    subject: &Subject,
    filter: Option<&str>,
    test: bool,
    build_dir: Option<&Path>,
    reuse: bool,
    runner: &dyn Runner,
    ctx: &mut Context<'_>,
) -> Result<i32> {
    if subject.is_private() {
        return Err(ShoreError::subject(format!(
            "{} is private and cannot be published",
            subject.name()
        )));
    }

    let members = member_targets(subject, ctx)?;
    let selected = members
        .iter()
        .any(|m| m.publishers.iter().any(|t| target_matches(&t.id(), filter)));
    if !selected {
        return Err(ShoreError::usage(match filter {
            Some(filter) => format!("no publish target matches '{}'", filter),
            None => format!("{} has no publish targets", subject.name()),
        }));
    }

    let mut failures = Vec::new();
    for targets in &members {
        if targets.member.is_private() {
            ui::display_warning(&format!("skipping private package {}", targets.member.name()));
            continue;
        }

        let build_dir = resolve_build_dir(&targets.member, build_dir, ctx);
        let artifacts = match run_builds(targets, None, &build_dir, reuse, runner, ctx)? {
            Ok(artifacts) => artifacts,
            Err(failure) => {
                failures.push(failure);
                continue;
            }
        };

        for publisher in targets
            .publishers
            .iter()
            .filter(|t| target_matches(&t.id(), filter))
        {
            let label = format!("{} {}", targets.member.name(), publisher.id());
            writeln!(
                ctx.out,
                "{} {}{}",
                style("publish").cyan(),
                label,
                if test { " (test)" } else { "" }
            )?;
            match publisher.publish(&artifacts, test, runner) {
                Ok(()) => info!("published {}", label),
                Err(e) => {
                    warn!("publish {} failed: {}", label, e);
                    failures.push(format!("{}: {}", label, e));
                }
            }
        }
    }

    report_failures("publish", &failures)
}

fn report_failures(operation: &str, failures: &[String]) -> Result<i32> {
    if failures.is_empty() {
        return Ok(0);
    }
    for failure in failures {
        ui::display_error(&format!("{} failed for {}", operation, failure));
    }
    Ok(1)
}
