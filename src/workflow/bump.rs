//! Version bumping: locate version refs, verify them, rewrite them and tag.

use crate::changelog::ChangelogManager;
use crate::domain::version_ref::ensure_one_ref_per_file;
use crate::domain::{checks_status, BumpKind, Version, VersionRef};
use crate::error::{Result, ShoreError};
use crate::git::ChangeKind;
use crate::model::Subject;
use crate::plugins::{collect_checks, collect_version_refs};
use crate::ui;
use crate::workflow::warning::BumpWarning;
use crate::workflow::{relative_display, Context};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// The operation flags of the `bump` command as given on the command line
#[derive(Debug, Clone, Default)]
pub struct BumpFlags {
    pub version: Option<String>,
    pub major: bool,
    pub minor: bool,
    pub patch: bool,
    pub post: bool,
    pub ci: bool,
    pub show: bool,
    pub get_single_version: bool,
    pub status: bool,
}

impl BumpFlags {
    /// Names of the flags that are set, in declaration order of the operations
    fn set_names(&self) -> Vec<&'static str> {
        [
            ("post", self.post),
            ("patch", self.patch),
            ("minor", self.minor),
            ("major", self.major),
            ("version", self.version.is_some()),
            ("show", self.show),
            ("ci", self.ci),
            ("get-single-version", self.get_single_version),
            ("status", self.status),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }
}

/// Groups of flags of which at most one may be given
const EXCLUSIVE_GROUPS: &[&[&str]] = &[&["version", "ci"], &["major", "minor", "patch", "version"]];

/// What `bump` is asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpOperation {
    Kind(BumpKind),
    Explicit(String),
    Ci,
    Show,
    GetSingleVersion,
    Status,
}

impl BumpOperation {
    /// Resolve the single operation selected by `flags`
    pub fn from_flags(flags: &BumpFlags) -> Result<Self> {
        let set = flags.set_names();

        for group in EXCLUSIVE_GROUPS {
            let used: Vec<&str> = set
                .iter()
                .copied()
                .filter(|name| group.contains(name))
                .collect();
            if used.len() > 1 {
                return Err(ShoreError::usage(format!(
                    "conflicting options: --{} and --{}",
                    used[0], used[1]
                )));
            }
        }

        match set.len() {
            0 => return Err(ShoreError::usage("no operation specified")),
            1 => {}
            _ => return Err(ShoreError::usage("multiple operations specified")),
        }

        let operation = match set[0] {
            "post" => BumpOperation::Kind(BumpKind::Post),
            "patch" => BumpOperation::Kind(BumpKind::Patch),
            "minor" => BumpOperation::Kind(BumpKind::Minor),
            "major" => BumpOperation::Kind(BumpKind::Major),
            "show" => BumpOperation::Show,
            "ci" => BumpOperation::Ci,
            "get-single-version" => BumpOperation::GetSingleVersion,
            "status" => BumpOperation::Status,
            _ => BumpOperation::Explicit(flags.version.clone().unwrap_or_default()),
        };
        Ok(operation)
    }

    /// Whether the operation rewrites versions
    pub fn changes_version(&self) -> bool {
        matches!(
            self,
            BumpOperation::Kind(_) | BumpOperation::Explicit(_) | BumpOperation::Ci
        )
    }

    fn runs_checks(&self) -> bool {
        !matches!(self, BumpOperation::Status | BumpOperation::GetSingleVersion)
    }
}

/// Modifiers of the `bump` command
#[derive(Debug, Clone, Default)]
pub struct BumpOptions {
    pub force: bool,
    pub tag: bool,
    pub dry: bool,
    pub skip_checks: bool,
}

/// Subjects whose version refs move together with `subject`
fn ref_subjects(subject: &Subject) -> Result<Vec<Subject>> {
    match subject {
        Subject::Monorepo(_) if subject.mono_versioned_monorepo().is_some() => {
            subject.with_members()
        }
        _ => Ok(vec![subject.clone()]),
    }
}

/// Run the bump command on `subject`, returning the exit code
pub fn bump(
    subject: &Subject,
    operation: &BumpOperation,
    options: &BumpOptions,
    ctx: &mut Context<'_>,
) -> Result<i32> {
    let subjects = ref_subjects(subject)?;

    if operation.runs_checks() && !options.skip_checks {
        let mut checks = Vec::new();
        for member in &subjects {
            checks.extend(collect_checks(member, ctx.config)?);
        }
        if checks_status(&checks, true) != 0 {
            ui::display_checks(ctx.out, &checks, "")?;
            let warning = BumpWarning::ChecksFailed {
                subject: subject.name().to_string(),
            };
            if !options.force {
                ui::display_error(&format!(
                    "checks for '{}' failed, use --force to bump anyway",
                    subject.name()
                ));
                return Ok(1);
            }
            ui::display_bump_warning(&warning);
        }
    }

    if *operation == BumpOperation::Status {
        return status(subject, ctx);
    }

    if operation.changes_version() {
        if let Subject::Package(package) = subject {
            if let Some(monorepo) = subject.mono_versioned_monorepo() {
                let warning = BumpWarning::MonoVersionedPackage {
                    package: package.name().to_string(),
                    monorepo: monorepo.name().to_string(),
                };
                if !options.force {
                    return Err(ShoreError::subject(format!(
                        "'{}' is mono-versioned with '{}', bump the monorepo instead",
                        package.name(),
                        monorepo.name()
                    )));
                }
                ui::display_bump_warning(&warning);
            }
        }
    }

    let mut refs = Vec::new();
    for member in &subjects {
        refs.extend(collect_version_refs(member, ctx.config)?);
    }
    if refs.is_empty() {
        return Err(ShoreError::usage("no version refs found"));
    }
    debug!("found {} version refs", refs.len());

    let base = subject.directory().to_path_buf();

    if *operation == BumpOperation::Show {
        for version_ref in &refs {
            writeln!(
                ctx.out,
                "{}: {}",
                relative_display(&version_ref.path, &base),
                version_ref.value
            )?;
        }
        return Ok(0);
    }

    let current = subject.require_version()?.clone();
    let inconsistent: Vec<&VersionRef> = refs
        .iter()
        .filter(|r| r.parsed().ok().as_ref() != Some(&current))
        .collect();

    if !inconsistent.is_empty() {
        for version_ref in &inconsistent {
            ui::display_warning(&format!(
                "{}: {}",
                relative_display(&version_ref.path, &base),
                version_ref.value
            ));
        }
        let warning = BumpWarning::InconsistentVersions {
            count: inconsistent.len(),
            expected: current.to_string(),
        };
        if *operation == BumpOperation::GetSingleVersion {
            ui::display_error("no single consistent version found");
            return Ok(1);
        }
        if !options.force {
            ui::display_error(&format!("{}, use --force to bump anyway", warning));
            return Ok(1);
        }
        ui::display_bump_warning(&warning);
    }

    if *operation == BumpOperation::GetSingleVersion {
        writeln!(ctx.out, "{}", current)?;
        return Ok(0);
    }

    let target = match operation {
        BumpOperation::Kind(kind) => current.bump(*kind)?,
        BumpOperation::Explicit(version) => Version::parse(version)?,
        BumpOperation::Ci => ci_version(subject, &current, ctx)?,
        BumpOperation::Show | BumpOperation::GetSingleVersion | BumpOperation::Status => {
            return Ok(0)
        }
    };

    if target < current || target.to_string() == current.to_string() {
        let warning = BumpWarning::VersionNotIncreased {
            current: current.to_string(),
            target: target.to_string(),
        };
        if !options.force {
            let relation = if target < current { "lower than" } else { "equal to" };
            return Err(ShoreError::usage(format!(
                "target version {} is {} current version {}, use --force to bump anyway",
                target, relation, current
            )));
        }
        ui::display_bump_warning(&warning);
    }

    ensure_one_ref_per_file(&refs)?;

    let changelog = ChangelogManager::new(subject.directory(), subject.changelog_config());
    let release_changelog = changelog.unreleased().exists();
    if release_changelog {
        let released = changelog.version(&target.to_string());
        if released.exists() {
            return Err(ShoreError::changelog(format!(
                "cannot release the unreleased changelog, {} already exists",
                relative_display(&released.path, &base)
            )));
        }
    }

    let repo = if options.tag {
        let repo = ctx.require_repo("--tag")?;
        let staged = repo.staged_changes()?;
        if let Some(added) = staged.iter().find(|c| c.kind == ChangeKind::Added) {
            return Err(ShoreError::tag(format!(
                "cannot bump and tag with new files in the staging area ({})",
                added.path.display()
            )));
        }
        Some(repo)
    } else {
        None
    };

    ui::display_status(
        ctx.out,
        &format!(
            "bumping {} version ref{} to {}{}",
            refs.len(),
            if refs.len() == 1 { "" } else { "s" },
            target,
            if options.dry { " (dry run)" } else { "" }
        ),
    )?;

    let mut changed: Vec<PathBuf> = Vec::new();
    for version_ref in &refs {
        ui::display_version_change(
            ctx.out,
            &relative_display(&version_ref.path, &base),
            &version_ref.value,
            &target.to_string(),
        )?;
        if !options.dry {
            version_ref.apply(&target)?;
        }
        changed.push(version_ref.path.clone());
    }

    if release_changelog {
        if options.dry {
            ui::display_status(ctx.out, "would release the unreleased changelog")?;
        } else {
            let released = changelog.release_today(&target)?;
            if let Some(path) = released.first() {
                ui::display_status(
                    ctx.out,
                    &format!("released changelog {}", relative_display(path, &base)),
                )?;
            }
            changed.extend(released);
        }
    }

    if let Some(repo) = repo {
        let tag = subject.tag(&target);
        if options.dry {
            ui::display_status(ctx.out, &format!("would create tag {}", tag))?;
            return Ok(0);
        }

        repo.stage(&changed)?;
        if !repo.staged_changes()?.is_empty() {
            let message = format!("({}) bump version to {}", subject.name(), target);
            repo.commit(&message)?;
            info!("committed '{}'", message);
        }
        repo.create_tag(&tag, options.force)?;
        ui::display_success(ctx.out, &format!("tagged {}", tag))?;
    }

    Ok(0)
}

/// `{current}+{distance}.g{sha}` with the number of commits since the
/// current tag
fn ci_version(subject: &Subject, current: &Version, ctx: &Context<'_>) -> Result<Version> {
    let repo = ctx.require_repo("--ci")?;
    let tag = subject.tag(current);
    let since = repo.find_tag_oid(&tag)?;
    if since.is_none() {
        debug!("tag {} not found, counting all commits", tag);
    }
    let distance = repo.count_commits_since(since, subject.directory())?;
    let sha = repo.head_short_id()?;
    current
        .clone()
        .with_build(&format!("{}.g{}", distance, sha))
}

/// Print, for the subject and each member package, how many commits were
/// made since its current version was tagged.
fn status(subject: &Subject, ctx: &mut Context<'_>) -> Result<i32> {
    let repo = ctx.require_repo("--status")?;
    let members = subject.with_members()?;
    let width = members.iter().map(|m| m.name().len()).max().unwrap_or(0);

    for member in &members {
        let message = match member.version() {
            None => "no version".to_string(),
            Some(version) => {
                let tag = member.tag(version);
                match repo.find_tag_oid(&tag)? {
                    None => format!("tag \"{}\" not found", tag),
                    Some(oid) => match repo.count_commits_since(Some(oid), member.directory())? {
                        0 => format!("no commits since \"{}\"", tag),
                        1 => format!("1 commit since \"{}\"", tag),
                        n => format!("{} commits since \"{}\"", n, tag),
                    },
                }
            }
        };
        ui::display_aligned(ctx.out, member.name(), width, &message)?;
    }
    Ok(0)
}
