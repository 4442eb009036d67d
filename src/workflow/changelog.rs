use crate::changelog::render::{render_markdown, render_terminal};
use crate::changelog::{ChangelogEntry, ChangelogManager};
use crate::domain::Version;
use crate::error::{Result, ShoreError};
use crate::model::Subject;
use crate::ui;
use crate::workflow::{relative_display, Context};
use std::io::Write;
use std::path::Path;

/// Arguments of `changelog add`
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub kind: String,
    pub description: String,
    pub author: Option<String>,
    pub pr: Option<String>,
    pub issues: Vec<String>,
    pub commit: bool,
}

fn manager(subject: &Subject) -> ChangelogManager {
    ChangelogManager::new(subject.directory(), subject.changelog_config())
}

/// Commit message for a new entry; subjects below the repository root are
/// prefixed with their relative directory.
fn commit_message(entry: &ChangelogEntry, subject_dir: &Path, toplevel: Option<&Path>) -> String {
    let message = format!("{}: {}", entry.kind, entry.description);
    let relative = toplevel
        .and_then(|root| subject_dir.strip_prefix(root).ok())
        .map(|relative| relative.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    let prefix = relative.trim_matches('/');
    if prefix.is_empty() {
        message
    } else {
        format!("{}/: {}", prefix, message)
    }
}

/// Add an entry to the unreleased changelog of `subject`
pub fn add(subject: &Subject, options: AddOptions, ctx: &mut Context<'_>) -> Result<i32> {
    let manager = manager(subject);
    if !manager.enabled {
        return Err(ShoreError::changelog(
            "cannot add changelog entry because the changelog is disabled in the config",
        ));
    }
    let repo = if options.commit {
        Some(ctx.require_repo("--commit")?)
    } else {
        ctx.repo
    };

    let author = match options.author {
        Some(author) => author,
        None => repo
            .map(|repo| repo.author())
            .transpose()?
            .flatten()
            .and_then(|author| author.email)
            .ok_or_else(|| ShoreError::usage("missing --author"))?,
    };

    let entry = manager.make_entry(
        &options.kind,
        &options.description,
        &author,
        options.pr,
        options.issues,
    )?;
    let path = manager.add(entry.clone())?;

    let mut document = toml::Table::new();
    document.insert(
        "entry".to_string(),
        toml::Value::try_from(&entry)?,
    );
    write!(ctx.out, "{}", toml::to_string(&document)?)?;

    if let (true, Some(repo)) = (options.commit, repo) {
        let message = commit_message(&entry, subject.directory(), repo.toplevel().as_deref());
        repo.stage(&[path])?;
        repo.commit(&message)?;
        ui::display_success(ctx.out, &format!("committed \"{}\"", message))?;
    }
    Ok(0)
}

/// Render changelogs: the unreleased one, one `version`, or `all`
pub fn format(
    subject: &Subject,
    markdown: bool,
    all: bool,
    version: Option<&str>,
    ctx: &mut Context<'_>,
) -> Result<i32> {
    if all && version.is_some() {
        return Err(ShoreError::usage("--all is incompatible with a version argument"));
    }

    let manager = manager(subject);
    let changelogs = if all {
        manager.all()?
    } else if let Some(version) = version {
        let changelog = manager.version(version);
        if !changelog.exists() {
            return Err(ShoreError::changelog(format!(
                "changelog for version \"{}\" does not exist",
                version
            )));
        }
        vec![changelog]
    } else {
        vec![manager.unreleased()]
    };

    for changelog in changelogs {
        let content = changelog.load()?;
        if markdown {
            render_markdown(ctx.out, &changelog, &content)?;
        } else {
            render_terminal(ctx.out, &changelog, &content)?;
        }
        writeln!(ctx.out)?;
    }
    Ok(0)
}

/// Move the unreleased entries of `subject` into the changelog of `version`
pub fn release(subject: &Subject, version: &str, ctx: &mut Context<'_>) -> Result<i32> {
    let version = Version::parse(version)?;
    let base = subject.directory().to_path_buf();
    let released = manager(subject).release_today(&version)?;
    match released.first() {
        Some(path) => ui::display_success(
            ctx.out,
            &format!("released changelog {}", relative_display(path, &base)),
        )?,
        None => ui::display_warning("no unreleased changelog to release"),
    }
    Ok(0)
}
