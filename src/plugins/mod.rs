//! Per-subject providers of version refs, checks, generated files and
//! build/publish targets.
//!
//! Every subject gets the [core::CorePlugin]. Packages additionally get
//! [setuptools::SetuptoolsPlugin] and [pyproject::PyprojectPlugin], and
//! [github_actions::GithubActionsPlugin] when `github-actions` is configured.

pub mod core;
pub mod github_actions;
pub mod pyproject;
pub mod setuptools;

use crate::config::Config;
use crate::domain::{CheckResult, VersionRef};
use crate::error::Result;
use crate::git::Repository;
use crate::model::Subject;
use crate::process::Runner;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment available to plugins while rendering files
pub struct RenderContext<'a> {
    pub repo: Option<&'a dyn Repository>,
}

/// A generated file and its expected contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileToRender {
    pub path: PathBuf,
    pub contents: String,
}

impl FileToRender {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        FileToRender {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Whether the file on disk already has the expected contents
    pub fn is_up_to_date(&self) -> bool {
        fs::read_to_string(&self.path)
            .map(|current| current == self.contents)
            .unwrap_or(false)
    }

    pub fn write_to_disk(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &self.contents)?;
        info!("wrote {}", self.path.display());
        Ok(())
    }
}

/// Produces distribution artifacts for a subject
pub trait BuildTarget {
    /// Identifier such as `setuptools:sdist`
    fn id(&self) -> String;

    /// Artifacts from a previous build found in `build_dir`
    fn existing_artifacts(&self, build_dir: &Path) -> Result<Vec<PathBuf>>;

    /// Build into `build_dir` and return the produced artifacts
    fn build(&self, build_dir: &Path, runner: &dyn Runner) -> Result<Vec<PathBuf>>;
}

/// Uploads distribution artifacts somewhere
pub trait PublishTarget {
    fn id(&self) -> String;

    /// Upload `files`; `test` selects the test index
    fn publish(&self, files: &[PathBuf], test: bool, runner: &dyn Runner) -> Result<()>;
}

pub trait Plugin {
    fn name(&self) -> &'static str;

    fn version_refs(&self, _subject: &Subject) -> Result<Vec<VersionRef>> {
        Ok(Vec::new())
    }

    fn checks(&self, _subject: &Subject) -> Result<Vec<CheckResult>> {
        Ok(Vec::new())
    }

    fn files(&self, _subject: &Subject, _context: &RenderContext<'_>) -> Result<Vec<FileToRender>> {
        Ok(Vec::new())
    }

    fn build_targets(&self, _subject: &Subject) -> Vec<Box<dyn BuildTarget>> {
        Vec::new()
    }

    fn publish_targets(&self, _subject: &Subject) -> Vec<Box<dyn PublishTarget>> {
        Vec::new()
    }
}

/// The plugins that apply to `subject`
pub fn plugins_for(subject: &Subject, config: &Config) -> Vec<Box<dyn Plugin>> {
    let mut plugins: Vec<Box<dyn Plugin>> = vec![Box::new(core::CorePlugin)];
    if let Subject::Package(package) = subject {
        plugins.push(Box::new(setuptools::SetuptoolsPlugin::new(
            config.defaults.python.clone(),
        )));
        plugins.push(Box::new(pyproject::PyprojectPlugin));
        if package.config.github_actions.is_some() {
            plugins.push(Box::new(github_actions::GithubActionsPlugin));
        }
    }
    plugins
}

/// All version refs of `subject`, in plugin order
pub fn collect_version_refs(subject: &Subject, config: &Config) -> Result<Vec<VersionRef>> {
    let mut refs = Vec::new();
    for plugin in plugins_for(subject, config) {
        refs.extend(plugin.version_refs(subject)?);
    }
    Ok(refs)
}

/// All checks of `subject`, sorted by plugin order
pub fn collect_checks(subject: &Subject, config: &Config) -> Result<Vec<CheckResult>> {
    let mut checks = Vec::new();
    for plugin in plugins_for(subject, config) {
        checks.extend(plugin.checks(subject)?);
    }
    Ok(checks)
}

/// All files generated for `subject`
pub fn collect_files(
    subject: &Subject,
    config: &Config,
    context: &RenderContext<'_>,
) -> Result<Vec<FileToRender>> {
    let mut files = Vec::new();
    for plugin in plugins_for(subject, config) {
        files.extend(plugin.files(subject, context)?);
    }
    Ok(files)
}

/// Quote a string as a single-quoted Python literal
pub(crate) fn py_str(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{}'", escaped)
}
