//! `shore link`: symlink packages into a Python environment with Flit.
//!
//! Flit only understands `[project]` metadata, so `pyproject.toml` is
//! rewritten for the duration of the install and restored afterwards.

use crate::error::{Result, ShoreError};
use crate::model::{Package, Subject};
use crate::plugins::pyproject::PYPROJECT_TOML;
use crate::process::{Invocation, Runner};
use crate::ui;
use crate::workflow::Context;
use console::style;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, warn};

/// Restores a file to its original contents when dropped
struct RestoreOnDrop {
    path: PathBuf,
    original: Vec<u8>,
}

impl Drop for RestoreOnDrop {
    fn drop(&mut self) {
        if let Err(e) = fs::write(&self.path, &self.original) {
            warn!("failed to restore {}: {}", self.path.display(), e);
        } else {
            debug!("restored {}", self.path.display());
        }
    }
}

fn table_mut<'t>(table: &'t mut Table, key: &str) -> Result<&'t mut Table> {
    table
        .entry(key.to_string())
        .or_insert_with(|| Value::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| ShoreError::config(format!("'{}' in {} is not a table", key, PYPROJECT_TOML)))
}

/// Make `document` installable by Flit: copy the Poetry entrypoints and
/// scripts to `[project]` and point `tool.flit.module` at the package module.
pub fn rewrite_for_flit(document: &mut Table, package: &Package) -> Result<()> {
    let poetry = document
        .get("tool")
        .and_then(|tool| tool.get("poetry"))
        .and_then(Value::as_table)
        .cloned()
        .unwrap_or_default();

    let name = poetry
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(package.name())
        .to_string();
    let version = poetry
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| package.version.to_string());

    let project = table_mut(document, "project")?;
    if let Some(plugins) = poetry.get("plugins").filter(|p| p.as_table().is_some_and(|t| !t.is_empty())) {
        project.insert("entry-points".to_string(), plugins.clone());
    }
    if let Some(scripts) = poetry.get("scripts").filter(|s| s.as_table().is_some_and(|t| !t.is_empty())) {
        project.insert("scripts".to_string(), scripts.clone());
    }
    project.insert("name".to_string(), Value::String(name));
    project.insert("version".to_string(), Value::String(version));
    project.insert("description".to_string(), Value::String(String::new()));

    let tool = table_mut(document, "tool")?;
    let flit = table_mut(tool, "flit")?;
    let mut module = Table::new();
    module.insert("name".to_string(), Value::String(package.modulename()));
    flit.insert("module".to_string(), Value::Table(module));
    Ok(())
}

/// `VIRTUAL_ENV` or `CONDA_PREFIX` is set
fn in_virtual_env() -> bool {
    ["VIRTUAL_ENV", "CONDA_PREFIX"]
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|value| !value.is_empty()))
}

fn resolve_python(python: &str) -> Result<PathBuf> {
    let path = which::which(python)
        .map_err(|e| ShoreError::command(format!("cannot find Python executable '{}': {}", python, e)))?;
    Ok(fs::canonicalize(&path).unwrap_or(path))
}

fn link_package(
    package: &Package,
    python: Option<&Path>,
    runner: &dyn Runner,
    ctx: &mut Context<'_>,
) -> Result<()> {
    let path = package.directory.join(PYPROJECT_TOML);
    let original = fs::read(&path)?;
    let mut document: Table = toml::from_str(&String::from_utf8_lossy(&original))?;
    rewrite_for_flit(&mut document, package)?;
    let rewritten = toml::to_string(&document)?;

    let Some(python) = python else {
        writeln!(ctx.out, "{}", style(format!("# {}", path.display())).dim())?;
        write!(ctx.out, "{}", rewritten)?;
        return Ok(());
    };

    let _restore = RestoreOnDrop {
        path: path.clone(),
        original,
    };
    fs::write(&path, rewritten)?;
    writeln!(ctx.out, "symlinking {}", style(package.name()).green())?;
    runner.run(
        &Invocation::new("flit")
            .args(["install", "--symlink", "--python"])
            .path_arg(python)
            .cwd(&package.directory),
    )
}

/// Symlink every package of `subject` that has a `pyproject.toml`. With
/// `dump_pyproject` the rewritten files are printed instead.
///
/// Without an explicit `python`, linking outside of a virtual environment
/// is refused unless `no_venv_check` is set.
pub fn link(
    subject: &Subject,
    python: Option<&str>,
    dump_pyproject: bool,
    no_venv_check: bool,
    runner: &dyn Runner,
    ctx: &mut Context<'_>,
) -> Result<i32> {
    let packages: Vec<Package> = match subject {
        Subject::Package(package) => vec![package.clone()],
        Subject::Monorepo(_) => subject.member_packages()?,
    };
    let packages: Vec<&Package> = packages
        .iter()
        .filter(|package| package.directory.join(PYPROJECT_TOML).is_file())
        .collect();
    if packages.is_empty() {
        return Err(ShoreError::usage(format!("no {} found to link", PYPROJECT_TOML)));
    }

    if !dump_pyproject && python.is_none() && !no_venv_check && !in_virtual_env() {
        ui::display_error(
            "refusing to link, not in a virtual environment (use --no-venv-check to link anyway)",
        );
        return Ok(1);
    }

    let python = if dump_pyproject {
        None
    } else {
        Some(resolve_python(python.unwrap_or(&ctx.config.defaults.python))?)
    };

    let mut status = 0;
    for package in packages {
        if let Err(e) = link_package(package, python.as_deref(), runner, ctx) {
            ui::display_error(&format!("failed to link {}: {}", package.name(), e));
            status = 1;
        }
    }
    Ok(status)
}
