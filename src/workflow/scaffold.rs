//! `shore new`: create the skeleton of a package or monorepo.

use crate::domain::Version;
use crate::error::{Result, ShoreError};
use crate::git::repository::global_author;
use crate::model::{Monorepo, Package};
use crate::ui;
use crate::workflow::{relative_display, Context};
use console::style;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const NAMESPACE_INIT: &str = "__path__ = __import__('pkgutil').extend_path(__path__, __name__)\n";

#[derive(Debug, Clone, Default)]
pub struct NewOptions {
    pub name: String,
    /// Defaults to `./<name>`
    pub directory: Option<PathBuf>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    pub modulename: Option<String>,
    pub monorepo: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct SubjectTemplate<'a> {
    name: &'a str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modulename: Option<&'a str>,
}

fn default_author(ctx: &Context<'_>) -> Result<Option<String>> {
    if let Some(author) = &ctx.config.defaults.author {
        return Ok(Some(author.clone()));
    }
    let author = match ctx.repo {
        Some(repo) => repo.author()?,
        None => global_author().unwrap_or_else(|e| {
            debug!("no global git configuration: {}", e);
            None
        }),
    };
    Ok(author.map(|author| author.to_string()))
}

/// The files of a new project, relative to its directory
fn project_files(options: &NewOptions, version: &str, author: Option<&str>, license: Option<&str>) -> Result<Vec<(PathBuf, String)>> {
    let template = SubjectTemplate {
        name: &options.name,
        version,
        author,
        license,
        modulename: options.modulename.as_deref(),
    };
    let filename = if options.monorepo {
        Monorepo::FILENAME
    } else {
        Package::FILENAME
    };

    let mut files = vec![
        (PathBuf::from(filename), serde_yaml::to_string(&template)?),
        (PathBuf::from("README.md"), format!("# {}\n", options.name)),
    ];
    if options.monorepo {
        return Ok(files);
    }

    let modulename = options
        .modulename
        .clone()
        .unwrap_or_else(|| options.name.replace('-', "_"));
    let parts: Vec<&str> = modulename.split('.').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(ShoreError::usage(format!("invalid module name '{}'", modulename)));
    }

    let mut module_dir = PathBuf::from("src");
    for (index, part) in parts.iter().enumerate() {
        module_dir.push(part);
        let contents = if index + 1 == parts.len() {
            format!("\n__version__ = '{}'\n", version)
        } else {
            NAMESPACE_INIT.to_string()
        };
        files.push((module_dir.join("__init__.py"), contents));
    }
    Ok(files)
}

/// Scaffold a package (or a monorepo) named `options.name`
pub fn new_project(options: NewOptions, ctx: &mut Context<'_>) -> Result<i32> {
    let version = options
        .version
        .clone()
        .unwrap_or_else(|| ctx.config.defaults.version.clone());
    Version::parse(&version)?;

    let author = match &options.author {
        Some(author) => Some(author.clone()),
        None => default_author(ctx)?,
    };
    let license = options
        .license
        .clone()
        .or_else(|| ctx.config.defaults.license.clone());

    let directory = options
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from(&options.name));
    let files = project_files(&options, &version, author.as_deref(), license.as_deref())?;

    for (relative, contents) in files {
        let path = directory.join(&relative);
        write_new_file(&path, &contents, &directory, ctx)?;
    }
    Ok(0)
}

fn write_new_file(path: &Path, contents: &str, base: &Path, ctx: &mut Context<'_>) -> Result<()> {
    let display = relative_display(path, base);
    if path.exists() {
        ui::display_warning(&format!("skip {} (already exists)", display));
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    writeln!(ctx.out, "{} {}", style("write").green(), display)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::git::MockRepository;
    use crate::model::Subject;
    use tempfile::TempDir;

    fn options(name: &str, directory: &Path) -> NewOptions {
        NewOptions {
            name: name.to_string(),
            directory: Some(directory.to_path_buf()),
            ..NewOptions::default()
        }
    }

    #[test]
    fn test_new_package_loads() {
        let dir = TempDir::new().unwrap();
        let mut repo = MockRepository::new();
        repo.set_author("Jane Doe", "jane@example.com");
        let config = Config::default();
        let mut out = Vec::new();
        let mut ctx = Context::new(&config, Some(&repo), &mut out);

        let options = NewOptions {
            license: Some("MIT".to_string()),
            ..options("my-pkg", dir.path())
        };
        assert_eq!(new_project(options, &mut ctx).unwrap(), 0);

        let init = dir.path().join("src/my_pkg/__init__.py");
        assert_eq!(fs::read_to_string(&init).unwrap(), "\n__version__ = '0.1.0'\n");

        let subject = Subject::load(dir.path()).unwrap();
        let Subject::Package(package) = subject else {
            panic!("expected a package");
        };
        assert_eq!(package.config.author.as_deref(), Some("Jane Doe <jane@example.com>"));
        assert_eq!(package.config.license.as_deref(), Some("MIT"));
        assert_eq!(package.entry_file(), package.directory.join("src/my_pkg/__init__.py"));
    }

    #[test]
    fn test_namespace_packages() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let mut out = Vec::new();
        let mut ctx = Context::new(&config, None, &mut out);

        let options = NewOptions {
            author: Some("me".to_string()),
            version: Some("1.0.0".to_string()),
            ..options("ns.core", dir.path())
        };
        new_project(options, &mut ctx).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("src/ns/__init__.py")).unwrap(),
            NAMESPACE_INIT
        );
        assert!(fs::read_to_string(dir.path().join("src/ns/core/__init__.py"))
            .unwrap()
            .contains("__version__ = '1.0.0'"));
    }

    #[test]
    fn test_existing_files_are_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "keep me\n").unwrap();
        let config = Config::default();
        let mut out = Vec::new();
        let mut ctx = Context::new(&config, None, &mut out);

        let options = NewOptions {
            author: Some("me".to_string()),
            monorepo: true,
            ..options("mono", dir.path())
        };
        new_project(options, &mut ctx).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("README.md")).unwrap(), "keep me\n");
        assert!(dir.path().join("monorepo.yaml").exists());
        assert!(!dir.path().join("src").exists());
    }

    #[test]
    fn test_invalid_version() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let mut out = Vec::new();
        let mut ctx = Context::new(&config, None, &mut out);
        let options = NewOptions {
            author: Some("me".to_string()),
            version: Some("not a version".to_string()),
            ..options("x", dir.path())
        };
        assert!(new_project(options, &mut ctx).is_err());
    }
}
