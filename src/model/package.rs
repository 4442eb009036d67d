use crate::changelog::ChangelogConfig;
use crate::domain::{TagFormat, Version};
use crate::error::{Result, ShoreError};
use crate::model::Monorepo;
use crate::plugins::github_actions::GithubActionsConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Contents of a `package.yaml`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageConfig {
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    /// Python module name; defaults to the package name with `-` replaced by `_`
    #[serde(default)]
    pub modulename: Option<String>,

    /// File holding `__version__`, relative to the package directory
    #[serde(default)]
    pub entry_file: Option<String>,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub tag_format: Option<String>,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub python_requires: Option<String>,

    #[serde(default)]
    pub classifiers: Vec<String>,

    /// Entrypoint group -> name -> `module:function`
    #[serde(default)]
    pub entrypoints: BTreeMap<String, BTreeMap<String, String>>,

    /// Test name -> shell command
    #[serde(default)]
    pub test: BTreeMap<String, String>,

    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub github_actions: Option<GithubActionsConfig>,
}

/// A Python package described by a `package.yaml`
#[derive(Debug, Clone)]
pub struct Package {
    pub config: PackageConfig,
    /// Absolute directory containing the `package.yaml`
    pub directory: PathBuf,
    pub version: Version,
    /// The monorepo this package belongs to, if its parent directory has one
    pub monorepo: Option<Arc<Monorepo>>,
}

impl Package {
    pub const FILENAME: &'static str = "package.yaml";

    /// Load the package in `directory`, attaching the monorepo of the parent
    /// directory if there is one.
    pub fn load(directory: &Path) -> Result<Self> {
        let directory = fs::canonicalize(directory)?;
        let monorepo = match directory.parent() {
            Some(parent) if parent.join(Monorepo::FILENAME).is_file() => {
                Some(Arc::new(Monorepo::load(parent)?))
            }
            _ => None,
        };
        Self::load_with_monorepo(&directory, monorepo)
    }

    /// Load the package in `directory` as a member of `monorepo`
    pub fn load_with_monorepo(directory: &Path, monorepo: Option<Arc<Monorepo>>) -> Result<Self> {
        let directory = fs::canonicalize(directory)?;
        let file = directory.join(Self::FILENAME);
        debug!("loading {}", file.display());

        let content = fs::read_to_string(&file)?;
        let config: PackageConfig = serde_yaml::from_str(&content).map_err(|e| {
            ShoreError::subject(format!("invalid {}: {}", file.display(), e))
        })?;

        let version = match (&config.version, &monorepo) {
            (Some(version), _) => Version::parse(version)?,
            (None, Some(monorepo)) if monorepo.config.mono_versioning => {
                monorepo.version.clone().ok_or_else(|| {
                    ShoreError::subject(format!(
                        "package '{}' inherits the version of monorepo '{}', which has none",
                        config.name, monorepo.config.name
                    ))
                })?
            }
            (None, _) => {
                return Err(ShoreError::subject(format!(
                    "package '{}' has no version",
                    config.name
                )))
            }
        };

        Ok(Package {
            config,
            directory,
            version,
            monorepo,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Path of the `package.yaml`
    pub fn file(&self) -> PathBuf {
        self.directory.join(Self::FILENAME)
    }

    pub fn modulename(&self) -> String {
        self.config
            .modulename
            .clone()
            .unwrap_or_else(|| self.config.name.replace('-', "_"))
    }

    /// Whether the version of this package is managed by its monorepo
    pub fn is_mono_versioned(&self) -> bool {
        self.monorepo
            .as_ref()
            .is_some_and(|monorepo| monorepo.config.mono_versioning)
    }

    pub fn tag_format(&self) -> TagFormat {
        match (&self.config.tag_format, &self.monorepo) {
            (Some(format), _) => TagFormat::new(format.clone()),
            (None, Some(_)) => TagFormat::new(TagFormat::MONOREPO_MEMBER),
            (None, None) => TagFormat::default(),
        }
    }

    pub fn tag(&self, version: &Version) -> String {
        self.tag_format().format(self.name(), version)
    }

    pub fn is_private(&self) -> bool {
        self.config.private
            || self
                .monorepo
                .as_ref()
                .is_some_and(|monorepo| monorepo.config.private)
    }

    /// Candidate locations of the file that defines `__version__`, most
    /// specific first.
    fn entry_file_candidates(&self) -> Vec<PathBuf> {
        if let Some(entry_file) = &self.config.entry_file {
            return vec![self.directory.join(entry_file)];
        }

        let modulename = self.modulename();
        let module_path: PathBuf = modulename.split('.').collect();
        let mut module_file = module_path.clone();
        module_file.set_extension("py");

        vec![
            self.directory.join("src").join(&module_path).join("__init__.py"),
            self.directory.join(&module_path).join("__init__.py"),
            self.directory.join("src").join(&module_file),
            self.directory.join(&module_file),
        ]
    }

    /// The file that defines `__version__`. Falls back to the conventional
    /// `src/<module>/__init__.py` if none of the candidates exist.
    pub fn entry_file(&self) -> PathBuf {
        let candidates = self.entry_file_candidates();
        candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .cloned()
            .unwrap_or_else(|| candidates[0].clone())
    }
}
