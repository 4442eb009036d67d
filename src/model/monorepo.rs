use crate::changelog::ChangelogConfig;
use crate::domain::{TagFormat, Version};
use crate::error::{Result, ShoreError};
use crate::model::Package;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Contents of a `monorepo.yaml`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MonorepoConfig {
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,

    /// All packages share the monorepo version and are bumped together
    #[serde(default)]
    pub mono_versioning: bool,

    #[serde(default)]
    pub tag_format: Option<String>,

    #[serde(default)]
    pub private: bool,

    #[serde(default)]
    pub test: BTreeMap<String, String>,

    #[serde(default)]
    pub changelog: ChangelogConfig,
}

/// A directory of packages described by a `monorepo.yaml`
#[derive(Debug, Clone)]
pub struct Monorepo {
    pub config: MonorepoConfig,
    pub directory: PathBuf,
    pub version: Option<Version>,
}

impl Monorepo {
    pub const FILENAME: &'static str = "monorepo.yaml";

    pub fn load(directory: &Path) -> Result<Self> {
        let directory = fs::canonicalize(directory)?;
        let file = directory.join(Self::FILENAME);
        debug!("loading {}", file.display());

        let content = fs::read_to_string(&file)?;
        let config: MonorepoConfig = serde_yaml::from_str(&content).map_err(|e| {
            ShoreError::subject(format!("invalid {}: {}", file.display(), e))
        })?;

        let version = config.version.as_deref().map(Version::parse).transpose()?;

        Ok(Monorepo {
            config,
            directory,
            version,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn file(&self) -> PathBuf {
        self.directory.join(Self::FILENAME)
    }

    pub fn tag_format(&self) -> TagFormat {
        self.config
            .tag_format
            .clone()
            .map(TagFormat::new)
            .unwrap_or_default()
    }

    pub fn tag(&self, version: &Version) -> String {
        self.tag_format().format(self.name(), version)
    }

    /// Packages in the immediate subdirectories of the monorepo, sorted by name
    pub fn packages(monorepo: &Arc<Monorepo>) -> Result<Vec<Package>> {
        let mut packages = Vec::new();
        for entry in fs::read_dir(&monorepo.directory)? {
            let path = entry?.path();
            if path.join(Package::FILENAME).is_file() {
                packages.push(Package::load_with_monorepo(
                    &path,
                    Some(Arc::clone(monorepo)),
                )?);
            }
        }
        packages.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(packages)
    }
}
