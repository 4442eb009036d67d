use crate::changelog::{Changelog, ChangelogConfig, ChangelogDocument, ChangelogEntry};
use crate::domain::Version;
use crate::error::{Result, ShoreError};
use chrono::{Local, NaiveDate};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const UNRELEASED: &str = "_unreleased";

/// A changelog file on disk, released (`version` is set) or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedChangelog {
    pub path: PathBuf,
    pub version: Option<String>,
}

impl ManagedChangelog {
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Parse the file; a missing file is an empty changelog
    pub fn load(&self) -> Result<Changelog> {
        if !self.exists() {
            return Ok(Changelog::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let document: ChangelogDocument = toml::from_str(&content).map_err(|e| {
            ShoreError::changelog(format!("invalid {}: {}", self.path.display(), e))
        })?;
        Ok(document.changelog)
    }

    pub fn save(&self, changelog: &Changelog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let document = ChangelogDocument {
            changelog: changelog.clone(),
        };
        fs::write(&self.path, toml::to_string(&document)?)?;
        Ok(())
    }
}

/// Access to the changelog directory of one subject
#[derive(Debug, Clone)]
pub struct ChangelogManager {
    pub directory: PathBuf,
    pub valid_types: Vec<String>,
    pub enabled: bool,
}

impl ChangelogManager {
    pub fn new(subject_directory: &Path, config: &ChangelogConfig) -> Self {
        ChangelogManager {
            directory: subject_directory.join(&config.directory),
            valid_types: config.valid_types.clone(),
            enabled: config.enabled,
        }
    }

    pub fn unreleased(&self) -> ManagedChangelog {
        ManagedChangelog {
            path: self.directory.join(format!("{}.toml", UNRELEASED)),
            version: None,
        }
    }

    pub fn version(&self, version: &str) -> ManagedChangelog {
        ManagedChangelog {
            path: self.directory.join(format!("{}.toml", version)),
            version: Some(version.to_string()),
        }
    }

    /// Every changelog in reverse chronological order, the unreleased one first
    pub fn all(&self) -> Result<Vec<ManagedChangelog>> {
        let mut released = Vec::new();
        if self.directory.is_dir() {
            for entry in fs::read_dir(&self.directory)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if stem != UNRELEASED {
                    released.push(self.version(stem));
                }
            }
        }

        released.sort_by(|a, b| compare_versions(b.version.as_deref(), a.version.as_deref()));

        let mut changelogs = Vec::with_capacity(released.len() + 1);
        let unreleased = self.unreleased();
        if unreleased.exists() {
            changelogs.push(unreleased);
        }
        changelogs.extend(released);
        Ok(changelogs)
    }

    /// Build a new entry, validating its type
    pub fn make_entry(
        &self,
        kind: &str,
        description: &str,
        author: &str,
        pr: Option<String>,
        issues: Vec<String>,
    ) -> Result<ChangelogEntry> {
        if !self.valid_types.iter().any(|t| t == kind) {
            return Err(ShoreError::changelog(format!(
                "invalid change type '{}', expected one of: {}",
                kind,
                self.valid_types.join(", ")
            )));
        }

        Ok(ChangelogEntry {
            id: entry_id(kind, description, author),
            kind: kind.to_string(),
            description: description.to_string(),
            author: author.to_string(),
            pr,
            issues: (!issues.is_empty()).then_some(issues),
        })
    }

    /// Append an entry to the unreleased changelog and return its file
    pub fn add(&self, entry: ChangelogEntry) -> Result<PathBuf> {
        if !self.enabled {
            return Err(ShoreError::changelog(
                "cannot add changelog entry because the changelog is disabled in the config",
            ));
        }
        let unreleased = self.unreleased();
        let mut changelog = unreleased.load()?;
        changelog.entries.push(entry);
        unreleased.save(&changelog)?;
        Ok(unreleased.path)
    }

    /// Move the unreleased entries to `<version>.toml`, dated `date`.
    ///
    /// Returns the files that were created or removed, or an empty list if
    /// there was nothing to release.
    pub fn release(&self, version: &Version, date: NaiveDate) -> Result<Vec<PathBuf>> {
        let unreleased = self.unreleased();
        if !unreleased.exists() {
            debug!("no unreleased changelog in {}", self.directory.display());
            return Ok(Vec::new());
        }

        let target = self.version(&version.to_string());
        if target.exists() {
            return Err(ShoreError::changelog(format!(
                "{} already exists",
                target.path.display()
            )));
        }

        let mut changelog = unreleased.load()?;
        changelog.release_date = Some(date);
        target.save(&changelog)?;
        fs::remove_file(&unreleased.path)?;
        info!(
            "released {} as {}",
            unreleased.path.display(),
            target.path.display()
        );

        Ok(vec![target.path, unreleased.path])
    }

    /// [`Self::release`] with today's date
    pub fn release_today(&self, version: &Version) -> Result<Vec<PathBuf>> {
        self.release(version, Local::now().date_naive())
    }
}

/// Short hash of the entry fields salted with the creation time
fn entry_id(kind: &str, description: &str, author: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(author.as_bytes());
    hasher.update(Local::now().to_rfc3339().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..7].to_string()
}

fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
    let parse = |v: Option<&str>| v.and_then(|v| Version::parse(v).ok());
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(&b),
    }
}
