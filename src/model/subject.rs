use crate::changelog::ChangelogConfig;
use crate::domain::{TagFormat, Version};
use crate::error::{Result, ShoreError};
use crate::model::{Monorepo, Package};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The package or monorepo a command operates on
#[derive(Debug, Clone)]
pub enum Subject {
    Package(Package),
    Monorepo(Arc<Monorepo>),
}

impl Subject {
    /// Load the subject defined in `directory`.
    ///
    /// Exactly one of `package.yaml` and `monorepo.yaml` must be present.
    pub fn load(directory: &Path) -> Result<Subject> {
        let has_package = directory.join(Package::FILENAME).is_file();
        let has_monorepo = directory.join(Monorepo::FILENAME).is_file();

        match (has_package, has_monorepo) {
            (true, true) => Err(ShoreError::subject(format!(
                "both {} and {} exist in {}",
                Package::FILENAME,
                Monorepo::FILENAME,
                directory.display()
            ))),
            (true, false) => Ok(Subject::Package(Package::load(directory)?)),
            (false, true) => Ok(Subject::Monorepo(Arc::new(Monorepo::load(directory)?))),
            (false, false) => Err(ShoreError::usage(format!(
                "no {} or {} in {}",
                Package::FILENAME,
                Monorepo::FILENAME,
                directory.display()
            ))),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Subject::Package(package) => package.name(),
            Subject::Monorepo(monorepo) => monorepo.name(),
        }
    }

    pub fn directory(&self) -> &Path {
        match self {
            Subject::Package(package) => &package.directory,
            Subject::Monorepo(monorepo) => &monorepo.directory,
        }
    }

    /// The `package.yaml` or `monorepo.yaml` of the subject
    pub fn file(&self) -> PathBuf {
        match self {
            Subject::Package(package) => package.file(),
            Subject::Monorepo(monorepo) => monorepo.file(),
        }
    }

    pub fn version(&self) -> Option<&Version> {
        match self {
            Subject::Package(package) => Some(&package.version),
            Subject::Monorepo(monorepo) => monorepo.version.as_ref(),
        }
    }

    pub fn require_version(&self) -> Result<&Version> {
        self.version().ok_or_else(|| {
            ShoreError::subject(format!("'{}' does not define a version", self.name()))
        })
    }

    pub fn is_monorepo(&self) -> bool {
        matches!(self, Subject::Monorepo(_))
    }

    pub fn is_private(&self) -> bool {
        match self {
            Subject::Package(package) => package.is_private(),
            Subject::Monorepo(monorepo) => monorepo.config.private,
        }
    }

    pub fn tag_format(&self) -> TagFormat {
        match self {
            Subject::Package(package) => package.tag_format(),
            Subject::Monorepo(monorepo) => monorepo.tag_format(),
        }
    }

    pub fn tag(&self, version: &Version) -> String {
        self.tag_format().format(self.name(), version)
    }

    pub fn tests(&self) -> &BTreeMap<String, String> {
        match self {
            Subject::Package(package) => &package.config.test,
            Subject::Monorepo(monorepo) => &monorepo.config.test,
        }
    }

    pub fn changelog_config(&self) -> &ChangelogConfig {
        match self {
            Subject::Package(package) => &package.config.changelog,
            Subject::Monorepo(monorepo) => &monorepo.config.changelog,
        }
    }

    /// Directory holding the changelog files of the subject
    pub fn changelog_directory(&self) -> PathBuf {
        self.directory().join(&self.changelog_config().directory)
    }

    /// A mono-versioned monorepo, either the subject itself or the one the
    /// package belongs to
    pub fn mono_versioned_monorepo(&self) -> Option<&Arc<Monorepo>> {
        let monorepo = match self {
            Subject::Package(package) => package.monorepo.as_ref()?,
            Subject::Monorepo(monorepo) => monorepo,
        };
        monorepo.config.mono_versioning.then_some(monorepo)
    }

    /// The subject followed by its packages when it is a monorepo
    pub fn with_members(&self) -> Result<Vec<Subject>> {
        let mut subjects = vec![self.clone()];
        if let Subject::Monorepo(monorepo) = self {
            subjects.extend(
                Monorepo::packages(monorepo)?
                    .into_iter()
                    .map(Subject::Package),
            );
        }
        Ok(subjects)
    }

    /// Packages of a monorepo subject; empty for a package
    pub fn member_packages(&self) -> Result<Vec<Package>> {
        match self {
            Subject::Package(_) => Ok(Vec::new()),
            Subject::Monorepo(monorepo) => Monorepo::packages(monorepo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_requires_a_subject_file() {
        let dir = TempDir::new().unwrap();
        let err = Subject::load(dir.path()).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_load_rejects_both_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.yaml"), "name: a\nversion: 1.0.0\n").unwrap();
        fs::write(dir.path().join("monorepo.yaml"), "name: b\n").unwrap();
        let err = Subject::load(dir.path()).unwrap_err();
        assert!(matches!(err, ShoreError::Subject(_)));
    }

    #[test]
    fn test_monorepo_with_members() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("monorepo.yaml"), "name: mono\n").unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(
            dir.path().join("pkg/package.yaml"),
            "name: pkg\nversion: 0.3.0\n",
        )
        .unwrap();

        let subject = Subject::load(dir.path()).unwrap();
        assert!(subject.is_monorepo());
        assert!(subject.version().is_none());
        assert!(subject.mono_versioned_monorepo().is_none());

        let members = subject.with_members().unwrap();
        let names: Vec<&str> = members.iter().map(Subject::name).collect();
        assert_eq!(names, vec!["mono", "pkg"]);
        assert_eq!(members[1].tag(&Version::new(0, 3, 0)), "pkg@0.3.0");
    }
}
