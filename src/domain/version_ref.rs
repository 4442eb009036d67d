//! Located occurrences of version strings inside files.

use crate::domain::Version;
use crate::error::{Result, ShoreError};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A version string found in a file, addressed by byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRef {
    pub path: PathBuf,
    pub start: usize,
    pub end: usize,
    pub value: String,
}

impl VersionRef {
    /// Find the first match of `pattern` in `content` and build a ref from
    /// its `version` capture group.
    pub fn find(path: &Path, content: &str, pattern: &Regex) -> Option<VersionRef> {
        let captures = pattern.captures(content)?;
        let m = captures.name("version")?;
        Some(VersionRef {
            path: path.to_path_buf(),
            start: m.start(),
            end: m.end(),
            value: m.as_str().to_string(),
        })
    }

    /// Read `path` and look for `pattern`. A missing file yields no ref.
    pub fn find_in_file(path: &Path, pattern: &Regex) -> Result<Option<VersionRef>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Self::find(path, &content, pattern))
    }

    /// Parse the current value of the ref
    pub fn parsed(&self) -> Result<Version> {
        Version::parse(&self.value)
    }

    /// Replace the ref's byte range in `content` with `replacement`.
    ///
    /// Fails if the range no longer holds the value the ref was created with.
    pub fn splice(&self, content: &str, replacement: &str) -> Result<String> {
        match content.get(self.start..self.end) {
            Some(current) if current == self.value => {}
            _ => {
                return Err(ShoreError::version_ref(format!(
                    "{} changed since '{}' was located at {}..{}",
                    self.path.display(),
                    self.value,
                    self.start,
                    self.end
                )))
            }
        }

        let mut spliced = String::with_capacity(content.len() + replacement.len());
        spliced.push_str(&content[..self.start]);
        spliced.push_str(replacement);
        spliced.push_str(&content[self.end..]);
        Ok(spliced)
    }

    /// Rewrite the ref's file in place with `version`
    pub fn apply(&self, version: &Version) -> Result<()> {
        let content = fs::read_to_string(&self.path)?;
        let updated = self.splice(&content, &version.to_string())?;
        fs::write(&self.path, updated)?;
        Ok(())
    }
}

/// Normalised absolute form of a path, used to detect the same file reached
/// through different relative paths.
pub fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Ok(parent) = fs::canonicalize(parent) {
                return parent.join(name);
            }
        }
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        absolute.components().collect()
    })
}

/// Splicing assumes one ref per file; reject anything else.
pub fn ensure_one_ref_per_file(refs: &[VersionRef]) -> Result<()> {
    let mut seen = HashSet::new();
    for version_ref in refs {
        if !seen.insert(normalize_path(&version_ref.path)) {
            return Err(ShoreError::version_ref(format!(
                "multiple version refs in one file are not supported: {}",
                version_ref.path.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn yaml_version() -> Regex {
        Regex::new(r#"(?m)^version:\s*['"]?(?P<version>[^'"\s]+)"#).unwrap()
    }

    #[test]
    fn test_find_records_offsets() {
        let content = "name: foo\nversion: '1.2.3'\n";
        let found = VersionRef::find(Path::new("package.yaml"), content, &yaml_version()).unwrap();
        assert_eq!(found.value, "1.2.3");
        assert_eq!(&content[found.start..found.end], "1.2.3");
    }

    #[test]
    fn test_splice_and_reparse() {
        let content = "name: foo\nversion: 1.2.3\nauthor: me\n";
        let found = VersionRef::find(Path::new("package.yaml"), content, &yaml_version()).unwrap();
        let new_version = Version::parse("1.3.0-rc.1").unwrap();

        let updated = found.splice(content, &new_version.to_string()).unwrap();
        assert_eq!(updated, "name: foo\nversion: 1.3.0-rc.1\nauthor: me\n");

        let reparsed = VersionRef::find(Path::new("package.yaml"), &updated, &yaml_version()).unwrap();
        assert_eq!(reparsed.parsed().unwrap(), new_version);
    }

    #[test]
    fn test_splice_rejects_stale_ref() {
        let found = VersionRef {
            path: PathBuf::from("package.yaml"),
            start: 9,
            end: 14,
            value: "1.2.3".to_string(),
        };
        assert!(found.splice("version: 9.9.9\n", "2.0.0").is_err());
        assert!(found.splice("short", "2.0.0").is_err());
    }

    #[test]
    fn test_apply_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.yaml");
        fs::write(&path, "name: foo\nversion: 0.1.0\n").unwrap();

        let found = VersionRef::find_in_file(&path, &yaml_version()).unwrap().unwrap();
        found.apply(&Version::new(0, 2, 0)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "name: foo\nversion: 0.2.0\n");
    }

    #[test]
    fn test_missing_file_has_no_ref() {
        let dir = TempDir::new().unwrap();
        let found = VersionRef::find_in_file(&dir.path().join("nope.yaml"), &yaml_version()).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_duplicate_files_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.yaml");
        fs::write(&path, "version: 1.0.0\n").unwrap();

        let first = VersionRef::find_in_file(&path, &yaml_version()).unwrap().unwrap();
        let mut second = first.clone();
        second.path = dir.path().join(".").join("package.yaml");

        assert!(ensure_one_ref_per_file(&[first.clone()]).is_ok());
        assert!(ensure_one_ref_per_file(&[first, second]).is_err());
    }
}
