//! Structured changelogs stored as TOML files next to a package.
//!
//! Unreleased entries accumulate in `_unreleased.toml`; releasing moves them
//! to `<version>.toml` and stamps the release date.
//!
//! ```toml
//! [changelog]
//! release-date = "2022-01-17"
//!
//! [[changelog.entries]]
//! id = "a7bc01f"
//! type = "improvement"
//! description = "Improvement to `my_package.util`"
//! author = "username"
//! ```

pub mod manager;
pub mod render;

pub use manager::{ChangelogManager, ManagedChangelog};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Entry types accepted unless a subject configures its own list
pub const DEFAULT_VALID_TYPES: &[&str] = &[
    "breaking change",
    "deprecation",
    "docs",
    "feature",
    "fix",
    "hygiene",
    "improvement",
    "refactor",
    "tests",
];

/// The `changelog` section of `package.yaml` / `monorepo.yaml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChangelogConfig {
    /// Adding entries is refused when disabled; existing files remain readable
    pub enabled: bool,

    /// Relative to the subject directory
    pub directory: PathBuf,

    pub valid_types: Vec<String>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            enabled: true,
            directory: PathBuf::from(".changelog"),
            valid_types: DEFAULT_VALID_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A single change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub description: String,

    /// One or more authors, comma separated
    pub author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
}

impl ChangelogEntry {
    pub fn authors(&self) -> Vec<&str> {
        self.author
            .split(',')
            .map(str::trim)
            .filter(|author| !author.is_empty())
            .collect()
    }
}

/// The contents of one changelog file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Changelog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,

    #[serde(default)]
    pub entries: Vec<ChangelogEntry>,
}

/// Top-level TOML document, wrapping the `[changelog]` table
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ChangelogDocument {
    #[serde(default)]
    pub changelog: Changelog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_yaml() {
        let config: ChangelogConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.enabled);
        assert_eq!(config.directory, PathBuf::from(".changelog"));
        assert!(config.valid_types.contains(&"feature".to_string()));
    }

    #[test]
    fn test_config_overrides() {
        let config: ChangelogConfig =
            serde_yaml::from_str("enabled: false\nvalid-types: [feat, fix]\n").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.valid_types, vec!["feat", "fix"]);
    }

    #[test]
    fn test_parse_document() {
        let document: ChangelogDocument = toml::from_str(
            r#"
[changelog]
release-date = "2022-01-17"

[[changelog.entries]]
id = "a7bc01f"
type = "improvement"
description = "Improvement to `my_package.util`"
author = "alice, bob"
pr = "https://github.com/username/my_package/pulls/13"
"#,
        )
        .unwrap();

        let changelog = document.changelog;
        assert_eq!(changelog.release_date, NaiveDate::from_ymd_opt(2022, 1, 17));
        assert_eq!(changelog.entries.len(), 1);
        assert_eq!(changelog.entries[0].kind, "improvement");
        assert_eq!(changelog.entries[0].authors(), vec!["alice", "bob"]);
        assert!(changelog.entries[0].issues.is_none());
    }
}
