use crate::domain::Version;
use crate::error::{Result, ShoreError};
use regex::Regex;

/// Tag naming format with `{name}` and `{version}` placeholders
/// (e.g., "v{version}", "{name}@{version}")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFormat {
    pub pattern: String,
}

impl TagFormat {
    /// Default for a standalone package or a monorepo
    pub const DEFAULT: &'static str = "v{version}";

    /// Default for a package that lives inside a monorepo
    pub const MONOREPO_MEMBER: &'static str = "{name}@{version}";

    pub fn new(pattern: impl Into<String>) -> Self {
        TagFormat {
            pattern: pattern.into(),
        }
    }

    /// Format a tag for the subject `name` at `version`
    /// Example: pattern="{name}@{version}", name="foo", version=1.2.3 -> "foo@1.2.3"
    pub fn format(&self, name: &str, version: &Version) -> String {
        self.pattern
            .replace("{name}", name)
            .replace("{version}", &version.to_string())
    }

    /// Extract the version from a tag that follows this format for `name`.
    ///
    /// Returns `Ok(None)` if the tag does not match the format at all.
    pub fn extract_version(&self, name: &str, tag: &str) -> Result<Option<Version>> {
        if !self.pattern.contains("{version}") {
            return Err(ShoreError::tag(format!(
                "Tag format '{}' must contain a {{version}} placeholder",
                self.pattern
            )));
        }

        let escaped = regex::escape(&self.pattern)
            .replace(r"\{name\}", &regex::escape(name))
            .replace(r"\{version\}", r"(?P<version>.+)");

        let re = Regex::new(&format!("^{}$", escaped))
            .map_err(|e| ShoreError::tag(format!("Invalid tag format '{}': {}", self.pattern, e)))?;

        match re.captures(tag) {
            Some(captures) => Ok(Version::parse(&captures["version"]).ok()),
            None => Ok(None),
        }
    }
}

impl Default for TagFormat {
    fn default() -> Self {
        TagFormat::new(Self::DEFAULT)
    }
}
