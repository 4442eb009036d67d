use crate::domain::VersionRef;
use crate::error::Result;
use crate::model::Subject;
use crate::plugins::Plugin;
use regex::Regex;
use std::sync::OnceLock;

pub const PYPROJECT_TOML: &str = "pyproject.toml";

/// `version = "1.2.3"` at the start of a line, as in `[project]` or `[tool.poetry]`
fn pyproject_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^version\s*=\s*['"](?P<version>[^'"]+)['"]"#)
            .expect("version pattern is valid")
    })
}

/// Tracks the version in a hand-maintained `pyproject.toml`
pub struct PyprojectPlugin;

impl Plugin for PyprojectPlugin {
    fn name(&self) -> &'static str {
        "pyproject"
    }

    fn version_refs(&self, subject: &Subject) -> Result<Vec<VersionRef>> {
        let path = subject.directory().join(PYPROJECT_TOML);
        Ok(VersionRef::find_in_file(&path, pyproject_version_regex())?
            .into_iter()
            .collect())
    }
}
