use crate::domain::{CheckResult, VersionRef};
use crate::error::Result;
use crate::model::{Monorepo, Package, Subject};
use crate::plugins::Plugin;
use crate::workflow::relative_display;
use regex::Regex;
use std::fs;
use std::sync::OnceLock;

/// `version: 1.2.3` at the start of a line in a YAML file
fn yaml_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r##"(?m)^version\s*:\s*['"]?(?P<version>[^\s'"#]+)"##)
            .expect("version pattern is valid")
    })
}

/// `__version__ = '1.2.3'` in a Python file
pub fn python_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"__version__\s*=\s*['"](?P<version>[^'"]+)['"]"#)
            .expect("version pattern is valid")
    })
}

/// Version refs in the subject files themselves and in the package entry
/// file, plus the basic metadata checks.
pub struct CorePlugin;

impl CorePlugin {
    fn package_refs(package: &Package) -> Result<Vec<VersionRef>> {
        let mut refs = Vec::new();
        refs.extend(VersionRef::find_in_file(&package.file(), yaml_version_regex())?);
        refs.extend(VersionRef::find_in_file(
            &package.entry_file(),
            python_version_regex(),
        )?);
        Ok(refs)
    }

    fn monorepo_refs(monorepo: &Monorepo) -> Result<Vec<VersionRef>> {
        Ok(VersionRef::find_in_file(&monorepo.file(), yaml_version_regex())?
            .into_iter()
            .collect())
    }

    fn package_checks(package: &Package) -> Result<Vec<CheckResult>> {
        let name = package.name();
        let mut checks = Vec::new();

        if package.config.author.is_none() {
            checks.push(CheckResult::warning(name, "missing $.author"));
        }
        if package.config.license.is_none() {
            checks.push(CheckResult::warning(name, "missing $.license"));
        }
        if package.config.url.is_none() {
            checks.push(CheckResult::info(name, "missing $.url"));
        }

        let entry_file = package.entry_file();
        if !entry_file.is_file() {
            checks.push(CheckResult::error(
                name,
                format!("entry file not found: {}", relative_display(&entry_file, &package.directory)),
            ));
        } else {
            let content = fs::read_to_string(&entry_file)?;
            if !python_version_regex().is_match(&content) {
                checks.push(CheckResult::warning(
                    name,
                    format!(
                        "entry file {} does not define __version__",
                        relative_display(&entry_file, &package.directory)
                    ),
                ));
            }
        }

        if let (Some(monorepo), Some(_)) = (package.monorepo.as_ref(), package.config.version.as_ref()) {
            if monorepo.config.mono_versioning && monorepo.version.as_ref() != Some(&package.version) {
                checks.push(CheckResult::error(
                    name,
                    format!(
                        "version {} differs from mono-version {}",
                        package.version,
                        monorepo
                            .version
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<none>".to_string())
                    ),
                ));
            }
        }

        Ok(checks)
    }
}

impl Plugin for CorePlugin {
    fn name(&self) -> &'static str {
        "core"
    }

    fn version_refs(&self, subject: &Subject) -> Result<Vec<VersionRef>> {
        match subject {
            Subject::Package(package) => Self::package_refs(package),
            Subject::Monorepo(monorepo) => Self::monorepo_refs(monorepo),
        }
    }

    fn checks(&self, subject: &Subject) -> Result<Vec<CheckResult>> {
        let name = subject.name();
        let mut checks = match subject {
            Subject::Package(package) => Self::package_checks(package)?,
            Subject::Monorepo(monorepo) => {
                let mut checks = Vec::new();
                if monorepo.config.mono_versioning && monorepo.version.is_none() {
                    checks.push(CheckResult::error(
                        name,
                        "mono-versioning is enabled but $.version is not set",
                    ));
                }
                checks
            }
        };

        for version_ref in self.version_refs(subject)? {
            if let Err(e) = version_ref.parsed() {
                checks.push(CheckResult::error(
                    name,
                    format!(
                        "invalid version '{}' in {}: {}",
                        version_ref.value,
                        relative_display(&version_ref.path, subject.directory()),
                        e
                    ),
                ));
            }
        }

        for (test_name, command) in subject.tests() {
            if command.trim().is_empty() {
                checks.push(CheckResult::warning(
                    name,
                    format!("test '{}' has an empty command", test_name),
                ));
            }
        }

        Ok(checks)
    }
}
