//! GitHub Actions workflow generation for packages

use crate::error::{Result, ShoreError};
use crate::model::{Package, Subject};
use crate::plugins::{FileToRender, Plugin, RenderContext};
use regex::Regex;
use semver::VersionReq;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Python versions tested when the package does not list its own
pub const PYTHON_VERSIONS: &[&str] = &["3.6", "3.7", "3.8", "3.9", "3.10", "3.11", "3.12"];

/// Latest Python, always appended to the computed version list
pub const PYTHON_NIGHTLY: &str = "3.x";

fn default_workflow_name() -> String {
    "Python Package (Shore)".to_string()
}

fn default_true() -> bool {
    true
}

/// The `github-actions` section of `package.yaml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GithubActionsConfig {
    #[serde(default = "default_workflow_name")]
    pub workflow_name: String,

    /// Defaults to a slug of the workflow name
    #[serde(default)]
    pub workflow_filename: Option<String>,

    /// Defaults to the branch `refs/remotes/origin/HEAD` points to
    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default = "default_true")]
    pub pull_requests: bool,

    #[serde(default)]
    pub pypi_publish: bool,

    /// Upload to test.pypi.org before pypi.org; only with `pypi-publish`
    #[serde(default = "default_true")]
    pub test_publish: bool,

    #[serde(default)]
    pub python_versions: Option<Vec<String>>,
}

impl Default for GithubActionsConfig {
    fn default() -> Self {
        GithubActionsConfig {
            workflow_name: default_workflow_name(),
            workflow_filename: None,
            branch: None,
            pull_requests: true,
            pypi_publish: false,
            test_publish: true,
            python_versions: None,
        }
    }
}

impl GithubActionsConfig {
    pub fn filename(&self) -> String {
        static RE: OnceLock<Regex> = OnceLock::new();
        if let Some(filename) = &self.workflow_filename {
            return filename.clone();
        }
        let re = RE.get_or_init(|| Regex::new(r"[^\w]+").expect("slug pattern is valid"));
        let slug = re.replace_all(&self.workflow_name, "-");
        format!("{}.yml", slug.trim_matches('-').to_lowercase())
    }
}

/// Translate a PEP 440 `python_requires` specifier into a semver requirement
fn to_version_req(python_requires: &str) -> Result<VersionReq> {
    let mut parts = Vec::new();
    for part in python_requires.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let translated = if let Some(rest) = part.strip_prefix("~=") {
            let rest = rest.trim();
            if rest.split('.').count() <= 2 {
                format!("^{}", rest)
            } else {
                format!("~{}", rest)
            }
        } else if let Some(rest) = part.strip_prefix("==") {
            format!("={}", rest.trim())
        } else if part.starts_with("!=") {
            return Err(ShoreError::config(format!(
                "cannot select python versions for '{}', please set python-versions explicitly",
                python_requires
            )));
        } else {
            part.to_string()
        };
        parts.push(translated);
    }

    VersionReq::parse(&parts.join(", ")).map_err(|e| {
        ShoreError::config(format!(
            "cannot select python versions for '{}': {}",
            python_requires, e
        ))
    })
}

/// Known Python versions matching `python_requires`, plus the nightly
pub fn select_python_versions(python_requires: Option<&str>) -> Result<Vec<String>> {
    let mut versions: Vec<String> = match python_requires {
        None => PYTHON_VERSIONS.iter().map(|v| v.to_string()).collect(),
        Some(requires) => {
            let req = to_version_req(requires)?;
            PYTHON_VERSIONS
                .iter()
                .filter(|v| {
                    semver::Version::parse(&format!("{}.0", v))
                        .map(|version| req.matches(&version))
                        .unwrap_or(false)
                })
                .map(|v| v.to_string())
                .collect()
        }
    };
    versions.push(PYTHON_NIGHTLY.to_string());
    Ok(versions)
}

#[derive(Debug, Serialize)]
struct Workflow {
    name: String,
    on: Triggers,
    jobs: Jobs,
}

#[derive(Debug, Serialize)]
struct Triggers {
    push: PushTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_request: Option<BranchFilter>,
}

#[derive(Debug, Serialize)]
struct PushTrigger {
    branches: Vec<String>,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BranchFilter {
    branches: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Jobs {
    test: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish: Option<Job>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Job {
    runs_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    needs: Option<String>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
    steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
struct Strategy {
    matrix: Matrix,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Matrix {
    python_version: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
struct Step {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    with: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    env: Option<BTreeMap<String, String>>,
}

impl Step {
    fn uses(name: &str, action: &str) -> Self {
        Step {
            name: Some(name.to_string()),
            uses: Some(action.to_string()),
            ..Step::default()
        }
    }

    fn run(name: &str, command: &str) -> Self {
        Step {
            name: Some(name.to_string()),
            run: Some(command.to_string()),
            ..Step::default()
        }
    }

    fn with(mut self, key: &str, value: &str) -> Self {
        self.with
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    fn env(mut self, key: &str, value: &str) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }
}

fn upload_step(name: &str, repository_url: Option<&str>, secret: &str) -> Step {
    let command = match repository_url {
        Some(url) => format!("twine upload --repository-url {} dist/*", url),
        None => "twine upload dist/*".to_string(),
    };
    Step::run(name, &command)
        .env("TWINE_USERNAME", "__token__")
        .env("TWINE_PASSWORD", &format!("${{{{ secrets.{} }}}}", secret))
}

fn build_workflow(
    package: &Package,
    config: &GithubActionsConfig,
    branch: &str,
    python_versions: Vec<String>,
) -> Workflow {
    let mut test_steps = vec![
        Step::uses("Checkout", "actions/checkout@v4"),
        Step::uses("Set up Python ${{ matrix.python-version }}", "actions/setup-python@v5")
            .with("python-version", "${{ matrix.python-version }}"),
        Step::run(
            "Install",
            "python -m pip install --upgrade pip && python -m pip install -e .",
        ),
    ];
    for (name, command) in &package.config.test {
        test_steps.push(Step::run(&format!("Test: {}", name), command));
    }

    let publish = config.pypi_publish.then(|| {
        let mut steps = vec![
            Step::uses("Checkout", "actions/checkout@v4"),
            Step::uses("Set up Python", "actions/setup-python@v5").with("python-version", "3.x"),
            Step::run("Install", "python -m pip install --upgrade pip build twine"),
            Step::run("Build", "python -m build"),
        ];
        if config.test_publish {
            steps.push(upload_step(
                "Publish to test.pypi.org",
                Some("https://test.pypi.org/legacy/"),
                "PYPI_TEST_TOKEN",
            ));
        }
        steps.push(upload_step("Publish to pypi.org", None, "PYPI_TOKEN"));
        Job {
            runs_on: "ubuntu-latest".to_string(),
            needs: Some("test".to_string()),
            condition: Some("startsWith(github.ref, 'refs/tags/')".to_string()),
            strategy: None,
            steps,
        }
    });

    Workflow {
        name: config.workflow_name.clone(),
        on: Triggers {
            push: PushTrigger {
                branches: vec![branch.to_string()],
                tags: vec!["*".to_string()],
            },
            pull_request: config.pull_requests.then(|| BranchFilter {
                branches: vec![branch.to_string()],
            }),
        },
        jobs: Jobs {
            test: Job {
                runs_on: "ubuntu-latest".to_string(),
                needs: None,
                condition: None,
                strategy: Some(Strategy {
                    matrix: Matrix {
                        python_version: python_versions,
                    },
                }),
                steps: test_steps,
            },
            publish,
        },
    }
}

/// Render the workflow file for `package`
pub fn render_workflow(
    package: &Package,
    config: &GithubActionsConfig,
    context: &RenderContext<'_>,
) -> Result<FileToRender> {
    let branch = match &config.branch {
        Some(branch) => branch.clone(),
        None => context
            .repo
            .map(|repo| repo.main_branch())
            .transpose()?
            .flatten()
            .ok_or_else(|| {
                ShoreError::config(format!(
                    "could not determine the main branch of {}, set github-actions.branch",
                    package.directory.display()
                ))
            })?,
    };

    let python_versions = match &config.python_versions {
        Some(versions) if versions.is_empty() => {
            return Err(ShoreError::config("github-actions.python-versions is empty"))
        }
        Some(versions) => versions.clone(),
        None => select_python_versions(package.config.python_requires.as_deref())?,
    };

    let workflow = build_workflow(package, config, &branch, python_versions);
    let contents = format!(
        "# This file was auto-generated by shore. Do not edit manually.\n{}",
        serde_yaml::to_string(&workflow)?
    );
    let path = package
        .directory
        .join(".github")
        .join("workflows")
        .join(config.filename());
    Ok(FileToRender::new(path, contents))
}

pub struct GithubActionsPlugin;

impl Plugin for GithubActionsPlugin {
    fn name(&self) -> &'static str {
        "github-actions"
    }

    fn files(&self, subject: &Subject, context: &RenderContext<'_>) -> Result<Vec<FileToRender>> {
        match subject {
            Subject::Package(package) => match &package.config.github_actions {
                Some(config) => Ok(vec![render_workflow(package, config, context)?]),
                None => Ok(Vec::new()),
            },
            Subject::Monorepo(_) => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[rstest]
    #[case(None, vec!["3.6", "3.7", "3.8", "3.9", "3.10", "3.11", "3.12", "3.x"])]
    #[case(Some(">=3.8"), vec!["3.8", "3.9", "3.10", "3.11", "3.12", "3.x"])]
    #[case(Some(">=3.7,<3.10"), vec!["3.7", "3.8", "3.9", "3.x"])]
    #[case(Some("~=3.10"), vec!["3.10", "3.11", "3.12", "3.x"])]
    #[case(Some("==3.9"), vec!["3.9", "3.x"])]
    fn test_select_python_versions(#[case] requires: Option<&str>, #[case] expected: Vec<&str>) {
        assert_eq!(select_python_versions(requires).unwrap(), expected);
    }

    #[test]
    fn test_select_python_versions_rejects_exclusions() {
        assert!(select_python_versions(Some(">=3.7,!=3.8")).is_err());
    }

    #[test]
    fn test_filename_slug() {
        let config = GithubActionsConfig::default();
        assert_eq!(config.filename(), "python-package-shore.yml");

        let config = GithubActionsConfig {
            workflow_filename: Some("ci.yaml".to_string()),
            ..GithubActionsConfig::default()
        };
        assert_eq!(config.filename(), "ci.yaml");
    }

    fn package(yaml: &str) -> (TempDir, Package) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.yaml"), yaml).unwrap();
        let package = Package::load(dir.path()).unwrap();
        (dir, package)
    }

    #[test]
    fn test_render_uses_detected_branch() {
        let (_dir, package) = package(
            "name: foo\nversion: 1.0.0\npython-requires: '>=3.11'\ntest:\n  pytest: pytest\ngithub-actions:\n  pypi-publish: true\n",
        );
        let mut repo = MockRepository::new();
        repo.set_main_branch("develop");
        let context = RenderContext { repo: Some(&repo) };

        let config = package.config.github_actions.clone().unwrap();
        let file = render_workflow(&package, &config, &context).unwrap();
        assert!(file
            .path
            .ends_with(".github/workflows/python-package-shore.yml"));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&file.contents).unwrap();
        assert_eq!(parsed["name"], "Python Package (Shore)");
        assert_eq!(parsed["on"]["push"]["branches"][0], "develop");
        assert_eq!(parsed["on"]["pull_request"]["branches"][0], "develop");
        assert_eq!(
            parsed["jobs"]["test"]["strategy"]["matrix"]["python-version"],
            serde_yaml::to_value(vec!["3.11", "3.12", "3.x"]).unwrap()
        );
        assert_eq!(parsed["jobs"]["test"]["steps"][3]["run"], "pytest");
        assert_eq!(parsed["jobs"]["publish"]["needs"], "test");
        assert_eq!(
            parsed["jobs"]["publish"]["steps"].as_sequence().unwrap().len(),
            6
        );
    }

    #[test]
    fn test_render_without_branch_fails() {
        let (_dir, package) = package("name: foo\nversion: 1.0.0\ngithub-actions: {}\n");
        let config = package.config.github_actions.clone().unwrap();
        let context = RenderContext { repo: None };
        assert!(render_workflow(&package, &config, &context).is_err());
    }
}
