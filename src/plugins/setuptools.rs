use crate::domain::VersionRef;
use crate::error::{Result, ShoreError};
use crate::model::{Package, Subject};
use crate::plugins::{py_str, BuildTarget, FileToRender, Plugin, PublishTarget, RenderContext};
use crate::process::{Invocation, Runner};
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const SETUP_PY: &str = "setup.py";

const TEST_PYPI_URL: &str = "https://test.pypi.org/legacy/";

fn setup_py_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*version\s*=\s*['"](?P<version>[^'"]+)['"]"#)
            .expect("version pattern is valid")
    })
}

/// Split `Name <email>` into its parts
fn split_author(author: &str) -> (String, Option<String>) {
    match (author.find('<'), author.rfind('>')) {
        (Some(open), Some(close)) if open < close => (
            author[..open].trim().to_string(),
            Some(author[open + 1..close].trim().to_string()),
        ),
        _ => (author.trim().to_string(), None),
    }
}

fn py_list(items: &[String], indent: &str) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    let mut out = String::from("[\n");
    for item in items {
        let _ = writeln!(out, "{}  {},", indent, py_str(item));
    }
    out.push_str(indent);
    out.push(']');
    out
}

/// Render the `setup.py` of a package
pub fn render_setup_py(package: &Package) -> String {
    let config = &package.config;
    let entry_file = package.entry_file();
    let relative_entry = entry_file
        .strip_prefix(&package.directory)
        .unwrap_or(&entry_file);
    let in_src = relative_entry.starts_with("src");
    let is_package = relative_entry
        .file_name()
        .is_some_and(|name| name == "__init__.py");

    let mut out = String::new();
    out.push_str("# This file was auto-generated by shore. Do not edit manually.\n");
    out.push_str("from setuptools import setup, find_packages\n");
    out.push_str("import io\nimport os\nimport sys\n\n");
    out.push_str("readme_file = 'README.md'\n");
    out.push_str("if os.path.isfile(readme_file):\n");
    out.push_str("  with io.open(readme_file, encoding='utf8') as fp:\n");
    out.push_str("    long_description = fp.read()\n");
    out.push_str("else:\n");
    out.push_str("  print(\"warning: file \\\"{}\\\" does not exist.\".format(readme_file), file=sys.stderr)\n");
    out.push_str("  long_description = None\n\n");
    let _ = writeln!(out, "requirements = {}\n", py_list(&config.requirements, ""));

    out.push_str("setup(\n");
    let _ = writeln!(out, "  name = {},", py_str(package.name()));
    let _ = writeln!(out, "  version = {},", py_str(&package.version.to_string()));
    if let Some(author) = &config.author {
        let (name, email) = split_author(author);
        let _ = writeln!(out, "  author = {},", py_str(&name));
        if let Some(email) = email {
            let _ = writeln!(out, "  author_email = {},", py_str(&email));
        }
    }
    if let Some(description) = &config.description {
        let _ = writeln!(out, "  description = {},", py_str(description));
    }
    out.push_str("  long_description = long_description,\n");
    out.push_str("  long_description_content_type = 'text/markdown',\n");
    if let Some(url) = &config.url {
        let _ = writeln!(out, "  url = {},", py_str(url));
    }
    if let Some(license) = &config.license {
        let _ = writeln!(out, "  license = {},", py_str(license));
    }

    let source_dir = if in_src { "'src'" } else { "'.'" };
    if is_package {
        let _ = writeln!(
            out,
            "  packages = find_packages({}, ['test', 'test.*', 'tests', 'tests.*', 'docs', 'docs.*']),",
            source_dir
        );
    } else {
        let _ = writeln!(out, "  py_modules = [{}],", py_str(&package.modulename()));
    }
    if in_src {
        out.push_str("  package_dir = {'': 'src'},\n");
    }
    out.push_str("  include_package_data = True,\n");
    out.push_str("  install_requires = requirements,\n");
    if let Some(python_requires) = &config.python_requires {
        let _ = writeln!(out, "  python_requires = {},", py_str(python_requires));
    }
    let _ = writeln!(out, "  classifiers = {},", py_list(&config.classifiers, "  "));

    if config.entrypoints.is_empty() {
        out.push_str("  entry_points = {},\n");
    } else {
        out.push_str("  entry_points = {\n");
        for (group, entries) in &config.entrypoints {
            let specs: Vec<String> = entries
                .iter()
                .map(|(name, target)| format!("{} = {}", name, target))
                .collect();
            let _ = writeln!(out, "    {}: {},", py_str(group), py_list(&specs, "    "));
        }
        out.push_str("  },\n");
    }
    out.push_str(")\n");
    out
}

/// Renders `setup.py`, tracks its version and builds with `python -m build`
pub struct SetuptoolsPlugin {
    python: String,
}

impl SetuptoolsPlugin {
    pub fn new(python: impl Into<String>) -> Self {
        SetuptoolsPlugin {
            python: python.into(),
        }
    }
}

impl Plugin for SetuptoolsPlugin {
    fn name(&self) -> &'static str {
        "setuptools"
    }

    fn version_refs(&self, subject: &Subject) -> Result<Vec<VersionRef>> {
        let path = subject.directory().join(SETUP_PY);
        Ok(VersionRef::find_in_file(&path, setup_py_version_regex())?
            .into_iter()
            .collect())
    }

    fn files(&self, subject: &Subject, _context: &RenderContext<'_>) -> Result<Vec<FileToRender>> {
        match subject {
            Subject::Package(package) => Ok(vec![FileToRender::new(
                package.directory.join(SETUP_PY),
                render_setup_py(package),
            )]),
            Subject::Monorepo(_) => Ok(Vec::new()),
        }
    }

    fn build_targets(&self, subject: &Subject) -> Vec<Box<dyn BuildTarget>> {
        let Subject::Package(package) = subject else {
            return Vec::new();
        };
        [DistributionKind::Sdist, DistributionKind::Wheel]
            .into_iter()
            .map(|kind| {
                Box::new(SetuptoolsBuild {
                    kind,
                    python: self.python.clone(),
                    directory: package.directory.clone(),
                    distribution_name: distribution_name(package),
                    version: package.version.to_string(),
                }) as Box<dyn BuildTarget>
            })
            .collect()
    }

    fn publish_targets(&self, subject: &Subject) -> Vec<Box<dyn PublishTarget>> {
        match subject {
            Subject::Package(_) => vec![Box::new(PypiPublish {
                python: self.python.clone(),
            })],
            Subject::Monorepo(_) => Vec::new(),
        }
    }
}

/// Name used in artifact filenames: runs of `-`, `_` and `.` become `_`
fn distribution_name(package: &Package) -> String {
    let mut name = String::new();
    let mut last_was_separator = false;
    for c in package.name().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_was_separator {
                name.push('_');
            }
            last_was_separator = true;
        } else {
            name.push(c.to_ascii_lowercase());
            last_was_separator = false;
        }
    }
    name
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionKind {
    Sdist,
    Wheel,
}

impl DistributionKind {
    fn name(&self) -> &'static str {
        match self {
            DistributionKind::Sdist => "sdist",
            DistributionKind::Wheel => "wheel",
        }
    }
}

pub struct SetuptoolsBuild {
    kind: DistributionKind,
    python: String,
    directory: PathBuf,
    distribution_name: String,
    version: String,
}

impl SetuptoolsBuild {
    fn matches(&self, file_name: &str) -> bool {
        let prefix = format!("{}-{}", self.distribution_name, self.version);
        match self.kind {
            DistributionKind::Sdist => file_name == format!("{}.tar.gz", prefix),
            DistributionKind::Wheel => {
                file_name.starts_with(&format!("{}-", prefix)) && file_name.ends_with(".whl")
            }
        }
    }
}

impl BuildTarget for SetuptoolsBuild {
    fn id(&self) -> String {
        format!("setuptools:{}", self.kind.name())
    }

    fn existing_artifacts(&self, build_dir: &Path) -> Result<Vec<PathBuf>> {
        if !build_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut artifacts = Vec::new();
        for entry in fs::read_dir(build_dir)? {
            let path = entry?.path();
            if path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| self.matches(name))
            {
                artifacts.push(path);
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }

    fn build(&self, build_dir: &Path, runner: &dyn Runner) -> Result<Vec<PathBuf>> {
        let invocation = Invocation::new(&self.python)
            .args(["-m", "build"])
            .arg(format!("--{}", self.kind.name()))
            .arg("--outdir")
            .path_arg(build_dir)
            .path_arg(&self.directory)
            .cwd(&self.directory);
        runner.run(&invocation)?;
        self.existing_artifacts(build_dir)
    }
}

pub struct PypiPublish {
    python: String,
}

impl PublishTarget for PypiPublish {
    fn id(&self) -> String {
        "pypi".to_string()
    }

    fn publish(&self, files: &[PathBuf], test: bool, runner: &dyn Runner) -> Result<()> {
        if files.is_empty() {
            return Err(ShoreError::command("no distributions to upload"));
        }
        let mut invocation = Invocation::new(&self.python).args(["-m", "twine", "upload"]);
        if test {
            invocation = invocation.args(["--repository-url", TEST_PYPI_URL]);
        }
        for file in files {
            invocation = invocation.path_arg(file);
        }
        runner.run(&invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::RecordingRunner;
    use tempfile::TempDir;

    fn package(yaml: &str) -> (TempDir, Package) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.yaml"), yaml).unwrap();
        let package = Package::load(dir.path()).unwrap();
        (dir, package)
    }

    #[test]
    fn test_split_author() {
        assert_eq!(
            split_author("Jane Doe <jane@example.com>"),
            ("Jane Doe".to_string(), Some("jane@example.com".to_string()))
        );
        assert_eq!(split_author("Jane"), ("Jane".to_string(), None));
    }

    #[test]
    fn test_render_setup_py() {
        let (_dir, package) = package(
            "name: my-pkg\nversion: 1.2.3\nauthor: Jane <jane@example.com>\nlicense: MIT\n\
             requirements: ['requests >=2.0']\npython-requires: '>=3.7'\n\
             entrypoints:\n  console_scripts:\n    my-pkg: my_pkg.__main__:main\n",
        );
        let rendered = render_setup_py(&package);

        assert!(rendered.contains("  name = 'my-pkg',\n"));
        assert!(rendered.contains("  version = '1.2.3',\n"));
        assert!(rendered.contains("  author_email = 'jane@example.com',\n"));
        assert!(rendered.contains("'requests >=2.0',"));
        assert!(rendered.contains("package_dir = {'': 'src'}"));
        assert!(rendered.contains("'my-pkg = my_pkg.__main__:main',"));
        assert!(rendered.contains("python_requires = '>=3.7',"));
    }

    #[test]
    fn test_setup_py_version_ref() {
        let (dir, package) = package("name: foo\nversion: 0.1.0\n");
        fs::write(dir.path().join(SETUP_PY), render_setup_py(&package)).unwrap();

        let subject = Subject::Package(package);
        let refs = SetuptoolsPlugin::new("python3").version_refs(&subject).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].value, "0.1.0");
    }

    #[test]
    fn test_build_targets_and_artifacts() {
        let (dir, package) = package("name: My.Pkg\nversion: 0.1.0\n");
        let subject = Subject::Package(package);
        let targets = SetuptoolsPlugin::new("python3").build_targets(&subject);
        let ids: Vec<String> = targets.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["setuptools:sdist", "setuptools:wheel"]);

        let dist = dir.path().join("dist");
        fs::create_dir(&dist).unwrap();
        fs::write(dist.join("my_pkg-0.1.0.tar.gz"), "").unwrap();
        fs::write(dist.join("my_pkg-0.1.0-py3-none-any.whl"), "").unwrap();
        fs::write(dist.join("my_pkg-0.0.9.tar.gz"), "").unwrap();

        assert_eq!(targets[0].existing_artifacts(&dist).unwrap().len(), 1);
        assert_eq!(targets[1].existing_artifacts(&dist).unwrap().len(), 1);

        let runner = RecordingRunner::new();
        targets[0].build(&dist, &runner).unwrap();
        let invocation = &runner.invocations()[0];
        assert_eq!(invocation.program, "python3");
        assert_eq!(&invocation.args[..3], &["-m", "build", "--sdist"]);
    }

    #[test]
    fn test_pypi_publish_test_index() {
        let runner = RecordingRunner::new();
        let target = PypiPublish {
            python: "python".to_string(),
        };
        target
            .publish(&[PathBuf::from("dist/a.whl")], true, &runner)
            .unwrap();
        let rendered = runner.invocations()[0].to_string();
        assert_eq!(
            rendered,
            "python -m twine upload --repository-url https://test.pypi.org/legacy/ dist/a.whl"
        );

        assert!(target.publish(&[], false, &runner).is_err());
    }
}
