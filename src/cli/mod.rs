//! Command line definition.

pub mod orchestration;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "shore",
    version,
    about = "Manage Python package and monorepo metadata"
)]
pub struct Cli {
    /// Change to DIR before running the command
    #[arg(short = 'C', long = "change-directory", value_name = "DIR", global = true)]
    pub change_directory: Option<PathBuf>,

    /// Increase log output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Custom configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show SPDX license details; `license list` lists all identifiers
    License(LicenseArgs),

    /// Query the PyPI trove classifiers
    #[command(subcommand)]
    Classifiers(ClassifiersCommand),

    /// Create a new package or monorepo
    New(NewArgs),

    /// Run sanity checks on the package or monorepo
    Checks(ChecksArgs),

    /// Bump the version of the package or monorepo
    Bump(BumpArgs),

    /// Render generated files such as setup.py
    Update(UpdateArgs),

    /// Check that generated files are up to date
    Verify(VerifyArgs),

    /// Build distributions
    Build(BuildArgs),

    /// Build and upload distributions
    Publish(PublishArgs),

    /// Run the configured test commands
    Test(TestArgs),

    /// Manage changelog entries
    #[command(subcommand)]
    Changelog(ChangelogCommand),

    /// Symlink the package into a Python environment using Flit
    Link(LinkArgs),
}

#[derive(Debug, Args)]
pub struct LicenseArgs {
    /// SPDX license identifier, or `list`
    pub license_name: String,

    /// Print the license metadata as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the license text
    #[arg(long)]
    pub text: bool,

    /// Print the standard license header, or the text if there is none
    #[arg(long)]
    pub notice: bool,
}

#[derive(Debug, Subcommand)]
pub enum ClassifiersCommand {
    /// Print the classifiers containing a search term
    Search {
        /// Search term, case insensitive
        q: String,
    },
}

#[derive(Debug, Args)]
pub struct NewArgs {
    pub name: String,

    /// Target directory, defaults to ./NAME
    pub directory: Option<PathBuf>,

    #[arg(long)]
    pub version: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub license: Option<String>,

    #[arg(long)]
    pub modulename: Option<String>,

    /// Create a monorepo.yaml instead of a package.yaml
    #[arg(long)]
    pub monorepo: bool,
}

#[derive(Debug, Args)]
pub struct ChecksArgs {
    #[arg(long)]
    pub treat_warnings_as_errors: bool,
}

#[derive(Debug, Args)]
pub struct BumpArgs {
    /// Package or monorepo directory, relative to the directory shore was started in
    pub path: Option<PathBuf>,

    /// Do not run checks before bumping
    #[arg(long)]
    pub skip_checks: bool,

    /// Bump to an explicit version
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    #[arg(long)]
    pub major: bool,

    #[arg(long)]
    pub minor: bool,

    #[arg(long)]
    pub patch: bool,

    #[arg(long)]
    pub post: bool,

    /// Append the commit distance and HEAD id as build metadata
    #[arg(long)]
    pub ci: bool,

    /// Ignore failed checks, inconsistent or lower versions and replace existing tags
    #[arg(long)]
    pub force: bool,

    /// Commit the changes and create a tag
    #[arg(long)]
    pub tag: bool,

    /// Do not write any files
    #[arg(long)]
    pub dry: bool,

    /// List the version refs
    #[arg(long)]
    pub show: bool,

    /// Print the version if all refs agree
    #[arg(long)]
    pub get_single_version: bool,

    /// Show the number of commits since the last release
    #[arg(long)]
    pub status: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub skip_checks: bool,

    /// Only list the files that would be written
    #[arg(long)]
    pub dry: bool,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Check that TAG matches the version of exactly one package
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Target id or id prefix, e.g. `setuptools` or `setuptools:wheel`
    pub target: Option<String>,

    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Target id or id prefix, e.g. `pypi`
    pub target: Option<String>,

    /// Upload to the test index
    #[arg(long)]
    pub test: bool,

    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Upload existing artifacts instead of rebuilding them
    #[arg(long)]
    pub reuse: bool,
}

#[derive(Debug, Args)]
pub struct TestArgs {
    /// Tests to run: `name`, or in a monorepo `project:name`, `:name` or `project`
    pub names: Vec<String>,

    #[arg(long)]
    pub no_line_prefix: bool,
}

#[derive(Debug, Subcommand)]
pub enum ChangelogCommand {
    /// Add an entry to the unreleased changelog
    Add {
        #[arg(short = 't', long = "type")]
        kind: String,

        #[arg(short, long)]
        description: String,

        /// Defaults to the git email address
        #[arg(short, long)]
        author: Option<String>,

        #[arg(long)]
        pr: Option<String>,

        #[arg(short, long = "issue")]
        issues: Vec<String>,

        /// Commit the changelog file
        #[arg(short, long)]
        commit: bool,
    },

    /// Render changelogs in the terminal or as Markdown
    Format {
        #[arg(short, long)]
        markdown: bool,

        /// Render all changelogs, newest first
        #[arg(short, long)]
        all: bool,

        version: Option<String>,
    },

    /// Move the unreleased entries into the changelog of VERSION
    Release { version: String },
}

#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Python interpreter to install into
    #[arg(long, value_name = "BIN")]
    pub python: Option<String>,

    /// Print the rewritten pyproject.toml instead of installing
    #[arg(long)]
    pub dump_pyproject: bool,

    /// Link even when no virtual environment is active
    #[arg(long)]
    pub no_venv_check: bool,
}

fn absolutize(path: &mut Option<PathBuf>, cwd: &Path) {
    if let Some(p) = path.as_mut() {
        if p.is_relative() {
            *p = cwd.join(&*p);
        }
    }
}

impl Cli {
    /// Resolve paths given on the command line against `cwd`, the directory
    /// shore was started in, so that `-C` does not change their meaning.
    pub fn absolutize_paths(&mut self, cwd: &Path) {
        absolutize(&mut self.config, cwd);
        absolutize(&mut self.change_directory, cwd);
        match &mut self.command {
            Command::Bump(args) => absolutize(&mut args.path, cwd),
            Command::Build(args) => absolutize(&mut args.build_dir, cwd),
            Command::Publish(args) => absolutize(&mut args.build_dir, cwd),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bump_version_flag_is_not_the_program_version() {
        let cli = Cli::try_parse_from(["shore", "bump", "--version", "1.2.3", "--tag"]).unwrap();
        let Command::Bump(args) = cli.command else {
            panic!("expected bump");
        };
        assert_eq!(args.version.as_deref(), Some("1.2.3"));
        assert!(args.tag);
    }

    #[test]
    fn test_absolutize_paths() {
        let mut cli = Cli::try_parse_from(["shore", "-C", "sub", "bump", "pkg", "--show"]).unwrap();
        cli.absolutize_paths(Path::new("/work"));
        assert_eq!(cli.change_directory, Some(PathBuf::from("/work/sub")));
        let Command::Bump(args) = cli.command else {
            panic!("expected bump");
        };
        assert_eq!(args.path, Some(PathBuf::from("/work/pkg")));
    }

    #[test]
    fn test_changelog_add_flags() {
        let cli = Cli::try_parse_from([
            "shore", "changelog", "add", "-t", "fix", "-d", "Fix it", "-i", "1", "-i", "2", "-c",
        ])
        .unwrap();
        let Command::Changelog(ChangelogCommand::Add { kind, issues, commit, .. }) = cli.command else {
            panic!("expected changelog add");
        };
        assert_eq!(kind, "fix");
        assert_eq!(issues, vec!["1", "2"]);
        assert!(commit);
    }
}
