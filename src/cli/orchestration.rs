//! Dispatch of parsed commands to the workflows.
//!
//! This keeps argument parsing separate from the operations so that
//! commands can be run programmatically with any output sink.

use crate::cli::{ChangelogCommand, ClassifiersCommand, Command};
use crate::config::Config;
use crate::error::Result;
use crate::git::{Git2Repository, Repository};
use crate::model::Subject;
use crate::process::SystemRunner;
use crate::workflow::bump::{self, BumpFlags, BumpOperation, BumpOptions};
use crate::workflow::changelog::{self, AddOptions};
use crate::workflow::metadata::{self, LicenseOutput};
use crate::workflow::scaffold::{self, NewOptions};
use crate::workflow::{checks, link, publish, test_runner, update, Context};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

fn open_repository(directory: &Path) -> Option<Git2Repository> {
    match Git2Repository::open(directory) {
        Ok(repo) => Some(repo),
        Err(e) => {
            debug!("no git repository at {}: {}", directory.display(), e);
            None
        }
    }
}

/// The directory the subject is loaded from
fn subject_directory(command: &Command) -> PathBuf {
    match command {
        Command::Bump(args) => args.path.clone().unwrap_or_else(|| PathBuf::from(".")),
        _ => PathBuf::from("."),
    }
}

/// Run `command` with the current directory as the default subject
/// location, writing reports to `out`. Returns the exit code.
pub fn dispatch(command: Command, config: &Config, out: &mut dyn Write) -> Result<i32> {
    let directory = subject_directory(&command);
    let repo = open_repository(&directory);
    let repo_ref = repo.as_ref().map(|repo| repo as &dyn Repository);
    let mut ctx = Context::new(config, repo_ref, out);

    match command {
        Command::License(args) => {
            if args.license_name == "list" {
                metadata::license_list(&mut ctx)
            } else {
                let output = LicenseOutput::from_flags(args.json, args.text, args.notice)?;
                metadata::license(&args.license_name, output, &mut ctx)
            }
        }
        Command::Classifiers(ClassifiersCommand::Search { q }) => {
            metadata::classifiers_search(&q, &mut ctx)
        }
        Command::New(args) => scaffold::new_project(
            NewOptions {
                name: args.name,
                directory: args.directory,
                version: args.version,
                author: args.author,
                license: args.license,
                modulename: args.modulename,
                monorepo: args.monorepo,
            },
            &mut ctx,
        ),
        Command::Checks(args) => {
            let subject = Subject::load(&directory)?;
            checks::run_checks(&subject, args.treat_warnings_as_errors, &mut ctx)
        }
        Command::Bump(args) => {
            let operation = BumpOperation::from_flags(&BumpFlags {
                version: args.version,
                major: args.major,
                minor: args.minor,
                patch: args.patch,
                post: args.post,
                ci: args.ci,
                show: args.show,
                get_single_version: args.get_single_version,
                status: args.status,
            })?;
            let options = BumpOptions {
                force: args.force,
                tag: args.tag,
                dry: args.dry,
                skip_checks: args.skip_checks,
            };
            let subject = Subject::load(&directory)?;
            bump::bump(&subject, &operation, &options, &mut ctx)
        }
        Command::Update(args) => {
            let subject = Subject::load(&directory)?;
            update::update(&subject, args.skip_checks, args.dry, &mut ctx)
        }
        Command::Verify(args) => {
            let subject = Subject::load(&directory)?;
            update::verify(&subject, args.tag.as_deref(), &mut ctx)
        }
        Command::Build(args) => {
            let subject = Subject::load(&directory)?;
            publish::build(
                &subject,
                args.target.as_deref(),
                args.build_dir.as_deref(),
                &SystemRunner,
                &mut ctx,
            )
        }
        Command::Publish(args) => {
            let subject = Subject::load(&directory)?;
            publish::publish(
                &subject,
                args.target.as_deref(),
                args.test,
                args.build_dir.as_deref(),
                args.reuse,
                &SystemRunner,
                &mut ctx,
            )
        }
        Command::Test(args) => {
            let subject = Subject::load(&directory)?;
            test_runner::run_tests(&subject, &args.names, args.no_line_prefix, &mut ctx)
        }
        Command::Changelog(command) => {
            let subject = Subject::load(&directory)?;
            match command {
                ChangelogCommand::Add {
                    kind,
                    description,
                    author,
                    pr,
                    issues,
                    commit,
                } => changelog::add(
                    &subject,
                    AddOptions {
                        kind,
                        description,
                        author,
                        pr,
                        issues,
                        commit,
                    },
                    &mut ctx,
                ),
                ChangelogCommand::Format {
                    markdown,
                    all,
                    version,
                } => changelog::format(&subject, markdown, all, version.as_deref(), &mut ctx),
                ChangelogCommand::Release { version } => {
                    changelog::release(&subject, &version, &mut ctx)
                }
            }
        }
        Command::Link(args) => {
            let subject = Subject::load(&directory)?;
            link::link(
                &subject,
                args.python.as_deref(),
                args.dump_pyproject,
                args.no_venv_check,
                &SystemRunner,
                &mut ctx,
            )
        }
    }
}
