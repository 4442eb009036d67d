//! The operations behind each command.
//!
//! Workflows receive the loaded subject and a [Context] and return the exit
//! code of the command. Reports go to `Context::out`; failures that should be
//! reported as plain errors are returned as `Err`.

pub mod bump;
pub mod changelog;
pub mod checks;
pub mod link;
pub mod metadata;
pub mod publish;
pub mod scaffold;
pub mod test_runner;
pub mod update;
pub mod warning;

use crate::config::Config;
use crate::error::{Result, ShoreError};
use crate::git::Repository;
use std::io::Write;
use std::path::Path;

/// Everything a workflow needs besides its subject
pub struct Context<'a> {
    pub config: &'a Config,
    /// `None` outside of a git repository
    pub repo: Option<&'a dyn Repository>,
    pub out: &'a mut dyn Write,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a Config, repo: Option<&'a dyn Repository>, out: &'a mut dyn Write) -> Self {
        Context { config, repo, out }
    }

    /// The repository, or an error naming the operation that needs it
    pub fn require_repo(&self, operation: &str) -> Result<&'a dyn Repository> {
        self.repo.ok_or_else(|| {
            ShoreError::usage(format!("{} requires a git repository", operation))
        })
    }
}

/// `path` relative to `base` for display
pub(crate) fn relative_display(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}
