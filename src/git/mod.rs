//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the Git operations
//! shore needs for tagging releases and inspecting history, allowing for a
//! real implementation and a mock implementation for testing.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A recording implementation for tests
//!
//! Workflows take `&dyn Repository` so they can run against either.
//!
//! ```rust
//! # use shore::git::Repository;
//! # fn example(repo: &dyn Repository) -> shore::Result<()> {
//! if repo.find_tag_oid("v1.0.0")?.is_none() {
//!     repo.create_tag("v1.0.0", false)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of change recorded for a file in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// A file with staged changes, relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// The configured git identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => write!(f, "{} <{}>", name, email),
            (Some(name), None) => f.write_str(name),
            (None, Some(email)) => write!(f, "<{}>", email),
            (None, None) => Ok(()),
        }
    }
}

/// Common git operation trait for abstraction
///
/// All methods return [crate::error::Result<T>]; implementations map
/// underlying errors (like `git2::Error`) to [crate::error::ShoreError].
pub trait Repository {
    /// Find a tag by name and return the commit it points to
    ///
    /// Handles both lightweight and annotated tags.
    ///
    /// # Returns
    /// * `Ok(Some(Oid))` - Commit the tag points to
    /// * `Ok(None)` - If the tag doesn't exist
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Abbreviated object id of the HEAD commit
    fn head_short_id(&self) -> Result<String>;

    /// Count commits reachable from HEAD but not from `since` that touch `path`
    ///
    /// # Arguments
    /// * `since` - Exclusive lower bound; `None` counts the whole history
    /// * `path` - Directory or file to restrict the count to; the repository
    ///   root counts every commit
    fn count_commits_since(&self, since: Option<Oid>, path: &Path) -> Result<usize>;

    /// Files with changes in the index (the staging area)
    fn staged_changes(&self) -> Result<Vec<StagedChange>>;

    /// Add files to the index
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;

    /// Commit the index on top of HEAD
    fn commit(&self, message: &str) -> Result<Oid>;

    /// Create a lightweight tag at HEAD, replacing an existing one if `force`
    fn create_tag(&self, name: &str, force: bool) -> Result<()>;

    /// The configured `user.name` / `user.email`, if any is set
    fn author(&self) -> Result<Option<Author>>;

    /// Name of the branch `refs/remotes/origin/HEAD` points to (e.g., "main")
    fn main_branch(&self) -> Result<Option<String>>;

    /// Root of the working tree, if known
    fn toplevel(&self) -> Option<PathBuf>;
}
