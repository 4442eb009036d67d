use crate::error::{Result, ShoreError};
use crate::git::{Author, ChangeKind, Repository, StagedChange};
use git2::Oid;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Mock repository for testing without actual git operations.
///
/// Records staged paths, commits and tags so tests can assert on them.
pub struct MockRepository {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    tags: HashMap<String, Oid>,
    staged: Vec<StagedChange>,
    commits: Vec<String>,
    commit_counts: HashMap<PathBuf, usize>,
    author: Option<Author>,
    main_branch: Option<String>,
    toplevel: Option<PathBuf>,
    next_oid: u8,
}

impl MockState {
    fn new_oid(&mut self) -> Oid {
        self.next_oid = self.next_oid.wrapping_add(1);
        Oid::from_bytes(&[self.next_oid; 20]).unwrap_or_else(|_| Oid::zero())
    }
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            state: Mutex::new(MockState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&mut self, name: impl Into<String>, oid: Oid) {
        self.state().tags.insert(name.into(), oid);
    }

    /// Pretend a file is already in the staging area
    pub fn add_staged(&mut self, path: impl Into<PathBuf>, kind: ChangeKind) {
        self.state().staged.push(StagedChange {
            path: path.into(),
            kind,
        });
    }

    /// Number of commits reported for `path` by `count_commits_since`
    pub fn set_commit_count(&mut self, path: impl Into<PathBuf>, count: usize) {
        self.state().commit_counts.insert(path.into(), count);
    }

    pub fn set_author(&mut self, name: &str, email: &str) {
        self.state().author = Some(Author {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
        });
    }

    pub fn set_main_branch(&mut self, branch: impl Into<String>) {
        self.state().main_branch = Some(branch.into());
    }

    pub fn set_toplevel(&mut self, path: impl Into<PathBuf>) {
        self.state().toplevel = Some(path.into());
    }

    /// Commit messages in creation order
    pub fn commits(&self) -> Vec<String> {
        self.state().commits.clone()
    }

    /// Names of all tags, sorted
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.state().tags.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Paths currently in the staging area
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.state().staged.iter().map(|c| c.path.clone()).collect()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        Ok(self.state().tags.get(tag_name).copied())
    }

    fn head_short_id(&self) -> Result<String> {
        Ok("abc1234".to_string())
    }

    fn count_commits_since(&self, _since: Option<Oid>, path: &Path) -> Result<usize> {
        Ok(self.state().commit_counts.get(path).copied().unwrap_or(0))
    }

    fn staged_changes(&self) -> Result<Vec<StagedChange>> {
        Ok(self.state().staged.clone())
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let mut state = self.state();
        for path in paths {
            if !state.staged.iter().any(|c| &c.path == path) {
                state.staged.push(StagedChange {
                    path: path.clone(),
                    kind: ChangeKind::Modified,
                });
            }
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<Oid> {
        let mut state = self.state();
        state.staged.clear();
        state.commits.push(message.to_string());
        Ok(state.new_oid())
    }

    fn create_tag(&self, name: &str, force: bool) -> Result<()> {
        let mut state = self.state();
        if state.tags.contains_key(name) && !force {
            return Err(ShoreError::tag(format!("Tag '{}' already exists", name)));
        }
        let oid = state.new_oid();
        state.tags.insert(name.to_string(), oid);
        Ok(())
    }

    fn author(&self) -> Result<Option<Author>> {
        Ok(self.state().author.clone())
    }

    fn main_branch(&self) -> Result<Option<String>> {
        Ok(self.state().main_branch.clone())
    }

    fn toplevel(&self) -> Option<PathBuf> {
        self.state().toplevel.clone()
    }
}
