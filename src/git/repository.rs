use crate::domain::version_ref::normalize_path;
use crate::error::{Result, ShoreError};
use crate::git::{Author, ChangeKind, StagedChange};
use git2::{Commit, DiffOptions, ErrorCode, Oid, Repository as Git2Repo, StatusOptions};
use std::fs;
use std::path::{Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    workdir: PathBuf,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        Self::from_git2(repo)
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Result<Self> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| git2::Error::from_str("bare repositories are not supported"))?;
        let workdir = fs::canonicalize(workdir)?;
        Ok(Git2Repository { repo, workdir })
    }

    /// Root of the working tree
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Path of `path` relative to the working tree root
    fn relative(&self, path: &Path) -> Result<PathBuf> {
        let absolute = normalize_path(path);
        absolute
            .strip_prefix(&self.workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                ShoreError::Git(git2::Error::from_str(&format!(
                    "'{}' is outside of the repository at '{}'",
                    path.display(),
                    self.workdir.display()
                )))
            })
    }

    fn commit_touches(&self, commit: &Commit<'_>, relative: &Path) -> Result<bool> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };

        let mut options = DiffOptions::new();
        options.pathspec(relative);
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut options))?;
        Ok(diff.deltas().len() > 0)
    }
}

/// The identity from the user's global git configuration, for use outside of
/// a repository
pub fn global_author() -> Result<Option<Author>> {
    let config = git2::Config::open_default()?;
    Ok(author_from_config(&config))
}

fn author_from_config(config: &git2::Config) -> Option<Author> {
    let name = config.get_string("user.name").ok();
    let email = config.get_string("user.email").ok();
    if name.is_none() && email.is_none() {
        None
    } else {
        Some(Author { name, email })
    }
}

impl super::Repository for Git2Repository {
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference
                    .peel_to_commit()
                    .map_err(|e| ShoreError::tag(format!("Cannot peel tag: {}", e)))?;
                Ok(Some(commit.id()))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(ShoreError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn head_short_id(&self) -> Result<String> {
        let head = self.repo.head()?.peel_to_commit()?;
        let short = head.as_object().short_id()?;
        Ok(short.as_str().unwrap_or_default().to_string())
    }

    fn count_commits_since(&self, since: Option<Oid>, path: &Path) -> Result<usize> {
        let relative = self.relative(path)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        if let Some(oid) = since {
            revwalk.hide(oid)?;
        }

        let mut count = 0;
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if relative.as_os_str().is_empty() || self.commit_touches(&commit, &relative)? {
                count += 1;
            }
        }
        Ok(count)
    }

    fn staged_changes(&self) -> Result<Vec<StagedChange>> {
        let mut options = StatusOptions::new();
        options.include_untracked(false);
        let statuses = self.repo.statuses(Some(&mut options))?;

        let mut changes = Vec::new();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let status = entry.status();
            let kind = if status.is_index_new() {
                ChangeKind::Added
            } else if status.is_index_modified() || status.is_index_typechange() {
                ChangeKind::Modified
            } else if status.is_index_deleted() {
                ChangeKind::Deleted
            } else if status.is_index_renamed() {
                ChangeKind::Renamed
            } else {
                continue;
            };
            changes.push(StagedChange {
                path: PathBuf::from(path),
                kind,
            });
        }
        Ok(changes)
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            let relative = self.relative(path)?;
            if path.exists() {
                index.add_path(&relative)?;
            } else {
                index.remove_path(&relative)?;
            }
        }
        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                None
            }
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        Ok(oid)
    }

    fn create_tag(&self, name: &str, force: bool) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo
            .tag_lightweight(name, head.as_object(), force)
            .map_err(|e| ShoreError::tag(format!("Cannot create tag '{}': {}", name, e)))?;
        Ok(())
    }

    fn author(&self) -> Result<Option<Author>> {
        let config = self.repo.config()?;
        Ok(author_from_config(&config))
    }

    fn main_branch(&self) -> Result<Option<String>> {
        match self.repo.find_reference("refs/remotes/origin/HEAD") {
            Ok(reference) => Ok(reference
                .symbolic_target()
                .and_then(|target| target.rsplit('/').next())
                .map(|branch| branch.trim().to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn toplevel(&self) -> Option<PathBuf> {
        Some(self.workdir.clone())
    }
}
