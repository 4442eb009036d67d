// tests/bump_test.rs
use git2::{IndexAddOption, Repository as Git2Repo, Signature};
use shore::changelog::ChangelogManager;
use shore::config::Config;
use shore::git::{Git2Repository, Repository};
use shore::model::Subject;
use shore::workflow::bump::{bump, BumpFlags, BumpOperation, BumpOptions};
use shore::workflow::Context;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PACKAGE_YAML: &str = "name: foo\nversion: 1.0.0\nauthor: Jane Doe <jane@example.com>\nlicense: MIT\n";

fn commit_all(repo: &Git2Repo, message: &str) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let signature = Signature::now("Test User", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap();
}

fn write_package(dir: &Path, yaml: &str, init_version: &str) {
    fs::write(dir.join("package.yaml"), yaml).unwrap();
    fs::create_dir_all(dir.join("src/foo")).unwrap();
    fs::write(
        dir.join("src/foo/__init__.py"),
        format!("\n__version__ = '{}'\n", init_version),
    )
    .unwrap();
}

/// A repository with a committed package at its root
fn package_repo(init_version: &str) -> (TempDir, Git2Repo) {
    let dir = TempDir::new().unwrap();
    let repo = Git2Repo::init(dir.path()).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }
    write_package(dir.path(), PACKAGE_YAML, init_version);
    commit_all(&repo, "initial commit");
    (dir, repo)
}

fn operation(flags: BumpFlags) -> BumpOperation {
    BumpOperation::from_flags(&flags).unwrap()
}

fn patch() -> BumpOperation {
    operation(BumpFlags {
        patch: true,
        ..BumpFlags::default()
    })
}

fn tag_options() -> BumpOptions {
    BumpOptions {
        tag: true,
        ..BumpOptions::default()
    }
}

fn run_bump(dir: &Path, op: &BumpOperation, options: &BumpOptions) -> (shore::Result<i32>, String) {
    let repo = Git2Repository::open(dir).unwrap();
    let subject = Subject::load(dir).unwrap();
    let config = Config::default();
    let mut out = Vec::new();
    let result = {
        let mut ctx = Context::new(&config, Some(&repo as &dyn Repository), &mut out);
        bump(&subject, op, options, &mut ctx)
    };
    let text = console::strip_ansi_codes(&String::from_utf8(out).unwrap()).to_string();
    (result, text)
}

fn head_message(repo: &Git2Repo) -> String {
    repo.head()
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .message()
        .unwrap()
        .to_string()
}

#[test]
fn test_bump_patch_with_tag() {
    let (dir, repo) = package_repo("1.0.0");

    let (result, output) = run_bump(dir.path(), &patch(), &tag_options());
    assert_eq!(result.unwrap(), 0);
    assert!(output.contains("package.yaml: 1.0.0 → 1.0.1"));

    assert!(fs::read_to_string(dir.path().join("package.yaml"))
        .unwrap()
        .contains("version: 1.0.1"));
    assert!(fs::read_to_string(dir.path().join("src/foo/__init__.py"))
        .unwrap()
        .contains("__version__ = '1.0.1'"));

    assert_eq!(head_message(&repo), "(foo) bump version to 1.0.1");
    assert!(repo.find_reference("refs/tags/v1.0.1").is_ok());
    assert!(repo.statuses(None).unwrap().is_empty());
}

#[test]
fn test_tag_refuses_added_files_before_rewriting() {
    let (dir, repo) = package_repo("1.0.0");
    fs::write(dir.path().join("NEW.md"), "new\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("NEW.md")).unwrap();
    index.write().unwrap();

    let (result, _) = run_bump(dir.path(), &patch(), &tag_options());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("staging area"));

    assert!(fs::read_to_string(dir.path().join("package.yaml"))
        .unwrap()
        .contains("version: 1.0.0"));
    assert!(repo.find_reference("refs/tags/v1.0.1").is_err());
}

#[test]
fn test_inconsistent_versions_need_force() {
    let (dir, _repo) = package_repo("0.9.0");

    let (result, _) = run_bump(dir.path(), &patch(), &BumpOptions::default());
    assert_eq!(result.unwrap(), 1);

    let get_single = operation(BumpFlags {
        get_single_version: true,
        ..BumpFlags::default()
    });
    let (result, _) = run_bump(dir.path(), &get_single, &BumpOptions::default());
    assert_eq!(result.unwrap(), 1);

    let show = operation(BumpFlags {
        show: true,
        ..BumpFlags::default()
    });
    let (result, output) = run_bump(dir.path(), &show, &BumpOptions::default());
    assert_eq!(result.unwrap(), 0);
    assert!(output.contains("src/foo/__init__.py: 0.9.0"));

    let force = BumpOptions {
        force: true,
        ..BumpOptions::default()
    };
    let (result, _) = run_bump(dir.path(), &patch(), &force);
    assert_eq!(result.unwrap(), 0);
    assert!(fs::read_to_string(dir.path().join("src/foo/__init__.py"))
        .unwrap()
        .contains("__version__ = '1.0.1'"));
}

#[test]
fn test_lower_or_equal_version_is_rejected() {
    let (dir, _repo) = package_repo("1.0.0");

    for version in ["0.5.0", "1.0.0"] {
        let op = operation(BumpFlags {
            version: Some(version.to_string()),
            ..BumpFlags::default()
        });
        let (result, _) = run_bump(dir.path(), &op, &BumpOptions::default());
        assert!(result.unwrap_err().is_usage());
    }

    let op = operation(BumpFlags {
        version: Some("0.5.0".to_string()),
        ..BumpFlags::default()
    });
    let force = BumpOptions {
        force: true,
        ..BumpOptions::default()
    };
    let (result, _) = run_bump(dir.path(), &op, &force);
    assert_eq!(result.unwrap(), 0);
    assert!(fs::read_to_string(dir.path().join("package.yaml"))
        .unwrap()
        .contains("version: 0.5.0"));
}

#[test]
fn test_dry_run_changes_nothing() {
    let (dir, repo) = package_repo("1.0.0");
    let options = BumpOptions {
        tag: true,
        dry: true,
        ..BumpOptions::default()
    };

    let (result, output) = run_bump(dir.path(), &patch(), &options);
    assert_eq!(result.unwrap(), 0);
    assert!(output.contains("would create tag v1.0.1"));
    assert!(fs::read_to_string(dir.path().join("package.yaml"))
        .unwrap()
        .contains("version: 1.0.0"));
    assert!(repo.find_reference("refs/tags/v1.0.1").is_err());
}

#[test]
fn test_status_counts_commits_since_tag() {
    let (dir, repo) = package_repo("1.0.0");
    let status = operation(BumpFlags {
        status: true,
        ..BumpFlags::default()
    });

    let (result, output) = run_bump(dir.path(), &status, &BumpOptions::default());
    assert_eq!(result.unwrap(), 0);
    assert!(output.contains("tag \"v1.0.0\" not found"));

    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.tag_lightweight("v1.0.0", head.as_object(), false).unwrap();
    let (_, output) = run_bump(dir.path(), &status, &BumpOptions::default());
    assert!(output.contains("no commits since \"v1.0.0\""));

    fs::write(dir.path().join("README.md"), "# foo\n").unwrap();
    commit_all(&repo, "add readme");
    let (_, output) = run_bump(dir.path(), &status, &BumpOptions::default());
    assert!(output.contains("1 commit since \"v1.0.0\""));
}

#[test]
fn test_bump_releases_unreleased_changelog() {
    let (dir, repo) = package_repo("1.0.0");
    let subject = Subject::load(dir.path()).unwrap();
    let manager = ChangelogManager::new(subject.directory(), subject.changelog_config());
    let entry = manager
        .make_entry("feature", "Add things", "jane@example.com", None, Vec::new())
        .unwrap();
    manager.add(entry).unwrap();
    commit_all(&repo, "add changelog entry");

    let (result, _) = run_bump(dir.path(), &patch(), &tag_options());
    assert_eq!(result.unwrap(), 0);

    assert!(!manager.unreleased().exists());
    let released = manager.version("1.0.1").load().unwrap();
    assert!(released.release_date.is_some());
    assert_eq!(released.entries.len(), 1);
    assert!(repo.statuses(None).unwrap().is_empty());
}

#[test]
fn test_mono_versioned_package_must_be_bumped_through_monorepo() {
    let dir = TempDir::new().unwrap();
    let repo = Git2Repo::init(dir.path()).unwrap();
    fs::write(
        dir.path().join("monorepo.yaml"),
        "name: mono\nversion: 2.0.0\nmono-versioning: true\n",
    )
    .unwrap();
    let package_dir = dir.path().join("foo");
    fs::create_dir_all(&package_dir).unwrap();
    write_package(
        &package_dir,
        "name: foo\nauthor: Jane Doe <jane@example.com>\nlicense: MIT\n",
        "2.0.0",
    );
    commit_all(&repo, "initial commit");

    let (result, _) = run_bump(&package_dir, &patch(), &BumpOptions::default());
    assert!(result.is_err());

    let minor = operation(BumpFlags {
        minor: true,
        ..BumpFlags::default()
    });
    let (result, _) = run_bump(dir.path(), &minor, &BumpOptions::default());
    assert_eq!(result.unwrap(), 0);
    assert!(fs::read_to_string(dir.path().join("monorepo.yaml"))
        .unwrap()
        .contains("version: 2.1.0"));
    assert!(fs::read_to_string(package_dir.join("src/foo/__init__.py"))
        .unwrap()
        .contains("__version__ = '2.1.0'"));
}

#[test]
fn test_existing_release_changelog_aborts_before_rewriting() {
    let (dir, repo) = package_repo("1.0.0");
    let subject = Subject::load(dir.path()).unwrap();
    let manager = ChangelogManager::new(subject.directory(), subject.changelog_config());
    let entry = manager
        .make_entry("fix", "Fix things", "jane@example.com", None, Vec::new())
        .unwrap();
    manager.add(entry).unwrap();
    let released = manager.version("1.0.1");
    fs::write(&released.path, "[changelog]\nentries = []\n").unwrap();
    commit_all(&repo, "add changelogs");

    let (result, _) = run_bump(dir.path(), &patch(), &tag_options());
    assert!(result.unwrap_err().to_string().contains("already exists"));

    assert!(fs::read_to_string(dir.path().join("package.yaml"))
        .unwrap()
        .contains("version: 1.0.0"));
    assert!(fs::read_to_string(dir.path().join("src/foo/__init__.py"))
        .unwrap()
        .contains("__version__ = '1.0.0'"));
    assert!(manager.unreleased().exists());
    assert!(repo.find_reference("refs/tags/v1.0.1").is_err());
    assert!(repo.statuses(None).unwrap().is_empty());
}

fn ci() -> BumpOperation {
    operation(BumpFlags {
        ci: true,
        ..BumpFlags::default()
    })
}

fn head_short_id(repo: &Git2Repo) -> String {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    let short = head.as_object().short_id().unwrap();
    short.as_str().unwrap().to_string()
}

/// A repository with the package in `pkg/` next to an unrelated directory
fn nested_package_repo() -> (TempDir, Git2Repo) {
    let dir = TempDir::new().unwrap();
    let repo = Git2Repo::init(dir.path()).unwrap();
    let package_dir = dir.path().join("pkg");
    fs::create_dir_all(&package_dir).unwrap();
    write_package(&package_dir, PACKAGE_YAML, "1.0.0");
    commit_all(&repo, "initial commit");
    (dir, repo)
}

#[test]
fn test_ci_version_counts_commits_touching_the_package() {
    let (dir, repo) = nested_package_repo();
    let package_dir = dir.path().join("pkg");
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.tag_lightweight("v1.0.0", head.as_object(), false).unwrap();

    fs::write(package_dir.join("README.md"), "# foo\n").unwrap();
    commit_all(&repo, "add readme");
    fs::create_dir_all(dir.path().join("other")).unwrap();
    fs::write(dir.path().join("other/notes.txt"), "unrelated\n").unwrap();
    commit_all(&repo, "add notes");

    let (result, _) = run_bump(&package_dir, &ci(), &BumpOptions::default());
    assert_eq!(result.unwrap(), 0);

    let expected = format!("1.0.0+1.g{}", head_short_id(&repo));
    assert!(fs::read_to_string(package_dir.join("package.yaml"))
        .unwrap()
        .contains(&format!("version: {}", expected)));
    assert!(fs::read_to_string(package_dir.join("src/foo/__init__.py"))
        .unwrap()
        .contains(&format!("__version__ = '{}'", expected)));
}

#[test]
fn test_ci_version_without_tag_counts_all_package_commits() {
    let (dir, repo) = nested_package_repo();
    let package_dir = dir.path().join("pkg");
    fs::write(package_dir.join("README.md"), "# foo\n").unwrap();
    commit_all(&repo, "add readme");
    fs::write(dir.path().join("notes.txt"), "unrelated\n").unwrap();
    commit_all(&repo, "add notes");

    let (result, _) = run_bump(&package_dir, &ci(), &BumpOptions::default());
    assert_eq!(result.unwrap(), 0);

    let expected = format!("1.0.0+2.g{}", head_short_id(&repo));
    assert!(fs::read_to_string(package_dir.join("package.yaml"))
        .unwrap()
        .contains(&format!("version: {}", expected)));
}
