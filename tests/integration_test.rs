// tests/integration_test.rs
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn shore(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shore"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute shore")
}

fn package_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.yaml"),
        "name: foo\nversion: 1.0.0\nauthor: me\nlicense: MIT\ntest:\n  hello: echo hello\n",
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("src/foo")).unwrap();
    fs::write(dir.path().join("src/foo/__init__.py"), "__version__ = '1.0.0'\n").unwrap();
    dir
}

#[test]
fn test_shore_help() {
    let dir = TempDir::new().unwrap();
    let output = shore(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("shore"));
    assert!(stdout.contains("bump"));
    assert!(stdout.contains("changelog"));
}

#[test]
fn test_shore_version() {
    let dir = TempDir::new().unwrap();
    let output = shore(dir.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_conflicting_bump_options_are_usage_errors() {
    let dir = package_dir();
    let output = shore(dir.path(), &["bump", "--major", "--minor"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("conflicting options: --minor and --major"));
}

#[test]
fn test_missing_bump_operation() {
    let dir = package_dir();
    let output = shore(dir.path(), &["bump"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)
        .unwrap()
        .contains("no operation specified"));
}

#[test]
fn test_bump_path_is_resolved_before_change_directory() {
    let dir = package_dir();
    let parent = dir.path().parent().unwrap();
    let name = dir.path().file_name().unwrap().to_str().unwrap();

    let output = shore(parent, &["-C", "/", "bump", name, "--get-single-version"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim(), "1.0.0");
}

#[test]
fn test_checks_and_test_commands() {
    let dir = package_dir();

    let output = shore(dir.path(), &["checks"]);
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .contains("INFO (foo): missing $.url"));

    let output = shore(dir.path(), &["checks", "--treat-warnings-as-errors"]);
    assert!(output.status.success());

    let output = shore(dir.path(), &["test"]);
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("hello| hello"));

    let output = shore(dir.path(), &["test", "nope"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_update_then_verify() {
    let dir = package_dir();

    let output = shore(dir.path(), &["verify"]);
    assert_eq!(output.status.code(), Some(1));

    assert!(shore(dir.path(), &["update"]).status.success());
    assert!(dir.path().join("setup.py").exists());
    assert!(shore(dir.path(), &["verify", "--tag", "v1.0.0"]).status.success());
}

#[test]
fn test_missing_subject() {
    let dir = TempDir::new().unwrap();
    let output = shore(dir.path(), &["checks"]);
    assert_eq!(output.status.code(), Some(2));
}
