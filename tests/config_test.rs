// tests/config_test.rs
use serial_test::serial;
use shore::config::{load_config, Config, CONFIG_FILENAME};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

struct CurrentDirGuard(PathBuf);

impl CurrentDirGuard {
    fn enter(dir: &Path) -> Self {
        let previous = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        CurrentDirGuard(previous)
    }
}

impl Drop for CurrentDirGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.0);
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.urls.spdx, "https://spdx.org/licenses");
    assert!(config.urls.classifiers.contains("list_classifiers"));
    assert_eq!(config.defaults.python, "python3");
    assert_eq!(config.defaults.version, "0.1.0");
    assert_eq!(config.defaults.author, None);
}

#[test]
fn test_load_from_explicit_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[urls]
spdx = "http://localhost:8080/spdx"

[defaults]
author = "Jane Doe <jane@example.com>"
license = "MIT"
python = "/usr/bin/python3.12"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path())).unwrap();
    assert_eq!(config.urls.spdx, "http://localhost:8080/spdx");
    assert_eq!(config.urls.classifiers, Config::default().urls.classifiers);
    assert_eq!(config.defaults.license.as_deref(), Some("MIT"));
    assert_eq!(config.defaults.python, "/usr/bin/python3.12");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
    assert!(err.to_string().contains("cannot read"));
}

#[test]
fn test_invalid_file_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[defaults\n").unwrap();
    temp_file.flush().unwrap();

    let err = load_config(Some(temp_file.path())).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
#[serial]
fn test_config_in_current_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILENAME),
        "[defaults]\nversion = \"1.0.0\"\n",
    )
    .unwrap();

    let _guard = CurrentDirGuard::enter(dir.path());
    let config = load_config(None).unwrap();
    assert_eq!(config.defaults.version, "1.0.0");
}
