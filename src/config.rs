use crate::error::{Result, ShoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILENAME: &str = "shore.toml";

/// Represents the complete configuration for shore.
///
/// Contains the endpoints for external metadata and the defaults used when
/// scaffolding, building and installing packages.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub urls: UrlsConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

fn default_spdx_url() -> String {
    "https://spdx.org/licenses".to_string()
}

fn default_classifiers_url() -> String {
    "https://pypi.org/pypi?%3Aaction=list_classifiers".to_string()
}

/// Where license and classifier data is fetched from
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UrlsConfig {
    /// Base URL of the SPDX license list (`<spdx>/licenses.json`, `<spdx>/<id>.json`)
    #[serde(default = "default_spdx_url")]
    pub spdx: String,

    /// Plain-text list of trove classifiers, one per line
    #[serde(default = "default_classifiers_url")]
    pub classifiers: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        UrlsConfig {
            spdx: default_spdx_url(),
            classifiers: default_classifiers_url(),
        }
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("dist")
}

/// Defaults for `new`, `build`, `publish` and `link`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultsConfig {
    /// Author for new packages; the git identity is used when unset
    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default = "default_version")]
    pub version: String,

    /// Python interpreter used to run `build`, `twine` and `flit`
    #[serde(default = "default_python")]
    pub python: String,

    /// Relative to the subject directory unless absolute
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            author: None,
            license: None,
            version: default_version(),
            python: default_python(),
            build_dir: default_build_dir(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `shore.toml` in current directory
/// 3. `shore.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(path) = config_path {
        path.to_path_buf()
    } else if Path::new(CONFIG_FILENAME).exists() {
        PathBuf::from(CONFIG_FILENAME)
    } else if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join(CONFIG_FILENAME);
        if path.exists() {
            path
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    debug!("loading configuration from {}", path.display());
    let config_str = fs::read_to_string(&path).map_err(|e| {
        ShoreError::config(format!("cannot read {}: {}", path.display(), e))
    })?;
    let config: Config = toml::from_str(&config_str)
        .map_err(|e| ShoreError::config(format!("invalid {}: {}", path.display(), e)))?;
    Ok(config)
}
