use thiserror::Error;

/// Unified error type for shore operations
#[derive(Error, Debug)]
pub enum ShoreError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    /// Errors that the command line reports together with its usage line.
    #[error("{0}")]
    Usage(String),

    #[error("Subject error: {0}")]
    Subject(String),

    #[error("Version refs error: {0}")]
    VersionRef(String),

    #[error("Changelog error: {0}")]
    Changelog(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results in shore
pub type Result<T> = std::result::Result<T, ShoreError>;

impl ShoreError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ShoreError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ShoreError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        ShoreError::Tag(msg.into())
    }

    /// Create a usage error, reported like an argument parser error
    pub fn usage(msg: impl Into<String>) -> Self {
        ShoreError::Usage(msg.into())
    }

    pub fn subject(msg: impl Into<String>) -> Self {
        ShoreError::Subject(msg.into())
    }

    pub fn version_ref(msg: impl Into<String>) -> Self {
        ShoreError::VersionRef(msg.into())
    }

    pub fn changelog(msg: impl Into<String>) -> Self {
        ShoreError::Changelog(msg.into())
    }

    pub fn command(msg: impl Into<String>) -> Self {
        ShoreError::Command(msg.into())
    }

    /// Whether the error should be rendered with the command usage line
    pub fn is_usage(&self) -> bool {
        matches!(self, ShoreError::Usage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShoreError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ShoreError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_usage_error_is_bare_message() {
        let err = ShoreError::usage("no operation specified");
        assert_eq!(err.to_string(), "no operation specified");
        assert!(err.is_usage());
        assert!(!ShoreError::tag("x").is_usage());
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (ShoreError::config("x"), "Configuration error"),
            (ShoreError::version("x"), "Version parsing error"),
            (ShoreError::tag("x"), "Tag error"),
            (ShoreError::subject("x"), "Subject error"),
            (ShoreError::version_ref("x"), "Version refs error"),
            (ShoreError::changelog("x"), "Changelog error"),
            (ShoreError::command("x"), "Command failed"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<Vec<u32>>("{ not: a list").unwrap_err();
        let err: ShoreError = yaml_err.into();
        assert!(err.to_string().starts_with("YAML error"));
    }
}
