use std::fmt;

/// Severity of a check result. Ordered so that `max()` gives the worst level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckLevel {
    Info,
    Warning,
    Error,
}

impl CheckLevel {
    pub fn name(&self) -> &'static str {
        match self {
            CheckLevel::Info => "INFO",
            CheckLevel::Warning => "WARNING",
            CheckLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single sanity check on a package or monorepo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Name of the subject the check triggered on
    pub on: String,
    pub level: CheckLevel,
    pub message: String,
}

impl CheckResult {
    pub fn new(on: impl Into<String>, level: CheckLevel, message: impl Into<String>) -> Self {
        CheckResult {
            on: on.into(),
            level,
            message: message.into(),
        }
    }

    pub fn info(on: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(on, CheckLevel::Info, message)
    }

    pub fn warning(on: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(on, CheckLevel::Warning, message)
    }

    pub fn error(on: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(on, CheckLevel::Error, message)
    }
}

/// Exit status for a set of check results: 1 on any error, or on any warning
/// when warnings are treated as errors, 0 otherwise.
pub fn checks_status(checks: &[CheckResult], warnings_as_errors: bool) -> i32 {
    match checks.iter().map(|c| c.level).max() {
        Some(CheckLevel::Error) => 1,
        Some(CheckLevel::Warning) if warnings_as_errors => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_checks_is_success() {
        assert_eq!(checks_status(&[], true), 0);
    }

    #[test]
    fn test_info_only_is_success() {
        let checks = vec![CheckResult::info("pkg", "missing url")];
        assert_eq!(checks_status(&checks, true), 0);
    }

    #[test]
    fn test_warning_depends_on_flag() {
        let checks = vec![
            CheckResult::info("pkg", "missing url"),
            CheckResult::warning("pkg", "missing author"),
        ];
        assert_eq!(checks_status(&checks, false), 0);
        assert_eq!(checks_status(&checks, true), 1);
    }

    #[test]
    fn test_error_always_fails() {
        let checks = vec![CheckResult::error("pkg", "entry file not found")];
        assert_eq!(checks_status(&checks, false), 1);
    }

    #[test]
    fn test_level_ordering() {
        assert!(CheckLevel::Info < CheckLevel::Warning);
        assert!(CheckLevel::Warning < CheckLevel::Error);
        assert_eq!(CheckLevel::Warning.to_string(), "WARNING");
    }
}
