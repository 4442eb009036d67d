use std::fmt;

/// Conditions a bump normally refuses, reported as warnings when `--force`
/// overrides them.
#[derive(Debug, Clone, PartialEq)]
pub enum BumpWarning {
    /// Checks failed with warnings treated as errors
    ChecksFailed { subject: String },
    /// The package shares its version with the monorepo
    MonoVersionedPackage { package: String, monorepo: String },
    /// Some version refs disagree with the subject version
    InconsistentVersions { count: usize, expected: String },
    /// The target version does not increase the current version
    VersionNotIncreased { current: String, target: String },
}

impl fmt::Display for BumpWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpWarning::ChecksFailed { subject } => {
                write!(f, "checks for '{}' failed, continuing due to --force", subject)
            }
            BumpWarning::MonoVersionedPackage { package, monorepo } => write!(
                f,
                "'{}' is mono-versioned with '{}', bumping it individually due to --force",
                package, monorepo
            ),
            BumpWarning::InconsistentVersions { count, expected } => write!(
                f,
                "{} version ref{} not matching {}",
                count,
                if *count == 1 { "" } else { "s" },
                expected
            ),
            BumpWarning::VersionNotIncreased { current, target } => write!(
                f,
                "target version {} does not increase current version {}",
                target, current
            ),
        }
    }
}
