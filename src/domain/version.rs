use crate::error::{Result, ShoreError};
use regex::Regex;
use semver::{BuildMetadata, Prerelease};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Version of a package or monorepo.
///
/// A semantic version extended with an optional Python style post release
/// number. Text form: `MAJOR.MINOR.PATCH[.postN][-PRE][+BUILD]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub post: Option<u64>,
    pub pre: Prerelease,
    pub build: BuildMetadata,
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
    Post,
}

impl BumpKind {
    pub fn name(&self) -> &'static str {
        match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
            BumpKind::Post => "post",
        }
    }
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d+)\.(\d+)(?:\.(\d+))?(?:\.post(\d+))?(?:-([0-9A-Za-z.-]+)|\.?(a|b|rc|alpha|beta|dev)\.?(\d+))?$",
        )
        .expect("version pattern is valid")
    })
}

fn parse_number(text: &str, input: &str) -> Result<u64> {
    text.parse::<u64>()
        .map_err(|_| ShoreError::version(format!("Invalid number '{}' in '{}'", text, input)))
}

impl Version {
    /// Create a new release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            post: None,
            pre: Prerelease::EMPTY,
            build: BuildMetadata::EMPTY,
        }
    }

    /// Parse a version string (e.g., "1.2.3", "v1.2.3-rc.1", "1.2.3.post2", "1.0.0rc1")
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Replace the build metadata, validating the identifier syntax
    pub fn with_build(mut self, build: &str) -> Result<Self> {
        if build.is_empty() {
            return Err(ShoreError::version("Build metadata cannot be empty"));
        }
        self.build = BuildMetadata::new(build)
            .map_err(|e| ShoreError::version(format!("Invalid build metadata '{}': {}", build, e)))?;
        Ok(self)
    }

    /// Bump version according to bump type.
    ///
    /// Major, minor and patch bumps reset the lower components and drop any
    /// prerelease, post release and build information. A post bump is not
    /// defined for prerelease versions.
    pub fn bump(&self, kind: BumpKind) -> Result<Self> {
        let bumped = match kind {
            BumpKind::Major => Version::new(self.major + 1, 0, 0),
            BumpKind::Minor => Version::new(self.major, self.minor + 1, 0),
            BumpKind::Patch => Version::new(self.major, self.minor, self.patch + 1),
            BumpKind::Post => {
                if self.is_prerelease() {
                    return Err(ShoreError::version(format!(
                        "cannot create a post release of prerelease version {}",
                        self
                    )));
                }
                Version {
                    post: Some(self.post.map_or(1, |n| n + 1)),
                    ..Version::new(self.major, self.minor, self.patch)
                }
            }
        };
        Ok(bumped)
    }
}

impl FromStr for Version {
    type Err = ShoreError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let clean = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let (core, build) = match clean.split_once('+') {
            Some((core, build)) => (core, Some(build)),
            None => (clean, None),
        };

        let captures = version_regex().captures(core).ok_or_else(|| {
            ShoreError::version(format!("Invalid version format: '{}'", input))
        })?;

        let mut version = Version::new(
            parse_number(&captures[1], input)?,
            parse_number(&captures[2], input)?,
            match captures.get(3) {
                Some(m) => parse_number(m.as_str(), input)?,
                None => 0,
            },
        );

        if let Some(post) = captures.get(4) {
            version.post = Some(parse_number(post.as_str(), input)?);
        }

        let pre = if let Some(pre) = captures.get(5) {
            Some(pre.as_str().to_string())
        } else if let (Some(kind), Some(number)) = (captures.get(6), captures.get(7)) {
            let kind = match kind.as_str() {
                "a" => "alpha",
                "b" => "beta",
                other => other,
            };
            Some(format!("{}.{}", kind, number.as_str()))
        } else {
            None
        };

        if let Some(pre) = pre {
            if version.post.is_some() {
                return Err(ShoreError::version(format!(
                    "Version '{}' cannot be both a post release and a prerelease",
                    input
                )));
            }
            version.pre = Prerelease::new(&pre).map_err(|e| {
                ShoreError::version(format!("Invalid prerelease '{}' in '{}': {}", pre, input, e))
            })?;
        }

        if let Some(build) = build {
            version = version.with_build(build)?;
        }

        Ok(version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(post) = self.post {
            write!(f, ".post{}", post)?;
        }
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (true, true) => self.pre.cmp(&other.pre),
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => self.post.cmp(&other.post),
            })
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
