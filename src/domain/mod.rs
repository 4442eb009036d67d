//! Domain logic - pure rules independent of git and the file layout of subjects

pub mod check;
pub mod tag;
pub mod version;
pub mod version_ref;

pub use check::{checks_status, CheckLevel, CheckResult};
pub use tag::TagFormat;
pub use version::{BumpKind, Version};
pub use version_ref::VersionRef;
