//! Packages and monorepos as described by their YAML files

pub mod monorepo;
pub mod package;
pub mod subject;

pub use monorepo::{Monorepo, MonorepoConfig};
pub use package::{Package, PackageConfig};
pub use subject::Subject;
