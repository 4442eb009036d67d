pub mod changelog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod external;
pub mod git;
pub mod model;
pub mod plugins;
pub mod process;
pub mod ui;
pub mod workflow;

pub use error::{Result, ShoreError};
