//! User interface module - terminal formatting.
//!
//! Every command writes its report through these helpers so the output
//! stays consistent.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_aligned, display_bump_warning, display_checks, display_error, display_status,
    display_success, display_version_change, display_warning, format_check,
};
