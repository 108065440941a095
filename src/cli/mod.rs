//! Command-line interface for projlog.
//!
//! Stands in for the host application's dialogs: each command performs
//! one of the actions the UI would trigger on a project.

/// Individual CLI command implementations.
pub mod commands;

/// Output format types shared across commands.
pub mod format;

pub use format::OutputFormat;
