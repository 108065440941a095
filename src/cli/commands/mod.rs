//! CLI commands for projlog.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Generate shell completion scripts.
pub mod completions;

/// Show the change history of a project.
pub mod history;

/// Import a legacy free-text change log.
pub mod import;

/// Record a change note, optionally pushing to master.
pub mod log;

/// Mirror a project and its log to the master location.
pub mod push;

/// Handle a save event and report whether to prompt.
pub mod saved;

/// View and change per-project settings.
pub mod settings;
