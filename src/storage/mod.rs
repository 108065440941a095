//! Storage layer for projlog
//!
//! Change logs live next to the project artifact they describe. The path of
//! a log is derived textually from the artifact path, so the log for
//! `house.skp` is `house_changelog.csv` in the same directory.

pub mod codec;
pub mod legacy;
pub mod log;
pub mod models;

use std::io;
use std::path::{Path, PathBuf};

pub use self::legacy::LogFormat;
pub use self::log::{append, derive_log_path, read_all};
pub use models::*;

/// Errors raised by the log and settings stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    #[error("Failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The artifact has never been written to disk, so it has no log.
    #[error("Project has not been saved yet; save it before logging changes")]
    UnsavedArtifact,

    /// The artifact path lacks the expected extension, so the derived log
    /// path would point at the artifact itself.
    #[error("Cannot derive a change log path for {}: expected a .skp file", .0.display())]
    LogPathCollision(PathBuf),

    /// The artifact path is not valid UTF-8, so its log path cannot be
    /// derived textually.
    #[error("Cannot derive a change log path for {}: path is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    /// The settings file exists but could not be read or written as YAML.
    #[error("Invalid settings file {}: {message}", .path.display())]
    Settings { path: PathBuf, message: String },

    /// A built-in pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl StoreError {
    pub(crate) fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Error for an artifact whose derived paths came back `None`.
    pub(crate) fn underivable(artifact: &Path) -> Self {
        if artifact.as_os_str().is_empty() {
            Self::UnsavedArtifact
        } else {
            Self::NonUtf8Path(artifact.to_path_buf())
        }
    }
}
