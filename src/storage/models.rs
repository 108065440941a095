//! Core data models for projlog
//!
//! A change log is a plain sequence of [`Record`]s. Records are never edited
//! in place; the log only grows.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Format used for record timestamps (local time, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Author recorded when no user identity can be resolved.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One change-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Local date-time of the capture, formatted with [`TIMESTAMP_FORMAT`]
    pub timestamp: String,

    /// Who wrote the note
    pub author: String,

    /// Free-form note; may span multiple lines
    pub message: String,
}

impl Record {
    /// Number of fields a record occupies on a log line.
    pub const ARITY: usize = 3;

    pub fn new(
        timestamp: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            author: author.into(),
            message: message.into(),
        }
    }

    /// Creates a record stamped with the given local time.
    pub fn at(when: DateTime<Local>, author: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(when.format(TIMESTAMP_FORMAT).to_string(), author, message)
    }

    /// Creates a record stamped with the current local time.
    pub fn now(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(Local::now(), author, message)
    }

    /// Returns the fields in on-disk order.
    pub fn fields(&self) -> [&str; Self::ARITY] {
        [&self.timestamp, &self.author, &self.message]
    }

    /// Builds a record from decoded fields.
    ///
    /// Decoding is lenient, so short rows are padded with empty fields and
    /// anything past the third field is folded back into the message.
    pub fn from_fields(fields: Vec<String>) -> Self {
        let mut iter = fields.into_iter();
        let timestamp = iter.next().unwrap_or_default();
        let author = iter.next().unwrap_or_default();
        let rest: Vec<String> = iter.collect();
        Self {
            timestamp,
            author,
            message: rest.join(","),
        }
    }
}

/// Resolves the local user identity for new records.
///
/// Checks `USERNAME` (Windows) and then `USER`, falling back to
/// [`UNKNOWN_AUTHOR`].
pub fn resolve_author() -> String {
    ["USERNAME", "USER"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}
