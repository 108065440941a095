//! Legacy free-text change logs.
//!
//! Before the delimited format, notes were written as free-text blocks:
//!
//! ```text
//!
//! [2024-05-02 09:14:00] User: alice - Save Commit:
//! Moved the staircase
//! ----------------------------------------
//! ```
//!
//! The block format carries no version marker, so a caller either names
//! the format explicitly or it is sniffed from the first non-blank line.
//! Legacy logs are only ever read or imported; new records are always
//! written in the delimited format.

use std::fs;
use std::io;
use std::path::Path;

use regex::Regex;

use super::log::{self, derive_path};
use super::models::Record;
use super::StoreError;

/// Suffix used by legacy logs in place of the artifact extension.
pub const LEGACY_LOG_SUFFIX: &str = "_changelog.txt";

/// Line closing a legacy block.
pub const LEGACY_SEPARATOR: &str = "----------------------------------------";

const HEADER_PATTERN: &str = r"^\[(?P<timestamp>[^\]]*)\] User: (?P<author>.*) - Save Commit:$";

/// On-disk change log formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One comma-delimited record per line.
    DelimitedV1,
    /// Bracketed header line, free text, dashed separator.
    FreeTextLegacy,
}

impl LogFormat {
    /// Suffix that replaces the artifact extension for this format.
    pub fn suffix(&self) -> &'static str {
        match self {
            LogFormat::DelimitedV1 => log::LOG_SUFFIX,
            LogFormat::FreeTextLegacy => LEGACY_LOG_SUFFIX,
        }
    }

    /// Guesses the format of a log from its first non-blank line.
    pub fn sniff(content: &str) -> Result<Self, StoreError> {
        let header = Regex::new(HEADER_PATTERN)?;
        let first = content.lines().map(str::trim_end).find(|l| !l.trim().is_empty());
        Ok(match first {
            Some(line) if header.is_match(line) => LogFormat::FreeTextLegacy,
            _ => LogFormat::DelimitedV1,
        })
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::DelimitedV1 => write!(f, "delimited-v1"),
            LogFormat::FreeTextLegacy => write!(f, "free-text-legacy"),
        }
    }
}

/// Renders a record the way the free-text format wrote it.
pub fn encode_legacy(record: &Record) -> String {
    format!(
        "\n[{}] User: {} - Save Commit:\n{}\n{}",
        record.timestamp, record.author, record.message, LEGACY_SEPARATOR
    )
}

/// Parses every block in a free-text log.
///
/// Text outside a header/separator pair is ignored. A block cut off by the
/// end of the file is still returned.
pub fn parse_legacy(content: &str) -> Result<Vec<Record>, StoreError> {
    let header = Regex::new(HEADER_PATTERN)?;
    let mut records = Vec::new();
    let mut current: Option<(Record, Vec<&str>)> = None;

    for line in content.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(caps) = header.captures(line) {
            if let Some(done) = current.take() {
                records.push(finish(done));
            }
            let record = Record::new(&caps["timestamp"], &caps["author"], "");
            current = Some((record, Vec::new()));
        } else if line.trim() == LEGACY_SEPARATOR {
            if let Some(done) = current.take() {
                records.push(finish(done));
            }
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some(done) = current.take() {
        records.push(finish(done));
    }
    Ok(records)
}

fn finish((mut record, body): (Record, Vec<&str>)) -> Record {
    record.message = body.join("\n");
    record
}

/// Reads a log in the given format, or sniffs it when `format` is `None`.
pub fn read_all_as(path: &Path, format: Option<LogFormat>) -> Result<Vec<Record>, StoreError> {
    let format = match format {
        Some(format) => format,
        None => match fs::read_to_string(path) {
            Ok(content) => LogFormat::sniff(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("read", path, e)),
        },
    };
    tracing::debug!(path = %path.display(), %format, "Reading change log");

    match format {
        LogFormat::DelimitedV1 => log::read_all(path),
        LogFormat::FreeTextLegacy => match fs::read_to_string(path) {
            Ok(content) => parse_legacy(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::io("read", path, e)),
        },
    }
}

/// Returns the legacy log path for an artifact.
pub fn derive_legacy_log_path(artifact: &Path) -> Option<std::path::PathBuf> {
    derive_path(artifact, LEGACY_LOG_SUFFIX)
}

/// Legacy entries not yet present in the delimited log.
///
/// Each record already in the log (same timestamp, author and message)
/// accounts for one matching legacy entry, so repeated identical entries
/// are matched one for one.
pub fn pending_legacy(legacy_path: &Path, log_path: &Path) -> Result<Vec<Record>, StoreError> {
    let mut existing = log::read_all(log_path)?;
    let records = read_all_as(legacy_path, Some(LogFormat::FreeTextLegacy))?;
    Ok(records
        .into_iter()
        .filter(|record| match existing.iter().position(|e| e == record) {
            Some(i) => {
                existing.swap_remove(i);
                false
            }
            None => true,
        })
        .collect())
}

/// Appends the entries of a legacy log that the delimited log lacks.
///
/// Returns the number of records imported, so a repeated import returns 0.
/// A missing legacy log imports nothing.
pub fn import_legacy(legacy_path: &Path, log_path: &Path) -> Result<usize, StoreError> {
    let records = pending_legacy(legacy_path, log_path)?;
    for record in &records {
        log::append(log_path, record)?;
    }
    tracing::info!(
        from = %legacy_path.display(),
        to = %log_path.display(),
        count = records.len(),
        "Imported legacy change log"
    );
    Ok(records.len())
}
