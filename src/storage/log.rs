//! Append-only change log.
//!
//! Every append opens the log, writes exactly one encoded record plus a
//! line break, and closes it again. There is no locking: two processes
//! appending to the same log may interleave lines.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use regex::Regex;

use super::codec;
use super::models::Record;
use super::StoreError;

/// Extension of project artifacts.
pub const ARTIFACT_EXTENSION: &str = ".skp";

/// Suffix that replaces [`ARTIFACT_EXTENSION`] to form the log path.
pub const LOG_SUFFIX: &str = "_changelog.csv";

/// A physical line opening with a capture timestamp starts a new record.
const RECORD_START_PATTERN: &str = r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},";

/// Substitutes every occurrence of the artifact extension with `suffix`.
///
/// Purely textual; the filesystem is never consulted. Returns `None` for an
/// empty path (the artifact was never saved) and for a path that is not
/// valid UTF-8, which cannot be rewritten without changing its name.
pub fn derive_path(artifact: &Path, suffix: &str) -> Option<PathBuf> {
    let text = artifact.to_str()?;
    if text.is_empty() {
        return None;
    }
    Some(PathBuf::from(text.replace(ARTIFACT_EXTENSION, suffix)))
}

/// Returns the change log path for an artifact.
///
/// A path without the `.skp` extension comes back unchanged.
pub fn derive_log_path(artifact: &Path) -> Option<PathBuf> {
    derive_path(artifact, LOG_SUFFIX)
}

/// Appends one record to the log, creating the file if needed.
pub fn append(log_path: &Path, record: &Record) -> Result<(), StoreError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| StoreError::io("open", log_path, e))?;

    writeln!(file, "{}", codec::encode(&record.fields()))
        .map_err(|e| StoreError::io("append to", log_path, e))?;

    tracing::debug!(path = %log_path.display(), "Appended change log record");
    Ok(())
}

/// Reads every record in file order, oldest first.
///
/// A missing log means "no history yet" and yields an empty list. Blank
/// lines are skipped. A quoted field that spans a line break is joined back
/// into a single record before decoding, unless the next line opens with a
/// timestamp: then the open quote was stray, and the pending line is decoded
/// on its own so later records stay intact.
///
/// Line breaks inside a quoted field are kept byte for byte; a trailing
/// `\r` is dropped only where a record ends.
pub fn read_all(log_path: &Path) -> Result<Vec<Record>, StoreError> {
    let content = match fs::read_to_string(log_path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io("read", log_path, e)),
    };
    let record_start = Regex::new(RECORD_START_PATTERN)?;

    let mut records = Vec::new();
    let mut pending = String::new();

    let body = content.strip_suffix('\n').unwrap_or(&content);
    for line in body.split('\n') {
        if pending.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
        } else if record_start.is_match(line) {
            tracing::warn!(path = %log_path.display(), "Unterminated quote in change log record");
            records.push(decode_record(&pending));
            pending.clear();
        } else {
            pending.push('\n');
        }
        pending.push_str(line);

        if !has_open_quote(&pending) {
            records.push(decode_record(&pending));
            pending.clear();
        }
    }

    // Unterminated quote at end of file: keep what we have.
    if !pending.is_empty() {
        records.push(decode_record(&pending));
    }

    tracing::debug!(path = %log_path.display(), count = records.len(), "Read change log");
    Ok(records)
}

fn decode_record(text: &str) -> Record {
    let text = text.strip_suffix('\r').unwrap_or(text);
    Record::from_fields(codec::decode(text))
}

/// Replaces the whole log with `content`.
///
/// This is the "edit full log" action; ordinary captures only ever append.
pub fn overwrite(log_path: &Path, content: &str) -> Result<(), StoreError> {
    fs::write(log_path, content).map_err(|e| StoreError::io("write", log_path, e))?;
    tracing::debug!(path = %log_path.display(), "Overwrote change log");
    Ok(())
}

/// Doubled quotes count twice, so an odd count means a quote is still open.
fn has_open_quote(text: &str) -> bool {
    text.matches('"').count() % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_derive_log_path_empty_is_none() {
        assert_eq!(derive_log_path(Path::new("")), None);
    }

    #[test]
    fn test_derive_log_path_same_directory() {
        let path = derive_log_path(Path::new("C:/proj/model.skp")).unwrap();
        assert_eq!(path, PathBuf::from("C:/proj/model_changelog.csv"));
        assert!(path.to_string_lossy().ends_with(LOG_SUFFIX));
    }

    #[test]
    fn test_derive_log_path_without_extension_is_unchanged() {
        let path = derive_log_path(Path::new("/proj/model.dwg")).unwrap();
        assert_eq!(path, PathBuf::from("/proj/model.dwg"));
    }

    #[test]
    fn test_derive_log_path_is_textual() {
        let path = derive_log_path(Path::new("/a.skp.d/model.skp")).unwrap();
        assert_eq!(path, PathBuf::from("/a_changelog.csv.d/model_changelog.csv"));
    }

    #[test]
    fn test_read_missing_log_is_empty() {
        let dir = tempdir().unwrap();
        let records = read_all(&dir.path().join("none_changelog.csv")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_append_then_read_in_order() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("m_changelog.csv");

        for i in 0..5 {
            append(&log, &Record::new("2025-01-01 10:00:00", "alice", format!("note {i}"))).unwrap();
        }

        let records = read_all(&log).unwrap();
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.message, format!("note {i}"));
        }

        let content = fs::read_to_string(&log).unwrap();
        assert_eq!(content.lines().count(), 5);
    }

    #[test]
    fn test_read_is_idempotent() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("m_changelog.csv");
        append(&log, &Record::new("t1", "a", "first, with comma")).unwrap();
        append(&log, &Record::new("t2", "b", "second")).unwrap();

        assert_eq!(read_all(&log).unwrap(), read_all(&log).unwrap());
    }

    #[test]
    fn test_multiline_message_survives() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("m_changelog.csv");
        let record = Record::new("t", "alice", "line one\n\nline three");
        append(&log, &record).unwrap();
        append(&log, &Record::new("t", "bob", "after")).unwrap();

        let records = read_all(&log).unwrap();
        assert_eq!(records, vec![record, Record::new("t", "bob", "after")]);
    }

    #[test]
    fn test_blank_and_crlf_lines_are_tolerated() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("m_changelog.csv");
        fs::write(&log, "t1,a,one\r\n\r\n   \nt2,b,two\r\n").unwrap();

        let records = read_all(&log).unwrap();
        assert_eq!(
            records,
            vec![Record::new("t1", "a", "one"), Record::new("t2", "b", "two")]
        );
    }

    #[test]
    fn test_unterminated_quote_at_eof_is_kept() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("m_changelog.csv");
        fs::write(&log, "t1,a,ok\nt2,b,\"never closed\n").unwrap();

        let records = read_all(&log).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].message, "never closed");
    }

    #[test]
    fn test_stray_quote_does_not_swallow_later_records() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("m_changelog.csv");
        overwrite(&log, "2025-01-01 10:00:00,alice,said \"hi\n").unwrap();
        for i in 0..3 {
            append(&log, &Record::new("2025-01-02 10:00:00", "bob", format!("note {i}"))).unwrap();
        }

        let records = read_all(&log).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].message, "said hi");
        assert_eq!(records[3], Record::new("2025-01-02 10:00:00", "bob", "note 2"));
    }

    #[test]
    fn test_crlf_inside_message_survives() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("m_changelog.csv");
        let record = Record::new("t", "a", "one\r\ntwo\r");
        append(&log, &record).unwrap();
        append(&log, &Record::new("t", "b", "after")).unwrap();

        assert_eq!(read_all(&log).unwrap(), vec![record, Record::new("t", "b", "after")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_derive_log_path_rejects_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let artifact = Path::new(OsStr::from_bytes(b"/proj/\xffhouse.skp"));
        assert_eq!(derive_log_path(artifact), None);
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("m_changelog.csv");
        append(&log, &Record::new("t1", "a", "one")).unwrap();
        overwrite(&log, "t9,z,edited\n").unwrap();

        assert_eq!(read_all(&log).unwrap(), vec![Record::new("t9", "z", "edited")]);
    }
}
