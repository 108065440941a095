//! Push to master.
//!
//! Mirrors a project artifact and its change log to a fixed secondary
//! location. The target file name comes from configuration rather than from
//! the source, so every push lands on the same file and tools that
//! reference the master copy by name keep working.
//!
//! Steps, each of which can fail:
//!
//! 1. Create the target's parent directory (recursively).
//! 2. Copy the artifact over the target, always overwriting.
//! 3. If the source has a change log, copy it to the target's derived log
//!    path.
//!
//! A failed log copy after a successful artifact copy is still a failure.
//! The artifact copy is not rolled back; the next push overwrites it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::storage::derive_log_path;

/// Errors from a push to master.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The source artifact has never been saved.
    #[error("Project has not been saved yet; nothing to push")]
    UnsavedArtifact,

    /// No target was given or configured.
    #[error("No master file path configured")]
    NoTarget,

    /// Source or target path is not valid UTF-8.
    #[error("Cannot mirror {}: path is not valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),

    /// Source and target are the same file.
    #[error("Master file path {} is the project itself", .0.display())]
    SameFile(PathBuf),

    /// The target's change log path would be the target itself.
    #[error("Master file path {} must end in .skp so its change log does not overwrite it", .0.display())]
    LogTargetCollision(PathBuf),

    #[error("Failed to create master directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyArtifact {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The artifact was copied but its log was not.
    #[error("Project copied, but its change log could not be copied from {} to {}: {source}", .from.display(), .to.display())]
    CopyLog {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MirrorError {
    /// True when the artifact reached the target even though the push failed.
    pub fn artifact_copied(&self) -> bool {
        matches!(self, MirrorError::CopyLog { .. })
    }
}

/// What a successful push wrote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PushReport {
    /// Mirrored artifact.
    pub artifact: PathBuf,
    /// Mirrored change log, if the source had one.
    pub log: Option<PathBuf>,
}

/// Copies `source` and its change log to `target`.
pub fn push_to_master(source: &Path, target: &Path) -> Result<PushReport, MirrorError> {
    if source.as_os_str().is_empty() {
        return Err(MirrorError::UnsavedArtifact);
    }
    if target.as_os_str().is_empty() {
        return Err(MirrorError::NoTarget);
    }
    if let Some(path) = [source, target].into_iter().find(|p| p.to_str().is_none()) {
        return Err(MirrorError::NonUtf8Path(path.to_path_buf()));
    }
    if is_same_file(source, target) {
        return Err(MirrorError::SameFile(target.to_path_buf()));
    }

    let source_log = derive_log_path(source).filter(|log| log != source && log.exists());
    let target_log = match &source_log {
        Some(_) => match derive_log_path(target) {
            Some(log) if log != target => Some(log),
            _ => return Err(MirrorError::LogTargetCollision(target.to_path_buf())),
        },
        None => None,
    };

    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| MirrorError::CreateDir {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    fs::copy(source, target).map_err(|e| MirrorError::CopyArtifact {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(from = %source.display(), to = %target.display(), "Copied project to master");

    if let (Some(from), Some(to)) = (&source_log, &target_log) {
        fs::copy(from, to).map_err(|e| MirrorError::CopyLog {
            from: from.clone(),
            to: to.clone(),
            source: e,
        })?;
        tracing::debug!(from = %from.display(), to = %to.display(), "Copied change log to master");
    }

    Ok(PushReport {
        artifact: target.to_path_buf(),
        log: target_log,
    })
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{append, Record};
    use tempfile::tempdir;

    fn project(dir: &Path) -> PathBuf {
        let artifact = dir.join("house.skp");
        fs::write(&artifact, b"model-bytes-v1").unwrap();
        artifact
    }

    #[test]
    fn test_push_creates_directories_and_copies_artifact() {
        let dir = tempdir().unwrap();
        let source = project(dir.path());
        let target = dir.path().join("master/nested/house-master.skp");

        let report = push_to_master(&source, &target).unwrap();
        assert_eq!(report.artifact, target);
        assert_eq!(report.log, None);
        assert_eq!(fs::read(&target).unwrap(), b"model-bytes-v1");
    }

    #[test]
    fn test_push_copies_log_under_target_name() {
        let dir = tempdir().unwrap();
        let source = project(dir.path());
        append(
            &derive_log_path(&source).unwrap(),
            &Record::new("2025-01-01 10:00:00", "alice", "Initial import"),
        )
        .unwrap();
        let target = dir.path().join("master/house-master.skp");

        let report = push_to_master(&source, &target).unwrap();
        let expected_log = dir.path().join("master/house-master_changelog.csv");
        assert_eq!(report.log.as_deref(), Some(expected_log.as_path()));
        assert_eq!(
            fs::read_to_string(&expected_log).unwrap(),
            fs::read_to_string(derive_log_path(&source).unwrap()).unwrap()
        );
    }

    #[test]
    fn test_push_overwrites_existing_target() {
        let dir = tempdir().unwrap();
        let source = project(dir.path());
        let target = dir.path().join("master.skp");
        fs::write(&target, b"stale").unwrap();

        push_to_master(&source, &target).unwrap();
        fs::write(&source, b"model-bytes-v2").unwrap();
        push_to_master(&source, &target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"model-bytes-v2");
    }

    #[test]
    fn test_missing_source_fails() {
        let dir = tempdir().unwrap();
        let err = push_to_master(&dir.path().join("ghost.skp"), &dir.path().join("m.skp"))
            .unwrap_err();
        assert!(matches!(err, MirrorError::CopyArtifact { .. }));
        assert!(!err.artifact_copied());
    }

    #[test]
    fn test_log_copy_failure_is_reported_after_artifact_copy() {
        // The log target is derived textually, so a ".skp" directory name
        // sends it to a directory that does not exist.
        let dir = tempdir().unwrap();
        let source = project(dir.path());
        append(&derive_log_path(&source).unwrap(), &Record::new("t", "a", "m")).unwrap();
        let target = dir.path().join("mirror.skp.d/house.skp");

        let err = push_to_master(&source, &target).unwrap_err();
        assert!(matches!(err, MirrorError::CopyLog { .. }));
        assert!(err.artifact_copied());
        // Not rolled back: the artifact stays at the target.
        assert_eq!(fs::read(&target).unwrap(), b"model-bytes-v1");
    }

    #[test]
    fn test_target_without_extension_is_rejected_when_log_exists() {
        let dir = tempdir().unwrap();
        let source = project(dir.path());
        append(&derive_log_path(&source).unwrap(), &Record::new("t", "a", "m")).unwrap();
        let target = dir.path().join("master-copy");

        let err = push_to_master(&source, &target).unwrap_err();
        assert!(matches!(err, MirrorError::LogTargetCollision(_)));
        assert!(!target.exists());
    }

    #[test]
    fn test_push_onto_itself_is_rejected() {
        let dir = tempdir().unwrap();
        let source = project(dir.path());
        let err = push_to_master(&source, &source).unwrap_err();
        assert!(matches!(err, MirrorError::SameFile(_)));
        assert_eq!(fs::read(&source).unwrap(), b"model-bytes-v1");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_target_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let source = project(dir.path());
        let target = Path::new(OsStr::from_bytes(b"/tmp/\xffmaster.skp"));

        let err = push_to_master(&source, target).unwrap_err();
        assert!(matches!(err, MirrorError::NonUtf8Path(_)));
    }

    #[test]
    fn test_empty_paths() {
        assert!(matches!(
            push_to_master(Path::new(""), Path::new("/m.skp")),
            Err(MirrorError::UnsavedArtifact)
        ));
        assert!(matches!(
            push_to_master(Path::new("/p.skp"), Path::new("")),
            Err(MirrorError::NoTarget)
        ));
    }
}
