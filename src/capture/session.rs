//! Capture flow for one project.
//!
//! A [`ProjectSession`] binds a saved artifact to its change log and its
//! settings, and runs the save → throttle → record → mirror sequence that
//! the host UI drives.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use super::throttle::{self, Evaluation};
use crate::config::{SettingsStore, MASTER_FILE_PATH, PUSH_TO_MASTER_ENABLED};
use crate::mirror::{self, MirrorError, PushReport};
use crate::storage::legacy::{self, LogFormat};
use crate::storage::{self, resolve_author, Record, StoreError};

/// Result of the optional mirror step of a commit.
#[derive(Debug)]
pub enum MirrorOutcome {
    /// The user did not ask for a push (or gave no target).
    NotRequested,
    /// Artifact and log were mirrored.
    Pushed(PushReport),
    /// The record was written but the push failed.
    Failed(MirrorError),
}

impl MirrorOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, MirrorOutcome::Failed(_))
    }
}

/// What a commit wrote.
#[derive(Debug)]
pub struct CommitOutcome {
    pub record: Record,
    pub log_path: PathBuf,
    pub mirror: MirrorOutcome,
}

/// One open project.
#[derive(Debug)]
pub struct ProjectSession {
    artifact: PathBuf,
    log_path: PathBuf,
    settings: SettingsStore,
}

impl ProjectSession {
    /// Opens the session for a saved artifact, loading its settings sidecar.
    pub fn open(artifact: &Path) -> Result<Self, StoreError> {
        let settings = SettingsStore::for_artifact(artifact)?;
        Self::with_settings(artifact, settings)
    }

    /// Opens the session with an explicit settings store.
    ///
    /// Fails for an unsaved artifact, and for an artifact without the
    /// `.skp` extension, whose log path would be the artifact itself.
    pub fn with_settings(artifact: &Path, settings: SettingsStore) -> Result<Self, StoreError> {
        let log_path = storage::derive_log_path(artifact).ok_or_else(|| StoreError::underivable(artifact))?;
        if log_path == artifact {
            return Err(StoreError::LogPathCollision(log_path));
        }
        Ok(Self {
            artifact: artifact.to_path_buf(),
            log_path,
            settings,
        })
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    /// Handles an "artifact saved" signal.
    pub fn on_saved(&mut self, forced: bool) -> Result<Evaluation, StoreError> {
        throttle::evaluate(&mut self.settings, forced)
    }

    /// Same as [`on_saved`](Self::on_saved) with an explicit clock.
    pub fn on_saved_at(&mut self, forced: bool, now: DateTime<Local>) -> Result<Evaluation, StoreError> {
        throttle::evaluate_at(&mut self.settings, forced, now)
    }

    /// Records a note by the local user, then updates preferences and
    /// optionally pushes to master.
    pub fn commit(
        &mut self,
        message: &str,
        push_to_master: bool,
        master_path: &str,
    ) -> Result<CommitOutcome, StoreError> {
        let record = Record::now(resolve_author(), message);
        self.commit_record(record, push_to_master, master_path)
    }

    /// Appends `record` and applies the push preferences.
    ///
    /// The push flag is remembered as given; the master path only when it
    /// is non-empty. The mirror runs only when both ask for it. A mirror
    /// failure does not undo the record and is reported in the outcome.
    pub fn commit_record(
        &mut self,
        record: Record,
        push_to_master: bool,
        master_path: &str,
    ) -> Result<CommitOutcome, StoreError> {
        storage::append(&self.log_path, &record)?;
        tracing::info!(path = %self.log_path.display(), "Change log updated");

        self.settings.set(PUSH_TO_MASTER_ENABLED, push_to_master)?;
        let master_path = master_path.trim();
        if !master_path.is_empty() {
            self.settings.set(MASTER_FILE_PATH, master_path)?;
        }

        let mirror = if push_to_master && !master_path.is_empty() {
            match self.push(Path::new(master_path)) {
                Ok(report) => MirrorOutcome::Pushed(report),
                Err(e) => MirrorOutcome::Failed(e),
            }
        } else {
            MirrorOutcome::NotRequested
        };

        Ok(CommitOutcome {
            record,
            log_path: self.log_path.clone(),
            mirror,
        })
    }

    /// Mirrors the artifact and its log to `target`.
    pub fn push(&self, target: &Path) -> Result<PushReport, MirrorError> {
        let result = mirror::push_to_master(&self.artifact, target);
        match &result {
            Ok(report) => tracing::info!(master = %report.artifact.display(), "Pushed to master"),
            Err(e) => tracing::warn!(master = %target.display(), "Push to master failed: {e}"),
        }
        result
    }

    /// Mirrors to the configured master path.
    pub fn push_to_configured(&self) -> Result<PushReport, MirrorError> {
        let target = self.settings.master_file_path();
        self.push(Path::new(&target))
    }

    /// All records, oldest first.
    pub fn history(&self) -> Result<Vec<Record>, StoreError> {
        storage::read_all(&self.log_path)
    }

    /// Records from the legacy free-text log next to the artifact.
    pub fn legacy_history(&self) -> Result<Vec<Record>, StoreError> {
        match legacy::derive_legacy_log_path(&self.artifact) {
            Some(path) if path != self.artifact => {
                legacy::read_all_as(&path, Some(LogFormat::FreeTextLegacy))
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Legacy entries that an import would still add.
    pub fn pending_legacy(&self) -> Result<Vec<Record>, StoreError> {
        match legacy::derive_legacy_log_path(&self.artifact) {
            Some(path) if path != self.artifact => legacy::pending_legacy(&path, &self.log_path),
            _ => Ok(Vec::new()),
        }
    }

    /// Appends the legacy free-text log's entries to the change log,
    /// skipping those already imported.
    pub fn import_legacy(&self) -> Result<usize, StoreError> {
        match legacy::derive_legacy_log_path(&self.artifact) {
            Some(path) if path != self.artifact => legacy::import_legacy(&path, &self.log_path),
            _ => Ok(0),
        }
    }

    /// Replaces the entire log ("edit full log").
    pub fn overwrite_log(&self, content: &str) -> Result<(), StoreError> {
        storage::log::overwrite(&self.log_path, content)
    }
}
