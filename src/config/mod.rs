//! Per-project settings.
//!
//! Settings are a small key/value map attached to one project artifact and
//! persisted in a YAML sidecar next to it (`house.skp` →
//! `house_changelog.settings.yaml`). The sidecar is the settings container:
//! it does not exist until the first [`SettingsStore::set`], and every read
//! before that resolves to the caller's default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::storage::log::derive_path;
use crate::storage::StoreError;

/// Suffix that replaces the artifact extension to form the settings path.
pub const SETTINGS_SUFFIX: &str = "_changelog.settings.yaml";

/// Mirror target for "push to master".
pub const MASTER_FILE_PATH: &str = "master_file_path";
/// Whether the last capture asked for a push.
pub const PUSH_TO_MASTER_ENABLED: &str = "push_to_master_enabled";
/// Suppresses prompts triggered by saves (manual captures still prompt).
pub const DISABLE_AUTO_PROMPTS: &str = "disable_auto_prompts";
/// Minimum minutes between two save-triggered prompts.
pub const SKIP_THRESHOLD_MINUTES: &str = "skip_threshold_minutes";
/// When a prompt was last offered.
pub const LAST_PROMPT_TIME: &str = "last_prompt_time";

/// Every key this crate reads or writes.
pub const KNOWN_KEYS: [&str; 5] = [
    MASTER_FILE_PATH,
    PUSH_TO_MASTER_ENABLED,
    DISABLE_AUTO_PROMPTS,
    SKIP_THRESHOLD_MINUTES,
    LAST_PROMPT_TIME,
];

/// Default for [`SKIP_THRESHOLD_MINUTES`].
pub const DEFAULT_SKIP_THRESHOLD_MINUTES: f64 = 5.0;

/// A stored scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    /// Interprets user input: `true`/`false`, then numbers, then text.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "true" => SettingValue::Bool(true),
            "false" => SettingValue::Bool(false),
            trimmed => trimmed
                .parse::<f64>()
                .map(SettingValue::Number)
                .unwrap_or_else(|_| SettingValue::Text(raw.to_string())),
        }
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Number(n) => write!(f, "{n}"),
            SettingValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Number(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Number(value as f64)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

/// Types a stored value can be read back as.
///
/// A stored value of a different shape reads as `None`, which makes
/// [`SettingsStore::get`] fall back to the default.
pub trait FromSetting: Sized {
    fn from_setting(value: &SettingValue) -> Option<Self>;
}

impl FromSetting for bool {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromSetting for f64 {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Number(n) => Some(*n),
            // Form inputs tend to hand numbers over as text.
            SettingValue::Text(s) => s.trim().parse().ok(),
            SettingValue::Bool(_) => None,
        }
    }
}

impl FromSetting for i64 {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        f64::from_setting(value).map(|n| n as i64)
    }
}

impl FromSetting for String {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromSetting for SettingValue {
    fn from_setting(value: &SettingValue) -> Option<Self> {
        Some(value.clone())
    }
}

/// Settings for one project.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    /// Sidecar file; `None` keeps everything in memory.
    path: Option<PathBuf>,

    /// `None` until the container exists (on disk or after the first set).
    values: Option<BTreeMap<String, SettingValue>>,
}

impl SettingsStore {
    /// An in-memory store with no container yet.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store persisted at `path`.
    ///
    /// A missing file is not an error: the store simply has no container.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let values = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Some(BTreeMap::new()),
            Ok(content) => Some(serde_saphyr::from_str(&content).map_err(|e| {
                StoreError::Settings {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
            })?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(StoreError::io("read", path, e)),
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            values,
        })
    }

    /// Opens the sidecar store belonging to an artifact.
    pub fn for_artifact(artifact: &Path) -> Result<Self, StoreError> {
        let path = derive_settings_path(artifact).ok_or_else(|| StoreError::underivable(artifact))?;
        if path == artifact {
            return Err(StoreError::LogPathCollision(path));
        }
        Self::open(&path)
    }

    /// Where this store persists, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True once the container exists.
    pub fn has_container(&self) -> bool {
        self.values.is_some()
    }

    /// Returns the stored value for `key`, or `default` when the container
    /// or the key is missing or holds a value of another type.
    pub fn get<T: FromSetting>(&self, key: &str, default: T) -> T {
        self.raw(key).and_then(T::from_setting).unwrap_or(default)
    }

    /// Returns the stored value for `key` without any conversion.
    pub fn raw(&self, key: &str) -> Option<&SettingValue> {
        self.values.as_ref().and_then(|values| values.get(key))
    }

    /// Creates the container if needed and upserts `key`.
    ///
    /// Persists immediately when the store is file-backed.
    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) -> Result<(), StoreError> {
        self.values
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self.save()
    }

    /// All stored entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values
            .iter()
            .flat_map(|values| values.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn save(&self) -> Result<(), StoreError> {
        let (Some(path), Some(values)) = (&self.path, &self.values) else {
            return Ok(());
        };

        let yaml = serde_saphyr::to_string(values).map_err(|e| StoreError::Settings {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(path, yaml).map_err(|e| StoreError::io("write", path, e))?;

        tracing::debug!(path = %path.display(), "Saved project settings");
        Ok(())
    }

    // ==================== Well-known keys ====================

    pub fn master_file_path(&self) -> String {
        self.get(MASTER_FILE_PATH, String::new())
    }

    pub fn push_to_master_enabled(&self) -> bool {
        self.get(PUSH_TO_MASTER_ENABLED, false)
    }

    pub fn disable_auto_prompts(&self) -> bool {
        self.get(DISABLE_AUTO_PROMPTS, false)
    }

    pub fn skip_threshold_minutes(&self) -> f64 {
        self.get(SKIP_THRESHOLD_MINUTES, DEFAULT_SKIP_THRESHOLD_MINUTES)
    }

    /// Raw stored timestamp of the last prompt; parsing is the throttle's job.
    pub fn last_prompt_time(&self) -> Option<String> {
        self.raw(LAST_PROMPT_TIME).map(|v| v.to_string())
    }
}

/// Returns the settings sidecar path for an artifact.
pub fn derive_settings_path(artifact: &Path) -> Option<PathBuf> {
    derive_path(artifact, SETTINGS_SUFFIX)
}
