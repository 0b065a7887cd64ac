//! Persisted settings and the stores that hold them

use crate::error::PersistenceError;
use async_trait::async_trait;
use longform_compile::SerializedWorkflow;
use longform_model::DraftFormat;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Mirror of one draft's order, keyed by index path in [`PersistedSettings`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDraft {
    /// Scene paths in order
    #[serde(default)]
    pub scene_order: Vec<String>,
    /// Draft format
    #[serde(rename = "type", default)]
    pub format: DraftFormat,
}

/// Everything written to the settings store
///
/// Keys this version does not know about are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSettings {
    /// Index note of the selected draft
    #[serde(default)]
    pub selected_draft_vault_path: Option<String>,
    /// Folder scanned for user scripts
    #[serde(default)]
    pub user_script_folder: Option<String>,
    /// Workflows by name
    #[serde(default)]
    pub workflows: BTreeMap<String, SerializedWorkflow>,
    /// Draft order mirror by index path
    #[serde(default)]
    pub drafts: BTreeMap<String, PersistedDraft>,
    /// Host keys preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersistedSettings {
    /// Parse from JSON text
    ///
    /// # Errors
    /// Returns error if the text is not a valid settings object
    pub fn from_json(text: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Durable home of [`PersistedSettings`]
#[async_trait]
pub trait SettingsStore: Send + Sync + 'static {
    /// Load settings; `None` when nothing was saved yet
    async fn load(&self) -> Result<Option<PersistedSettings>, PersistenceError>;

    /// Replace the stored settings
    async fn save(&self, settings: &PersistedSettings) -> Result<(), PersistenceError>;
}

/// Settings kept in one JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    /// Create store for a file path
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Settings file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn load(&self) -> Result<Option<PersistedSettings>, PersistenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => PersistedSettings::from_json(&text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, settings: &PersistedSettings) -> Result<(), PersistenceError> {
        let json = settings.to_json()?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        // write then rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    settings: Mutex<Option<PersistedSettings>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

/// In-memory store that counts saves and can be told to fail
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    inner: Arc<MemoryInner>,
}

impl MemorySettingsStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding settings
    #[must_use]
    pub fn with_settings(settings: PersistedSettings) -> Self {
        let store = Self::default();
        *store.inner.settings.lock() = Some(settings);
        store
    }

    /// Last saved settings
    #[must_use]
    pub fn stored(&self) -> Option<PersistedSettings> {
        self.inner.settings.lock().clone()
    }

    /// Number of successful saves
    #[inline]
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    /// Make every following save fail (or succeed again)
    #[inline]
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<PersistedSettings>, PersistenceError> {
        Ok(self.stored())
    }

    async fn save(&self, settings: &PersistedSettings) -> Result<(), PersistenceError> {
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("store is failing".to_string()));
        }
        *self.inner.settings.lock() = Some(settings.clone());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
