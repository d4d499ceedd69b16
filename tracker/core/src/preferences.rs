//! Preference Store
//!
//! Local key-value storage for boolean UI preferences. The theme controller
//! reads it as a stream of snapshots and writes several keys at once.
//!
//! Two implementations ship with the crate:
//! - [`MemoryPreferenceStore`]: process-local, used by tests and `--offline`
//! - [`FilePreferenceStore`]: a TOML table on disk, replaced atomically

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use crate::error::PreferenceError;

/// Explicit dark/light choice
pub const DARK_MODE_KEY: &str = "dark_mode";
/// Whether the platform theme takes precedence
pub const USE_SYSTEM_THEME_KEY: &str = "use_system_theme";

/// Snapshot of every stored preference
pub type PreferenceMap = BTreeMap<String, bool>;

/// Streamed read and atomic multi-key write of boolean preferences
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Receiver starting at the current snapshot, notified on every write
    fn watch(&self) -> watch::Receiver<PreferenceMap>;

    /// Write all `updates` as one change
    ///
    /// Readers observe either none or all of the keys.
    async fn edit(&self, updates: &[(&str, bool)]) -> Result<(), PreferenceError>;
}

fn apply(map: &mut PreferenceMap, updates: &[(&str, bool)]) {
    for (key, value) in updates {
        map.insert((*key).to_string(), *value);
    }
}

/// Preferences held in memory only
#[derive(Debug)]
pub struct MemoryPreferenceStore {
    tx: watch::Sender<PreferenceMap>,
}

impl MemoryPreferenceStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::with_values(PreferenceMap::new())
    }

    /// Store seeded with `values`
    #[must_use]
    pub fn with_values(values: PreferenceMap) -> Self {
        let (tx, _rx) = watch::channel(values);
        Self { tx }
    }
}

impl Default for MemoryPreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    fn watch(&self) -> watch::Receiver<PreferenceMap> {
        self.tx.subscribe()
    }

    async fn edit(&self, updates: &[(&str, bool)]) -> Result<(), PreferenceError> {
        self.tx.send_modify(|map| apply(map, updates));
        Ok(())
    }
}

/// Preferences persisted as a TOML table
///
/// ```toml
/// dark_mode = true
/// use_system_theme = false
/// ```
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    tx: watch::Sender<PreferenceMap>,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Default location: `$XDG_CONFIG_HOME/task-tracker/preferences.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("task-tracker").join("preferences.toml"))
    }

    /// Open the store at `path`, loading what is already there
    ///
    /// A missing file starts an empty store; it is created on first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) => toml::from_str::<PreferenceMap>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PreferenceMap::new(),
            Err(source) => return Err(PreferenceError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Preferences loaded");
        let (tx, _rx) = watch::channel(values);
        Ok(Self {
            path,
            tx,
            write_lock: Mutex::new(()),
        })
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &PreferenceMap) -> Result<(), PreferenceError> {
        let io = |source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io)?;
        }

        let content = toml::to_string(values)?;
        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, content).await.map_err(io)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io)?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    fn watch(&self) -> watch::Receiver<PreferenceMap> {
        self.tx.subscribe()
    }

    async fn edit(&self, updates: &[(&str, bool)]) -> Result<(), PreferenceError> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.tx.borrow().clone();
        apply(&mut next, updates);
        self.persist(&next).await?;

        // Publish only once the file holds the new values
        self.tx.send_replace(next);
        Ok(())
    }
}
