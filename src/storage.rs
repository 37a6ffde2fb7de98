//! Durable key-value store for the best survival time
//!
//! The only thing that outlives a session is one number. Reads treat a
//! missing or unparsable value as 0; write failures are logged and ignored
//! so gameplay never depends on the disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::error::{Result, ShroomError};

/// Key under which the best survival time (seconds) is stored
pub const BEST_TIME_KEY: &str = "shroom-best-survival-time";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// JSON object on disk, rewritten atomically on every set
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory
    pub fn in_project_dir() -> Result<Self> {
        let proj = directories::ProjectDirs::from("com", "shroom", "Shroom")
            .ok_or_else(|| ShroomError::Storage("could not resolve project directories".into()))?;
        let dir = proj.data_local_dir();
        fs::create_dir_all(dir)?;
        Ok(Self::new(dir.join("store.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // A corrupt file is replaced rather than blocking the write
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), value.to_string());

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| ShroomError::Storage("memory store poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| ShroomError::Storage("memory store poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Best survival time, or 0 when absent, unreadable or not a number
pub fn load_best_time(store: &dyn KeyValueStore) -> f32 {
    match store.get(BEST_TIME_KEY) {
        Ok(Some(raw)) => raw
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0),
        Ok(None) => 0.0,
        Err(e) => {
            tracing::warn!("Could not read best time: {}", e);
            0.0
        }
    }
}

/// Persist the best time, swallowing failures
pub fn save_best_time(store: &dyn KeyValueStore, best: f32) {
    if let Err(e) = store.set(BEST_TIME_KEY, &best.to_string()) {
        tracing::warn!("Could not persist best time: {}", e);
    }
}
