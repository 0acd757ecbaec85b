#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::Resource;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// Keys mirrored to persistent storage
pub const HIGH_SCORE_KEY: &str = "highScore";
pub const BEST_COMBO_KEY: &str = "bestCombo";
pub const TOTAL_TILES_CLEARED_KEY: &str = "totalTilesCleared";
pub const COINS_KEY: &str = "coins";
pub const DAILY_CHALLENGE_KEY: &str = "dailyChallenge";
pub const SETTINGS_KEY: &str = "settings";

// Default store file path
const STORE_FILE_PATH: &str = "data/tiledrop.json";

// Environment variable that points at an alternative store file
pub const STORE_ENV_VAR: &str = "TILEDROP_STORE";

/// Best-effort key/value storage for summary statistics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "store i/o error: {err}"),
            StoreError::Json(err) => write!(f, "store json error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Json(err) => Some(err),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Json(err)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }
}

/// A single JSON object on disk, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// Opens the store at `path`; a missing file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Map::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err.into()),
        };
        debug!("Opened store at {} with {} keys", path.display(), values.len());
        Ok(Self { path, values })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.to_owned(), value);
        self.flush()
    }
}

// Get the path to the store file
#[must_use]
pub fn get_store_file_path() -> PathBuf {
    if let Ok(path) = std::env::var(STORE_ENV_VAR) {
        return PathBuf::from(path);
    }

    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("tiledrop").join("store.json")
    } else {
        PathBuf::from(STORE_FILE_PATH)
    }
}

/// Wraps the injected store. Reads fall back to defaults and write failures
/// are logged and swallowed; the session never depends on them.
#[derive(Resource)]
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    #[must_use]
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.store.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(err) => {
                warn!("Failed to load {key}: {err}");
                return None;
            }
        };

        // Older saves hold numbers and records as strings
        let decoded: Result<T, serde_json::Error> = match value {
            Value::String(text) => {
                serde_json::from_str(&text).or_else(|_| serde_json::from_value(Value::String(text)))
            }
            other => serde_json::from_value(other),
        };

        match decoded {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("Ignoring unreadable {key}: {err}");
                None
            }
        }
    }

    #[must_use]
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.load(key).unwrap_or(default)
    }

    /// Returns whether the write went through.
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                warn!("Failed to encode {key}: {err}");
                return false;
            }
        };
        match self.store.set(key, value) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to save {key}: {err}");
                false
            }
        }
    }
}

impl Default for Persistence {
    fn default() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }
}
