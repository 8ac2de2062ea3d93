//! Persistent key-value settings store.
//!
//! Values are whole JSON documents replaced on every write, so what is on
//! disk is always a complete snapshot of what the caller last set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use crate::utils::{ConverterError, ConverterResult, ensure_parent_dir};

/// Key holding the preset list
pub const PRESETS_KEY: &str = "presets";
pub const CURRENT_OPTIONS_KEY: &str = "currentOptions";
pub const DESTINATION_TYPE_KEY: &str = "destinationType";
pub const CUSTOM_DESTINATION_PATH_KEY: &str = "customDestinationPath";

pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> ConverterResult<Option<Value>>;

    /// Replaces the values under several keys in one write: either every
    /// entry is persisted or none is.
    fn set_many(&self, entries: Vec<(&str, Value)>) -> ConverterResult<()>;

    /// Replaces the value under `key`. Either fully persisted or an error.
    fn set(&self, key: &str, value: Value) -> ConverterResult<()> {
        self.set_many(vec![(key, value)])
    }
}

/// Reads `key` and deserializes it
pub fn load_json<T: DeserializeOwned>(store: &dyn SettingsStore, key: &str) -> ConverterResult<Option<T>> {
    match store.get(key)? {
        Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
            ConverterError::persistence(format!("Corrupt value under '{}': {}", key, e))
        }),
        None => Ok(None),
    }
}

/// Serializes `value` and writes it under `key`
pub fn save_json<T: Serialize>(store: &dyn SettingsStore, key: &str, value: &T) -> ConverterResult<()> {
    store.set(key, serde_json::to_value(value)?)
}

/// Store backed by a single JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> ConverterResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| {
                ConverterError::persistence(format!("Cannot read {}: {}", path.display(), e))
            })?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    ConverterError::persistence(format!("Corrupt settings file {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened settings store {} ({} keys)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Default location under the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("image-converter").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_snapshot(&self, entries: &BTreeMap<String, Value>) -> ConverterResult<()> {
        ensure_parent_dir(&self.path)
            .map_err(|e| ConverterError::persistence(e.to_string()))?;
        let json = serde_json::to_string_pretty(entries)?;

        // write-then-rename
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| {
            ConverterError::persistence(format!("Cannot write {}: {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            ConverterError::persistence(format!("Cannot replace {}: {}", self.path.display(), e))
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> ConverterResult<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ConverterError::persistence("Settings store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, updates: Vec<(&str, Value)>) -> ConverterResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ConverterError::persistence("Settings store lock poisoned"))?;

        let mut next = entries.clone();
        for (key, value) in updates {
            next.insert(key.to_string(), value);
        }
        self.write_snapshot(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> ConverterResult<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ConverterError::persistence("Settings store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, updates: Vec<(&str, Value)>) -> ConverterResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ConverterError::persistence("Settings store lock poisoned"))?;
        for (key, value) in updates {
            entries.insert(key.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_store_survives_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested/settings.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get(PRESETS_KEY).unwrap(), None);
        store.set(PRESETS_KEY, json!([{"id": "1"}])).unwrap();
        store.set(DESTINATION_TYPE_KEY, json!("custom")).unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(PRESETS_KEY).unwrap(), Some(json!([{"id": "1"}])));
        assert_eq!(reopened.get(DESTINATION_TYPE_KEY).unwrap(), Some(json!("custom")));
    }

    #[test]
    fn set_replaces_whole_value() {
        let store = MemoryStore::new();
        store.set("k", json!([1, 2, 3])).unwrap();
        store.set("k", json!([4])).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!([4])));
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set("k", json!(1)).unwrap();

        // a directory where the temp file should go makes the write fail
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let result = store.set("k", json!(2));

        assert!(matches!(result, Err(ConverterError::Persistence(_))));
        assert_eq!(store.get("k").unwrap(), Some(json!(1)));
    }

    #[test]
    fn set_many_is_one_write() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set(DESTINATION_TYPE_KEY, json!("downloads")).unwrap();

        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let result = store.set_many(vec![
            (DESTINATION_TYPE_KEY, json!("custom")),
            (CUSTOM_DESTINATION_PATH_KEY, json!("/exports")),
        ]);
        assert!(result.is_err());
        assert_eq!(store.get(DESTINATION_TYPE_KEY).unwrap(), Some(json!("downloads")));
        assert_eq!(store.get(CUSTOM_DESTINATION_PATH_KEY).unwrap(), None);

        std::fs::remove_dir(path.with_extension("json.tmp")).unwrap();
        store
            .set_many(vec![
                (DESTINATION_TYPE_KEY, json!("custom")),
                (CUSTOM_DESTINATION_PATH_KEY, json!("/exports")),
            ])
            .unwrap();
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(DESTINATION_TYPE_KEY).unwrap(), Some(json!("custom")));
        assert_eq!(reopened.get(CUSTOM_DESTINATION_PATH_KEY).unwrap(), Some(json!("/exports")));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(ConverterError::Persistence(_))));
    }

    #[test]
    fn typed_helpers_round_values() {
        let store = MemoryStore::new();
        save_json(&store, "n", &42u32).unwrap();
        assert_eq!(load_json::<u32>(&store, "n").unwrap(), Some(42));
        assert_eq!(load_json::<u32>(&store, "missing").unwrap(), None);
        assert!(load_json::<Vec<String>>(&store, "n").is_err());
    }
}
