//! Named, persisted snapshots of conversion options.

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::core::ImageProcessingOptions;
use crate::presets::store::{PRESETS_KEY, SettingsStore, load_json, save_json};
use crate::utils::{ConverterResult, validate_options};

pub const DEFAULT_PRESET_NAME: &str = "Untitled preset";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub options: ImageProcessingOptions,
}

/// Fields to merge into an existing preset
#[derive(Debug, Clone, Default)]
pub struct PresetUpdate {
    pub name: Option<String>,
    pub options: Option<ImageProcessingOptions>,
}

/// Preset list mirrored in memory and in the settings store.
///
/// Every mutation persists the full next list first and only swaps the
/// in-memory copy after the store accepted it.
pub struct PresetRegistry {
    store: Arc<dyn SettingsStore>,
    presets: Vec<Preset>,
}

impl PresetRegistry {
    /// Loads the persisted list; a missing key is an empty registry.
    pub fn open(store: Arc<dyn SettingsStore>) -> ConverterResult<Self> {
        let presets: Vec<Preset> = load_json(store.as_ref(), PRESETS_KEY)?.unwrap_or_default();
        debug!("Loaded {} presets", presets.len());
        Ok(Self { store, presets })
    }

    /// Saves a copy of `options` under `name` and returns the new id.
    pub fn add(&mut self, name: &str, options: &ImageProcessingOptions) -> ConverterResult<String> {
        validate_options(options)?;

        let name = match name.trim() {
            "" => DEFAULT_PRESET_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        let preset = Preset {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            options: options.clone(),
        };
        let id = preset.id.clone();

        let mut next = self.presets.clone();
        next.push(preset);
        self.commit(next)?;

        info!("Added preset {}", id);
        Ok(id)
    }

    /// Removes the preset with `id`; absent ids are fine.
    pub fn remove(&mut self, id: &str) -> ConverterResult<()> {
        let next: Vec<Preset> = self.presets.iter().filter(|p| p.id != id).cloned().collect();
        if next.len() != self.presets.len() {
            debug!("Removing preset {}", id);
        }
        self.commit(next)
    }

    /// Merges `update` into the preset with `id`; no-op when absent.
    pub fn update(&mut self, id: &str, update: PresetUpdate) -> ConverterResult<()> {
        if let Some(options) = &update.options {
            validate_options(options)?;
        }

        let mut next = self.presets.clone();
        let Some(preset) = next.iter_mut().find(|p| p.id == id) else {
            debug!("Update for unknown preset {} ignored", id);
            return Ok(());
        };
        if let Some(name) = update.name {
            preset.name = name;
        }
        if let Some(options) = update.options {
            preset.options = options;
        }
        self.commit(next)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> ConverterResult<()> {
        self.update(id, PresetUpdate {
            name: Some(name.to_string()),
            options: None,
        })
    }

    /// Copy of the stored options for `id`
    pub fn load(&self, id: &str) -> Option<ImageProcessingOptions> {
        self.get(id).map(|p| p.options.clone())
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Looks a preset up by id first, then by exact name
    pub fn find(&self, id_or_name: &str) -> Option<&Preset> {
        self.get(id_or_name)
            .or_else(|| self.presets.iter().find(|p| p.name == id_or_name))
    }

    pub fn list(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    fn commit(&mut self, next: Vec<Preset>) -> ConverterResult<()> {
        save_json(self.store.as_ref(), PRESETS_KEY, &next)?;
        self.presets = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use serde_json::Value;
    use crate::core::ResizeOptions;
    use crate::presets::store::MemoryStore;
    use crate::utils::{ConverterError, ImageFormat};

    /// Store whose writes can be switched off
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: AtomicBool,
    }

    impl SettingsStore for FlakyStore {
        fn get(&self, key: &str) -> ConverterResult<Option<Value>> {
            self.inner.get(key)
        }

        fn set_many(&self, entries: Vec<(&str, Value)>) -> ConverterResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ConverterError::persistence("disk full"));
            }
            self.inner.set_many(entries)
        }
    }

    fn web_small() -> ImageProcessingOptions {
        ImageProcessingOptions::new(ImageFormat::Webp, 75)
    }

    fn persisted_len(store: &dyn SettingsStore) -> usize {
        load_json::<Vec<Preset>>(store, PRESETS_KEY).unwrap().unwrap_or_default().len()
    }

    #[test]
    fn add_then_remove_restores_length() {
        let store = Arc::new(MemoryStore::new());
        let mut registry = PresetRegistry::open(store.clone()).unwrap();
        let before = registry.len();

        let id = registry.add("Web Small", &web_small()).unwrap();
        assert_eq!(registry.len(), before + 1);
        assert_eq!(persisted_len(store.as_ref()), before + 1);
        assert_eq!(registry.get(&id).unwrap().name, "Web Small");

        registry.remove(&id).unwrap();
        assert_eq!(registry.len(), before);
        assert_eq!(persisted_len(store.as_ref()), before);
    }

    #[test]
    fn remove_unknown_is_idempotent() {
        let mut registry = PresetRegistry::open(Arc::new(MemoryStore::new())).unwrap();
        registry.add("A", &web_small()).unwrap();
        registry.remove("nope").unwrap();
        registry.remove("nope").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn load_returns_a_copy() {
        let mut registry = PresetRegistry::open(Arc::new(MemoryStore::new())).unwrap();
        let id = registry.add("Web Small", &web_small()).unwrap();

        let mut loaded = registry.load(&id).unwrap();
        loaded.quality = 10;
        loaded.format = ImageFormat::Png.into();
        loaded.resize = Some(ResizeOptions::max_width(100));

        assert_eq!(registry.load(&id).unwrap(), web_small());
    }

    #[test]
    fn add_stores_a_copy_of_the_callers_options() {
        let mut registry = PresetRegistry::open(Arc::new(MemoryStore::new())).unwrap();
        let mut current = web_small();
        let id = registry.add("Snapshot", &current).unwrap();

        current.quality = 20;

        assert_eq!(registry.load(&id).unwrap().quality, 75);
    }

    #[test]
    fn update_and_rename_merge_fields() {
        let mut registry = PresetRegistry::open(Arc::new(MemoryStore::new())).unwrap();
        let id = registry.add("Web", &web_small()).unwrap();

        registry.rename(&id, "Web Tiny").unwrap();
        registry
            .update(&id, PresetUpdate {
                name: None,
                options: Some(ImageProcessingOptions::new(ImageFormat::Avif, 60)),
            })
            .unwrap();

        let preset = registry.get(&id).unwrap();
        assert_eq!(preset.name, "Web Tiny");
        assert_eq!(preset.options.format, ImageFormat::Avif);

        // unknown id: nothing changes, no error
        registry.rename("missing", "x").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn blank_name_gets_default() {
        let mut registry = PresetRegistry::open(Arc::new(MemoryStore::new())).unwrap();
        let id = registry.add("   ", &web_small()).unwrap();
        assert_eq!(registry.get(&id).unwrap().name, DEFAULT_PRESET_NAME);
        assert_eq!(registry.find(DEFAULT_PRESET_NAME).unwrap().id, id);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let mut registry = PresetRegistry::open(Arc::new(MemoryStore::new())).unwrap();
        let bad = ImageProcessingOptions::new(ImageFormat::Jpeg, 0);
        assert!(matches!(registry.add("Bad", &bad), Err(ConverterError::Validation(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let store = Arc::new(FlakyStore::default());
        let mut registry = PresetRegistry::open(store.clone()).unwrap();
        let id = registry.add("Keep", &web_small()).unwrap();

        store.fail.store(true, Ordering::SeqCst);

        assert!(matches!(registry.add("Lost", &web_small()), Err(ConverterError::Persistence(_))));
        assert!(registry.remove(&id).is_err());
        assert!(registry.rename(&id, "Renamed").is_err());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().name, "Keep");
        assert_eq!(persisted_len(store.as_ref()), 1);
    }

    #[test]
    fn reopen_sees_persisted_presets() {
        let store = Arc::new(MemoryStore::new());
        let id = {
            let mut registry = PresetRegistry::open(store.clone()).unwrap();
            registry.add("Persisted", &web_small()).unwrap()
        };

        let registry = PresetRegistry::open(store).unwrap();
        assert_eq!(registry.load(&id), Some(web_small()));
    }
}
