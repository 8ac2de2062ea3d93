//! Application state shared by the CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::{
    BatchProgress, DestinationSettings, DestinationType, ImageProcessingOptions, ImageTask,
    ProcessedImage, ProgressEvent, ResultLedger,
};
use crate::presets::store::{
    CURRENT_OPTIONS_KEY, CUSTOM_DESTINATION_PATH_KEY, DESTINATION_TYPE_KEY, load_json, save_json,
};
use crate::presets::{Preset, PresetRegistry, PresetUpdate, SettingsStore};
use crate::processing::{BatchConfig, BatchProcessor, BatchReport, ImageConverter, NativeConverter};
use crate::utils::{ConverterError, ConverterResult, FileHost, LocalFileHost, validate_options};

/// Everything a conversion session needs, passed around explicitly.
///
/// Cloning is cheap; clones share the same presets, ledger and settings.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn SettingsStore>,
    processor: Arc<BatchProcessor>,
    presets: Arc<Mutex<PresetRegistry>>,
    ledger: Arc<Mutex<ResultLedger>>,
    options: Arc<Mutex<ImageProcessingOptions>>,
    destination: Arc<Mutex<DestinationSettings>>,
}

impl AppState {
    /// Creates the state, loading presets and current settings from `store`.
    pub fn new(
        converter: Arc<dyn ImageConverter>,
        host: Arc<dyn FileHost>,
        store: Arc<dyn SettingsStore>,
        config: BatchConfig,
    ) -> ConverterResult<Self> {
        let presets = PresetRegistry::open(Arc::clone(&store))?;
        let options = load_json::<ImageProcessingOptions>(store.as_ref(), CURRENT_OPTIONS_KEY)?
            .unwrap_or_default();
        let destination = load_destination(store.as_ref())?;

        debug!(
            "AppState initialized ({} presets, options {}, destination {:?})",
            presets.len(),
            options.summary(),
            destination.destination_type
        );

        Ok(Self {
            processor: Arc::new(BatchProcessor::new(converter, host, config)),
            store,
            presets: Arc::new(Mutex::new(presets)),
            ledger: Arc::new(Mutex::new(ResultLedger::new())),
            options: Arc::new(Mutex::new(options)),
            destination: Arc::new(Mutex::new(destination)),
        })
    }

    /// State backed by the native converter and the local disk.
    pub fn native(store: Arc<dyn SettingsStore>, config: BatchConfig) -> ConverterResult<Self> {
        Self::new(
            Arc::new(NativeConverter::new()),
            Arc::new(LocalFileHost::new()),
            store,
            config,
        )
    }

    // ── Current settings ──────────────────────────────────────────────────

    /// Copy of the current options
    pub async fn options(&self) -> ImageProcessingOptions {
        self.options.lock().await.clone()
    }

    /// Validates, persists and then adopts `options`.
    pub async fn set_options(&self, options: ImageProcessingOptions) -> ConverterResult<()> {
        validate_options(&options)?;
        let mut current = self.options.lock().await;
        save_json(self.store.as_ref(), CURRENT_OPTIONS_KEY, &options)?;
        debug!("Current options set to {}", options.summary());
        *current = options;
        Ok(())
    }

    pub async fn destination(&self) -> DestinationSettings {
        self.destination.lock().await.clone()
    }

    /// Persists both destination keys in one write, then adopts the policy.
    pub async fn set_destination(&self, destination: DestinationSettings) -> ConverterResult<()> {
        let mut current = self.destination.lock().await;
        self.store.set_many(vec![
            (DESTINATION_TYPE_KEY, serde_json::to_value(destination.destination_type)?),
            (
                CUSTOM_DESTINATION_PATH_KEY,
                serde_json::to_value(&destination.custom_destination_path)?,
            ),
        ])?;
        debug!("Destination set to {:?}", destination.destination_type);
        *current = destination;
        Ok(())
    }

    // ── Presets ───────────────────────────────────────────────────────────

    pub async fn presets(&self) -> Vec<Preset> {
        self.presets.lock().await.list().to_vec()
    }

    /// Saves the current options as a new preset
    pub async fn save_current_as_preset(&self, name: &str) -> ConverterResult<String> {
        let options = self.options().await;
        self.presets.lock().await.add(name, &options)
    }

    pub async fn add_preset(&self, name: &str, options: &ImageProcessingOptions) -> ConverterResult<String> {
        self.presets.lock().await.add(name, options)
    }

    pub async fn update_preset(&self, id: &str, update: PresetUpdate) -> ConverterResult<()> {
        self.presets.lock().await.update(id, update)
    }

    pub async fn rename_preset(&self, id: &str, name: &str) -> ConverterResult<()> {
        self.presets.lock().await.rename(id, name)
    }

    pub async fn remove_preset(&self, id: &str) -> ConverterResult<()> {
        self.presets.lock().await.remove(id)
    }

    /// Looks a preset up by id or name
    pub async fn find_preset(&self, id_or_name: &str) -> Option<Preset> {
        self.presets.lock().await.find(id_or_name).cloned()
    }

    /// Makes a copy of the preset's options current and returns it.
    pub async fn apply_preset(&self, id_or_name: &str) -> ConverterResult<ImageProcessingOptions> {
        let preset = self
            .find_preset(id_or_name)
            .await
            .ok_or_else(|| ConverterError::not_found(format!("No preset named or with id '{}'", id_or_name)))?;
        let options = self
            .presets
            .lock()
            .await
            .load(&preset.id)
            .ok_or_else(|| ConverterError::not_found(format!("Preset {} disappeared", preset.id)))?;
        self.set_options(options.clone()).await?;
        info!("Applied preset '{}'", preset.name);
        Ok(options)
    }

    // ── Batches ───────────────────────────────────────────────────────────

    /// Runs one batch with a snapshot of the current options and destination.
    pub async fn process_batch<F>(&self, tasks: Vec<ImageTask>, on_progress: F) -> ConverterResult<BatchReport>
    where
        F: FnMut(&ProgressEvent) + Send,
    {
        let options = self.options().await;
        let destination = self.destination().await;
        self.process_batch_with(tasks, &options, &destination, on_progress).await
    }

    /// Runs one batch with explicit settings, leaving the current ones alone
    pub async fn process_batch_with<F>(
        &self,
        tasks: Vec<ImageTask>,
        options: &ImageProcessingOptions,
        destination: &DestinationSettings,
        on_progress: F,
    ) -> ConverterResult<BatchReport>
    where
        F: FnMut(&ProgressEvent) + Send,
    {
        self.processor
            .process_batch(&self.ledger, tasks, options, destination, on_progress)
            .await
    }

    /// Writes a completed record using the current destination policy
    pub async fn save_processed(&self, id: &str, dir_override: Option<&Path>) -> ConverterResult<PathBuf> {
        let destination = self.destination().await;
        self.processor
            .save_processed(&self.ledger, id, &destination, dir_override)
            .await
    }

    pub fn progress(&self) -> BatchProgress {
        self.processor.progress()
    }

    pub fn is_processing(&self) -> bool {
        self.processor.is_running()
    }

    // ── Ledger ────────────────────────────────────────────────────────────

    pub async fn records(&self) -> Vec<ProcessedImage> {
        self.ledger.lock().await.records().to_vec()
    }

    pub async fn record(&self, id: &str) -> Option<ProcessedImage> {
        self.ledger.lock().await.get(id).cloned()
    }

    pub async fn remove_record(&self, id: &str) -> Option<ProcessedImage> {
        self.ledger.lock().await.remove(id)
    }

    pub async fn clear_records(&self) {
        self.ledger.lock().await.clear_all();
    }
}

fn load_destination(store: &dyn SettingsStore) -> ConverterResult<DestinationSettings> {
    let destination_type = load_json::<DestinationType>(store, DESTINATION_TYPE_KEY)?.unwrap_or_default();
    let custom_destination_path = load_json::<String>(store, CUSTOM_DESTINATION_PATH_KEY)?.unwrap_or_default();
    Ok(DestinationSettings {
        destination_type,
        custom_destination_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use crate::core::ImageStatus;
    use crate::presets::MemoryStore;
    use crate::processing::converter::tests::MockConverter;
    use crate::utils::ImageFormat;

    fn state_with(store: Arc<dyn SettingsStore>, downloads: &Path) -> AppState {
        AppState::new(
            Arc::new(MockConverter::shrinking()),
            Arc::new(LocalFileHost::with_downloads_dir(downloads)),
            store,
            BatchConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fresh_store_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = state_with(Arc::new(MemoryStore::new()), tmp.path());

        assert_eq!(state.options().await, ImageProcessingOptions::default());
        assert_eq!(state.destination().await.destination_type, DestinationType::Downloads);
        assert!(state.presets().await.is_empty());
        assert!(state.progress().is_idle());
    }

    #[tokio::test]
    async fn settings_survive_a_new_state() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store: Arc<dyn SettingsStore> = Arc::new(MemoryStore::new());

        let state = state_with(Arc::clone(&store), tmp.path());
        state.set_options(ImageProcessingOptions::new(ImageFormat::Avif, 55)).await.unwrap();
        state.set_destination(DestinationSettings::custom("/exports")).await.unwrap();

        let reopened = state_with(store, tmp.path());
        assert_eq!(reopened.options().await.format, ImageFormat::Avif);
        assert_eq!(reopened.destination().await, DestinationSettings::custom("/exports"));
    }

    /// Store that refuses any write touching one key
    struct RejectingStore {
        inner: MemoryStore,
        rejected_key: &'static str,
    }

    impl SettingsStore for RejectingStore {
        fn get(&self, key: &str) -> ConverterResult<Option<Value>> {
            self.inner.get(key)
        }

        fn set_many(&self, entries: Vec<(&str, Value)>) -> ConverterResult<()> {
            if entries.iter().any(|(key, _)| *key == self.rejected_key) {
                return Err(ConverterError::persistence("disk full"));
            }
            self.inner.set_many(entries)
        }
    }

    #[tokio::test]
    async fn failed_destination_write_changes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store: Arc<dyn SettingsStore> = Arc::new(RejectingStore {
            inner: MemoryStore::new(),
            rejected_key: CUSTOM_DESTINATION_PATH_KEY,
        });
        let state = state_with(Arc::clone(&store), tmp.path());

        let result = state.set_destination(DestinationSettings::custom("/exports")).await;
        assert!(matches!(result, Err(ConverterError::Persistence(_))));

        let in_memory = state.destination().await;
        let persisted = state_with(store, tmp.path()).destination().await;
        assert_eq!(in_memory, DestinationSettings::downloads());
        assert_eq!(persisted, in_memory);
    }

    #[tokio::test]
    async fn invalid_options_are_not_adopted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = state_with(Arc::new(MemoryStore::new()), tmp.path());

        let result = state.set_options(ImageProcessingOptions::new(ImageFormat::Png, 101)).await;
        assert!(matches!(result, Err(ConverterError::Validation(_))));
        assert_eq!(state.options().await.quality, 90);
    }

    #[tokio::test]
    async fn preset_snapshot_is_independent_of_current_options() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = state_with(Arc::new(MemoryStore::new()), tmp.path());

        state.set_options(ImageProcessingOptions::new(ImageFormat::Webp, 75)).await.unwrap();
        let id = state.save_current_as_preset("Web Small").await.unwrap();
        state.set_options(ImageProcessingOptions::new(ImageFormat::Jpeg, 30)).await.unwrap();

        let applied = state.apply_preset("Web Small").await.unwrap();
        assert_eq!(applied, ImageProcessingOptions::new(ImageFormat::Webp, 75));
        assert_eq!(state.options().await, applied);
        assert_eq!(state.find_preset(&id).await.unwrap().name, "Web Small");

        assert!(matches!(state.apply_preset("missing").await, Err(ConverterError::NotFound(_))));
    }

    #[tokio::test]
    async fn batch_uses_current_settings_and_fills_ledger() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = state_with(Arc::new(MemoryStore::new()), tmp.path());
        state.set_options(ImageProcessingOptions::new(ImageFormat::Webp, 80)).await.unwrap();

        let report = state
            .process_batch(vec![ImageTask::from_bytes("cat.png", vec![0; 1000])], |_| {})
            .await
            .unwrap();

        assert_eq!(report.completed, 1);
        assert!(tmp.path().join("cat.webp").exists());

        let records = state.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ImageStatus::Completed);
        assert_eq!(records[0].options.format, ImageFormat::Webp);

        state.clear_records().await;
        assert!(state.records().await.is_empty());
    }
}
