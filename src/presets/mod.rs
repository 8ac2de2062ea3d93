//! Preset persistence.
//!
//! - [`PresetRegistry`]: named option snapshots with add/remove/update/load
//! - [`SettingsStore`]: key-value backing store, JSON file or in-memory

mod registry;
pub mod store;

pub use registry::{DEFAULT_PRESET_NAME, Preset, PresetRegistry, PresetUpdate};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};
