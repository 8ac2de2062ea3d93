//! Command handlers for the CLI.
//!
//! - [`convert`]: run one batch
//! - [`run_preset`]: list, add, update, rename, remove and apply presets
//! - [`run_settings`]: show or change the persisted current settings

mod image;
mod options;
mod preset;
mod settings;

pub use image::{ConvertArgs, convert};
pub use options::{DestinationArgs, OptionArgs};
pub use preset::{PresetCommand, run_preset};
pub use settings::{SettingsCommand, run_settings};
