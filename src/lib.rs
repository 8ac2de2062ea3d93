// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod presets;
pub mod processing;
pub mod commands;

// Public exports for external consumers
pub use core::{AppState, ImageProcessingOptions, ImageTask, OutputFormat, ProcessedImage, ResizeOptions};
pub use presets::{Preset, PresetRegistry};
pub use processing::{BatchProcessor, BatchReport, ImageConverter, NativeConverter};
pub use utils::{ConverterError, ConverterResult, ImageFormat};

// This library file is the public API; the CLI entry point is in main.rs.
