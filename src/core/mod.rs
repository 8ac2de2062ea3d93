//! Core application types and state management.
//!
//! This module contains the fundamental types used throughout the application:
//! - [`AppState`]: explicit context shared by the commands
//! - [`ImageTask`]: one file handed to a batch
//! - [`ImageProcessingOptions`]: configuration for converting an image
//! - [`ProcessedImage`] / [`ResultLedger`]: per-item outcomes
//! - [`BatchProgress`]: progress tracking for batch operations

mod ledger;
mod progress;
mod record;
mod state;
mod task;
mod types;

pub use ledger::ResultLedger;
pub use progress::{BatchProgress, ProgressEvent, ProgressType};
pub use record::{ImageStatus, ProcessedImage, ProcessedImageUpdate};
pub use state::AppState;
pub use task::ImageTask;
pub use types::{
    DestinationSettings, DestinationType, ImageProcessingOptions, OutputFormat, ResizeOptions,
    ResizeType,
};
