//! Batch orchestration and the conversion boundary.

pub mod batch;
pub mod converter;
pub mod destination;
pub mod native;

pub use batch::{BatchConfig, BatchProcessor, BatchReport};
pub use converter::{ConvertRequest, ConvertResponse, ImageConverter};
pub use destination::{Destination, resolve_destination, update_file_extension};
pub use native::NativeConverter;
