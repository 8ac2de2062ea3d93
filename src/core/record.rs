//! Per-item outcome records shown in the ledger.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::core::{ImageProcessingOptions, ImageTask};
use crate::utils::ImageFormat;

/// Lifecycle of one batch item. `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Processing,
    Completed,
    Error,
}

impl ImageStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// One processed (or in-flight) image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImage {
    pub id: String,
    pub file_name: String,
    /// MIME type of the input
    pub content_type: String,
    pub original_size: u64,
    /// Zero until the item completes
    pub processed_size: u64,
    #[serde(skip)]
    pub original_data: Vec<u8>,
    #[serde(skip)]
    pub processed_data: Vec<u8>,
    /// Options this record was produced with, format already resolved
    pub options: ImageProcessingOptions,
    /// Format of `processed_data`
    pub format: ImageFormat,
    /// The output would have grown, so `processed_data` is the input
    #[serde(default)]
    pub kept_original: bool,
    pub status: ImageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Where the output was written, once saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
}

impl ProcessedImage {
    /// A fresh record in `Processing` state for `task`.
    ///
    /// A `same-as-source` format is resolved against the task's content type.
    pub fn start(task: &ImageTask, options: &ImageProcessingOptions) -> Self {
        let format = options.format.resolve(&task.content_type);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: task.file_name.clone(),
            content_type: task.content_type.clone(),
            original_size: task.size(),
            processed_size: 0,
            original_data: task.data.clone(),
            processed_data: Vec::new(),
            options: options.resolved_for(&task.content_type),
            format,
            kept_original: false,
            status: ImageStatus::Processing,
            error: None,
            saved_path: None,
            source_dir: task.source_dir.clone(),
        }
    }

    /// Bytes saved by the conversion (negative when the output grew)
    pub fn saved_bytes(&self) -> i64 {
        self.original_size as i64 - self.processed_size as i64
    }

    /// Savings as a percentage of the original size
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size > 0 {
            self.saved_bytes() as f64 / self.original_size as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Applies `update`. Terminal records only accept `saved_path`.
    pub fn apply(&mut self, update: ProcessedImageUpdate) {
        if !self.status.is_terminal() {
            if let Some(status) = update.status {
                self.status = status;
            }
            if let Some(data) = update.processed_data {
                self.processed_data = data;
            }
            if let Some(size) = update.processed_size {
                self.processed_size = size;
            }
            if let Some(error) = update.error {
                self.error = Some(error);
            }
            if let Some(format) = update.format {
                self.format = format;
            }
            self.kept_original |= update.kept_original;
            if self.status.is_terminal() {
                // input bytes are only kept while the item is in flight
                self.original_data = Vec::new();
            }
        }
        if let Some(path) = update.saved_path {
            self.saved_path = Some(path);
        }
    }
}

/// Partial update for a ledger record.
#[derive(Debug, Clone, Default)]
pub struct ProcessedImageUpdate {
    pub status: Option<ImageStatus>,
    pub processed_data: Option<Vec<u8>>,
    pub processed_size: Option<u64>,
    pub error: Option<String>,
    pub saved_path: Option<PathBuf>,
    pub format: Option<ImageFormat>,
    pub kept_original: bool,
}

impl ProcessedImageUpdate {
    pub fn completed(data: Vec<u8>) -> Self {
        Self {
            status: Some(ImageStatus::Completed),
            processed_size: Some(data.len() as u64),
            processed_data: Some(data),
            ..Self::default()
        }
    }

    /// Completes with the input bytes, still in their own `format`
    pub fn kept_original(data: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            format: Some(format),
            kept_original: true,
            ..Self::completed(data)
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(ImageStatus::Error),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn saved(path: PathBuf) -> Self {
        Self {
            saved_path: Some(path),
            ..Self::default()
        }
    }
}
