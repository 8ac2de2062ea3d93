use serde::{Deserialize, Serialize};
use crate::core::{ImageStatus, ProcessedImage};

/// Progress message type
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProgressType {
    /// Batch accepted, nothing finished yet
    Start,
    /// An item entered processing
    ItemStarted,
    /// An item reached a terminal state
    Progress,
    /// Every item is terminal
    Complete,
}

/// Batch counter. `current` counts terminal items only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    /// Progress percentage (0-100)
    pub fn percentage(&self) -> usize {
        if self.total > 0 {
            (self.current * 100) / self.total
        } else {
            0
        }
    }

    pub fn is_idle(&self) -> bool {
        self.total == 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Progress notification published by the batch coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub progress_type: ProgressType,
    pub progress: BatchProgress,
    /// Item the event is about, if any
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub status: Option<ImageStatus>,
    #[serde(default)]
    pub original_size: u64,
    #[serde(default)]
    pub processed_size: u64,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn new(progress_type: ProgressType, progress: BatchProgress) -> Self {
        Self {
            progress_type,
            progress,
            record_id: None,
            file_name: None,
            status: None,
            original_size: 0,
            processed_size: 0,
            error: None,
        }
    }

    pub fn for_record(progress_type: ProgressType, progress: BatchProgress, record: &ProcessedImage) -> Self {
        Self {
            record_id: Some(record.id.clone()),
            file_name: Some(record.file_name.clone()),
            status: Some(record.status),
            original_size: record.original_size,
            processed_size: record.processed_size,
            error: record.error.clone(),
            ..Self::new(progress_type, progress)
        }
    }

    /// Status line for the terminal and logs
    pub fn message(&self) -> String {
        let name = self.file_name.as_deref().unwrap_or("");
        match (self.progress_type, self.status) {
            (ProgressType::Start, _) => format!("Processing {} images", self.progress.total),
            (ProgressType::ItemStarted, _) => format!("{} started", name),
            (ProgressType::Progress, Some(ImageStatus::Error)) => format!(
                "[{}/{}] {} failed: {}",
                self.progress.current,
                self.progress.total,
                name,
                self.error.as_deref().unwrap_or("unknown error")
            ),
            (ProgressType::Progress, _) => {
                let saved = self.original_size as i64 - self.processed_size as i64;
                format!(
                    "[{}/{}] {} converted ({:.2} KB saved)",
                    self.progress.current,
                    self.progress.total,
                    name,
                    saved as f64 / 1024.0
                )
            }
            (ProgressType::Complete, _) => format!("Batch complete: {} images", self.progress.total),
        }
    }
}
