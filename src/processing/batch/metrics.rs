use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::core::{ImageStatus, ProcessedImage};

/// An input left out of the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// A completed item whose output could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFailure {
    pub record_id: String,
    pub file_name: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub error: String,
}

/// Summary of one finished batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Ledger ids in the order items started
    pub record_ids: Vec<String>,
    pub completed: usize,
    pub failed: usize,
    /// Completed items whose output is the untouched input
    pub kept_original: usize,
    pub skipped: Vec<SkippedFile>,
    pub save_failures: Vec<SaveFailure>,
    pub saved: Vec<PathBuf>,
    pub original_bytes: u64,
    pub processed_bytes: u64,
}

impl BatchReport {
    /// Folds a terminal record into the totals
    pub fn record(&mut self, record: &ProcessedImage) {
        match record.status {
            ImageStatus::Completed => {
                self.completed += 1;
                if record.kept_original {
                    self.kept_original += 1;
                }
                self.original_bytes += record.original_size;
                self.processed_bytes += record.processed_size;
            }
            ImageStatus::Error => self.failed += 1,
            ImageStatus::Processing => {}
        }
    }

    pub fn total(&self) -> usize {
        self.record_ids.len()
    }

    pub fn saved_bytes(&self) -> i64 {
        self.original_bytes as i64 - self.processed_bytes as i64
    }

    /// Savings across completed items as a percentage
    pub fn compression_ratio(&self) -> f64 {
        if self.original_bytes > 0 {
            self.saved_bytes() as f64 / self.original_bytes as f64 * 100.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        if self.failed > 0 || !self.save_failures.is_empty() {
            warn!(
                "Batch finished with {} failed and {} unsaved out of {}",
                self.failed,
                self.save_failures.len(),
                self.total()
            );
        } else {
            info!(
                "Batch finished: {} images converted ({:.1}% smaller)",
                self.completed,
                self.compression_ratio()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ImageProcessingOptions, ImageTask, ProcessedImageUpdate};

    #[test]
    fn totals_only_count_completed_bytes() {
        let task = ImageTask::from_bytes("a.png", vec![0; 1000]);
        let mut ok = ProcessedImage::start(&task, &ImageProcessingOptions::default());
        ok.apply(ProcessedImageUpdate::completed(vec![0; 400]));
        let mut bad = ProcessedImage::start(&task, &ImageProcessingOptions::default());
        bad.apply(ProcessedImageUpdate::failed("x"));

        let mut report = BatchReport::default();
        report.record_ids = vec![ok.id.clone(), bad.id.clone()];
        report.record(&ok);
        report.record(&bad);

        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.original_bytes, 1000);
        assert_eq!(report.processed_bytes, 400);
        assert_eq!(report.compression_ratio(), 60.0);
    }
}
