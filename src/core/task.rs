//! Batch input definition and creation.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::utils::{ConverterError, ConverterResult, content_type_from_file_name};

/// One file handed to a batch.
///
/// Holds the raw bytes rather than a path so the converter never touches the
/// filesystem; `source_dir` is only used to save beside the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTask {
    /// Original file name, used to derive the output name
    pub file_name: String,
    /// MIME type of the input, used to filter the batch
    pub content_type: String,
    /// Raw file contents
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Directory the file was read from, if any
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
}

impl ImageTask {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
            source_dir: None,
        }
    }

    /// Builds a task from in-memory bytes, guessing the content type from the name
    pub fn from_bytes(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_from_file_name(&file_name);
        Self::new(file_name, content_type, data)
    }

    /// Reads a file from disk into a task.
    pub async fn from_path(path: impl AsRef<Path>) -> ConverterResult<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ConverterError::io(format!(
                "Input path is not a file: {}", path.display()
            )));
        }

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ConverterError::io(format!("Cannot read {}: {}", path.display(), e)))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConverterError::io(format!("Invalid file name: {}", path.display())))?
            .to_string();

        let mut task = Self::from_bytes(file_name, data);
        task.source_dir = path.parent().map(Path::to_path_buf);
        Ok(task)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
