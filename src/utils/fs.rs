//! Filesystem boundary: well-known folders and output writes.

use std::path::{Path, PathBuf};
use tracing::debug;
use crate::utils::{ConverterError, ConverterResult};

/// Host services the converter needs from the filesystem.
///
/// The desktop shell answered these over IPC; here they are a trait so tests
/// can point downloads at a temp dir or simulate a failing disk.
pub trait FileHost: Send + Sync {
    /// The user's downloads folder, if the platform has one
    fn downloads_dir(&self) -> Option<PathBuf>;

    /// Writes `data` to `path`, creating the parent directory first
    fn write_file(&self, path: &Path, data: &[u8]) -> ConverterResult<()>;
}

/// `FileHost` backed by the local disk.
#[derive(Debug, Clone, Default)]
pub struct LocalFileHost {
    downloads_override: Option<PathBuf>,
}

impl LocalFileHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `dir` instead of the platform downloads folder
    pub fn with_downloads_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_override: Some(dir.into()),
        }
    }
}

impl FileHost for LocalFileHost {
    fn downloads_dir(&self) -> Option<PathBuf> {
        self.downloads_override.clone().or_else(dirs::download_dir)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> ConverterResult<()> {
        ensure_parent_dir(path)?;
        std::fs::write(path, data).map_err(|e| {
            ConverterError::io(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

/// Creates the parent directory of `path` if it does not exist
pub fn ensure_parent_dir(path: &Path) -> ConverterResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConverterError::io(format!(
                    "Cannot create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

/// Human-readable byte count
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if size < KB {
        format!("{} B", size)
    } else if size < MB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{:.2} MB", size as f64 / MB as f64)
    }
}
