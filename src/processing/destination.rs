//! Output path resolution.

use std::path::{Path, PathBuf};
use crate::core::DestinationType;
use crate::utils::{ConverterError, ConverterResult, ImageFormat, extension_for};

/// Where one converted file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Beside the source; only the renamed file name is known here
    SameAsSource { file_name: String },
    Path(PathBuf),
}

impl Destination {
    /// Full path, using `source_dir` for [`Destination::SameAsSource`]
    pub fn into_path(self, source_dir: Option<&Path>) -> Option<PathBuf> {
        match self {
            Self::Path(path) => Some(path),
            Self::SameAsSource { file_name } => source_dir.map(|dir| dir.join(file_name)),
        }
    }
}

/// Replaces the extension of `file_name` with the one for `format`.
///
/// Everything before the last `.` is kept, so applying it twice is the same
/// as applying it once.
pub fn update_file_extension(file_name: &str, format: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(index) => &file_name[..index],
        None => file_name,
    };
    format!("{}{}", stem, extension_for(format))
}

/// Computes where a converted `file_name` should be written.
pub fn resolve_destination(
    destination_type: DestinationType,
    file_name: &str,
    format: ImageFormat,
    custom_path: &str,
    downloads_dir: Option<&Path>,
) -> ConverterResult<Destination> {
    let renamed = update_file_extension(file_name, format.as_str());

    match destination_type {
        DestinationType::Same => Ok(Destination::SameAsSource { file_name: renamed }),
        DestinationType::Downloads => {
            let dir = downloads_dir.ok_or_else(|| {
                ConverterError::destination("Downloads folder is not available on this system")
            })?;
            Ok(Destination::Path(dir.join(renamed)))
        }
        DestinationType::Custom => {
            let dir = custom_path.trim();
            if dir.is_empty() {
                return Err(ConverterError::destination(
                    "Custom destination selected but no folder was chosen",
                ));
            }
            Ok(Destination::Path(Path::new(dir).join(renamed)))
        }
    }
}
