use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::utils::ConverterError;

/// Output formats the converter can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
}

/// MIME types accepted into a batch.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/avif",
];

impl ImageFormat {
    /// Lowercase name used on the wire and in the extension table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    /// Format of an accepted input, from its MIME type
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/avif" => Some(Self::Avif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = ConverterError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.to_lowercase();
        match name.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            "avif" => Ok(Self::Avif),
            _ => Err(ConverterError::format(format!(
                "Unsupported image format: {}", name
            ))),
        }
    }
}

/// Maps a format name to the extension written on disk.
///
/// Unknown names fall back to `.` + the name verbatim.
pub fn extension_for(format: &str) -> String {
    match format.to_lowercase().as_str() {
        "jpeg" | "jpg" => ".jpg".to_string(),
        "png" => ".png".to_string(),
        "webp" => ".webp".to_string(),
        "avif" => ".avif".to_string(),
        _ => format!(".{}", format),
    }
}

/// Guess a MIME type from a file name's extension.
///
/// Returns `application/octet-stream` for anything that is not a known image.
pub fn content_type_from_file_name(file_name: &str) -> &'static str {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Whether a batch accepts inputs of this content type
pub fn is_accepted_content_type(content_type: &str) -> bool {
    let content_type = content_type.trim().to_lowercase();
    ACCEPTED_CONTENT_TYPES.contains(&content_type.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("JPG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("WebP".parse::<ImageFormat>().unwrap(), ImageFormat::Webp);
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn extension_table_is_canonical() {
        assert_eq!(extension_for("jpeg"), ".jpg");
        assert_eq!(extension_for("jpg"), ".jpg");
        assert_eq!(extension_for("png"), ".png");
        assert_eq!(extension_for("webp"), ".webp");
        assert_eq!(extension_for("avif"), ".avif");
        assert_eq!(extension_for("tiff"), ".tiff");
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ImageFormat::Webp).unwrap();
        assert_eq!(json, "\"webp\"");
        let parsed: ImageFormat = serde_json::from_str("\"avif\"").unwrap();
        assert_eq!(parsed, ImageFormat::Avif);
        assert!(serde_json::from_str::<ImageFormat>("\"bmp\"").is_err());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_from_file_name("cat.PNG"), "image/png");
        assert_eq!(content_type_from_file_name("notes.txt"), "text/plain");
        assert_eq!(content_type_from_file_name("README"), "application/octet-stream");
        assert!(is_accepted_content_type("image/jpeg"));
        assert!(is_accepted_content_type("IMAGE/PNG"));
        assert!(!is_accepted_content_type("image/gif"));
        assert!(!is_accepted_content_type("text/plain"));
    }

    #[test]
    fn every_accepted_type_has_a_format() {
        for content_type in ACCEPTED_CONTENT_TYPES {
            assert!(ImageFormat::from_content_type(content_type).is_some(), "{}", content_type);
        }
        assert_eq!(ImageFormat::from_content_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_content_type("image/gif"), None);
    }
}
