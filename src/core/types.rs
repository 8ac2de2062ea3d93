//! Core types for image conversion options and destinations.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::utils::{ConverterError, ImageFormat};

/// Requested output format; `SameAsSource` re-encodes each input in its own format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    SameAsSource,
    Format(ImageFormat),
}

impl OutputFormat {
    pub const SAME_AS_SOURCE: &'static str = "same-as-source";

    /// Concrete format for an input of `content_type`.
    ///
    /// Unknown inputs fall back to JPEG.
    pub fn resolve(&self, content_type: &str) -> ImageFormat {
        match self {
            Self::Format(format) => *format,
            Self::SameAsSource => ImageFormat::from_content_type(content_type).unwrap_or(ImageFormat::Jpeg),
        }
    }
}

impl From<ImageFormat> for OutputFormat {
    fn from(format: ImageFormat) -> Self {
        Self::Format(format)
    }
}

impl PartialEq<ImageFormat> for OutputFormat {
    fn eq(&self, other: &ImageFormat) -> bool {
        matches!(self, Self::Format(format) if format == other)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameAsSource => f.write_str(Self::SAME_AS_SOURCE),
            Self::Format(format) => fmt::Display::fmt(format, f),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConverterError;

    /// Accepts `same-as-source` (or `same`) besides the format names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            Self::SAME_AS_SOURCE | "same" => Ok(Self::SameAsSource),
            other => other.parse().map(Self::Format),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = ConverterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.to_string()
    }
}

/// Configuration for converting one image.
///
/// Plain data: batches, presets and ledger records each hold their own copy,
/// so editing the current options never relabels anything already saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProcessingOptions {
    /// Output format
    pub format: OutputFormat,
    /// Encoder quality (1-100). PNG reuses it as the quantization hint.
    pub quality: u32,
    /// Optional resize; `None` keeps the original dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeOptions>,
    /// Palette reduction, only meaningful for PNG output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantize: Option<bool>,
    /// Keep the input bytes when the converted output would be larger
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub keep_original_if_larger: bool,
}

impl Default for ImageProcessingOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Format(ImageFormat::Jpeg),
            quality: 90,
            resize: None,
            quantize: Some(false),
            keep_original_if_larger: false,
        }
    }
}

impl ImageProcessingOptions {
    pub fn new(format: impl Into<OutputFormat>, quality: u32) -> Self {
        Self {
            format: format.into(),
            quality,
            resize: None,
            quantize: None,
            keep_original_if_larger: false,
        }
    }

    pub fn with_resize(mut self, resize: ResizeOptions) -> Self {
        self.resize = Some(resize);
        self
    }

    pub fn with_quantize(mut self, quantize: bool) -> Self {
        self.quantize = Some(quantize);
        self
    }

    pub fn with_keep_original_if_larger(mut self, keep: bool) -> Self {
        self.keep_original_if_larger = keep;
        self
    }

    /// True when PNG palette reduction may run; for `SameAsSource` it applies
    /// to PNG inputs only
    pub fn wants_quantize(&self) -> bool {
        self.quantize.unwrap_or(false)
            && matches!(self.format, OutputFormat::SameAsSource | OutputFormat::Format(ImageFormat::Png))
    }

    /// Copy of these options with the output format fixed for one input
    pub fn resolved_for(&self, content_type: &str) -> Self {
        Self {
            format: OutputFormat::Format(self.format.resolve(content_type)),
            ..self.clone()
        }
    }

    /// One-line description used in listings
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} q{}", self.format, self.quality)];
        if let Some(resize) = &self.resize {
            parts.push(resize.summary());
        }
        if self.wants_quantize() {
            parts.push("quantized".to_string());
        }
        if self.keep_original_if_larger {
            parts.push("keep original if larger".to_string());
        }
        parts.join(", ")
    }
}

/// Resize modes.
///
/// `FixedWidth`/`FixedHeight` force one side, `MaxWidth`/`MaxHeight` cap it;
/// neither enlarges. `LongEdge`/`ShortEdge` fit the longer or shorter side to
/// `length`, `Percentage` scales both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeType {
    FixedWidth,
    FixedHeight,
    MaxWidth,
    MaxHeight,
    LongEdge,
    ShortEdge,
    Percentage,
}

impl ResizeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FixedWidth => "fixed_width",
            Self::FixedHeight => "fixed_height",
            Self::MaxWidth => "max_width",
            Self::MaxHeight => "max_height",
            Self::LongEdge => "long_edge",
            Self::ShortEdge => "short_edge",
            Self::Percentage => "percentage",
        }
    }
}

impl std::str::FromStr for ResizeType {
    type Err = crate::utils::ConverterError;

    /// Accepts `max_width` as well as `max-width`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fixed_width" => Ok(Self::FixedWidth),
            "fixed_height" => Ok(Self::FixedHeight),
            "max_width" => Ok(Self::MaxWidth),
            "max_height" => Ok(Self::MaxHeight),
            "long_edge" => Ok(Self::LongEdge),
            "short_edge" => Ok(Self::ShortEdge),
            "percentage" => Ok(Self::Percentage),
            other => Err(crate::utils::ConverterError::format(format!(
                "Unknown resize type: {}", other
            ))),
        }
    }
}

/// Resize settings for image dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeOptions {
    #[serde(rename = "type")]
    pub resize_type: ResizeType,
    /// Target width for the width modes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Target height for the height modes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Target edge length for the long/short edge modes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Scale for the percentage mode (1-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
}

impl ResizeOptions {
    pub fn new(resize_type: ResizeType) -> Self {
        Self {
            resize_type,
            width: None,
            height: None,
            length: None,
            percentage: None,
        }
    }

    pub fn fixed_width(width: u32) -> Self {
        Self { width: Some(width), ..Self::new(ResizeType::FixedWidth) }
    }

    pub fn fixed_height(height: u32) -> Self {
        Self { height: Some(height), ..Self::new(ResizeType::FixedHeight) }
    }

    pub fn max_width(width: u32) -> Self {
        Self { width: Some(width), ..Self::new(ResizeType::MaxWidth) }
    }

    pub fn max_height(height: u32) -> Self {
        Self { height: Some(height), ..Self::new(ResizeType::MaxHeight) }
    }

    pub fn long_edge(length: u32) -> Self {
        Self { length: Some(length), ..Self::new(ResizeType::LongEdge) }
    }

    pub fn short_edge(length: u32) -> Self {
        Self { length: Some(length), ..Self::new(ResizeType::ShortEdge) }
    }

    pub fn percentage(percentage: u32) -> Self {
        Self { percentage: Some(percentage), ..Self::new(ResizeType::Percentage) }
    }

    /// The value this mode reads, if set
    pub fn target(&self) -> Option<u32> {
        match self.resize_type {
            ResizeType::FixedWidth | ResizeType::MaxWidth => self.width,
            ResizeType::FixedHeight | ResizeType::MaxHeight => self.height,
            ResizeType::LongEdge | ResizeType::ShortEdge => self.length,
            ResizeType::Percentage => self.percentage,
        }
    }

    pub fn summary(&self) -> String {
        match (self.resize_type, self.target()) {
            (ResizeType::Percentage, Some(p)) => format!("{}%", p),
            (kind, Some(v)) => format!("{} {}px", kind.as_str(), v),
            (kind, None) => kind.as_str().to_string(),
        }
    }
}

/// Where converted files are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    /// Beside the source file
    Same,
    /// The user's downloads folder
    #[default]
    Downloads,
    /// A user-chosen folder
    Custom,
}

impl std::str::FromStr for DestinationType {
    type Err = crate::utils::ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "same" => Ok(Self::Same),
            "downloads" => Ok(Self::Downloads),
            "custom" => Ok(Self::Custom),
            other => Err(crate::utils::ConverterError::destination(format!(
                "Unknown destination type: {}", other
            ))),
        }
    }
}

/// Destination policy active for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSettings {
    pub destination_type: DestinationType,
    #[serde(default)]
    pub custom_destination_path: String,
}

impl DestinationSettings {
    pub fn same() -> Self {
        Self { destination_type: DestinationType::Same, custom_destination_path: String::new() }
    }

    pub fn downloads() -> Self {
        Self { destination_type: DestinationType::Downloads, custom_destination_path: String::new() }
    }

    pub fn custom(path: impl Into<String>) -> Self {
        Self { destination_type: DestinationType::Custom, custom_destination_path: path.into() }
    }

    /// The custom path, when one is set
    pub fn custom_path(&self) -> Option<&str> {
        let path = self.custom_destination_path.trim();
        (!path.is_empty()).then_some(path)
    }
}
