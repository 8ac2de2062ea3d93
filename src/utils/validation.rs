use crate::core::{ImageProcessingOptions, ResizeOptions, ResizeType};
use crate::utils::error::ValidationError;

pub const MIN_QUALITY: u32 = 1;
pub const MAX_QUALITY: u32 = 100;
/// Largest width/height/length accepted for a resize
pub const MAX_DIMENSION: u32 = 40_000;

/// Validates conversion options before any batch work starts.
pub fn validate_options(options: &ImageProcessingOptions) -> Result<(), ValidationError> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&options.quality) {
        return Err(ValidationError::field(
            "quality",
            format!(
                "Invalid quality value: {}. Must be between {} and {}",
                options.quality, MIN_QUALITY, MAX_QUALITY
            ),
        ));
    }

    if let Some(resize) = &options.resize {
        validate_resize(resize)?;
    }

    Ok(())
}

/// Validates resize settings.
///
/// A mode without the dimension it reads is rejected rather than treated as
/// "no resize".
pub fn validate_resize(resize: &ResizeOptions) -> Result<(), ValidationError> {
    for (field, value) in [
        ("resize.width", resize.width),
        ("resize.height", resize.height),
        ("resize.length", resize.length),
    ] {
        if let Some(value) = value {
            if value == 0 {
                return Err(ValidationError::field(field, "cannot be 0"));
            }
            if value > MAX_DIMENSION {
                return Err(ValidationError::field(
                    field,
                    format!("maximum allowed is {}", MAX_DIMENSION),
                ));
            }
        }
    }

    if let Some(percentage) = resize.percentage {
        if !(1..=100).contains(&percentage) {
            return Err(ValidationError::field(
                "resize.percentage",
                format!("Invalid percentage: {}. Must be between 1 and 100", percentage),
            ));
        }
    }

    let required = match resize.resize_type {
        ResizeType::FixedWidth | ResizeType::MaxWidth => "resize.width",
        ResizeType::FixedHeight | ResizeType::MaxHeight => "resize.height",
        ResizeType::LongEdge | ResizeType::ShortEdge => "resize.length",
        ResizeType::Percentage => "resize.percentage",
    };

    if resize.target().is_none() {
        return Err(ValidationError::field(
            required,
            format!("required for resize type {}", resize.resize_type.as_str()),
        ));
    }

    Ok(())
}
