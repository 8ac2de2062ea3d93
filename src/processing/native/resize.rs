//! Resize logic mapping resize modes to output dimensions.
//!
//! Dimension math is pure; [`apply_resize`] hands the result to the `image`
//! crate's Lanczos3 resampler.

use image::DynamicImage;
use image::imageops::FilterType;
use crate::core::{ResizeOptions, ResizeType};
use crate::utils::{ConverterError, ConverterResult};

/// Output size for `source` under `resize`. Never enlarges.
///
/// Returns `None` when the mode's dimension is missing.
pub fn target_dimensions(source: (u32, u32), resize: &ResizeOptions) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    let target = resize.target()?;

    let scale = match resize.resize_type {
        ResizeType::FixedWidth | ResizeType::MaxWidth => target as f64 / src_w as f64,
        ResizeType::FixedHeight | ResizeType::MaxHeight => target as f64 / src_h as f64,
        ResizeType::LongEdge => target as f64 / src_w.max(src_h) as f64,
        ResizeType::ShortEdge => target as f64 / src_w.min(src_h) as f64,
        ResizeType::Percentage => target as f64 / 100.0,
    };

    if scale >= 1.0 || src_w == 0 || src_h == 0 {
        return Some(source);
    }

    // the constrained side lands exactly on the target
    let (w, h) = match resize.resize_type {
        ResizeType::FixedWidth | ResizeType::MaxWidth => (target, scaled(src_h, scale)),
        ResizeType::FixedHeight | ResizeType::MaxHeight => (scaled(src_w, scale), target),
        ResizeType::LongEdge if src_w >= src_h => (target, scaled(src_h, scale)),
        ResizeType::LongEdge => (scaled(src_w, scale), target),
        ResizeType::ShortEdge if src_w <= src_h => (target, scaled(src_h, scale)),
        ResizeType::ShortEdge => (scaled(src_w, scale), target),
        ResizeType::Percentage => (scaled(src_w, scale), scaled(src_h, scale)),
    };
    Some((w.max(1), h.max(1)))
}

fn scaled(side: u32, scale: f64) -> u32 {
    (side as f64 * scale).round() as u32
}

/// Applies `resize` to `image`; `None` returns it unchanged.
pub fn apply_resize(image: DynamicImage, resize: Option<&ResizeOptions>) -> ConverterResult<DynamicImage> {
    let Some(resize) = resize else {
        return Ok(image);
    };

    let source = (image.width(), image.height());
    let (w, h) = target_dimensions(source, resize).ok_or_else(|| {
        ConverterError::processing(format!(
            "Resize mode {} has no target size", resize.resize_type.as_str()
        ))
    })?;

    if (w, h) == source {
        return Ok(image);
    }
    Ok(image.resize_exact(w, h, FilterType::Lanczos3))
}
