//! Maps conversion options to `image` crate encoders.
//!
//! All encoders write into an in-memory buffer; the caller decides where the
//! bytes end up.

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::DynamicImage;
use color_quant::NeuQuant;
use tracing::debug;
use crate::core::ImageProcessingOptions;
use crate::utils::{ConverterError, ConverterResult, ImageFormat};

type Result<T> = ConverterResult<T>;

/// rav1e speed, 1 (slowest) to 10
const AVIF_SPEED: u8 = 6;
const PALETTE_COLORS: usize = 256;

/// Encodes `image` as `format` with the quality settings in `options`.
pub fn encode_image(image: &DynamicImage, format: ImageFormat, options: &ImageProcessingOptions) -> Result<Vec<u8>> {
    let quality = options.quality.clamp(1, 100) as u8;

    match format {
        ImageFormat::Jpeg => encode_jpeg(image, quality),
        ImageFormat::Png if options.wants_quantize() => encode_quantized_png(image, quality),
        ImageFormat::Png => encode_png(image),
        ImageFormat::Webp => encode_webp(image),
        ImageFormat::Avif => encode_avif(image, quality),
    }
}

/// Baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .map_err(|e| ConverterError::processing(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

/// Lossless PNG with the strongest deflate setting.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilterType::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|e| ConverterError::processing(format!("PNG encode failed: {}", e)))?;
    Ok(buf)
}

/// Indexed PNG with a 256-color palette.
///
/// `quality` picks the NeuQuant sample factor: 100 samples every pixel,
/// lower values sample fewer and run faster. Alpha goes into a `tRNS` chunk.
pub fn encode_quantized_png(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgba = image.to_rgba8();
    let sample_factor = 1 + (100 - quality.min(100) as i32) * 29 / 100;

    let quantizer = NeuQuant::new(sample_factor, PALETTE_COLORS, rgba.as_raw());
    let color_map = quantizer.color_map_rgba();
    let palette: Vec<u8> = color_map.chunks_exact(4).flat_map(|c| [c[0], c[1], c[2]]).collect();
    let alpha: Vec<u8> = color_map.chunks_exact(4).map(|c| c[3]).collect();
    let indices: Vec<u8> = rgba.pixels().map(|p| quantizer.index_of(&p.0) as u8).collect();
    debug!("Quantized to {} colors (sample factor {})", PALETTE_COLORS, sample_factor);

    let png_error = |e: png::EncodingError| ConverterError::processing(format!("PNG encode failed: {}", e));
    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, rgba.width(), rgba.height());
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(palette);
    if alpha.iter().any(|a| *a != u8::MAX) {
        encoder.set_trns(alpha);
    }
    encoder.set_compression(png::Compression::Best);
    encoder.set_adaptive_filter(png::AdaptiveFilterType::Adaptive);

    let mut writer = encoder.write_header().map_err(png_error)?;
    writer.write_image_data(&indices).map_err(png_error)?;
    writer.finish().map_err(png_error)?;
    Ok(buf)
}

/// Lossless WebP; the pure-Rust encoder has no lossy mode.
pub fn encode_webp(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_8bit(image)
        .write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        .map_err(|e| ConverterError::processing(format!("WebP encode failed: {}", e)))?;
    Ok(buf)
}

/// AVIF through rav1e.
pub fn encode_avif(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_8bit(image)
        .write_with_encoder(AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, quality))
        .map_err(|e| ConverterError::processing(format!("AVIF encode failed: {}", e)))?;
    Ok(buf)
}

/// RGB8 or RGBA8 depending on alpha, the layouts every encoder here accepts
fn to_8bit(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}
