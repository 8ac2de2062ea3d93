//! Native converter built on the `image` crate.
//!
//! Each call decodes, resizes and encodes one image entirely in memory.
//! The batch orchestrator runs calls on tokio's blocking pool.

use std::io::Cursor;
use image::{DynamicImage, ImageReader};
use tracing::{debug, warn};

use crate::processing::converter::{ConvertRequest, ConvertResponse, ImageConverter};
use crate::utils::{ConverterError, ConverterResult};

use super::avif::decode_avif;
use super::formats::encode_image;
use super::resize::apply_resize;

/// Converter that processes images in-process with no subprocess overhead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeConverter;

impl NativeConverter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageConverter for NativeConverter {
    fn convert(&self, request: &ConvertRequest) -> ConvertResponse {
        let original_size = request.image_data.len() as u64;

        match convert_single(request) {
            Ok(data) => {
                let response = ConvertResponse::ok(original_size, data);
                debug!(
                    "'{}' → {} bytes ({} before)",
                    request.file_name, response.processed_size, original_size
                );
                response
            }
            Err(e) => {
                warn!("Image conversion failed for {}: {}", request.file_name, e);
                ConvertResponse::failed(original_size, e.to_string())
            }
        }
    }
}

/// Converts one image synchronously.
fn convert_single(request: &ConvertRequest) -> ConverterResult<Vec<u8>> {
    let image = decode(&request.image_data, &request.file_name)?;

    debug!(
        "Loaded '{}': {}×{}",
        request.file_name,
        image.width(),
        image.height()
    );

    let image = apply_resize(image, request.options.resize.as_ref())?;
    encode_image(&image, request.format, &request.options)
}

/// Decodes `data`, sniffing the format from its magic bytes.
fn decode(data: &[u8], file_name: &str) -> ConverterResult<DynamicImage> {
    if data.is_empty() {
        return Err(ConverterError::processing(format!("'{}' is empty", file_name)));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ConverterError::processing(format!("Failed to read '{}': {}", file_name, e)))?;

    if reader.format() == Some(image::ImageFormat::Avif) {
        return decode_avif(data)
            .map_err(|e| ConverterError::processing(format!("Failed to decode '{}': {}", file_name, e)));
    }

    reader
        .decode()
        .map_err(|e| ConverterError::processing(format!("Failed to decode '{}': {}", file_name, e)))
}
