//! Lossy re-encoding of decoded rasters.

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use crate::utils::{TransformError, TransformResult};

pub const OUTPUT_MEDIA_TYPE: &str = "image/jpeg";
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Maps a (0, 1] quality factor onto the encoder's 1-100 scale.
pub fn encoder_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes `image` as baseline JPEG. Alpha is dropped since JPEG cannot carry it.
pub fn encode_jpeg(image: &DynamicImage, quality: f32) -> TransformResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, encoder_quality(quality))
        .encode_image(&rgb)
        .map_err(|e| TransformError::encode(format!("JPEG encode failed: {e}")))?;
    Ok(buffer)
}
