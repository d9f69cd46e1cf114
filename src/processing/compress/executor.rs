//! Local compressor: decode, downscale, re-encode.
//!
//! Codec work runs inside `tokio::task::spawn_blocking` so that compressing one
//! large image never stalls the other entries of the batch.

use async_trait::async_trait;
use bytes::Bytes;
use image::GenericImageView;
use tracing::debug;

use crate::core::{CompressConfig, SourceFile, TransformMode, TransformedArtifact};
use crate::processing::strategy::{TransformJob, TransformStrategy};
use crate::utils::{TransformError, TransformResult, is_image_media_type, output_file_name};

use super::encode::{OUTPUT_EXTENSION, OUTPUT_MEDIA_TYPE, encode_jpeg};
use super::resize::apply_scale;

/// Deterministic given identical input bytes, scale and quality.
#[derive(Debug, Clone, Copy)]
pub struct CompressStrategy {
    scale: f32,
    quality: f32,
}

impl CompressStrategy {
    pub fn new(scale: f32, quality: f32) -> Self {
        Self { scale, quality }
    }

    pub fn from_config(config: &CompressConfig) -> Self {
        Self::new(config.scale, config.quality)
    }
}

impl Default for CompressStrategy {
    fn default() -> Self {
        Self::from_config(&CompressConfig::default())
    }
}

#[async_trait]
impl TransformStrategy for CompressStrategy {
    fn mode(&self) -> TransformMode {
        TransformMode::Compress
    }

    #[tracing::instrument(skip(self, job), fields(entry = %job.id))]
    async fn execute(&self, job: &TransformJob) -> TransformResult<TransformedArtifact> {
        let source = job.source.clone();
        let (scale, quality) = (self.scale, self.quality);

        tokio::task::spawn_blocking(move || compress_single(&source, scale, quality))
            .await
            .map_err(|e| TransformError::Internal(format!("Compression task panicked: {e}")))?
    }
}

// ── Blocking image processing (runs on tokio's blocking thread pool) ──────────────────

fn compress_single(source: &SourceFile, scale: f32, quality: f32) -> TransformResult<TransformedArtifact> {
    let format = match image::guess_format(&source.bytes) {
        Ok(format) => format,
        Err(_) if is_image_media_type(&source.media_type) => {
            return Err(TransformError::decode(format!(
                "'{}' is declared as {} but its data is not a recognised image",
                source.name, source.media_type
            )));
        }
        Err(_) => {
            return Err(TransformError::unsupported(format!(
                "'{}' ({}) is not an image",
                source.name, source.media_type
            )));
        }
    };

    let image = image::load_from_memory_with_format(&source.bytes, format).map_err(|e| {
        // A signature match alone does not make an undeclared file an image
        if is_image_media_type(&source.media_type) {
            TransformError::decode(format!("Failed to load '{}': {e}", source.name))
        } else {
            TransformError::unsupported(format!(
                "'{}' ({}) is not an image",
                source.name, source.media_type
            ))
        }
    })?;

    let (orig_w, orig_h) = image.dimensions();
    let image = apply_scale(image, scale);
    let (width, height) = image.dimensions();
    debug!("'{}': {orig_w}×{orig_h} → {width}×{height}", source.name);

    let encoded = encode_jpeg(&image, quality)?;
    let artifact = TransformedArtifact::new(
        Bytes::from(encoded),
        output_file_name(&source.name, TransformMode::Compress.file_suffix(), OUTPUT_EXTENSION),
        OUTPUT_MEDIA_TYPE,
        source.size(),
    )
    .with_dimensions(width, height);

    debug!(
        "'{}' → {} bytes saved ({:.1}%)",
        source.name,
        artifact.saved_bytes(),
        artifact.compression_ratio()
    );

    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntryId;
    use crate::utils::FailureKind;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn job(name: &str, media_type: &str, bytes: Vec<u8>) -> TransformJob {
        TransformJob {
            id: EntryId::new(0, name, bytes.len() as u64),
            source: SourceFile::new(name, media_type, bytes),
            target_format: None,
        }
    }

    #[tokio::test]
    async fn halves_dimensions_and_emits_jpeg() {
        let strategy = CompressStrategy::default();
        let artifact = strategy
            .execute(&job("shot.png", "image/png", png_bytes(64, 48)))
            .await
            .unwrap();

        assert_eq!(artifact.dimensions, Some((32, 24)));
        assert_eq!(artifact.media_type, "image/jpeg");
        assert_eq!(artifact.file_name, "shot-compressed.jpg");
        let decoded = image::load_from_memory(&artifact.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (32, 24));
    }

    #[tokio::test]
    async fn output_size_is_stable_across_runs() {
        let strategy = CompressStrategy::new(0.5, 0.7);
        let input = job("a.png", "image/png", png_bytes(40, 40));
        let first = strategy.execute(&input).await.unwrap();
        let second = strategy.execute(&input).await.unwrap();
        assert_eq!(first.size, second.size);
        assert_eq!(first.bytes, second.bytes);
    }

    #[tokio::test]
    async fn text_file_is_unsupported() {
        let err = CompressStrategy::default()
            .execute(&job("notes.txt", "text/plain", b"just some words".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedMediaType);
    }

    #[tokio::test]
    async fn text_starting_with_image_signature_is_unsupported() {
        let err = CompressStrategy::default()
            .execute(&job("car.txt", "text/plain", b"BMW service notes: oil change due".to_vec()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::UnsupportedMediaType);
    }

    #[tokio::test]
    async fn truncated_image_is_decode_error() {
        let mut bytes = png_bytes(32, 32);
        bytes.truncate(40);
        let err = CompressStrategy::default()
            .execute(&job("broken.png", "image/png", bytes))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::DecodeError);
    }

    #[tokio::test]
    async fn mislabelled_image_is_still_compressed() {
        let artifact = CompressStrategy::default()
            .execute(&job("photo", "application/octet-stream", png_bytes(10, 10)))
            .await
            .unwrap();
        assert_eq!(artifact.file_name, "photo-compressed.jpg");
        assert_eq!(artifact.dimensions, Some((5, 5)));
    }
}
