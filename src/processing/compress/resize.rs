//! Uniform downscaling by a fixed factor.

use image::DynamicImage;
use image::imageops::FilterType;

/// Dimensions after scaling both sides by `scale`, never below 1×1.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale = f64::from(scale);
    let side = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (side(width), side(height))
}

/// Scales `image` by `scale`, returning it untouched when the size would not change.
pub fn apply_scale(image: DynamicImage, scale: f32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let (target_w, target_h) = scaled_dimensions(width, height, scale);
    if (target_w, target_h) == (width, height) {
        return image;
    }
    image.resize_exact(target_w, target_h, FilterType::Triangle)
}
