//! SIMD-accelerated downscaling for thumbnails.
//!
//! Uses fast_image_resize, which picks AVX2/NEON code paths at runtime.

use crate::error::ThumbnailError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage};

/// Largest size that fits inside a `max` x `max` box with the same aspect
/// ratio. Never upscales; each side is at least one pixel.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = max as f64 / width.max(height) as f64;
    let w = ((width as f64 * scale).round() as u32).clamp(1, max);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max);
    (w, h)
}

/// Reusable Lanczos3 resizer
pub struct ThumbnailResizer {
    resizer: Resizer,
}

impl ThumbnailResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize to exactly `width` x `height` as 8-bit RGB
    pub fn resize_rgb(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, ThumbnailError> {
        let rgb = image.to_rgb8();
        let (src_width, src_height) = rgb.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(ThumbnailError::InvalidDimensions {
                width: src_width,
                height: src_height,
            });
        }
        if width == 0 || height == 0 {
            return Err(ThumbnailError::InvalidDimensions { width, height });
        }
        if (src_width, src_height) == (width, height) {
            return Ok(rgb);
        }

        let src_image = Image::from_vec_u8(src_width, src_height, rgb.into_raw(), PixelType::U8x3)
            .map_err(|e| ThumbnailError::Resize(format!("Failed to create source image: {}", e)))?;
        let mut dst_image = Image::new(width, height, PixelType::U8x3);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| ThumbnailError::Resize(e.to_string()))?;

        RgbImage::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| ThumbnailError::Resize("Failed to create result buffer".to_string()))
    }
}

impl Default for ThumbnailResizer {
    fn default() -> Self {
        Self::new()
    }
}
