//! # Decoder Module
//!
//! Turns the bytes of an original into upright pixels plus metadata.
//!
//! - JPEG: zune-jpeg fast path, image crate fallback
//! - PNG, WebP, GIF, BMP, TIFF: image crate
//! - HEIC/HEIF: macOS `sips` where available
//! - RAW: never decoded; the largest embedded JPEG preview stands in
//!
//! Decoded pixels live only for the duration of one file's processing.

pub mod fast_decode;
pub mod file_bytes;
pub mod orientation;
pub mod raw_preview;

pub use file_bytes::{read_file_bytes, FileBytes};
pub use orientation::Orientation;

use crate::core::metadata::{self, PhotoMetadata};
use crate::core::scanner::ImageFormat;
use crate::error::DecodeError;
use image::DynamicImage;
use std::path::Path;

/// An original after decode, metadata extraction and orientation
#[derive(Debug)]
pub struct DecodedPhoto {
    /// Upright pixels
    pub image: DynamicImage,
    pub metadata: PhotoMetadata,
    pub orientation: Orientation,
}

impl DecodedPhoto {
    /// Dimensions after orientation correction
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Decode stored pixels, without orientation correction
pub fn decode_pixels(
    bytes: &[u8],
    path: &Path,
    format: ImageFormat,
) -> Result<DynamicImage, DecodeError> {
    match format {
        ImageFormat::Jpeg => fast_decode::decode_jpeg(bytes, path),
        ImageFormat::Raw => {
            let preview = raw_preview::extract_preview(bytes, path)?;
            fast_decode::decode_jpeg(preview, path)
        }
        ImageFormat::Heic => fast_decode::decode_heic(path),
        _ => fast_decode::decode_generic(bytes, path),
    }
}

/// Full decode: pixels, EXIF, then orientation.
///
/// For RAW files the container's own EXIF wins; the preview's EXIF is used
/// only when the container yields nothing.
pub fn decode_photo(
    bytes: &[u8],
    path: &Path,
    format: ImageFormat,
) -> Result<DecodedPhoto, DecodeError> {
    let pixels = decode_pixels(bytes, path, format)?;

    let mut metadata = metadata::extract_metadata(bytes);
    if format.is_raw() && !metadata.has_data() {
        if let Ok(preview) = raw_preview::extract_preview(bytes, path) {
            metadata = metadata::extract_metadata(preview);
        }
    }

    let orientation = Orientation::from_exif(metadata.orientation);
    let image = orientation.apply(pixels);

    Ok(DecodedPhoto {
        image,
        metadata,
        orientation,
    })
}

/// Read and decode a file in one step
pub fn decode_file(path: &Path) -> Result<DecodedPhoto, DecodeError> {
    let bytes = read_file_bytes(path)?;
    decode_photo(&bytes, path, ImageFormat::from_path(path))
}
