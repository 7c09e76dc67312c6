//! Fast image decoding with format-specific paths.
//!
//! Uses zune-jpeg for JPEG data (1.5-2x faster than the image crate),
//! falls back to the image crate for everything else.

use crate::error::DecodeError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode JPEG bytes with zune-jpeg, retrying with the image crate when
/// zune rejects the stream or produces an unusual colorspace.
pub fn decode_jpeg(bytes: &[u8], path: &Path) -> Result<DynamicImage, DecodeError> {
    decode_jpeg_zune(bytes, path).or_else(|e| {
        tracing::debug!("zune-jpeg fallback for {}: {}", path.display(), e);
        decode_generic(bytes, path)
    })
}

fn decode_jpeg_zune(bytes: &[u8], path: &Path) -> Result<DynamicImage, DecodeError> {
    let corrupt = |reason: String| DecodeError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);

    let pixels = decoder
        .decode()
        .map_err(|e| corrupt(format!("zune-jpeg decode failed: {:?}", e)))?;

    let info = decoder
        .info()
        .ok_or_else(|| corrupt("Failed to get image info".to_string()))?;
    let width = info.width as u32;
    let height = info.height as u32;

    let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

    let image = match out_colorspace {
        ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8),
        ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgba8),
        ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageLuma8),
        other => return Err(corrupt(format!("unsupported colorspace {:?}", other))),
    };

    image.ok_or_else(|| corrupt("pixel buffer does not match dimensions".to_string()))
}

/// Decode with the image crate, guessing the format from the bytes
pub fn decode_generic(bytes: &[u8], path: &Path) -> Result<DynamicImage, DecodeError> {
    let format = image::guess_format(bytes).map_err(|e| DecodeError::Unsupported {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    image::load_from_memory_with_format(bytes, format).map_err(|e| DecodeError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// HEIC/HEIF via the macOS `sips` converter
#[cfg(target_os = "macos")]
pub fn decode_heic(path: &Path) -> Result<DynamicImage, DecodeError> {
    use std::process::Command;

    let corrupt = |reason: String| DecodeError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let scratch = tempfile::Builder::new()
        .prefix("photo_indexer_heic_")
        .suffix(".jpg")
        .tempfile()
        .map_err(|e| DecodeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

    let output = Command::new("sips")
        .arg("-s")
        .arg("format")
        .arg("jpeg")
        .arg(path)
        .arg("--out")
        .arg(scratch.path())
        .output()
        .map_err(|e| corrupt(format!("Failed to run sips: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(corrupt(format!("sips conversion failed: {}", stderr)));
    }

    // The scratch file is removed when `scratch` drops
    image::open(scratch.path()).map_err(|e| corrupt(format!("Failed to read converted HEIC: {}", e)))
}

#[cfg(not(target_os = "macos"))]
pub fn decode_heic(path: &Path) -> Result<DynamicImage, DecodeError> {
    Err(DecodeError::Unsupported {
        path: path.to_path_buf(),
        reason: "HEIC decoding is only supported on macOS".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 10) as u8, (y * 10) as u8, 128])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_jpeg_with_fast_path() {
        let bytes = encoded(20, 12, ImageFormat::Jpeg);
        let img = decode_jpeg(&bytes, Path::new("a.jpg")).unwrap();
        assert_eq!((img.width(), img.height()), (20, 12));
    }

    #[test]
    fn decodes_png_generically() {
        let bytes = encoded(7, 9, ImageFormat::Png);
        let img = decode_generic(&bytes, Path::new("a.png")).unwrap();
        assert_eq!((img.width(), img.height()), (7, 9));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = decode_jpeg(b"not a jpeg at all", Path::new("bad.jpg")).unwrap_err();
        assert!(err.to_string().contains("bad.jpg"));
    }

    #[test]
    fn truncated_png_is_corrupt() {
        let bytes = encoded(16, 16, ImageFormat::Png);
        let err = decode_generic(&bytes[..40], Path::new("cut.png")).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { .. }));
    }
}
