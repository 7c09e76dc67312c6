//! # Thumbnail Module
//!
//! Writes bounded JPEG thumbnails named after the content hash.
//!
//! Layout: `<thumb_dir>/<hash[0..2]>/<hash>.jpg`. The catalog stores the
//! part relative to `thumb_dir`, so the directory can move.
//!
//! Each thumbnail is written to a temporary file in its shard directory and
//! renamed into place, so readers see either no file or a complete one.

mod resize;

pub use resize::{fit_within, ThumbnailResizer};

use crate::core::fingerprint::ContentHash;
use crate::error::ThumbnailError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default bounding box edge in pixels
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 256;
/// Default JPEG quality
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 85;

/// Prefix of in-flight thumbnail files
pub const TEMP_PREFIX: &str = ".thumb-";

/// Relative location of a thumbnail inside the thumbnail directory
pub fn relative_thumbnail_path(hash: &ContentHash) -> PathBuf {
    PathBuf::from(hash.shard()).join(format!("{}.jpg", hash.to_hex()))
}

/// Produces thumbnails into one directory
pub struct ThumbnailGenerator {
    thumb_dir: PathBuf,
    size: u32,
    quality: u8,
    resizer: ThumbnailResizer,
}

impl ThumbnailGenerator {
    pub fn new(thumb_dir: impl Into<PathBuf>) -> Self {
        Self {
            thumb_dir: thumb_dir.into(),
            size: DEFAULT_THUMBNAIL_SIZE,
            quality: DEFAULT_THUMBNAIL_QUALITY,
            resizer: ThumbnailResizer::new(),
        }
    }

    /// Bounding box edge; zero is treated as one
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.max(1);
        self
    }

    /// JPEG quality, clamped to 1..=100
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn thumb_dir(&self) -> &Path {
        &self.thumb_dir
    }

    /// Absolute path a thumbnail for `hash` is written to
    pub fn thumbnail_path(&self, hash: &ContentHash) -> PathBuf {
        self.thumb_dir.join(relative_thumbnail_path(hash))
    }

    /// Create the directory if needed and prove we can write into it
    pub fn ensure_writable(&self) -> Result<(), ThumbnailError> {
        let not_writable = |source| ThumbnailError::DirectoryNotWritable {
            path: self.thumb_dir.clone(),
            source,
        };
        std::fs::create_dir_all(&self.thumb_dir).map_err(not_writable)?;
        tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.thumb_dir)
            .map_err(not_writable)?;
        Ok(())
    }

    /// Thumbnail an upright image; returns the path relative to the
    /// thumbnail directory.
    pub fn generate(
        &mut self,
        image: &DynamicImage,
        hash: &ContentHash,
    ) -> Result<PathBuf, ThumbnailError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ThumbnailError::InvalidDimensions { width, height });
        }

        let (thumb_w, thumb_h) = fit_within(width, height, self.size);
        let rgb = self.resizer.resize_rgb(image, thumb_w, thumb_h)?;

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality)
            .write_image(rgb.as_raw(), thumb_w, thumb_h, ExtendedColorType::Rgb8)
            .map_err(|e| ThumbnailError::Encode(e.to_string()))?;

        let relative = relative_thumbnail_path(hash);
        let target = self.thumb_dir.join(&relative);
        self.write_atomic(&target, &encoded)?;

        tracing::debug!("thumbnail {}x{} -> {}", thumb_w, thumb_h, target.display());
        Ok(relative)
    }

    fn write_atomic(&self, target: &Path, data: &[u8]) -> Result<(), ThumbnailError> {
        let write_err = |source| ThumbnailError::Write {
            path: target.to_path_buf(),
            source,
        };
        let shard = target.parent().unwrap_or(&self.thumb_dir);
        std::fs::create_dir_all(shard).map_err(write_err)?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(shard)
            .map_err(write_err)?;
        temp.write_all(data).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        // On failure the temp file is dropped, and with it removed
        temp.persist(target).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Remove the thumbnail for `hash`, if any
    pub fn remove(&self, hash: &ContentHash) -> std::io::Result<()> {
        match std::fs::remove_file(self.thumbnail_path(hash)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
