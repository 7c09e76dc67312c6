//! # Scanner Module
//!
//! Discovers candidate photo files under an import root.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg), PNG, WebP, GIF, BMP, TIFF
//! - HEIC/HEIF (decoded where the platform allows it)
//! - RAW containers (.cr2, .cr3, .nef, .nrw, .arw, .srf, .sr2, .dng, .raf,
//!   .orf, .rw2, .pef, .raw) - only their embedded preview is used
//!
//! ## Example
//! ```rust,ignore
//! use photo_indexer::core::scanner::{DirectoryScanner, ImportSource, ScanConfig};
//!
//! let scanner = DirectoryScanner::new("/Users/me/Photos", ScanConfig::default())?;
//! for entry in scanner.entries() {
//!     println!("{:?}", entry);
//! }
//! ```

mod filter;
mod source;
mod walker;

pub use filter::ImageFilter;
pub use source::{ImportSource, PathListSource};
pub use walker::{DirectoryScanner, ScanConfig, ScanIter};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// RAW container extensions recognised by default
pub const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "nef", "nrw", "arw", "srf", "sr2", "dng", "raf", "orf", "rw2", "pef", "raw",
];

/// Raster extensions recognised by default
pub const RASTER_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff", "heic", "heif",
];

/// A candidate file yielded by an import source.
///
/// The path has already been checked to be valid UTF-8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoFile {
    /// Path to the file
    pub path: PathBuf,
    /// Detected format, from the extension
    pub format: ImageFormat,
}

impl PhotoFile {
    /// Build a candidate, rejecting paths that are not valid UTF-8.
    pub fn new(path: PathBuf) -> Result<Self, crate::error::ScanError> {
        if path.to_str().is_none() {
            return Err(crate::error::ScanError::NonUtf8Path { path });
        }
        let format = ImageFormat::from_path(&path);
        Ok(Self { path, format })
    }

    /// UTF-8 view of the path
    pub fn path_str(&self) -> &str {
        // Checked in `new`
        self.path.to_str().unwrap_or_default()
    }
}

/// Image formats known to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Heic,
    Gif,
    Bmp,
    Tiff,
    /// Camera RAW container
    Raw,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "webp" => ImageFormat::WebP,
            "heic" | "heif" => ImageFormat::Heic,
            "gif" => ImageFormat::Gif,
            "bmp" => ImageFormat::Bmp,
            "tiff" | "tif" => ImageFormat::Tiff,
            _ if RAW_EXTENSIONS.contains(&ext.as_str()) => ImageFormat::Raw,
            _ => ImageFormat::Unknown,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(ImageFormat::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }

    /// Check if this format is supported
    pub fn is_supported(&self) -> bool {
        !matches!(self, ImageFormat::Unknown)
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, ImageFormat::Raw)
    }
}
