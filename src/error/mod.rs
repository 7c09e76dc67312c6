//! # Error Module
//!
//! Error types for the import-and-index pipeline.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Separate per-file from infrastructure failures** - a broken photo is
//!   counted and skipped, a broken catalog stops the run
//! - **Recovery hints** - suggest how to fix when possible

use std::path::PathBuf;
use thiserror::Error;

/// Top-level library error
#[derive(Error, Debug)]
pub enum PhotoIndexError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Thumbnail error: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An import is already running for catalog {catalog}")]
    ImportInProgress { catalog: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PhotoIndexError {
    /// Whether this error must abort the whole operation rather than being
    /// folded into a per-file failure counter.
    pub fn is_fatal(&self) -> bool {
        match self {
            PhotoIndexError::Catalog(e) => e.is_fatal(),
            PhotoIndexError::Thumbnail(ThumbnailError::DirectoryNotWritable { .. }) => true,
            PhotoIndexError::ImportInProgress { .. } | PhotoIndexError::Config(_) => true,
            _ => false,
        }
    }
}

/// Errors that occur while enumerating candidate files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Import root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Path is not valid UTF-8 and cannot be cataloged: {}", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Path the error refers to, if any
    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanError::RootNotFound { path }
            | ScanError::NonUtf8Path { path }
            | ScanError::PermissionDenied { path }
            | ScanError::ReadEntry { path, .. } => path,
        }
    }
}

/// Errors that occur while reading or decoding image data
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is empty: {path}")]
    EmptyFile { path: PathBuf },

    #[error("Unsupported image format for {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("Failed to decode image {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("No usable embedded preview in RAW file {path}")]
    NoEmbeddedPreview { path: PathBuf },
}

/// Errors from EXIF parsing.
///
/// These never fail an import: the extractor degrades to absent fields.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("No EXIF data: {0}")]
    NoExif(String),

    #[error("Malformed tag {tag}: {reason}")]
    MalformedTag { tag: String, reason: String },
}

/// Errors that occur while producing thumbnails
#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Thumbnail directory {path} is not writable: {source}. Check permissions or choose another directory.")]
    DirectoryNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid thumbnail dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Resize failed: {0}")]
    Resize(String),

    #[error("JPEG encode failed: {0}")]
    Encode(String),

    #[error("Failed to write thumbnail {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur in the photo catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to open catalog database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Catalog query failed: {0}")]
    QueryFailed(String),

    #[error("Catalog constraint violated: {0}")]
    Constraint(String),

    #[error("Catalog corruption detected at {path}. Delete this file and re-import.")]
    Corrupted { path: PathBuf },

    #[error("Photo {id} not found in catalog")]
    NotFound { id: i64 },
}

impl CatalogError {
    /// Constraint violations and missing rows concern a single photo;
    /// everything else means the storage engine itself is unusable.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CatalogError::Constraint(_) | CatalogError::NotFound { .. }
        )
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                CatalogError::Constraint(err.to_string())
            }
            other => CatalogError::QueryFailed(other.to_string()),
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PhotoIndexError>;
