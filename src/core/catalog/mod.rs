//! # Catalog Module
//!
//! Durable record of every imported photo, backed by SQLite.
//!
//! One row per distinct content: both the path and the content hash are
//! unique. Row ids come from `AUTOINCREMENT` and are never reused, even
//! after deletes.

mod sqlite;

pub use sqlite::PhotoCatalog;

use crate::core::fingerprint::ContentHash;
use crate::core::metadata::PhotoMetadata;
use crate::core::scanner::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Catalog-assigned row id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub i64);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A photo about to be inserted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPhoto {
    pub path: String,
    pub content_hash: ContentHash,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    /// Relative to the thumbnail directory
    pub thumb_path: Option<String>,
    /// Why no thumbnail was produced, when one is missing
    pub thumb_error: Option<String>,
    pub metadata: PhotoMetadata,
}

/// A cataloged photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub path: String,
    pub content_hash: ContentHash,
    /// Width after orientation correction
    pub width: u32,
    /// Height after orientation correction
    pub height: u32,
    pub file_size: u64,
    /// Filesystem creation time, unix seconds
    pub created_at: Option<i64>,
    /// Filesystem modification time, unix seconds
    pub modified_at: Option<i64>,
    pub thumb_path: Option<String>,
    pub thumb_error: Option<String>,
    /// When the row was written, unix seconds
    pub imported_at: i64,
    pub metadata: PhotoMetadata,
}

impl PhotoRecord {
    pub fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn format(&self) -> ImageFormat {
        ImageFormat::from_path(self.path())
    }

    pub fn is_raw(&self) -> bool {
        self.format().is_raw()
    }

    /// Absolute thumbnail location under `thumb_dir`
    pub fn thumbnail_in(&self, thumb_dir: &Path) -> Option<PathBuf> {
        self.thumb_path.as_ref().map(|rel| thumb_dir.join(rel))
    }

    /// Whether `other` is a RAW file sitting next to this one with the same
    /// file stem, e.g. `IMG_0001.JPG` and `IMG_0001.CR2`.
    pub fn is_raw_companion(&self, other: &PhotoRecord) -> bool {
        let (a, b) = (self.path(), other.path());
        a != b
            && other.is_raw()
            && a.parent() == b.parent()
            && a.file_stem() == b.file_stem()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fingerprint::fingerprint_bytes;

    fn record(id: i64, path: &str) -> PhotoRecord {
        PhotoRecord {
            id: PhotoId(id),
            path: path.to_string(),
            content_hash: fingerprint_bytes(path.as_bytes()),
            width: 10,
            height: 10,
            file_size: 1,
            created_at: None,
            modified_at: None,
            thumb_path: None,
            thumb_error: None,
            imported_at: 0,
            metadata: PhotoMetadata::default(),
        }
    }

    #[test]
    fn raw_companion_requires_same_dir_and_stem() {
        let jpeg = record(1, "/photos/IMG_0001.JPG");
        assert!(jpeg.is_raw_companion(&record(2, "/photos/IMG_0001.CR2")));
        assert!(!jpeg.is_raw_companion(&record(3, "/photos/IMG_0002.CR2")));
        assert!(!jpeg.is_raw_companion(&record(4, "/other/IMG_0001.CR2")));
        assert!(!jpeg.is_raw_companion(&record(5, "/photos/IMG_0001.png")));
        assert!(!jpeg.is_raw_companion(&jpeg));
    }

    #[test]
    fn thumbnail_resolves_against_directory() {
        let mut rec = record(1, "/photos/a.jpg");
        assert_eq!(rec.thumbnail_in(Path::new("/thumbs")), None);
        rec.thumb_path = Some("ab/abcd.jpg".to_string());
        assert_eq!(
            rec.thumbnail_in(Path::new("/thumbs")),
            Some(PathBuf::from("/thumbs/ab/abcd.jpg"))
        );
    }

    #[test]
    fn photo_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&PhotoId(42)).unwrap(), "42");
    }
}
