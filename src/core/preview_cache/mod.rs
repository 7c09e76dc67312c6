//! # RAW Preview Cache
//!
//! On-demand cache of embedded RAW previews for full-screen viewing.
//!
//! Entries are named `<path key>_<version key>.jpg`: the first half is the
//! xxh3 of the source path, the second the xxh3 of the path together with
//! its modification time. Touching the source changes the version key, and
//! the next lookup drops the stale entry for that path.

use crate::core::catalog::PhotoCatalog;
use crate::core::decoder::{raw_preview, read_file_bytes};
use crate::core::scanner::ImageFormat;
use crate::error::{DecodeError, PhotoIndexError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// Cache directory for extracted previews
#[derive(Debug, Clone)]
pub struct RawPreviewCache {
    cache_dir: PathBuf,
}

impl RawPreviewCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn path_key(source: &str) -> String {
        format!("{:016x}", xxh3_64(source.as_bytes()))
    }

    /// Key for one version of a source file
    pub fn version_key(source: &str, modified: SystemTime) -> u64 {
        let nanos = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut hasher = Xxh3::new();
        hasher.update(source.as_bytes());
        hasher.update(&nanos.to_le_bytes());
        hasher.digest()
    }

    /// Where the preview for this version of `source` lives
    pub fn entry_path(&self, source: &str, modified: SystemTime) -> PathBuf {
        self.cache_dir.join(format!(
            "{}_{:016x}.jpg",
            Self::path_key(source),
            Self::version_key(source, modified)
        ))
    }

    fn validate_source(path: &Path) -> Result<&str> {
        let source = path.to_str().ok_or_else(|| {
            PhotoIndexError::InvalidInput(format!(
                "path is not valid UTF-8: {}",
                path.to_string_lossy()
            ))
        })?;
        if !ImageFormat::from_path(path).is_raw() {
            return Err(PhotoIndexError::InvalidInput(format!(
                "not a RAW file: {}",
                source
            )));
        }
        Ok(source)
    }

    /// Cached preview for `path`, extracting it on a miss
    pub fn get_or_extract(&self, path: &Path) -> Result<PathBuf> {
        let source = Self::validate_source(path)?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|source| DecodeError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let entry = self.entry_path(source, modified);
        if entry.is_file() {
            tracing::debug!("raw preview cache hit for {}", source);
            return Ok(entry);
        }

        self.prune_stale(source, &entry);

        let bytes = read_file_bytes(path)?;
        let preview = raw_preview::extract_preview(&bytes, path)?;
        self.write_entry(&entry, preview)?;

        tracing::debug!("raw preview extracted for {}", source);
        Ok(entry)
    }

    /// Like [`get_or_extract`](Self::get_or_extract), but when extraction
    /// fails and the catalog has a thumbnail for `path`, return that instead.
    pub fn get_with_fallback(
        &self,
        path: &Path,
        catalog: &PhotoCatalog,
        thumb_dir: &Path,
    ) -> Result<PathBuf> {
        match self.get_or_extract(path) {
            Ok(entry) => Ok(entry),
            Err(e @ PhotoIndexError::InvalidInput(_)) => Err(e),
            Err(e) => {
                let thumbnail = path
                    .to_str()
                    .map(|source| catalog.query_by_path(source))
                    .transpose()?
                    .flatten()
                    .and_then(|record| record.thumbnail_in(thumb_dir))
                    .filter(|thumb| thumb.is_file());

                match thumbnail {
                    Some(thumb) => {
                        tracing::warn!(
                            "raw preview unavailable for {} ({}), using thumbnail",
                            path.display(),
                            e
                        );
                        Ok(thumb)
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Remove older versions cached for the same source
    fn prune_stale(&self, source: &str, current: &Path) {
        let prefix = format!("{}_", Self::path_key(source));
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return;
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let is_stale = path != current
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(&prefix));
            if is_stale {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!("could not remove stale preview {}: {}", path.display(), e);
                }
            }
        }
    }

    fn write_entry(&self, entry: &Path, data: &[u8]) -> Result<()> {
        let io_err = |source| PhotoIndexError::Io {
            path: entry.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(&self.cache_dir).map_err(io_err)?;
        let mut temp = tempfile::Builder::new()
            .prefix(".preview-")
            .suffix(".tmp")
            .tempfile_in(&self.cache_dir)
            .map_err(io_err)?;
        temp.write_all(data).map_err(io_err)?;
        temp.persist(entry).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::io::Cursor;
    use std::time::Duration;
    use tempfile::TempDir;

    fn fake_raw(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([x as u8, y as u8, 77])
        }));
        let mut jpeg = Cursor::new(Vec::new());
        img.write_to(&mut jpeg, image::ImageFormat::Jpeg).unwrap();

        let mut raw = b"II*\0\x08\0\0\0".to_vec();
        raw.extend(std::iter::repeat(0u8).take(64));
        raw.extend_from_slice(&jpeg.into_inner());
        raw
    }

    #[test]
    fn extracts_then_hits_cache() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("shot.nef");
        std::fs::write(&raw, fake_raw(48, 32)).unwrap();
        let cache = RawPreviewCache::new(dir.path().join("cache"));

        let first = cache.get_or_extract(&raw).unwrap();
        let img = image::open(&first).unwrap();
        assert_eq!((img.width(), img.height()), (48, 32));

        let second = cache.get_or_extract(&raw).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn key_changes_with_mtime() {
        let t0 = UNIX_EPOCH + Duration::from_secs(1_000);
        let t1 = UNIX_EPOCH + Duration::from_secs(1_001);
        assert_ne!(
            RawPreviewCache::version_key("/a.cr2", t0),
            RawPreviewCache::version_key("/a.cr2", t1)
        );
        assert_ne!(
            RawPreviewCache::version_key("/a.cr2", t0),
            RawPreviewCache::version_key("/b.cr2", t0)
        );
    }

    #[test]
    fn stale_entries_are_pruned() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("shot.dng");
        std::fs::write(&raw, fake_raw(16, 16)).unwrap();
        let cache = RawPreviewCache::new(dir.path().join("cache"));

        let source = raw.to_str().unwrap();
        let old = cache.entry_path(source, UNIX_EPOCH + Duration::from_secs(5));
        std::fs::create_dir_all(cache.cache_dir()).unwrap();
        std::fs::write(&old, b"old preview").unwrap();

        let fresh = cache.get_or_extract(&raw).unwrap();
        assert_ne!(fresh, old);
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn non_raw_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("a.jpg");
        std::fs::write(&jpg, b"jpeg").unwrap();
        let cache = RawPreviewCache::new(dir.path().join("cache"));

        assert!(matches!(
            cache.get_or_extract(&jpg),
            Err(PhotoIndexError::InvalidInput(_))
        ));
    }

    #[test]
    fn container_without_preview_fails_without_catalog() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("broken.cr2");
        std::fs::write(&raw, vec![0x11u8; 2048]).unwrap();
        let cache = RawPreviewCache::new(dir.path().join("cache"));

        assert!(matches!(
            cache.get_or_extract(&raw),
            Err(PhotoIndexError::Decode(DecodeError::NoEmbeddedPreview { .. }))
        ));
    }
}
