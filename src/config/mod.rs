//! # Config Module
//!
//! Import settings and default on-disk locations.
//!
//! ```rust,ignore
//! let config = ImportConfig::new()
//!     .thumbnail_size(320)
//!     .include_hidden(true);
//! let config = ImportConfig::from_file(Path::new("import.json"))?;
//! ```

use crate::core::scanner::ScanConfig;
use crate::core::thumbnail::{DEFAULT_THUMBNAIL_QUALITY, DEFAULT_THUMBNAIL_SIZE};
use crate::core::import::DEFAULT_PROGRESS_INTERVAL;
use crate::error::{PhotoIndexError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "photo-indexer";

/// Settings for one import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Bounding box edge of thumbnails, in pixels
    pub thumbnail_size: u32,
    /// JPEG quality of thumbnails (1-100)
    pub thumbnail_quality: u8,
    /// Emit a progress event every N files
    pub progress_interval: usize,
    pub scan: ScanConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            scan: ScanConfig::default(),
        }
    }
}

impl ImportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PhotoIndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| PhotoIndexError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could use
    pub fn validate(&self) -> Result<()> {
        if self.thumbnail_size == 0 {
            return Err(PhotoIndexError::Config(
                "thumbnail_size must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.thumbnail_quality) {
            return Err(PhotoIndexError::Config(format!(
                "thumbnail_quality must be between 1 and 100, got {}",
                self.thumbnail_quality
            )));
        }
        if self.progress_interval == 0 {
            return Err(PhotoIndexError::Config(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn thumbnail_size(mut self, size: u32) -> Self {
        self.thumbnail_size = size;
        self
    }

    pub fn thumbnail_quality(mut self, quality: u8) -> Self {
        self.thumbnail_quality = quality;
        self
    }

    pub fn progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn scan_config(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.scan.include_hidden = include;
        self
    }
}

/// Where the library keeps its data by default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPaths {
    pub catalog: PathBuf,
    pub thumbnails: PathBuf,
    pub preview_cache: PathBuf,
}

impl AppPaths {
    /// Catalog under the platform data dir, thumbnails and RAW previews
    /// under the platform cache dir. Falls back to the working directory.
    pub fn default_paths() -> Self {
        let data = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        let cache = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::under(&data, &cache)
    }

    /// Layout rooted at explicit data and cache directories
    pub fn under(data_dir: &Path, cache_dir: &Path) -> Self {
        Self {
            catalog: data_dir.join("catalog.db"),
            thumbnails: cache_dir.join("thumbnails"),
            preview_cache: cache_dir.join("raw-previews"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_constants() {
        let config = ImportConfig::default();
        assert_eq!(config.thumbnail_size, 256);
        assert_eq!(config.thumbnail_quality, 85);
        assert_eq!(config.progress_interval, 1);
        assert!(!config.scan.include_hidden);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let config = ImportConfig::new()
            .thumbnail_size(512)
            .thumbnail_quality(90)
            .progress_interval(10)
            .include_hidden(true);
        assert_eq!(config.thumbnail_size, 512);
        assert_eq!(config.thumbnail_quality, 90);
        assert_eq!(config.progress_interval, 10);
        assert!(config.scan.include_hidden);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(&path, r#"{"thumbnail_size": 128, "scan": {"max_depth": 2}}"#).unwrap();

        let config = ImportConfig::from_file(&path).unwrap();
        assert_eq!(config.thumbnail_size, 128);
        assert_eq!(config.thumbnail_quality, 85);
        assert_eq!(config.scan.max_depth, Some(2));
    }

    #[test]
    fn file_and_builder_agree() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(&path, r#"{"thumbnail_size": 128, "scan": {"include_hidden": true}}"#).unwrap();

        let from_file = ImportConfig::from_file(&path).unwrap();
        let built = ImportConfig::new().thumbnail_size(128).include_hidden(true);
        assert_eq!(from_file, built);
        assert_ne!(from_file, ImportConfig::default());
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(&path, r#"{"thumbnail_quality": 0}"#).unwrap();
        assert!(matches!(
            ImportConfig::from_file(&path),
            Err(PhotoIndexError::Config(_))
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ImportConfig::from_file(&path),
            Err(PhotoIndexError::Config(_))
        ));
    }

    #[test]
    fn app_paths_layout() {
        let paths = AppPaths::under(Path::new("/data"), Path::new("/cache"));
        assert_eq!(paths.catalog, PathBuf::from("/data/catalog.db"));
        assert_eq!(paths.thumbnails, PathBuf::from("/cache/thumbnails"));
        assert_eq!(paths.preview_cache, PathBuf::from("/cache/raw-previews"));
    }
}
