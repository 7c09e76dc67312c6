//! The service object front ends talk to.

use crate::config::ImportConfig;
use crate::core::catalog::{PhotoCatalog, PhotoId, PhotoRecord};
use crate::core::import::{CancellationToken, ImportCoordinator, ImportResult};
use crate::core::maintenance::{self, DeleteMode, DeleteReport, MaintenanceResult};
use crate::core::preview_cache::RawPreviewCache;
use crate::core::scanner::{DirectoryScanner, ImportSource, PathListSource};
use crate::core::thumbnail::ThumbnailGenerator;
use crate::error::{PhotoIndexError, Result, ScanError};
use crate::events::EventSender;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Owns import settings and the set of imports currently running.
///
/// At most one import runs per catalog path; a second request for the same
/// catalog is rejected with [`PhotoIndexError::ImportInProgress`] instead of
/// queueing. Cheap to share across threads behind an `Arc`.
#[derive(Default)]
pub struct PhotoLibrary {
    config: ImportConfig,
    active: Mutex<HashMap<PathBuf, CancellationToken>>,
}

/// Removes a catalog from the active set when the run ends, however it ends
struct ActiveImport<'a> {
    library: &'a PhotoLibrary,
    key: PathBuf,
}

impl Drop for ActiveImport<'_> {
    fn drop(&mut self) {
        self.library.registry().remove(&self.key);
    }
}

impl PhotoLibrary {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            config,
            active: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<PathBuf, CancellationToken>> {
        // A panic elsewhere must not wedge every later import
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn catalog_key(catalog_path: &Path) -> PathBuf {
        std::path::absolute(catalog_path).unwrap_or_else(|_| catalog_path.to_path_buf())
    }

    /// Whether an import is running against `catalog_path`
    pub fn is_importing(&self, catalog_path: &Path) -> bool {
        self.registry().contains_key(&Self::catalog_key(catalog_path))
    }

    fn begin_import(&self, catalog_path: &Path) -> Result<(ActiveImport<'_>, CancellationToken)> {
        let key = Self::catalog_key(catalog_path);
        let mut active = self.registry();
        if active.contains_key(&key) {
            return Err(PhotoIndexError::ImportInProgress { catalog: key });
        }
        let token = CancellationToken::new();
        active.insert(key.clone(), token.clone());
        Ok((ActiveImport { library: self, key }, token))
    }

    /// Turn a user-supplied root (plain path or `file://` URI) into a path
    pub fn parse_root(root: &str) -> Result<PathBuf> {
        let trimmed = root.trim();
        if trimmed.is_empty() {
            return Err(PhotoIndexError::InvalidInput(
                "import root is empty".to_string(),
            ));
        }
        match trimmed.strip_prefix("file://") {
            Some(encoded) => urlencoding::decode(encoded)
                .map(|decoded| PathBuf::from(decoded.into_owned()))
                .map_err(|e| {
                    PhotoIndexError::InvalidInput(format!("Failed to decode file URI {}: {}", root, e))
                }),
            None => Ok(PathBuf::from(trimmed)),
        }
    }

    /// Reject an empty or blank location before it reaches SQLite (which
    /// would open a temporary database) or the filesystem.
    pub fn require_location(path: &Path, what: &str) -> Result<()> {
        let blank = path
            .to_str()
            .map(|s| s.trim().is_empty())
            .unwrap_or_else(|| path.as_os_str().is_empty());
        if blank {
            return Err(PhotoIndexError::InvalidInput(format!("{} is empty", what)));
        }
        Ok(())
    }

    fn require_store(catalog_path: &Path, thumbnail_dir: &Path) -> Result<()> {
        Self::require_location(catalog_path, "catalog path")?;
        Self::require_location(thumbnail_dir, "thumbnail directory")?;
        Ok(())
    }

    /// Import everything under `root` (a directory, a single file, or a
    /// `file://` URI for either).
    pub fn import(
        &self,
        root: &str,
        catalog_path: &Path,
        thumbnail_dir: &Path,
        events: &EventSender,
    ) -> Result<ImportResult> {
        let root = Self::parse_root(root)?;
        Self::require_store(catalog_path, thumbnail_dir)?;
        let scanner =
            DirectoryScanner::new(&root, self.config.scan.clone()).map_err(|e| match e {
                ScanError::RootNotFound { path } => PhotoIndexError::InvalidInput(format!(
                    "import root does not exist: {}",
                    path.display()
                )),
                other => other.into(),
            })?;
        self.run_import(&scanner, catalog_path, thumbnail_dir, events)
    }

    /// Import an explicit list of files, e.g. from a picker
    pub fn import_paths(
        &self,
        paths: Vec<PathBuf>,
        catalog_path: &Path,
        thumbnail_dir: &Path,
        events: &EventSender,
    ) -> Result<ImportResult> {
        self.run_import(&PathListSource::new(paths), catalog_path, thumbnail_dir, events)
    }

    /// Run an import from any source
    pub fn run_import(
        &self,
        source: &dyn ImportSource,
        catalog_path: &Path,
        thumbnail_dir: &Path,
        events: &EventSender,
    ) -> Result<ImportResult> {
        self.config.validate()?;
        Self::require_store(catalog_path, thumbnail_dir)?;
        let (_active, token) = self.begin_import(catalog_path)?;

        let catalog = PhotoCatalog::open(catalog_path)?;
        let thumbnails = ThumbnailGenerator::new(thumbnail_dir)
            .with_size(self.config.thumbnail_size)
            .with_quality(self.config.thumbnail_quality);

        ImportCoordinator::new(&catalog, thumbnails)
            .with_progress_interval(self.config.progress_interval)
            .with_cancellation(token)
            .run_with_events(source, events)
    }

    /// Ask every running import to stop after its current file.
    /// Returns how many runs were signalled.
    pub fn cancel_import(&self) -> usize {
        let active = self.registry();
        for token in active.values() {
            token.cancel();
        }
        active.len()
    }

    /// Cancel the run for one catalog, if any
    pub fn cancel_import_for(&self, catalog_path: &Path) -> bool {
        match self.registry().get(&Self::catalog_key(catalog_path)) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// All photos, with thumbnail paths made absolute. A thumbnail file that
    /// no longer exists is reported as `None`.
    pub fn list_photos(
        &self,
        catalog_path: &Path,
        thumbnail_dir: &Path,
    ) -> Result<Vec<PhotoRecord>> {
        Self::require_store(catalog_path, thumbnail_dir)?;
        let catalog = PhotoCatalog::open(catalog_path)?;
        let records = catalog
            .list_all()?
            .into_iter()
            .map(|mut record| {
                record.thumb_path = record
                    .thumbnail_in(thumbnail_dir)
                    .filter(|p| p.is_file())
                    .map(|p| p.to_string_lossy().into_owned());
                record
            })
            .collect();
        Ok(records)
    }

    pub fn delete_photos(
        &self,
        ids: &[PhotoId],
        catalog_path: &Path,
        thumbnail_dir: &Path,
        mode: DeleteMode,
        include_raw_companions: bool,
    ) -> Result<DeleteReport> {
        Self::require_store(catalog_path, thumbnail_dir)?;
        let catalog = PhotoCatalog::open(catalog_path)?;
        maintenance::delete_photos(&catalog, thumbnail_dir, ids, mode, include_raw_companions)
    }

    /// Displayable preview for a RAW file.
    ///
    /// With `fallback` (catalog path, thumbnail directory), a RAW file whose
    /// preview cannot be extracted falls back to its existing thumbnail.
    pub fn get_raw_preview(
        &self,
        path: &Path,
        cache_dir: &Path,
        fallback: Option<(&Path, &Path)>,
    ) -> Result<PathBuf> {
        Self::require_location(cache_dir, "preview cache directory")?;
        let cache = RawPreviewCache::new(cache_dir);
        match fallback {
            Some((catalog_path, thumbnail_dir)) => {
                Self::require_store(catalog_path, thumbnail_dir)?;
                let catalog = PhotoCatalog::open(catalog_path)?;
                cache.get_with_fallback(path, &catalog, thumbnail_dir)
            }
            None => cache.get_or_extract(path),
        }
    }

    pub fn regenerate_thumbnails(
        &self,
        catalog_path: &Path,
        thumbnail_dir: &Path,
        events: &EventSender,
    ) -> Result<MaintenanceResult> {
        Self::require_store(catalog_path, thumbnail_dir)?;
        let catalog = PhotoCatalog::open(catalog_path)?;
        let mut generator = ThumbnailGenerator::new(thumbnail_dir)
            .with_size(self.config.thumbnail_size)
            .with_quality(self.config.thumbnail_quality);
        maintenance::regenerate_thumbnails(&catalog, &mut generator, events)
    }

    /// Wipe the thumbnail directory; clears catalog thumbnail paths when a
    /// catalog is given
    pub fn clear_thumbnail_cache(
        &self,
        thumbnail_dir: &Path,
        catalog_path: Option<&Path>,
    ) -> Result<usize> {
        Self::require_location(thumbnail_dir, "thumbnail directory")?;
        if let Some(catalog_path) = catalog_path {
            Self::require_location(catalog_path, "catalog path")?;
        }
        let catalog = catalog_path.map(PhotoCatalog::open).transpose()?;
        maintenance::clear_thumbnail_cache(thumbnail_dir, catalog.as_ref())
    }

    /// Remove catalog, thumbnails and preview cache. Refused while an
    /// import is running against the catalog; the registry stays locked
    /// until the files are gone, so no import can start in between.
    pub fn clear_app_data(
        &self,
        thumbnail_dir: &Path,
        catalog_path: &Path,
        preview_cache_dir: Option<&Path>,
    ) -> Result<()> {
        Self::require_store(catalog_path, thumbnail_dir)?;
        if let Some(dir) = preview_cache_dir {
            Self::require_location(dir, "preview cache directory")?;
        }

        let key = Self::catalog_key(catalog_path);
        let active = self.registry();
        if active.contains_key(&key) {
            return Err(PhotoIndexError::ImportInProgress { catalog: key });
        }
        let cleared = maintenance::clear_app_data(thumbnail_dir, catalog_path, preview_cache_dir);
        drop(active);
        cleared
    }
}
