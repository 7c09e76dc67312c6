//! Cache and data removal.

use crate::core::catalog::PhotoCatalog;
use crate::error::{PhotoIndexError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// SQLite side files that live next to a WAL-mode database
const SIDE_FILE_SUFFIXES: &[&str] = &["-wal", "-shm", "-journal"];

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PhotoIndexError + '_ {
    move |source| PhotoIndexError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn remove_dir_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(path)(e)),
        _ => Ok(()),
    }
}

fn remove_file_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(path)(e)),
        _ => Ok(()),
    }
}

/// Delete every thumbnail and leave an empty directory behind.
///
/// When a catalog is given, its thumbnail paths are cleared too so rows do
/// not point at files that no longer exist. Returns the number of files
/// removed.
pub fn clear_thumbnail_cache(thumb_dir: &Path, catalog: Option<&PhotoCatalog>) -> Result<usize> {
    let removed = walkdir::WalkDir::new(thumb_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count();

    remove_dir_if_present(thumb_dir)?;
    std::fs::create_dir_all(thumb_dir).map_err(io_error(thumb_dir))?;

    if let Some(catalog) = catalog {
        catalog.clear_thumbnail_paths()?;
    }

    tracing::info!("cleared {} thumbnails from {}", removed, thumb_dir.display());
    Ok(removed)
}

/// Remove the catalog (with its WAL/SHM side files), the thumbnail
/// directory and, if given, the RAW preview cache.
///
/// Any open [`PhotoCatalog`] on `catalog_path` must be dropped first.
pub fn clear_app_data(
    thumb_dir: &Path,
    catalog_path: &Path,
    preview_cache_dir: Option<&Path>,
) -> Result<()> {
    remove_dir_if_present(thumb_dir)?;
    if let Some(cache_dir) = preview_cache_dir {
        remove_dir_if_present(cache_dir)?;
    }

    remove_file_if_present(catalog_path)?;
    for suffix in SIDE_FILE_SUFFIXES {
        let mut side = catalog_path.as_os_str().to_owned();
        side.push(suffix);
        remove_file_if_present(&PathBuf::from(side))?;
    }

    tracing::info!("cleared app data at {}", catalog_path.display());
    Ok(())
}
