//! Photo deletion.

use crate::core::catalog::{PhotoCatalog, PhotoId, PhotoRecord};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

/// What a delete touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Catalog row and thumbnail only; the original stays on disk
    #[default]
    AppOnly,
    /// Original file as well
    Complete,
}

/// A photo that could not be deleted; its row is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFailure {
    pub id: PhotoId,
    pub path: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Rows removed, selected photos first, then RAW companions
    pub deleted: Vec<PhotoId>,
    pub failed: Vec<DeleteFailure>,
}

/// Delete photos by id.
///
/// With `include_raw_companions`, every cataloged RAW file in the same
/// directory and with the same file stem as a selected photo is deleted as
/// well. In [`DeleteMode::Complete`] the original goes first; if that fails
/// for one photo, the failure is reported and its row stays, while the rest
/// of the batch proceeds. An original that is already gone does not count
/// as a failure.
pub fn delete_photos(
    catalog: &PhotoCatalog,
    thumb_dir: &Path,
    ids: &[PhotoId],
    mode: DeleteMode,
    include_raw_companions: bool,
) -> Result<DeleteReport> {
    let mut report = DeleteReport::default();
    let mut seen = HashSet::new();
    let mut targets: Vec<PhotoRecord> = Vec::new();

    for &id in ids {
        if !seen.insert(id) {
            continue;
        }
        match catalog.get(id)? {
            Some(record) => targets.push(record),
            None => report.failed.push(DeleteFailure {
                id,
                path: None,
                message: format!("Photo {} not found in catalog", id),
            }),
        }
    }

    if include_raw_companions {
        let mut companions = Vec::new();
        for record in &targets {
            for companion in catalog.find_raw_companions(record)? {
                if seen.insert(companion.id) {
                    companions.push(companion);
                }
            }
        }
        targets.extend(companions);
    }

    let mut removable = Vec::with_capacity(targets.len());
    for record in targets {
        if mode == DeleteMode::Complete {
            match std::fs::remove_file(record.path()) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("original already gone: {}", record.path);
                }
                Err(e) => {
                    tracing::warn!("could not delete {}: {}", record.path, e);
                    report.failed.push(DeleteFailure {
                        id: record.id,
                        path: Some(record.path.clone()),
                        message: e.to_string(),
                    });
                    continue;
                }
            }
        }
        removable.push(record);
    }

    let ids: Vec<PhotoId> = removable.iter().map(|r| r.id).collect();
    let deleted = catalog.delete(&ids)?;

    for record in &deleted {
        if let Some(thumb) = record.thumbnail_in(thumb_dir) {
            match std::fs::remove_file(&thumb) {
                Err(e) if e.kind() != ErrorKind::NotFound => {
                    tracing::warn!("could not remove thumbnail {}: {}", thumb.display(), e);
                }
                _ => {}
            }
        }
    }

    report.deleted = deleted.iter().map(|r| r.id).collect();
    tracing::info!(
        "deleted {} photos ({:?}), {} failed",
        report.deleted.len(),
        mode,
        report.failed.len()
    );
    Ok(report)
}
