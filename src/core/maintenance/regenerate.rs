//! Thumbnail regeneration.

use super::MaintenanceResult;
use crate::core::catalog::{PhotoCatalog, PhotoRecord};
use crate::core::decoder;
use crate::core::thumbnail::ThumbnailGenerator;
use crate::error::{CatalogError, Result};
use crate::events::{Event, EventSender, ThumbnailEvent};
use std::path::Path;

/// Rebuild the thumbnail of every cataloged photo from its original.
///
/// Thumbnails are named after the content hash, so this overwrites in
/// place. A photo whose original cannot be decoded keeps any thumbnail it
/// still has; otherwise the reason is recorded on its row.
pub fn regenerate_thumbnails(
    catalog: &PhotoCatalog,
    generator: &mut ThumbnailGenerator,
    events: &EventSender,
) -> Result<MaintenanceResult> {
    generator.ensure_writable()?;

    let records = catalog.list_all()?;
    let total = records.len();
    let mut result = MaintenanceResult::default();
    tracing::info!("regenerating {} thumbnails", total);

    for (index, record) in records.iter().enumerate() {
        let outcome = decoder::decode_file(record.path())
            .map_err(|e| e.to_string())
            .and_then(|decoded| {
                generator
                    .generate(&decoded.image, &record.content_hash)
                    .map_err(|e| e.to_string())
            });

        match outcome {
            Ok(rel) => {
                if commit_thumbnail(catalog, generator, record, &rel)? {
                    result.success += 1;
                }
            }
            Err(reason) => {
                tracing::warn!("thumbnail regeneration failed for {}: {}", record.path, reason);
                result.failure += 1;
                let still_there = record
                    .thumbnail_in(generator.thumb_dir())
                    .is_some_and(|p| p.exists());
                if !still_there {
                    match catalog.update_thumbnail_error(record.id, &reason) {
                        // Deleted concurrently; nothing to record
                        Err(CatalogError::NotFound { .. }) => {}
                        other => other?,
                    }
                }
            }
        }

        events.send(Event::Thumbnail(ThumbnailEvent::Progress {
            current: index + 1,
            total,
            success: result.success,
            failure: result.failure,
            last_path: record.path.clone(),
        }));
    }

    events.send(Event::Thumbnail(ThumbnailEvent::Completed(result.clone())));
    Ok(result)
}

/// Point the row at its new thumbnail. A row deleted while regenerating
/// is skipped and its freshly written thumbnail removed; returns whether
/// the row was updated.
fn commit_thumbnail(
    catalog: &PhotoCatalog,
    generator: &ThumbnailGenerator,
    record: &PhotoRecord,
    relative: &Path,
) -> Result<bool> {
    match catalog.update_thumbnail_path(record.id, &relative.to_string_lossy()) {
        Ok(()) => Ok(true),
        Err(CatalogError::NotFound { .. }) => {
            tracing::debug!("photo {} deleted during regeneration", record.id);
            if let Err(e) = generator.remove(&record.content_hash) {
                tracing::warn!("could not remove orphaned thumbnail: {}", e);
            }
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
