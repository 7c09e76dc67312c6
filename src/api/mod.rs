//! # API Module
//!
//! Typed boundary between front ends (desktop shell, mobile bridge, CLI)
//! and the pipeline. Every command is a [`Request`] variant and every
//! answer a [`Response`] variant, both serde-tagged so they can cross a
//! process or language boundary as JSON.
//!
//! ```rust,ignore
//! let library = PhotoLibrary::default();
//! let response = library.handle(
//!     Request::ListPhotos { catalog_path, thumbnail_dir },
//!     &null_sender(),
//! )?;
//! ```

mod library;

pub use library::PhotoLibrary;

use crate::core::catalog::{PhotoId, PhotoRecord};
use crate::core::import::ImportResult;
use crate::core::maintenance::{DeleteMode, DeleteReport, MaintenanceResult};
use crate::error::Result;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Commands accepted by [`PhotoLibrary::handle`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    /// Import a directory or single file; `root` may be a `file://` URI
    Import {
        root: String,
        catalog_path: PathBuf,
        thumbnail_dir: PathBuf,
    },
    /// Import an explicit list of files
    ImportPaths {
        paths: Vec<PathBuf>,
        catalog_path: PathBuf,
        thumbnail_dir: PathBuf,
    },
    CancelImport,
    ListPhotos {
        catalog_path: PathBuf,
        thumbnail_dir: PathBuf,
    },
    DeletePhotos {
        ids: Vec<PhotoId>,
        catalog_path: PathBuf,
        thumbnail_dir: PathBuf,
        #[serde(default)]
        mode: DeleteMode,
        #[serde(default)]
        include_raw_companions: bool,
    },
    /// Both `catalog_path` and `thumbnail_dir` are needed for the
    /// thumbnail fallback
    GetRawPreview {
        path: PathBuf,
        cache_dir: PathBuf,
        #[serde(default)]
        catalog_path: Option<PathBuf>,
        #[serde(default)]
        thumbnail_dir: Option<PathBuf>,
    },
    RegenerateThumbnails {
        catalog_path: PathBuf,
        thumbnail_dir: PathBuf,
    },
    ClearThumbnailCache {
        thumbnail_dir: PathBuf,
        #[serde(default)]
        catalog_path: Option<PathBuf>,
    },
    ClearAppData {
        thumbnail_dir: PathBuf,
        catalog_path: PathBuf,
        #[serde(default)]
        preview_cache_dir: Option<PathBuf>,
    },
}

/// Answers produced by [`PhotoLibrary::handle`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Response {
    Imported(ImportResult),
    /// Number of running imports that were signalled
    CancelRequested { sessions: usize },
    Photos(Vec<PhotoRecord>),
    Deleted(DeleteReport),
    RawPreview { path: PathBuf },
    Regenerated(MaintenanceResult),
    ThumbnailsCleared { removed: usize },
    AppDataCleared,
}

impl PhotoLibrary {
    /// Dispatch one request. Import and regeneration progress goes to
    /// `events`; other commands emit nothing.
    pub fn handle(&self, request: Request, events: &EventSender) -> Result<Response> {
        tracing::debug!("handling {:?}", request);
        let response = match request {
            Request::Import {
                root,
                catalog_path,
                thumbnail_dir,
            } => Response::Imported(self.import(&root, &catalog_path, &thumbnail_dir, events)?),
            Request::ImportPaths {
                paths,
                catalog_path,
                thumbnail_dir,
            } => Response::Imported(self.import_paths(
                paths,
                &catalog_path,
                &thumbnail_dir,
                events,
            )?),
            Request::CancelImport => Response::CancelRequested {
                sessions: self.cancel_import(),
            },
            Request::ListPhotos {
                catalog_path,
                thumbnail_dir,
            } => Response::Photos(self.list_photos(&catalog_path, &thumbnail_dir)?),
            Request::DeletePhotos {
                ids,
                catalog_path,
                thumbnail_dir,
                mode,
                include_raw_companions,
            } => Response::Deleted(self.delete_photos(
                &ids,
                &catalog_path,
                &thumbnail_dir,
                mode,
                include_raw_companions,
            )?),
            Request::GetRawPreview {
                path,
                cache_dir,
                catalog_path,
                thumbnail_dir,
            } => {
                let fallback = catalog_path
                    .as_deref()
                    .zip(thumbnail_dir.as_deref());
                Response::RawPreview {
                    path: self.get_raw_preview(&path, &cache_dir, fallback)?,
                }
            }
            Request::RegenerateThumbnails {
                catalog_path,
                thumbnail_dir,
            } => Response::Regenerated(self.regenerate_thumbnails(
                &catalog_path,
                &thumbnail_dir,
                events,
            )?),
            Request::ClearThumbnailCache {
                thumbnail_dir,
                catalog_path,
            } => Response::ThumbnailsCleared {
                removed: self.clear_thumbnail_cache(&thumbnail_dir, catalog_path.as_deref())?,
            },
            Request::ClearAppData {
                thumbnail_dir,
                catalog_path,
                preview_cache_dir,
            } => {
                self.clear_app_data(&thumbnail_dir, &catalog_path, preview_cache_dir.as_deref())?;
                Response::AppDataCleared
            }
        };
        Ok(response)
    }
}
