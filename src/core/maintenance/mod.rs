//! # Maintenance Module
//!
//! Library upkeep outside of imports:
//! - Deleting photos from the catalog, optionally from disk too
//! - Regenerating thumbnails from the originals
//! - Clearing the thumbnail cache or all app data

mod clear;
mod delete;
mod regenerate;

pub use clear::{clear_app_data, clear_thumbnail_cache};
pub use delete::{delete_photos, DeleteFailure, DeleteMode, DeleteReport};
pub use regenerate::regenerate_thumbnails;

use serde::{Deserialize, Serialize};

/// Counts from a maintenance pass over the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceResult {
    pub success: usize,
    pub failure: usize,
}
