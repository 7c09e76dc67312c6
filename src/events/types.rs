//! Event type definitions for progress reporting.

use crate::core::import::{ImportResult, ImportState};
use crate::core::maintenance::MaintenanceResult;
use serde::{Deserialize, Serialize};

/// All events emitted by the library
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Import run events
    Import(ImportEvent),
    /// Thumbnail regeneration events
    Thumbnail(ThumbnailEvent),
}

/// Events during an import run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// Candidate enumeration finished, processing is about to start
    Started { total: usize },
    /// The session moved to a new state
    StateChanged { state: ImportState },
    /// Running counters after a file (or batch of files)
    Progress(ImportProgress),
    /// A file was skipped because its content is already cataloged
    Duplicate { path: String },
    /// A file failed; the run continues
    FileFailed { path: String, message: String },
    /// Terminal event for a run that was cancelled
    Cancelled(ImportProgress),
    /// Terminal event for a run that went through every file
    Completed(ImportResult),
}

/// Progress snapshot of an import session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProgress {
    /// Files handled so far, 1-based
    pub current: usize,
    /// Files expected in this run
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub duplicates: usize,
    /// Last file handled (lossy display form for paths that were rejected)
    pub last_path: String,
}

/// Events during thumbnail regeneration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ThumbnailEvent {
    Progress {
        current: usize,
        total: usize,
        success: usize,
        failure: usize,
        last_path: String,
    },
    Completed(MaintenanceResult),
}
