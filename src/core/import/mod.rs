//! # Import Module
//!
//! Drives one import run: every candidate from an [`ImportSource`] goes
//! through read, fingerprint, duplicate check, decode, metadata,
//! orientation, thumbnail and catalog insert, in source order.
//!
//! ## Failure policy
//! - Per-file problems (unreadable, empty, corrupt, constraint violation)
//!   are counted in `failure` and reported as `FileFailed` events
//! - A thumbnail problem is recorded on the row; the photo still counts
//! - Catalog infrastructure failures and an unwritable thumbnail directory
//!   abort the run with an error
//!
//! [`ImportSource`]: crate::core::scanner::ImportSource

mod cancel;
mod coordinator;
mod session;

pub use cancel::CancellationToken;
pub use coordinator::{ImportCoordinator, DEFAULT_PROGRESS_INTERVAL};
pub use session::{FileOutcome, ImportSession};

use serde::{Deserialize, Serialize};

/// Lifecycle of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportState {
    Idle,
    Scanning,
    Processing,
    Completed,
    Cancelled,
}

/// Final counts of an import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// New catalog rows
    pub success: usize,
    /// Files skipped with an error
    pub failure: usize,
    /// Files whose content was already cataloged
    pub duplicates: usize,
    /// Files the run expected to handle
    pub total: usize,
    /// The run stopped early on request
    pub cancelled: bool,
}

impl ImportResult {
    /// Files actually handled
    pub fn processed(&self) -> usize {
        self.success + self.failure + self.duplicates
    }
}
