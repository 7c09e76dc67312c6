//! Per-run counters and state.

use super::{CancellationToken, ImportResult, ImportState};
use crate::events::ImportProgress;

/// How one candidate file ended up
#[derive(Debug)]
pub enum FileOutcome {
    /// A new catalog row was written
    Recorded,
    /// Content already cataloged
    Duplicate,
    /// Skipped with a per-file error
    Failed(String),
}

/// State of one import run. Never persisted.
#[derive(Debug)]
pub struct ImportSession {
    pub state: ImportState,
    pub current: usize,
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub duplicates: usize,
    pub last_path: String,
    token: CancellationToken,
}

impl ImportSession {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            state: ImportState::Idle,
            current: 0,
            total: 0,
            success: 0,
            failure: 0,
            duplicates: 0,
            last_path: String::new(),
            token,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Count one handled file
    pub fn record(&mut self, path: String, outcome: &FileOutcome) {
        self.current += 1;
        // Files that appeared after the counting pass still get numbered
        self.total = self.total.max(self.current);
        self.last_path = path;
        match outcome {
            FileOutcome::Recorded => self.success += 1,
            FileOutcome::Duplicate => self.duplicates += 1,
            FileOutcome::Failed(_) => self.failure += 1,
        }
    }

    pub fn progress(&self) -> ImportProgress {
        ImportProgress {
            current: self.current,
            total: self.total,
            success: self.success,
            failure: self.failure,
            duplicates: self.duplicates,
            last_path: self.last_path.clone(),
        }
    }

    pub fn result(&self) -> ImportResult {
        ImportResult {
            success: self.success,
            failure: self.failure,
            duplicates: self.duplicates,
            total: self.total,
            cancelled: self.state == ImportState::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_outcomes() {
        let mut session = ImportSession::new(CancellationToken::new());
        session.total = 3;
        session.record("/a.jpg".into(), &FileOutcome::Recorded);
        session.record("/b.jpg".into(), &FileOutcome::Duplicate);
        session.record("/c.jpg".into(), &FileOutcome::Failed("corrupt".into()));

        let progress = session.progress();
        assert_eq!(progress.current, 3);
        assert_eq!((progress.success, progress.duplicates, progress.failure), (1, 1, 1));
        assert_eq!(progress.last_path, "/c.jpg");
    }

    #[test]
    fn total_grows_with_unexpected_files() {
        let mut session = ImportSession::new(CancellationToken::new());
        session.total = 1;
        session.record("/a.jpg".into(), &FileOutcome::Recorded);
        session.record("/b.jpg".into(), &FileOutcome::Recorded);
        assert_eq!(session.total, 2);
    }

    #[test]
    fn result_reflects_cancelled_state() {
        let mut session = ImportSession::new(CancellationToken::new());
        assert!(!session.result().cancelled);
        session.state = ImportState::Cancelled;
        assert!(session.result().cancelled);
    }
}
