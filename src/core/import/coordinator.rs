//! The per-file import pipeline.

use super::{CancellationToken, FileOutcome, ImportResult, ImportSession, ImportState};
use crate::core::catalog::{NewPhoto, PhotoCatalog};
use crate::core::decoder::{self, read_file_bytes};
use crate::core::fingerprint::fingerprint_bytes;
use crate::core::scanner::{ImportSource, PhotoFile};
use crate::core::thumbnail::ThumbnailGenerator;
use crate::error::{CatalogError, DecodeError, PhotoIndexError, Result};
use crate::events::{null_sender, Event, EventSender, ImportEvent};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Emit progress after every file unless configured otherwise
pub const DEFAULT_PROGRESS_INTERVAL: usize = 1;

/// Runs imports against one catalog and thumbnail directory
pub struct ImportCoordinator<'a> {
    catalog: &'a PhotoCatalog,
    thumbnails: ThumbnailGenerator,
    progress_interval: usize,
    token: CancellationToken,
}

impl<'a> ImportCoordinator<'a> {
    pub fn new(catalog: &'a PhotoCatalog, thumbnails: ThumbnailGenerator) -> Self {
        Self {
            catalog,
            thumbnails,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            token: CancellationToken::new(),
        }
    }

    /// Emit a progress event every `interval` files (and always after the last)
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Use an externally owned token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Handle for cancelling runs of this coordinator
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run without events
    pub fn run(&mut self, source: &dyn ImportSource) -> Result<ImportResult> {
        self.run_with_events(source, &null_sender())
    }

    /// Import everything `source` yields.
    ///
    /// Cancellation is only observed between files. A cancelled run still
    /// returns `Ok` with the partial counts and `cancelled` set.
    pub fn run_with_events(
        &mut self,
        source: &dyn ImportSource,
        events: &EventSender,
    ) -> Result<ImportResult> {
        let mut session = ImportSession::new(self.token.clone());

        Self::transition(&mut session, ImportState::Scanning, events);
        self.thumbnails.ensure_writable()?;
        session.total = source.total_hint().unwrap_or(0);
        tracing::info!("import started: {} candidate files", session.total);
        events.send(Event::Import(ImportEvent::Started {
            total: session.total,
        }));

        Self::transition(&mut session, ImportState::Processing, events);
        let mut last_reported = 0;

        for entry in source.entries() {
            if session.is_cancelled() {
                Self::transition(&mut session, ImportState::Cancelled, events);
                break;
            }

            let (display_path, outcome) = match entry {
                Ok(file) => {
                    let outcome = self.process_file(&file)?;
                    (file.path_str().to_string(), outcome)
                }
                Err(e) => (
                    e.path().to_string_lossy().into_owned(),
                    FileOutcome::Failed(PhotoIndexError::from(e).to_string()),
                ),
            };

            match &outcome {
                FileOutcome::Recorded => {}
                FileOutcome::Duplicate => events.send(Event::Import(ImportEvent::Duplicate {
                    path: display_path.clone(),
                })),
                FileOutcome::Failed(message) => {
                    tracing::warn!("import failed for {}: {}", display_path, message);
                    events.send(Event::Import(ImportEvent::FileFailed {
                        path: display_path.clone(),
                        message: message.clone(),
                    }));
                }
            }

            session.record(display_path, &outcome);
            if session.current % self.progress_interval == 0 || session.current == session.total {
                events.send(Event::Import(ImportEvent::Progress(session.progress())));
                last_reported = session.current;
            }
        }

        // Always close with a progress event describing the final counts
        if last_reported != session.current || session.state == ImportState::Cancelled {
            events.send(Event::Import(ImportEvent::Progress(session.progress())));
        }

        let result = if session.state == ImportState::Cancelled {
            let result = session.result();
            tracing::info!(
                "import cancelled after {} files: {} new, {} duplicates, {} failed",
                session.current,
                result.success,
                result.duplicates,
                result.failure
            );
            events.send(Event::Import(ImportEvent::Cancelled(session.progress())));
            result
        } else {
            Self::transition(&mut session, ImportState::Completed, events);
            let result = session.result();
            tracing::info!(
                "import completed: {} new, {} duplicates, {} failed of {}",
                result.success,
                result.duplicates,
                result.failure,
                result.total
            );
            events.send(Event::Import(ImportEvent::Completed(result.clone())));
            result
        };

        Ok(result)
    }

    fn transition(session: &mut ImportSession, state: ImportState, events: &EventSender) {
        session.state = state;
        events.send(Event::Import(ImportEvent::StateChanged { state }));
    }

    /// Outcome for one file; `Err` only for failures that must stop the run
    fn process_file(&mut self, file: &PhotoFile) -> Result<FileOutcome> {
        match self.try_process(file) {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(FileOutcome::Failed(e.to_string())),
        }
    }

    fn try_process(&mut self, file: &PhotoFile) -> Result<FileOutcome> {
        let path = &file.path;
        tracing::debug!("importing {}", path.display());

        let bytes = read_file_bytes(path).map_err(|e| match e {
            DecodeError::EmptyFile { path } => {
                PhotoIndexError::InvalidInput(format!("zero-byte file: {}", path.display()))
            }
            other => other.into(),
        })?;

        let content_hash = fingerprint_bytes(&bytes);
        if self.catalog.query_by_hash(&content_hash)?.is_some() {
            tracing::debug!("duplicate content {} for {}", content_hash, path.display());
            return Ok(FileOutcome::Duplicate);
        }
        if self.catalog.query_by_path(file.path_str())?.is_some() {
            return Err(PhotoIndexError::InvalidInput(format!(
                "content changed since import: {} is already cataloged with a different hash",
                path.display()
            )));
        }

        let decoded = decoder::decode_photo(&bytes, path, file.format)?;
        let (width, height) = decoded.dimensions();
        let (created_at, modified_at) = file_times(path);

        let (thumb_path, thumb_error) = match self.thumbnails.generate(&decoded.image, &content_hash)
        {
            Ok(rel) => (Some(rel.to_string_lossy().into_owned()), None),
            Err(e) => {
                tracing::warn!("thumbnail skipped for {}: {}", path.display(), e);
                (None, Some(e.to_string()))
            }
        };

        let photo = NewPhoto {
            path: file.path_str().to_string(),
            content_hash,
            width,
            height,
            file_size: bytes.len() as u64,
            created_at,
            modified_at,
            thumb_path,
            thumb_error,
            metadata: decoded.metadata,
        };

        if let Err(e) = self.catalog.insert(&photo) {
            if photo.thumb_path.is_some() {
                if let Err(remove_err) = self.thumbnails.remove(&content_hash) {
                    tracing::warn!("could not remove orphaned thumbnail: {}", remove_err);
                }
            }
            return Err(match e {
                CatalogError::Constraint(reason) => CatalogError::Constraint(format!(
                    "{} ({})",
                    reason,
                    path.display()
                )),
                other => other,
            }
            .into());
        }

        Ok(FileOutcome::Recorded)
    }
}

fn unix_seconds(time: std::io::Result<SystemTime>) -> Option<i64> {
    time.ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
}

fn file_times(path: &Path) -> (Option<i64>, Option<i64>) {
    match std::fs::metadata(path) {
        Ok(meta) => (unix_seconds(meta.created()), unix_seconds(meta.modified())),
        Err(_) => (None, None),
    }
}
