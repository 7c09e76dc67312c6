//! # Photo Indexer
//!
//! Imports photos from disk into a durable, searchable catalog.
//!
//! ## What an import does
//! - Finds candidate images under a root (or takes an explicit file list)
//! - Fingerprints content so copies are recognised as duplicates
//! - Decodes, turns pixels upright and writes a bounded thumbnail
//! - Extracts capture time, camera settings and GPS from EXIF
//! - Uses the embedded preview of RAW files instead of decoding sensor data
//! - Commits one catalog row per new photo, reporting progress as it goes
//!
//! ## Architecture
//! - `core` - The pipeline stages and the catalog
//! - `api` - Typed request/response boundary and the `PhotoLibrary` service
//! - `config` - Import settings and default locations
//! - `events` - Progress reporting over channels
//! - `error` - Error types with path context

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use api::{PhotoLibrary, Request, Response};
pub use config::{AppPaths, ImportConfig};
pub use error::{PhotoIndexError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// `RUST_LOG` wins over `default_level` when set. Calling it twice is
/// harmless: the second subscriber is ignored.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
