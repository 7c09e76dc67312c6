//! # Core Module
//!
//! The front-end-agnostic import and index engine.
//!
//! ## Modules
//! - `scanner` - Discovers candidate files under an import root
//! - `fingerprint` - Content hashes for duplicate detection
//! - `metadata` - Extracts EXIF metadata
//! - `decoder` - Decodes originals, RAW previews and orientation
//! - `thumbnail` - Writes bounded JPEG thumbnails
//! - `catalog` - Durable SQLite record of imported photos
//! - `import` - Orchestrates one import run
//! - `maintenance` - Delete, regenerate and clear operations
//! - `preview_cache` - On-demand RAW preview cache

pub mod catalog;
pub mod decoder;
pub mod fingerprint;
pub mod import;
pub mod maintenance;
pub mod metadata;
pub mod preview_cache;
pub mod scanner;
pub mod thumbnail;

// Re-export commonly used types
pub use catalog::{NewPhoto, PhotoCatalog, PhotoId, PhotoRecord};
pub use fingerprint::ContentHash;
pub use import::{CancellationToken, ImportCoordinator, ImportResult};
pub use metadata::PhotoMetadata;
pub use scanner::{DirectoryScanner, ImportSource, PhotoFile};
