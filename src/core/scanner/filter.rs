//! Extension and visibility filtering for candidate files.

use super::{RASTER_EXTENSIONS, RAW_EXTENSIONS};
use std::collections::HashSet;
use std::path::Path;

/// Decides whether a directory entry is an import candidate
#[derive(Debug, Clone)]
pub struct ImageFilter {
    /// Lowercased extensions to accept
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl ImageFilter {
    /// Filter accepting every raster and RAW extension the pipeline knows
    pub fn new() -> Self {
        Self {
            extensions: RASTER_EXTENSIONS
                .iter()
                .chain(RAW_EXTENSIONS.iter())
                .map(|e| e.to_string())
                .collect(),
            include_hidden: false,
        }
    }

    /// Include dot-files
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Replace the allow-list. Matching stays case-insensitive.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Whether the file name marks a hidden entry.
    ///
    /// Works on the lossy form so undecodable names are still classified.
    pub fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(false)
    }

    /// Check if a file should be yielded
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && Self::is_hidden(path) {
            return false;
        }

        match path.extension() {
            Some(ext) => self
                .extensions
                .contains(&ext.to_string_lossy().to_lowercase()),
            None => false,
        }
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
