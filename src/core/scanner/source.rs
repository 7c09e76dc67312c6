//! Where candidate paths come from.

use super::PhotoFile;
use crate::error::ScanError;
use std::path::PathBuf;

/// Anything that can hand the import coordinator a sequence of local files.
///
/// Implementations must be restartable: `entries()` may be called more than
/// once and each call starts from the beginning.
pub trait ImportSource {
    /// Number of entries `entries()` will yield, if cheaply known
    fn total_hint(&self) -> Option<usize>;

    /// Fresh sequence of candidates
    fn entries(&self) -> Box<dyn Iterator<Item = Result<PhotoFile, ScanError>> + '_>;
}

/// An explicit list of files, as handed over by a picker
#[derive(Debug, Clone, Default)]
pub struct PathListSource {
    paths: Vec<PathBuf>,
}

impl PathListSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl ImportSource for PathListSource {
    fn total_hint(&self) -> Option<usize> {
        Some(self.paths.len())
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Result<PhotoFile, ScanError>> + '_> {
        Box::new(self.paths.iter().cloned().map(PhotoFile::new))
    }
}
