//! Directory walking using walkdir.
//!
//! walkdir keeps its own stack of open directories, so traversal depth is
//! bounded by heap memory rather than the call stack.

use super::{filter::ImageFilter, ImportSource, PhotoFile};
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Enumerates candidates below a root directory, or the root itself when it
/// is a single file.
///
/// Every call to [`DirectoryScanner::iter`] starts a fresh walk; entries are
/// sorted by file name so two walks of an unchanged tree agree.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    root: PathBuf,
    config: ScanConfig,
    filter: ImageFilter,
}

impl DirectoryScanner {
    /// Create a scanner for `root`, which must exist.
    pub fn new(root: impl Into<PathBuf>, config: ScanConfig) -> Result<Self, ScanError> {
        let root = root.into();
        if !root.exists() {
            return Err(ScanError::RootNotFound { path: root });
        }

        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);
        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Ok(Self {
            root,
            config,
            filter,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a new walk
    pub fn iter(&self) -> ScanIter<'_> {
        if !self.root.is_dir() {
            return ScanIter::Single(Some(self.root.clone()));
        }

        let mut walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let walk = walker.into_iter().filter_entry(move |entry| {
            // Never prune the root itself, even if it is a dot-directory
            include_hidden || entry.depth() == 0 || !ImageFilter::is_hidden(entry.path())
        });

        ScanIter::Walk {
            walk: Box::new(walk),
            filter: &self.filter,
        }
    }

    /// Number of entries a fresh walk would yield, errors included
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    fn accept(filter: &ImageFilter, entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return false;
        }
        // Links are not followed; a link is only taken when it resolves to a file
        if file_type.is_symlink() && !entry.path().is_file() {
            return false;
        }
        filter.should_include(entry.path())
    }
}

/// Lazy sequence of candidates produced by [`DirectoryScanner::iter`]
pub enum ScanIter<'a> {
    Single(Option<PathBuf>),
    Walk {
        walk: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + 'a>,
        filter: &'a ImageFilter,
    },
}

impl Iterator for ScanIter<'_> {
    type Item = Result<PhotoFile, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ScanIter::Single(path) => path.take().map(PhotoFile::new),
            ScanIter::Walk { walk, filter } => loop {
                match walk.next()? {
                    Ok(entry) => {
                        if DirectoryScanner::accept(filter, &entry) {
                            return Some(PhotoFile::new(entry.into_path()));
                        }
                    }
                    Err(e) => {
                        let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                        let error = match e.io_error().map(|io| io.kind()) {
                            Some(std::io::ErrorKind::PermissionDenied) => {
                                ScanError::PermissionDenied { path }
                            }
                            _ => ScanError::ReadEntry {
                                path,
                                source: std::io::Error::other(e.to_string()),
                            },
                        };
                        tracing::warn!("scan: {}", error);
                        return Some(Err(error));
                    }
                }
            },
        }
    }
}

impl ImportSource for DirectoryScanner {
    fn total_hint(&self) -> Option<usize> {
        Some(self.count())
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Result<PhotoFile, ScanError>> + '_> {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    fn collect_ok(scanner: &DirectoryScanner) -> Vec<PathBuf> {
        scanner.iter().filter_map(Result::ok).map(|p| p.path).collect()
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = DirectoryScanner::new(temp_dir.path(), ScanConfig::default()).unwrap();
        assert_eq!(scanner.iter().count(), 0);
    }

    #[test]
    fn missing_root_is_rejected() {
        let result = DirectoryScanner::new("/nonexistent/path/12345", ScanConfig::default());
        assert!(matches!(result, Err(ScanError::RootNotFound { .. })));
    }

    #[test]
    fn single_file_root_yields_one_entry() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_file(temp_dir.path(), "notes.bin");

        let scanner = DirectoryScanner::new(&file, ScanConfig::default()).unwrap();
        let found = collect_ok(&scanner);
        assert_eq!(found, vec![file]);
    }

    #[test]
    fn traversal_is_sorted_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("b_dir");
        fs::create_dir(&nested).unwrap();
        create_file(temp_dir.path(), "c.jpg");
        create_file(temp_dir.path(), "a.png");
        create_file(&nested, "z.nef");
        create_file(temp_dir.path(), "readme.txt");

        let scanner = DirectoryScanner::new(temp_dir.path(), ScanConfig::default()).unwrap();
        let names: Vec<String> = collect_ok(&scanner)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "z.nef", "c.jpg"]);
    }

    #[test]
    fn walks_are_restartable() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "one.jpg");
        create_file(temp_dir.path(), "two.jpg");

        let scanner = DirectoryScanner::new(temp_dir.path(), ScanConfig::default()).unwrap();
        assert_eq!(collect_ok(&scanner), collect_ok(&scanner));
        assert_eq!(scanner.total_hint(), Some(2));
    }

    #[test]
    fn hidden_directories_are_pruned() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".thumbnails");
        fs::create_dir(&hidden).unwrap();
        create_file(&hidden, "cached.jpg");
        create_file(temp_dir.path(), "visible.jpg");

        let scanner = DirectoryScanner::new(temp_dir.path(), ScanConfig::default()).unwrap();
        assert_eq!(collect_ok(&scanner).len(), 1);

        let config = ScanConfig {
            include_hidden: true,
            ..Default::default()
        };
        let scanner = DirectoryScanner::new(temp_dir.path(), config).unwrap();
        assert_eq!(collect_ok(&scanner).len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_are_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "photo.jpg");
        std::os::unix::fs::symlink(temp_dir.path(), temp_dir.path().join("loop")).unwrap();

        let scanner = DirectoryScanner::new(temp_dir.path(), ScanConfig::default()).unwrap();
        assert_eq!(scanner.iter().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_yielded_as_errors() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "good.jpg");
        let bad = temp_dir.path().join(OsStr::from_bytes(b"bad\xff.jpg"));
        File::create(&bad).unwrap();

        let scanner = DirectoryScanner::new(temp_dir.path(), ScanConfig::default()).unwrap();
        let results: Vec<_> = scanner.iter().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ScanError::NonUtf8Path { .. }))));
    }
}
