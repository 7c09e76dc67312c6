//! Reading originals into memory.
//!
//! Large originals (1 MiB and up) are memory-mapped so the fingerprint,
//! EXIF parser and decoder all work off the page cache without an extra
//! copy. Smaller files are read into a `Vec`, which is cheaper to set up.

use crate::error::DecodeError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1 MiB)
pub const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

/// Read a whole file, mapping it when it is large.
///
/// A zero-length file is reported as [`DecodeError::EmptyFile`].
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, DecodeError> {
    let io_err = |source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();

    if len == 0 {
        return Err(DecodeError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    if len >= MMAP_THRESHOLD {
        // SAFETY: the mapping is read-only and the handle outlives it.
        // Concurrent truncation by another process is outside our control.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;
        return Ok(FileBytes::Mmap(mmap));
    }

    let mut bytes = Vec::with_capacity(len as usize);
    std::io::Read::read_to_end(&mut &file, &mut bytes).map_err(io_err)?;
    Ok(FileBytes::Vec(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn small_files_are_read_into_memory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("small.bin");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let bytes = read_file_bytes(&path).unwrap();
        assert!(matches!(bytes, FileBytes::Vec(_)));
        assert_eq!(&*bytes, &[1, 2, 3, 4]);
    }

    #[test]
    fn large_files_are_mapped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("large.bin");
        std::fs::write(&path, vec![7u8; MMAP_THRESHOLD as usize]).unwrap();

        let bytes = read_file_bytes(&path).unwrap();
        assert!(matches!(bytes, FileBytes::Mmap(_)));
        assert_eq!(bytes.len(), MMAP_THRESHOLD as usize);
    }

    #[test]
    fn empty_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zero.jpg");
        std::fs::write(&path, []).unwrap();

        assert!(matches!(
            read_file_bytes(&path),
            Err(DecodeError::EmptyFile { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            read_file_bytes(Path::new("/nonexistent/photo.jpg")),
            Err(DecodeError::Io { .. })
        ));
    }
}
