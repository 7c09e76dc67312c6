//! End-to-end import runs against a real catalog on disk.
//!
//! Covers:
//! - Mixed valid and corrupt files
//! - Re-import of the same content
//! - Cancellation mid-run
//! - Non-UTF-8 file names
//! - EXIF orientation in stored dimensions

use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb, RgbImage};
use photo_indexer::core::catalog::PhotoCatalog;
use photo_indexer::core::import::{CancellationToken, ImportCoordinator, ImportResult};
use photo_indexer::core::scanner::{ImportSource, PhotoFile};
use photo_indexer::core::thumbnail::ThumbnailGenerator;
use photo_indexer::error::ScanError;
use photo_indexer::events::{null_sender, Event, EventChannel, ImportEvent};
use photo_indexer::{ImportConfig, PhotoLibrary};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// JPEG bytes whose pixels depend on `seed`, so every seed hashes differently
fn jpeg_bytes(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x as u8).wrapping_mul(3) ^ seed, (y as u8).wrapping_add(seed), seed])
    });
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .encode_image(&img)
        .unwrap();
    out
}

fn write_jpegs(dir: &Path, count: u8) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("photo_{:02}.jpg", i));
            fs::write(&path, jpeg_bytes(64, 48, i * 20 + 1)).unwrap();
            path
        })
        .collect()
}

/// Insert an EXIF APP1 segment carrying only an orientation tag
fn with_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let field = exif::Field {
        tag: exif::Tag::Orientation,
        ifd_num: exif::In::PRIMARY,
        value: exif::Value::Short(vec![orientation]),
    };
    let mut writer = exif::experimental::Writer::new();
    writer.push_field(&field);
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);
    let segment_len = (payload.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

struct Workspace {
    _dir: TempDir,
    photos: PathBuf,
    catalog: PathBuf,
    thumbs: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let photos = dir.path().join("photos");
        fs::create_dir(&photos).unwrap();
        Self {
            catalog: dir.path().join("data").join("catalog.db"),
            thumbs: dir.path().join("thumbs"),
            photos,
            _dir: dir,
        }
    }

    fn import(&self, library: &PhotoLibrary) -> ImportResult {
        library
            .import(
                self.photos.to_str().unwrap(),
                &self.catalog,
                &self.thumbs,
                &null_sender(),
            )
            .unwrap()
    }
}

fn temp_thumbnails(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(".thumb-"))
        .map(|e| e.into_path())
        .collect()
}

#[test]
fn import_counts_successes_and_failures() {
    let ws = Workspace::new();
    write_jpegs(&ws.photos, 10);
    fs::write(ws.photos.join("broken.jpg"), b"this is not a jpeg").unwrap();

    let (sender, receiver) = EventChannel::new();
    let library = PhotoLibrary::default();
    let result = library
        .import(ws.photos.to_str().unwrap(), &ws.catalog, &ws.thumbs, &sender)
        .unwrap();
    drop(sender);

    assert_eq!(
        result,
        ImportResult {
            success: 10,
            failure: 1,
            duplicates: 0,
            total: 11,
            cancelled: false,
        }
    );

    let events = receiver.drain();
    let currents: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::Import(ImportEvent::Progress(p)) => Some(p.current),
            _ => None,
        })
        .collect();
    assert_eq!(currents, (1..=11).collect::<Vec<_>>());

    let failed: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            Event::Import(ImportEvent::FileFailed { path, .. }) => Some(path.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].ends_with("broken.jpg"));
    assert!(matches!(
        events.last(),
        Some(Event::Import(ImportEvent::Completed(_)))
    ));

    let photos = library.list_photos(&ws.catalog, &ws.thumbs).unwrap();
    assert_eq!(photos.len(), 10);
    for photo in &photos {
        let thumb = PathBuf::from(photo.thumb_path.as_ref().unwrap());
        assert!(thumb.is_file());
        let (w, h) = image::image_dimensions(&thumb).unwrap();
        assert_eq!((w, h), (64, 48));
    }
}

#[test]
fn reimport_reports_only_duplicates() {
    let ws = Workspace::new();
    write_jpegs(&ws.photos, 10);
    let library = PhotoLibrary::default();

    assert_eq!(ws.import(&library).success, 10);
    let again = ws.import(&library);

    assert_eq!(again.success, 0);
    assert_eq!(again.failure, 0);
    assert_eq!(again.duplicates, 10);
    assert_eq!(PhotoCatalog::open(&ws.catalog).unwrap().count().unwrap(), 10);
}

#[test]
fn copied_file_is_a_duplicate_of_the_original() {
    let ws = Workspace::new();
    let originals = write_jpegs(&ws.photos, 2);
    fs::copy(&originals[0], ws.photos.join("zz_copy.jpg")).unwrap();

    let result = ws.import(&PhotoLibrary::default());

    assert_eq!(result.success, 2);
    assert_eq!(result.duplicates, 1);
}

/// Cancels its token when the entry after `after` files is pulled
struct CancellingSource {
    files: Vec<PathBuf>,
    after: usize,
    token: CancellationToken,
}

impl ImportSource for CancellingSource {
    fn total_hint(&self) -> Option<usize> {
        Some(self.files.len())
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Result<PhotoFile, ScanError>> + '_> {
        Box::new(self.files.iter().enumerate().map(move |(i, path)| {
            if i == self.after {
                self.token.cancel();
            }
            PhotoFile::new(path.clone())
        }))
    }
}

#[test]
fn cancellation_keeps_completed_files_only() {
    let ws = Workspace::new();
    let files = write_jpegs(&ws.photos, 8);
    let token = CancellationToken::new();
    let source = CancellingSource {
        files,
        after: 3,
        token: token.clone(),
    };

    let catalog = PhotoCatalog::open(&ws.catalog).unwrap();
    let (sender, receiver) = EventChannel::new();
    let result = ImportCoordinator::new(&catalog, ThumbnailGenerator::new(&ws.thumbs))
        .with_cancellation(token)
        .run_with_events(&source, &sender)
        .unwrap();
    drop(sender);

    assert!(result.cancelled);
    assert_eq!(result.success, 3);
    assert_eq!(result.total, 8);
    assert_eq!(catalog.count().unwrap(), 3);
    assert!(temp_thumbnails(&ws.thumbs).is_empty());

    let events = receiver.drain();
    assert!(matches!(
        events.last(),
        Some(Event::Import(ImportEvent::Cancelled(p))) if p.current == 3
    ));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::Import(ImportEvent::Completed(_)))));
}

#[test]
fn single_file_root_imports_one_photo() {
    let ws = Workspace::new();
    let files = write_jpegs(&ws.photos, 3);
    let library = PhotoLibrary::default();

    let result = library
        .import(files[1].to_str().unwrap(), &ws.catalog, &ws.thumbs, &null_sender())
        .unwrap();

    assert_eq!(result.success, 1);
    assert_eq!(result.total, 1);
}

#[test]
fn file_uri_root_is_accepted() {
    let ws = Workspace::new();
    let spaced = ws.photos.join("Summer Trip");
    fs::create_dir(&spaced).unwrap();
    write_jpegs(&spaced, 2);

    let uri = format!(
        "file://{}",
        spaced.to_str().unwrap().replace(' ', "%20")
    );
    let result = PhotoLibrary::default()
        .import(&uri, &ws.catalog, &ws.thumbs, &null_sender())
        .unwrap();

    assert_eq!(result.success, 2);
}

#[test]
fn missing_root_is_rejected_before_any_work() {
    let ws = Workspace::new();
    let err = PhotoLibrary::default()
        .import(
            ws.photos.join("nope").to_str().unwrap(),
            &ws.catalog,
            &ws.thumbs,
            &null_sender(),
        )
        .unwrap_err();

    assert!(matches!(err, photo_indexer::PhotoIndexError::InvalidInput(_)));
    assert!(!ws.catalog.exists());
}

#[test]
fn zero_byte_file_is_a_failure() {
    let ws = Workspace::new();
    write_jpegs(&ws.photos, 1);
    fs::write(ws.photos.join("empty.jpg"), b"").unwrap();

    let result = ws.import(&PhotoLibrary::default());

    assert_eq!(result.success, 1);
    assert_eq!(result.failure, 1);
}

#[cfg(unix)]
#[test]
fn non_utf8_file_name_is_a_failure() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let ws = Workspace::new();
    write_jpegs(&ws.photos, 1);
    let bad = ws.photos.join(OsStr::from_bytes(b"bad\xffname.jpg"));
    if fs::write(&bad, jpeg_bytes(16, 16, 200)).is_err() {
        // Filesystem refuses non-UTF-8 names
        return;
    }

    let result = ws.import(&PhotoLibrary::default());

    assert_eq!(result.success, 1);
    assert_eq!(result.failure, 1);
    assert_eq!(PhotoCatalog::open(&ws.catalog).unwrap().count().unwrap(), 1);
}

#[test]
fn exif_orientation_swaps_stored_dimensions() {
    let ws = Workspace::new();
    let rotated = with_orientation(&jpeg_bytes(40, 20, 9), 6);
    fs::write(ws.photos.join("portrait.jpg"), rotated).unwrap();
    let library = PhotoLibrary::default();

    assert_eq!(ws.import(&library).success, 1);

    let photos = library.list_photos(&ws.catalog, &ws.thumbs).unwrap();
    assert_eq!((photos[0].width, photos[0].height), (20, 40));
    assert_eq!(photos[0].metadata.orientation, Some(6));

    let thumb = photos[0].thumb_path.as_ref().unwrap();
    assert_eq!(image::image_dimensions(thumb).unwrap(), (20, 40));
}

#[test]
fn thumbnails_are_bounded_by_configured_size() {
    let ws = Workspace::new();
    fs::write(ws.photos.join("wide.jpg"), jpeg_bytes(300, 100, 3)).unwrap();
    let library = PhotoLibrary::new(ImportConfig::new().thumbnail_size(60));

    assert_eq!(ws.import(&library).success, 1);

    let photos = library.list_photos(&ws.catalog, &ws.thumbs).unwrap();
    assert_eq!((photos[0].width, photos[0].height), (300, 100));
    let thumb = photos[0].thumb_path.as_ref().unwrap();
    assert_eq!(image::image_dimensions(thumb).unwrap(), (60, 20));
}

#[test]
fn second_import_on_same_catalog_is_rejected_while_running() {
    use std::sync::Arc;

    let ws = Arc::new(Workspace::new());
    write_jpegs(&ws.photos, 1);
    let library = Arc::new(PhotoLibrary::default());

    // Hold the run open by never letting the first source finish until the
    // second request has been attempted
    let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
    struct Gated {
        gate: crossbeam_channel::Receiver<()>,
    }
    impl ImportSource for Gated {
        fn total_hint(&self) -> Option<usize> {
            Some(0)
        }
        fn entries(&self) -> Box<dyn Iterator<Item = Result<PhotoFile, ScanError>> + '_> {
            let _ = self.gate.recv();
            Box::new(std::iter::empty())
        }
    }

    let first = {
        let library = Arc::clone(&library);
        let ws = Arc::clone(&ws);
        std::thread::spawn(move || {
            library.run_import(&Gated { gate: gate_rx }, &ws.catalog, &ws.thumbs, &null_sender())
        })
    };

    while !library.is_importing(&ws.catalog) {
        std::thread::yield_now();
    }
    let err = library
        .import(ws.photos.to_str().unwrap(), &ws.catalog, &ws.thumbs, &null_sender())
        .unwrap_err();
    assert!(matches!(
        err,
        photo_indexer::PhotoIndexError::ImportInProgress { .. }
    ));
    assert_eq!(library.cancel_import(), 1);

    gate_tx.send(()).unwrap();
    let result = first.join().unwrap().unwrap();
    assert_eq!(result.processed(), 0);
    assert!(!library.is_importing(&ws.catalog));
}
