//! Embedded preview extraction for camera RAW files.
//!
//! RAW containers (CR2, NEF, ARW, DNG, ...) carry one or more ready-made
//! JPEG renditions next to the sensor data. Rather than parse every vendor's
//! container, the extractor looks for JPEG start-of-image markers anywhere
//! in the file, follows the JPEG segment structure from each one to its
//! end-of-image marker, and keeps the largest candidate whose header
//! decodes.

use crate::error::DecodeError;
use std::ops::Range;
use std::path::Path;
use zune_jpeg::JpegDecoder;

const SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];
const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;

/// A JPEG stream found inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedJpeg {
    /// Byte range within the container
    pub range: Range<usize>,
    pub width: usize,
    pub height: usize,
}

impl EmbeddedJpeg {
    fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Largest decodable embedded JPEG in `bytes`
pub fn extract_preview<'a>(bytes: &'a [u8], path: &Path) -> Result<&'a [u8], DecodeError> {
    find_largest_preview(bytes)
        .map(|jpeg| &bytes[jpeg.range])
        .ok_or_else(|| DecodeError::NoEmbeddedPreview {
            path: path.to_path_buf(),
        })
}

/// Every embedded JPEG whose header decodes, in file order
pub fn find_embedded_jpegs(bytes: &[u8]) -> Vec<EmbeddedJpeg> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = find_soi(&bytes[pos..]) {
        let start = pos + offset;
        match jpeg_end(bytes, start).and_then(|end| validate(bytes, start..end)) {
            Some(jpeg) => {
                pos = jpeg.range.end;
                found.push(jpeg);
            }
            None => pos = start + 2,
        }
    }

    found
}

/// Largest embedded JPEG by pixel count, then by byte length
pub fn find_largest_preview(bytes: &[u8]) -> Option<EmbeddedJpeg> {
    find_embedded_jpegs(bytes)
        .into_iter()
        .max_by_key(|jpeg| (jpeg.area(), jpeg.range.len()))
}

fn find_soi(haystack: &[u8]) -> Option<usize> {
    haystack.windows(SOI.len()).position(|w| w == SOI)
}

/// Offset one past the EOI of the JPEG whose SOI is at `start`.
///
/// Marker segments are skipped by their declared lengths; after each
/// start-of-scan the entropy-coded data is scanned for the next real marker,
/// ignoring stuffed `FF 00` bytes and restart markers.
fn jpeg_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut pos = start + 2;

    loop {
        // Markers may be preceded by any number of fill bytes
        while bytes.get(pos) == Some(&0xFF) && bytes.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(pos + 1)?;

        match marker {
            MARKER_EOI => return Some(pos + 2),
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0x00 | 0xD8 => return None,
            _ => {}
        }

        let len = u16::from_be_bytes([*bytes.get(pos + 2)?, *bytes.get(pos + 3)?]) as usize;
        if len < 2 {
            return None;
        }
        pos += 2 + len;
        if pos > bytes.len() {
            return None;
        }

        if marker == MARKER_SOS {
            pos = skip_entropy_data(bytes, pos)?;
        }
    }
}

/// Position of the first marker after entropy-coded data
fn skip_entropy_data(bytes: &[u8], mut pos: usize) -> Option<usize> {
    while pos + 1 < bytes.len() {
        if bytes[pos] == 0xFF {
            match bytes[pos + 1] {
                0x00 | 0xD0..=0xD7 | 0xFF => pos += 1,
                _ => return Some(pos),
            }
        }
        pos += 1;
    }
    None
}

fn validate(bytes: &[u8], range: Range<usize>) -> Option<EmbeddedJpeg> {
    let mut decoder = JpegDecoder::new(&bytes[range.clone()]);
    decoder.decode_headers().ok()?;
    let (width, height) = decoder.dimensions()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(EmbeddedJpeg {
        range,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 3) as u8, (y * 5) as u8, 200])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }

    /// Fake container: a TIFF-like header, a small and a large JPEG with
    /// noise around them
    fn fake_raw(small: &[u8], large: &[u8]) -> Vec<u8> {
        let mut raw = b"II*\0\x08\0\0\0".to_vec();
        raw.extend_from_slice(&[0x12, 0xFF, 0xD8, 0x00, 0x34]);
        raw.extend_from_slice(small);
        raw.extend(std::iter::repeat(0xAB).take(100));
        raw.extend_from_slice(large);
        raw.extend(std::iter::repeat(0xCD).take(50));
        raw
    }

    #[test]
    fn finds_largest_embedded_jpeg() {
        let small = jpeg(16, 12);
        let large = jpeg(64, 48);
        let raw = fake_raw(&small, &large);

        let preview = find_largest_preview(&raw).unwrap();
        assert_eq!((preview.width, preview.height), (64, 48));
        assert_eq!(&raw[preview.range.clone()], &large[..]);

        let all = find_embedded_jpegs(&raw);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn extracted_preview_decodes() {
        let raw = fake_raw(&jpeg(8, 8), &jpeg(40, 30));
        let bytes = extract_preview(&raw, Path::new("shot.nef")).unwrap();
        let img = image::load_from_memory(bytes).unwrap();
        assert_eq!((img.width(), img.height()), (40, 30));
    }

    #[test]
    fn container_without_jpeg_fails() {
        let raw = vec![0x42u8; 4096];
        let err = extract_preview(&raw, Path::new("empty.cr2")).unwrap_err();
        assert!(matches!(err, DecodeError::NoEmbeddedPreview { .. }));
    }

    #[test]
    fn truncated_jpeg_is_ignored() {
        let full = jpeg(32, 32);
        let mut raw = b"MM\0*".to_vec();
        raw.extend_from_slice(&full[..full.len() / 2]);
        assert!(find_largest_preview(&raw).is_none());
    }

    #[test]
    fn stuffed_bytes_do_not_end_scan() {
        // SOI, SOS with empty header, entropy data containing FF00 and RST0, EOI
        let stream = [
            0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0x11, 0xFF, 0x00, 0x22, 0xFF, 0xD0, 0x33, 0xFF,
            0xD9,
        ];
        assert_eq!(jpeg_end(&stream, 0), Some(stream.len()));
    }
}
