//! # Metadata Module
//!
//! Extracts EXIF metadata from photo bytes.
//!
//! ## Extracted Fields
//! - Date taken (DateTimeOriginal, falling back to DateTime), kept verbatim
//! - ISO, aperture, exposure time
//! - Camera make and model
//! - GPS position in signed decimal degrees
//! - Orientation code
//!
//! Extraction never fails an import: missing or malformed tags, or no EXIF
//! block at all, simply leave the corresponding fields empty.

use crate::error::MetadataError;
use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// EXIF date format: "YYYY:MM:DD HH:MM:SS"
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Extracted photo metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    /// Capture time exactly as written by the camera
    pub date_taken: Option<String>,
    pub iso: Option<u32>,
    pub f_number: Option<f64>,
    /// Display form, e.g. "1/250" or "2"
    pub exposure_time: Option<String>,
    /// Camera make (e.g., "Apple", "Canon")
    pub make: Option<String>,
    /// Camera model (e.g., "iPhone 15 Pro")
    pub model: Option<String>,
    /// Latitude, negative for south
    pub lat: Option<f64>,
    /// Longitude, negative for west
    pub lon: Option<f64>,
    /// Raw EXIF orientation code
    pub orientation: Option<u16>,
}

impl PhotoMetadata {
    /// Check if any metadata was extracted
    pub fn has_data(&self) -> bool {
        self.date_taken.is_some()
            || self.iso.is_some()
            || self.f_number.is_some()
            || self.exposure_time.is_some()
            || self.make.is_some()
            || self.model.is_some()
            || self.lat.is_some()
            || self.orientation.is_some()
    }

    /// Capture time parsed as a naive local timestamp
    pub fn parsed_date_taken(&self) -> Option<NaiveDateTime> {
        self.date_taken
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), EXIF_DATE_FORMAT).ok())
    }

    /// Get a display string for the camera
    pub fn camera_display(&self) -> Option<String> {
        match (&self.make, &self.model) {
            (Some(make), Some(model)) => {
                // Avoid duplication like "Apple Apple iPhone"
                if model.starts_with(make.as_str()) {
                    Some(model.clone())
                } else {
                    Some(format!("{} {}", make, model))
                }
            }
            (None, Some(model)) => Some(model.clone()),
            (Some(make), None) => Some(make.clone()),
            (None, None) => None,
        }
    }
}

/// Extract metadata, degrading every problem to absent fields
pub fn extract_metadata(bytes: &[u8]) -> PhotoMetadata {
    match try_extract_metadata(bytes) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!("metadata: {}", e);
            PhotoMetadata::default()
        }
    }
}

/// Extract metadata, reporting a missing or unreadable EXIF block
pub fn try_extract_metadata(bytes: &[u8]) -> Result<PhotoMetadata, MetadataError> {
    let mut cursor = Cursor::new(bytes);
    let exif = Reader::new()
        .read_from_container(&mut cursor)
        .map_err(|e| MetadataError::NoExif(e.to_string()))?;

    let mut metadata = PhotoMetadata {
        date_taken: string_field(&exif, Tag::DateTimeOriginal)
            .or_else(|| string_field(&exif, Tag::DateTime)),
        iso: exif
            .get_field(Tag::PhotographicSensitivity, In::PRIMARY)
            .and_then(|f| get_u32_value(&f.value)),
        f_number: exif
            .get_field(Tag::FNumber, In::PRIMARY)
            .and_then(|f| first_rational(&f.value))
            .filter(|v| v.is_finite() && *v > 0.0),
        exposure_time: exif
            .get_field(Tag::ExposureTime, In::PRIMARY)
            .and_then(|f| match f.value {
                Value::Rational(ref v) => v.first().and_then(|r| format_exposure(r.num, r.denom)),
                _ => None,
            }),
        make: string_field(&exif, Tag::Make),
        model: string_field(&exif, Tag::Model),
        lat: None,
        lon: None,
        orientation: exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0))
            .and_then(|v| u16::try_from(v).ok()),
    };

    match gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 90.0) {
        Ok(lat) => metadata.lat = lat,
        Err(e) => tracing::debug!("metadata: {}", e),
    }
    match gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 180.0) {
        Ok(lon) => metadata.lon = lon,
        Err(e) => tracing::debug!("metadata: {}", e),
    }
    // A position is only meaningful with both halves
    if metadata.lat.is_none() || metadata.lon.is_none() {
        metadata.lat = None;
        metadata.lon = None;
    }

    Ok(metadata)
}

/// Degrees/minutes/seconds to signed decimal degrees
fn gps_coordinate(
    exif: &Exif,
    value_tag: Tag,
    ref_tag: Tag,
    limit: f64,
) -> Result<Option<f64>, MetadataError> {
    let Some(field) = exif.get_field(value_tag, In::PRIMARY) else {
        return Ok(None);
    };
    let malformed = |reason: &str| MetadataError::MalformedTag {
        tag: value_tag.to_string(),
        reason: reason.to_string(),
    };

    let parts = match field.value {
        Value::Rational(ref v) if !v.is_empty() => v,
        _ => return Err(malformed("expected rational degrees")),
    };
    let component = |i: usize| parts.get(i).map(|r| r.to_f64()).unwrap_or(0.0);
    let degrees = component(0) + component(1) / 60.0 + component(2) / 3600.0;
    if !degrees.is_finite() || degrees > limit {
        return Err(malformed("out of range"));
    }

    let negative = string_field(exif, ref_tag)
        .map(|r| matches!(r.to_ascii_uppercase().as_str(), "S" | "W"))
        .unwrap_or(false);

    Ok(Some(if negative { -degrees } else { degrees }))
}

fn format_exposure(num: u32, denom: u32) -> Option<String> {
    if num == 0 || denom == 0 {
        return None;
    }
    if denom == 1 {
        return Some(num.to_string());
    }
    if num == 1 {
        return Some(format!("1/{}", denom));
    }
    if num < denom {
        let reciprocal = (denom as f64 / num as f64).round() as u32;
        return Some(format!("1/{}", reciprocal));
    }
    let seconds = num as f64 / denom as f64;
    Some(format!("{}", (seconds * 10.0).round() / 10.0))
}

fn first_rational(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(vec) => vec.first().map(|r| r.to_f64()),
        _ => None,
    }
}

/// Helper to extract u32 from various EXIF value types
fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}

/// Helper to extract string from EXIF ASCII value
fn string_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    if let Value::Ascii(ref vec) = field.value {
        let bytes = vec.first()?;
        let s = std::str::from_utf8(bytes).ok()?;
        let trimmed = s.trim_end_matches('\0').trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}
