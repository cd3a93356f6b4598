//! Capture-time extraction from EXIF metadata.
//!
//! EXIF timestamps are read in priority order DateTimeOriginal, DateTime,
//! DateTimeDigitized. They are camera wall-clock readings with no zone.
//! Capture times keep that wall-clock reading in a `DateTime<Utc>`, so the
//! optional mtime fallback is converted to local wall-clock time as well.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use exif::{In, Reader, Tag, Value};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;

/// Supplies capture times for photos
pub trait CaptureTimeSource: Send + Sync {
    /// Capture time of the photo, `None` when it cannot be determined
    fn capture_time(&self, path: &Path) -> Option<DateTime<Utc>>;
}

/// Reads capture times from EXIF, optionally falling back to the file mtime
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifCaptureTime {
    mtime_fallback: bool,
}

impl ExifCaptureTime {
    /// EXIF only, undated photos stay undated
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the file modification time when EXIF has no usable timestamp
    pub fn with_mtime_fallback(mut self, enabled: bool) -> Self {
        self.mtime_fallback = enabled;
        self
    }
}

impl CaptureTimeSource for ExifCaptureTime {
    fn capture_time(&self, path: &Path) -> Option<DateTime<Utc>> {
        read_exif_capture_time(path).or_else(|| {
            if self.mtime_fallback {
                fs::metadata(path)
                    .and_then(|m| m.modified())
                    .ok()
                    .map(wall_clock)
            } else {
                None
            }
        })
    }
}

/// Extract the capture time from a file's EXIF block
pub fn read_exif_capture_time(path: &Path) -> Option<DateTime<Utc>> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(&file);
    let exif_reader = Reader::new().read_from_container(&mut bufreader).ok()?;

    [Tag::DateTimeOriginal, Tag::DateTime, Tag::DateTimeDigitized]
        .into_iter()
        .filter_map(|tag| exif_reader.get_field(tag, In::PRIMARY))
        .find_map(|field| match field.value {
            Value::Ascii(ref vec) => vec
                .first()
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .and_then(parse_exif_datetime),
            _ => None,
        })
}

/// Parse an EXIF timestamp (`YYYY:MM:DD HH:MM:SS`).
///
/// A value whose time part is unreadable falls back to midnight of its
/// `YYYY:MM:DD` date.
pub fn parse_exif_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y:%m:%d %H:%M:%S")
        .ok()
        .or_else(|| {
            let date = trimmed.split_whitespace().next()?;
            NaiveDate::parse_from_str(date, "%Y:%m:%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
        })
        .map(|naive| naive.and_utc())
}

/// Local wall-clock reading of a file timestamp, on the same clock as EXIF
fn wall_clock(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Local>::from(time).naive_local().and_utc()
}
