//! # Media Module
//!
//! The photo identity shared by every stage, plus the capture-time
//! collaborator that feeds the temporal stages.
//!
//! A missing capture time is a legal state. Grouping skips such items,
//! the neighbor graph flags them explicitly.

mod capture;

pub use capture::{parse_exif_datetime, read_exif_capture_time, CaptureTimeSource, ExifCaptureTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A photo on disk, identified by its path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Path to the photo (unique identity)
    pub path: PathBuf,
    /// When the photo was taken, if known
    pub capture_time: Option<DateTime<Utc>>,
    /// File size in bytes
    pub size_bytes: u64,
    /// Last modification time of the file when it was listed
    pub modified: Option<DateTime<Utc>>,
}

impl MediaItem {
    /// Create an item with no capture time and no file snapshot
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            capture_time: None,
            size_bytes: 0,
            modified: None,
        }
    }

    /// Build an item from the file's current metadata
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            capture_time: None,
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Attach a capture time
    pub fn with_capture_time(mut self, capture_time: Option<DateTime<Utc>>) -> Self {
        self.capture_time = capture_time;
        self
    }

    /// File name for display and logging
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Signed distance in seconds from `earlier` to `later`, microsecond precision.
pub fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        // Spans of several hundred thousand years overflow microseconds
        None => delta.num_seconds() as f64,
    }
}
