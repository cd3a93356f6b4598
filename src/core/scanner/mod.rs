//! # Scanner Module
//!
//! Lists candidate photo files under a folder.
//!
//! ## Default Extensions
//! `.jpg .jpeg .png .raw .arw .cr2 .nef .tif .tiff .webp .bmp`
//!
//! Sidecar records (`*.phototool.json`) never match an image extension and
//! are therefore never listed.
//!
//! ## Example
//! ```rust,ignore
//! use burst_curator::core::scanner::{PhotoScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let listing = scanner.scan(Path::new("/Users/photos"))?;
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner, DEFAULT_EXTENSIONS};

use crate::core::media::MediaItem;
use crate::error::ScanError;
use crate::events::EventSender;
use std::path::Path;

/// Result of listing a folder
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered photos, ordered by path
    pub photos: Vec<MediaItem>,
    /// Errors on individual entries (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for directory-listing collaborators
///
/// A missing or unreadable root is an error, while unreadable entries
/// below it are collected in [`ScanResult::errors`].
pub trait PhotoScanner: Send + Sync {
    /// List photos under `root`
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError>;

    /// List photos under `root`, reporting through events
    fn scan_with_events(&self, root: &Path, events: &EventSender)
        -> Result<ScanResult, ScanError>;
}
