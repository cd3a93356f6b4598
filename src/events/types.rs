//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory listing events
    Listing(ListingEvent),
    /// Folder scan (analysis) events
    Scan(ScanEvent),
}

/// Events while listing a folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ListingEvent {
    /// Listing has started
    Started { root: PathBuf },
    /// A photo was found
    PhotoFound { path: PathBuf },
    /// An entry could not be read but listing continues
    Error { path: PathBuf, message: String },
    /// Listing completed
    Completed { total_photos: usize },
}

/// Events during a folder scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Photos were listed and partitioned
    Started {
        folder: PathBuf,
        total: usize,
        to_scan: usize,
        skipped: usize,
    },
    /// A photo was analyzed and its record saved
    PhotoAnalyzed { path: PathBuf },
    /// A photo failed; the scan continues
    PhotoFailed { path: PathBuf, message: String },
    /// Progress snapshot after a photo finished
    Progress(ProgressSnapshot),
    /// The neighbor graph phase has started
    NeighborPhaseStarted { total: usize },
    /// The neighbor graph phase finished
    NeighborPhaseCompleted { burst_candidates: usize },
    /// The scan finished
    Completed(ScanSummary),
    /// The scan stopped with a terminal error
    Failed { message: String },
}

/// Lifecycle of a scan run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Idle,
    Running,
    Complete,
    /// Terminal failure with the captured message
    Error(String),
}

impl ScanState {
    /// Whether the run has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Complete | ScanState::Error(_))
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Idle => write!(f, "idle"),
            ScanState::Running => write!(f, "running"),
            ScanState::Complete => write!(f, "complete"),
            ScanState::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// Point-in-time view of a scan's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub state: ScanState,
    /// Photos finished so far (skipped, analyzed and failed)
    pub completed: usize,
    /// Photos listed in the folder
    pub total: usize,
    /// Photos skipped because their record was current
    pub skipped: usize,
    /// Photos whose analysis failed
    pub error_count: usize,
    /// Photo most recently picked up by a worker
    pub current_file: Option<PathBuf>,
    /// Analyzer currently running
    pub current_analyzer: Option<String>,
    pub elapsed_seconds: f64,
    pub estimated_remaining_seconds: f64,
    /// Photos per second
    pub rate: f64,
}

/// Summary of a finished scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Photos listed in the folder
    pub total: usize,
    /// Photos analyzed successfully
    pub scanned: usize,
    /// Photos skipped because their record was current
    pub skipped: usize,
    /// Photos whose analysis failed
    pub errors: usize,
    /// Photos with at least one burst neighbor
    pub burst_candidates: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
