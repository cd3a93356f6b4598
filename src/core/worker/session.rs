//! Shared, queryable progress of one scan run.

use crate::events::{ProgressSnapshot, ScanState};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Debug)]
struct ScanProgress {
    state: ScanState,
    completed: usize,
    total: usize,
    skipped: usize,
    error_count: usize,
    current_file: Option<PathBuf>,
    current_analyzer: Option<String>,
    started: Option<Instant>,
    /// Elapsed seconds frozen when the run ends
    finished_after: Option<f64>,
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self {
            state: ScanState::Idle,
            completed: 0,
            total: 0,
            skipped: 0,
            error_count: 0,
            current_file: None,
            current_analyzer: None,
            started: None,
            finished_after: None,
        }
    }
}

impl ScanProgress {
    fn snapshot(&self) -> ProgressSnapshot {
        let elapsed = self.finished_after.unwrap_or_else(|| {
            self.started
                .map_or(0.0, |started| started.elapsed().as_secs_f64())
        });
        let processed = self.completed.saturating_sub(self.skipped);
        let rate = if elapsed > 0.0 {
            processed as f64 / elapsed
        } else {
            0.0
        };
        let remaining = self.total.saturating_sub(self.completed);
        let estimated_remaining = if rate > 0.0 && !self.state.is_terminal() {
            remaining as f64 / rate
        } else {
            0.0
        };

        ProgressSnapshot {
            state: self.state.clone(),
            completed: self.completed,
            total: self.total,
            skipped: self.skipped,
            error_count: self.error_count,
            current_file: self.current_file.clone(),
            current_analyzer: self.current_analyzer.clone(),
            elapsed_seconds: elapsed,
            estimated_remaining_seconds: estimated_remaining,
            rate,
        }
    }
}

/// Progress handle owned by the caller of a scan.
///
/// Cheap to clone; clones share the same progress. Can be polled from any
/// thread while the scan runs. `completed` never decreases within a run.
#[derive(Debug, Clone, Default)]
pub struct ScanSession {
    inner: Arc<Mutex<ScanProgress>>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        self.lock().state.clone()
    }

    /// Point-in-time copy of the progress
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().snapshot()
    }

    /// Reset counters and enter `Running`
    pub(crate) fn start(&self) {
        *self.lock() = ScanProgress {
            state: ScanState::Running,
            started: Some(Instant::now()),
            ..ScanProgress::default()
        };
    }

    /// Photos listed, `skipped` of which are already current
    pub(crate) fn listed(&self, total: usize, skipped: usize) {
        let mut progress = self.lock();
        progress.total = total;
        progress.skipped = skipped;
        progress.completed += skipped;
    }

    pub(crate) fn working_on(&self, path: &Path, analyzer: Option<&str>) {
        let mut progress = self.lock();
        progress.current_file = Some(path.to_path_buf());
        progress.current_analyzer = analyzer.map(str::to_string);
    }

    /// Count one finished photo and return the progress after it
    pub(crate) fn finish_item(&self, failed: bool) -> ProgressSnapshot {
        let mut progress = self.lock();
        progress.completed += 1;
        if failed {
            progress.error_count += 1;
        }
        progress.snapshot()
    }

    pub(crate) fn complete(&self) {
        self.finish(ScanState::Complete);
    }

    pub(crate) fn fail(&self, message: impl Into<String>) {
        self.finish(ScanState::Error(message.into()));
    }

    fn finish(&self, state: ScanState) {
        let mut progress = self.lock();
        progress.finished_after = Some(
            progress
                .started
                .map_or(0.0, |started| started.elapsed().as_secs_f64()),
        );
        progress.state = state;
        progress.current_file = None;
        progress.current_analyzer = None;
    }

    fn lock(&self) -> MutexGuard<'_, ScanProgress> {
        // Counters stay usable even if a worker panicked mid-update
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
