//! # Worker Module
//!
//! Scans a folder incrementally: analyzes photos whose record is missing or
//! stale, then refreshes burst neighbors for the whole folder.
//!
//! ## Phases
//! 1. **List** - enumerate photos through the scanner
//! 2. **Partition** - skip photos whose record is current (unless forced)
//! 3. **Analyze** - run per-photo analyzers on a bounded rayon pool
//! 4. **Neighbors** - one sequential pass over every photo of the folder
//!
//! A failing photo is counted and logged, never fatal. Only a listing
//! failure ends the run in the error state.

mod analyzer;
mod session;

pub use analyzer::{PhotoAnalyzer, SharpnessAnalyzer};
pub use session::ScanSession;

use crate::core::cache::{BurstAnalysis, RecordCache, SidecarCache, BURST};
use crate::core::media::{CaptureTimeSource, ExifCaptureTime, MediaItem};
use crate::core::neighbors::{
    count_burst_candidates, HistogramSimilarity, NeighborConfig, NeighborGraphAnalyzer,
    PairSimilarity,
};
use crate::core::scanner::{PhotoScanner, ScanConfig, WalkDirScanner};
use crate::core::sharpness::SharpnessMethod;
use crate::error::{AnalysisError, ArgumentError, BurstError};
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanSummary};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Configuration for a folder scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Size of the analysis thread pool
    pub threads: usize,
    /// Re-analyze photos even when their record is current
    pub force: bool,
    pub sharpness_methods: Vec<SharpnessMethod>,
    /// Neighbor detection settings, `None` to skip the neighbor phase
    pub neighbors: Option<NeighborConfig>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            force: false,
            sharpness_methods: vec![
                SharpnessMethod::Laplacian,
                SharpnessMethod::Tenengrad,
                SharpnessMethod::Roi,
            ],
            neighbors: Some(NeighborConfig::default()),
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.threads == 0 {
            return Err(ArgumentError::InvalidConfig(
                "threads must be at least 1".to_string(),
            ));
        }
        if let Some(neighbors) = &self.neighbors {
            neighbors.validate()?;
        }
        Ok(())
    }
}

/// Builder for [`FolderScanWorker`]
pub struct FolderScanWorkerBuilder {
    config: WorkerConfig,
    scanner: Option<Box<dyn PhotoScanner>>,
    cache: Option<Box<dyn RecordCache>>,
    capture_times: Option<Box<dyn CaptureTimeSource>>,
    similarity: Option<Box<dyn PairSimilarity>>,
    analyzers: Vec<Box<dyn PhotoAnalyzer>>,
}

impl FolderScanWorkerBuilder {
    pub fn new() -> Self {
        Self {
            config: WorkerConfig::default(),
            scanner: None,
            cache: None,
            capture_times: None,
            similarity: None,
            analyzers: Vec::new(),
        }
    }

    pub fn config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.config.force = force;
        self
    }

    /// Directory listing collaborator (default: recursive walkdir listing)
    pub fn scanner(mut self, scanner: Box<dyn PhotoScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Record store (default: JSON sidecars)
    pub fn cache(mut self, cache: Box<dyn RecordCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Capture-time collaborator (default: EXIF only)
    pub fn capture_times(mut self, source: Box<dyn CaptureTimeSource>) -> Self {
        self.capture_times = Some(source);
        self
    }

    /// Pairwise similarity for the neighbor phase (default: histogram correlation)
    pub fn similarity(mut self, similarity: Box<dyn PairSimilarity>) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Add an analyzer run after the sharpness analyzer
    pub fn analyzer(mut self, analyzer: Box<dyn PhotoAnalyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn build(self) -> Result<FolderScanWorker, ArgumentError> {
        self.config.validate()?;

        let mut analyzers: Vec<Box<dyn PhotoAnalyzer>> = Vec::new();
        if !self.config.sharpness_methods.is_empty() {
            analyzers.push(Box::new(SharpnessAnalyzer::new(
                self.config.sharpness_methods.clone(),
            )));
        }
        analyzers.extend(self.analyzers);

        let neighbors = match self.config.neighbors {
            Some(config) => {
                let similarity = self
                    .similarity
                    .unwrap_or_else(|| Box::new(HistogramSimilarity::new()));
                Some(NeighborGraphAnalyzer::with_similarity(config, similarity)?)
            }
            None => None,
        };

        Ok(FolderScanWorker {
            config: self.config,
            scanner: self
                .scanner
                .unwrap_or_else(|| Box::new(WalkDirScanner::new(ScanConfig::default()))),
            cache: self.cache.unwrap_or_else(|| Box::new(SidecarCache::new())),
            capture_times: self
                .capture_times
                .unwrap_or_else(|| Box::new(ExifCaptureTime::new())),
            neighbors,
            analyzers,
        })
    }
}

impl Default for FolderScanWorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental, parallel folder scanner
pub struct FolderScanWorker {
    config: WorkerConfig,
    scanner: Box<dyn PhotoScanner>,
    cache: Box<dyn RecordCache>,
    capture_times: Box<dyn CaptureTimeSource>,
    neighbors: Option<NeighborGraphAnalyzer>,
    analyzers: Vec<Box<dyn PhotoAnalyzer>>,
}

impl FolderScanWorker {
    pub fn builder() -> FolderScanWorkerBuilder {
        FolderScanWorkerBuilder::new()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Scan without events
    pub fn run(&self, folder: &Path, session: &ScanSession) -> crate::Result<ScanSummary> {
        self.run_with_events(folder, session, &null_sender())
    }

    /// Scan, reporting progress through `session` and `events`
    pub fn run_with_events(
        &self,
        folder: &Path,
        session: &ScanSession,
        events: &EventSender,
    ) -> crate::Result<ScanSummary> {
        let start_time = Instant::now();
        session.start();

        // Phase 1: List
        let photos = match self.scanner.scan_with_events(folder, events) {
            Ok(listing) => listing.photos,
            Err(e) => return Err(self.abort(session, events, e.into())),
        };

        // Phase 2: Partition
        let (skipped, to_scan): (Vec<&MediaItem>, Vec<&MediaItem>) = photos
            .iter()
            .partition(|item| !self.config.force && !self.cache.is_stale(&item.path));

        session.listed(photos.len(), skipped.len());
        events.send(Event::Scan(ScanEvent::Started {
            folder: folder.to_path_buf(),
            total: photos.len(),
            to_scan: to_scan.len(),
            skipped: skipped.len(),
        }));
        info!(
            "Scanning {} photos ({} skipped) in {}",
            to_scan.len(),
            skipped.len(),
            folder.display()
        );

        // Phase 3: Analyze
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => return Err(self.abort(session, events, BurstError::WorkerPool(e.to_string()))),
        };

        let failures: Vec<PathBuf> = pool.install(|| {
            to_scan
                .par_iter()
                .filter_map(|item| match self.scan_photo(item, session) {
                    Ok(()) => {
                        events.send(Event::Scan(ScanEvent::PhotoAnalyzed {
                            path: item.path.clone(),
                        }));
                        let snapshot = session.finish_item(false);
                        events.send(Event::Scan(ScanEvent::Progress(snapshot)));
                        None
                    }
                    Err(e) => {
                        warn!(path = %item.path.display(), "Analysis failed: {}", e);
                        events.send(Event::Scan(ScanEvent::PhotoFailed {
                            path: item.path.clone(),
                            message: e.to_string(),
                        }));
                        let snapshot = session.finish_item(true);
                        events.send(Event::Scan(ScanEvent::Progress(snapshot)));
                        Some(item.path.clone())
                    }
                })
                .collect()
        });

        // Phase 4: Neighbors
        let burst_candidates = match &self.neighbors {
            Some(analyzer) if photos.len() > 1 => {
                self.refresh_neighbors(analyzer, &pool, &photos, session, events)
            }
            _ => 0,
        };

        let summary = ScanSummary {
            total: photos.len(),
            scanned: to_scan.len() - failures.len(),
            skipped: skipped.len(),
            errors: failures.len(),
            burst_candidates,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        session.complete();
        events.send(Event::Scan(ScanEvent::Completed(summary.clone())));
        info!(
            "Scan complete: {} scanned, {} skipped, {} errors in {:.1}s",
            summary.scanned,
            summary.skipped,
            summary.errors,
            start_time.elapsed().as_secs_f64()
        );

        Ok(summary)
    }

    /// Load, analyze, mark scanned and save one photo's record
    fn scan_photo(&self, item: &MediaItem, session: &ScanSession) -> Result<(), AnalysisError> {
        let mut record = self.cache.load(&item.path);

        for analyzer in &self.analyzers {
            session.working_on(&item.path, Some(analyzer.name()));
            analyzer.analyze(item, &mut record)?;
        }

        record.mark_scanned(&item.path);
        self.cache.save(&item.path, &mut record)?;
        Ok(())
    }

    /// Run the neighbor graph over every photo and store each result
    fn refresh_neighbors(
        &self,
        analyzer: &NeighborGraphAnalyzer,
        pool: &rayon::ThreadPool,
        photos: &[MediaItem],
        session: &ScanSession,
        events: &EventSender,
    ) -> usize {
        session.working_on(folder_marker(photos), Some(BURST));
        events.send(Event::Scan(ScanEvent::NeighborPhaseStarted {
            total: photos.len(),
        }));
        info!("Running burst detection over {} photos", photos.len());

        let dated: Vec<MediaItem> = pool.install(|| {
            photos
                .par_iter()
                .map(|item| {
                    item.clone()
                        .with_capture_time(self.capture_times.capture_time(&item.path))
                })
                .collect()
        });

        let results = analyzer.analyze(&dated);

        for (path, result) in &results {
            let mut record = self.cache.load(path);
            record.set_burst(BurstAnalysis::from(result));
            if let Err(e) = self.cache.save(path, &mut record) {
                warn!(path = %path.display(), "Failed to store burst neighbors: {}", e);
            }
        }

        let candidates = count_burst_candidates(&results);
        events.send(Event::Scan(ScanEvent::NeighborPhaseCompleted {
            burst_candidates: candidates,
        }));
        candidates
    }

    fn abort(&self, session: &ScanSession, events: &EventSender, error: BurstError) -> BurstError {
        let message = error.to_string();
        error!("Scan failed: {}", message);
        session.fail(message.clone());
        events.send(Event::Scan(ScanEvent::Failed { message }));
        error
    }
}

/// Directory shown as the current file while the whole batch is analyzed
fn folder_marker(photos: &[MediaItem]) -> &Path {
    photos
        .first()
        .and_then(|item| item.path.parent())
        .unwrap_or_else(|| Path::new(""))
}
