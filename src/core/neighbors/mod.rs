//! # Neighbors Module
//!
//! Finds burst neighbors for every photo of a batch: photos taken within
//! `time_threshold` seconds that also look alike.
//!
//! Unlike the time grouper this produces a per-photo answer that can be
//! stored in that photo's sidecar record. Links are directed and bounded
//! by `max_neighbors` in each direction, so A may list B without B
//! listing A.
//!
//! ## Ordering
//! Photos are sorted by capture time with undated photos first. Undated
//! photos are never compared and get an explicit "No capture time" result.
//! The forward scan stops at the first photo beyond `time_threshold`.

mod similarity;

pub use similarity::{correlation, HistogramSimilarity, PairSimilarity, COMPARE_SIZE};

use crate::core::media::{seconds_between, MediaItem};
use crate::error::ArgumentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result marker for photos that cannot be placed on the timeline
pub const NO_CAPTURE_TIME: &str = "No capture time";

/// Thresholds for neighbor detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborConfig {
    /// Maximum seconds between two neighbors
    pub time_threshold: f64,
    /// Minimum similarity in `[0, 1]` for a link
    pub similarity_threshold: f64,
    /// How many photos to look at in each direction
    pub max_neighbors: usize,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            time_threshold: 3.0,
            similarity_threshold: 0.85,
            max_neighbors: 20,
        }
    }
}

impl NeighborConfig {
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if !(self.time_threshold.is_finite() && self.time_threshold > 0.0) {
            return Err(ArgumentError::InvalidConfig(format!(
                "time_threshold must be a positive number of seconds, got {}",
                self.time_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ArgumentError::InvalidConfig(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Where the neighbor sits relative to the photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
    Previous,
    Next,
}

/// A directed observation that `to` is a burst neighbor of `from`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborLink {
    pub from: PathBuf,
    pub to: PathBuf,
    /// Absolute time between the two captures
    pub time_diff_seconds: f64,
    pub similarity: f64,
    pub direction: LinkDirection,
}

/// Neighbor analysis of one photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborResult {
    pub neighbors: Vec<NeighborLink>,
    pub is_burst_candidate: bool,
    /// Neighbors plus the photo itself
    pub group_size: usize,
    pub error: Option<String>,
}

impl NeighborResult {
    fn from_links(neighbors: Vec<NeighborLink>) -> Self {
        Self {
            is_burst_candidate: !neighbors.is_empty(),
            group_size: neighbors.len() + 1,
            neighbors,
            error: None,
        }
    }

    fn undated() -> Self {
        Self {
            neighbors: Vec::new(),
            is_burst_candidate: false,
            group_size: 1,
            error: Some(NO_CAPTURE_TIME.to_string()),
        }
    }
}

/// Builds the per-photo neighbor graph of a batch
pub struct NeighborGraphAnalyzer {
    config: NeighborConfig,
    similarity: Box<dyn PairSimilarity>,
}

impl NeighborGraphAnalyzer {
    /// Analyzer using grayscale histogram correlation
    pub fn new(config: NeighborConfig) -> Result<Self, ArgumentError> {
        Self::with_similarity(config, Box::new(HistogramSimilarity::new()))
    }

    /// Analyzer using a custom similarity measure
    pub fn with_similarity(
        config: NeighborConfig,
        similarity: Box<dyn PairSimilarity>,
    ) -> Result<Self, ArgumentError> {
        config.validate()?;
        Ok(Self { config, similarity })
    }

    pub fn config(&self) -> &NeighborConfig {
        &self.config
    }

    /// Analyze a batch, returning one result per photo path
    pub fn analyze(&self, items: &[MediaItem]) -> BTreeMap<PathBuf, NeighborResult> {
        self.similarity.reset();

        let mut sorted: Vec<&MediaItem> = items.iter().collect();
        // None sorts before any time; stable for ties
        sorted.sort_by_key(|item| item.capture_time);

        let mut results = BTreeMap::new();
        for (i, item) in sorted.iter().enumerate() {
            let result = match item.capture_time {
                Some(_) => NeighborResult::from_links(self.links_for(&sorted, i)),
                None => NeighborResult::undated(),
            };

            if result.is_burst_candidate {
                debug!(
                    path = %item.path.display(),
                    neighbors = result.neighbors.len(),
                    "Burst neighbors found"
                );
            }
            results.insert(item.path.clone(), result);
        }

        info!(
            "Neighbor analysis complete: {} burst candidates among {} photos",
            count_burst_candidates(&results),
            items.len()
        );

        results
    }

    fn links_for(&self, sorted: &[&MediaItem], i: usize) -> Vec<NeighborLink> {
        let item = sorted[i];
        let Some(time) = item.capture_time else {
            return Vec::new();
        };
        let threshold = self.config.time_threshold;
        let mut links = Vec::new();

        let first = i.saturating_sub(self.config.max_neighbors);
        for other in &sorted[first..i] {
            let Some(other_time) = other.capture_time else {
                continue;
            };
            let time_diff = seconds_between(other_time, time);
            if time_diff <= threshold {
                self.link(item, other, time_diff, LinkDirection::Previous, &mut links);
            }
        }

        let last = (i + 1 + self.config.max_neighbors).min(sorted.len());
        for other in &sorted[i + 1..last] {
            let Some(other_time) = other.capture_time else {
                continue;
            };
            let time_diff = seconds_between(time, other_time);
            if time_diff > threshold {
                // Sorted: everything after is further away
                break;
            }
            self.link(item, other, time_diff, LinkDirection::Next, &mut links);
        }

        links
    }

    fn link(
        &self,
        from: &MediaItem,
        to: &MediaItem,
        time_diff: f64,
        direction: LinkDirection,
        links: &mut Vec<NeighborLink>,
    ) {
        let similarity = self.similarity.similarity(&from.path, &to.path);
        if similarity >= self.config.similarity_threshold {
            links.push(NeighborLink {
                from: from.path.clone(),
                to: to.path.clone(),
                time_diff_seconds: time_diff,
                similarity,
                direction,
            });
        }
    }
}

/// Number of photos with at least one neighbor
pub fn count_burst_candidates(results: &BTreeMap<PathBuf, NeighborResult>) -> usize {
    results.values().filter(|r| r.is_burst_candidate).count()
}
