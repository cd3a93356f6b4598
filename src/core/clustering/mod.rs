//! # Clustering Module
//!
//! Splits each time group into similarity clusters and ranks them by sharpness.
//!
//! ## How It Works
//! 1. Hash every photo of the group once; photos that fail to decode are left out
//! 2. Walk the group in order. Each unused photo seeds a new cluster
//! 3. Later unused photos within `threshold` bits of the seed join it
//!
//! Clusters are stars around their seed, not cliques: two members may be
//! further apart than `threshold` as long as both are close to the seed.
//! Single-photo clusters are dropped.
//!
//! Clustering runs synchronously on the caller's thread, after scoring.

use crate::core::grouping::TimeGroup;
use crate::core::hasher::{HashAlgorithm, HashVariant, HasherConfig, PerceptualHash};
use crate::core::sharpness::SharpnessScore;
use crate::error::{ArgumentError, HashError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Sharpness scores keyed by photo path
pub type ScoreMap = HashMap<PathBuf, SharpnessScore>;

/// Hashing and distance settings for clustering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub variant: HashVariant,
    pub hash_size: u32,
    /// Maximum Hamming distance to the seed
    pub threshold: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            variant: HashVariant::Perceptual,
            hash_size: 8,
            threshold: 6,
        }
    }
}

/// One photo of a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub path: PathBuf,
    pub hash: PerceptualHash,
    pub sharpness: Option<SharpnessScore>,
}

/// Photos similar to a common seed, in group order. The seed comes first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoCluster {
    members: Vec<ClusterMember>,
}

impl PhotoCluster {
    pub fn seed(&self) -> &ClusterMember {
        &self.members[0]
    }

    pub fn members(&self) -> &[ClusterMember] {
        &self.members
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.members.iter().map(|m| &m.path)
    }

    /// Sharpness values in member order
    pub fn scores(&self) -> Vec<Option<f64>> {
        self.members
            .iter()
            .map(|m| m.sharpness.map(|s| s.value))
            .collect()
    }

    /// Index of the sharpest member, or the seed when nothing is scored
    pub fn best_index(&self) -> usize {
        best_index(&self.scores())
    }

    pub fn best_photo(&self) -> &Path {
        &self.members[self.best_index()].path
    }
}

/// Index of the highest non-null score; the first one wins ties.
///
/// Returns 0 when every score is missing.
pub fn best_index(scores: &[Option<f64>]) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (index, score) in scores.iter().enumerate() {
        if let Some(value) = score {
            if best.map_or(true, |(_, top)| *value > top) {
                best = Some((index, *value));
            }
        }
    }
    best.map_or(0, |(index, _)| index)
}

/// Build star clusters from photos in group order.
///
/// Photos without a hash are skipped. Fails only when two hashes are not
/// comparable.
pub fn build_star_clusters(
    entries: Vec<(PathBuf, Option<PerceptualHash>)>,
    threshold: u32,
    scores: Option<&ScoreMap>,
) -> Result<Vec<PhotoCluster>, HashError> {
    let mut used = vec![false; entries.len()];
    let mut clusters = Vec::new();

    for i in 0..entries.len() {
        let seed_hash = match (&entries[i].1, used[i]) {
            (Some(hash), false) => hash,
            _ => continue,
        };
        used[i] = true;
        let mut indices = vec![i];

        for j in (i + 1)..entries.len() {
            if used[j] {
                continue;
            }
            if let Some(hash) = &entries[j].1 {
                if seed_hash.distance(hash)? <= threshold {
                    used[j] = true;
                    indices.push(j);
                }
            }
        }

        if indices.len() < 2 {
            continue;
        }

        let members = indices
            .into_iter()
            .filter_map(|index| {
                let (path, hash) = &entries[index];
                hash.as_ref().map(|hash| ClusterMember {
                    path: path.clone(),
                    hash: hash.clone(),
                    sharpness: scores.and_then(|s| s.get(path).copied()),
                })
            })
            .collect();
        clusters.push(PhotoCluster { members });
    }

    Ok(clusters)
}

/// Clusters photos by perceptual hash distance
pub struct SimilarityClusterer {
    threshold: u32,
    hasher: Box<dyn HashAlgorithm>,
}

impl SimilarityClusterer {
    pub fn new(config: ClusterConfig) -> Result<Self, ArgumentError> {
        let hasher = HasherConfig::new()
            .variant(config.variant)
            .hash_size(config.hash_size)
            .build()?;
        Ok(Self::with_hasher(hasher, config.threshold))
    }

    /// Use an already-built hasher
    pub fn with_hasher(hasher: Box<dyn HashAlgorithm>, threshold: u32) -> Self {
        Self { threshold, hasher }
    }

    /// Cluster the photos of one time group
    pub fn cluster_group(
        &self,
        group: &TimeGroup,
        scores: Option<&ScoreMap>,
    ) -> Result<Vec<PhotoCluster>, HashError> {
        let paths: Vec<PathBuf> = group.paths().cloned().collect();
        self.cluster_paths(&paths, scores)
    }

    /// Cluster every group; clusters keep group order
    pub fn cluster_groups(
        &self,
        groups: &[TimeGroup],
        scores: Option<&ScoreMap>,
    ) -> Result<Vec<PhotoCluster>, HashError> {
        let mut clusters = Vec::new();
        for group in groups {
            clusters.extend(self.cluster_group(group, scores)?);
        }

        info!(
            "Found {} similarity clusters in {} time groups",
            clusters.len(),
            groups.len()
        );
        Ok(clusters)
    }

    /// Treat a whole collection as a single group, regardless of capture time
    pub fn cluster_collection(
        &self,
        photos: &[PathBuf],
        scores: Option<&ScoreMap>,
    ) -> Result<Vec<PhotoCluster>, HashError> {
        let clusters = self.cluster_paths(photos, scores)?;
        info!(
            "Found {} similarity clusters in a collection of {} photos",
            clusters.len(),
            photos.len()
        );
        Ok(clusters)
    }

    fn cluster_paths(
        &self,
        paths: &[PathBuf],
        scores: Option<&ScoreMap>,
    ) -> Result<Vec<PhotoCluster>, HashError> {
        let entries = self.hash_all(paths);
        build_star_clusters(entries, self.threshold, scores)
    }

    /// Hash on the calling thread, in input order. Failures become `None`.
    fn hash_all(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Option<PerceptualHash>)> {
        paths
            .iter()
            .map(|path| match self.hasher.hash_file(path) {
                Ok(hash) => {
                    debug!(path = %path.display(), hash = %hash, "Hashed");
                    (path.clone(), Some(hash))
                }
                Err(e) => {
                    warn!(path = %path.display(), "Excluded from clustering: {}", e);
                    (path.clone(), None)
                }
            })
            .collect()
    }
}
