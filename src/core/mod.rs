//! # Core Module
//!
//! The front-end agnostic burst curation engine.
//!
//! ## Modules
//! - `media` - Photo identity and capture times
//! - `scanner` - Discovers photos in directories
//! - `hasher` - Computes perceptual hashes
//! - `sharpness` - Scores how sharp a photo is
//! - `grouping` - Splits photos into capture-time bursts
//! - `clustering` - Groups visually similar photos around a seed
//! - `neighbors` - Links each photo to similar photos taken moments apart
//! - `cache` - Persists analysis results in sidecar records
//! - `worker` - Orchestrates incremental folder scans

pub mod cache;
pub mod clustering;
pub mod grouping;
pub mod hasher;
pub mod media;
pub mod neighbors;
pub mod scanner;
pub mod sharpness;
pub mod worker;

// Re-export commonly used types
pub use clustering::{PhotoCluster, SimilarityClusterer};
pub use grouping::{TimeGroup, TimeWindowGrouper};
pub use hasher::{HashVariant, PerceptualHash};
pub use media::MediaItem;
pub use neighbors::{NeighborGraphAnalyzer, NeighborResult};
pub use sharpness::{SharpnessMethod, SharpnessScorer};
pub use worker::{FolderScanWorker, ScanSession};
