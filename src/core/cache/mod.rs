//! # Cache Module
//!
//! Persists per-photo analysis results so unchanged photos are not analyzed
//! twice.
//!
//! ## Staleness
//! A record is stale when it does not exist, was never marked scanned, or
//! the photo's modification time is later than its `scanned_at` stamp.
//! Stale records are recomputed, never trusted.
//!
//! ## Backends
//! - `SidecarCache` - one JSON file next to each photo
//! - `InMemoryCache` - For testing
//!
//! A corrupt or missing record is never an error: it loads as an empty,
//! never-scanned record.

mod memory;
mod record;
mod sidecar;
mod traits;

pub use memory::InMemoryCache;
pub use record::{
    AnalysisRecord, Analyses, BlurAnalysis, BurstAnalysis, MethodScore, NeighborLinkRecord,
    PhotoSnapshot, ScanInfo, BLUR, BURST, SCANNER_VERSION, SCHEMA_VERSION,
};
pub use sidecar::SidecarCache;
pub use traits::RecordCache;
