//! # Error Module
//!
//! Typed errors for the burst curator.
//!
//! ## Recoverability
//! - `HashError::Decode` - unreadable image, skip the item and carry on
//! - `HashError::VariantMismatch` - programmer error, never retried
//! - `CacheError::Io` - a sidecar could not be written, the batch continues
//! - `ArgumentError` - malformed input, raised before any work starts

use crate::core::hasher::HashVariant;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BurstError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid argument: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Errors from the directory-listing collaborator
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from decoding, hashing and scoring images
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot compare a {left} hash with a {right} hash")]
    VariantMismatch { left: String, right: String },

    #[error("Invalid hash string {value:?}")]
    InvalidHex { value: String },
}

/// Errors from the sidecar record cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to write record {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record for {path}: {reason}")]
    Serialize { path: PathBuf, reason: String },

    #[error("Invalid record field path {path:?}")]
    InvalidPath { path: String },

    #[error("Record store lock poisoned")]
    LockPoisoned,
}

/// Malformed input shapes and configuration
#[derive(Error, Debug, PartialEq)]
pub enum ArgumentError {
    #[error("Parallel inputs differ in length: {left} photos vs {right} capture times")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A single photo's analysis failure inside a batch
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("Analyzer {analyzer} failed for {path}: {reason}")]
    Analyzer {
        analyzer: String,
        path: PathBuf,
        reason: String,
    },
}

impl HashError {
    pub(crate) fn mismatch(left: (HashVariant, u32), right: (HashVariant, u32)) -> Self {
        HashError::VariantMismatch {
            left: format!("{} ({}x{})", left.0, left.1, left.1),
            right: format!("{} ({}x{})", right.0, right.1, right.1),
        }
    }

    /// Decode failures are expected on real-world folders and never abort a batch
    pub fn is_decode(&self) -> bool {
        matches!(self, HashError::Decode { .. } | HashError::Io { .. })
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, BurstError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_includes_path() {
        let error = HashError::Decode {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
        assert!(error.is_decode());
    }

    #[test]
    fn mismatch_names_both_variants() {
        let error = HashError::mismatch((HashVariant::Perceptual, 8), (HashVariant::Average, 16));
        let message = error.to_string();
        assert!(message.contains("pHash (8x8)"));
        assert!(message.contains("aHash (16x16)"));
        assert!(!error.is_decode());
    }

    #[test]
    fn length_mismatch_reports_both_sides() {
        let error = ArgumentError::LengthMismatch { left: 3, right: 2 };
        assert!(error.to_string().contains("3 photos vs 2 capture times"));
    }

    #[test]
    fn analysis_error_wraps_transparently() {
        let inner = HashError::Decode {
            path: PathBuf::from("/a.jpg"),
            reason: "bad".to_string(),
        };
        let wrapped: AnalysisError = inner.into();
        assert_eq!(wrapped.to_string(), "Failed to decode image /a.jpg: bad");
    }
}
