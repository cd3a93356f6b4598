//! Record cache trait definition.

use super::AnalysisRecord;
use crate::error::CacheError;
use std::path::Path;

/// Per-photo storage for analysis records.
///
/// Records are independent: reading or writing one photo's record never
/// touches another's.
pub trait RecordCache: Send + Sync {
    /// Whether a record has been saved for the photo
    fn exists(&self, photo: &Path) -> bool;

    /// Load the photo's record.
    ///
    /// A missing or unreadable record yields an empty, never-scanned record.
    /// Nothing is written.
    fn load(&self, photo: &Path) -> AnalysisRecord;

    /// Store the record, refreshing its `updated_at` stamp first
    fn save(&self, photo: &Path, record: &mut AnalysisRecord) -> Result<(), CacheError>;

    /// Whether the photo needs (re)scanning
    ///
    /// True when there is no record, the record was never scanned, or the
    /// photo was modified after it was scanned.
    fn is_stale(&self, photo: &Path) -> bool {
        if !self.exists(photo) {
            return true;
        }
        self.load(photo).is_stale_for(photo)
    }
}
