//! In-memory record cache for testing.

use super::{AnalysisRecord, RecordCache};
use crate::error::CacheError;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

/// In-memory record cache
///
/// Useful for tests and dry runs that must not leave files behind.
pub struct InMemoryCache {
    records: RwLock<HashMap<PathBuf, AnalysisRecord>>,
}

impl InMemoryCache {
    /// Create a new in-memory cache
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordCache for InMemoryCache {
    fn exists(&self, photo: &Path) -> bool {
        self.records
            .read()
            .map(|records| records.contains_key(photo))
            .unwrap_or(false)
    }

    fn load(&self, photo: &Path) -> AnalysisRecord {
        match self.records.read() {
            Ok(records) => records
                .get(photo)
                .cloned()
                .unwrap_or_else(|| AnalysisRecord::new(photo)),
            Err(_) => {
                warn!(photo = %photo.display(), "Record store lock poisoned, starting a new record");
                AnalysisRecord::new(photo)
            }
        }
    }

    fn save(&self, photo: &Path, record: &mut AnalysisRecord) -> Result<(), CacheError> {
        record.scan_info.updated_at = Some(Utc::now());
        let mut records = self.records.write().map_err(|_| CacheError::LockPoisoned)?;
        records.insert(photo.to_path_buf(), record.clone());
        Ok(())
    }
}
