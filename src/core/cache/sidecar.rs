//! JSON sidecar files stored next to each photo.

use super::{AnalysisRecord, RecordCache};
use crate::error::CacheError;
use chrono::Utc;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stores each record as `<photo file name>.phototool.json` beside the photo
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarCache;

impl SidecarCache {
    /// Appended to the photo's full file name
    pub const SUFFIX: &'static str = ".phototool.json";

    pub fn new() -> Self {
        Self
    }

    /// Path of the photo's sidecar file
    pub fn sidecar_path(photo: &Path) -> PathBuf {
        let mut name = OsString::from(photo.as_os_str());
        name.push(Self::SUFFIX);
        PathBuf::from(name)
    }

    pub fn has_sidecar(photo: &Path) -> bool {
        Self::sidecar_path(photo).is_file()
    }
}

impl RecordCache for SidecarCache {
    fn exists(&self, photo: &Path) -> bool {
        Self::has_sidecar(photo)
    }

    fn load(&self, photo: &Path) -> AnalysisRecord {
        let path = Self::sidecar_path(photo);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(_) => {
                debug!(photo = %photo.display(), "No sidecar, starting a new record");
                return AnalysisRecord::new(photo);
            }
        };

        match serde_json::from_slice::<AnalysisRecord>(&contents) {
            Ok(record) => record.migrate(photo),
            Err(e) => {
                warn!(path = %path.display(), "Unreadable sidecar, treating photo as never scanned: {}", e);
                AnalysisRecord::new(photo)
            }
        }
    }

    fn save(&self, photo: &Path, record: &mut AnalysisRecord) -> Result<(), CacheError> {
        record.scan_info.updated_at = Some(Utc::now());

        let path = Self::sidecar_path(photo);
        let json = serde_json::to_vec_pretty(record).map_err(|e| CacheError::Serialize {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        // Readers never see a half-written record
        let mut temp = path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        let io_error = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        fs::write(&temp, json).map_err(io_error)?;
        fs::rename(&temp, &path).map_err(|source| {
            let _ = fs::remove_file(&temp);
            io_error(source)
        })?;

        debug!(path = %path.display(), "Sidecar saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::{BlurAnalysis, MethodScore, SCHEMA_VERSION};
    use serde_json::Value;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn photo(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"pixels").unwrap();
        path
    }

    #[test]
    fn sidecar_path_appends_suffix_to_full_name() {
        let path = SidecarCache::sidecar_path(Path::new("/photos/IMG_0042.JPG"));
        assert_eq!(path, PathBuf::from("/photos/IMG_0042.JPG.phototool.json"));
    }

    #[test]
    fn load_without_sidecar_does_not_write() {
        let dir = TempDir::new().unwrap();
        let photo = photo(&dir, "a.jpg");
        let cache = SidecarCache::new();

        let record = cache.load(&photo);

        assert_eq!(record.version, SCHEMA_VERSION);
        assert!(!cache.exists(&photo));
        assert!(cache.is_stale(&photo));
    }

    #[test]
    fn save_then_load_keeps_analyses() {
        let dir = TempDir::new().unwrap();
        let photo = photo(&dir, "a.jpg");
        let cache = SidecarCache::new();

        let mut record = cache.load(&photo);
        let mut blur = BlurAnalysis::default();
        blur.methods.insert("laplacian".into(), MethodScore::ok(210.0));
        record.set_blur(blur);
        record.mark_scanned(&photo);
        cache.save(&photo, &mut record).unwrap();

        assert!(SidecarCache::has_sidecar(&photo));
        let loaded = cache.load(&photo);
        assert_eq!(loaded, record);
        assert!(loaded.scan_info.updated_at.is_some());
    }

    #[test]
    fn sidecar_is_pretty_json_with_expected_layout() {
        let dir = TempDir::new().unwrap();
        let photo = photo(&dir, "b.png");
        let cache = SidecarCache::new();

        let mut record = cache.load(&photo);
        cache.save(&photo, &mut record).unwrap();

        let text = fs::read_to_string(SidecarCache::sidecar_path(&photo)).unwrap();
        assert!(text.contains('\n'));
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["version"], "2.0");
        assert_eq!(json["photo"]["name"], "b.png");
        assert!(json["scan_info"]["scanned_at"].is_null());
        assert!(json["scan_info"]["updated_at"].is_string());
        assert!(json["analyses"].is_object());
    }

    #[test]
    fn corrupt_sidecar_degrades_to_never_scanned() {
        let dir = TempDir::new().unwrap();
        let photo = photo(&dir, "c.jpg");
        fs::write(SidecarCache::sidecar_path(&photo), "{ not json").unwrap();
        let cache = SidecarCache::new();

        let record = cache.load(&photo);

        assert!(record.scan_info.scanned_at.is_none());
        assert!(cache.is_stale(&photo));
    }

    #[test]
    fn staleness_follows_file_modification() {
        let dir = TempDir::new().unwrap();
        let photo = photo(&dir, "d.jpg");
        let file = File::options().write(true).open(&photo).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(600)).unwrap();

        let cache = SidecarCache::new();
        let mut record = cache.load(&photo);
        record.mark_scanned(&photo);
        cache.save(&photo, &mut record).unwrap();
        assert!(!cache.is_stale(&photo));

        file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
        assert!(cache.is_stale(&photo));
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let cache = SidecarCache::new();
        let mut record = AnalysisRecord::default();
        let result = cache.save(Path::new("/nonexistent/dir/photo.jpg"), &mut record);

        assert!(matches!(result, Err(CacheError::Io { .. })));
    }
}
