//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, ImageFilter};
use super::{PhotoScanner, ScanResult};
use crate::core::media::MediaItem;
use crate::error::ScanError;
use crate::events::{Event, EventSender, ListingEvent};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions listed when the caller does not override them
pub const DEFAULT_EXTENSIONS: [&str; 11] = [
    ".jpg", ".jpeg", ".png", ".raw", ".arw", ".cr2", ".nef", ".tif", ".tiff", ".webp", ".bmp",
];

/// Configuration for the directory scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Extensions to include, with or without the leading dot
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            include_hidden: false,
            follow_symlinks: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = ImageFilter::new(&config.extensions).with_hidden(config.include_hidden);
        Self { config, filter }
    }

    /// Scan a single directory
    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut photos = Vec::new();
        let mut errors = Vec::new();

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker
            .into_iter()
            // Hidden directories are pruned together with their contents
            .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e.path()));

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let error = if e.io_error().map(|e| e.kind())
                        == Some(io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: io::Error::new(io::ErrorKind::Other, e.to_string()),
                        }
                    };

                    // The root itself could not be read
                    if e.depth() == 0 {
                        return Err(error);
                    }

                    warn!(path = %path.display(), "Skipping unreadable entry: {}", error);
                    events.send(Event::Listing(ListingEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() || !self.filter.should_include(path) {
                continue;
            }

            match MediaItem::from_file(path) {
                Ok(item) => {
                    events.send(Event::Listing(ListingEvent::PhotoFound {
                        path: item.path.clone(),
                    }));
                    photos.push(item);
                }
                Err(source) => {
                    let error = ScanError::ReadDirectory {
                        path: path.to_path_buf(),
                        source,
                    };
                    warn!(path = %path.display(), "Skipping unreadable file: {}", error);
                    events.send(Event::Listing(ListingEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        debug!(
            root = %root.display(),
            photos = photos.len(),
            errors = errors.len(),
            "Listing finished"
        );

        Ok(ScanResult { photos, errors })
    }
}

impl PhotoScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Listing(ListingEvent::Started {
            root: root.to_path_buf(),
        }));

        let result = self.scan_directory(root, events)?;

        events.send(Event::Listing(ListingEvent::Completed {
            total_photos: result.photos.len(),
        }));

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_photo(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        // Write minimal JPEG header
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    #[test]
    fn scan_empty_directory_returns_empty_vec() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = WalkDirScanner::new(ScanConfig::default());

        let result = scanner.scan(temp_dir.path()).unwrap();

        assert!(result.photos.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn scan_finds_single_photo_with_size() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "photo.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.photos.len(), 1);
        assert!(result.photos[0].path.ends_with("photo.jpg"));
        assert_eq!(result.photos[0].size_bytes, 4);
        assert!(result.photos[0].capture_time.is_none());
    }

    #[test]
    fn scan_excludes_non_image_files_and_sidecars() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "photo.jpg");
        File::create(temp_dir.path().join("document.txt")).unwrap();
        File::create(temp_dir.path().join("photo.jpg.phototool.json")).unwrap();

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.photos.len(), 1);
        assert!(result.photos[0].path.ends_with("photo.jpg"));
    }

    #[test]
    fn scan_results_are_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "c.jpg");
        create_test_photo(temp_dir.path(), "a.jpg");
        create_test_photo(temp_dir.path(), "b.png");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let names: Vec<String> = scanner
            .scan(temp_dir.path())
            .unwrap()
            .photos
            .iter()
            .map(|p| p.file_name())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.png", "c.jpg"]);
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        create_test_photo(temp_dir.path(), "root.jpg");
        create_test_photo(&subdir, "nested.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.photos.len(), 2);
    }

    #[test]
    fn non_recursive_scan_stays_at_top_level() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        create_test_photo(temp_dir.path(), "root.jpg");
        create_test_photo(&subdir, "nested.jpg");

        let config = ScanConfig {
            recursive: false,
            ..Default::default()
        };
        let result = WalkDirScanner::new(config).scan(temp_dir.path()).unwrap();

        assert_eq!(result.photos.len(), 1);
        assert!(result.photos[0].path.ends_with("root.jpg"));
    }

    #[test]
    fn hidden_directories_are_pruned_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".thumbnails");
        fs::create_dir(&hidden).unwrap();

        create_test_photo(temp_dir.path(), "visible.jpg");
        create_test_photo(temp_dir.path(), ".hidden.jpg");
        create_test_photo(&hidden, "thumb.jpg");

        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.photos.len(), 1);
        assert!(result.photos[0].path.ends_with("visible.jpg"));
    }

    #[test]
    fn scan_can_include_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "visible.jpg");
        create_test_photo(temp_dir.path(), ".hidden.jpg");

        let config = ScanConfig {
            include_hidden: true,
            ..Default::default()
        };
        let scanner = WalkDirScanner::new(config);
        let result = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(result.photos.len(), 2);
    }

    #[test]
    fn scan_nonexistent_directory_returns_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner.scan(Path::new("/nonexistent/path/12345"));

        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }
}
