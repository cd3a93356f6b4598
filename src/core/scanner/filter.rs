//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Filters files to determine if they are supported images
pub struct ImageFilter {
    /// Lowercase extensions without the leading dot
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a filter for the given extensions (`".JPG"` and `"jpg"` are equivalent)
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}

/// Whether the final path component starts with a dot
pub(super) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::DEFAULT_EXTENSIONS;

    fn default_filter() -> ImageFilter {
        ImageFilter::new(DEFAULT_EXTENSIONS)
    }

    #[test]
    fn filter_includes_jpeg() {
        let filter = default_filter();
        assert!(filter.should_include(Path::new("/photos/image.jpg")));
        assert!(filter.should_include(Path::new("/photos/image.JPEG")));
    }

    #[test]
    fn filter_includes_raw_formats() {
        let filter = default_filter();
        assert!(filter.should_include(Path::new("/photos/DSC_0001.NEF")));
        assert!(filter.should_include(Path::new("/photos/IMG_0001.cr2")));
        assert!(filter.should_include(Path::new("/photos/A7_0001.arw")));
    }

    #[test]
    fn filter_excludes_non_images_and_sidecars() {
        let filter = default_filter();
        assert!(!filter.should_include(Path::new("/photos/document.pdf")));
        assert!(!filter.should_include(Path::new("/photos/video.mp4")));
        assert!(!filter.should_include(Path::new("/photos/a.jpg.phototool.json")));
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = default_filter();
        assert!(!filter.should_include(Path::new("/photos/.hidden.jpg")));
    }

    #[test]
    fn filter_can_include_hidden() {
        let filter = default_filter().with_hidden(true);
        assert!(filter.should_include(Path::new("/photos/.hidden.jpg")));
    }

    #[test]
    fn extensions_accept_leading_dot() {
        let filter = ImageFilter::new([".HEIC"]);
        assert!(filter.should_include(Path::new("/photos/IMG_1234.heic")));
        assert!(!filter.should_include(Path::new("/photos/IMG_1234.jpg")));
    }

    #[test]
    fn filter_handles_no_extension() {
        let filter = default_filter();
        assert!(!filter.should_include(Path::new("/photos/no_extension")));
    }
}
