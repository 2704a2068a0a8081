//! Extension and hidden-file filtering for the crawler.

use std::collections::HashSet;
use std::path::Path;

/// Extensions crawled when the caller does not supply any.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "webp"];

/// Decides which directory entries become candidates
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    /// Lowercase extensions without the leading dot
    extensions: HashSet<String>,
    /// Whether to include hidden files and directories
    include_hidden: bool,
}

impl ExtensionFilter {
    /// Create a filter over the default raster-image extensions
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS.iter().copied())
    }

    /// Create a filter over a custom extension list.
    ///
    /// Accepts both `"jpg"` and `".JPG"` spellings.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .filter(|ext| !ext.is_empty())
                .collect(),
            include_hidden: true,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether hidden entries pass the filter
    pub fn includes_hidden(&self) -> bool {
        self.include_hidden
    }

    /// Whether any extension is configured
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
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

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Dot-prefixed file or directory name
pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.') && name != "." && name != "..")
        .unwrap_or(false)
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_extension_case_insensitively() {
        let filter = ExtensionFilter::new();
        assert!(filter.should_include(Path::new("/photos/image.jpg")));
        assert!(filter.should_include(Path::new("/photos/image.JPEG")));
        assert!(filter.should_include(Path::new("/photos/scan.TiFf")));
    }

    #[test]
    fn filter_excludes_non_images() {
        let filter = ExtensionFilter::new();
        assert!(!filter.should_include(Path::new("/photos/document.pdf")));
        assert!(!filter.should_include(Path::new("/photos/video.mp4")));
        assert!(!filter.should_include(Path::new("/photos/jpg")));
    }

    #[test]
    fn custom_extensions_accept_dotted_spelling() {
        let filter = ExtensionFilter::with_extensions([".PNG", "raw"]);
        assert!(filter.should_include(Path::new("a.png")));
        assert!(filter.should_include(Path::new("b.RAW")));
        assert!(!filter.should_include(Path::new("c.jpg")));
    }

    #[test]
    fn hidden_files_are_included_unless_disabled() {
        let filter = ExtensionFilter::new();
        assert!(filter.should_include(Path::new("/photos/.hidden.jpg")));

        let filter = filter.with_hidden(false);
        assert!(!filter.should_include(Path::new("/photos/.hidden.jpg")));
        assert!(filter.should_include(Path::new("/photos/visible.jpg")));
    }

    #[test]
    fn blank_extensions_are_ignored() {
        let filter = ExtensionFilter::with_extensions(["", " ."]);
        assert!(filter.is_empty());
    }
}
