//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, ExtensionFilter};
use super::FileCandidate;
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory crawler
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            extensions: None,
        }
    }
}

impl ScanConfig {
    /// Build the extension filter this configuration describes
    pub fn filter(&self) -> ExtensionFilter {
        let filter = match &self.extensions {
            Some(extensions) => ExtensionFilter::with_extensions(extensions),
            None => ExtensionFilter::new(),
        };
        filter.with_hidden(self.include_hidden)
    }
}

type EntryIter = Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>;

/// Lazy, depth-first sequence of candidate files under one root.
///
/// Unreadable entries and symlink cycles are logged, counted and skipped.
/// The sequence cannot be rewound; crawl again for a fresh pass.
pub struct Crawler {
    root: PathBuf,
    entries: EntryIter,
    filter: ExtensionFilter,
    events: EventSender,
    found: usize,
    skipped: usize,
}

impl Crawler {
    /// Validate `root` and prepare a crawl. Nothing is read until iteration.
    pub fn new(root: impl AsRef<Path>, config: &ScanConfig) -> Result<Self, ScanError> {
        let root = root.as_ref().to_path_buf();
        validate_root(&root)?;

        let filter = config.filter();
        let include_hidden = filter.includes_hidden();

        let mut walker = WalkDir::new(&root).follow_links(config.follow_symlinks);
        if let Some(depth) = config.max_depth {
            walker = walker.max_depth(depth);
        }

        // Hidden directories are pruned whole rather than filtered file by file.
        let entries = walker
            .into_iter()
            .filter_entry(move |entry| {
                include_hidden || entry.depth() == 0 || !is_hidden(entry.path())
            });

        Ok(Self {
            root,
            entries: Box::new(entries),
            filter,
            events: null_sender(),
            found: 0,
            skipped: 0,
        })
    }

    /// Report found files and skipped entries through `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// The directory being crawled
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidates yielded so far
    pub fn found(&self) -> usize {
        self.found
    }

    /// Entries skipped because they could not be read
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn skip(&mut self, error: walkdir::Error) {
        self.skipped += 1;
        let error = classify(error);
        let path = match &error {
            ScanError::PermissionDenied { path } | ScanError::Traversal { path, .. } => path.clone(),
            ScanError::DirectoryNotFound { path } | ScanError::NotADirectory { path } => path.clone(),
        };
        warn!(path = %path.display(), "skipping entry: {}", error);
        self.events.send(Event::Scan(ScanEvent::Error {
            path,
            message: error.to_string(),
        }));
    }
}

impl Iterator for Crawler {
    type Item = FileCandidate;

    fn next(&mut self) -> Option<FileCandidate> {
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    if !is_regular_file(&entry) || !self.filter.should_include(entry.path()) {
                        continue;
                    }

                    let path = entry.into_path();
                    self.found += 1;
                    self.events.send(Event::Scan(ScanEvent::FileFound { path: path.clone() }));
                    return Some(path);
                }
                Err(error) => self.skip(error),
            }
        }
    }
}

/// Crawl `root` for files with the given extensions (default image list when `None`).
pub fn crawl(root: impl AsRef<Path>, extensions: Option<&[&str]>) -> Result<Crawler, ScanError> {
    let config = ScanConfig {
        extensions: extensions.map(|exts| exts.iter().map(|e| e.to_string()).collect()),
        ..ScanConfig::default()
    };
    Crawler::new(root, &config)
}

/// Fail fast on a missing root or a root that is not a directory
pub(crate) fn validate_root(root: &Path) -> Result<(), ScanError> {
    match std::fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ScanError::PermissionDenied {
                path: root.to_path_buf(),
            })
        }
        Err(_) => Err(ScanError::DirectoryNotFound {
            path: root.to_path_buf(),
        }),
    }
}

/// Files, and symlinks that resolve to files. Without `follow_links`,
/// walkdir reports a link's own type, so the target is checked here.
fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        return entry.path().metadata().map(|m| m.is_file()).unwrap_or(false);
    }
    file_type.is_file()
}

fn classify(error: walkdir::Error) -> ScanError {
    let path = error.path().map(Path::to_path_buf).unwrap_or_default();

    if let Some(ancestor) = error.loop_ancestor() {
        return ScanError::Traversal {
            reason: format!("symlink cycle back to {}", ancestor.display()),
            path,
        };
    }

    match error.io_error().map(|e| e.kind()) {
        Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied { path },
        _ => ScanError::Traversal {
            reason: error.to_string(),
            path,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_photo(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        // Minimal JPEG header
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    fn sorted(crawler: Crawler) -> Vec<PathBuf> {
        let mut paths: Vec<_> = crawler.collect();
        paths.sort();
        paths
    }

    #[test]
    fn crawl_empty_directory_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let crawler = crawl(temp_dir.path(), None).unwrap();

        assert_eq!(crawler.count(), 0);
    }

    #[test]
    fn crawl_recurses_into_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("2024").join("summer");
        fs::create_dir_all(&nested).unwrap();
        let top = create_test_photo(temp_dir.path(), "top.jpg");
        let deep = create_test_photo(&nested, "deep.PNG");

        let paths = sorted(crawl(temp_dir.path(), None).unwrap());

        let mut expected = vec![top, deep];
        expected.sort();
        assert_eq!(paths, expected);
    }

    #[test]
    fn crawl_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "photo.jpg");
        create_test_photo(temp_dir.path(), "notes.txt");
        create_test_photo(temp_dir.path(), "scan.gif");

        let paths = sorted(crawl(temp_dir.path(), Some(&["gif"])).unwrap());

        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("scan.gif"));
    }

    #[test]
    fn directories_named_like_images_are_not_candidates() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("album.jpg")).unwrap();

        let crawler = crawl(temp_dir.path(), None).unwrap();
        assert_eq!(crawler.count(), 0);
    }

    #[test]
    fn crawl_can_skip_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".thumbnails");
        fs::create_dir(&hidden).unwrap();
        create_test_photo(&hidden, "thumb.jpg");
        create_test_photo(temp_dir.path(), "visible.jpg");

        let config = ScanConfig {
            include_hidden: false,
            ..Default::default()
        };
        let paths = sorted(Crawler::new(temp_dir.path(), &config).unwrap());
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("visible.jpg"));

        let paths = sorted(crawl(temp_dir.path(), None).unwrap());
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn max_depth_limits_recursion() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a");
        fs::create_dir(&nested).unwrap();
        create_test_photo(temp_dir.path(), "top.jpg");
        create_test_photo(&nested, "nested.jpg");

        let config = ScanConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        let paths = sorted(Crawler::new(temp_dir.path(), &config).unwrap());

        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("top.jpg"));
    }

    #[test]
    fn crawl_reports_found_files_through_events() {
        let temp_dir = TempDir::new().unwrap();
        create_test_photo(temp_dir.path(), "photo.jpg");
        let (sender, receiver) = EventChannel::new();

        let crawler = crawl(temp_dir.path(), None).unwrap().with_events(sender);
        assert_eq!(crawler.count(), 1);

        let found = receiver
            .iter()
            .filter(|e| matches!(e, Event::Scan(ScanEvent::FileFound { .. })))
            .count();
        assert_eq!(found, 1);
    }

    #[test]
    fn crawl_nonexistent_directory_returns_error() {
        let result = crawl("/nonexistent/path/12345", None);
        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }

    #[test]
    fn crawl_file_root_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_test_photo(temp_dir.path(), "photo.jpg");

        let result = crawl(&file, None);
        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_skipped_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let inner = temp_dir.path().join("inner");
        fs::create_dir(&inner).unwrap();
        create_test_photo(&inner, "photo.jpg");
        std::os::unix::fs::symlink(temp_dir.path(), inner.join("loop")).unwrap();

        let config = ScanConfig {
            follow_symlinks: true,
            ..Default::default()
        };
        let mut crawler = Crawler::new(temp_dir.path(), &config).unwrap();
        let paths: Vec<_> = crawler.by_ref().collect();

        assert_eq!(paths.len(), 1);
        assert_eq!(crawler.skipped(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_candidates_without_following_links() {
        let elsewhere = TempDir::new().unwrap();
        let real = create_test_photo(elsewhere.path(), "real.jpg");
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("link.jpg");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        std::os::unix::fs::symlink(elsewhere.path(), temp_dir.path().join("album")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("gone.jpg"), temp_dir.path().join("dangling.jpg"))
            .unwrap();

        let paths = sorted(crawl(temp_dir.path(), None).unwrap());

        // The linked directory is not descended into and the dangling link is ignored.
        assert_eq!(paths, vec![link]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_skipped_and_crawl_continues() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        create_test_photo(&locked, "hidden_away.jpg");
        let visible = create_test_photo(temp_dir.path(), "visible.jpg");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can list anything; nothing to check then.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let (sender, receiver) = EventChannel::new();
        let mut crawler = crawl(temp_dir.path(), None).unwrap().with_events(sender);
        let paths: Vec<_> = crawler.by_ref().collect();
        let skipped = crawler.skipped();
        drop(crawler);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(paths, vec![visible]);
        assert_eq!(skipped, 1);
        assert!(receiver
            .iter()
            .any(|e| matches!(e, Event::Scan(ScanEvent::Error { path, .. }) if *path == locked)));
    }
}
