//! Debounced change events.
//!
//! The debouncer does not say whether a file was created, modified or
//! deleted, and the index does not need to know: every change invalidates
//! the same domains.

use std::time::Instant;

use camino::Utf8PathBuf;
use smallvec::SmallVec;

/// One changed file.
///
/// # Examples
///
/// ```
/// use cv_watcher::FileEvent;
/// use camino::Utf8PathBuf;
///
/// let event = FileEvent::new(Utf8PathBuf::from("/srv/shop/resources/views/home.blade.php"));
/// assert!(event.is_template());
/// assert_eq!(event.extension(), Some("php"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Absolute path of the changed file.
    pub path: Utf8PathBuf,
    /// When the event left the debouncer.
    pub timestamp: Instant,
}

impl FileEvent {
    /// Creates an event stamped now.
    #[inline]
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        Self {
            path,
            timestamp: Instant::now(),
        }
    }

    /// File extension, if any.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension()
    }

    /// File name without its directory.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Returns `true` for `.blade.php` templates.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.file_name().is_some_and(|name| name.ends_with(".blade.php"))
    }

    /// Returns `true` for `.env`, `.env.example`, `.env.testing`, ...
    #[must_use]
    pub fn is_env_file(&self) -> bool {
        self.file_name().is_some_and(|name| name.starts_with(".env"))
    }
}

/// Events drained from the channel together.
///
/// Saving a file often produces several events for one path; rebuild once
/// per [`unique_paths`](Self::unique_paths) instead.
///
/// # Examples
///
/// ```
/// use cv_watcher::{FileEvent, FileEventBatch};
/// use camino::Utf8PathBuf;
///
/// let batch: FileEventBatch = ["routes/web.php", "routes/web.php", ".env"]
///     .into_iter()
///     .map(|p| FileEvent::new(Utf8PathBuf::from(p)))
///     .collect();
/// assert_eq!(batch.len(), 3);
/// let paths: Vec<&str> = batch.unique_paths().iter().map(|p| p.as_str()).collect();
/// assert_eq!(paths, vec![".env", "routes/web.php"]);
/// ```
#[derive(Debug, Clone)]
pub struct FileEventBatch {
    /// The events, in arrival order.
    pub events: SmallVec<[FileEvent; 8]>,
    /// When the batch was started.
    pub received_at: Instant,
}

impl FileEventBatch {
    /// Creates an empty batch.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: SmallVec::new(),
            received_at: Instant::now(),
        }
    }

    /// Appends an event.
    #[inline]
    pub fn push(&mut self, event: FileEvent) {
        self.events.push(event);
    }

    /// Number of events, duplicates included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the batch holds no events.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over the events.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &FileEvent> {
        self.events.iter()
    }

    /// Distinct paths, sorted.
    #[must_use]
    pub fn unique_paths(&self) -> Vec<&Utf8PathBuf> {
        let mut paths: Vec<&Utf8PathBuf> = self.events.iter().map(|e| &e.path).collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Consumes the batch into its distinct paths, sorted.
    #[must_use]
    pub fn into_unique_paths(self) -> Vec<Utf8PathBuf> {
        let mut paths: Vec<Utf8PathBuf> = self.events.into_iter().map(|e| e.path).collect();
        paths.sort();
        paths.dedup();
        paths
    }
}

impl Default for FileEventBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for FileEventBatch {
    type Item = FileEvent;
    type IntoIter = smallvec::IntoIter<[FileEvent; 8]>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileEventBatch {
    type Item = &'a FileEvent;
    type IntoIter = std::slice::Iter<'a, FileEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl FromIterator<FileEvent> for FileEventBatch {
    fn from_iter<T: IntoIterator<Item = FileEvent>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
            received_at: Instant::now(),
        }
    }
}
