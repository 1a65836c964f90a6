//! Error types for the cv-watcher crate.

use camino::Utf8PathBuf;

/// Errors raised while starting or running the project watcher.
///
/// Only [`WatchError::NonUtf8Path`] is recoverable: the offending event is
/// dropped and watching continues. Everything else stops the watcher.
///
/// # Examples
///
/// ```
/// use cv_watcher::WatchError;
///
/// let err = WatchError::path_not_found("/srv/shop");
/// assert!(err.is_fatal());
/// assert_eq!(err.to_string(), "path does not exist: /srv/shop");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The notify backend failed.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The watched path does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// Watching is switched off in the configuration.
    #[error("file watching is disabled in the configuration")]
    Disabled,

    /// The watcher task ended without reporting back.
    #[error("event channel closed unexpectedly")]
    ChannelClosed,

    /// An event carried a path that is not UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// Canonicalizing the watched path failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a [`WatchError::PathNotFound`].
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Returns `true` if watching can continue past this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NonUtf8Path(_))
    }

    /// Returns `true` if the watcher has to stop.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// The path involved, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::PathNotFound(path) => Some(path),
            Self::Notify(_) | Self::Disabled | Self::ChannelClosed | Self::NonUtf8Path(_) | Self::Io(_) => None,
        }
    }
}
