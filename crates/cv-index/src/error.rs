//! Error types for the cv-index crate.
//!
//! This module provides the [`IndexError`] type for errors that can occur
//! while walking a project and building its index.

use camino::Utf8PathBuf;
use cv_core::ConfigError;
use cv_extract::ExtractError;

/// Errors that can occur while building the index.
///
/// # Error Recovery Strategy
///
/// - **Read errors** ([`IndexError::Read`]): log, skip the file, keep building
/// - **Extract errors** ([`IndexError::Extract`]): log, skip the file, keep building
/// - Everything else aborts the rebuild; the previous snapshot stays published
///
/// # Examples
///
/// ```
/// use cv_index::IndexError;
/// use std::io;
///
/// let err = IndexError::read("lang/en/auth.php", io::Error::new(io::ErrorKind::NotFound, "gone"));
/// assert!(err.is_recoverable());
/// assert_eq!(err.path().map(|p| p.as_str()), Some("lang/en/auth.php"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A structured file (array literal, JSON) was malformed.
    #[error("failed to extract {path}: {source}")]
    Extract {
        /// The path of the malformed file.
        path: Utf8PathBuf,
        /// What went wrong.
        #[source]
        source: ExtractError,
    },

    /// The engine configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// A watched-path pattern failed to compile.
    #[error("invalid path pattern: {0}")]
    Pattern(#[from] globset::Error),
}

impl IndexError {
    /// Creates a new [`IndexError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`IndexError::Extract`] error.
    #[inline]
    pub fn extract(path: impl Into<Utf8PathBuf>, source: ExtractError) -> Self {
        Self::Extract {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the rebuild can continue past this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Extract { .. })
    }

    /// Returns `true` if this error aborts the rebuild.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Extract { path, .. } => Some(path),
            Self::Walk(_) | Self::Config(_) | Self::NonUtf8Path(_) | Self::Pattern(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_index_error_extract() {
        let err = IndexError::extract("config/app.php", ExtractError::MissingReturn);
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
        assert_eq!(err.path().map(|p| p.as_str()), Some("config/app.php"));
        assert!(err.to_string().contains("config/app.php"));
    }

    #[test]
    fn test_index_error_read() {
        let err = IndexError::read("routes/web.php", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("routes/web.php"));
    }

    #[test]
    fn test_index_error_config_is_fatal() {
        let err = IndexError::from(ConfigError::RootNotFound(Utf8PathBuf::from("/nowhere")));
        assert!(err.is_fatal());
        assert!(err.path().is_none());
        assert!(err.to_string().contains("/nowhere"));
    }

    #[test]
    fn test_index_error_non_utf8() {
        let err = IndexError::NonUtf8Path(std::path::PathBuf::from("bad"));
        assert!(err.is_fatal());
        assert!(err.path().is_none());
    }
}
