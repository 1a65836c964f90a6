//! Configuration errors.

use camino::Utf8PathBuf;

/// Why an [`EngineConfig`](crate::EngineConfig) could not be loaded or used.
///
/// # Examples
///
/// ```
/// use cv_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::RootNotFound(Utf8PathBuf::from("/srv/shop"));
/// assert_eq!(error.to_string(), "project root does not exist: /srv/shop");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The project root is missing.
    #[error("project root does not exist: {0}")]
    RootNotFound(Utf8PathBuf),

    /// The project root is a file.
    #[error("project root is not a directory: {0}")]
    RootNotDirectory(Utf8PathBuf),

    /// An option is out of range.
    #[error("invalid value for '{option}': {reason}")]
    InvalidOption {
        /// Dotted option name, e.g. `validation.similarity_threshold`.
        option: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Config file.
        path: Utf8PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`EngineConfig`](crate::EngineConfig).
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        /// Config file.
        path: Utf8PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// The file or directory the error is about, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::RootNotFound(path)
            | Self::RootNotDirectory(path)
            | Self::Read { path, .. }
            | Self::Parse { path, .. } => Some(path),
            Self::InvalidOption { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_message() {
        let error = ConfigError::InvalidOption {
            option: "validation.max_suggestions".to_owned(),
            reason: "must be positive".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "invalid value for 'validation.max_suggestions': must be positive"
        );
        assert!(error.path().is_none());
    }

    #[test]
    fn test_parse_error_keeps_path() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = ConfigError::Parse {
            path: Utf8PathBuf::from("convidx.json"),
            source,
        };
        assert!(error.to_string().starts_with("cannot parse config file convidx.json"));
        assert_eq!(error.path().map(|p| p.as_str()), Some("convidx.json"));
    }
}
