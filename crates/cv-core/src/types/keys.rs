//! Configuration and environment keys.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Where a key was learned from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyOrigin {
    /// Seeded from the built-in list of framework defaults.
    WellKnown,
    /// Declared in a project file.
    File {
        /// Declaring file.
        path: Utf8PathBuf,
        /// 1-indexed line.
        line: u32,
    },
}

impl KeyOrigin {
    /// Returns `true` for keys declared in the project.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

/// A dotted configuration key such as `app.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    /// Flat, file-namespaced key.
    pub key: String,
    /// String value, when the leaf is a literal.
    pub value: Option<String>,
    /// Provenance.
    pub origin: KeyOrigin,
}

/// An environment variable name such as `APP_ENV`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvKey {
    /// Variable name.
    pub key: String,
    /// Declared value, if any.
    pub value: Option<String>,
    /// Provenance.
    pub origin: KeyOrigin,
}
