//! Configuration structures for the convention index engine.
//!
//! This module provides configuration types for all components:
//!
//! - [`ProjectLayout`] - Where each kind of source lives inside the project
//! - [`WatchConfig`] - File watcher settings (debouncing, recursion)
//! - [`ValidationConfig`] - Near-match thresholds for rule diagnostics
//! - [`EngineConfig`] - Root configuration combining all settings
//!
//! The configuration is a plain value handed to the engine at construction.
//! Nothing in the workspace reads settings from ambient global state, so tests
//! can run against fixed configurations.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Locations of each source category, relative to the project root.
///
/// # Examples
///
/// ```
/// use cv_core::ProjectLayout;
///
/// let layout = ProjectLayout::default();
/// assert_eq!(layout.routes_dir, "routes");
/// assert_eq!(layout.migrations_dir, "database/migrations");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    /// Absolute or working-directory-relative path to the project root.
    pub root: Utf8PathBuf,

    /// Directory holding route-declaration files.
    pub routes_dir: String,

    /// Candidate directories holding model classes, searched in order.
    pub model_dirs: Vec<String>,

    /// Directory holding schema-migration scripts.
    pub migrations_dir: String,

    /// Directory holding templates.
    pub views_dir: String,

    /// Translation roots, each containing one subdirectory per locale.
    pub translation_roots: Vec<String>,

    /// Directory holding configuration-array files.
    pub config_dir: String,

    /// Environment declaration files.
    pub env_files: Vec<String>,

    /// Directories scanned for translation usages and validation rules.
    pub source_dirs: Vec<String>,

    /// Directory names never descended into.
    pub skip_dirs: Vec<String>,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            routes_dir: "routes".to_owned(),
            model_dirs: vec!["app/Models".to_owned(), "app".to_owned()],
            migrations_dir: "database/migrations".to_owned(),
            views_dir: "resources/views".to_owned(),
            translation_roots: vec!["lang".to_owned(), "resources/lang".to_owned()],
            config_dir: "config".to_owned(),
            env_files: vec![".env".to_owned(), ".env.example".to_owned()],
            source_dirs: vec![
                "app".to_owned(),
                "routes".to_owned(),
                "resources/views".to_owned(),
            ],
            skip_dirs: vec![
                "vendor".to_owned(),
                "node_modules".to_owned(),
                "storage".to_owned(),
                "bootstrap".to_owned(),
                ".git".to_owned(),
            ],
        }
    }
}

impl ProjectLayout {
    /// Joins a project-relative directory onto the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_core::ProjectLayout;
    /// use camino::Utf8PathBuf;
    ///
    /// let layout = ProjectLayout { root: Utf8PathBuf::from("/srv/app"), ..Default::default() };
    /// assert_eq!(layout.resolve("routes"), Utf8PathBuf::from("/srv/app/routes"));
    /// ```
    #[must_use]
    pub fn resolve(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Returns the absolute route directory.
    #[must_use]
    pub fn routes_path(&self) -> Utf8PathBuf {
        self.resolve(&self.routes_dir)
    }

    /// Returns the absolute migration directory.
    #[must_use]
    pub fn migrations_path(&self) -> Utf8PathBuf {
        self.resolve(&self.migrations_dir)
    }

    /// Returns the absolute configuration directory.
    #[must_use]
    pub fn config_path(&self) -> Utf8PathBuf {
        self.resolve(&self.config_dir)
    }

    /// Returns the absolute model directories.
    #[must_use]
    pub fn model_paths(&self) -> Vec<Utf8PathBuf> {
        self.model_dirs.iter().map(|d| self.resolve(d)).collect()
    }

    /// Returns the absolute translation roots.
    #[must_use]
    pub fn translation_paths(&self) -> Vec<Utf8PathBuf> {
        self.translation_roots.iter().map(|d| self.resolve(d)).collect()
    }

    /// Returns the absolute source directories.
    #[must_use]
    pub fn source_paths(&self) -> Vec<Utf8PathBuf> {
        self.source_dirs.iter().map(|d| self.resolve(d)).collect()
    }

    /// Returns the absolute environment files.
    #[must_use]
    pub fn env_paths(&self) -> Vec<Utf8PathBuf> {
        self.env_files.iter().map(|f| self.resolve(f)).collect()
    }
}

/// Configuration for the file watcher.
///
/// # Examples
///
/// ```
/// use cv_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.debounce_ms, 100);
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Whether file watching is enabled.
    pub enabled: bool,

    /// Debounce window in milliseconds.
    ///
    /// Multiple file changes within this window are batched into a single event.
    pub debounce_ms: u64,

    /// Whether to watch subdirectories recursively.
    pub recursive: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 100,
            recursive: true,
        }
    }
}

/// Settings for validation rule diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum normalized similarity (0.0..=1.0) for a near-match suggestion.
    pub similarity_threshold: f64,

    /// Maximum number of suggestions attached to one diagnostic.
    pub max_suggestions: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            max_suggestions: 5,
        }
    }
}

/// Root configuration for the convention index engine.
///
/// # Examples
///
/// ```
/// use cv_core::EngineConfig;
/// use camino::Utf8Path;
///
/// let config = EngineConfig::for_root(Utf8Path::new("/srv/app"));
/// assert_eq!(config.layout.root.as_str(), "/srv/app");
///
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("translation_roots"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Project layout.
    pub layout: ProjectLayout,

    /// File watcher configuration.
    pub watch: WatchConfig,

    /// Validation diagnostics configuration.
    pub validation: ValidationConfig,
}

impl EngineConfig {
    /// Creates a default configuration for the given project root.
    #[must_use]
    pub fn for_root(root: &Utf8Path) -> Self {
        Self {
            layout: ProjectLayout {
                root: root.to_owned(),
                ..ProjectLayout::default()
            },
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields take their defaults.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Checks that the configuration can drive an engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let root = &self.layout.root;
        if !root.exists() {
            return Err(ConfigError::RootNotFound(root.clone()));
        }
        if !root.is_dir() {
            return Err(ConfigError::RootNotDirectory(root.clone()));
        }

        let threshold = self.validation.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidOption {
                option: "validation.similarity_threshold".to_owned(),
                reason: format!("must be between 0 and 1, got {threshold}"),
            });
        }
        if self.validation.max_suggestions == 0 {
            return Err(ConfigError::InvalidOption {
                option: "validation.max_suggestions".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }

        Ok(())
    }
}
