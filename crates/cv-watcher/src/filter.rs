//! Path filters applied on the watcher thread.
//!
//! Events are filtered before they reach the channel, so the consumer only
//! sees files that can affect the index.

use camino::{Utf8Path, Utf8PathBuf};
use smallvec::SmallVec;

/// Decides whether a changed path is forwarded.
///
/// Filters run on the blocking watcher thread, hence the `Send + Sync +
/// 'static` bound.
///
/// # Examples
///
/// ```
/// use cv_watcher::FileFilter;
/// use camino::Utf8Path;
///
/// struct OnlyMigrations;
///
/// impl FileFilter for OnlyMigrations {
///     fn should_process(&self, path: &Utf8Path) -> bool {
///         path.as_str().contains("database/migrations/")
///     }
/// }
///
/// assert!(OnlyMigrations.should_process(Utf8Path::new("database/migrations/x.php")));
/// ```
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if the event for `path` should be forwarded.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// Forwards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilter;

impl FileFilter for AcceptAllFilter {
    #[inline]
    fn should_process(&self, _path: &Utf8Path) -> bool {
        true
    }
}

/// Forwards files whose extension is listed.
///
/// # Examples
///
/// ```
/// use cv_watcher::{ExtensionFilter, FileFilter};
/// use camino::Utf8Path;
///
/// let filter = ExtensionFilter::new(&["php"]);
/// assert!(filter.should_process(Utf8Path::new("routes/api.php")));
/// assert!(!filter.should_process(Utf8Path::new("lang/en.json")));
/// ```
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: SmallVec<[String; 8]>,
}

impl ExtensionFilter {
    /// Accepts the given extensions, without leading dots.
    #[must_use]
    pub fn new(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl FileFilter for ExtensionFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// The default filter for a framework project.
///
/// Forwards `.php` and `.json` files plus `.env*` files, and drops anything
/// below an excluded directory (`vendor`, `node_modules`, `storage` by
/// default).
///
/// # Examples
///
/// ```
/// use cv_watcher::{FileFilter, ProjectFilter};
/// use camino::Utf8Path;
///
/// let filter = ProjectFilter::default();
/// assert!(filter.should_process(Utf8Path::new("/srv/shop/app/Models/Order.php")));
/// assert!(filter.should_process(Utf8Path::new("/srv/shop/.env")));
/// assert!(!filter.should_process(Utf8Path::new("/srv/shop/vendor/laravel/framework/src/Foo.php")));
/// assert!(!filter.should_process(Utf8Path::new("/srv/shop/public/app.css")));
/// ```
#[derive(Debug, Clone)]
pub struct ProjectFilter {
    extensions: SmallVec<[&'static str; 4]>,
    excluded_dirs: SmallVec<[String; 8]>,
    root: Option<Utf8PathBuf>,
}

impl ProjectFilter {
    /// Creates the filter with the default exclusions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extensions: SmallVec::from_slice(&["php", "json"]),
            excluded_dirs: ["vendor", "node_modules", "storage"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            root: None,
        }
    }

    /// Matches exclusions against paths relative to `root` only.
    ///
    /// Without a root every directory of an absolute path is checked, so a
    /// project living under e.g. `/srv/storage/` would be dropped entirely.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_watcher::{FileFilter, ProjectFilter};
    /// use camino::Utf8Path;
    ///
    /// let filter = ProjectFilter::default().with_root("/srv/storage/shop");
    /// assert!(filter.should_process(Utf8Path::new("/srv/storage/shop/routes/web.php")));
    /// assert!(!filter.should_process(Utf8Path::new("/srv/storage/shop/storage/logs/x.php")));
    /// ```
    #[must_use]
    pub fn with_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Adds directory names to exclude, e.g. a layout's skip list.
    #[must_use]
    pub fn with_excluded_dirs<S: AsRef<str>>(mut self, dirs: &[S]) -> Self {
        for dir in dirs {
            let dir = dir.as_ref();
            if !self.excluded_dirs.iter().any(|d| d == dir) {
                self.excluded_dirs.push(dir.to_owned());
            }
        }
        self
    }

    fn is_excluded(&self, path: &Utf8Path) -> bool {
        let path = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        path.parent().is_some_and(|parent| {
            parent
                .components()
                .any(|c| self.excluded_dirs.iter().any(|d| d == c.as_str()))
        })
    }
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileFilter for ProjectFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        let relevant = path.file_name().is_some_and(|name| name.starts_with(".env"))
            || path
                .extension()
                .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext));
        relevant && !self.is_excluded(path)
    }
}

/// Forwards a path only if every inner filter does.
///
/// An empty composite forwards everything.
///
/// # Examples
///
/// ```
/// use cv_watcher::{CompositeFilter, ExtensionFilter, FileFilter, ProjectFilter};
/// use camino::Utf8Path;
///
/// let filter = CompositeFilter::new()
///     .and(ProjectFilter::default())
///     .and(ExtensionFilter::new(&["php"]));
/// assert!(filter.should_process(Utf8Path::new("config/app.php")));
/// assert!(!filter.should_process(Utf8Path::new("lang/en.json")));
/// ```
#[derive(Default)]
pub struct CompositeFilter {
    filters: Vec<Box<dyn FileFilter>>,
}

impl CompositeFilter {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter.
    #[must_use]
    pub fn and<F: FileFilter>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl std::fmt::Debug for CompositeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeFilter")
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl FileFilter for CompositeFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        self.filters.iter().all(|f| f.should_process(path))
    }
}

impl<F: FileFilter + ?Sized> FileFilter for Box<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}

impl<F: FileFilter + ?Sized> FileFilter for std::sync::Arc<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_project_filter_kinds() {
        let filter = ProjectFilter::default();
        assert!(filter.should_process(Utf8Path::new("routes/web.php")));
        assert!(filter.should_process(Utf8Path::new("resources/views/home.blade.php")));
        assert!(filter.should_process(Utf8Path::new("lang/fr.json")));
        assert!(filter.should_process(Utf8Path::new(".env.example")));
        assert!(!filter.should_process(Utf8Path::new("resources/js/app.ts")));
        assert!(!filter.should_process(Utf8Path::new("README.md")));
    }

    #[test]
    fn test_project_filter_exclusions() {
        let filter = ProjectFilter::default();
        assert!(!filter.should_process(Utf8Path::new("storage/framework/views/abc.php")));
        assert!(!filter.should_process(Utf8Path::new("node_modules/pkg/package.json")));
        assert!(filter.should_process(Utf8Path::new("app/Services/storage.php")));

        let filter = filter.with_excluded_dirs(&["bootstrap"]);
        assert!(!filter.should_process(Utf8Path::new("bootstrap/cache/packages.php")));
    }

    #[test]
    fn test_project_filter_root_relative_exclusions() {
        let filter = ProjectFilter::default().with_root("/srv/storage/shop");
        assert!(filter.should_process(Utf8Path::new("/srv/storage/shop/routes/web.php")));
        assert!(filter.should_process(Utf8Path::new("/srv/storage/shop/.env")));
        assert!(!filter.should_process(Utf8Path::new("/srv/storage/shop/vendor/x.php")));
        assert!(!filter.should_process(Utf8Path::new("/srv/storage/shop/storage/framework/a.php")));

        // Without a root the enclosing directory hides the whole project.
        assert!(!ProjectFilter::default().should_process(Utf8Path::new("/srv/storage/shop/routes/web.php")));
    }

    #[test]
    fn test_composite_and_shared() {
        assert!(CompositeFilter::new().should_process(Utf8Path::new("anything")));

        let shared: Arc<dyn FileFilter> = Arc::new(ExtensionFilter::new(&["json"]));
        let filter = CompositeFilter::new().and(AcceptAllFilter).and(shared);
        assert!(filter.should_process(Utf8Path::new("lang/en.json")));
        assert!(!filter.should_process(Utf8Path::new("lang/en/auth.php")));
    }
}
