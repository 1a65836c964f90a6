//! Directory traversal for project sources.
//!
//! [`FileWalker`] wraps the `ignore` crate so walks respect `.gitignore`
//! patterns and skip hidden entries. Two things differ from a plain walk:
//!
//! - A directory that does not exist yields no files instead of an error,
//!   since every conventional directory is optional in a project.
//! - Results are sorted by full path, so extraction order is deterministic.
//!   Callers that need another order (migrations replay by file name) sort
//!   again.
//!
//! # Examples
//!
//! ```no_run
//! use cv_index::FileWalker;
//! use camino::Utf8Path;
//!
//! let translations = FileWalker::new(Utf8Path::new("/srv/shop/lang"))
//!     .with_suffixes(&[".php", ".json"])
//!     .collect_paths()?;
//! println!("Found {} catalog files", translations.len());
//! # Ok::<(), cv_index::IndexError>(())
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

use crate::error::IndexError;

/// Directories never worth descending into.
const SKIP_DIRECTORIES: &[&str] = &[".git", "node_modules"];

/// A file walker for one project directory.
///
/// # Examples
///
/// ```no_run
/// use cv_index::FileWalker;
/// use camino::Utf8Path;
///
/// let walker = FileWalker::new(Utf8Path::new("/project/app")).with_suffixes(&[".php"]);
/// for path in walker.collect_paths()? {
///     println!("{path}");
/// }
/// # Ok::<(), cv_index::IndexError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileWalker {
    root: Utf8PathBuf,
    skip_dirs: Vec<String>,
    suffixes: Vec<String>,
    follow_links: bool,
}

impl FileWalker {
    /// Creates a walker rooted at `root`. Accepts every file by default.
    ///
    /// The root is not checked here; a missing root walks as empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_index::FileWalker;
    /// use camino::Utf8Path;
    ///
    /// let walker = FileWalker::new(Utf8Path::new("routes"));
    /// assert_eq!(walker.root(), "routes");
    /// ```
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
            skip_dirs: Vec::new(),
            suffixes: Vec::new(),
            follow_links: false,
        }
    }

    /// Adds directory names to skip, matched against path components below
    /// the root. `.git` and `node_modules` are always skipped.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use cv_index::FileWalker;
    /// use camino::Utf8Path;
    ///
    /// let sources = FileWalker::new(Utf8Path::new("/srv/shop"))
    ///     .with_skip_dirs(&["vendor", "storage"])
    ///     .collect_paths()?;
    /// assert!(sources.iter().all(|p| !p.as_str().contains("/vendor/")));
    /// # Ok::<(), cv_index::IndexError>(())
    /// ```
    #[must_use]
    pub fn with_skip_dirs<S: AsRef<str>>(mut self, dirs: &[S]) -> Self {
        self.skip_dirs
            .extend(dirs.iter().map(|d| d.as_ref().to_owned()));
        self
    }

    /// Restricts results to file names ending in one of `suffixes`
    /// (`.php`, `.blade.php`, `.json`).
    #[must_use]
    pub fn with_suffixes(mut self, suffixes: &[&str]) -> Self {
        self.suffixes.extend(suffixes.iter().map(|s| (*s).to_owned()));
        self
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Collects matching file paths in sorted order.
    ///
    /// A root that is absent or not a directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Walk`] if traversal fails (for example an
    /// unreadable subdirectory) and [`IndexError::NonUtf8Path`] for paths
    /// that are not UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_index::FileWalker;
    /// use camino::Utf8Path;
    ///
    /// let paths = FileWalker::new(Utf8Path::new("/nonexistent/convidx")).collect_paths()?;
    /// assert!(paths.is_empty());
    /// # Ok::<(), cv_index::IndexError>(())
    /// ```
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, IndexError> {
        if !self.root.is_dir() {
            tracing::debug!(root = %self.root, "Directory absent, nothing to walk");
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for result in self.build_walker() {
            let entry = result?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| IndexError::NonUtf8Path(path.to_owned()))?;

            if !self.matches_suffix(utf8_path) || self.should_skip_path(utf8_path) {
                continue;
            }
            paths.push(utf8_path.to_owned());
        }

        paths.sort();
        Ok(paths)
    }

    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            .standard_filters(true)
            .follow_links(self.follow_links)
            .threads(1)
            .require_git(false)
            .build()
    }

    fn matches_suffix(&self, path: &Utf8Path) -> bool {
        self.suffixes.is_empty()
            || path
                .file_name()
                .is_some_and(|name| self.suffixes.iter().any(|s| name.ends_with(s.as_str())))
    }

    fn should_skip_path(&self, path: &Utf8Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative.components().any(|component| {
            let name = component.as_str();
            SKIP_DIRECTORIES.contains(&name) || self.skip_dirs.iter().any(|d| d == name)
        })
    }

    /// Returns the directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_missing_root_is_empty() {
        let walker = FileWalker::new(Utf8Path::new("/definitely/not/here"));
        assert!(walker.collect_paths().unwrap().is_empty());
    }

    #[test]
    fn test_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_root(&dir);
        fs::create_dir_all(root.join("vendor/pkg")).unwrap();
        fs::write(root.join("b.php"), "").unwrap();
        fs::write(root.join("a.php"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("vendor/pkg/c.php"), "").unwrap();

        let paths = FileWalker::new(&root)
            .with_suffixes(&[".php"])
            .with_skip_dirs(&["vendor"])
            .collect_paths()
            .unwrap();
        let names: Vec<_> = paths.iter().filter_map(|p| p.file_name()).collect();
        assert_eq!(names, vec!["a.php", "b.php"]);
    }

    #[test]
    fn test_skip_dirs_apply_below_root_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_root(&dir).join("vendor");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("x.php"), "").unwrap();

        let paths = FileWalker::new(&root)
            .with_skip_dirs(&["vendor"])
            .collect_paths()
            .unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_compound_suffix() {
        let walker = FileWalker::new(Utf8Path::new(".")).with_suffixes(&[".blade.php"]);
        assert!(walker.matches_suffix(Utf8Path::new("views/home.blade.php")));
        assert!(!walker.matches_suffix(Utf8Path::new("views/home.php")));
    }
}
