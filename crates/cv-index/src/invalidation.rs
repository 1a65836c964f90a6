//! Change-driven domain invalidation.
//!
//! Each domain owns a set of glob patterns relative to the project root. A
//! changed path invalidates every domain whose patterns match it, whether
//! the file was created, modified or deleted. Invalidated domains are fully
//! re-extracted; there is no per-file patching.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cv_core::{Domain, ProjectLayout};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use smallvec::SmallVec;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::{Engine, RebuildReport};
use crate::error::IndexError;

/// Maps changed paths to the domains they invalidate.
///
/// # Examples
///
/// ```
/// use cv_core::{Domain, ProjectLayout};
/// use cv_index::InvalidationController;
/// use camino::Utf8Path;
///
/// let controller = InvalidationController::new(&ProjectLayout::default())?;
/// let domains = controller.classify(Utf8Path::new("database/migrations/2024_01_01_create_users.php"));
/// assert_eq!(domains.as_slice(), [Domain::Schema]);
/// # Ok::<(), cv_index::IndexError>(())
/// ```
#[derive(Debug, Clone)]
pub struct InvalidationController {
    /// The configured root and, when it differs, its canonical form.
    roots: SmallVec<[Utf8PathBuf; 2]>,
    domains: Vec<(Domain, GlobSet)>,
}

impl InvalidationController {
    /// Compiles the watched patterns of every domain.
    ///
    /// The root is also resolved to its canonical path so that absolute
    /// event paths match when the configured root is relative or reached
    /// through a symlink.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if a watched pattern is not a valid glob.
    pub fn new(layout: &ProjectLayout) -> Result<Self, IndexError> {
        let domains = Domain::ALL
            .iter()
            .map(|&domain| Ok((domain, compile(&patterns_for(layout, domain))?)))
            .collect::<Result<Vec<_>, IndexError>>()?;
        let mut roots = SmallVec::new();
        roots.push(layout.root.clone());
        match layout.root.canonicalize_utf8() {
            Ok(canonical) if canonical != layout.root => roots.push(canonical),
            Ok(_) => {}
            Err(e) => debug!(root = %layout.root, error = %e, "Project root not canonicalized"),
        }
        Ok(Self { roots, domains })
    }

    /// Domains invalidated by a change to `path`, in [`Domain::ALL`] order.
    ///
    /// `path` may be absolute (under the configured or canonical project
    /// root) or root-relative.
    #[must_use]
    pub fn classify(&self, path: &Utf8Path) -> SmallVec<[Domain; 6]> {
        let relative = self
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        self.domains
            .iter()
            .filter(|(_, set)| set.is_match(relative))
            .map(|(domain, _)| *domain)
            .collect()
    }

    /// The union of domains invalidated by `paths`, in [`Domain::ALL`] order.
    #[must_use]
    pub fn affected(&self, paths: &[Utf8PathBuf]) -> Vec<Domain> {
        let mut hit = [false; Domain::ALL.len()];
        for path in paths {
            for domain in self.classify(path) {
                if let Some(i) = Domain::ALL.iter().position(|d| *d == domain) {
                    hit[i] = true;
                }
            }
        }
        Domain::ALL
            .iter()
            .zip(hit)
            .filter_map(|(domain, hit)| hit.then_some(*domain))
            .collect()
    }

    /// Rebuilds the domains invalidated by `paths` on a blocking thread.
    pub async fn process(&self, engine: &Arc<Engine>, paths: &[Utf8PathBuf]) -> Vec<RebuildReport> {
        let domains = self.affected(paths);
        if domains.is_empty() {
            debug!(paths = paths.len(), "No domain affected by change");
            return Vec::new();
        }
        info!(paths = paths.len(), domains = ?domains, "Invalidating domains");

        let engine = Arc::clone(engine);
        match tokio::task::spawn_blocking(move || engine.rebuild_domains(&domains)).await {
            Ok(reports) => reports,
            Err(e) => {
                error!(error = %e, "Rebuild task failed");
                Vec::new()
            }
        }
    }

    /// Consumes change notifications until the sender side closes.
    ///
    /// Notifications queued while a rebuild runs are coalesced into the next
    /// round, so each affected domain rebuilds once per round.
    pub async fn run(self, engine: Arc<Engine>, mut rx: mpsc::Receiver<Vec<Utf8PathBuf>>) {
        while let Some(mut pending) = rx.recv().await {
            while let Ok(more) = rx.try_recv() {
                pending.extend(more);
            }
            pending.sort_unstable();
            pending.dedup();

            for report in self.process(&engine, &pending).await {
                for failure in &report.errors {
                    debug!(domain = %report.domain, path = %failure.path, error = %failure.message, "Skipped file");
                }
            }
        }
        debug!("Change queue closed, invalidation stopped");
    }
}

fn patterns_for(layout: &ProjectLayout, domain: Domain) -> Vec<String> {
    let php = |dir: &str| format!("{}/**/*.php", dir.trim_end_matches('/'));
    match domain {
        Domain::Routes => vec![php(&layout.routes_dir)],
        Domain::Schema => std::iter::once(php(&layout.migrations_dir))
            .chain(layout.model_dirs.iter().map(|d| php(d)))
            .collect(),
        Domain::Translations => layout
            .translation_roots
            .iter()
            .flat_map(|root| {
                let root = root.trim_end_matches('/');
                [format!("{root}/**/*.php"), format!("{root}/**/*.json")]
            })
            .collect(),
        Domain::TranslationUsages | Domain::Validation => layout.source_dirs.iter().map(|d| php(d)).collect(),
        Domain::Config => std::iter::once(php(&layout.config_dir))
            .chain(layout.env_files.iter().cloned())
            .collect(),
    }
}

fn compile(patterns: &[String]) -> Result<GlobSet, IndexError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::EngineConfig;
    use std::fs;

    fn controller() -> InvalidationController {
        InvalidationController::new(&ProjectLayout::default()).unwrap()
    }

    #[test]
    fn test_classify_by_convention() {
        let c = controller();
        let classify = |p: &str| c.classify(Utf8Path::new(p)).into_vec();

        assert_eq!(classify("routes/web.php"), vec![Domain::Routes, Domain::TranslationUsages, Domain::Validation]);
        assert_eq!(classify("routes/admin/users.php")[0], Domain::Routes);
        assert_eq!(classify("database/migrations/x.php"), vec![Domain::Schema]);
        assert_eq!(
            classify("app/Models/User.php"),
            vec![Domain::Schema, Domain::TranslationUsages, Domain::Validation]
        );
        assert_eq!(classify("lang/en/auth.php"), vec![Domain::Translations]);
        assert_eq!(classify("resources/lang/fr.json"), vec![Domain::Translations]);
        assert_eq!(
            classify("resources/views/home.blade.php"),
            vec![Domain::TranslationUsages, Domain::Validation]
        );
        assert_eq!(classify("config/app.php"), vec![Domain::Config]);
        assert_eq!(classify(".env"), vec![Domain::Config]);
        assert!(classify("public/index.php").is_empty());
        assert!(classify("README.md").is_empty());
    }

    #[test]
    fn test_absolute_paths_under_root() {
        let layout = ProjectLayout {
            root: Utf8PathBuf::from("/srv/app"),
            ..ProjectLayout::default()
        };
        let c = InvalidationController::new(&layout).unwrap();
        assert_eq!(c.classify(Utf8Path::new("/srv/app/config/mail.php")).as_slice(), [Domain::Config]);
    }

    #[test]
    fn test_relative_root_matches_canonical_event_paths() {
        let c = controller();
        let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir().unwrap().canonicalize().unwrap()).unwrap();
        assert_eq!(
            c.classify(&cwd.join("routes/web.php")).into_vec(),
            vec![Domain::Routes, Domain::TranslationUsages, Domain::Validation]
        );
        assert_eq!(c.classify(&cwd.join(".env")).as_slice(), [Domain::Config]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_matches_real_paths() {
        let dir = tempfile::tempdir().unwrap();
        let real = Utf8PathBuf::from_path_buf(dir.path().canonicalize().unwrap()).unwrap();
        fs::create_dir_all(real.join("project/config")).unwrap();
        let link = real.join("link");
        std::os::unix::fs::symlink(real.join("project"), &link).unwrap();

        let layout = ProjectLayout {
            root: link.clone(),
            ..ProjectLayout::default()
        };
        let c = InvalidationController::new(&layout).unwrap();
        assert_eq!(c.classify(&real.join("project/config/app.php")).as_slice(), [Domain::Config]);
        assert_eq!(c.classify(&link.join("config/app.php")).as_slice(), [Domain::Config]);
    }

    #[test]
    fn test_affected_is_ordered_union() {
        let c = controller();
        let paths = vec![
            Utf8PathBuf::from(".env"),
            Utf8PathBuf::from("lang/en.json"),
            Utf8PathBuf::from("database/migrations/x.php"),
            Utf8PathBuf::from("lang/en/auth.php"),
        ];
        assert_eq!(c.affected(&paths), vec![Domain::Schema, Domain::Translations, Domain::Config]);
    }

    #[tokio::test]
    async fn test_run_rebuilds_after_changes() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let engine = Arc::new(Engine::new(EngineConfig::for_root(&root)).unwrap());
        engine.build_all().unwrap();
        assert!(engine.routes().is_empty());

        fs::create_dir_all(root.join("routes")).unwrap();
        let web = root.join("routes/web.php");
        fs::write(&web, "<?php\nRoute::get('/ping', [PingController::class, 'show'])->name('ping');\n").unwrap();

        let controller = InvalidationController::new(&engine.config().layout).unwrap();
        let (tx, rx) = mpsc::channel(8);
        tx.send(vec![web.clone()]).await.unwrap();
        tx.send(vec![web]).await.unwrap();
        drop(tx);

        controller.run(Arc::clone(&engine), rx).await;
        assert_eq!(engine.routes().len(), 1);
        assert!(engine.routes().by_name("ping").is_some());
    }

    #[tokio::test]
    async fn test_process_ignores_unrelated_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let engine = Arc::new(Engine::new(EngineConfig::for_root(&root)).unwrap());
        let controller = InvalidationController::new(&engine.config().layout).unwrap();

        let reports = controller.process(&engine, &[root.join("public/robots.txt")]).await;
        assert!(reports.is_empty());
    }
}
