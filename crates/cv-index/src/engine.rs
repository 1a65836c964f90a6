//! The engine: domain rebuilds and the read-only query surface.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cv_core::{Domain, EngineConfig};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info};

use crate::builders::{
    FileError, build_catalog, build_keys, build_routes, build_rule_usages, build_schema, build_usages,
};
use crate::config_keys::KeyTable;
use crate::error::IndexError;
use crate::routes::RouteTable;
use crate::schema::SchemaTable;
use crate::store::IndexStore;
use crate::translations::TranslationIndex;
use crate::validation::{RuleRegistry, ValidationIndex};

/// The outcome of rebuilding one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Rebuilt domain.
    pub domain: Domain,
    /// Files read.
    pub files: usize,
    /// Files skipped.
    pub errors: Vec<FileError>,
    /// Wall time.
    pub elapsed: Duration,
}

/// Entity counts across the published tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    /// Routes.
    pub routes: usize,
    /// Distinct route names.
    pub named_routes: usize,
    /// Models.
    pub models: usize,
    /// Migration-defined tables.
    pub tables: usize,
    /// Observed locales.
    pub locales: usize,
    /// Catalog entries across locales.
    pub translation_entries: usize,
    /// Translation calls in source.
    pub translation_usages: usize,
    /// Used keys defined nowhere.
    pub missing_translations: usize,
    /// Entries nothing references.
    pub unused_translations: usize,
    /// Validated fields found in source.
    pub validation_usages: usize,
    /// Validated fields with at least one diagnostic.
    pub validation_diagnostics: usize,
    /// Configuration keys.
    pub config_keys: usize,
    /// Environment variables.
    pub env_keys: usize,
}

/// Owns the configuration, the rule registry and the published snapshots.
///
/// Rebuilds are serialized; queries never wait for them.
///
/// # Examples
///
/// ```no_run
/// use cv_core::EngineConfig;
/// use cv_index::Engine;
/// use camino::Utf8Path;
///
/// let engine = Engine::new(EngineConfig::for_root(Utf8Path::new("/srv/shop")))?;
/// engine.build_all()?;
/// for route in engine.routes().routes_for_action("OrderController", "show") {
///     println!("{} {}", route.uri, route.name.as_deref().unwrap_or("-"));
/// }
/// # Ok::<(), cv_index::IndexError>(())
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    registry: RuleRegistry,
    store: IndexStore,
    rebuild_lock: Mutex<()>,
}

impl Engine {
    /// Validates `config` and builds the static rule registry.
    ///
    /// Nothing is indexed until [`build_all`](Self::build_all) or
    /// [`rebuild`](Self::rebuild) runs.
    pub fn new(config: EngineConfig) -> Result<Self, IndexError> {
        config.validate()?;
        let registry = RuleRegistry::with_config(config.validation);
        info!(
            root = %config.layout.root,
            rules = registry.all().len(),
            "Engine initialized"
        );
        Ok(Self {
            config,
            registry,
            store: IndexStore::new(),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// The configuration the engine was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The static rule catalog.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Rebuilds every domain in [`Domain::ALL`] order.
    ///
    /// Stops at the first fatal error; domains rebuilt before it stay
    /// published.
    pub fn build_all(&self) -> Result<Vec<RebuildReport>, IndexError> {
        info!(root = %self.config.layout.root, "Starting full build");
        let reports = Domain::ALL
            .iter()
            .map(|&domain| self.rebuild(domain))
            .collect::<Result<Vec<_>, _>>()?;
        let skipped: usize = reports.iter().map(|r| r.errors.len()).sum();
        info!(
            files = reports.iter().map(|r| r.files).sum::<usize>(),
            errors = skipped,
            "Full build completed"
        );
        Ok(reports)
    }

    /// Fully re-extracts one domain and publishes it.
    ///
    /// A Schema rebuild also re-runs validation diagnostics against the new
    /// table list. On error the previous snapshot stays published.
    pub fn rebuild(&self, domain: Domain) -> Result<RebuildReport, IndexError> {
        let _guard = self.rebuild_lock.lock();
        let started = Instant::now();
        let layout = &self.config.layout;

        let (files, errors) = match domain {
            Domain::Routes => {
                let built = build_routes(layout)?;
                self.store.publish_routes(built.table);
                (built.files, built.errors)
            }
            Domain::Schema => {
                let built = build_schema(layout)?;
                self.store.publish_schema(built.table);
                let schema = self.store.schema();
                let rediagnosed = self
                    .store
                    .validation()
                    .rediagnose(&self.registry, &schema.table_names());
                self.store.publish_validation(rediagnosed);
                (built.files, built.errors)
            }
            Domain::Translations => {
                let built = build_catalog(layout)?;
                self.store.publish_catalog(built.table);
                (built.files, built.errors)
            }
            Domain::TranslationUsages => {
                let built = build_usages(layout)?;
                self.store.publish_usages(built.table);
                (built.files, built.errors)
            }
            Domain::Validation => {
                let built = build_rule_usages(layout)?;
                let schema = self.store.schema();
                let index = ValidationIndex::build(&self.registry, built.table, &schema.table_names());
                self.store.publish_validation(index);
                (built.files, built.errors)
            }
            Domain::Config => {
                let built = build_keys(layout)?;
                self.store.publish_keys(built.table);
                (built.files, built.errors)
            }
        };

        let elapsed = started.elapsed();
        info!(
            domain = %domain,
            files,
            errors = errors.len(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Rebuilt domain"
        );
        Ok(RebuildReport {
            domain,
            files,
            errors,
            elapsed,
        })
    }

    /// Rebuilds each of `domains` once, in [`Domain::ALL`] order.
    ///
    /// A domain that fails keeps its previous snapshot and is left out of
    /// the result.
    pub fn rebuild_domains(&self, domains: &[Domain]) -> Vec<RebuildReport> {
        Domain::ALL
            .iter()
            .filter(|domain| domains.contains(domain))
            .filter_map(|&domain| match self.rebuild(domain) {
                Ok(report) => Some(report),
                Err(e) => {
                    error!(domain = %domain, error = %e, "Rebuild failed, keeping previous snapshot");
                    None
                }
            })
            .collect()
    }

    /// Current route table.
    #[must_use]
    pub fn routes(&self) -> Arc<RouteTable> {
        self.store.routes()
    }

    /// Current schema.
    #[must_use]
    pub fn schema(&self) -> Arc<SchemaTable> {
        self.store.schema()
    }

    /// Current reconciled translations.
    #[must_use]
    pub fn translations(&self) -> Arc<TranslationIndex> {
        self.store.translations()
    }

    /// Current validation reports.
    #[must_use]
    pub fn validation(&self) -> Arc<ValidationIndex> {
        self.store.validation()
    }

    /// Current config and env keys.
    #[must_use]
    pub fn keys(&self) -> Arc<KeyTable> {
        self.store.keys()
    }

    /// Counts entities across the current snapshots.
    #[must_use]
    pub fn summary(&self) -> IndexSummary {
        let routes = self.routes();
        let schema = self.schema();
        let translations = self.translations();
        let validation = self.validation();
        let keys = self.keys();
        IndexSummary {
            routes: routes.len(),
            named_routes: routes.names_with_prefix("").len(),
            models: schema.all_models().len(),
            tables: schema.tables().len(),
            locales: translations.locales().len(),
            translation_entries: translations.entry_count(),
            translation_usages: translations.usage_count(),
            missing_translations: translations.missing().len(),
            unused_translations: translations.unused().len(),
            validation_usages: validation.len(),
            validation_diagnostics: validation.with_diagnostics().len(),
            config_keys: keys.all_config_keys().len(),
            env_keys: keys.all_env_keys().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;

    fn write(root: &Utf8PathBuf, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, Engine) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        write(
            &root,
            "routes/web.php",
            "<?php\nRoute::get('/', [HomeController::class, 'index'])->name('home');\n",
        );
        write(
            &root,
            "database/migrations/2024_01_01_000000_create_posts_table.php",
            "<?php\nSchema::create('posts', function (Blueprint $table) {\n    $table->id();\n    $table->string('title');\n    $table->timestamps();\n});\n",
        );
        write(
            &root,
            "app/Models/Post.php",
            "<?php\nclass Post extends Model\n{\n    protected $fillable = ['title'];\n}\n",
        );
        write(
            &root,
            "app/Http/Requests/StorePostRequest.php",
            "<?php\nclass StorePostRequest extends FormRequest\n{\n    public function rules(): array\n    {\n        return [\n            'title' => 'required|strng',\n        ];\n    }\n}\n",
        );
        write(&root, "lang/en.json", "{\"Welcome\": \"Welcome\"}");
        write(
            &root,
            "resources/views/home.blade.php",
            "<h1>{{ __('Welcome') }}</h1>\n<p>{{ __('messages.missing') }}</p>\n",
        );
        let engine = Engine::new(EngineConfig::for_root(&root)).unwrap();
        (dir, engine)
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let config = EngineConfig::for_root(camino::Utf8Path::new("/definitely/not/here"));
        let err = Engine::new(config).unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_summary_after_full_build() {
        let (_dir, engine) = fixture();
        let reports = engine.build_all().unwrap();
        assert_eq!(reports.len(), Domain::ALL.len());
        assert!(reports.iter().all(|r| r.errors.is_empty()));

        insta::assert_json_snapshot!(engine.summary(), @r#"
        {
          "routes": 1,
          "named_routes": 1,
          "models": 1,
          "tables": 1,
          "locales": 1,
          "translation_entries": 1,
          "translation_usages": 2,
          "missing_translations": 1,
          "unused_translations": 0,
          "validation_usages": 1,
          "validation_diagnostics": 1,
          "config_keys": 44,
          "env_keys": 35
        }
        "#);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let (_dir, engine) = fixture();
        engine.build_all().unwrap();
        let routes = engine.routes();
        let schema = engine.schema();
        let translations = engine.translations();
        let validation = engine.validation();

        for domain in Domain::ALL {
            engine.rebuild(domain).unwrap();
        }
        assert_eq!(engine.routes().all(), routes.all());
        assert_eq!(engine.schema().all_models(), schema.all_models());
        assert_eq!(engine.translations().all_entries(), translations.all_entries());
        assert_eq!(engine.validation().all(), validation.all());
    }

    #[test]
    fn test_schema_rebuild_rediagnoses_validation() {
        let (dir, engine) = fixture();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        write(
            &root,
            "app/Http/Requests/StoreCommentRequest.php",
            "<?php\nclass StoreCommentRequest extends FormRequest\n{\n    public function rules(): array\n    {\n        return ['post_id' => 'exists:articles,id'];\n    }\n}\n",
        );
        engine.build_all().unwrap();
        let flagged = |engine: &Engine| {
            engine
                .validation()
                .with_diagnostics()
                .into_iter()
                .map(|r| r.field.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(flagged(&engine), vec!["post_id", "title"]);

        write(
            &root,
            "database/migrations/2024_01_02_000000_create_articles_table.php",
            "<?php\nSchema::create('articles', function (Blueprint $table) {\n    $table->id();\n});\n",
        );
        let report = engine.rebuild(Domain::Schema).unwrap();
        assert_eq!(report.domain, Domain::Schema);
        assert_eq!(flagged(&engine), vec!["title"]);
    }

    #[test]
    fn test_rebuild_domains_runs_each_once_in_order() {
        let (_dir, engine) = fixture();
        let reports = engine.rebuild_domains(&[Domain::Config, Domain::Routes, Domain::Routes]);
        let domains: Vec<_> = reports.iter().map(|r| r.domain).collect();
        assert_eq!(domains, vec![Domain::Routes, Domain::Config]);
    }
}
