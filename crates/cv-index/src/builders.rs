//! Per-domain extraction.
//!
//! Each builder walks the directories its domain owns, reads and extracts
//! files in parallel, and assembles a complete table. Files that cannot be
//! read or parsed are skipped and reported; everything else still lands in
//! the table.

use camino::{Utf8Path, Utf8PathBuf};
use cv_core::{FxHashMap, FxHashSet, ProjectLayout, TranslationEntry};
use cv_extract::config_keys::{env_references, extract_config_keys, parse_env_file};
use cv_extract::migration::extract_migration;
use cv_extract::model::extract_model;
use cv_extract::routes::extract_routes;
use cv_extract::translation::{extract_json_catalog, extract_php_catalog, scan_usages};
use cv_extract::validation::extract_rule_usages;
use cv_extract::{ModelClass, RuleUsage};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config_keys::{KeyTable, KeyTableBuilder};
use crate::error::IndexError;
use crate::routes::RouteTable;
use crate::schema::{SchemaTable, TableSet};
use crate::translations::{Catalog, CatalogFormat, CatalogSource, UsageTable};
use crate::walker::FileWalker;

const PHP: &[&str] = &[".php"];
const CATALOG_SUFFIXES: &[&str] = &[".php", ".json"];

/// A file skipped during a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    /// The skipped file.
    pub path: Utf8PathBuf,
    /// Why it was skipped.
    pub message: String,
}

impl FileError {
    fn from_error(fallback: &Utf8Path, error: &IndexError) -> Self {
        Self {
            path: error.path().cloned().unwrap_or_else(|| fallback.to_owned()),
            message: error.to_string(),
        }
    }
}

/// A freshly built table with its bookkeeping.
#[derive(Debug)]
pub struct Built<T> {
    /// The table.
    pub table: T,
    /// Number of files read.
    pub files: usize,
    /// Files skipped.
    pub errors: Vec<FileError>,
}

/// Walks `dirs` in order, keeping the first occurrence of each path.
fn collect(layout: &ProjectLayout, dirs: &[Utf8PathBuf], suffixes: &[&str]) -> Result<Vec<Utf8PathBuf>, IndexError> {
    let mut seen = FxHashSet::default();
    let mut paths = Vec::new();
    for dir in dirs {
        let found = FileWalker::new(dir)
            .with_suffixes(suffixes)
            .with_skip_dirs(&layout.skip_dirs)
            .collect_paths()?;
        paths.extend(found.into_iter().filter(|p| seen.insert(p.clone())));
    }
    Ok(paths)
}

/// Orders paths by file name, then by full path for equal names.
///
/// Migration names carry their timestamp, so this is replay order even when
/// migrations sit in subdirectories.
fn sort_by_file_name(paths: &mut [Utf8PathBuf]) {
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
}

/// Reads and extracts every path in parallel, preserving input order.
///
/// Recoverable failures are logged and returned beside the successes.
fn extract_all<T, F>(paths: &[Utf8PathBuf], extract: F) -> (Vec<(Utf8PathBuf, T)>, Vec<FileError>)
where
    T: Send,
    F: Fn(&Utf8Path, &str) -> Result<T, IndexError> + Sync,
{
    let results: Vec<(Utf8PathBuf, Result<T, IndexError>)> = paths
        .par_iter()
        .map(|path| {
            let result = std::fs::read_to_string(path)
                .map_err(|e| IndexError::read(path.clone(), e))
                .and_then(|content| extract(path, &content));
            (path.clone(), result)
        })
        .collect();

    let mut items = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (path, result) in results {
        match result {
            Ok(item) => {
                debug!(path = %path, "Extracted file");
                items.push((path, item));
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to extract file");
                errors.push(FileError::from_error(&path, &e));
            }
        }
    }
    (items, errors)
}

/// Builds the route table from the route directory.
pub fn build_routes(layout: &ProjectLayout) -> Result<Built<RouteTable>, IndexError> {
    let paths = collect(layout, &[layout.routes_path()], PHP)?;
    let (items, errors) = extract_all(&paths, |path, content| Ok(extract_routes(content, path)));
    let routes = items.into_iter().flat_map(|(_, routes)| routes).collect();
    Ok(Built {
        table: RouteTable::from_routes(routes),
        files: paths.len(),
        errors,
    })
}

/// Replays migrations in file-name order and merges them into the models.
pub fn build_schema(layout: &ProjectLayout) -> Result<Built<SchemaTable>, IndexError> {
    let mut migrations = collect(layout, &[layout.migrations_path()], PHP)?;
    sort_by_file_name(&mut migrations);
    let (ops, mut errors) = extract_all(&migrations, |path, content| Ok(extract_migration(content, path)));
    let mut tables = TableSet::new();
    for op in ops.into_iter().flat_map(|(_, ops)| ops) {
        tables.apply(op);
    }

    let model_files = collect(layout, &layout.model_paths(), PHP)?;
    let (classes, model_errors) = extract_all(&model_files, |path, content| {
        extract_model(content).map_err(|e| IndexError::extract(path, e))
    });
    errors.extend(model_errors);
    let classes: Vec<(Utf8PathBuf, ModelClass)> = classes
        .into_iter()
        .filter_map(|(path, class)| class.map(|c| (path, c)))
        .collect();

    Ok(Built {
        table: SchemaTable::build(tables, &classes),
        files: migrations.len() + model_files.len(),
        errors,
    })
}

/// Reads every catalog file under the translation roots.
pub fn build_catalog(layout: &ProjectLayout) -> Result<Built<Catalog>, IndexError> {
    let mut sources: FxHashMap<Utf8PathBuf, CatalogSource> = FxHashMap::default();
    let mut paths = Vec::new();
    for root in layout.translation_paths() {
        let walker = FileWalker::new(&root).with_suffixes(CATALOG_SUFFIXES);
        for path in walker.collect_paths()? {
            if let Some(source) = CatalogSource::classify(&root, &path) {
                paths.push(path.clone());
                sources.insert(path, source);
            }
        }
    }

    let (items, errors) = extract_all(&paths, |path, content| {
        let Some(source) = sources.get(path) else {
            return Ok(Vec::new());
        };
        let leaves = match &source.format {
            CatalogFormat::Php { namespace } => extract_php_catalog(content, namespace),
            CatalogFormat::Json { prefix } => extract_json_catalog(content, prefix),
        }
        .map_err(|e| IndexError::extract(path, e))?;

        Ok(leaves
            .into_iter()
            .map(|leaf| TranslationEntry {
                key: leaf.key,
                locale: source.locale.clone(),
                value: leaf.value,
                file: path.to_owned(),
                line: leaf.line,
                is_used: false,
            })
            .collect::<Vec<_>>())
    });

    let entries = items.into_iter().flat_map(|(_, entries)| entries).collect();
    Ok(Built {
        table: Catalog::from_entries(entries),
        files: paths.len(),
        errors,
    })
}

/// Scans the source directories for translation calls.
pub fn build_usages(layout: &ProjectLayout) -> Result<Built<UsageTable>, IndexError> {
    let paths = collect(layout, &layout.source_paths(), PHP)?;
    let (items, errors) = extract_all(&paths, |path, content| Ok(scan_usages(content, path)));
    let usages = items.into_iter().flat_map(|(_, usages)| usages).collect();
    Ok(Built {
        table: UsageTable::from_usages(usages),
        files: paths.len(),
        errors,
    })
}

/// Scans the source directories for validation rule arrays.
///
/// Templates are skipped; rule arrays live in classes.
pub fn build_rule_usages(layout: &ProjectLayout) -> Result<Built<Vec<(Utf8PathBuf, Vec<RuleUsage>)>>, IndexError> {
    let paths: Vec<Utf8PathBuf> = collect(layout, &layout.source_paths(), PHP)?
        .into_iter()
        .filter(|p| !p.as_str().ends_with(".blade.php"))
        .collect();
    let (items, errors) = extract_all(&paths, |path, content| {
        extract_rule_usages(content).map_err(|e| IndexError::extract(path, e))
    });
    let usages = items.into_iter().filter(|(_, u)| !u.is_empty()).collect();
    Ok(Built {
        table: usages,
        files: paths.len(),
        errors,
    })
}

/// Collects configuration and environment keys on top of the seeds.
pub fn build_keys(layout: &ProjectLayout) -> Result<Built<KeyTable>, IndexError> {
    let config_root = layout.config_path();
    let paths = collect(layout, std::slice::from_ref(&config_root), PHP)?;
    let (items, mut errors) = extract_all(&paths, |path, content| {
        let stem = config_namespace(&config_root, path);
        let nodes = extract_config_keys(content, &stem).map_err(|e| IndexError::extract(path, e))?;
        Ok((nodes, env_references(content)))
    });

    let mut builder = KeyTableBuilder::new();
    for (path, (nodes, references)) in items {
        builder.add_config_nodes(&path, nodes);
        builder.add_env_references(&path, references);
    }

    let mut files = paths.len();
    for env_file in layout.env_paths().into_iter().filter(|p| p.is_file()) {
        files += 1;
        match std::fs::read_to_string(&env_file) {
            Ok(content) => builder.add_env_file(&env_file, parse_env_file(&content)),
            Err(e) => {
                let error = IndexError::read(env_file.clone(), e);
                warn!(path = %env_file, error = %error, "Failed to read environment file");
                errors.push(FileError::from_error(&env_file, &error));
            }
        }
    }

    Ok(Built {
        table: builder.build(),
        files,
        errors,
    })
}

/// `config/app.php` → `app`; `config/services/stripe.php` → `services.stripe`.
fn config_namespace(root: &Utf8Path, path: &Utf8Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let relative = relative.as_str().strip_suffix(".php").unwrap_or(relative.as_str());
    relative.replace(['/', '\\'], ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> (tempfile::TempDir, ProjectLayout) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let layout = ProjectLayout {
            root,
            ..ProjectLayout::default()
        };
        (dir, layout)
    }

    fn write(layout: &ProjectLayout, relative: &str, content: &str) {
        let path = layout.resolve(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_empty_project_builds_empty_tables() {
        let (_dir, layout) = project();
        assert!(build_routes(&layout).unwrap().table.is_empty());
        assert!(build_schema(&layout).unwrap().table.all_models().is_empty());
        assert!(build_catalog(&layout).unwrap().table.is_empty());
        let keys = build_keys(&layout).unwrap();
        assert_eq!(keys.files, 0);
        assert!(keys.table.config_key("app.name").is_some());
    }

    #[test]
    fn test_malformed_catalog_is_skipped() {
        let (_dir, layout) = project();
        write(&layout, "lang/en.json", "{\"Welcome\": \"Welcome\"}");
        write(&layout, "lang/fr.json", "{ not json");
        write(&layout, "lang/en/auth.php", "<?php\nreturn ['failed' => 'Nope'];\n");

        let built = build_catalog(&layout).unwrap();
        assert_eq!(built.files, 3);
        assert_eq!(built.errors.len(), 1);
        assert!(built.errors[0].path.as_str().ends_with("fr.json"));
        assert_eq!(built.table.len(), 2);
        assert!(built.table.contains("auth.failed"));
        assert!(built.table.contains("Welcome"));
    }

    #[test]
    fn test_schema_from_migrations_and_models() {
        let (_dir, layout) = project();
        write(
            &layout,
            "database/migrations/2024_01_01_000000_create_posts_table.php",
            "<?php\nSchema::create('posts', function (Blueprint $table) {\n    $table->id();\n    $table->string('title');\n    $table->timestamps();\n});\n",
        );
        write(
            &layout,
            "app/Models/Post.php",
            "<?php\nclass Post extends Model\n{\n    protected $fillable = ['title'];\n}\n",
        );

        let built = build_schema(&layout).unwrap();
        assert!(built.errors.is_empty());
        assert_eq!(built.files, 2);
        let post = built.table.model("Post").unwrap();
        assert_eq!(post.table, "posts");
        assert!(post.field("title").is_some());
        assert_eq!(built.table.table_names(), vec!["posts"]);
    }

    #[test]
    fn test_migrations_replay_by_file_name_across_subdirectories() {
        let (_dir, layout) = project();
        write(
            &layout,
            "database/migrations/2024_03_01_000000_add_slug_to_posts_table.php",
            "<?php\nSchema::table('posts', function (Blueprint $table) {\n    $table->string('slug');\n});\n",
        );
        write(
            &layout,
            "database/migrations/archive/2023_01_01_000000_create_posts_table.php",
            "<?php\nSchema::create('posts', function (Blueprint $table) {\n    $table->id();\n    $table->string('title');\n});\n",
        );

        let built = build_schema(&layout).unwrap();
        let columns: Vec<&str> = built.table.columns("posts").iter().map(|c| c.column.as_str()).collect();
        assert!(columns.contains(&"title"));
        assert!(columns.contains(&"slug"));
    }

    #[test]
    fn test_sort_by_file_name() {
        let mut paths = vec![
            Utf8PathBuf::from("/m/2024_02_01_b.php"),
            Utf8PathBuf::from("/m/old/2023_01_01_a.php"),
            Utf8PathBuf::from("/m/2024_01_01_c.php"),
        ];
        sort_by_file_name(&mut paths);
        assert_eq!(
            paths,
            vec![
                Utf8PathBuf::from("/m/old/2023_01_01_a.php"),
                Utf8PathBuf::from("/m/2024_01_01_c.php"),
                Utf8PathBuf::from("/m/2024_02_01_b.php"),
            ]
        );
    }

    #[test]
    fn test_config_namespace() {
        let root = Utf8Path::new("/p/config");
        assert_eq!(config_namespace(root, Utf8Path::new("/p/config/app.php")), "app");
        assert_eq!(
            config_namespace(root, Utf8Path::new("/p/config/services/stripe.php")),
            "services.stripe"
        );
    }

    #[test]
    fn test_keys_from_config_and_env() {
        let (_dir, layout) = project();
        write(&layout, "config/shop.php", "<?php\nreturn ['currency' => env('SHOP_CURRENCY', 'EUR')];\n");
        write(&layout, ".env", "SHOP_CURRENCY=USD\n");

        let built = build_keys(&layout).unwrap();
        assert_eq!(built.files, 2);
        assert_eq!(
            built.table.config_key("shop.currency").map(|k| k.key.as_str()),
            Some("shop.currency")
        );
        assert_eq!(
            built.table.env_key("SHOP_CURRENCY").and_then(|k| k.value.as_deref()),
            Some("USD")
        );
    }
}
