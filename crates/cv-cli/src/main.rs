//! CLI entry point for the convention index engine.
//!
//! # Usage
//!
//! ```bash
//! # Index a project and print entity counts
//! convidx scan --path /srv/shop
//!
//! # Dump the whole index as JSON
//! convidx report --output index.json
//!
//! # Look things up
//! convidx query route-action OrderController@show
//! convidx query model Order
//! convidx query missing
//!
//! # Keep the index current while editing
//! convidx watch
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{WrapErr, eyre};
use cv_core::{EngineConfig, ProjectLayout};
use cv_index::{Engine, FileError, IndexSummary, InvalidationController, RebuildReport};
use cv_watcher::{FileWatcher, ProjectFilter};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Index the conventions of a framework project: routes, models, translations,
/// validation rules and configuration keys.
#[derive(Parser)]
#[command(name = "convidx", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Project root. Defaults to the configured root, then `.`.
    #[arg(short, long, global = true, env = "CONVIDX_PATH")]
    path: Option<Utf8PathBuf>,

    /// JSON configuration file (layout, watch and validation settings).
    #[arg(short, long, global = true, env = "CONVIDX_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print a summary.
    Scan,

    /// Write the whole index as JSON.
    Report {
        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Query the index; results are printed as JSON.
    Query {
        #[command(subcommand)]
        query: Query,
    },

    /// Build the index, then re-index on file changes until interrupted.
    Watch,
}

#[derive(Subcommand)]
enum Query {
    /// Routes whose name or URI starts with a prefix.
    Routes {
        /// Name or URI prefix; all routes when omitted.
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Routes bound to a controller action.
    RouteAction {
        /// `Controller@method`, with or without the namespace.
        action: String,
    },
    /// A model with its fields and related models.
    Model {
        /// Class name.
        name: String,
    },
    /// Catalog entries and usages of a translation key.
    Translation {
        /// Full key, e.g. `auth.failed`.
        key: String,
    },
    /// Keys used in source but defined in no locale.
    Missing,
    /// Catalog entries nothing references.
    Unused,
    /// Keys defined in some locales but not all.
    Incomplete,
    /// A validation rule definition, optionally pre-filled for a field.
    Rule {
        /// Rule name.
        name: String,
        /// Field to tailor the suggestion to.
        #[arg(long)]
        field: Option<String>,
    },
    /// Diagnose a pipe-delimited rule string.
    Diagnose {
        /// Rule string, e.g. `required|exists:users,id`.
        rules: String,
    },
    /// Configuration keys under a prefix.
    Config {
        /// Key prefix; all keys when omitted.
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Environment variables under a prefix.
    Env {
        /// Name prefix; all variables when omitted.
        #[arg(default_value = "")]
        prefix: String,
    },
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Installs the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects `debug`.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},notify=warn,globset=warn,ignore=warn"))
    });

    let use_ansi = !no_color && std::env::var_os("NO_COLOR").is_none();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Resolves the engine configuration from `--config` and `--path`.
fn build_config(cli: &Cli) -> color_eyre::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(file) => EngineConfig::load(file).wrap_err_with(|| format!("Failed to load config {file}"))?,
        None => EngineConfig::default(),
    };

    if let Some(path) = &cli.path {
        config.layout.root.clone_from(path);
    }
    if config.layout.root.as_str().is_empty() {
        config.layout.root = Utf8PathBuf::from(".");
    }

    let root = &config.layout.root;
    if !root.exists() {
        return Err(eyre!("Path does not exist: {root}"));
    }
    if !root.is_dir() {
        return Err(eyre!("Path is not a directory: {root}"));
    }

    Ok(config)
}

fn build_engine(config: EngineConfig) -> color_eyre::Result<Engine> {
    let engine = Engine::new(config)?;
    let reports = engine.build_all()?;
    log_reports(&reports);
    Ok(engine)
}

fn log_reports(reports: &[RebuildReport]) {
    for report in reports {
        debug!(
            domain = %report.domain,
            files = report.files,
            errors = report.errors.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "Domain indexed"
        );
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn run_scan(config: EngineConfig) -> color_eyre::Result<()> {
    info!(root = %config.layout.root, "Starting scan");

    let engine = Engine::new(config)?;
    let reports = engine.build_all()?;
    log_reports(&reports);

    print_summary(&engine.summary())?;

    let errors: Vec<&FileError> = reports.iter().flat_map(|r| &r.errors).collect();
    if !errors.is_empty() {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        writeln!(handle)?;
        writeln!(handle, "Skipped files ({}):", errors.len())?;
        for error in errors {
            writeln!(handle, "  {} - {}", error.path, error.message)?;
        }
    }

    Ok(())
}

fn run_report(config: EngineConfig, output: Option<&Utf8PathBuf>) -> color_eyre::Result<()> {
    info!(root = %config.layout.root, "Generating report");

    let engine = Engine::new(config)?;
    let reports = engine.build_all()?;
    log_reports(&reports);

    let content = generate_json_report(&engine, &reports)?;

    if let Some(output_path) = output {
        std::fs::write(output_path.as_std_path(), &content)
            .wrap_err_with(|| format!("Failed to write {output_path}"))?;
        info!(path = %output_path, "Report written");
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{content}")?;
    }

    Ok(())
}

fn run_query(config: EngineConfig, query: &Query) -> color_eyre::Result<()> {
    let engine = build_engine(config)?;

    match query {
        Query::Routes { prefix } => {
            let routes = engine.routes();
            let matches: Vec<_> = routes
                .all()
                .iter()
                .filter(|r| r.uri.starts_with(prefix.as_str()) || r.name.as_deref().is_some_and(|n| n.starts_with(prefix.as_str())))
                .collect();
            print_json(&matches)
        }
        Query::RouteAction { action } => {
            let (controller, method) = action
                .split_once('@')
                .ok_or_else(|| eyre!("Expected Controller@method, got {action}"))?;
            print_json(&engine.routes().routes_for_action(controller, method))
        }
        Query::Model { name } => {
            #[derive(Serialize)]
            struct ModelView<'a> {
                model: &'a cv_core::Model,
                related: Vec<&'a str>,
            }

            let schema = engine.schema();
            let model = schema.model(name).ok_or_else(|| eyre!("Unknown model: {name}"))?;
            let related = schema.related_models(name).into_iter().map(|m| m.name.as_str()).collect();
            print_json(&ModelView { model, related })
        }
        Query::Translation { key } => {
            #[derive(Serialize)]
            struct TranslationView<'a> {
                key: &'a str,
                entries: Vec<&'a cv_core::TranslationEntry>,
                usages: Vec<&'a cv_core::TranslationUsage>,
            }

            let translations = engine.translations();
            print_json(&TranslationView {
                key,
                entries: translations.entries(key),
                usages: translations.usages(key),
            })
        }
        Query::Missing => print_json(&engine.translations().missing()),
        Query::Unused => print_json(&engine.translations().unused()),
        Query::Incomplete => print_json(&engine.translations().incomplete()),
        Query::Rule { name, field } => {
            #[derive(Serialize)]
            struct RuleView<'a> {
                rule: &'a cv_core::ValidationRule,
                suggestion: Option<cv_index::RuleSuggestion>,
            }

            let registry = engine.registry();
            let rule = registry.rule(name).ok_or_else(|| eyre!("Unknown validation rule: {name}"))?;
            let suggestion = registry.suggest(name, field.as_deref().unwrap_or_default());
            print_json(&RuleView { rule, suggestion })
        }
        Query::Diagnose { rules } => {
            let schema = engine.schema();
            let tables = schema.table_names();
            print_json(&engine.registry().diagnose(rules, &tables))
        }
        Query::Config { prefix } => print_json(&engine.keys().config_keys_with_prefix(prefix)),
        Query::Env { prefix } => print_json(&engine.keys().env_keys_with_prefix(prefix)),
    }
}

/// Builds the index, then feeds watcher batches to the invalidation queue.
async fn run_watch(config: EngineConfig) -> color_eyre::Result<()> {
    info!(root = %config.layout.root, "Starting watch");

    let engine = Arc::new(tokio::task::spawn_blocking(move || build_engine(config)).await??);
    print_summary(&engine.summary())?;

    let layout = &engine.config().layout;
    let controller = InvalidationController::new(layout)?;
    let root = watch_root(&layout.root);
    let filter = project_filter(layout, &root);
    let mut watcher = FileWatcher::new(&root, &engine.config().watch, filter).await?;

    let (tx, rx) = mpsc::channel::<Vec<Utf8PathBuf>>(64);
    let invalidation = tokio::spawn(controller.run(Arc::clone(&engine), rx));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            batch = watcher.next_batch() => {
                let Some(batch) = batch else {
                    warn!("Watcher stopped unexpectedly");
                    break;
                };
                let paths = batch.into_unique_paths();
                debug!(paths = paths.len(), "Files changed");
                if tx.send(paths).await.is_err() {
                    warn!("Invalidation queue closed");
                    break;
                }
            }
            () = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    drop(tx);
    watcher.shutdown().await?;
    invalidation.await?;

    print_summary(&engine.summary())?;
    Ok(())
}

/// The root to watch: canonical when it resolves, so event paths are too.
fn watch_root(root: &Utf8Path) -> Utf8PathBuf {
    root.canonicalize_utf8().unwrap_or_else(|_| root.to_owned())
}

/// Skips the layout's excluded directories below `root`, never above it.
fn project_filter(layout: &ProjectLayout, root: &Utf8Path) -> ProjectFilter {
    ProjectFilter::default()
        .with_excluded_dirs(&layout.skip_dirs)
        .with_root(root)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "Cannot listen for SIGTERM");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            () = terminate => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_summary(summary: &IndexSummary) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    writeln!(handle)?;
    writeln!(handle, "Index Summary")?;
    writeln!(handle, "=============")?;
    writeln!(handle)?;
    writeln!(handle, "Routes:             {} ({} named)", summary.routes, summary.named_routes)?;
    writeln!(handle, "Models:             {}", summary.models)?;
    writeln!(handle, "Tables:             {}", summary.tables)?;
    writeln!(
        handle,
        "Translations:       {} entries in {} locales, {} usages",
        summary.translation_entries, summary.locales, summary.translation_usages
    )?;
    writeln!(handle, "  Missing:          {}", summary.missing_translations)?;
    writeln!(handle, "  Unused:           {}", summary.unused_translations)?;
    writeln!(
        handle,
        "Validated fields:   {} ({} with diagnostics)",
        summary.validation_usages, summary.validation_diagnostics
    )?;
    writeln!(handle, "Config keys:        {}", summary.config_keys)?;
    writeln!(handle, "Env variables:      {}", summary.env_keys)?;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)?;
    writeln!(handle)?;
    Ok(())
}

fn generate_json_report(engine: &Engine, reports: &[RebuildReport]) -> color_eyre::Result<String> {
    #[derive(Serialize)]
    struct Report<'a> {
        summary: IndexSummary,
        routes: &'a [cv_core::Route],
        models: &'a [cv_core::Model],
        tables: &'a [cv_core::DatabaseTable],
        missing_translations: Vec<cv_index::MissingTranslation>,
        unused_translations: Vec<&'a cv_core::TranslationEntry>,
        incomplete_translations: Vec<cv_index::IncompleteTranslation>,
        validation: Vec<&'a cv_index::ValidationReport>,
        config_keys: &'a [cv_core::ConfigKey],
        env_keys: &'a [cv_core::EnvKey],
        skipped_files: Vec<&'a FileError>,
    }

    let routes = engine.routes();
    let schema = engine.schema();
    let translations = engine.translations();
    let validation = engine.validation();
    let keys = engine.keys();

    let report = Report {
        summary: engine.summary(),
        routes: routes.all(),
        models: schema.all_models(),
        tables: schema.tables(),
        missing_translations: translations.missing(),
        unused_translations: translations.unused(),
        incomplete_translations: translations.incomplete(),
        validation: validation.with_diagnostics(),
        config_keys: keys.all_config_keys(),
        env_keys: keys.all_env_keys(),
        skipped_files: reports.iter().flat_map(|r| &r.errors).collect(),
    };
    serde_json::to_string_pretty(&report).wrap_err("Failed to serialize report")
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    let config = build_config(&cli)?;
    match &cli.command {
        Commands::Scan => run_scan(config),
        Commands::Report { output } => run_report(config, output.as_ref()),
        Commands::Query { query } => run_query(config, query),
        Commands::Watch => run_watch(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_query() {
        let cli = Cli::parse_from(["convidx", "--path", "/srv/shop", "query", "rule", "min", "--field", "password"]);
        assert_eq!(cli.path.as_deref().map(|p| p.as_str()), Some("/srv/shop"));
        match cli.command {
            Commands::Query {
                query: Query::Rule { name, field },
            } => {
                assert_eq!(name, "min");
                assert_eq!(field.as_deref(), Some("password"));
            }
            _ => panic!("expected a rule query"),
        }
    }

    #[test]
    fn test_build_config_prefers_path_flag() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let config_file = root.join("convidx.json");
        std::fs::write(&config_file, r#"{"layout": {"root": "/nonexistent", "routes_dir": "http"}}"#).unwrap();

        let cli = Cli::parse_from(["convidx", "--config", config_file.as_str(), "--path", root.as_str(), "scan"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.layout.root, root);
        assert_eq!(config.layout.routes_dir, "http");
    }

    #[test]
    fn test_build_config_missing_root() {
        let cli = Cli::parse_from(["convidx", "--path", "/nonexistent/convidx", "scan"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_watch_filter_ignores_excluded_names_above_root() {
        use cv_watcher::FileFilter;

        let dir = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let project = base.join("storage/shop");
        std::fs::create_dir_all(&project).unwrap();

        let layout = ProjectLayout {
            root: project.clone(),
            ..ProjectLayout::default()
        };
        let root = watch_root(&layout.root);
        let filter = project_filter(&layout, &root);
        assert!(filter.should_process(&root.join("routes/web.php")));
        assert!(!filter.should_process(&root.join("vendor/acme/src/Foo.php")));
    }

    #[test]
    fn test_json_report_on_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let engine = build_engine(EngineConfig::for_root(&root)).unwrap();

        let report: serde_json::Value = serde_json::from_str(&generate_json_report(&engine, &[]).unwrap()).unwrap();
        assert_eq!(report["summary"]["routes"], 0);
        assert!(report["routes"].as_array().unwrap().is_empty());
        assert!(!report["config_keys"].as_array().unwrap().is_empty());
    }
}
