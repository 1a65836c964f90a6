//! The convention index engine.
//!
//! This crate turns a framework project on disk into queryable tables:
//! routes bound to controller actions, models merged with their migration
//! schema, translation catalogs reconciled with usages, validation rule
//! diagnostics, and configuration and environment keys.
//!
//! # Overview
//!
//! The main entry point is [`Engine`], which combines:
//!
//! - [`FileWalker`]: Directory traversal respecting `.gitignore` patterns
//! - Per-domain builders: parallel extraction with rayon, in file order
//! - Resolution: [`RouteTable`], [`SchemaTable`], [`TranslationIndex`],
//!   [`RuleRegistry`], [`KeyTable`]
//! - [`IndexStore`]: one atomically swapped snapshot per table
//! - [`InvalidationController`]: maps file changes to domain rebuilds
//!
//! # Example
//!
//! ```no_run
//! use cv_core::EngineConfig;
//! use cv_index::Engine;
//! use camino::Utf8Path;
//!
//! let engine = Engine::new(EngineConfig::for_root(Utf8Path::new("./shop")))?;
//! engine.build_all()?;
//!
//! let schema = engine.schema();
//! if let Some(user) = schema.model("User") {
//!     for field in &user.fields {
//!         println!("{}: {:?}", field.name, field.field_type);
//!     }
//! }
//!
//! for missing in engine.translations().missing() {
//!     println!("missing translation: {}", missing.key);
//! }
//! # Ok::<(), cv_index::IndexError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! Engine
//!     │
//!     ├── builders (walk + read + extract, per domain)
//!     │       │
//!     │       ├── FileWalker (ignore crate)
//!     │       └── cv-extract (pure text extractors)
//!     │
//!     ├── resolution (routes, schema, translations, validation, config_keys)
//!     │
//!     ├── IndexStore (RwLock<Arc<T>> per table)
//!     │
//!     └── InvalidationController (globset + tokio mpsc)
//! ```
//!
//! # Consistency
//!
//! A rebuild publishes a complete table or nothing. Readers hold `Arc`
//! snapshots and never observe a half-built table.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod builders;
pub mod config_keys;
mod engine;
mod error;
mod invalidation;
pub mod routes;
pub mod schema;
mod store;
pub mod translations;
pub mod validation;
mod walker;

pub use builders::FileError;
pub use config_keys::{KeyTable, KeyTableBuilder};
pub use engine::{Engine, IndexSummary, RebuildReport};
pub use error::IndexError;
pub use invalidation::InvalidationController;
pub use routes::RouteTable;
pub use schema::SchemaTable;
pub use store::IndexStore;
pub use translations::{IncompleteTranslation, MissingTranslation, TranslationIndex};
pub use validation::{RuleDiagnostic, RuleRegistry, RuleSuggestion, ValidationIndex, ValidationReport};
pub use walker::FileWalker;
