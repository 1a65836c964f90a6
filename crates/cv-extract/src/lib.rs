//! Heuristic text extractors for framework conventions.
//!
//! Every extractor in this crate is a pure function from file content to
//! typed entities. Nothing here touches the file system; the index crate reads
//! files and hands their text to these functions.
//!
//! # Overview
//!
//! | Module | Input | Output |
//! |--------|-------|--------|
//! | [`routes`] | route declaration file | [`Route`](cv_core::Route) list |
//! | [`migration`] | migration script | [`MigrationOp`] sequence |
//! | [`model`] | model class file | [`ModelClass`] |
//! | [`php_array`] | `return [...]` literals | [`PhpItem`] trees |
//! | [`translation`] | catalog files and sources | [`CatalogLeaf`], [`TranslationUsage`](cv_core::TranslationUsage) |
//! | [`config_keys`] | config arrays and `.env` files | [`ConfigNode`], [`EnvLine`], [`EnvReference`] |
//! | [`validation`] | form requests and controllers | [`RuleUsage`] |
//!
//! Extraction is deliberately pattern-based. Lines or constructs that match no
//! recognized shape produce nothing; only structured catalogs (array literals,
//! JSON) can fail, with an [`ExtractError`].
//!
//! ```
//! use cv_extract::routes::extract_routes;
//! use camino::Utf8Path;
//!
//! let source = "Route::get('/users', [UserController::class, 'index'])->name('users.index');";
//! let routes = extract_routes(source, Utf8Path::new("routes/web.php"));
//!
//! assert_eq!(routes.len(), 1);
//! assert_eq!(routes[0].controller(), Some("UserController"));
//! assert_eq!(routes[0].name.as_deref(), Some("users.index"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config_keys;
pub mod error;
pub mod migration;
pub mod model;
mod patterns;
pub mod php_array;
pub mod routes;
pub mod text;
pub mod translation;
pub mod validation;

pub use config_keys::{ConfigNode, EnvLine, EnvReference};
pub use error::ExtractError;
pub use migration::MigrationOp;
pub use model::ModelClass;
pub use php_array::{PhpItem, PhpValue};
pub use translation::CatalogLeaf;
pub use validation::RuleUsage;
