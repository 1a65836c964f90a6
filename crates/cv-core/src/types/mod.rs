//! Domain types for the convention index.
//!
//! Every entity here is an immutable value record inside an index snapshot;
//! snapshots are replaced wholesale on rebuild.
//!
//! # Module Organization
//!
//! - [`domain`] - The unit of invalidation
//! - [`keys`] - Configuration and environment keys
//! - [`location`] - Source code locations
//! - [`route`] - Routes, HTTP methods, and route actions
//! - [`schema`] - Models, fields, relationships, and migration columns
//! - [`translation`] - Translation entries and usages
//! - [`validation`] - Validation rule definitions
//!
//! All public types are re-exported at this module level and at the crate root:
//!
//! ```
//! use cv_core::{Route, Model, Field, FieldType, TranslationEntry, ValidationRule};
//! ```

pub mod domain;
pub mod keys;
pub mod location;
pub mod route;
pub mod schema;
pub mod translation;
pub mod validation;

pub use domain::Domain;
pub use keys::{ConfigKey, EnvKey, KeyOrigin};
pub use location::SourceLocation;
pub use route::{HttpMethod, ResourceKind, Route, RouteAction, RouteParameter};
pub use schema::{
    Cardinality, DatabaseTable, Field, FieldSource, FieldType, MigrationColumn, Model,
    Relationship, RelationshipKind,
};
pub use translation::{InvocationForm, TranslationEntry, TranslationUsage};
pub use validation::{ParamType, RuleCategory, ValidationParameter, ValidationRule};
