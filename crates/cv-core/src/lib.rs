//! Core types, errors, and configuration for the convention index engine.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Error types for configuration loading ([`ConfigError`])
//! - Engine configuration passed explicitly into the engine ([`EngineConfig`])
//! - Domain entities (`Route`, `Model`, `Field`, `TranslationEntry`, `ValidationRule`, ...)
//! - The [`Domain`] vocabulary that drives invalidation
//! - Type aliases for `FxHashMap`/`FxHashSet` (faster than std)

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod types;

pub use config::{EngineConfig, ProjectLayout, ValidationConfig, WatchConfig};
pub use error::ConfigError;
pub use hash::{FxHashMap, FxHashSet};
pub use types::*;
