//! Debounced file watching for a framework project.
//!
//! [`FileWatcher`] runs `notify` with a `notify-debouncer-mini` window on a
//! blocking thread and forwards [`FileEvent`]s into tokio. A [`FileFilter`]
//! decides which paths are forwarded; [`ProjectFilter`] keeps the PHP, JSON
//! and `.env*` files the index reads and drops `vendor/`, `node_modules/` and
//! `storage/`.
//!
//! The watcher knows nothing about domains. The CLI turns each
//! [`FileEventBatch`] into a path list for `cv_index::InvalidationController`.
//!
//! ```no_run
//! use cv_watcher::{FileWatcher, ProjectFilter};
//! use cv_core::WatchConfig;
//! use camino::Utf8Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cv_watcher::WatchError> {
//!     let mut watcher =
//!         FileWatcher::new(Utf8Path::new("."), &WatchConfig::default(), ProjectFilter::default()).await?;
//!     while let Some(batch) = watcher.next_batch().await {
//!         println!("{} files changed", batch.unique_paths().len());
//!     }
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod events;
mod filter;
mod watcher;

pub use error::WatchError;
pub use events::{FileEvent, FileEventBatch};
pub use filter::{AcceptAllFilter, CompositeFilter, ExtensionFilter, FileFilter, ProjectFilter};
pub use watcher::FileWatcher;
