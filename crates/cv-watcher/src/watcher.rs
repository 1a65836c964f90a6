//! Debounced project watcher bridged into tokio.
//!
//! ```text
//! blocking thread                         async side
//! ┌──────────────────────────────┐        ┌─────────────────────────┐
//! │ notify → debouncer → filter  │──send──▶ FileWatcher::next_batch │──▶ invalidation
//! └──────────────────────────────┘        └─────────────────────────┘
//! ```
//!
//! The `notify` watcher and its debouncer live on a `spawn_blocking` thread
//! that parks on a oneshot shutdown signal. Filtered events cross into the
//! runtime over a bounded mpsc channel.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use cv_core::WatchConfig;
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::WatchError;
use crate::events::{FileEvent, FileEventBatch};
use crate::filter::FileFilter;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Watches a project directory and streams filtered change events.
///
/// Dropping the watcher signals the background thread to stop; call
/// [`shutdown`](Self::shutdown) to also wait for it.
///
/// # Examples
///
/// ```no_run
/// use cv_watcher::{FileWatcher, ProjectFilter};
/// use cv_core::WatchConfig;
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), cv_watcher::WatchError> {
/// let mut watcher = FileWatcher::new(
///     Utf8Path::new("./shop"),
///     &WatchConfig::default(),
///     ProjectFilter::default(),
/// )
/// .await?;
///
/// while let Some(batch) = watcher.next_batch().await {
///     for path in batch.unique_paths() {
///         println!("changed: {path}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct FileWatcher {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<JoinHandle<Result<(), WatchError>>>,
    event_rx: mpsc::Receiver<FileEvent>,
    watch_path: Utf8PathBuf,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("watch_path", &self.watch_path)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Starts watching `path`.
    ///
    /// # Errors
    ///
    /// - [`WatchError::Disabled`] if `config.enabled` is false
    /// - [`WatchError::PathNotFound`] if `path` does not exist
    /// - [`WatchError::Io`] if the path cannot be canonicalized
    #[allow(clippy::unused_async)]
    pub async fn new<F: FileFilter>(path: &Utf8Path, config: &WatchConfig, filter: F) -> Result<Self, WatchError> {
        Self::spawn(path, config, filter, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Like [`new`](Self::new) with an explicit channel capacity.
    ///
    /// The watcher thread blocks once the channel is full, so size this for
    /// the largest burst expected between reads (a `git checkout`, say).
    #[allow(clippy::unused_async)]
    pub async fn with_capacity<F: FileFilter>(
        path: &Utf8Path,
        config: &WatchConfig,
        filter: F,
        channel_capacity: usize,
    ) -> Result<Self, WatchError> {
        Self::spawn(path, config, filter, channel_capacity.max(1))
    }

    fn spawn<F: FileFilter>(
        path: &Utf8Path,
        config: &WatchConfig,
        filter: F,
        channel_capacity: usize,
    ) -> Result<Self, WatchError> {
        if !config.enabled {
            return Err(WatchError::Disabled);
        }
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }
        let watch_path = path.canonicalize_utf8()?;

        let (event_tx, event_rx) = mpsc::channel(channel_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task_path = watch_path.clone();
        let config = *config;
        let task_handle =
            tokio::task::spawn_blocking(move || run_watcher_loop(&task_path, config, event_tx, shutdown_rx, filter));

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            event_rx,
            watch_path,
        })
    }

    /// Waits for the next event. `None` once the watcher has stopped.
    pub async fn recv(&mut self) -> Option<FileEvent> {
        self.event_rx.recv().await
    }

    /// Returns an event if one is already queued.
    pub fn try_recv(&mut self) -> Result<FileEvent, mpsc::error::TryRecvError> {
        self.event_rx.try_recv()
    }

    /// Waits for one event, then drains whatever else is queued.
    ///
    /// `None` once the watcher has stopped.
    pub async fn next_batch(&mut self) -> Option<FileEventBatch> {
        let first = self.event_rx.recv().await?;
        let mut batch = FileEventBatch::new();
        batch.push(first);
        while let Ok(event) = self.event_rx.try_recv() {
            batch.push(event);
        }
        Some(batch)
    }

    /// The underlying receiver, for use in `tokio::select!`.
    pub fn events(&mut self) -> &mut mpsc::Receiver<FileEvent> {
        &mut self.event_rx
    }

    /// The canonical watched path.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns `true` while the background thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the watcher and waits for its thread.
    ///
    /// # Errors
    ///
    /// Returns the error the watcher thread stopped with, or
    /// [`WatchError::ChannelClosed`] if it panicked.
    pub async fn shutdown(mut self) -> Result<(), WatchError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(_) => return Err(WatchError::ChannelClosed),
            }
        }
        Ok(())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn run_watcher_loop<F: FileFilter>(
    path: &Utf8Path,
    config: WatchConfig,
    event_tx: mpsc::Sender<FileEvent>,
    shutdown_rx: oneshot::Receiver<()>,
    filter: F,
) -> Result<(), WatchError> {
    let timeout = Duration::from_millis(config.debounce_ms);

    let mut debouncer: Debouncer<notify::RecommendedWatcher> =
        new_debouncer(timeout, move |res: DebounceEventResult| match res {
            Ok(events) => {
                for event in events {
                    let path = match Utf8PathBuf::try_from(event.path) {
                        Ok(path) => path,
                        Err(e) => {
                            warn!(error = %WatchError::NonUtf8Path(e.into_path_buf()), "Skipping file event");
                            continue;
                        }
                    };
                    if !filter.should_process(&path) {
                        trace!(path = %path, "Ignored file event");
                        continue;
                    }
                    if event_tx.blocking_send(FileEvent::new(path)).is_err() {
                        debug!("Event receiver dropped");
                        break;
                    }
                }
            }
            Err(error) => warn!(error = %error, "Debouncer error"),
        })?;

    let mode = if config.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    debouncer.watcher().watch(path.as_std_path(), mode)?;
    info!(path = %path, debounce_ms = config.debounce_ms, recursive = config.recursive, "Watching project");

    let _ = shutdown_rx.blocking_recv();
    info!(path = %path, "Stopped watching project");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AcceptAllFilter, ProjectFilter};
    use std::fs;

    fn tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let (_dir, path) = tempdir();
        let watcher = FileWatcher::new(&path, &WatchConfig::default(), AcceptAllFilter)
            .await
            .unwrap();
        assert!(watcher.is_running());
        assert!(watcher.watch_path().is_absolute());
        watcher.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_path() {
        let result = FileWatcher::new(
            Utf8Path::new("/nonexistent/convidx/project"),
            &WatchConfig::default(),
            AcceptAllFilter,
        )
        .await;
        assert!(matches!(result, Err(WatchError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn test_disabled_config() {
        let (_dir, path) = tempdir();
        let config = WatchConfig {
            enabled: false,
            ..WatchConfig::default()
        };
        let result = FileWatcher::new(&path, &config, AcceptAllFilter).await;
        assert!(matches!(result, Err(WatchError::Disabled)));
    }

    #[tokio::test]
    async fn test_with_capacity() {
        let (_dir, path) = tempdir();
        let watcher = FileWatcher::with_capacity(&path, &WatchConfig::default(), ProjectFilter::default(), 4)
            .await
            .unwrap();
        assert!(watcher.is_running());
    }

    #[tokio::test]
    async fn test_batches_project_changes() {
        let (dir, path) = tempdir();
        let config = WatchConfig {
            debounce_ms: 50,
            ..WatchConfig::default()
        };
        let mut watcher = FileWatcher::new(&path, &config, ProjectFilter::default()).await.unwrap();

        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::write(dir.path().join("routes/web.php"), "<?php\n").unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(2), watcher.next_batch()).await;
        watcher.shutdown().await.unwrap();

        // Event delivery depends on the platform backend; only check what arrived.
        if let Ok(Some(batch)) = batch {
            assert!(batch.iter().all(|e| !e.path.as_str().ends_with("notes.txt")));
        }
    }
}
