//! Snapshot file watching for the dashboard.
//!
//! The subscription and batch services write their snapshots to JSON files.
//! [`SnapshotWatcher`] watches the directories holding those files and, after
//! a debounce window, re-reads whichever file changed and sends the parsed
//! snapshot over a channel. The dashboard drains the channel once per frame.
//!
//! Directories are watched rather than the files themselves so that writers
//! which replace the file atomically (write temp, rename) are still seen.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use notify::{EventKind, RecursiveMode};
use notify_debouncer_full::{
    DebounceEventResult, DebouncedEvent, Debouncer, RecommendedCache, new_debouncer,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use ycd_core::config::DEFAULT_DEBOUNCE_MS;
use ycd_plans::{BatchJobItem, SubscriptionStatus, load_batch};

/// Errors that can occur while setting up snapshot watching.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to initialize the file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[from] notify::Error),

    /// Directory holding a snapshot file does not exist
    #[error("Snapshot directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Neither a status nor a batch file was configured
    #[error("No snapshot files to watch")]
    NothingToWatch,
}

/// Result type for watcher operations.
pub type WatcherResult<T> = std::result::Result<T, WatcherError>;

/// Which snapshot a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    /// Subscription status
    Status,
    /// Batch job items
    Batch,
}

/// Events emitted by the watcher.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// A new subscription snapshot was read
    StatusUpdated(SubscriptionStatus),
    /// A new batch snapshot was read
    BatchUpdated(Vec<BatchJobItem>),
    /// A snapshot file changed but could not be read
    Error {
        /// Snapshot kind
        kind: SnapshotKind,
        /// File that failed
        path: PathBuf,
        /// What went wrong
        error: String,
    },
}

/// Read a snapshot file into an event.
///
/// Failures become [`SnapshotEvent::Error`] so callers can keep the previous
/// snapshot and report the problem.
pub fn load_snapshot(kind: SnapshotKind, path: &Path) -> SnapshotEvent {
    let result = match kind {
        SnapshotKind::Status => SubscriptionStatus::load(path).map(SnapshotEvent::StatusUpdated),
        SnapshotKind::Batch => load_batch(path).map(SnapshotEvent::BatchUpdated),
    };

    result.unwrap_or_else(|e| {
        warn!(path = ?path, error = %e, "Failed to read snapshot file");
        SnapshotEvent::Error {
            kind,
            path: path.to_path_buf(),
            error: e.friendly_message(),
        }
    })
}

/// Configuration for the snapshot watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotWatcherConfig {
    /// Subscription snapshot file
    pub status_file: Option<PathBuf>,
    /// Batch snapshot file
    pub batch_file: Option<PathBuf>,
    /// Debounce timeout in milliseconds
    pub debounce_ms: u64,
}

impl Default for SnapshotWatcherConfig {
    fn default() -> Self {
        Self {
            status_file: None,
            batch_file: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl SnapshotWatcherConfig {
    /// Set the subscription snapshot file.
    pub fn with_status_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.status_file = Some(path.into());
        self
    }

    /// Set the batch snapshot file.
    pub fn with_batch_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.batch_file = Some(path.into());
        self
    }

    /// Set the debounce timeout.
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }
}

/// A watched snapshot file.
#[derive(Debug, Clone)]
struct Target {
    kind: SnapshotKind,
    dir: PathBuf,
    file_name: OsString,
    path: PathBuf,
}

impl Target {
    fn new(kind: SnapshotKind, path: &Path) -> WatcherResult<Self> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = parent
            .canonicalize()
            .map_err(|_| WatcherError::DirectoryNotFound(parent.clone()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| WatcherError::DirectoryNotFound(path.to_path_buf()))?;

        Ok(Self {
            kind,
            path: dir.join(&file_name),
            dir,
            file_name,
        })
    }

    fn matches(&self, path: &Path) -> bool {
        if path.file_name() != Some(self.file_name.as_os_str()) {
            return false;
        }
        match path.parent() {
            Some(parent) if parent == self.dir => true,
            Some(parent) => parent.canonicalize().is_ok_and(|p| p == self.dir),
            None => false,
        }
    }
}

/// Watcher for the subscription and batch snapshot files.
pub struct SnapshotWatcher {
    /// The debounced file watcher
    _debouncer: Debouncer<notify::RecommendedWatcher, RecommendedCache>,

    /// Receiver for snapshot events
    event_rx: Receiver<SnapshotEvent>,
}

impl SnapshotWatcher {
    /// Start watching the configured files.
    pub fn new(config: SnapshotWatcherConfig) -> WatcherResult<Self> {
        let mut targets = Vec::new();
        if let Some(path) = &config.status_file {
            targets.push(Target::new(SnapshotKind::Status, path)?);
        }
        if let Some(path) = &config.batch_file {
            targets.push(Target::new(SnapshotKind::Batch, path)?);
        }
        if targets.is_empty() {
            return Err(WatcherError::NothingToWatch);
        }

        let (event_tx, event_rx) = mpsc::channel();

        let dirs: HashSet<PathBuf> = targets.iter().map(|t| t.dir.clone()).collect();
        let handler_targets = targets.clone();

        let mut debouncer = new_debouncer(
            Duration::from_millis(config.debounce_ms),
            None,
            move |result: DebounceEventResult| {
                Self::handle_debounced_events(result, &handler_targets, &event_tx);
            },
        )?;

        for dir in &dirs {
            debouncer.watch(dir, RecursiveMode::NonRecursive)?;
            info!(path = ?dir, "Started watching snapshot directory");
        }

        Ok(Self {
            _debouncer: debouncer,
            event_rx,
        })
    }

    /// Handle debounced file system events.
    fn handle_debounced_events(
        result: DebounceEventResult,
        targets: &[Target],
        event_tx: &Sender<SnapshotEvent>,
    ) {
        match result {
            Ok(events) => {
                // One read per changed file per debounce window
                let mut changed: Vec<&Target> = Vec::new();
                for event in &events {
                    for target in Self::affected_targets(event, targets) {
                        if !changed.iter().any(|t| t.kind == target.kind) {
                            changed.push(target);
                        }
                    }
                }
                for target in changed {
                    if !target.path.exists() {
                        debug!(path = ?target.path, "Snapshot file removed, keeping last snapshot");
                        continue;
                    }
                    let _ = event_tx.send(load_snapshot(target.kind, &target.path));
                }
            }
            Err(errors) => {
                for error in errors {
                    error!(error = %error, "File watcher error");
                }
            }
        }
    }

    /// Targets touched by a create, modify or rename event.
    fn affected_targets<'t>(event: &DebouncedEvent, targets: &'t [Target]) -> Vec<&'t Target> {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return Vec::new();
        }
        targets
            .iter()
            .filter(|target| event.paths.iter().any(|p| target.matches(p)))
            .collect()
    }

    /// Try to receive a snapshot event without blocking.
    pub fn try_recv(&self) -> Option<SnapshotEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive a snapshot event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SnapshotEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
