//! Watches annotated files and keeps their annotations anchored while they
//! are edited outside any editor integration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, sleep};

use crate::storage::AnnotationStore;
use crate::tracking::{DocumentEvent, RangeTracker, TrackingReport};
use crate::utils::content_hash;

use super::debouncer::Debouncer;
use super::error::WatchError;
use super::path_registry::PathRegistry;

/// How long the loop sleeps when nothing is pending.
const IDLE_POLL: Duration = Duration::from_millis(500);

/// File watcher feeding a shared [`RangeTracker`].
///
/// A debounced modification is delivered to the tracker as
/// [`DocumentEvent::Opened`] with the file's new contents, so every
/// annotation on the file is validated and reanchored if needed. Renames
/// observed as a single event retarget the file's annotations. Deleted
/// files keep their annotations.
pub struct AnnotationWatcher<S> {
    tracker: Arc<Mutex<RangeTracker<S>>>,
    registry: PathRegistry,
    debouncer: Debouncer,
    /// Content hash of the last text handed to the tracker, per file.
    hashes: HashMap<PathBuf, String>,
    /// Store file written by other processes; reloaded when it changes.
    store_path: Option<PathBuf>,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    watcher: notify::RecommendedWatcher,
}

impl<S: AnnotationStore + Send + 'static> AnnotationWatcher<S> {
    pub fn builder() -> AnnotationWatcherBuilder<S> {
        AnnotationWatcherBuilder::new()
    }

    /// Run until the event channel closes.
    pub async fn watch(mut self) -> Result<(), WatchError> {
        let persisted = self.sweep().await?;
        crate::log_event!(
            "watcher",
            "monitoring",
            "{} files in {} directories ({persisted} annotations updated on start)",
            self.registry.path_count(),
            self.registry.dir_count()
        );

        if let Some(store_dir) = self
            .store_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
        {
            // A store that was never saved has no directory yet
            std::fs::create_dir_all(&store_dir).map_err(|e| WatchError::PathWatchFailed {
                path: store_dir.clone(),
                reason: e.to_string(),
            })?;
            self.watch_directory(&store_dir)?;
        }

        loop {
            let timeout = sleep(self.debouncer.next_deadline().unwrap_or(IDLE_POLL));
            tokio::pin!(timeout);

            tokio::select! {
                event = self.event_rx.recv() => match event {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                    None => return Err(WatchError::ChannelClosed),
                },

                _ = &mut timeout => {
                    for path in self.debouncer.take_ready() {
                        self.process_modification(&path).await;
                    }
                }
            }
        }
    }

    /// Register every annotated file and validate it against its current
    /// contents. Returns how many annotations were written back.
    pub async fn sweep(&mut self) -> Result<usize, WatchError> {
        self.refresh_paths().await;

        let files: Vec<(PathBuf, PathBuf)> = self
            .registry
            .paths()
            .map(|(abs, rel)| (abs.to_path_buf(), rel.to_path_buf()))
            .collect();

        let mut persisted = 0;
        for (absolute, relative) in files {
            if let Some(report) = self.revalidate(&absolute, &relative).await? {
                persisted += report.persisted;
            }
        }
        Ok(persisted)
    }

    /// Re-read the set of annotated files and watch any new directories.
    async fn refresh_paths(&mut self) {
        let files = self.tracker.lock().await.store().tracked_files();
        for dir in self.registry.rebuild(files) {
            // Missing directories are common for files deleted while untracked
            if let Err(e) = self.watch_directory(&dir) {
                tracing::warn!("[watcher] {e}");
            }
        }
    }

    fn watch_directory(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
        crate::debug_event!("watcher", "watching", "{}", dir.display());
        Ok(())
    }

    async fn handle_event(&mut self, event: Event) {
        match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
                self.process_rename(&event.paths[0], &event.paths[1]).await;
            }
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                for path in &event.paths {
                    if self.registry.contains(path) {
                        self.debouncer.remove(path);
                        self.hashes.remove(path);
                        crate::log_event!("watcher", "deleted", "{}", path.display());
                    }
                }
            }
            EventKind::Create(_) | EventKind::Modify(_) => {
                for path in event.paths {
                    if self.registry.contains(&path) || self.is_store(&path) {
                        self.debouncer.record(path);
                    } else {
                        crate::debug_event!(
                            "watcher",
                            "unmatched",
                            "{:?} {}",
                            event.kind,
                            path.display()
                        );
                    }
                }
            }
            _ => {}
        }
    }

    fn is_store(&self, path: &Path) -> bool {
        self.store_path.as_deref() == Some(path)
    }

    async fn process_rename(&mut self, from: &Path, to: &Path) {
        let Some(old) = self.registry.relative(from).map(Path::to_path_buf) else {
            // Atomic saves rename a temp file over the tracked one
            if self.registry.contains(to) || self.is_store(to) {
                self.debouncer.record(to.to_path_buf());
            }
            return;
        };

        self.debouncer.remove(from);
        let Some(new) = self.registry.to_relative(to) else {
            tracing::warn!(
                "[watcher] {} moved outside the workspace to {}",
                old.display(),
                to.display()
            );
            return;
        };

        let result = self.tracker.lock().await.handle(DocumentEvent::Renamed {
            renames: vec![(old, new)],
        });
        match result {
            Ok(report) => {
                if let Some(hash) = self.hashes.remove(from) {
                    self.hashes.insert(to.to_path_buf(), hash);
                }
                crate::debug_event!("watcher", "renamed", "{} annotations", report.renamed);
                self.refresh_paths().await;
            }
            Err(e) => tracing::error!("[watcher] rename of {} failed: {e}", from.display()),
        }
    }

    async fn process_modification(&mut self, path: &Path) {
        if self.is_store(path) {
            let reloaded = self.tracker.lock().await.reload_store();
            match reloaded {
                Ok(true) => {
                    crate::log_event!("watcher", "store reloaded", "{}", path.display());
                    self.refresh_paths().await;
                }
                Ok(false) => {}
                Err(e) => tracing::error!("[watcher] failed to reload store: {e}"),
            }
            return;
        }

        let Some(relative) = self.registry.relative(path).map(Path::to_path_buf) else {
            return;
        };

        match self.revalidate(path, &relative).await {
            Ok(Some(report)) if !report.is_unchanged() => {
                crate::log_event!(
                    "watcher",
                    "modified",
                    "{} ({} reanchored, {} not found)",
                    relative.display(),
                    report.reanchored.len(),
                    report.not_found.len()
                );
            }
            Ok(_) => {}
            Err(e) => tracing::error!("[watcher] {e}"),
        }
    }

    /// Hand the file's current text to the tracker unless it is unchanged
    /// since the last time.
    async fn revalidate(
        &mut self,
        absolute: &Path,
        relative: &Path,
    ) -> Result<Option<TrackingReport>, WatchError> {
        let text = match tokio::fs::read_to_string(absolute).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.hashes.remove(absolute);
                crate::debug_event!("watcher", "missing", "{}", absolute.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(WatchError::ReadFailed {
                    path: absolute.to_path_buf(),
                    source,
                });
            }
        };

        let hash = content_hash(&text);
        if self.hashes.get(absolute) == Some(&hash) {
            crate::debug_event!("watcher", "unchanged (hash match)", "{}", relative.display());
            return Ok(None);
        }
        self.hashes.insert(absolute.to_path_buf(), hash);

        let report = self.tracker.lock().await.handle(DocumentEvent::Opened {
            path: relative.to_path_buf(),
            text,
        })?;
        Ok(Some(report))
    }
}

/// Builder for constructing an [`AnnotationWatcher`].
pub struct AnnotationWatcherBuilder<S> {
    tracker: Option<Arc<Mutex<RangeTracker<S>>>>,
    workspace_root: Option<PathBuf>,
    store_path: Option<PathBuf>,
    debounce_ms: u64,
}

impl<S: AnnotationStore + Send + 'static> AnnotationWatcherBuilder<S> {
    pub fn new() -> Self {
        Self {
            tracker: None,
            workspace_root: None,
            store_path: None,
            debounce_ms: 500,
        }
    }

    pub fn tracker(mut self, tracker: Arc<Mutex<RangeTracker<S>>>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Root that stored annotation paths are relative to.
    pub fn workspace_root(mut self, path: PathBuf) -> Self {
        self.workspace_root = Some(path);
        self
    }

    /// Reload the store when this file is changed by another process.
    pub fn store_path(mut self, path: PathBuf) -> Self {
        self.store_path = Some(path);
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn build(self) -> Result<AnnotationWatcher<S>, WatchError> {
        let tracker = self.tracker.ok_or_else(|| WatchError::InitFailed {
            reason: "Tracker is required".to_string(),
        })?;

        let workspace_root = match self.workspace_root {
            Some(root) => root,
            None => std::env::current_dir().map_err(|e| WatchError::InitFailed {
                reason: format!("no workspace root: {e}"),
            })?,
        };

        let (tx, rx) = mpsc::channel(100);
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(AnnotationWatcher {
            tracker,
            registry: PathRegistry::new(workspace_root),
            debouncer: Debouncer::new(self.debounce_ms),
            hashes: HashMap::new(),
            store_path: self.store_path,
            event_rx: rx,
            watcher,
        })
    }
}

impl<S: AnnotationStore + Send + 'static> Default for AnnotationWatcherBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
