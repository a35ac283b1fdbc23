//! Event dispatch: keeps a file's annotations positioned as it changes.
//!
//! ```text
//! DocumentEvent ──> RangeTracker::handle
//!   Changed ─> classify each annotation ─┬─ ShiftBy ──────> shift lines
//!                                        └─ NeedsReanchor ─> reanchor
//!   Opened ──> snapshot still at range? ──── no ──────────> reanchor
//!   Renamed ─> store.rename_path
//!                     │
//!      persist changed annotations as one batch, then notify
//! ```

use std::path::{Path, PathBuf};

use super::classifier::{Classification, TextChange, classify_changes};
use super::reanchor::{Anchor, is_anchored, reanchor};
use crate::document::{DocumentSource, TextDocument};
use crate::notifications::{NotificationBroadcaster, TrackerEvent};
use crate::storage::{AnnotationStore, StorageResult};
use crate::types::{Annotation, AnnotationId};

/// Something that happened to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// One or more replacements were applied; `text` is the result.
    Changed {
        path: PathBuf,
        text: String,
        changes: Vec<TextChange>,
    },
    /// The document was (re)loaded with this full text.
    Opened { path: PathBuf, text: String },
    /// Files moved, as `(old, new)` pairs.
    Renamed { renames: Vec<(PathBuf, PathBuf)> },
}

impl DocumentEvent {
    /// Path whose annotations this event touches, if it is about one file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DocumentEvent::Changed { path, .. } | DocumentEvent::Opened { path, .. } => Some(path),
            DocumentEvent::Renamed { .. } => None,
        }
    }
}

/// What one event did to the annotations it touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingReport {
    /// Moved by a line delta only.
    pub shifted: Vec<AnnotationId>,
    /// Reanchored to a different position.
    pub reanchored: Vec<AnnotationId>,
    /// Snapshot could not be located; coordinates were left alone.
    pub not_found: Vec<AnnotationId>,
    /// Calls into the reanchoring engine.
    pub reanchor_attempts: usize,
    /// Annotations written back to the store.
    pub persisted: usize,
    /// Annotations moved to a new path.
    pub renamed: usize,
}

impl TrackingReport {
    /// True when nothing was written to the store.
    pub fn is_unchanged(&self) -> bool {
        self.persisted == 0 && self.renamed == 0
    }
}

/// Repositions annotations in response to document events.
///
/// Events must be handled one at a time per document; `&mut self` on every
/// entry point enforces that for a single tracker.
pub struct RangeTracker<S> {
    store: S,
    broadcaster: Option<NotificationBroadcaster>,
}

impl<S: AnnotationStore> RangeTracker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            broadcaster: None,
        }
    }

    /// Publish a [`TrackerEvent`] whenever annotations are persisted.
    pub fn with_broadcaster(mut self, broadcaster: NotificationBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn handle(&mut self, event: DocumentEvent) -> StorageResult<TrackingReport> {
        match event {
            DocumentEvent::Changed {
                path,
                text,
                changes,
            } => self.document_changed(&path, &TextDocument::new(text), &changes),
            DocumentEvent::Opened { path, text } => {
                self.document_opened(&path, &TextDocument::new(text))
            }
            DocumentEvent::Renamed { renames } => self.files_renamed(&renames),
        }
    }

    /// Apply a change event. `doc` is the document after all `changes`.
    pub fn document_changed<D: DocumentSource + ?Sized>(
        &mut self,
        path: &Path,
        doc: &D,
        changes: &[TextChange],
    ) -> StorageResult<TrackingReport> {
        let mut report = TrackingReport::default();
        if changes.is_empty() {
            return Ok(report);
        }

        let annotations = self.store.list_for_file(path);
        if annotations.is_empty() {
            return Ok(report);
        }

        let mut changed = Vec::new();
        for mut annotation in annotations {
            match classify_changes(changes, &annotation) {
                Classification::Unaffected => {}
                Classification::ShiftBy(delta) => {
                    let before = annotation.range();
                    annotation.shift_lines(delta);
                    if annotation.range() != before {
                        report.shifted.push(annotation.id.clone());
                        changed.push(annotation);
                    }
                }
                Classification::NeedsReanchor => {
                    if Self::reanchor_into(&mut annotation, doc, &mut report) {
                        changed.push(annotation);
                    }
                }
            }
        }

        self.commit(path, &changed, &mut report)?;
        Ok(report)
    }

    /// Validate every annotation on a freshly loaded document, reanchoring
    /// the ones whose snapshot is no longer at their stored range.
    pub fn document_opened<D: DocumentSource + ?Sized>(
        &mut self,
        path: &Path,
        doc: &D,
    ) -> StorageResult<TrackingReport> {
        let mut report = TrackingReport::default();
        let mut changed = Vec::new();

        for mut annotation in self.store.list_for_file(path) {
            if is_anchored(&annotation, doc) {
                continue;
            }
            if Self::reanchor_into(&mut annotation, doc, &mut report) {
                changed.push(annotation);
            }
        }

        self.commit(path, &changed, &mut report)?;
        Ok(report)
    }

    /// Retarget annotations of renamed files.
    pub fn files_renamed(&mut self, renames: &[(PathBuf, PathBuf)]) -> StorageResult<TrackingReport> {
        let mut report = TrackingReport::default();

        for (old, new) in renames {
            let moved = self.store.rename_path(old, new)?;
            if moved == 0 {
                continue;
            }
            report.renamed += moved;
            crate::log_event!(
                "tracker",
                "renamed",
                "{moved} annotations {} -> {}",
                old.display(),
                new.display()
            );
            self.notify(TrackerEvent::PathRenamed {
                old: old.clone(),
                new: new.clone(),
            });
        }

        Ok(report)
    }

    /// Pick up store changes written by another process.
    pub fn reload_store(&mut self) -> StorageResult<bool> {
        let changed = self.store.reload()?;
        if changed {
            self.notify(TrackerEvent::StoreReloaded);
        }
        Ok(changed)
    }

    /// Returns whether the annotation's coordinates changed.
    fn reanchor_into<D: DocumentSource + ?Sized>(
        annotation: &mut Annotation,
        doc: &D,
        report: &mut TrackingReport,
    ) -> bool {
        report.reanchor_attempts += 1;
        match reanchor(annotation, doc) {
            Anchor::Found { changed: true, .. } => {
                report.reanchored.push(annotation.id.clone());
                true
            }
            Anchor::Found { changed: false, .. } => false,
            Anchor::NotFound => {
                report.not_found.push(annotation.id.clone());
                false
            }
        }
    }

    fn commit(
        &mut self,
        path: &Path,
        changed: &[Annotation],
        report: &mut TrackingReport,
    ) -> StorageResult<()> {
        if !report.not_found.is_empty() {
            crate::debug_event!(
                "tracker",
                "unlocatable",
                "{} annotations in {} keep their last position",
                report.not_found.len(),
                path.display()
            );
        }

        if changed.is_empty() {
            return Ok(());
        }

        self.store.persist_all(changed)?;
        report.persisted = changed.len();

        crate::log_event!(
            "tracker",
            "updated",
            "{} ({} shifted, {} reanchored)",
            path.display(),
            report.shifted.len(),
            report.reanchored.len()
        );
        self.notify(TrackerEvent::AnnotationsChanged {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn notify(&self, event: TrackerEvent) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.send(event);
        }
    }
}
