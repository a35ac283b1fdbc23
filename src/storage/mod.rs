//! Annotation persistence.
//!
//! The tracker only needs the narrow [`AnnotationStore`] view: list a file's
//! annotations, write back repositioned ones, and retarget a renamed file.
//! [`JsonStore`] is the on-disk implementation used by the CLI and watcher.

pub mod error;
pub mod json;

pub use error::{StorageError, StorageResult};
pub use json::{JsonStore, STORE_VERSION, StoreState};

use std::path::{Path, PathBuf};

use crate::types::Annotation;

/// Storage collaborator seen by the range tracker.
pub trait AnnotationStore {
    /// Copies of every annotation on `path`. The store keeps ownership; the
    /// caller writes changes back with [`persist`](Self::persist).
    fn list_for_file(&self, path: &Path) -> Vec<Annotation>;

    /// Durably save an annotation's current state.
    fn persist(&mut self, annotation: &Annotation) -> StorageResult<()>;

    /// Save several annotations as one batch.
    fn persist_all(&mut self, annotations: &[Annotation]) -> StorageResult<()> {
        for annotation in annotations {
            self.persist(annotation)?;
        }
        Ok(())
    }

    /// Point every annotation on `old` at `new`. Either all of them move or
    /// none do. Returns how many moved.
    fn rename_path(&mut self, old: &Path, new: &Path) -> StorageResult<usize>;

    /// Every file that currently has at least one annotation.
    fn tracked_files(&self) -> Vec<PathBuf>;

    /// Pick up changes another process wrote to the backing storage.
    /// Returns whether anything changed.
    fn reload(&mut self) -> StorageResult<bool> {
        Ok(false)
    }
}
