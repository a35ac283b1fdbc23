//! Whole-state JSON file store for tags and annotations.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::error::{StorageError, StorageResult};
use super::AnnotationStore;
use crate::types::{Annotation, AnnotationId, Position, Tag, TagId};
use crate::utils::{generate_id, get_utc_timestamp_millis, next_tag_color};

/// Version written to new state files. Files with any other version are
/// ignored on load.
pub const STORE_VERSION: u32 = 1;

/// Everything persisted in the state file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub version: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            tags: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

/// Tags and annotations held in memory and mirrored to a JSON file.
///
/// Every mutation rewrites the file atomically (temp file + rename). A store
/// created with [`JsonStore::in_memory`] never touches disk.
#[derive(Debug, Default)]
pub struct JsonStore {
    path: Option<PathBuf>,
    state: StoreState,
}

impl JsonStore {
    /// Open the store at `path`. A missing file, or one written with a
    /// different version, starts empty.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let state = read_state(&path)?;

        crate::debug_event!(
            "store",
            "opened",
            "{} ({} tags, {} annotations)",
            path.display(),
            state.tags.len(),
            state.annotations.len()
        );

        Ok(Self {
            path: Some(path),
            state,
        })
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    fn save(&self) -> StorageResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let json = serde_json::to_string_pretty(&self.state)?;
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Apply `mutate`, then save. The in-memory state is rolled back if the
    /// save fails so memory and disk never disagree.
    fn transact<T>(&mut self, mutate: impl FnOnce(&mut StoreState) -> T) -> StorageResult<T> {
        let before = self.state.clone();
        let out = mutate(&mut self.state);
        if let Err(e) = self.save() {
            self.state = before;
            return Err(e);
        }
        Ok(out)
    }

    // Tags

    pub fn tags(&self) -> &[Tag] {
        &self.state.tags
    }

    pub fn tag(&self, id: &TagId) -> Option<&Tag> {
        self.state.tags.iter().find(|t| &t.id == id)
    }

    /// Create a tag. Without an explicit color the next palette color is
    /// used.
    pub fn create_tag(
        &mut self,
        name: impl Into<String>,
        color: Option<String>,
        description: Option<String>,
    ) -> StorageResult<Tag> {
        let tag = Tag {
            id: TagId::new(generate_id()),
            name: name.into(),
            color: color.unwrap_or_else(|| next_tag_color(self.state.tags.len()).to_string()),
            description: description.unwrap_or_default(),
            created_at: get_utc_timestamp_millis(),
        };
        let created = tag.clone();
        self.transact(|state| state.tags.push(tag))?;
        Ok(created)
    }

    /// Change a tag's name, color, or description. Fields left as `None`
    /// keep their current value.
    pub fn update_tag(
        &mut self,
        id: &TagId,
        name: Option<String>,
        color: Option<String>,
        description: Option<String>,
    ) -> StorageResult<Tag> {
        let Some(mut tag) = self.tag(id).cloned() else {
            return Err(StorageError::TagNotFound(id.clone()));
        };
        if let Some(name) = name {
            tag.name = name;
        }
        if let Some(color) = color {
            tag.color = color;
        }
        if let Some(description) = description {
            tag.description = description;
        }

        let updated = tag.clone();
        self.transact(|state| {
            if let Some(slot) = state.tags.iter_mut().find(|t| &t.id == id) {
                *slot = tag;
            }
        })?;
        Ok(updated)
    }

    /// Delete a tag, strip it from every annotation, and drop annotations
    /// left without tags. Returns the number of annotations dropped.
    pub fn delete_tag(&mut self, id: &TagId) -> StorageResult<usize> {
        if self.tag(id).is_none() {
            return Err(StorageError::TagNotFound(id.clone()));
        }

        self.transact(|state| {
            state.tags.retain(|t| &t.id != id);
            for annotation in &mut state.annotations {
                annotation.tag_ids.retain(|t| t != id);
            }
            let before = state.annotations.len();
            state.annotations.retain(|a| !a.tag_ids.is_empty());
            before - state.annotations.len()
        })
    }

    // Annotations

    pub fn annotations(&self) -> &[Annotation] {
        &self.state.annotations
    }

    pub fn annotation(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.state.annotations.iter().find(|a| &a.id == id)
    }

    /// Store a new annotation. Every tag it references must exist.
    pub fn add_annotation(&mut self, annotation: Annotation) -> StorageResult<()> {
        if let Some(missing) = annotation.tag_ids.iter().find(|id| self.tag(id).is_none()) {
            return Err(StorageError::TagNotFound(missing.clone()));
        }
        self.transact(|state| state.annotations.push(annotation))
    }

    /// Annotations carrying the tag `id`, in insertion order.
    pub fn annotations_for_tag(&self, id: &TagId) -> Vec<&Annotation> {
        self.state
            .annotations
            .iter()
            .filter(|a| a.has_tag(id))
            .collect()
    }

    /// Annotations on `path` whose range covers `position`.
    pub fn annotations_at(&self, path: &Path, position: Position) -> Vec<&Annotation> {
        self.state
            .annotations
            .iter()
            .filter(|a| a.file_path == path && a.range().contains(position))
            .collect()
    }

    pub fn delete_annotation(&mut self, id: &AnnotationId) -> StorageResult<()> {
        if self.annotation(id).is_none() {
            return Err(StorageError::AnnotationNotFound(id.clone()));
        }
        self.transact(|state| state.annotations.retain(|a| &a.id != id))
    }
}

fn read_state(path: &Path) -> StorageResult<StoreState> {
    if !path.exists() {
        return Ok(StoreState::default());
    }

    let json = fs::read_to_string(path)?;
    let state: StoreState = serde_json::from_str(&json)?;
    if state.version == STORE_VERSION {
        Ok(state)
    } else {
        tracing::warn!(
            "[store] ignoring {} written with version {} (expected {STORE_VERSION})",
            path.display(),
            state.version
        );
        Ok(StoreState::default())
    }
}

impl AnnotationStore for JsonStore {
    fn list_for_file(&self, path: &Path) -> Vec<Annotation> {
        self.state
            .annotations
            .iter()
            .filter(|a| a.file_path == path)
            .cloned()
            .collect()
    }

    fn persist(&mut self, annotation: &Annotation) -> StorageResult<()> {
        self.persist_all(std::slice::from_ref(annotation))
    }

    fn persist_all(&mut self, annotations: &[Annotation]) -> StorageResult<()> {
        if let Some(missing) = annotations.iter().find(|a| self.annotation(&a.id).is_none()) {
            return Err(StorageError::AnnotationNotFound(missing.id.clone()));
        }

        self.transact(|state| {
            for updated in annotations {
                if let Some(slot) = state.annotations.iter_mut().find(|a| a.id == updated.id) {
                    *slot = updated.clone();
                }
            }
        })
    }

    fn rename_path(&mut self, old: &Path, new: &Path) -> StorageResult<usize> {
        if !self.state.annotations.iter().any(|a| a.file_path == old) {
            return Ok(0);
        }

        self.transact(|state| {
            let mut moved = 0;
            for annotation in state.annotations.iter_mut().filter(|a| a.file_path == old) {
                annotation.file_path = new.to_path_buf();
                moved += 1;
            }
            moved
        })
    }

    fn tracked_files(&self) -> Vec<PathBuf> {
        self.state
            .annotations
            .iter()
            .map(|a| a.file_path.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn reload(&mut self) -> StorageResult<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };

        let state = read_state(path)?;
        if state == self.state {
            return Ok(false);
        }
        crate::debug_event!("store", "reloaded", "{}", path.display());
        self.state = state;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextRange;
    use tempfile::TempDir;

    fn annotation(tag: &Tag, file: &str, range: TextRange) -> Annotation {
        Annotation {
            id: AnnotationId::new(generate_id()),
            tag_ids: vec![tag.id.clone()],
            file_path: PathBuf::from(file),
            start_line: range.start.line,
            start_char: range.start.character,
            end_line: range.end.line,
            end_char: range.end.character,
            content_snapshot: "text".to_string(),
            context_before: String::new(),
            context_after: String::new(),
            note: String::new(),
            created_at: 0,
        }
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonStore::open(temp_dir.path().join("annotations.json")).unwrap();
        assert!(store.tags().is_empty());
        assert!(store.annotations().is_empty());
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/annotations.json");

        let mut store = JsonStore::open(&path).unwrap();
        let tag = store.create_tag("todo", None, None).unwrap();
        let a = annotation(&tag, "src/lib.rs", TextRange::new(1, 0, 1, 4));
        store.add_annotation(a.clone()).unwrap();

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.tags(), &[tag]);
        assert_eq!(reopened.annotations(), &[a]);
    }

    #[test]
    fn test_other_version_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("annotations.json");
        fs::write(&path, r#"{"version": 7, "tags": [], "annotations": []}"#).unwrap();

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.state().version, STORE_VERSION);
    }

    #[test]
    fn test_tag_colors_follow_palette() {
        let mut store = JsonStore::in_memory();
        let first = store.create_tag("a", None, None).unwrap();
        let second = store.create_tag("b", None, Some("desc".to_string())).unwrap();
        let custom = store.create_tag("c", Some("#000000".to_string()), None).unwrap();

        assert_eq!(first.color, "#e06c75");
        assert_eq!(second.color, "#e5c07b");
        assert_eq!(second.description, "desc");
        assert_eq!(custom.color, "#000000");
    }

    #[test]
    fn test_add_annotation_requires_known_tags() {
        let mut store = JsonStore::in_memory();
        let ghost = Tag {
            id: TagId::new("ghost"),
            name: "ghost".to_string(),
            color: String::new(),
            description: String::new(),
            created_at: 0,
        };
        let a = annotation(&ghost, "a.rs", TextRange::new(0, 0, 0, 1));
        let err = store.add_annotation(a).unwrap_err();
        assert!(matches!(err, StorageError::TagNotFound(_)));
    }

    #[test]
    fn test_delete_tag_cascades_to_annotations() {
        let mut store = JsonStore::in_memory();
        let keep = store.create_tag("keep", None, None).unwrap();
        let drop = store.create_tag("drop", None, None).unwrap();

        let only_dropped = annotation(&drop, "a.rs", TextRange::new(0, 0, 0, 1));
        let mut both = annotation(&keep, "a.rs", TextRange::new(1, 0, 1, 1));
        both.tag_ids.push(drop.id.clone());
        store.add_annotation(only_dropped).unwrap();
        store.add_annotation(both.clone()).unwrap();

        let removed = store.delete_tag(&drop.id).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.annotations().len(), 1);
        assert_eq!(store.annotations()[0].id, both.id);
        assert_eq!(store.annotations()[0].tag_ids, vec![keep.id.clone()]);

        assert!(matches!(
            store.delete_tag(&drop.id),
            Err(StorageError::TagNotFound(_))
        ));
    }

    #[test]
    fn test_update_tag_keeps_unset_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("annotations.json");
        let mut store = JsonStore::open(&path).unwrap();
        let tag = store
            .create_tag("todo", Some("#111111".to_string()), Some("later".to_string()))
            .unwrap();

        let updated = store
            .update_tag(&tag.id, Some("fixme".to_string()), None, None)
            .unwrap();
        assert_eq!(updated.name, "fixme");
        assert_eq!(updated.color, "#111111");
        assert_eq!(updated.description, "later");
        assert_eq!(updated.created_at, tag.created_at);

        store
            .update_tag(&tag.id, None, Some("#222222".to_string()), Some(String::new()))
            .unwrap();
        let reopened = JsonStore::open(&path).unwrap();
        let stored = reopened.tag(&tag.id).unwrap();
        assert_eq!(stored.name, "fixme");
        assert_eq!(stored.color, "#222222");
        assert!(stored.description.is_empty());

        assert!(matches!(
            store.update_tag(&TagId::new("missing"), None, None, None),
            Err(StorageError::TagNotFound(_))
        ));
    }

    #[test]
    fn test_annotations_for_tag() {
        let mut store = JsonStore::in_memory();
        let bug = store.create_tag("bug", None, None).unwrap();
        let perf = store.create_tag("perf", None, None).unwrap();

        let only_bug = annotation(&bug, "a.rs", TextRange::new(0, 0, 0, 1));
        let mut both = annotation(&perf, "b.rs", TextRange::new(1, 0, 1, 1));
        both.tag_ids.push(bug.id.clone());
        store.add_annotation(only_bug.clone()).unwrap();
        store.add_annotation(both.clone()).unwrap();

        let ids: Vec<_> = store.annotations_for_tag(&bug.id).iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![only_bug.id, both.id.clone()]);
        let ids: Vec<_> = store.annotations_for_tag(&perf.id).iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![both.id]);
        assert!(store.annotations_for_tag(&TagId::new("none")).is_empty());
    }

    #[test]
    fn test_annotations_at_position() {
        let mut store = JsonStore::in_memory();
        let tag = store.create_tag("t", None, None).unwrap();
        store
            .add_annotation(annotation(&tag, "a.rs", TextRange::new(2, 4, 4, 1)))
            .unwrap();
        store
            .add_annotation(annotation(&tag, "b.rs", TextRange::new(2, 4, 4, 1)))
            .unwrap();

        assert_eq!(store.annotations_at(Path::new("a.rs"), Position::new(3, 0)).len(), 1);
        assert_eq!(store.annotations_at(Path::new("a.rs"), Position::new(4, 1)).len(), 1);
        assert!(store.annotations_at(Path::new("a.rs"), Position::new(2, 3)).is_empty());
    }

    #[test]
    fn test_persist_replaces_by_id() {
        let mut store = JsonStore::in_memory();
        let tag = store.create_tag("t", None, None).unwrap();
        let mut a = annotation(&tag, "a.rs", TextRange::new(0, 0, 0, 4));
        store.add_annotation(a.clone()).unwrap();

        a.shift_lines(3);
        store.persist(&a).unwrap();
        assert_eq!(store.list_for_file(Path::new("a.rs"))[0].start_line, 3);

        store.delete_annotation(&a.id).unwrap();
        assert!(matches!(
            store.persist(&a),
            Err(StorageError::AnnotationNotFound(_))
        ));
    }

    #[test]
    fn test_rename_path_moves_all_annotations() {
        let mut store = JsonStore::in_memory();
        let tag = store.create_tag("t", None, None).unwrap();
        for line in 0..3 {
            store
                .add_annotation(annotation(&tag, "old.rs", TextRange::new(line, 0, line, 1)))
                .unwrap();
        }
        store
            .add_annotation(annotation(&tag, "other.rs", TextRange::new(0, 0, 0, 1)))
            .unwrap();

        let moved = store.rename_path(Path::new("old.rs"), Path::new("new.rs")).unwrap();
        assert_eq!(moved, 3);
        assert!(store.list_for_file(Path::new("old.rs")).is_empty());
        assert_eq!(store.list_for_file(Path::new("new.rs")).len(), 3);
        assert_eq!(
            store.tracked_files(),
            vec![PathBuf::from("new.rs"), PathBuf::from("other.rs")]
        );
        assert_eq!(store.rename_path(Path::new("missing.rs"), Path::new("x.rs")).unwrap(), 0);
    }

    #[test]
    fn test_reload_picks_up_external_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("annotations.json");

        let mut ours = JsonStore::open(&path).unwrap();
        let mut theirs = JsonStore::open(&path).unwrap();
        theirs.create_tag("bug", None, None).unwrap();

        assert!(ours.reload().unwrap());
        assert_eq!(ours.tags().len(), 1);
        assert!(!ours.reload().unwrap());
    }
}
