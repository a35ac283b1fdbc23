//! End-to-end range tracking against a store on disk.

use std::path::{Path, PathBuf};

use tagmire::storage::AnnotationStore;
use tagmire::tracking::{AnnotationDraft, DocumentEvent, RangeTracker, TextChange};
use tagmire::{Annotation, JsonStore, TagId, TextDocument, TextRange};
use tempfile::TempDir;

const FILE: &str = "src/lib.rs";

/// Store at `dir` with one tag and one annotation captured from `text`.
fn store_with(
    dir: &TempDir,
    text: &str,
    range: TextRange,
    context_lines: u32,
) -> (JsonStore, Annotation) {
    let mut store = JsonStore::open(dir.path().join("annotations.json")).unwrap();
    let tag = store.create_tag("review", None, None).unwrap();

    let annotation = AnnotationDraft::new(FILE, range, vec![tag.id])
        .capture(&TextDocument::new(text), context_lines)
        .unwrap();
    store.add_annotation(annotation.clone()).unwrap();
    (store, annotation)
}

fn reopen(dir: &TempDir) -> JsonStore {
    JsonStore::open(dir.path().join("annotations.json")).unwrap()
}

fn stored_range(store: &JsonStore) -> TextRange {
    store.list_for_file(Path::new(FILE))[0].range()
}

#[test]
fn test_insert_above_picks_match_followed_by_context() {
    let dir = TempDir::new().unwrap();
    let (store, annotation) = store_with(&dir, "foo\nbar\nfoo\n", TextRange::new(0, 0, 0, 3), 1);
    assert_eq!(annotation.context_after, "\nbar");

    let mut tracker = RangeTracker::new(store);
    let report = tracker
        .handle(DocumentEvent::Changed {
            path: PathBuf::from(FILE),
            text: "foo\nfoo\nbar\nfoo\n".to_string(),
            changes: vec![TextChange::replacing(0, 0, "foo\n")],
        })
        .unwrap();

    assert_eq!(report.reanchored, vec![annotation.id.clone()]);
    assert_eq!(report.persisted, 1);
    assert_eq!(stored_range(&reopen(&dir)), TextRange::new(1, 0, 1, 3));
}

#[test]
fn test_edit_above_shifts_without_reanchoring() {
    let text = "0\n1\n2\n3\n4\n  target  \n6\n";
    let dir = TempDir::new().unwrap();
    let (store, annotation) = store_with(&dir, text, TextRange::new(5, 2, 5, 8), 2);

    let mut tracker = RangeTracker::new(store);
    // Lines 0..=1 replaced by text spanning three line breaks
    let report = tracker
        .document_changed(
            Path::new(FILE),
            &TextDocument::new("a\nb\nc\nd\n2\n3\n4\n  target  \n6\n"),
            &[TextChange::new(0, 1, 3)],
        )
        .unwrap();

    assert_eq!(report.reanchor_attempts, 0);
    assert_eq!(report.shifted, vec![annotation.id]);
    assert_eq!(stored_range(&reopen(&dir)), TextRange::new(7, 2, 7, 8));
}

#[test]
fn test_inserted_lines_shift_by_exact_count() {
    let text = "fn a() {}\n\nfn b() {\n    body();\n}\n";
    let dir = TempDir::new().unwrap();
    let (store, _) = store_with(&dir, text, TextRange::new(2, 3, 4, 1), 2);
    let mut tracker = RangeTracker::new(store);

    let mut current = text.to_string();
    for k in 1..=3u32 {
        let inserted = "// x\n".repeat(k as usize);
        current = format!("{inserted}{current}");

        let before = stored_range(tracker.store());
        tracker
            .document_changed(
                Path::new(FILE),
                &TextDocument::new(current.as_str()),
                &[TextChange::replacing(0, 0, &inserted)],
            )
            .unwrap();
        let after = stored_range(tracker.store());

        assert_eq!(after.start.line, before.start.line + k);
        assert_eq!(after.end.line, before.end.line + k);
        assert_eq!(after.start.character, before.start.character);
        assert_eq!(after.end.character, before.end.character);
    }
}

#[test]
fn test_reopen_with_deleted_content_keeps_coordinates() {
    let dir = TempDir::new().unwrap();
    let (store, annotation) = store_with(
        &dir,
        "keep\nremove me\nkeep\n",
        TextRange::new(1, 0, 1, 9),
        2,
    );
    let mut tracker = RangeTracker::new(store);

    let report = tracker
        .handle(DocumentEvent::Opened {
            path: PathBuf::from(FILE),
            text: "keep\nrewritten\nkeep\n".to_string(),
        })
        .unwrap();

    assert_eq!(report.not_found, vec![annotation.id]);
    assert_eq!(report.persisted, 0);
    assert_eq!(stored_range(&reopen(&dir)), TextRange::new(1, 0, 1, 9));
}

#[test]
fn test_reopen_after_file_shrank_still_reanchors() {
    let text = "a\nb\nc\nd\ne\nneedle\n";
    let dir = TempDir::new().unwrap();
    let (store, _) = store_with(&dir, text, TextRange::new(5, 0, 5, 6), 2);
    let mut tracker = RangeTracker::new(store);

    let report = tracker
        .handle(DocumentEvent::Opened {
            path: PathBuf::from(FILE),
            text: "needle".to_string(),
        })
        .unwrap();

    assert_eq!(report.reanchored.len(), 1);
    assert_eq!(stored_range(tracker.store()), TextRange::new(0, 0, 0, 6));
}

#[test]
fn test_rename_retargets_every_annotation() {
    let dir = TempDir::new().unwrap();
    let (mut store, _) = store_with(&dir, "x\ny\n", TextRange::new(0, 0, 0, 1), 0);
    let tag: TagId = store.tags()[0].id.clone();
    let second = AnnotationDraft::new(FILE, TextRange::new(1, 0, 1, 1), vec![tag])
        .capture(&TextDocument::new("x\ny\n"), 0)
        .unwrap();
    store.add_annotation(second).unwrap();

    let mut tracker = RangeTracker::new(store);
    let report = tracker
        .handle(DocumentEvent::Renamed {
            renames: vec![(PathBuf::from(FILE), PathBuf::from("src/moved.rs"))],
        })
        .unwrap();

    assert_eq!(report.renamed, 2);
    let store = reopen(&dir);
    assert!(store.list_for_file(Path::new(FILE)).is_empty());
    assert_eq!(store.list_for_file(Path::new("src/moved.rs")).len(), 2);
}

#[test]
fn test_multibyte_columns_are_utf16() {
    // 'é' is one UTF-16 unit, the emoji two
    let text = "é😀 target\n";
    let dir = TempDir::new().unwrap();
    let (store, annotation) = store_with(&dir, text, TextRange::new(0, 4, 0, 10), 0);
    assert_eq!(annotation.content_snapshot, "target");

    let mut tracker = RangeTracker::new(store);
    tracker
        .handle(DocumentEvent::Opened {
            path: PathBuf::from(FILE),
            text: "\n😀😀 target\n".to_string(),
        })
        .unwrap();

    assert_eq!(stored_range(tracker.store()), TextRange::new(1, 5, 1, 11));
}
