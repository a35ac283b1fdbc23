//! Building new annotations from a selected range.

use std::path::PathBuf;

use crate::document::DocumentSource;
use crate::tracking::error::{TrackingError, TrackingResult};
use crate::types::{Annotation, AnnotationId, Position, TagId, TextRange};
use crate::utils::{generate_id, get_utc_timestamp_millis};

/// Default number of lines captured on each side of a new annotation.
pub const DEFAULT_CONTEXT_LINES: u32 = 2;

/// Everything the user chose when tagging a selection.
#[derive(Debug, Clone)]
pub struct AnnotationDraft {
    pub file_path: PathBuf,
    pub range: TextRange,
    pub tag_ids: Vec<TagId>,
    pub note: String,
}

impl AnnotationDraft {
    pub fn new(file_path: impl Into<PathBuf>, range: TextRange, tag_ids: Vec<TagId>) -> Self {
        Self {
            file_path: file_path.into(),
            range,
            tag_ids,
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Snapshot the selected text and up to `context_lines` lines on either
    /// side of it.
    pub fn capture<D: DocumentSource + ?Sized>(
        self,
        doc: &D,
        context_lines: u32,
    ) -> TrackingResult<Annotation> {
        if self.tag_ids.is_empty() {
            return Err(TrackingError::NoTags);
        }

        let range = TextRange::ordered(self.range.start, self.range.end);
        let out_of_bounds = || TrackingError::OutOfBounds {
            path: self.file_path.clone(),
            range,
        };

        let snapshot = doc.text_in(range).ok_or_else(out_of_bounds)?;
        if snapshot.is_empty() {
            return Err(TrackingError::EmptySelection {
                path: self.file_path.clone(),
                range,
            });
        }

        // Columns past the end of a line were clamped; store what was read
        let start = doc.position_at(doc.offset_at(range.start));
        let end = doc.position_at(doc.offset_at(range.end));

        let before_start = Position::new(start.line.saturating_sub(context_lines), 0);
        let last_line = doc.line_count().saturating_sub(1) as u32;
        let after_end = doc.line_end(end.line.saturating_add(context_lines).min(last_line));

        let context_before = doc
            .text_in(TextRange { start: before_start, end: start })
            .unwrap_or_default()
            .to_string();
        let context_after = doc
            .text_in(TextRange { start: end, end: after_end })
            .unwrap_or_default()
            .to_string();

        Ok(Annotation {
            id: AnnotationId::new(generate_id()),
            tag_ids: self.tag_ids,
            file_path: self.file_path,
            start_line: start.line,
            start_char: start.character,
            end_line: end.line,
            end_char: end.character,
            content_snapshot: snapshot.to_string(),
            context_before,
            context_after,
            note: self.note,
            created_at: get_utc_timestamp_millis(),
        })
    }
}
