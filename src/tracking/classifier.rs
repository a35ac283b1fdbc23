//! Edit classification: decides per annotation whether a text change can be
//! absorbed by a cheap line shift or needs a full reanchor.

use crate::document::count_line_breaks;
use crate::types::Annotation;

/// One discrete replacement inside a change event.
///
/// `start_line..=end_line` is the line span that was replaced (in the text
/// before the change); `new_line_count` is the number of line breaks in the
/// replacement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChange {
    pub start_line: u32,
    pub end_line: u32,
    pub new_line_count: u32,
}

/// What a change event means for one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Coordinates stay as they are.
    Unaffected,
    /// Add the delta to both line numbers; columns stay.
    ShiftBy(i64),
    /// The change touches the annotation's lines.
    NeedsReanchor,
}

impl TextChange {
    pub fn new(start_line: u32, end_line: u32, new_line_count: u32) -> Self {
        Self {
            start_line,
            end_line,
            new_line_count,
        }
    }

    /// Describe replacing lines `start_line..=end_line` with `replacement`.
    pub fn replacing(start_line: u32, end_line: u32, replacement: &str) -> Self {
        Self::new(start_line, end_line, count_line_breaks(replacement) as u32)
    }

    pub fn line_delta(&self) -> i64 {
        i64::from(self.new_line_count) - (i64::from(self.end_line) - i64::from(self.start_line))
    }

    /// Classify this change against an annotation spanning
    /// `start_line..=end_line`.
    ///
    /// A change that adds or removes no lines never shifts anything, but it
    /// still forces a reanchor when it lands on the annotation's lines.
    pub fn classify(&self, start_line: i64, end_line: i64) -> Classification {
        let delta = self.line_delta();

        if i64::from(self.end_line) < start_line {
            if delta == 0 {
                Classification::Unaffected
            } else {
                Classification::ShiftBy(delta)
            }
        } else if i64::from(self.start_line) > end_line {
            Classification::Unaffected
        } else {
            Classification::NeedsReanchor
        }
    }
}

/// Classify every change of one event against an annotation.
///
/// Shifts accumulate, and each later change is compared against the
/// annotation's already-shifted lines. `NeedsReanchor` is sticky: once any
/// change lands on the annotation, later shifts cannot downgrade it.
pub fn classify_changes(changes: &[TextChange], annotation: &Annotation) -> Classification {
    let mut total = 0i64;

    for change in changes {
        let start = i64::from(annotation.start_line) + total;
        let end = i64::from(annotation.end_line) + total;

        match change.classify(start, end) {
            Classification::NeedsReanchor => return Classification::NeedsReanchor,
            Classification::ShiftBy(delta) => total += delta,
            Classification::Unaffected => {}
        }
    }

    if total == 0 {
        Classification::Unaffected
    } else {
        Classification::ShiftBy(total)
    }
}
