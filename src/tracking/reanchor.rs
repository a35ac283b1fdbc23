//! Reanchoring: recover an annotation's position from its content snapshot.
//!
//! The snapshot is searched for literally in the current document. A single
//! hit wins outright; several hits are ranked by how well the text around
//! each one matches the stored context windows, with ties going to the
//! earliest hit. Nothing here can fail: content that cannot be found is
//! reported as [`Anchor::NotFound`] and the annotation keeps its last known
//! coordinates.

use crate::document::{DocumentSource, ceil_char_boundary, floor_char_boundary};
use crate::types::{Annotation, TextRange};

/// Outcome of reanchoring one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Snapshot located at byte `offset`; `changed` tells whether the
    /// annotation's coordinates were updated.
    Found { offset: usize, changed: bool },
    /// Snapshot is empty or no longer present.
    NotFound,
}

impl Anchor {
    pub fn is_found(&self) -> bool {
        matches!(self, Anchor::Found { .. })
    }

    pub fn changed(&self) -> bool {
        matches!(self, Anchor::Found { changed: true, .. })
    }
}

/// Start offsets of every occurrence of `needle` in `haystack`, including
/// overlapping ones. Each search resumes one character after the previous
/// match start.
pub fn find_occurrences(haystack: &str, needle: &str) -> Vec<usize> {
    let mut matches = Vec::new();
    if needle.is_empty() {
        return matches;
    }

    let mut from = 0;
    while let Some(found) = haystack.get(from..).and_then(|rest| rest.find(needle)) {
        let start = from + found;
        matches.push(start);
        from = ceil_char_boundary(haystack, start + 1);
    }

    matches
}

/// Context score for a candidate match at `offset` (0 to 4).
///
/// Each side contributes 2 when the surrounding text contains the whole
/// trimmed context, 1 when it contains only the trimmed nearest line of it,
/// and 0 otherwise. A nearest line that is empty before trimming never
/// scores; one made only of indentation trims to "" and always does. The
/// surrounding text is clipped to the context's own length.
pub fn context_score(
    text: &str,
    offset: usize,
    snapshot_len: usize,
    context_before: &str,
    context_after: &str,
) -> u8 {
    let mut score = 0;

    if !context_before.is_empty() {
        let start = floor_char_boundary(text, offset.saturating_sub(context_before.len()));
        let actual = &text[start..offset];
        let nearest_line = context_before.split('\n').next_back().unwrap_or("");
        score += side_score(actual, context_before, nearest_line);
    }

    if !context_after.is_empty() {
        let match_end = offset + snapshot_len;
        let end = ceil_char_boundary(text, match_end + context_after.len());
        let actual = &text[match_end..end];
        let nearest_line = context_after.split('\n').next().unwrap_or("");
        score += side_score(actual, context_after, nearest_line);
    }

    score
}

fn side_score(actual: &str, context: &str, nearest_line: &str) -> u8 {
    if actual.contains(context.trim()) {
        return 2;
    }
    if !nearest_line.is_empty() && actual.contains(nearest_line.trim()) {
        return 1;
    }
    0
}

/// Pick the best-scoring candidate. Candidates are visited in ascending
/// offset order and only a strictly higher score replaces the current best,
/// so ties resolve to the earliest match.
pub fn select_candidate(text: &str, candidates: &[usize], annotation: &Annotation) -> Option<usize> {
    let snapshot_len = annotation.content_snapshot.len();
    let mut best: Option<(usize, u8)> = None;

    for &offset in candidates {
        let score = context_score(
            text,
            offset,
            snapshot_len,
            &annotation.context_before,
            &annotation.context_after,
        );
        crate::debug_event!("reanchor", "candidate", "offset {offset} score {score}");

        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((offset, score));
        }
    }

    best.map(|(offset, _)| offset)
}

/// Whether the text currently at the annotation's range equals its snapshot.
/// A range reaching past the end of the document is never anchored.
pub fn is_anchored<D: DocumentSource + ?Sized>(annotation: &Annotation, doc: &D) -> bool {
    doc.text_in(annotation.range()) == Some(annotation.content_snapshot.as_str())
}

/// Recompute an annotation's coordinates from its snapshot.
///
/// On success the annotation's range is rewritten from the match offset and
/// `offset + snapshot length`, converted against the current document text.
pub fn reanchor<D: DocumentSource + ?Sized>(annotation: &mut Annotation, doc: &D) -> Anchor {
    if annotation.content_snapshot.is_empty() {
        crate::debug_event!("reanchor", "skipped", "{} has an empty snapshot", annotation.id);
        return Anchor::NotFound;
    }

    let text = doc.text();
    let candidates = find_occurrences(text, &annotation.content_snapshot);

    let offset = match candidates.as_slice() {
        [] => {
            crate::debug_event!("reanchor", "not found", "{}", annotation.id);
            return Anchor::NotFound;
        }
        [only] => *only,
        many => match select_candidate(text, many, annotation) {
            Some(offset) => offset,
            None => return Anchor::NotFound,
        },
    };

    let start = doc.position_at(offset);
    let end = doc.position_at(offset + annotation.content_snapshot.len());
    let changed = annotation.set_range(TextRange { start, end });

    crate::debug_event!(
        "reanchor",
        "found",
        "{} at {} of {} candidates (changed: {changed})",
        annotation.id,
        start,
        candidates.len()
    );

    Anchor::Found { offset, changed }
}
