//! Line start table for offset/position conversion.
//!
//! `\n`, `\r\n` and a lone `\r` each terminate a line. A document without a
//! trailing newline still counts its last line, and an empty document has
//! exactly one empty line.

/// Byte offsets of every line start in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i + 1),
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                _ => {}
            }
            i += 1;
        }

        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Line containing `offset`. Offsets past the end map to the last line.
    pub fn line_of(&self, offset: usize) -> usize {
        // line_starts[0] == 0, so the partition point is at least 1
        self.line_starts.partition_point(|&start| start <= offset) - 1
    }

    /// Byte span of a line's content, excluding its line break.
    pub fn line_bounds(&self, text: &str, line: usize) -> Option<(usize, usize)> {
        let start = self.line_start(line)?;
        let end = match self.line_start(line + 1) {
            Some(next) => strip_line_break(text.as_bytes(), start, next),
            None => text.len(),
        };
        Some((start, end))
    }
}

fn strip_line_break(bytes: &[u8], start: usize, mut end: usize) -> usize {
    if end > start && bytes[end - 1] == b'\n' {
        end -= 1;
    }
    if end > start && bytes[end - 1] == b'\r' {
        end -= 1;
    }
    end
}

/// Count the line breaks in `text` using the same rules as [`LineIndex`].
pub fn count_line_breaks(text: &str) -> usize {
    LineIndex::new(text).line_count() - 1
}

/// Largest char boundary that is `<= index`.
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary that is `>= index`.
pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_one_line() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_bounds("", 0), Some((0, 0)));
    }

    #[test]
    fn test_trailing_newline_opens_a_final_empty_line() {
        let text = "foo\nbar\n";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_bounds(text, 1), Some((4, 7)));
        assert_eq!(index.line_bounds(text, 2), Some((8, 8)));
        assert_eq!(index.line_bounds(text, 3), None);
    }

    #[test]
    fn test_no_trailing_newline() {
        let text = "foo\nbar";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.line_bounds(text, 1), Some((4, 7)));
    }

    #[test]
    fn test_mixed_line_breaks() {
        let text = "a\r\nb\rc\nd";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_bounds(text, 0), Some((0, 1)));
        assert_eq!(index.line_bounds(text, 1), Some((3, 4)));
        assert_eq!(index.line_bounds(text, 2), Some((5, 6)));
        assert_eq!(index.line_bounds(text, 3), Some((7, 8)));
    }

    #[test]
    fn test_line_of() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.line_of(0), 0);
        assert_eq!(index.line_of(2), 0);
        assert_eq!(index.line_of(3), 1);
        assert_eq!(index.line_of(6), 2);
        assert_eq!(index.line_of(100), 2);
    }

    #[test]
    fn test_count_line_breaks() {
        assert_eq!(count_line_breaks(""), 0);
        assert_eq!(count_line_breaks("one line"), 0);
        assert_eq!(count_line_breaks("a\nb\n"), 2);
        assert_eq!(count_line_breaks("a\r\nb"), 1);
    }

    #[test]
    fn test_char_boundaries() {
        let text = "aé b";
        // 'é' occupies bytes 1..3
        assert_eq!(floor_char_boundary(text, 2), 1);
        assert_eq!(ceil_char_boundary(text, 2), 3);
        assert_eq!(floor_char_boundary(text, 99), text.len());
    }
}
