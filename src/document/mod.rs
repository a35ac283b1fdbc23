//! Document text access and position conversion.
//!
//! Annotation coordinates use zero-based lines and UTF-16 columns, the
//! convention most editors speak. The tracking engine works on byte offsets
//! into the UTF-8 text, so every document exposes conversions both ways.

mod line_index;

pub use line_index::{LineIndex, ceil_char_boundary, count_line_breaks, floor_char_boundary};

use std::path::{Path, PathBuf};

use crate::types::{Position, TextRange};

/// Read access to the current text of one document.
pub trait DocumentSource {
    /// Full current text.
    fn text(&self) -> &str;

    /// Number of lines, counting a final line without a trailing newline.
    fn line_count(&self) -> usize;

    /// Convert a byte offset to a position. Offsets past the end clamp to
    /// the end of the document.
    fn position_at(&self, offset: usize) -> Position;

    /// Convert a position to a byte offset. Lines past the end clamp to the
    /// end of the document, columns past the end of a line clamp to the end
    /// of that line.
    fn offset_at(&self, position: Position) -> usize;

    /// Text covered by `range`, or `None` when the range reaches past the
    /// last line.
    fn text_in(&self, range: TextRange) -> Option<&str> {
        let line_count = self.line_count();
        if range.start.line as usize >= line_count || range.end.line as usize >= line_count {
            return None;
        }
        let start = self.offset_at(range.start);
        let end = self.offset_at(range.end);
        if start > end {
            return None;
        }
        self.text().get(start..end)
    }

    /// Position just past the last character of `line`, excluding the line
    /// break.
    fn line_end(&self, line: u32) -> Position {
        self.position_at(self.offset_at(Position::new(line, u32::MAX)))
    }
}

/// In-memory document snapshot with a precomputed line index.
#[derive(Debug, Clone)]
pub struct TextDocument {
    text: String,
    index: LineIndex,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let index = LineIndex::new(&text);
        Self { text, index }
    }

    /// Load a document from disk.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl DocumentSource for TextDocument {
    fn text(&self) -> &str {
        &self.text
    }

    fn line_count(&self) -> usize {
        self.index.line_count()
    }

    fn position_at(&self, offset: usize) -> Position {
        let offset = floor_char_boundary(&self.text, offset);
        let line = self.index.line_of(offset);
        let (start, end) = self
            .index
            .line_bounds(&self.text, line)
            .unwrap_or((offset, offset));
        // An offset between '\r' and '\n' sits at the end of the line
        let offset = offset.min(end);
        let character = self.text[start..offset].encode_utf16().count();

        Position::new(line as u32, character as u32)
    }

    fn offset_at(&self, position: Position) -> usize {
        let Some((start, end)) = self.index.line_bounds(&self.text, position.line as usize)
        else {
            return self.text.len();
        };

        let mut units = 0u32;
        for (i, ch) in self.text[start..end].char_indices() {
            if units >= position.character {
                return start + i;
            }
            units += ch.len_utf16() as u32;
            if units > position.character {
                // Column points into the middle of a surrogate pair
                return start + i;
            }
        }
        end
    }
}

/// Resolves workspace-relative paths to documents on disk.
#[derive(Debug, Clone)]
pub struct FileSystemDocuments {
    root: PathBuf,
}

impl FileSystemDocuments {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn absolute(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }

    /// Workspace-relative form of `path`; paths outside the root are
    /// returned unchanged.
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| path.to_path_buf())
    }

    pub fn load(&self, relative: &Path) -> std::io::Result<TextDocument> {
        TextDocument::read(&self.absolute(relative))
    }
}
