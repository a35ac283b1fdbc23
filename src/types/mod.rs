use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

/// Zero-based line and UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// Half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

/// A tagged note over a range of a workspace file.
///
/// Coordinates are stored flat so the persisted record keeps the
/// `startLine`/`startChar`/`endLine`/`endChar` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    pub tag_ids: Vec<TagId>,
    /// Path relative to the workspace root.
    pub file_path: PathBuf,
    pub start_line: u32,
    pub start_char: u32,
    pub end_line: u32,
    pub end_char: u32,
    /// Exact text the range covered when last anchored.
    pub content_snapshot: String,
    #[serde(default)]
    pub context_before: String,
    #[serde(default)]
    pub context_after: String,
    #[serde(default)]
    pub note: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
    pub created_at: u64,
}

impl AnnotationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TagId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

impl FromStr for Position {
    type Err = String;

    /// Parses `line:character`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, character) = s
            .split_once(':')
            .ok_or_else(|| format!("expected line:character, got '{s}'"))?;
        let line = line
            .trim()
            .parse()
            .map_err(|e| format!("invalid line '{line}': {e}"))?;
        let character = character
            .trim()
            .parse()
            .map_err(|e| format!("invalid character '{character}': {e}"))?;
        Ok(Self { line, character })
    }
}

impl TextRange {
    pub fn new(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        Self {
            start: Position::new(start_line, start_char),
            end: Position::new(end_line, end_char),
        }
    }

    /// Build a range from two positions in any order.
    pub fn ordered(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Inclusive on both ends, matching how a cursor sitting on either
    /// boundary is considered inside the annotation.
    pub fn contains(&self, position: Position) -> bool {
        position >= self.start && position <= self.end
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl Annotation {
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start_line, self.start_char, self.end_line, self.end_char)
    }

    /// Overwrite the coordinates, returning whether anything changed.
    pub fn set_range(&mut self, range: TextRange) -> bool {
        if self.range() == range {
            return false;
        }
        self.start_line = range.start.line;
        self.start_char = range.start.character;
        self.end_line = range.end.line;
        self.end_char = range.end.character;
        true
    }

    /// Move both lines by `delta`, leaving columns alone.
    pub fn shift_lines(&mut self, delta: i64) {
        self.start_line = shift(self.start_line, delta);
        self.end_line = shift(self.end_line, delta);
    }

    pub fn has_tag(&self, tag: &TagId) -> bool {
        self.tag_ids.contains(tag)
    }
}

fn shift(line: u32, delta: i64) -> u32 {
    (i64::from(line) + delta).clamp(0, i64::from(u32::MAX)) as u32
}
