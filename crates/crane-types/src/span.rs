use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span.
///
/// All line/column values are 1-based. Columns count raw characters (a tab
/// is one column here even though indentation measures it as four).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "line")]
    pub start_line: u32,
    #[serde(rename = "column")]
    pub start_col: u32,
    pub end_line: u32,
    #[serde(rename = "end_column")]
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Zero-width span at a single position.
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Span covering `len` characters of one line, starting at `col`.
    pub fn on_line(line: u32, col: u32, len: u32) -> Self {
        Self::new(line, col, line, col + len.saturating_sub(1))
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        let (start_line, start_col) =
            (self.start_line, self.start_col).min((other.start_line, other.start_col));
        let (end_line, end_col) = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span::new(start_line, start_col, end_line, end_col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A script's source text, split into physical lines for the
/// line-oriented lexer and for error context.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    lines: Vec<String>,
}

impl SourceFile {
    /// Create a source file. `\r\n` and lone `\r` are normalized to `\n`.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into().replace("\r\n", "\n").replace('\r', "\n");
        let lines = source.split('\n').map(str::to_string).collect();
        Self {
            name: name.into(),
            source,
            lines,
        }
    }

    /// Extract a source line by 1-based line number.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        self.lines.get(idx).map(String::as_str)
    }

    /// Iterate over `(line_number, text)` pairs, 1-based.
    pub fn lines(&self) -> impl Iterator<Item = (u32, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, l)| (i as u32 + 1, l.as_str()))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_across_lines() {
        let a = Span::new(1, 5, 1, 10);
        let b = Span::new(2, 3, 2, 8);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(1, 5, 2, 8));
    }

    #[test]
    fn test_span_merge_same_line() {
        let a = Span::new(1, 5, 1, 10);
        let b = Span::new(1, 3, 1, 8);
        let merged = a.merge(b);
        assert_eq!(merged.start_col, 3);
        assert_eq!(merged.end_col, 10);
    }

    #[test]
    fn test_span_on_line() {
        let s = Span::on_line(4, 2, 5);
        assert_eq!(s, Span::new(4, 2, 4, 6));
        assert_eq!(Span::on_line(1, 1, 0), Span::point(1, 1));
    }

    #[test]
    fn test_span_display() {
        assert_eq!(format!("{}", Span::new(3, 7, 3, 15)), "3:7");
    }

    #[test]
    fn test_source_file_normalizes_line_endings() {
        let src = SourceFile::new("main.py", "move()\r\nlift()\rplace()");
        assert_eq!(src.line_count(), 3);
        assert_eq!(src.line(1), Some("move()"));
        assert_eq!(src.line(2), Some("lift()"));
        assert_eq!(src.line(3), Some("place()"));
        assert_eq!(src.line(0), None);
        assert_eq!(src.line(4), None);
    }

    #[test]
    fn test_source_file_lines_are_numbered_from_one() {
        let src = SourceFile::new("main.py", "a\n\nb");
        let numbered: Vec<_> = src.lines().collect();
        assert_eq!(numbered, vec![(1, "a"), (2, ""), (3, "b")]);
    }

    #[test]
    fn test_source_file_empty() {
        let src = SourceFile::new("main.py", "");
        assert_eq!(src.line_count(), 1);
        assert_eq!(src.line(1), Some(""));
    }
}
