//! Source positions for the playground parser
//!
//! Two coordinate systems meet here:
//! - **Editor coordinates** ([`Position`], [`Selection`], [`SourceRange`]):
//!   0-indexed line, 0-indexed character.
//! - **Parser coordinates** ([`LineColumn`], [`SourceLocation`]): 1-indexed
//!   line, 0-indexed column, as attached to syntax nodes.
//!
//! Converting a parser line to an editor line is always `line - 1`.
//! Offsets are counted in chars, matching the lexer spans.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Span information for source locations (char offsets)
pub type Span = Range<usize>;

/// A zero-indexed editor position
///
/// `character` counts chars (Unicode scalar values), not UTF-16 code units;
/// hosts speaking UTF-16 convert before calling in.
///
/// Field order matters: the derived ordering compares `line` first and
/// `character` second.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// An editor selection; a zero-width selection is a plain cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width selection at the cursor
    pub fn point(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Selection with `start <= end`, regardless of the drag direction
    pub fn normalized(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

/// A range in editor coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: Position,
    pub end: Position,
}

/// A parser position: 1-indexed line, 0-indexed column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

impl LineColumn {
    /// Convert to editor coordinates
    pub fn to_position(self) -> Position {
        Position {
            line: self.line.saturating_sub(1),
            character: self.column,
        }
    }
}

/// Start and end of a syntax node in parser coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl SourceLocation {
    pub fn to_range(self) -> SourceRange {
        SourceRange {
            start: self.start.to_position(),
            end: self.end.to_position(),
        }
    }
}

/// Maps char offsets to lines and back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Char offset at which each line starts
    line_starts: Vec<usize>,
    /// Total length in chars
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut len = 0;
        for ch in text.chars() {
            len += 1;
            if ch == '\n' {
                line_starts.push(len);
            }
        }
        Self { line_starts, len }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Parser coordinates of a char offset
    pub fn line_column(&self, offset: usize) -> LineColumn {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        LineColumn {
            line: line + 1,
            column: offset - self.line_starts[line],
        }
    }

    /// Parser coordinates of a span
    pub fn location(&self, span: &Span) -> SourceLocation {
        SourceLocation {
            start: self.line_column(span.start),
            end: self.line_column(span.end),
        }
    }

    /// Char offset of an editor position, clamped to the text
    pub fn offset(&self, position: Position) -> usize {
        let Some(&line_start) = self.line_starts.get(position.line) else {
            return self.len;
        };
        let line_end = match self.line_starts.get(position.line + 1) {
            Some(next) => next - 1,
            None => self.len,
        };
        (line_start + position.character).min(line_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(0, 10) < Position::new(1, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert_eq!(Position::new(1, 1), Position::new(1, 1));
    }

    #[test]
    fn test_selection_normalized() {
        let sel = Selection::new(Position::new(3, 1), Position::new(1, 0)).normalized();
        assert_eq!(sel.start, Position::new(1, 0));
        assert_eq!(sel.end, Position::new(3, 1));
        assert!(Selection::point(Position::new(0, 0)).is_empty());
    }

    #[test]
    fn test_line_column_is_one_indexed() {
        let index = LineIndex::new("use('a');\ndb.b");
        assert_eq!(index.line_column(0), LineColumn { line: 1, column: 0 });
        assert_eq!(index.line_column(9), LineColumn { line: 1, column: 9 });
        assert_eq!(index.line_column(10), LineColumn { line: 2, column: 0 });
        assert_eq!(index.line_column(14), LineColumn { line: 2, column: 4 });
        assert_eq!(index.line_count(), 2);
    }

    #[test]
    fn test_to_position_subtracts_one_line() {
        let lc = LineColumn { line: 3, column: 7 };
        assert_eq!(lc.to_position(), Position::new(2, 7));
    }

    #[test]
    fn test_offset_clamps() {
        let index = LineIndex::new("ab\ncdef\n");
        assert_eq!(index.offset(Position::new(0, 1)), 1);
        assert_eq!(index.offset(Position::new(0, 10)), 2);
        assert_eq!(index.offset(Position::new(1, 2)), 5);
        assert_eq!(index.offset(Position::new(2, 0)), 8);
        assert_eq!(index.offset(Position::new(9, 0)), 8);
    }

    #[test]
    fn test_multibyte_chars_count_once() {
        let index = LineIndex::new("é\nü");
        assert_eq!(index.line_column(2), LineColumn { line: 2, column: 0 });
    }
}
