//! Selection geometry and the selection visitor
//!
//! Syntax nodes carry parser coordinates (1-indexed lines) while selections
//! come from the editor (0-indexed lines). Every helper converts the node
//! side with [`SourceLocation::to_range`], which subtracts one from the line,
//! and then compares full `(line, character)` positions. Both ends are
//! inclusive and column 0 is an ordinary boundary.

use super::state::SelectionState;
use super::walk::Visit;
use crate::parser::ast::*;
use crate::parser::{LineIndex, Selection, SourceLocation, SourceRange, Span};

/// The node lies entirely inside the selection
pub fn is_within_selection(loc: &SourceLocation, selection: &Selection) -> bool {
    let range = loc.to_range();
    selection.start <= range.start && range.end <= selection.end
}

/// The node encloses the whole selection
pub fn is_around_selection(loc: &SourceLocation, selection: &Selection) -> bool {
    let range = loc.to_range();
    range.start <= selection.start && selection.end <= range.end
}

/// The node ends at or before the start of the selection
pub fn is_before_selection(loc: &SourceLocation, selection: &Selection) -> bool {
    loc.to_range().end <= selection.start
}

/// The node shares at least one line with the selection
pub fn is_on_selection_line(loc: &SourceLocation, selection: &Selection) -> bool {
    let range = loc.to_range();
    range.start.line <= selection.end.line && selection.start.line <= range.end.line
}

/// Collects the code structure around a selection
pub(crate) struct SelectionVisitor<'a> {
    line_index: &'a LineIndex,
    selection: Selection,
    state: SelectionState,
}

impl<'a> SelectionVisitor<'a> {
    pub(crate) fn new(line_index: &'a LineIndex, selection: Selection) -> Self {
        Self {
            line_index,
            selection: selection.normalized(),
            state: SelectionState::default(),
        }
    }

    /// Record the top-level statements on the selected lines
    pub(crate) fn collect_statements(&mut self, program: &Program) {
        for stmt in &program.body {
            if matches!(stmt, Stmt::Empty(_)) {
                continue;
            }
            let loc = self.line_index.location(stmt.span());
            if is_on_selection_line(&loc, &self.selection) {
                self.state.statements.push(loc.to_range());
            }
        }
    }

    pub(crate) fn into_state(self) -> SelectionState {
        self.state
    }

    fn location(&self, span: &Span) -> SourceLocation {
        self.line_index.location(span)
    }

    /// Range of the node if it encloses the selection
    fn around(&self, span: &Span) -> Option<SourceRange> {
        let loc = self.location(span);
        is_around_selection(&loc, &self.selection).then(|| loc.to_range())
    }

    /// A literal counts as selected only for a real, non-empty selection
    fn selects(&self, span: &Span) -> bool {
        !self.selection.is_empty() && is_within_selection(&self.location(span), &self.selection)
    }
}

impl Visit for SelectionVisitor<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if matches!(stmt, Stmt::Empty(_)) {
            return;
        }
        if let Some(range) = self.around(stmt.span()) {
            self.state.enclosing_statement = Some(range);
        }
    }

    fn visit_call(&mut self, call: &CallExpr) {
        if let Some(range) = self.around(&call.span) {
            self.state.enclosing_call = Some(range);
        }
    }

    fn visit_object(&mut self, object: &ObjectExpr) {
        if self.selects(&object.span) {
            self.state.is_object_selection = true;
        }
    }

    fn visit_array(&mut self, array: &ArrayExpr) {
        if self.selects(&array.span) {
            self.state.is_array_selection = true;
        }
        if let Some(range) = self.around(&array.span) {
            self.state.enclosing_array = Some(range);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{LineColumn, Position};

    fn loc(start: (usize, usize), end: (usize, usize)) -> SourceLocation {
        SourceLocation {
            start: LineColumn {
                line: start.0,
                column: start.1,
            },
            end: LineColumn {
                line: end.0,
                column: end.1,
            },
        }
    }

    fn sel(start: (usize, usize), end: (usize, usize)) -> Selection {
        Selection::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
    }

    #[test]
    fn test_within_applies_line_offset() {
        // Parser line 2 is editor line 1
        let node = loc((2, 0), (2, 10));
        assert!(is_within_selection(&node, &sel((1, 0), (1, 10))));
        assert!(!is_within_selection(&node, &sel((2, 0), (2, 10))));
    }

    #[test]
    fn test_within_boundaries_are_inclusive() {
        let node = loc((1, 0), (3, 4));
        assert!(is_within_selection(&node, &sel((0, 0), (2, 4))));
        assert!(!is_within_selection(&node, &sel((0, 1), (2, 4))));
        assert!(!is_within_selection(&node, &sel((0, 0), (2, 3))));
    }

    #[test]
    fn test_within_compares_columns_only_on_boundary_lines() {
        // Starts at column 8 on the first selected line, selection starts at column 2
        let node = loc((1, 8), (2, 1));
        assert!(is_within_selection(&node, &sel((0, 2), (1, 5))));
        // A later start line needs no column comparison
        let node = loc((2, 0), (2, 1));
        assert!(is_within_selection(&node, &sel((0, 9), (1, 5))));
    }

    #[test]
    fn test_around_selection() {
        let node = loc((1, 0), (1, 20));
        assert!(is_around_selection(&node, &sel((0, 5), (0, 5))));
        assert!(is_around_selection(&node, &sel((0, 0), (0, 20))));
        assert!(!is_around_selection(&node, &sel((0, 0), (1, 0))));
    }

    #[test]
    fn test_before_selection() {
        let node = loc((1, 0), (1, 9));
        assert!(is_before_selection(&node, &sel((0, 9), (0, 9))));
        assert!(is_before_selection(&node, &sel((1, 0), (1, 0))));
        assert!(!is_before_selection(&node, &sel((0, 8), (0, 8))));
    }

    #[test]
    fn test_on_selection_line() {
        let node = loc((2, 4), (4, 1));
        assert!(is_on_selection_line(&node, &sel((1, 30), (1, 30))));
        assert!(is_on_selection_line(&node, &sel((3, 0), (5, 0))));
        assert!(!is_on_selection_line(&node, &sel((0, 0), (0, 3))));
        assert!(!is_on_selection_line(&node, &sel((4, 0), (4, 0))));
    }
}
