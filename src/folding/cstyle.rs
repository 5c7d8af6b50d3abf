//! C-style folding: `{}` and `[]` blocks plus `/* */` comments

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{
    find_closing_bracket, find_opening_bracket, first_non_blank, FoldStyle, FoldWidget,
    FoldWidgetProvider,
};
use crate::display_map::{Point, Range};
use crate::document::TextSource;

const START_PATTERN: &str = r"(\{|\[)[^\}\]]*$|^\s*(/\*)";
const STOP_PATTERN: &str = r"^[^\[\{]*(\}|\])|^[\s\*]*(\*/)";

/// An unclosed opening bracket at the end of a line, or a comment opener
static START_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(START_PATTERN).expect("start marker pattern is valid")
});

/// A closing bracket with no opener before it, or a comment closer
static STOP_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(STOP_PATTERN).expect("stop marker pattern is valid")
});

/// Fold provider for brace languages (Rust, C, JavaScript, JSON, ...)
#[derive(Clone, Copy, Debug, Default)]
pub struct CstyleFoldProvider;

impl CstyleFoldProvider {
    pub fn new() -> Self {
        Self
    }

    /// Range for `row`; a `style` of `None` accepts single-row comment ranges
    fn range_for(
        &self,
        doc: &dyn TextSource,
        style: Option<FoldStyle>,
        row: usize,
        force_multiline: bool,
    ) -> Option<Range> {
        let line = doc.line(row);

        if let Some(caps) = START_MARKER.captures(&line) {
            let (index, len) = match_span(&line, &caps);
            if let Some(bracket) = caps.get(1).and_then(|m| m.as_str().chars().next()) {
                return self.opening_bracket_block(doc, bracket, row, index);
            }
            let range = comment_range_after(doc, row, index + len)?;
            if range.is_multi_line() {
                return Some(range);
            }
            if force_multiline {
                return Some(self.section_range(doc, row));
            }
            return style.is_none().then_some(range);
        }

        if style == Some(FoldStyle::MarkBegin) {
            return None;
        }

        let caps = STOP_MARKER.captures(&line)?;
        let (index, len) = match_span(&line, &caps);
        let column = index + len;
        if let Some(bracket) = caps.get(1).and_then(|m| m.as_str().chars().next()) {
            return closing_bracket_block(doc, bracket, row, column);
        }
        comment_range_before(doc, row, column)
    }

    fn opening_bracket_block(
        &self,
        doc: &dyn TextSource,
        bracket: char,
        row: usize,
        column: usize,
    ) -> Option<Range> {
        let start = Point::new(row, column + 1);
        let mut end = find_closing_bracket(doc, bracket, start)?;
        // `} else {` closes this block and opens the next one
        if end.row > start.row
            && self.fold_widget(doc, FoldStyle::MarkBegin, end.row) == Some(FoldWidget::Start)
        {
            end.row -= 1;
            end.column = doc.line_len(end.row);
        }
        Some(Range::from_points(start, end))
    }

    /// Rows after `row` that belong to it by indentation and nesting
    fn section_range(&self, doc: &dyn TextSource, row: usize) -> Range {
        let line = doc.line(row);
        let start_indent = first_non_blank(&line).unwrap_or(0);
        let start_column = line.chars().count();
        let mut end_row = row + 1;

        let mut next = row + 2;
        while next < doc.len() {
            let Some(indent) = first_non_blank(&doc.line(next)) else {
                next += 1;
                continue;
            };
            if start_indent > indent {
                break;
            }
            if let Some(sub) = self.range_for(doc, None, next, false) {
                if sub.start.row <= row {
                    break;
                } else if sub.is_multi_line() {
                    next = sub.end.row;
                } else if start_indent == indent {
                    break;
                }
            }
            end_row = next;
            next += 1;
        }

        let end_row = end_row.min(doc.len().saturating_sub(1));
        Range::new(row, start_column, end_row, doc.line_len(end_row))
    }
}

impl FoldWidgetProvider for CstyleFoldProvider {
    fn fold_widget(&self, doc: &dyn TextSource, style: FoldStyle, row: usize) -> Option<FoldWidget> {
        let line = doc.line(row);
        if START_MARKER.is_match(&line) {
            return Some(FoldWidget::Start);
        }
        if style == FoldStyle::MarkBeginEnd && STOP_MARKER.is_match(&line) {
            return Some(FoldWidget::End);
        }
        None
    }

    fn fold_widget_range(
        &self,
        doc: &dyn TextSource,
        style: FoldStyle,
        row: usize,
        force_multiline: bool,
    ) -> Option<Range> {
        self.range_for(doc, Some(style), row, force_multiline)
    }
}

/// Character column and length of the whole match
fn match_span(line: &str, caps: &Captures<'_>) -> (usize, usize) {
    let Some(m) = caps.get(0) else {
        return (0, 0);
    };
    (line[..m.start()].chars().count(), m.as_str().chars().count())
}

fn closing_bracket_block(
    doc: &dyn TextSource,
    bracket: char,
    row: usize,
    column: usize,
) -> Option<Range> {
    let end = Point::new(row, column.saturating_sub(1));
    let start = find_opening_bracket(doc, bracket, end)?;
    Some(Range::from_points(
        Point::new(start.row, start.column + 1),
        end,
    ))
}

/// From `column` (just after `/*`) to the start of the matching `*/`
fn comment_range_after(doc: &dyn TextSource, row: usize, column: usize) -> Option<Range> {
    for next in row..doc.len() {
        let chars: Vec<char> = doc.line(next).chars().collect();
        let from = if next == row { column } else { 0 };
        if let Some(end) = find_pair(&chars, ['*', '/'], from) {
            return Some(Range::new(row, column, next, end));
        }
    }
    None
}

/// From just after the matching `/*` to the start of the `*/` ending at `column`
fn comment_range_before(doc: &dyn TextSource, row: usize, column: usize) -> Option<Range> {
    let end = Point::new(row, column.saturating_sub(2));
    for prev in (0..=row).rev() {
        let chars: Vec<char> = doc.line(prev).chars().collect();
        let limit = if prev == row {
            end.column.min(chars.len())
        } else {
            chars.len()
        };
        if let Some(start) = rfind_pair(&chars[..limit], ['/', '*']) {
            return Some(Range::from_points(Point::new(prev, start + 2), end));
        }
    }
    None
}

fn find_pair(chars: &[char], pair: [char; 2], from: usize) -> Option<usize> {
    chars
        .windows(2)
        .enumerate()
        .skip(from)
        .find(|(_, window)| *window == pair)
        .map(|(index, _)| index)
}

fn rfind_pair(chars: &[char], pair: [char; 2]) -> Option<usize> {
    chars.windows(2).rposition(|window| window == pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn widgets(doc: &Document, style: FoldStyle) -> Vec<Option<FoldWidget>> {
        let provider = CstyleFoldProvider::new();
        (0..doc.len()).map(|row| provider.fold_widget(doc, style, row)).collect()
    }

    #[test]
    fn test_marker_patterns_compile() {
        assert!(Regex::new(START_PATTERN).is_ok());
        assert!(Regex::new(STOP_PATTERN).is_ok());
        assert!(START_MARKER.is_match("if a {"));
        assert!(START_MARKER.is_match("  /* note"));
        assert!(STOP_MARKER.is_match("  }"));
        assert!(STOP_MARKER.is_match(" */"));
        assert!(!START_MARKER.is_match("let x = [1, 2];"));
    }

    #[test]
    fn test_brace_block() {
        let doc = Document::from_lines(&["function foo() {", "  return 1;", "}"]);
        let provider = CstyleFoldProvider::new();
        assert_eq!(
            widgets(&doc, FoldStyle::MarkBegin),
            vec![Some(FoldWidget::Start), None, None]
        );
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 0, false),
            Some(Range::new(0, 16, 2, 0))
        );
    }

    #[test]
    fn test_end_widgets_only_in_mark_begin_end() {
        let doc = Document::from_lines(&["let a = [", "  1,", "];"]);
        let provider = CstyleFoldProvider::new();
        assert_eq!(widgets(&doc, FoldStyle::MarkBegin)[2], None);
        assert_eq!(
            widgets(&doc, FoldStyle::MarkBeginEnd)[2],
            Some(FoldWidget::End)
        );
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBeginEnd, 2, false),
            Some(Range::new(0, 9, 2, 0))
        );
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 2, false),
            None
        );
    }

    #[test]
    fn test_else_chain_stops_before_next_block() {
        let doc = Document::from_lines(&["if a {", "  b();", "} else {", "  c();", "}"]);
        let provider = CstyleFoldProvider::new();
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 0, false),
            Some(Range::new(0, 6, 1, 6))
        );
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 2, false),
            Some(Range::new(2, 8, 4, 0))
        );
    }

    #[test]
    fn test_block_comment() {
        let doc = Document::from_lines(&["/* header", " * more", " */", "x"]);
        let provider = CstyleFoldProvider::new();
        assert_eq!(widgets(&doc, FoldStyle::MarkBegin)[0], Some(FoldWidget::Start));
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 0, false),
            Some(Range::new(0, 2, 2, 1))
        );
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBeginEnd, 2, false),
            Some(Range::new(0, 2, 2, 1))
        );
    }

    #[test]
    fn test_single_row_comment_needs_force() {
        let doc = Document::from_lines(&["/* section */", "a();", "b();", "", "/* next */"]);
        let provider = CstyleFoldProvider::new();
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 0, false),
            None
        );
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 0, true),
            Some(Range::new(0, 13, 2, 4))
        );
    }
}
