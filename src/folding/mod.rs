//! Fold widgets - Per-language detection of foldable regions
//!
//! A [`FoldWidgetProvider`] looks at document rows and reports which ones
//! open (or close) a foldable region, and the range that region covers. The
//! session caches widgets per row and asks the provider for ranges when a
//! widget is toggled or when folding everything.
//!
//! Two providers ship with the crate:
//! - [`CstyleFoldProvider`]: braces, brackets and `/* */` comments
//! - [`IndentFoldProvider`]: indentation-delimited blocks

mod cstyle;
mod indent;

pub use cstyle::*;
pub use indent::*;

use serde::{Deserialize, Serialize};

use crate::display_map::{Point, Range};
use crate::document::TextSource;

/// Marker shown in the gutter for a foldable row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoldWidget {
    /// The row opens a foldable region
    Start,
    /// The row closes a foldable region
    End,
}

/// Which rows get fold widgets
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoldStyle {
    /// No widgets; folds are only created explicitly
    Manual,
    /// Widgets on rows that open a region
    #[default]
    MarkBegin,
    /// Widgets on rows that open or close a region
    MarkBeginEnd,
}

/// Detects foldable regions for one kind of syntax
pub trait FoldWidgetProvider: Send + Sync {
    /// Widget for `row`, if the row opens or closes a region
    fn fold_widget(&self, doc: &dyn TextSource, style: FoldStyle, row: usize) -> Option<FoldWidget>;

    /// Range folded by the widget on `row`
    ///
    /// With `force_multiline`, a region that would fit on one row is widened
    /// to the section it introduces instead of being rejected.
    fn fold_widget_range(
        &self,
        doc: &dyn TextSource,
        style: FoldStyle,
        row: usize,
        force_multiline: bool,
    ) -> Option<Range>;
}

/// Column of the first non-whitespace character of `line`
pub(crate) fn first_non_blank(line: &str) -> Option<usize> {
    line.chars().position(|ch| !ch.is_whitespace())
}

/// Matching bracket pair for `bracket`, as `(open, close)`
pub(crate) fn bracket_pair(bracket: char) -> Option<(char, char)> {
    match bracket {
        '{' | '}' => Some(('{', '}')),
        '[' | ']' => Some(('[', ']')),
        '(' | ')' => Some(('(', ')')),
        _ => None,
    }
}

/// Position of the bracket closing `open`, scanning forward from `from`
pub(crate) fn find_closing_bracket(doc: &dyn TextSource, open: char, from: Point) -> Option<Point> {
    let (open, close) = bracket_pair(open)?;
    let mut depth = 1usize;
    for row in from.row..doc.len() {
        let line = doc.line(row);
        let skip = if row == from.row { from.column } else { 0 };
        for (column, ch) in line.chars().enumerate().skip(skip) {
            if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    return Some(Point::new(row, column));
                }
            }
        }
    }
    None
}

/// Position of the bracket opening `close`, scanning backward from just before `before`
pub(crate) fn find_opening_bracket(
    doc: &dyn TextSource,
    close: char,
    before: Point,
) -> Option<Point> {
    let (open, close) = bracket_pair(close)?;
    let mut depth = 1usize;
    for row in (0..=before.row.min(doc.len().saturating_sub(1))).rev() {
        let chars: Vec<char> = doc.line(row).chars().collect();
        let end = if row == before.row {
            before.column.min(chars.len())
        } else {
            chars.len()
        };
        for column in (0..end).rev() {
            let ch = chars[column];
            if ch == close {
                depth += 1;
            } else if ch == open {
                depth -= 1;
                if depth == 0 {
                    return Some(Point::new(row, column));
                }
            }
        }
    }
    None
}

/// Block of rows indented deeper than `row`
///
/// Starts at `column` (or the end of `row`) and ends at the end of the last
/// deeper row. Blank rows never end a block.
pub(crate) fn indentation_block(
    doc: &dyn TextSource,
    row: usize,
    column: Option<usize>,
) -> Option<Range> {
    let line = doc.line(row);
    let start_level = first_non_blank(&line)?;
    let start_column = column.unwrap_or_else(|| line.chars().count());

    let mut end_row = row;
    for next in row + 1..doc.len() {
        let Some(level) = first_non_blank(&doc.line(next)) else {
            continue;
        };
        if level <= start_level {
            break;
        }
        end_row = next;
    }

    (end_row > row).then(|| Range::new(row, start_column, end_row, doc.line_len(end_row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_bracket_scans() {
        let doc = Document::from_lines(&["fn a() {", "  if x { y(); }", "}"]);
        assert_eq!(
            find_closing_bracket(&doc, '{', Point::new(0, 8)),
            Some(Point::new(2, 0))
        );
        assert_eq!(
            find_opening_bracket(&doc, '}', Point::new(2, 0)),
            Some(Point::new(0, 7))
        );
        assert_eq!(find_closing_bracket(&doc, '[', Point::new(0, 0)), None);
    }

    #[test]
    fn test_indentation_block_skips_blank_rows() {
        let doc = Document::from_lines(&["def f():", "    a", "", "    b", "c"]);
        assert_eq!(indentation_block(&doc, 0, None), Some(Range::new(0, 8, 3, 5)));
        assert_eq!(indentation_block(&doc, 4, None), None);
        assert_eq!(indentation_block(&doc, 2, None), None);
    }
}
