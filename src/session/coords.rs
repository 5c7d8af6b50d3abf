//! Coordinate transforms between document and screen positions

use super::EditSession;
use crate::display_map::{FoldLine, Point, ScreenPoint, Side};
use crate::document::{char_slice, TextSource};

impl EditSession {
    // Row metrics

    /// Screen rows taken by document row `row`, widgets included
    pub fn row_length(&self, row: usize) -> usize {
        self.row_line_count(row) + self.widgets.rows_at(row)
    }

    /// Screen lines the text of `row` wraps into
    pub fn row_line_count(&self, row: usize) -> usize {
        if !self.wrap_map.is_enabled() {
            return 1;
        }
        self.cache.wrap_splits(row).len() + 1
    }

    /// Wrap split offsets of `row`, or `None` when wrapping is off
    pub fn row_split_data(&self, row: usize) -> Option<&[usize]> {
        self.wrap_map
            .is_enabled()
            .then(|| self.cache.wrap_splits(row))
    }

    /// Total number of screen rows
    pub fn screen_length(&self) -> usize {
        let rows = if !self.wrap_map.is_enabled() {
            let hidden: usize = self
                .folds
                .fold_lines()
                .map(|line| line.end().row - line.start().row)
                .sum();
            self.doc.len() - hidden
        } else {
            let last_row = self.cache.row_count();
            let mut lines = self.folds.fold_lines();
            let mut next = lines.next();
            let mut rows = 0;
            let mut row = 0;
            while row < last_row {
                rows += self.cache.wrap_splits(row).len() + 1;
                row += 1;
                if let Some(line) = next.filter(|line| row > line.start().row) {
                    row = line.end().row + 1;
                    next = lines.next();
                }
            }
            rows
        };

        let widget_rows: usize = self
            .widgets
            .iter()
            .filter(|(row, _)| self.row_fold_start(*row) == *row)
            .map(|(_, rows)| rows)
            .sum();
        rows + widget_rows
    }

    /// Width of the widest screen row
    ///
    /// With soft wrap on this is the wrap limit. Otherwise every visible row
    /// is measured, fold lines through their rendered text.
    pub fn screen_width(&mut self) -> usize {
        if let Some(width) = self.screen_width {
            return width;
        }
        if self.wrap_map.is_enabled() {
            let width = self.wrap_map.wrap_limit();
            self.screen_width = Some(width);
            return width;
        }

        let mut widest = 0;
        let mut from = 0;
        let mut row = 0;
        while row < self.doc.len() {
            let fold_line = self
                .folds
                .fold_line_index(row, from)
                .inspect(|index| from = *index)
                .and_then(|index| self.folds.line_at(index))
                .map(|line| (line.end().row, line.clone()));

            let width = match self.cache.row_width(row) {
                Some(width) => width,
                None => {
                    let text = match &fold_line {
                        Some((_, line)) => self.fold_display_line(line, None, None),
                        None => self.doc.line(row).into_owned(),
                    };
                    let width = self.tab_map.string_screen_width(&text, None, 0).0;
                    self.cache.set_row_width(row, width);
                    width
                }
            };
            widest = widest.max(width);
            row = fold_line.map_or(row, |(end_row, _)| end_row) + 1;
        }

        self.screen_width = Some(widest);
        widest
    }

    // Transforms

    /// Document position shown at a screen position
    ///
    /// Negative rows resolve to the document start and rows past the end to
    /// the end of the last line. Positions on a placeholder resolve to the
    /// fold's start.
    pub fn screen_to_document_position(&mut self, screen_row: isize, screen_column: isize) -> Point {
        if screen_row < 0 {
            return Point::ZERO;
        }
        let screen_row = screen_row as usize;
        let screen_column = screen_column.max(0) as usize;

        let (mut doc_row, mut row, do_cache) = match self.cache.sample_for_screen_row(screen_row) {
            Some((doc_row, row)) => {
                let last = self.cache.last_sample().map_or(0, |(_, last)| last);
                (doc_row, row, screen_row > last)
            }
            None => (0, 0, !self.cache.has_samples()),
        };

        let max_row = self.doc.len() - 1;
        let mut line_index = self.folds.next_fold_line_index(doc_row, 0);
        let mut fold_start = self.fold_line_start(line_index);
        let mut row_length;

        loop {
            row_length = self.row_length(doc_row);
            if row + row_length > screen_row || doc_row >= max_row {
                break;
            }
            row += row_length;
            doc_row += 1;
            if doc_row > fold_start {
                let (index, end_row) = match line_index.and_then(|i| Some((i, self.folds.line_at(i)?))) {
                    Some((index, line)) => (index, line.end().row),
                    None => break,
                };
                doc_row = end_row + 1;
                line_index = self.folds.next_fold_line_index(doc_row, index + 1);
                fold_start = self.fold_line_start(line_index);
            }
            if do_cache {
                self.cache.push_sample(doc_row, row);
            }
        }

        let fold_line = line_index
            .and_then(|index| self.folds.line_at(index))
            .filter(|line| line.start().row <= doc_row);
        let (text, doc_row) = match fold_line {
            Some(line) => (self.fold_display_line(line, None, None), line.start().row),
            None if row + row_length <= screen_row || doc_row > max_row => {
                return Point::new(max_row, self.doc.line_len(max_row));
            }
            None => (self.doc.line(doc_row).into_owned(), doc_row),
        };

        let split_index = screen_row - row;
        let mut doc_column = 0;
        let mut split_end = None;
        let mut slice = text.as_str();
        if self.wrap_map.is_enabled() {
            let splits = self.cache.wrap_splits(doc_row);
            split_end = splits.get(split_index).copied();
            if split_index > 0 && !splits.is_empty() {
                doc_column = splits
                    .get(split_index - 1)
                    .or(splits.last())
                    .copied()
                    .unwrap_or(0);
                slice = char_slice(&text, doc_column, usize::MAX);
            }
        }

        let (reached, fitted) = self
            .tab_map
            .string_screen_width(slice, Some(screen_column), 0);
        doc_column += fitted;
        if let Some(end) = split_end {
            if doc_column >= end {
                doc_column = end.saturating_sub(1);
            }
        }

        let Some(line) = fold_line else {
            return Point::new(doc_row, doc_column);
        };
        if split_end.is_none() && fitted == slice.chars().count() && screen_column > reached {
            if let Some(point) = self.trailing_fold_start(line) {
                return point;
            }
        }
        self.folds.idx_to_position(line, doc_column)
    }

    /// Screen position at which a document position is shown
    ///
    /// Out-of-range input is clipped first; positions inside a fold are
    /// shown at the fold's placeholder.
    pub fn document_to_screen_position(&mut self, doc_row: isize, doc_column: isize) -> ScreenPoint {
        let mut pos = self.clip_position_to_document(doc_row, doc_column);
        if let Some(fold) = self
            .folds
            .fold_at(pos, Side::After)
            .and_then(|id| self.folds.fold(id))
        {
            pos = fold.start();
        }

        let (mut row, mut screen_row, do_cache) = match self.cache.sample_for_doc_row(pos.row) {
            Some((row, screen_row)) => {
                let last = self.cache.last_sample().map_or(0, |(last, _)| last);
                (row, screen_row, pos.row > last)
            }
            None => (0, 0, !self.cache.has_samples()),
        };

        let mut line_index = self.folds.next_fold_line_index(row, 0);
        let mut fold_start = self.fold_line_start(line_index);

        while row < pos.row {
            let row_end = if row >= fold_start {
                let Some((index, line)) = line_index.and_then(|i| Some((i, self.folds.line_at(i)?)))
                else {
                    break;
                };
                let row_end = line.end().row + 1;
                if row_end > pos.row {
                    break;
                }
                line_index = self.folds.next_fold_line_index(row_end, index + 1);
                fold_start = self.fold_line_start(line_index);
                row_end
            } else {
                row + 1
            };
            screen_row += self.row_length(row);
            row = row_end;
            if do_cache {
                self.cache.push_sample(row, screen_row);
            }
        }

        let fold_line = line_index
            .and_then(|index| self.folds.line_at(index))
            .filter(|line| row >= line.start().row);
        let (text, wrap_row) = match fold_line {
            Some(line) => (self.fold_display_line(line, Some(pos), None), line.start().row),
            None => (
                char_slice(&self.doc.line(pos.row), 0, pos.column).to_owned(),
                pos.row,
            ),
        };

        let mut slice = text.as_str();
        if self.wrap_map.is_enabled() {
            let splits = self.cache.wrap_splits(wrap_row);
            let len = text.chars().count();
            let passed = splits.iter().take_while(|split| len >= **split).count();
            screen_row += passed;
            if let Some(split) = passed.checked_sub(1).and_then(|i| splits.get(i)) {
                slice = char_slice(&text, *split, usize::MAX);
            }
        }

        let column = self.tab_map.string_screen_width(slice, None, 0).0;
        ScreenPoint::new(screen_row, column)
    }

    pub fn screen_to_document(&mut self, point: ScreenPoint) -> Point {
        self.screen_to_document_position(point.row() as isize, point.column() as isize)
    }

    pub fn document_to_screen(&mut self, point: Point) -> ScreenPoint {
        self.document_to_screen_position(point.row as isize, point.column as isize)
    }

    pub fn document_to_screen_row(&mut self, point: Point) -> usize {
        self.document_to_screen(point).row()
    }

    pub fn document_to_screen_column(&mut self, point: Point) -> usize {
        self.document_to_screen(point).column()
    }

    pub fn screen_to_document_row(&mut self, point: ScreenPoint) -> usize {
        self.screen_to_document(point).row
    }

    pub fn screen_to_document_column(&mut self, point: ScreenPoint) -> usize {
        self.screen_to_document(point).column
    }

    fn fold_line_start(&self, index: Option<usize>) -> usize {
        index
            .and_then(|index| self.folds.line_at(index))
            .map_or(usize::MAX, |line| line.start().row)
    }

    /// Start of the line's last fold when that fold runs to the end of its row
    fn trailing_fold_start(&self, line: &FoldLine) -> Option<Point> {
        let last = line.folds().last().and_then(|id| self.folds.fold(*id))?;
        let end = last.end();
        (end.column >= self.doc.line_len(end.row)).then(|| last.start())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::display_map::{Point, Range, ScreenPoint};
    use crate::session::EditSession;

    fn scenario_a() -> EditSession {
        let mut session = EditSession::new("function foo() {\n  return 1;\n}");
        session.add_fold("...", Range::new(0, 16, 2, 1)).unwrap();
        session
    }

    fn row_height_sum(session: &EditSession) -> usize {
        let mut sum = 0;
        let mut row = 0;
        while row < session.len() {
            sum += session.row_length(row);
            row = session.row_fold_end(row) + 1;
        }
        sum
    }

    #[test]
    fn test_folded_line_is_one_screen_row() {
        let mut session = scenario_a();
        assert_eq!(session.screen_length(), 1);
        assert_eq!(session.screen_to_document_position(0, 20), Point::new(0, 16));
        assert_eq!(session.screen_to_document_position(0, 19), Point::new(2, 1));
        assert_eq!(session.screen_to_document_position(0, 17), Point::new(0, 16));
        assert_eq!(session.screen_to_document_position(0, 3), Point::new(0, 3));
        assert_eq!(session.document_to_screen_position(2, 1), ScreenPoint::new(0, 19));
        assert_eq!(session.document_to_screen_position(1, 4), ScreenPoint::new(0, 16));
        assert_eq!(session.screen_width(), 19);
    }

    #[test]
    fn test_rows_after_fold() {
        let mut session = EditSession::new("a {\n  b\n}\nnext\nlast");
        session.add_fold("...", Range::new(0, 3, 2, 0)).unwrap();
        assert_eq!(session.screen_length(), 3);
        assert_eq!(session.screen_to_document_position(1, 2), Point::new(3, 2));
        assert_eq!(session.document_to_screen_position(4, 1), ScreenPoint::new(2, 1));
        assert_eq!(session.screen_to_document_position(7, 0), Point::new(4, 4));
        assert_eq!(session.screen_to_document_position(-2, 5), Point::ZERO);
    }

    #[test]
    fn test_hard_wrap_of_long_word() {
        let mut session = EditSession::new("abcdefghijklmnop");
        session.set_wrap_limit(10);
        session.set_use_wrap_mode(true);
        assert_eq!(session.row_split_data(0), Some(&[10][..]));
        assert_eq!(session.row_length(0), 2);
        assert_eq!(session.screen_length(), 2);
        assert_eq!(session.screen_width(), 10);

        assert_eq!(session.document_to_screen_position(0, 12), ScreenPoint::new(1, 2));
        assert_eq!(session.document_to_screen_position(0, 10), ScreenPoint::new(1, 0));
        assert_eq!(session.screen_to_document_position(1, 3), Point::new(0, 13));
        assert_eq!(session.screen_to_document_position(0, 15), Point::new(0, 9));
    }

    #[test]
    fn test_wrap_mode_off_has_no_splits() {
        let session = EditSession::new("abcdefghijklmnop");
        assert_eq!(session.row_split_data(0), None);
        assert_eq!(session.row_line_count(0), 1);
    }

    #[test]
    fn test_tabs_and_wide_chars() {
        let mut session = EditSession::new("\tx\n中文y");
        assert_eq!(session.document_to_screen_position(0, 1), ScreenPoint::new(0, 4));
        assert_eq!(session.document_to_screen_position(1, 2), ScreenPoint::new(1, 4));
        assert_eq!(session.screen_to_document_position(0, 4), Point::new(0, 1));
        assert_eq!(session.screen_to_document_position(1, 4), Point::new(1, 2));
        assert_eq!(session.screen_to_document_position(1, 3), Point::new(1, 1));
        session.set_tab_size(2);
        assert_eq!(session.document_to_screen_position(0, 1), ScreenPoint::new(0, 2));
    }

    #[test]
    fn test_line_widgets_add_rows() {
        let mut session = EditSession::new("a\nb\nc");
        session.set_line_widget(0, 2);
        assert_eq!(session.row_length(0), 3);
        assert_eq!(session.screen_length(), 5);
        assert_eq!(session.document_to_screen_position(1, 0), ScreenPoint::new(3, 0));
        assert_eq!(session.screen_to_document_position(3, 0), Point::new(1, 0));
        assert_eq!(session.screen_to_document_position(1, 0), Point::new(0, 0));
    }

    #[test]
    fn test_widgets_on_hidden_rows_do_not_count() {
        let mut session = EditSession::new("a {\n  b\n}\nnext");
        session.set_line_widget(1, 2);
        assert_eq!(session.screen_length(), 6);
        session.add_fold("...", Range::new(0, 3, 2, 0)).unwrap();
        assert_eq!(session.screen_length(), 2);
        assert_eq!(session.screen_length(), row_height_sum(&session));
    }

    #[test]
    fn test_samples_survive_edits() {
        let mut session = EditSession::new("0\n1\n2\n3\n4\n5\n6\n7");
        assert_eq!(session.screen_to_document_position(6, 0), Point::new(6, 0));
        session.add_fold("...", Range::new(2, 1, 4, 0)).unwrap();
        assert_eq!(session.screen_to_document_position(4, 0), Point::new(6, 0));
        session.insert(Point::new(0, 0), "x\n");
        assert_eq!(session.document_to_screen_position(7, 0), ScreenPoint::new(5, 0));
    }

    #[test]
    fn test_wrapped_fold_line() {
        let mut session = EditSession::new("aaaa {\n  b\n} cccc dddd");
        session.add_fold("...", Range::new(0, 6, 2, 1)).unwrap();
        session.set_wrap_limit(10);
        session.set_use_wrap_mode(true);
        // "aaaa {..." followed by " cccc dddd" is 19 cells wide
        assert_eq!(session.row_line_count(0), 2);
        assert_eq!(session.screen_length(), 2);
        let end = session.document_to_screen_position(2, 11);
        assert_eq!(session.screen_to_document(end), Point::new(2, 11));
    }

    fn arb_text() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z \t]{0,24}", 1..8).prop_map(|lines| lines.join("\n"))
    }

    proptest! {
        #[test]
        fn test_round_trip(text in arb_text(), wrap in any::<bool>(), limit in 4usize..16) {
            let mut session = EditSession::new(&text);
            session.set_wrap_limit(limit);
            session.set_use_wrap_mode(wrap);
            for row in 0..session.len() {
                let len = session.line(row).chars().count();
                let splits = session.row_split_data(row).map(<[usize]>::to_vec).unwrap_or_default();
                for column in 0..=len {
                    // the end of a wrapped sub-line shows at the start of the next one
                    if splits.contains(&column) {
                        continue;
                    }
                    let screen = session.document_to_screen_position(row as isize, column as isize);
                    let back = session.screen_to_document(screen);
                    prop_assert_eq!(back, Point::new(row, column));
                }
            }
        }

        #[test]
        fn test_screen_length_is_row_height_sum(text in arb_text(), wrap in any::<bool>(), fold_row in 0usize..6) {
            let mut session = EditSession::new(&text);
            session.set_wrap_limit(8);
            session.set_use_wrap_mode(wrap);
            if fold_row + 1 < session.len() {
                let _ = session.add_fold("..", Range::new(fold_row, 0, fold_row + 1, 0));
            }
            prop_assert_eq!(session.screen_length(), row_height_sum(&session));
        }
    }
}
