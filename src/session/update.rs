//! Change updater - Repairs folds and layout after each document delta

use bevy::log::error;

use super::EditSession;
use crate::display_map::{DisplayToken, Fold, FoldSegment, Point, Range, Side};
use crate::document::{char_slice, Delta, TextSource};
use crate::events::SessionEvent;

impl EditSession {
    /// React to a delta that was just applied to the document
    ///
    /// Returns the folds the delta destroyed.
    pub(crate) fn on_change(&mut self, delta: &Delta) -> Vec<Fold> {
        self.screen_width = None;
        self.cache.reset_row_cache(delta.range.start.row);
        self.update_fold_widgets(delta);
        self.update_line_widgets(delta);
        let removed = self.update_internal_data(delta);

        self.version += 1;
        self.emit(SessionEvent::DocumentChanged {
            action: delta.action,
            range: delta.range,
            version: self.version,
        });
        removed
    }

    fn update_internal_data(&mut self, delta: &Delta) -> Vec<Fold> {
        let start = delta.range.start;
        let end = delta.range.end;
        let first_row = start.row;
        let mut last_row = end.row;
        let len = end.row - start.row;
        let is_remove = !delta.is_insert();
        let mut removed = Vec::new();
        // Fold line rows of destroyed folds, before any row shift
        let mut stale: Vec<Range> = Vec::new();

        self.updating = true;

        if delta.is_insert() {
            if let Some((fold, line)) = self.remove_fold_around(start) {
                removed.push(fold);
                stale.push(line);
            }
        }

        if len != 0 {
            if is_remove {
                self.cache.splice_rows(first_row, len, 0);
                self.remove_folds_touching(delta, &mut removed, &mut stale);

                let mut next = 0;
                if let Some(mut index) = self.folds.fold_line_index(end.row, 0) {
                    self.folds.add_remove_chars(
                        index,
                        end,
                        start.column as isize - end.column as isize,
                    );
                    self.folds.shift_line(index, -(len as isize));
                    if let Some(before) = self.folds.fold_line_index(first_row, 0) {
                        if before != index {
                            self.folds.merge_lines(before);
                            index = before;
                        }
                    }
                    next = index + 1;
                }
                for index in next..self.folds.fold_line_count() {
                    let starts_after = self
                        .folds
                        .line_at(index)
                        .is_some_and(|line| line.start().row >= end.row);
                    if starts_after {
                        self.folds.shift_line(index, -(len as isize));
                    }
                }
                last_row = first_row;
            } else {
                self.cache.splice_rows(first_row, 0, len);

                let mut next = 0;
                if let Some(index) = self.folds.fold_line_index(first_row, 0) {
                    next = index + 1;
                    let relation = self
                        .folds
                        .line_at(index)
                        .map(|line| line.range().compare_inside(start));
                    let columns = end.column as isize - start.column as isize;
                    match relation {
                        Some(std::cmp::Ordering::Equal) => {
                            if let Some(tail) = self.folds.split_line(index, start) {
                                self.folds.shift_line(tail, len as isize);
                                self.folds
                                    .add_remove_chars(tail, Point::new(last_row, 0), columns);
                                next = tail + 1;
                            }
                        }
                        Some(std::cmp::Ordering::Less) => {
                            self.folds
                                .add_remove_chars(index, Point::new(first_row, 0), columns);
                            self.folds.shift_line(index, len as isize);
                        }
                        _ => {}
                    }
                }
                for index in next..self.folds.fold_line_count() {
                    let starts_after = self
                        .folds
                        .line_at(index)
                        .is_some_and(|line| line.start().row >= first_row);
                    if starts_after {
                        self.folds.shift_line(index, len as isize);
                    }
                }
            }
        } else {
            let mut columns = (end.column - start.column) as isize;
            if is_remove {
                self.remove_folds_touching(delta, &mut removed, &mut stale);
                columns = -columns;
            }
            if let Some(index) = self.folds.fold_line_index(first_row, 0) {
                self.folds.add_remove_chars(index, start, columns);
            }
        }

        self.check_row_tables();
        self.updating = false;

        // The edited rows plus the composite line they belong to, and every
        // row a destroyed fold used to hide
        let inserted_rows = if is_remove { 0 } else { len };
        let mut first = self.row_fold_start(first_row);
        let mut last = last_row;
        for line in &stale {
            first = first.min(line.start.row);
            let end = if line.end.row >= first_row {
                line.end.row + inserted_rows
            } else {
                line.end.row
            };
            last = last.max(end);
        }

        self.cache.reset_row_cache(first);
        self.cache.invalidate(first, last);
        if self.wrap_map.is_enabled() {
            self.update_wrap_data(first, last);
        }
        removed
    }

    /// Remove a fold that strictly contains `point`; text inserted there would
    /// end up hidden
    fn remove_fold_around(&mut self, point: Point) -> Option<(Fold, Range)> {
        let id = self.folds.fold_at(point, Side::Either)?;
        let fold = self.folds.fold(id)?;
        if fold.start() == point || fold.end() == point {
            return None;
        }
        self.take_fold(id)
    }

    fn remove_folds_touching(
        &mut self,
        delta: &Delta,
        removed: &mut Vec<Fold>,
        stale: &mut Vec<Range>,
    ) {
        for id in self.folds.folds_in_range(&delta.range) {
            if let Some((fold, line)) = self.take_fold(id) {
                removed.push(fold);
                stale.push(line);
            }
        }
    }

    /// The per-row tables must have exactly one entry per document row
    fn check_row_tables(&mut self) {
        let rows = self.doc.len();
        if self.cache.row_count() == rows && self.fold_widgets.len() == rows {
            return;
        }
        debug_assert_eq!(
            self.cache.row_count(),
            rows,
            "layout rows and document rows have to be the same"
        );
        error!(
            "layout cache has {} rows but the document has {}; rebuilding",
            self.cache.row_count(),
            rows
        );
        self.fold_widgets = vec![None; rows];
        self.cache.reset(rows);
        if self.wrap_map.is_enabled() {
            self.update_wrap_data(0, rows - 1);
        }
    }

    fn update_fold_widgets(&mut self, delta: &Delta) {
        if self.fold_widgets.is_empty() {
            return;
        }
        let first = delta.range.start.row.min(self.fold_widgets.len() - 1);
        let len = delta.range.end.row - delta.range.start.row;
        let total = self.fold_widgets.len();
        if len == 0 {
            self.fold_widgets[first] = None;
        } else if delta.is_insert() {
            self.fold_widgets
                .splice(first..first + 1, std::iter::repeat(None).take(len + 1));
        } else {
            let end = (first + len + 1).min(total);
            self.fold_widgets.splice(first..end, std::iter::once(None));
        }
    }

    fn update_line_widgets(&mut self, delta: &Delta) {
        let start = delta.range.start;
        let end = delta.range.end;
        let len = end.row - start.row;
        if len == 0 || self.widgets.is_empty() {
            return;
        }
        // whole rows move with their widgets; split or joined rows keep theirs
        let at = if start.column == 0 && (delta.is_insert() || end.column == 0) {
            start.row
        } else {
            start.row + 1
        };
        if delta.is_insert() {
            self.widgets.insert_rows(at, len);
        } else {
            self.widgets.remove_rows(at, len);
        }
    }

    /// Recompute wrap splits for rows `first..=last`
    ///
    /// A fold line is measured as one composite line and its splits are
    /// stored at the fold line's start row.
    pub(crate) fn update_wrap_data(&mut self, first_row: usize, last_row: usize) {
        let last_row = last_row.min(self.doc.len().saturating_sub(1));
        let mut row = first_row;
        let mut from = 0;

        while row <= last_row {
            let fold_line = self
                .folds
                .next_fold_line_index(row, from)
                .inspect(|index| from = *index)
                .filter(|index| {
                    self.folds
                        .line_at(*index)
                        .is_some_and(|line| line.start().row <= row)
                });

            match fold_line.and_then(|index| self.fold_line_tokens(index)) {
                Some((start_row, end_row, tokens)) => {
                    let splits = self.wrap_map.compute_splits(&tokens);
                    self.cache.set_wrap_splits(start_row, splits);
                    row = end_row + 1;
                }
                None => {
                    let tokens = self.tab_map.display_tokens(&self.doc.line(row), 0);
                    let splits = self.wrap_map.compute_splits(&tokens);
                    self.cache.set_wrap_splits(row, splits);
                    row += 1;
                }
            }
        }
    }

    /// Display tokens of a whole fold line, with placeholders marked
    fn fold_line_tokens(&self, index: usize) -> Option<(usize, usize, Vec<DisplayToken>)> {
        let line = self.folds.line_at(index)?;
        let end_row = line.end().row;
        let end = Point::new(end_row, self.doc.line_len(end_row) + 1);
        let mut tokens = Vec::new();

        for segment in self.folds.walk(line, end) {
            match segment {
                FoldSegment::Text { row, start, end } => {
                    let text = self.doc.line(row);
                    let walked = self
                        .tab_map
                        .display_tokens(char_slice(&text, start, end), tokens.len());
                    tokens.extend(walked);
                }
                FoldSegment::Placeholder { placeholder, .. } => {
                    let len = placeholder.chars().count();
                    if len > 0 {
                        tokens.push(DisplayToken::PlaceholderStart);
                        tokens.extend(std::iter::repeat_n(DisplayToken::PlaceholderBody, len - 1));
                    }
                }
            }
        }
        Some((line.start().row, end_row, tokens))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::display_map::{Point, Range};
    use crate::events::SessionEvent;
    use crate::session::EditSession;

    fn fold_ranges(session: &EditSession) -> Vec<Range> {
        session.all_folds().map(|(_, fold)| fold.range).collect()
    }

    fn line_ranges(session: &EditSession) -> Vec<Range> {
        session.fold_lines().map(|line| line.range()).collect()
    }

    #[test]
    fn test_remove_rows_destroys_contained_fold() {
        let mut session = EditSession::new("zero\none\ntwo\nthree\nfour");
        session.add_fold("...", Range::new(1, 1, 2, 2)).unwrap();
        session.drain_events();

        let (_, removed) = session.remove(Range::new(1, 0, 3, 0));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].range, Range::new(1, 1, 2, 2));
        assert!(session.fold_lines().next().is_none());
        assert_eq!(session.len(), 3);
        assert!(session
            .drain_events()
            .contains(&SessionEvent::fold_removed(Range::new(1, 1, 2, 2), "...")));
    }

    #[test]
    fn test_fold_lines_never_reference_removed_rows() {
        let mut session = EditSession::new("a\nb\nc\nd\ne\nf");
        session.add_fold("...", Range::new(1, 0, 2, 1)).unwrap();
        session.add_fold("...", Range::new(4, 0, 5, 1)).unwrap();
        let (_, removed) = session.remove(Range::new(0, 1, 3, 0));
        assert_eq!(removed.len(), 1);
        assert_eq!(session.len(), 3);
        assert_eq!(fold_ranges(&session), vec![Range::new(1, 0, 2, 1)]);
        for line in session.fold_lines() {
            assert!(line.end().row < session.len());
        }
    }

    #[test]
    fn test_insert_lines_before_fold_shifts_rows() {
        let mut session = EditSession::new("fn a() {\n    x\n}\nrest");
        session.add_fold("...", Range::new(0, 8, 2, 0)).unwrap();
        session.insert(Point::new(0, 0), "// one\n// two\n");
        assert_eq!(fold_ranges(&session), vec![Range::new(2, 8, 4, 0)]);
        assert_eq!(line_ranges(&session), vec![Range::new(2, 8, 4, 0)]);
    }

    #[test]
    fn test_insert_between_folds_splits_line() {
        // two folds sharing row 1: "ab{..}cd{..}ef"
        let mut session = EditSession::new("ab\ncdXXef\ngh");
        session.add_fold("a", Range::new(0, 1, 1, 1)).unwrap();
        session.add_fold("b", Range::new(1, 4, 2, 1)).unwrap();
        assert_eq!(session.fold_lines().count(), 1);

        session.insert(Point::new(1, 2), "\n");
        assert_eq!(
            line_ranges(&session),
            vec![Range::new(0, 1, 1, 1), Range::new(2, 2, 3, 1)]
        );
        assert_eq!(session.line(2), "XXef");
    }

    #[test]
    fn test_same_row_edits_move_folds() {
        let mut session = EditSession::new("let value = compute(a, b);");
        session.add_fold("..", Range::new(0, 20, 0, 24)).unwrap();
        session.insert(Point::new(0, 4), "mut ");
        assert_eq!(fold_ranges(&session), vec![Range::new(0, 24, 0, 28)]);
        session.remove(Range::new(0, 0, 0, 4));
        assert_eq!(fold_ranges(&session), vec![Range::new(0, 20, 0, 24)]);

        let (_, removed) = session.remove(Range::new(0, 19, 0, 22));
        assert_eq!(removed.len(), 1);
        assert!(fold_ranges(&session).is_empty());
    }

    #[test]
    fn test_insert_inside_fold_removes_it() {
        let mut session = EditSession::new("function foo() {\n  return 1;\n}");
        session.add_fold("...", Range::new(0, 16, 2, 1)).unwrap();
        let (_, removed) = session.insert(Point::new(1, 2), "x");
        assert_eq!(removed.len(), 1);
        assert!(fold_ranges(&session).is_empty());
    }

    #[test]
    fn test_newline_at_fold_start_moves_fold() {
        let mut session = EditSession::new("function foo() {\n  return 1;\n}");
        session.add_fold("...", Range::new(0, 16, 2, 1)).unwrap();
        let (_, removed) = session.insert(Point::new(0, 16), "\n");
        assert!(removed.is_empty());
        assert_eq!(fold_ranges(&session), vec![Range::new(1, 0, 3, 1)]);
    }

    #[test]
    fn test_join_rows_merges_fold_lines() {
        let mut session = EditSession::new("ab\ncd\nef\ngh");
        session.add_fold("...", Range::new(0, 0, 0, 2)).unwrap();
        session.add_fold("...", Range::new(1, 0, 2, 2)).unwrap();
        assert_eq!(session.fold_lines().count(), 2);

        session.remove(Range::new(0, 2, 1, 0));
        assert_eq!(
            fold_ranges(&session),
            vec![Range::new(0, 0, 0, 2), Range::new(0, 2, 1, 2)]
        );
        assert_eq!(line_ranges(&session), vec![Range::new(0, 0, 1, 2)]);
    }

    #[test]
    fn test_wrap_data_follows_edits() {
        let mut session = EditSession::new("short\nshort");
        session.set_wrap_limit(10);
        session.set_use_wrap_mode(true);
        session.insert(Point::new(1, 5), " and now a much longer row");
        // "short and now a much longer row" breaks after "and " and "much "
        assert_eq!(session.row_split_data(1), Some(&[10, 21][..]));
        session.insert(Point::new(0, 0), "x\ny\n");
        assert_eq!(session.row_line_count(3), 3);
        assert_eq!(session.row_line_count(0), 1);
        session.remove(Range::new(0, 0, 3, 0));
        assert_eq!(session.row_line_count(0), 3);
        assert_eq!(session.screen_length(), 3);
    }

    fn wrapped(text: &str, limit: usize) -> EditSession {
        let mut session = EditSession::new(text);
        session.set_wrap_limit(limit);
        session.set_use_wrap_mode(true);
        session
    }

    /// Compare the incrementally kept wrap splits against a full rewrap
    fn assert_wrap_data_fresh(session: &mut EditSession) {
        let rows: Vec<usize> = (0..session.len())
            .filter(|row| session.row_fold_start(*row) == *row)
            .collect();
        let kept: Vec<Vec<usize>> = rows
            .iter()
            .map(|row| session.cache.wrap_splits(*row).to_vec())
            .collect();
        let last = session.len() - 1;
        session.update_wrap_data(0, last);
        for (row, kept) in rows.iter().zip(kept) {
            assert_eq!(kept, session.cache.wrap_splits(*row), "wrap splits of row {row}");
        }
    }

    #[test]
    fn test_destroyed_fold_rows_are_rewrapped() {
        let mut session = wrapped("fn a() {\n    b();\n}", 6);
        session.add_fold("...", Range::new(0, 0, 2, 0)).unwrap();
        assert_eq!(session.screen_length(), 1);

        let (_, removed) = session.insert(Point::new(1, 2), "x");
        assert_eq!(removed.len(), 1);

        let fresh = wrapped(&session.text(), 6);
        assert_eq!(session.row_length(0), 2);
        assert_eq!(session.row_length(0), fresh.row_length(0));
        assert_eq!(session.screen_length(), fresh.screen_length());
        assert_wrap_data_fresh(&mut session);
    }

    #[test]
    fn test_removal_inside_fold_rewraps_its_first_row() {
        let mut session = wrapped("fn a() {\n    b();\n}\nrest", 6);
        session.add_fold("...", Range::new(0, 0, 2, 0)).unwrap();

        let (_, removed) = session.remove(Range::new(1, 0, 2, 0));
        assert_eq!(removed.len(), 1);

        let fresh = wrapped(&session.text(), 6);
        assert_eq!(session.screen_length(), fresh.screen_length());
        assert_wrap_data_fresh(&mut session);
    }

    #[test]
    fn test_edit_after_fold_refreshes_screen_width() {
        let mut session = EditSession::new("ab{\ncd\n}x");
        session.add_fold("...", Range::new(0, 2, 2, 1)).unwrap();
        assert_eq!(session.screen_width(), 6);

        session.insert(Point::new(2, 2), "yyyyyyyyyy");
        assert_eq!(session.display_line(0, None, None), "ab...xyyyyyyyyyy");
        assert_eq!(session.screen_width(), 16);
    }

    #[test]
    fn test_widgets_move_with_rows() {
        let mut session = EditSession::new("a\nb\nc");
        session.set_line_widget(2, 3);
        session.insert(Point::new(0, 0), "x\n");
        assert_eq!(session.line_widget_rows(3), 3);
        assert_eq!(session.row_length(3), 4);
        session.remove(Range::new(0, 0, 1, 0));
        assert_eq!(session.line_widget_rows(2), 3);
    }

    fn assert_layout_consistent(session: &EditSession) {
        let rows = session.len();
        assert_eq!(session.cache.row_count(), rows);
        assert_eq!(session.fold_widgets.len(), rows);

        let lines = line_ranges(session);
        for pair in lines.windows(2) {
            assert!(
                pair[0].end.row < pair[1].start.row,
                "fold lines {} and {} share a row",
                pair[0],
                pair[1]
            );
        }
        for range in fold_ranges(session) {
            assert!(range.end.row < rows, "fold {range} outlives the document");
        }
    }

    #[derive(Clone, Debug)]
    enum Edit {
        Insert(Point, String),
        Remove(Range),
        Fold(Range),
    }

    fn arb_point() -> impl Strategy<Value = Point> {
        (0usize..8, 0usize..14).prop_map(|(row, column)| Point::new(row, column))
    }

    fn arb_edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            (arb_point(), "[a-c \n]{0,6}").prop_map(|(at, text)| Edit::Insert(at, text)),
            (arb_point(), arb_point())
                .prop_map(|(a, b)| Edit::Remove(Range::from_points(a.min(b), a.max(b)))),
            (arb_point(), arb_point())
                .prop_map(|(a, b)| Edit::Fold(Range::from_points(a.min(b), a.max(b)))),
        ]
    }

    proptest! {
        #[test]
        fn test_random_edits_keep_layout_consistent(
            wrap in any::<bool>(),
            edits in prop::collection::vec(arb_edit(), 1..24),
        ) {
            let mut session = EditSession::new("fn a() {\n    b();\n}\n\nfn c() {\n    d();\n}");
            session.set_wrap_limit(6);
            session.set_use_wrap_mode(wrap);

            for edit in edits {
                match edit {
                    Edit::Insert(at, text) => {
                        session.insert(at, &text);
                    }
                    Edit::Remove(range) => {
                        session.remove(range);
                    }
                    Edit::Fold(range) => {
                        let _ = session.add_fold("..", range);
                    }
                }
                assert_layout_consistent(&session);
            }

            let rows = session.len();
            let mut sum = 0;
            let mut row = 0;
            while row < rows {
                sum += session.row_length(row);
                row = session.row_fold_end(row) + 1;
            }
            prop_assert_eq!(session.screen_length(), sum);
        }

        #[test]
        fn test_random_edits_match_full_rewrap(
            edits in prop::collection::vec(arb_edit(), 1..24),
        ) {
            let mut session = wrapped("fn a() {\n    b();\n}\n\nfn c() {\n    d();\n}", 6);
            for edit in edits {
                match edit {
                    Edit::Insert(at, text) => {
                        session.insert(at, &text);
                    }
                    Edit::Remove(range) => {
                        session.remove(range);
                    }
                    Edit::Fold(range) => {
                        let _ = session.add_fold("..", range);
                    }
                }
                assert_wrap_data_fresh(&mut session);
            }
        }
    }
}
