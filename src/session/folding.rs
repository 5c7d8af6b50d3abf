//! Fold operations on the session: lookups, add/remove/expand, fold widgets

use bevy::log::debug;

use super::EditSession;
use crate::display_map::{Fold, FoldId, FoldLine, FoldSegment, Point, Range, Side};
use crate::document::{char_slice, TextSource};
use crate::error::FoldError;
use crate::events::SessionEvent;
use crate::folding::{FoldStyle, FoldWidget, FoldWidgetProvider};

/// Placeholder used for folds created from fold widgets
const WIDGET_PLACEHOLDER: &str = "...";

/// Where [`EditSession::add_fold`] put a fold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoldPlacement {
    /// Added to the fold map as a top-level fold
    Inserted(FoldId),
    /// Nested as a sub-fold of an existing fold that brackets it
    Nested(FoldId),
}

impl FoldPlacement {
    /// The top-level fold that now holds the range
    pub fn id(&self) -> FoldId {
        match self {
            FoldPlacement::Inserted(id) | FoldPlacement::Nested(id) => *id,
        }
    }
}

/// Modifiers for [`EditSession::toggle_fold_widget`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FoldToggle {
    /// Fold the regions nested inside the row instead of the row itself
    pub children: bool,
    /// Collapse nested regions too
    pub all: bool,
    /// Fold the row's siblings inside its parent region
    pub siblings: bool,
}

/// Result of [`EditSession::parent_fold_range_data`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParentFoldRange {
    /// Nearest region above the row that still contains it
    pub range: Option<Range>,
    /// First region found while scanning upward
    pub first_range: Option<Range>,
}

impl EditSession {
    // Queries

    /// The fold containing `point`; `side` decides whether boundaries count
    pub fn fold_at(&self, point: Point, side: Side) -> Option<FoldId> {
        self.folds.fold_at(point, side)
    }

    /// Folds overlapping the interior of `range`
    pub fn folds_in_range(&self, range: &Range) -> Vec<FoldId> {
        self.folds.folds_in_range(range)
    }

    pub fn fold(&self, id: FoldId) -> Option<&Fold> {
        self.folds.fold(id)
    }

    /// Every top-level fold in document order
    pub fn all_folds(&self) -> impl Iterator<Item = (FoldId, &Fold)> {
        self.folds.folds()
    }

    /// The fold line that covers `row`
    pub fn fold_line(&self, row: usize) -> Option<&FoldLine> {
        let index = self.folds.fold_line_index(row, 0)?;
        self.folds.line_at(index)
    }

    /// The first fold line ending at or after `row`
    pub fn next_fold_line(&self, row: usize) -> Option<&FoldLine> {
        let index = self.folds.next_fold_line_index(row, 0)?;
        self.folds.line_at(index)
    }

    pub fn fold_lines(&self) -> impl Iterator<Item = &FoldLine> {
        self.folds.fold_lines()
    }

    /// Screen rows that document rows `first..=last` occupy with folds collapsed
    pub fn folded_row_count(&self, first: usize, last: usize) -> usize {
        self.folds.folded_row_count(first, last)
    }

    pub fn is_row_folded(&self, row: usize) -> bool {
        self.fold_line(row).is_some()
    }

    /// Last document row rendered on the same screen line as `row`
    pub fn row_fold_end(&self, row: usize) -> usize {
        self.fold_line(row).map_or(row, |line| line.end().row)
    }

    /// First document row rendered on the same screen line as `row`
    pub fn row_fold_start(&self, row: usize) -> usize {
        self.fold_line(row).map_or(row, |line| line.start().row)
    }

    /// Rendered text of a fold line between `start` and `end`
    ///
    /// `start` defaults to the beginning of the line's first row and `end` to
    /// the end of its last row.
    pub fn fold_display_line(
        &self,
        line: &FoldLine,
        end: Option<Point>,
        start: Option<Point>,
    ) -> String {
        let start = start.unwrap_or(Point::new(line.start().row, 0));
        let end = end.unwrap_or_else(|| {
            let row = line.end().row;
            Point::new(row, self.doc.line_len(row))
        });

        let mut text = String::new();
        for segment in self.folds.walk(line, end) {
            match segment {
                FoldSegment::Text {
                    row,
                    start: from,
                    end: to,
                } => {
                    if row < start.row || (row == start.row && to < start.column) {
                        continue;
                    }
                    let from = if row == start.row {
                        from.max(start.column)
                    } else {
                        from
                    };
                    text.push_str(char_slice(&self.doc.line(row), from, to));
                }
                FoldSegment::Placeholder {
                    placeholder,
                    start: at,
                    ..
                } => {
                    if at.row < start.row || (at.row == start.row && at.column < start.column) {
                        continue;
                    }
                    text.push_str(placeholder);
                }
            }
        }
        text
    }

    /// Rendered text of `row` up to `end_column`, through its fold line if any
    pub fn display_line(&self, row: usize, end_column: Option<usize>, start: Option<Point>) -> String {
        match self.fold_line(row) {
            Some(line) => {
                let end = end_column.map(|column| Point::new(row, column));
                self.fold_display_line(line, end, start)
            }
            None => {
                let text = self.doc.line(row);
                let from = start.map_or(0, |start| start.column);
                let to = end_column.unwrap_or(usize::MAX);
                char_slice(&text, from, to).to_owned()
            }
        }
    }

    // Mutations

    /// Collapse `range` into `placeholder`
    pub fn add_fold(
        &mut self,
        placeholder: impl Into<String>,
        range: Range,
    ) -> Result<FoldPlacement, FoldError> {
        self.add_fold_with(Fold::new(range, placeholder))
    }

    /// Add a prepared fold, keeping its sub-folds and collapse depth
    pub fn add_fold_with(&mut self, mut fold: Fold) -> Result<FoldPlacement, FoldError> {
        fold.range = self.clip_range(fold.range);
        let range = fold.range;
        let (start, end) = (range.start, range.end);

        if start.row == end.row && start.column + 2 > end.column {
            return Err(FoldError::TooShort { range });
        }

        let start_fold = self.folds.fold_at(start, Side::After);
        let end_fold = self.folds.fold_at(end, Side::Before);

        if let (Some(outer), Some(other)) = (start_fold, end_fold) {
            if outer == other {
                if let Some(parent) = self.folds.fold_mut(outer) {
                    parent.add_sub_fold(fold)?;
                }
                return Ok(FoldPlacement::Nested(outer));
            }
        }

        let crossed = start_fold
            .and_then(|id| self.folds.fold(id))
            .filter(|existing| existing.start() != start)
            .or_else(|| {
                end_fold
                    .and_then(|id| self.folds.fold(id))
                    .filter(|existing| existing.end() != end)
            });
        if let Some(existing) = crossed {
            return Err(FoldError::Intersects {
                range,
                existing: existing.range,
            });
        }

        let inside = self.folds.folds_in_range(&range);
        for sub in self.remove_folds(inside) {
            if let Err(err) = fold.add_sub_fold(sub) {
                debug!("dropping nested fold: {}", err);
            }
        }

        let placeholder = fold.placeholder.clone();
        let id = self.folds.insert(fold);
        let line_start = self
            .folds
            .fold(id)
            .and_then(|fold| fold.fold_line())
            .and_then(|line| self.folds.fold_line(line))
            .map_or(start.row, |line| line.start().row);

        self.cache.reset_row_cache(line_start);
        self.refresh_rows(line_start, line_start);
        self.emit(SessionEvent::fold_added(range, placeholder));
        Ok(FoldPlacement::Inserted(id))
    }

    /// Add several folds, stopping at the first failure
    pub fn add_folds(
        &mut self,
        folds: impl IntoIterator<Item = Fold>,
    ) -> Result<Vec<FoldPlacement>, FoldError> {
        folds.into_iter().map(|fold| self.add_fold_with(fold)).collect()
    }

    /// Remove a fold, returning it with its sub-folds intact
    pub fn remove_fold(&mut self, id: FoldId) -> Option<Fold> {
        self.take_fold(id).map(|(fold, _)| fold)
    }

    /// Remove a fold, also returning the range its fold line covered
    ///
    /// While a delta is processed the rows are left for the change updater
    /// to refresh.
    pub(crate) fn take_fold(&mut self, id: FoldId) -> Option<(Fold, Range)> {
        let (fold, line) = self.folds.remove(id)?;
        self.cache.reset_row_cache(line.start.row);
        if !self.updating {
            self.refresh_rows(line.start.row, line.end.row);
        }
        self.emit(SessionEvent::fold_removed(fold.range, fold.placeholder.clone()));
        Some((fold, line))
    }

    pub fn remove_folds(&mut self, ids: impl IntoIterator<Item = FoldId>) -> Vec<Fold> {
        ids.into_iter().filter_map(|id| self.remove_fold(id)).collect()
    }

    /// Remove a fold and restore the folds it absorbed
    ///
    /// A fold with `collapse_children` set folds the regions nested inside it
    /// again, one level less deep.
    pub fn expand_fold(&mut self, id: FoldId) -> Option<Fold> {
        let mut fold = self.remove_fold(id)?;
        for sub in fold.take_sub_folds() {
            if let Err(err) = self.add_fold_with(sub) {
                debug!("could not restore nested fold: {}", err);
            }
        }
        if fold.collapse_children > 0 {
            self.fold_all(
                fold.start().row + 1,
                Some(fold.end().row),
                Some(fold.collapse_children - 1),
            );
        }
        Some(fold)
    }

    pub fn expand_folds(&mut self, ids: impl IntoIterator<Item = FoldId>) -> Vec<Fold> {
        ids.into_iter().filter_map(|id| self.expand_fold(id)).collect()
    }

    /// Open every fold in `range`, or in the whole document for `None`
    ///
    /// With `expand_inner` the folds are dropped along with their sub-folds.
    /// Otherwise they are expanded until no fold is left in the range.
    pub fn unfold(&mut self, range: Option<Range>, expand_inner: bool) -> Vec<Fold> {
        let (range, expand_inner) = match range {
            Some(range) => (range, expand_inner),
            None => (Range::new(0, 0, self.doc.len(), 0), true),
        };

        let found = self.folds.folds_in_range(&range);
        if expand_inner {
            return self.remove_folds(found);
        }

        let mut opened = Vec::new();
        let mut outermost = found;
        while !outermost.is_empty() {
            opened.extend(self.expand_folds(outermost));
            outermost = self.folds.folds_in_range(&range);
        }
        opened
    }

    /// Fold every region that starts in `start_row..end_row`
    ///
    /// New folds keep `depth` as their collapse depth. Does nothing without a
    /// fold widget provider or in manual style.
    pub fn fold_all(&mut self, start_row: usize, end_row: Option<usize>, depth: Option<usize>) {
        if self.provider.is_none() || self.fold_style == FoldStyle::Manual {
            return;
        }
        let depth = depth.unwrap_or(100_000);
        let end_row = end_row.unwrap_or(self.doc.len());

        let mut row = start_row;
        while row < end_row {
            if self.fold_widget(row) == Some(FoldWidget::Start) {
                let range = self
                    .fold_widget_range(row, false)
                    .filter(|range| range.is_multi_line())
                    .filter(|range| range.end.row <= end_row && range.start.row >= start_row);
                if let Some(range) = range {
                    row = range.end.row;
                    let mut fold = Fold::new(range, WIDGET_PLACEHOLDER);
                    fold.collapse_children = depth;
                    if let Err(err) = self.add_fold_with(fold) {
                        debug!("skipping region at row {}: {}", range.start.row, err);
                    }
                }
            }
            row += 1;
        }
    }

    // Fold widgets

    pub fn fold_style(&self) -> FoldStyle {
        self.fold_style
    }

    /// Change which rows carry widgets; manual style opens every fold
    pub fn set_fold_style(&mut self, style: FoldStyle) {
        if style == self.fold_style {
            return;
        }
        self.fold_style = style;
        if style == FoldStyle::Manual {
            self.unfold(None, true);
        }
        self.reset_fold_widgets();
    }

    pub fn set_fold_widget_provider(&mut self, provider: Option<Box<dyn FoldWidgetProvider>>) {
        self.provider = provider;
        self.reset_fold_widgets();
    }

    fn reset_fold_widgets(&mut self) {
        self.fold_widgets = vec![None; self.doc.len()];
    }

    /// Widget for `row`, computed once and cached until the row changes
    pub fn fold_widget(&mut self, row: usize) -> Option<FoldWidget> {
        if self.fold_style == FoldStyle::Manual {
            return None;
        }
        if let Some(Some(cached)) = self.fold_widgets.get(row) {
            return *cached;
        }
        let widget = self
            .provider
            .as_ref()?
            .fold_widget(&self.doc, self.fold_style, row);
        if let Some(slot) = self.fold_widgets.get_mut(row) {
            *slot = Some(widget);
        }
        widget
    }

    /// Range the widget on `row` would fold
    pub fn fold_widget_range(&self, row: usize, force_multiline: bool) -> Option<Range> {
        self.provider
            .as_ref()?
            .fold_widget_range(&self.doc, self.fold_style, row, force_multiline)
    }

    /// Scan upward from `row` for the region that encloses it
    ///
    /// With `ignore_current`, a row that has a widget of its own yields nothing.
    pub fn parent_fold_range_data(&mut self, row: usize, ignore_current: bool) -> ParentFoldRange {
        let mut data = ParentFoldRange::default();
        if self.provider.is_none() || self.fold_style == FoldStyle::Manual {
            return data;
        }
        if ignore_current && matches!(self.fold_widgets.get(row), Some(Some(Some(_)))) {
            return data;
        }

        for above in (0..row).rev() {
            if self.fold_widget(above) != Some(FoldWidget::Start) {
                continue;
            }
            let range = self.fold_widget_range(above, false);
            if data.first_range.is_none() {
                data.first_range = range;
            }
            if let Some(range) = range.filter(|range| range.end.row >= row) {
                data.range = Some(range);
                break;
            }
        }
        data
    }

    /// Act on the fold widget of `row`
    ///
    /// Opens the fold at the widget if there is one, otherwise folds the
    /// widget's region (or its children or siblings, per `options`). Returns
    /// the affected range, or `None` when there was nothing to do.
    pub fn toggle_fold_widget(&mut self, row: usize, options: FoldToggle) -> Option<Range> {
        self.provider.as_ref()?;
        let widget = self.fold_widget(row);
        let at = match widget {
            Some(FoldWidget::End) => self.fold_at(Point::new(row, 0), Side::Before),
            _ => self.fold_at(Point::new(row, self.doc.line_len(row)), Side::After),
        };

        if let Some(id) = at {
            let fold = if options.children || options.all {
                self.remove_fold(id)
            } else {
                self.expand_fold(id)
            };
            return fold.map(|fold| fold.range);
        }

        let range = self.fold_widget_range(row, true);
        if let Some(range) = range.filter(|range| !range.is_multi_line()) {
            let same = self
                .fold_at(range.start, Side::After)
                .filter(|id| self.folds.fold(*id).is_some_and(|fold| fold.range == range));
            if let Some(id) = same {
                return self.remove_fold(id).map(|fold| fold.range);
            }
        }

        let depth = if options.all { 10_000 } else { 0 };
        if options.siblings {
            let parent = self.parent_fold_range_data(row, false).range;
            match parent {
                Some(parent) => self.fold_all(parent.start.row + 1, Some(parent.end.row), Some(depth)),
                None => self.fold_all(0, None, Some(depth)),
            }
        } else if options.children {
            let end_row = range.map(|range| range.end.row);
            self.fold_all(row + 1, end_row, Some(depth));
        } else if let Some(range) = range {
            let mut fold = Fold::new(range, WIDGET_PLACEHOLDER);
            if options.all {
                fold.collapse_children = 10_000;
            }
            if let Err(err) = self.add_fold_with(fold) {
                debug!("fold widget at row {} not folded: {}", row, err);
            }
        }
        range
    }

    /// Toggle the region at `row`, falling back to the region enclosing it
    pub fn toggle_fold(&mut self, row: usize) -> Option<Range> {
        let row = self.row_fold_start(row);
        if let Some(range) = self.toggle_fold_widget(row, FoldToggle::default()) {
            return Some(range);
        }

        let data = self.parent_fold_range_data(row, true);
        let range = data.range.or(data.first_range)?;
        let row = range.start.row;
        match self.fold_at(Point::new(row, self.doc.line_len(row)), Side::After) {
            Some(id) => self.remove_fold(id).map(|fold| fold.range),
            None => self.add_fold(WIDGET_PLACEHOLDER, range).ok().map(|_| range),
        }
    }
}
