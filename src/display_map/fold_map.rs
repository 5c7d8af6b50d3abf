//! Fold Map - Collapsed document ranges grouped into fold lines
//!
//! A [`Fold`] hides a document range behind a placeholder. Folds whose rows
//! touch are grouped into a [`FoldLine`], which renders as a single screen
//! line: text before the first fold, placeholders with the visible text
//! between them, then text after the last fold.
//!
//! Folds and fold lines live in arenas and refer to each other by id. The
//! fold map keeps fold lines sorted by start row; no two fold lines share a
//! document row.

use std::cmp::Ordering;

use bevy::log::warn;

use super::{Point, Range, RangeRelation, Side};
use crate::arena::{Arena, Id};
use crate::error::FoldError;

pub type FoldId = Id<Fold>;
pub type FoldLineId = Id<FoldLine>;

/// A collapsed document range shown as a placeholder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fold {
    pub range: Range,
    pub placeholder: String,
    /// Depth to re-collapse nested regions when this fold is expanded
    pub collapse_children: usize,
    /// Folds absorbed by this one, relative to its start
    sub_folds: Vec<Fold>,
    fold_line: Option<FoldLineId>,
}

impl Fold {
    pub fn new(range: Range, placeholder: impl Into<String>) -> Self {
        Self {
            range,
            placeholder: placeholder.into(),
            collapse_children: 0,
            sub_folds: Vec::new(),
            fold_line: None,
        }
    }

    pub fn start(&self) -> Point {
        self.range.start
    }

    pub fn end(&self) -> Point {
        self.range.end
    }

    pub fn is_same_row(&self) -> bool {
        !self.range.is_multi_line()
    }

    /// The fold line this fold belongs to, if it is placed in a fold map
    pub fn fold_line(&self) -> Option<FoldLineId> {
        self.fold_line
    }

    /// Nested folds, with positions relative to this fold's start
    pub fn sub_folds(&self) -> &[Fold] {
        &self.sub_folds
    }

    /// Nested folds in document coordinates
    pub fn absolute_sub_folds(&self) -> Vec<Fold> {
        self.sub_folds
            .iter()
            .map(|sub| {
                let mut sub = sub.clone();
                restore_range(&mut sub.range, self.range.start);
                sub
            })
            .collect()
    }

    /// Remove the nested folds, returning them in document coordinates
    pub fn take_sub_folds(&mut self) -> Vec<Fold> {
        let subs = self.absolute_sub_folds();
        self.sub_folds.clear();
        subs
    }

    /// Nest `fold`, given in document coordinates, inside this fold
    ///
    /// A fold equal to this one is ignored. Existing sub-folds that `fold`
    /// covers become its own sub-folds.
    pub fn add_sub_fold(&mut self, mut fold: Fold) -> Result<(), FoldError> {
        if fold.range == self.range {
            return Ok(());
        }
        if !self.range.contains_range(&fold.range) {
            return Err(FoldError::NotContained {
                range: fold.range,
                parent: self.range,
            });
        }
        consume_range(&mut fold.range, self.range.start);
        fold.fold_line = None;
        self.insert_local(fold)
    }

    /// Insert a fold already expressed relative to this fold's start
    fn insert_local(&mut self, mut fold: Fold) -> Result<(), FoldError> {
        let start = fold.range.start;
        let end = fold.range.end;

        let i = self
            .sub_folds
            .iter()
            .position(|sub| sub.range.compare_end(start) != Ordering::Greater)
            .unwrap_or(self.sub_folds.len());

        if let Some(sub) = self.sub_folds.get_mut(i) {
            if sub.range.contains_range(&fold.range) {
                let parent_start = sub.range.start;
                if sub.range == fold.range {
                    return Ok(());
                }
                consume_range(&mut fold.range, parent_start);
                return sub.insert_local(fold);
            }
            if sub.range.compare(start) == Ordering::Equal && sub.range.start != start {
                return Err(FoldError::Intersects {
                    range: fold.range,
                    existing: sub.range,
                });
            }
        }

        let j = self.sub_folds[i..]
            .iter()
            .position(|sub| sub.range.compare_end(end) != Ordering::Greater)
            .map_or(self.sub_folds.len(), |offset| i + offset);

        if let Some(sub) = self.sub_folds.get(j) {
            if sub.range.compare(end) == Ordering::Equal && sub.range.start != end {
                return Err(FoldError::Intersects {
                    range: fold.range,
                    existing: sub.range,
                });
            }
        }

        for mut consumed in self.sub_folds.drain(i..j) {
            consume_range(&mut consumed.range, fold.range.start);
            fold.sub_folds.push(consumed);
        }
        self.sub_folds.insert(i, fold);
        Ok(())
    }
}

fn consume_point(point: &mut Point, anchor: Point) {
    point.row -= anchor.row;
    if point.row == 0 {
        point.column -= anchor.column;
    }
}

fn consume_range(range: &mut Range, anchor: Point) {
    consume_point(&mut range.start, anchor);
    consume_point(&mut range.end, anchor);
}

fn restore_point(point: &mut Point, anchor: Point) {
    if point.row == 0 {
        point.column += anchor.column;
    }
    point.row += anchor.row;
}

fn restore_range(range: &mut Range, anchor: Point) {
    restore_point(&mut range.start, anchor);
    restore_point(&mut range.end, anchor);
}

/// Folds sharing a contiguous band of rows, rendered as one screen line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoldLine {
    folds: Vec<FoldId>,
    range: Range,
}

impl FoldLine {
    pub fn start(&self) -> Point {
        self.range.start
    }

    pub fn end(&self) -> Point {
        self.range.end
    }

    pub fn range(&self) -> Range {
        self.range
    }

    /// Folds in document order
    pub fn folds(&self) -> &[FoldId] {
        &self.folds
    }

    pub fn contains_row(&self, row: usize) -> bool {
        self.range.start.row <= row && row <= self.range.end.row
    }
}

/// One piece of a fold line's rendered text, produced by [`FoldMap::walk`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FoldSegment<'a> {
    /// Visible text of `row` between two columns
    Text { row: usize, start: usize, end: usize },
    /// A collapsed fold shown as its placeholder
    Placeholder {
        fold: FoldId,
        placeholder: &'a str,
        start: Point,
    },
}

/// Tracks every fold in the document, grouped into sorted fold lines
#[derive(Clone, Debug, Default)]
pub struct FoldMap {
    folds: Arena<Fold>,
    lines: Arena<FoldLine>,
    /// Fold lines sorted by start row
    order: Vec<FoldLineId>,
}

impl FoldMap {
    /// Create a new empty fold map
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn fold_count(&self) -> usize {
        self.folds.len()
    }

    pub fn fold_line_count(&self) -> usize {
        self.order.len()
    }

    pub fn fold(&self, id: FoldId) -> Option<&Fold> {
        self.folds.get(id)
    }

    pub(crate) fn fold_mut(&mut self, id: FoldId) -> Option<&mut Fold> {
        self.folds.get_mut(id)
    }

    pub fn fold_line(&self, id: FoldLineId) -> Option<&FoldLine> {
        self.lines.get(id)
    }

    /// Fold lines in document order
    pub fn fold_lines(&self) -> impl Iterator<Item = &FoldLine> {
        self.order.iter().filter_map(|id| self.lines.get(*id))
    }

    /// All folds in document order
    pub fn folds(&self) -> impl Iterator<Item = (FoldId, &Fold)> {
        self.fold_lines()
            .flat_map(|line| line.folds.iter())
            .filter_map(|id| self.folds.get(*id).map(|fold| (*id, fold)))
    }

    /// Fold line at position `index` of the sorted order
    pub(crate) fn line_at(&self, index: usize) -> Option<&FoldLine> {
        self.order.get(index).and_then(|id| self.lines.get(*id))
    }

    pub(crate) fn line_index(&self, id: FoldLineId) -> Option<usize> {
        self.order.iter().position(|line| *line == id)
    }

    /// Index of the fold line containing `row`, searching from `from`
    pub fn fold_line_index(&self, row: usize, from: usize) -> Option<usize> {
        for index in from..self.order.len() {
            let line = self.line_at(index)?;
            if line.range.start.row <= row && line.range.end.row >= row {
                return Some(index);
            }
            if line.range.end.row > row {
                return None;
            }
        }
        None
    }

    /// Index of the first fold line ending at or after `row`, searching from `from`
    pub fn next_fold_line_index(&self, row: usize, from: usize) -> Option<usize> {
        (from..self.order.len()).find(|&index| {
            self.line_at(index)
                .is_some_and(|line| line.range.end.row >= row)
        })
    }

    /// The fold containing `point`; `side` decides whether its boundaries count
    pub fn fold_at(&self, point: Point, side: Side) -> Option<FoldId> {
        let line = self.line_at(self.fold_line_index(point.row, 0)?)?;
        line.folds.iter().copied().find(|id| {
            let Some(fold) = self.folds.get(*id) else {
                return false;
            };
            if !fold.range.contains(point) {
                return false;
            }
            match side {
                Side::After => !fold.range.is_end(point),
                Side::Before => !fold.range.is_start(point),
                Side::Either => true,
            }
        })
    }

    /// Folds that overlap the interior of `range`
    ///
    /// Folds that only touch `range` at a boundary are not included.
    pub fn folds_in_range(&self, range: &Range) -> Vec<FoldId> {
        let start = (range.start.row, range.start.column as isize + 1);
        let end = (range.end.row, range.end.column as isize - 1);
        let mut found = Vec::new();

        'lines: for line in self.fold_lines() {
            match line.range.relation_to(start, end) {
                RangeRelation::After => continue,
                RangeRelation::Before => break,
                _ => {}
            }
            for id in &line.folds {
                let Some(fold) = self.folds.get(*id) else {
                    continue;
                };
                match fold.range.relation_to(start, end) {
                    RangeRelation::Before => break 'lines,
                    RangeRelation::After => continue,
                    RangeRelation::Inverted => break,
                    _ => found.push(*id),
                }
            }
        }
        found
    }

    /// Number of screen rows that rows `first..=last` occupy once folds collapse
    pub fn folded_row_count(&self, first: usize, last: usize) -> usize {
        let mut count = (last + 1).saturating_sub(first) as isize;
        for line in self.fold_lines() {
            let (start, end) = (line.range.start.row, line.range.end.row);
            if end >= last {
                if start < last {
                    if start >= first {
                        count -= (last - start) as isize;
                    } else {
                        count = 0;
                    }
                }
                break;
            } else if end >= first {
                if start >= first {
                    count -= (end - start) as isize;
                } else {
                    count -= (end - first + 1) as isize;
                }
            }
        }
        count.max(0) as usize
    }

    /// Place `fold` into the fold line its rows touch, or a new one
    ///
    /// The caller is responsible for rejecting folds that overlap existing ones.
    pub(crate) fn insert(&mut self, fold: Fold) -> FoldId {
        let (start_row, end_row) = (fold.range.start.row, fold.range.end.row);
        let fold_id = self.folds.insert(fold);

        let mut target = None;
        for (index, line_id) in self.order.iter().enumerate() {
            let Some(line) = self.lines.get(*line_id) else {
                continue;
            };
            if end_row < line.range.start.row {
                break;
            }
            if line.range.start.row <= end_row && start_row <= line.range.end.row {
                target = Some(index);
                break;
            }
        }

        match target {
            Some(index) => {
                let line_id = self.order[index];
                self.attach(line_id, fold_id);
                while let Some(next) = self.line_at(index + 1) {
                    let end = self.line_at(index).map_or(0, |line| line.range.end.row);
                    if next.range.start.row > end {
                        break;
                    }
                    self.merge_lines(index);
                }
            }
            None => {
                let line_id = self.lines.insert(FoldLine {
                    folds: Vec::new(),
                    range: Range::default(),
                });
                self.attach(line_id, fold_id);
                let position = self.order.partition_point(|id| {
                    self.lines
                        .get(*id)
                        .is_some_and(|line| line.range.start.row < start_row)
                });
                self.order.insert(position, line_id);
            }
        }
        fold_id
    }

    /// Remove a fold, splitting its fold line if that breaks row contiguity
    ///
    /// Returns the fold and the range its fold line covered before removal.
    pub(crate) fn remove(&mut self, id: FoldId) -> Option<(Fold, Range)> {
        let line_id = self.folds.get(id)?.fold_line?;
        let line = self.lines.get_mut(line_id)?;
        let old_range = line.range;
        let position = line.folds.iter().position(|fold| *fold == id)?;
        let last = line.folds.len() - 1;

        if line.folds.len() == 1 {
            self.lines.remove(line_id);
            self.order.retain(|other| *other != line_id);
        } else if position == 0 || position == last || !self.folds.get(id)?.range.is_multi_line() {
            line.folds.remove(position);
            self.refresh_bounds(line_id);
        } else {
            let tail: Vec<FoldId> = line.folds.split_off(position + 1);
            line.folds.truncate(position);
            self.refresh_bounds(line_id);
            let index = self.line_index(line_id)?;
            self.insert_line_after(index, tail);
        }

        let mut fold = self.folds.remove(id)?;
        fold.fold_line = None;
        Some((fold, old_range))
    }

    /// Drop every fold and fold line
    pub(crate) fn clear(&mut self) {
        self.folds.clear();
        self.lines.clear();
        self.order.clear();
    }

    /// Move the fold line at `index` and all its folds by `delta` rows
    pub(crate) fn shift_line(&mut self, index: usize, delta: isize) {
        let Some(line_id) = self.order.get(index).copied() else {
            return;
        };
        let Some(line) = self.lines.get_mut(line_id) else {
            return;
        };
        shift_range_rows(&mut line.range, delta);
        for id in &line.folds {
            if let Some(fold) = self.folds.get_mut(*id) {
                shift_range_rows(&mut fold.range, delta);
            }
        }
    }

    /// Adjust columns of the folds on `point.row` at or after `point` by `delta`
    ///
    /// A `point` strictly inside a fold is left alone, since the fold would
    /// no longer match its text.
    pub(crate) fn add_remove_chars(&mut self, index: usize, point: Point, delta: isize) {
        let Some(line_id) = self.order.get(index).copied() else {
            return;
        };
        let Some(line) = self.lines.get(line_id) else {
            return;
        };

        let next = line.folds.iter().position(|id| {
            self.folds
                .get(*id)
                .is_some_and(|fold| fold.range.compare_end(point) != Ordering::Greater)
        });
        let Some(first) = next else {
            return;
        };
        let Some(fold) = self.folds.get(line.folds[first]) else {
            return;
        };
        if fold.range.contains(point) && fold.range.start != point {
            warn!(
                "column adjustment at {} lands inside fold {}",
                point, fold.range
            );
            return;
        }
        if fold.range.start.row != point.row {
            return;
        }

        for id in &line.folds[first..] {
            let Some(fold) = self.folds.get_mut(*id) else {
                continue;
            };
            fold.range.start.column = fold.range.start.column.saturating_add_signed(delta);
            if fold.range.is_multi_line() {
                break;
            }
            fold.range.end.column = fold.range.end.column.saturating_add_signed(delta);
        }
        self.refresh_bounds(line_id);
    }

    /// Split the fold line at `index` before the first fold not ending before `point`
    ///
    /// Returns the index of the new trailing fold line, or `None` when there
    /// is nothing on one side of the split.
    pub(crate) fn split_line(&mut self, index: usize, point: Point) -> Option<usize> {
        let line_id = *self.order.get(index)?;
        let line = self.lines.get(line_id)?;
        let at = line.folds.iter().position(|id| {
            self.folds
                .get(*id)
                .is_some_and(|fold| fold.range.compare_end(point) != Ordering::Greater)
        })?;
        if at == 0 {
            return None;
        }
        let tail = self.lines.get_mut(line_id)?.folds.split_off(at);
        self.refresh_bounds(line_id);
        Some(self.insert_line_after(index, tail))
    }

    /// Merge the fold line after `index` into the one at `index`
    pub(crate) fn merge_lines(&mut self, index: usize) {
        let (Some(&line_id), Some(&next_id)) = (self.order.get(index), self.order.get(index + 1))
        else {
            return;
        };
        let Some(next) = self.lines.remove(next_id) else {
            return;
        };
        self.order.remove(index + 1);
        for fold_id in next.folds {
            self.attach(line_id, fold_id);
        }
    }

    /// Document position of character `idx` in the fold line's rendered text
    pub fn idx_to_position(&self, line: &FoldLine, idx: usize) -> Point {
        let mut idx = idx as isize;
        let mut last_end_column = 0usize;
        for fold in line.folds.iter().filter_map(|id| self.folds.get(*id)) {
            idx -= fold.range.start.column as isize - last_end_column as isize;
            if idx < 0 {
                let column = (fold.range.start.column as isize + idx).max(0) as usize;
                return Point::new(fold.range.start.row, column);
            }
            idx -= fold.placeholder.chars().count() as isize;
            if idx < 0 {
                return fold.range.start;
            }
            last_end_column = fold.range.end.column;
        }
        Point::new(
            line.range.end.row,
            (line.range.end.column as isize + idx).max(0) as usize,
        )
    }

    /// Break the fold line's rendered text up to `end` into segments
    pub fn walk(&self, line: &FoldLine, end: Point) -> Vec<FoldSegment<'_>> {
        let mut segments = Vec::new();
        let mut last_end = 0;
        for id in &line.folds {
            let Some(fold) = self.folds.get(*id) else {
                continue;
            };
            let cmp = fold.range.compare_start(end);
            if cmp == Ordering::Less {
                segments.push(FoldSegment::Text {
                    row: end.row,
                    start: last_end,
                    end: end.column,
                });
                return segments;
            }
            segments.push(FoldSegment::Text {
                row: fold.range.start.row,
                start: last_end,
                end: fold.range.start.column,
            });
            segments.push(FoldSegment::Placeholder {
                fold: *id,
                placeholder: &fold.placeholder,
                start: fold.range.start,
            });
            if cmp == Ordering::Equal {
                return segments;
            }
            last_end = fold.range.end.column;
        }
        segments.push(FoldSegment::Text {
            row: end.row,
            start: last_end,
            end: end.column,
        });
        segments
    }

    fn attach(&mut self, line_id: FoldLineId, fold_id: FoldId) {
        if let Some(fold) = self.folds.get_mut(fold_id) {
            fold.fold_line = Some(line_id);
        }
        let folds = &self.folds;
        if let Some(line) = self.lines.get_mut(line_id) {
            line.folds.push(fold_id);
            line.folds
                .sort_by_key(|id| folds.get(*id).map(|fold| fold.range.start));
        }
        self.refresh_bounds(line_id);
    }

    fn insert_line_after(&mut self, index: usize, folds: Vec<FoldId>) -> usize {
        let line_id = self.lines.insert(FoldLine {
            folds: Vec::new(),
            range: Range::default(),
        });
        for fold_id in folds {
            self.attach(line_id, fold_id);
        }
        self.order.insert(index + 1, line_id);
        index + 1
    }

    fn refresh_bounds(&mut self, line_id: FoldLineId) {
        let folds = &self.folds;
        if let Some(line) = self.lines.get_mut(line_id) {
            let first = line.folds.first().and_then(|id| folds.get(*id));
            let last = line.folds.last().and_then(|id| folds.get(*id));
            if let (Some(first), Some(last)) = (first, last) {
                line.range = Range::from_points(first.range.start, last.range.end);
            }
        }
    }
}

fn shift_range_rows(range: &mut Range, delta: isize) {
    range.start.row = range.start.row.saturating_add_signed(delta);
    range.end.row = range.end.row.saturating_add_signed(delta);
}
