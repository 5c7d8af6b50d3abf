//! Line widgets - Extra screen rows attached below document rows
//!
//! Widgets (inline diagnostics, review comments) take screen rows without
//! owning any document text. Their anchors move with edits like any other
//! row-based data.

use std::collections::BTreeMap;

/// Screen rows reserved below document rows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineWidgets {
    rows: BTreeMap<usize, usize>,
}

impl LineWidgets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reserve `rows` screen rows below document row `row`; zero clears it
    pub fn set(&mut self, row: usize, rows: usize) {
        if rows == 0 {
            self.rows.remove(&row);
        } else {
            self.rows.insert(row, rows);
        }
    }

    pub fn clear(&mut self, row: usize) {
        self.rows.remove(&row);
    }

    /// Widget rows attached to `row`
    pub fn rows_at(&self, row: usize) -> usize {
        self.rows.get(&row).copied().unwrap_or(0)
    }

    /// Iterate `(row, widget rows)` in row order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().map(|(row, rows)| (*row, *rows))
    }

    /// Rows at or after `at` move down by `count`
    pub fn insert_rows(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        let moved = self.rows.split_off(&at);
        self.rows
            .extend(moved.into_iter().map(|(anchor, rows)| (anchor + count, rows)));
    }

    /// Rows `at..at + count` disappear and later rows move up
    pub fn remove_rows(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        let mut moved = self.rows.split_off(&at);
        let kept = moved.split_off(&(at + count));
        self.rows
            .extend(kept.into_iter().map(|(anchor, rows)| (anchor - count, rows)));
    }
}
