//! Layout cache - Per-row layout data and sampled doc/screen row pairs
//!
//! Holds three things that must follow the document as it changes:
//!
//! - a width per document row, used when wrapping is off and filled lazily
//! - wrap split offsets per document row, used when wrapping is on
//! - two parallel sample arrays of `(document row, screen row)` pairs, each
//!   one validated by a walk from the top of the document
//!
//! The per-row tables always have exactly one entry per document row. The
//! samples only ever grow at the end and are cut back when an edit lands at
//! or before a sampled row.

/// Cached per-row layout, owned by the session
#[derive(Clone, Debug, Default)]
pub struct LayoutCache {
    row_widths: Vec<Option<usize>>,
    wrap_data: Vec<Vec<usize>>,
    doc_rows: Vec<usize>,
    screen_rows: Vec<usize>,
}

impl LayoutCache {
    /// Empty cache sized for `rows` document rows
    pub fn new(rows: usize) -> Self {
        let mut cache = Self::default();
        cache.reset(rows);
        cache
    }

    /// Drop everything and size the per-row tables for `rows` rows
    pub fn reset(&mut self, rows: usize) {
        self.row_widths = vec![None; rows];
        self.wrap_data = vec![Vec::new(); rows];
        self.doc_rows.clear();
        self.screen_rows.clear();
    }

    /// Number of document rows the per-row tables describe
    pub fn row_count(&self) -> usize {
        self.wrap_data.len()
    }

    /// Forget the cached widths of `first..=last`
    pub fn invalidate(&mut self, first: usize, last: usize) {
        let end = (last + 1).min(self.row_widths.len());
        if first < end {
            self.row_widths[first..end].fill(None);
        }
    }

    pub fn invalidate_all(&mut self) {
        self.row_widths.fill(None);
    }

    pub fn row_width(&self, row: usize) -> Option<usize> {
        self.row_widths.get(row).copied().flatten()
    }

    pub fn set_row_width(&mut self, row: usize, width: usize) {
        if let Some(slot) = self.row_widths.get_mut(row) {
            *slot = Some(width);
        }
    }

    /// Wrap split offsets of `row`; empty for rows that do not wrap
    pub fn wrap_splits(&self, row: usize) -> &[usize] {
        self.wrap_data.get(row).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn set_wrap_splits(&mut self, row: usize, splits: Vec<usize>) {
        if let Some(slot) = self.wrap_data.get_mut(row) {
            *slot = splits;
        }
    }

    /// Remove `remove` rows at `at`, then insert `insert` empty rows there
    pub fn splice_rows(&mut self, at: usize, remove: usize, insert: usize) {
        let at = at.min(self.wrap_data.len());
        let end = (at + remove).min(self.wrap_data.len());
        self.wrap_data
            .splice(at..end, std::iter::repeat_with(Vec::new).take(insert));
        self.row_widths
            .splice(at..end, std::iter::repeat(None).take(insert));
    }

    /// Sample at or before `screen_row` as `(document row, screen row)`
    pub fn sample_for_screen_row(&self, screen_row: usize) -> Option<(usize, usize)> {
        let index = row_cache_index(&self.screen_rows, screen_row)?;
        Some((self.doc_rows[index], self.screen_rows[index]))
    }

    /// Sample at or before `doc_row` as `(document row, screen row)`
    pub fn sample_for_doc_row(&self, doc_row: usize) -> Option<(usize, usize)> {
        let index = row_cache_index(&self.doc_rows, doc_row)?;
        Some((self.doc_rows[index], self.screen_rows[index]))
    }

    pub fn has_samples(&self) -> bool {
        !self.doc_rows.is_empty()
    }

    pub fn last_sample(&self) -> Option<(usize, usize)> {
        Some((*self.doc_rows.last()?, *self.screen_rows.last()?))
    }

    /// Record a validated pair; pairs must arrive in increasing order
    pub fn push_sample(&mut self, doc_row: usize, screen_row: usize) {
        if self.doc_rows.last().is_some_and(|last| *last >= doc_row) {
            return;
        }
        self.doc_rows.push(doc_row);
        self.screen_rows.push(screen_row);
    }

    /// Forget samples past `doc_row`; row zero forgets everything
    pub fn reset_row_cache(&mut self, doc_row: usize) {
        if doc_row == 0 {
            self.doc_rows.clear();
            self.screen_rows.clear();
            return;
        }
        let keep = row_cache_index(&self.doc_rows, doc_row).map_or(0, |index| index + 1);
        self.doc_rows.truncate(keep);
        self.screen_rows.truncate(keep);
    }

    pub fn sample_count(&self) -> usize {
        self.doc_rows.len()
    }
}

/// Index of the last element `<= value` in a sorted array
fn row_cache_index(rows: &[usize], value: usize) -> Option<usize> {
    rows.partition_point(|row| *row <= value).checked_sub(1)
}
