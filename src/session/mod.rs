//! Edit session - Document, folds and layout kept consistent under edits
//!
//! [`EditSession`] owns the document together with every structure derived
//! from it: the fold map, the layout cache, tab and wrap configuration, line
//! widgets and the fold widget cache. All document edits go through the
//! session so that each granular delta can repair those structures before
//! the next one is applied.
//!
//! The operations are split across submodules:
//! - `folding`: adding, removing and expanding folds, fold widgets
//! - `coords`: document/screen coordinate transforms and screen metrics
//! - `update`: the per-delta change updater and wrap data maintenance

mod coords;
mod folding;
mod update;

pub use folding::*;

use std::borrow::Cow;

use bevy::prelude::*;

use crate::display_map::{
    Fold, FoldMap, LayoutCache, LineWidgets, Point, Range, TabMap, WrapLimitRange, WrapMap,
    WrapMethod,
};
use crate::document::{Delta, Document, TextSource};
use crate::events::SessionEvent;
use crate::folding::{FoldStyle, FoldWidget, FoldWidgetProvider};
use crate::settings::LayoutSettings;

/// Layout state for one document
#[derive(Resource)]
pub struct EditSession {
    /// Text buffer
    doc: Document,

    /// Collapsed ranges
    folds: FoldMap,

    /// Row widths, wrap splits and doc/screen row samples
    cache: LayoutCache,

    tab_map: TabMap,
    wrap_map: WrapMap,

    /// Extra screen rows below document rows
    widgets: LineWidgets,

    /// Detects foldable regions (None = manual folding only)
    provider: Option<Box<dyn FoldWidgetProvider>>,

    /// Widget per row; the outer `None` means not computed yet
    fold_widgets: Vec<Option<Option<FoldWidget>>>,

    fold_style: FoldStyle,

    /// Notifications waiting to be drained
    events: Vec<SessionEvent>,

    /// Set while a delta is processed; fold removal skips cache work then
    updating: bool,

    /// Number of deltas applied so far
    version: u64,

    /// Widest rendered row, cleared whenever layout changes
    screen_width: Option<usize>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("rows", &self.doc.len())
            .field("folds", &self.folds.fold_count())
            .field("wrap", &self.wrap_map.is_enabled())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl EditSession {
    /// Create a session for `text` with default layout settings
    pub fn new(text: &str) -> Self {
        let doc = Document::new(text);
        let rows = doc.len();
        Self {
            doc,
            folds: FoldMap::new(),
            cache: LayoutCache::new(rows),
            tab_map: TabMap::default(),
            wrap_map: WrapMap::default(),
            widgets: LineWidgets::new(),
            provider: None,
            fold_widgets: vec![None; rows],
            fold_style: FoldStyle::default(),
            events: Vec::new(),
            updating: false,
            version: 0,
            screen_width: None,
        }
    }

    /// Create a session for `text` and apply `settings`
    pub fn with_settings(text: &str, settings: &LayoutSettings) -> Self {
        let mut session = Self::new(text);
        session.apply_settings(settings);
        session
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn line(&self, row: usize) -> Cow<'_, str> {
        self.doc.line(row)
    }

    /// Rows `first..=last`
    pub fn lines(&self, first: usize, last: usize) -> Vec<String> {
        self.doc.lines(first, last)
    }

    /// Number of document rows; never zero
    pub fn len(&self) -> usize {
        self.doc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.len() == 1 && self.doc.line_len(0) == 0
    }

    pub fn text(&self) -> String {
        self.doc.text()
    }

    /// Number of deltas applied since the session was created
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the whole document, dropping every fold
    pub fn set_text(&mut self, text: &str) {
        let dropped: Vec<_> = self
            .folds
            .folds()
            .map(|(_, fold)| SessionEvent::fold_removed(fold.range, fold.placeholder.clone()))
            .collect();
        self.events.extend(dropped);
        self.folds.clear();

        self.doc = Document::new(text);
        let rows = self.doc.len();
        self.cache.reset(rows);
        self.widgets = LineWidgets::new();
        self.fold_widgets = vec![None; rows];
        self.screen_width = None;
        if self.wrap_map.is_enabled() {
            self.update_wrap_data(0, rows - 1);
        }
    }

    // Editing

    /// Insert `text` at `at`
    ///
    /// Returns the position after the inserted text and the folds the edit
    /// destroyed.
    pub fn insert(&mut self, at: Point, text: &str) -> (Point, Vec<Fold>) {
        let (end, deltas) = self.doc.plan_insert(at, text);
        (end, self.apply_deltas(deltas))
    }

    /// Remove `range`, returning its start and the folds the edit destroyed
    pub fn remove(&mut self, range: Range) -> (Point, Vec<Fold>) {
        let (start, deltas) = self.doc.plan_remove(range);
        (start, self.apply_deltas(deltas))
    }

    /// Replace `range` with `text`
    pub fn replace(&mut self, range: Range, text: &str) -> (Point, Vec<Fold>) {
        let (start, mut removed) = self.remove(range);
        let (end, inserted) = self.insert(start, text);
        removed.extend(inserted);
        (end, removed)
    }

    /// Apply a delta produced elsewhere (for example by an undo stack)
    pub fn apply_delta(&mut self, delta: &Delta) -> Vec<Fold> {
        self.doc.apply_delta(delta);
        self.on_change(delta)
    }

    fn apply_deltas(&mut self, deltas: Vec<Delta>) -> Vec<Fold> {
        let mut removed = Vec::new();
        for delta in &deltas {
            removed.extend(self.apply_delta(delta));
        }
        removed
    }

    // Events

    /// Take every queued notification
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    // Configuration

    /// Push layout settings into the session
    pub fn apply_settings(&mut self, settings: &LayoutSettings) {
        self.set_tab_size(settings.indentation.tab_size);
        self.set_wrap_method(settings.wrapping.method);
        self.set_wrap_limit_range(settings.wrapping.min, settings.wrapping.max);
        self.adjust_wrap_limit(settings.wrapping.wrap_limit);
        self.set_use_wrap_mode(settings.wrapping.enabled);
        self.set_fold_style(settings.folding.style);
    }

    pub fn tab_size(&self) -> usize {
        self.tab_map.tab_size()
    }

    /// Change the tab size; zero is ignored
    pub fn set_tab_size(&mut self, tab_size: usize) {
        if tab_size == 0 || tab_size == self.tab_map.tab_size() {
            return;
        }
        self.tab_map.set_tab_size(tab_size);
        self.relayout();
        self.emit(SessionEvent::TabSizeChanged { tab_size });
    }

    /// Columns a tab starting at `screen_column` occupies
    pub fn screen_tab_size(&self, screen_column: usize) -> usize {
        self.tab_map.screen_tab_size(screen_column)
    }

    /// Measure `text` from `screen_column`, stopping past `max_screen_column`
    ///
    /// Returns the screen column reached and the number of characters that fit.
    pub fn string_screen_width(
        &self,
        text: &str,
        max_screen_column: Option<usize>,
        screen_column: usize,
    ) -> (usize, usize) {
        self.tab_map
            .string_screen_width(text, max_screen_column, screen_column)
    }

    pub fn use_wrap_mode(&self) -> bool {
        self.wrap_map.is_enabled()
    }

    /// Turn soft wrap on or off
    pub fn set_use_wrap_mode(&mut self, enabled: bool) {
        if enabled == self.wrap_map.is_enabled() {
            return;
        }
        self.wrap_map.set_enabled(enabled);
        self.relayout();
        self.emit(SessionEvent::WrapModeChanged { enabled });
    }

    pub fn wrap_limit(&self) -> usize {
        self.wrap_map.wrap_limit()
    }

    pub fn wrap_limit_range(&self) -> WrapLimitRange {
        self.wrap_map.limit_range()
    }

    /// Bound the wrap limit; the current limit is constrained right away
    pub fn set_wrap_limit_range(&mut self, min: Option<usize>, max: Option<usize>) {
        let range = WrapLimitRange::new(min, max);
        if range == self.wrap_map.limit_range() {
            return;
        }
        self.wrap_map.set_limit_range(range);
        self.screen_width = None;
        self.adjust_wrap_limit(self.wrap_map.wrap_limit());
    }

    /// Pin the wrap limit to exactly `limit`
    pub fn set_wrap_limit(&mut self, limit: usize) {
        self.set_wrap_limit_range(Some(limit), Some(limit));
    }

    /// Request a wrap limit, constrained by the limit range
    ///
    /// Returns `true` if the effective limit changed.
    pub fn adjust_wrap_limit(&mut self, desired: usize) -> bool {
        if !self.wrap_map.adjust_limit(desired) {
            return false;
        }
        if self.wrap_map.is_enabled() {
            self.relayout();
        }
        self.screen_width = None;
        self.emit(SessionEvent::WrapLimitChanged {
            limit: self.wrap_map.wrap_limit(),
        });
        true
    }

    pub fn wrap_method(&self) -> WrapMethod {
        self.wrap_map.method()
    }

    pub fn set_wrap_method(&mut self, method: WrapMethod) {
        if method == self.wrap_map.method() {
            return;
        }
        self.wrap_map.set_method(method);
        if self.wrap_map.is_enabled() {
            self.relayout();
        }
    }

    // Line widgets

    /// Reserve `rows` screen rows below document row `row`; zero clears it
    pub fn set_line_widget(&mut self, row: usize, rows: usize) {
        self.widgets.set(row, rows);
        self.cache.reset_row_cache(row);
    }

    pub fn clear_line_widget(&mut self, row: usize) {
        self.set_line_widget(row, 0);
    }

    pub fn line_widget_rows(&self, row: usize) -> usize {
        self.widgets.rows_at(row)
    }

    // Clipping

    /// Clamp possibly negative coordinates into the document
    pub fn clip_position_to_document(&self, row: isize, column: isize) -> Point {
        if row < 0 {
            return Point::ZERO;
        }
        self.doc
            .clip_position(Point::new(row as usize, column.max(0) as usize))
    }

    /// Clamp both ends of `range` into the document
    pub fn clip_range(&self, range: Range) -> Range {
        Range::from_points(
            self.doc.clip_position(range.start),
            self.doc.clip_position(range.end),
        )
    }

    /// Drop every cached row measurement and rebuild wrap data
    fn relayout(&mut self) {
        let rows = self.doc.len();
        self.cache.reset(rows);
        self.screen_width = None;
        if self.wrap_map.is_enabled() {
            self.update_wrap_data(0, rows - 1);
        }
    }

    /// Recompute layout for rows `first..=last` after a fold change
    fn refresh_rows(&mut self, first: usize, last: usize) {
        self.cache.invalidate(first, last);
        self.screen_width = None;
        if self.wrap_map.is_enabled() {
            self.update_wrap_data(first, last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DeltaAction;
    use crate::settings::LayoutSettingsBuilder;

    #[test]
    fn test_edits_report_document_changes() {
        let mut session = EditSession::new("hello");
        session.insert(Point::new(0, 5), " world\nnext");
        assert_eq!(session.text(), "hello world\nnext");
        assert_eq!(session.len(), 2);

        let actions: Vec<_> = session
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::DocumentChanged { action, version, .. } => Some((action, version)),
                _ => None,
            })
            .collect();
        assert_eq!(
            actions,
            vec![
                (DeltaAction::InsertText, 1),
                (DeltaAction::InsertText, 2),
                (DeltaAction::InsertText, 3),
            ]
        );
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_replace() {
        let mut session = EditSession::new("let x = 1;\nx");
        let (end, removed) = session.replace(Range::new(0, 4, 0, 5), "value");
        assert_eq!(end, Point::new(0, 9));
        assert!(removed.is_empty());
        assert_eq!(session.line(0), "let value = 1;");
    }

    #[test]
    fn test_apply_settings() {
        let settings = LayoutSettingsBuilder::new()
            .tab_size(2)
            .wrap_at(40)
            .fold_style(FoldStyle::MarkBeginEnd)
            .build();
        let mut session = EditSession::new("a");
        session.apply_settings(&settings);
        assert_eq!(session.tab_size(), 2);
        assert!(session.use_wrap_mode());
        assert_eq!(session.wrap_limit(), 40);
        assert_eq!(session.wrap_limit_range(), WrapLimitRange::new(Some(40), Some(40)));
        assert_eq!(session.fold_style(), FoldStyle::MarkBeginEnd);

        let events = session.drain_events();
        assert!(events.contains(&SessionEvent::TabSizeChanged { tab_size: 2 }));
        assert!(events.contains(&SessionEvent::WrapLimitChanged { limit: 40 }));
        assert!(events.contains(&SessionEvent::WrapModeChanged { enabled: true }));
    }

    #[test]
    fn test_wrap_limit_range_constrains() {
        let mut session = EditSession::new("");
        session.set_wrap_limit_range(Some(20), Some(60));
        assert_eq!(session.wrap_limit(), 60);
        assert!(session.adjust_wrap_limit(30));
        assert_eq!(session.wrap_limit(), 30);
        assert!(!session.adjust_wrap_limit(30));
        assert!(session.adjust_wrap_limit(5));
        assert_eq!(session.wrap_limit(), 20);
    }

    #[test]
    fn test_clipping() {
        let session = EditSession::new("ab\ncdef");
        assert_eq!(session.clip_position_to_document(-1, 4), Point::ZERO);
        assert_eq!(session.clip_position_to_document(0, -3), Point::new(0, 0));
        assert_eq!(session.clip_position_to_document(0, 9), Point::new(0, 2));
        assert_eq!(session.clip_position_to_document(5, 0), Point::new(1, 4));
        assert_eq!(
            session.clip_range(Range::new(0, 5, 9, 9)),
            Range::new(0, 2, 1, 4)
        );
    }

    #[test]
    fn test_set_text_drops_folds() {
        let mut session = EditSession::new("abc\ndef");
        session.add_fold("...", Range::new(0, 1, 1, 2)).unwrap();
        session.drain_events();
        session.set_text("x\ny\nz");
        assert_eq!(session.len(), 3);
        assert_eq!(session.all_folds().count(), 0);
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::fold_removed(Range::new(0, 1, 1, 2), "...")]
        );
        assert_eq!(session.screen_length(), 3);
    }
}
