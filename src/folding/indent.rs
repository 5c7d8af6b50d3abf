//! Indentation folding for languages without block delimiters

use super::{first_non_blank, indentation_block, FoldStyle, FoldWidget, FoldWidgetProvider};
use crate::display_map::Range;
use crate::document::TextSource;

/// Folds every row whose next non-blank row is indented more deeply
#[derive(Clone, Copy, Debug, Default)]
pub struct IndentFoldProvider;

impl IndentFoldProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FoldWidgetProvider for IndentFoldProvider {
    fn fold_widget(&self, doc: &dyn TextSource, _style: FoldStyle, row: usize) -> Option<FoldWidget> {
        let indent = first_non_blank(&doc.line(row))?;
        let next = (row + 1..doc.len()).find_map(|next| first_non_blank(&doc.line(next)))?;
        (next > indent).then_some(FoldWidget::Start)
    }

    fn fold_widget_range(
        &self,
        doc: &dyn TextSource,
        _style: FoldStyle,
        row: usize,
        _force_multiline: bool,
    ) -> Option<Range> {
        indentation_block(doc, row, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_indent_widgets_and_ranges() {
        let doc = Document::from_lines(&[
            "class A:",
            "    def f(self):",
            "        pass",
            "",
            "    x = 1",
            "y = 2",
        ]);
        let provider = IndentFoldProvider::new();
        let widgets: Vec<_> = (0..doc.len())
            .map(|row| provider.fold_widget(&doc, FoldStyle::MarkBegin, row))
            .collect();
        assert_eq!(
            widgets,
            vec![Some(FoldWidget::Start), Some(FoldWidget::Start), None, None, None, None]
        );
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 0, false),
            Some(Range::new(0, 8, 4, 9))
        );
        assert_eq!(
            provider.fold_widget_range(&doc, FoldStyle::MarkBegin, 1, false),
            Some(Range::new(1, 16, 2, 12))
        );
    }
}
