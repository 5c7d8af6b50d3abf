//! Tab Map - Display cell classification and screen width measurement
//!
//! Every character of a line maps to one or more display cells. Tabs expand
//! to the next tab stop, wide (CJK) characters take two cells, and fold
//! placeholders are marked so the wrap engine can avoid breaking inside them.

/// Category of a single display cell
///
/// The ordering matters: everything at or above [`DisplayToken::Space`] is
/// whitespace, everything below [`DisplayToken::PlaceholderStart`] is text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DisplayToken {
    Char = 1,
    CharExt = 2,
    PlaceholderStart = 3,
    PlaceholderBody = 4,
    Punctuation = 9,
    Space = 10,
    Tab = 11,
    TabSpace = 12,
}

impl DisplayToken {
    /// Synthetic filler cells that do not correspond to a document character
    pub fn is_filler(self) -> bool {
        matches!(self, DisplayToken::TabSpace | DisplayToken::CharExt)
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, DisplayToken::PlaceholderStart | DisplayToken::PlaceholderBody)
    }
}

/// Handles tab expansion and cell widths for display
#[derive(Clone, Debug)]
pub struct TabMap {
    /// Tab size in columns
    tab_size: usize,
}

impl Default for TabMap {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TabMap {
    /// Create a new tab map with the given tab size
    pub fn new(tab_size: usize) -> Self {
        Self {
            tab_size: tab_size.max(1),
        }
    }

    /// Set the tab size
    pub fn set_tab_size(&mut self, size: usize) {
        self.tab_size = size.max(1);
    }

    /// Get the tab size
    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Number of columns a tab occupies when it starts at `screen_column`
    pub fn screen_tab_size(&self, screen_column: usize) -> usize {
        self.tab_size - screen_column % self.tab_size
    }

    /// Classify each character of `text` into display cells
    ///
    /// `offset` is the number of cells already emitted on this screen line,
    /// used to place tab stops correctly for text that follows a fold.
    pub fn display_tokens(&self, text: &str, offset: usize) -> Vec<DisplayToken> {
        let mut tokens = Vec::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\t' => {
                    let tab_size = self.screen_tab_size(tokens.len() + offset);
                    tokens.push(DisplayToken::Tab);
                    tokens.extend(std::iter::repeat(DisplayToken::TabSpace).take(tab_size - 1));
                }
                ' ' => tokens.push(DisplayToken::Space),
                c if is_punctuation(c) => tokens.push(DisplayToken::Punctuation),
                c if is_full_width(c) => {
                    tokens.push(DisplayToken::Char);
                    tokens.push(DisplayToken::CharExt);
                }
                _ => tokens.push(DisplayToken::Char),
            }
        }
        tokens
    }

    /// Measure `text` starting at `screen_column`
    ///
    /// Stops at the first character that pushes the width past
    /// `max_screen_column`. Returns the screen column reached (including that
    /// character) and the number of characters that fit.
    pub fn string_screen_width(
        &self,
        text: &str,
        max_screen_column: Option<usize>,
        screen_column: usize,
    ) -> (usize, usize) {
        if max_screen_column == Some(0) {
            return (0, 0);
        }
        let max = max_screen_column.unwrap_or(usize::MAX);
        let mut screen_column = screen_column;
        let mut column = 0;

        for ch in text.chars() {
            if ch == '\t' {
                screen_column += self.screen_tab_size(screen_column);
            } else if is_full_width(ch) {
                screen_column += 2;
            } else {
                screen_column += 1;
            }
            if screen_column > max {
                break;
            }
            column += 1;
        }

        (screen_column, column)
    }
}

/// ASCII punctuation that makes a good code wrap boundary: `()*+,-./` and `:;<=>?`
pub fn is_punctuation(ch: char) -> bool {
    let c = ch as u32;
    (c > 39 && c < 48) || (c > 57 && c < 64)
}

/// Whether `ch` occupies two screen cells
pub fn is_full_width(ch: char) -> bool {
    let c = ch as u32;
    if c < 0x1100 {
        return false;
    }
    FULL_WIDTH_RANGES
        .iter()
        .any(|&(low, high)| c >= low && c <= high)
}

const FULL_WIDTH_RANGES: &[(u32, u32)] = &[
    (0x1100, 0x115F),
    (0x11A3, 0x11A7),
    (0x11FA, 0x11FF),
    (0x2329, 0x232A),
    (0x2E80, 0x2E99),
    (0x2E9B, 0x2EF3),
    (0x2F00, 0x2FD5),
    (0x2FF0, 0x2FFB),
    (0x3000, 0x303E),
    (0x3041, 0x3096),
    (0x3099, 0x30FF),
    (0x3105, 0x312D),
    (0x3131, 0x318E),
    (0x3190, 0x31BA),
    (0x31C0, 0x31E3),
    (0x31F0, 0x321E),
    (0x3220, 0x3247),
    (0x3250, 0x32FE),
    (0x3300, 0x4DBF),
    (0x4E00, 0xA48C),
    (0xA490, 0xA4C6),
    (0xA960, 0xA97C),
    (0xAC00, 0xD7A3),
    (0xD7B0, 0xD7C6),
    (0xD7CB, 0xD7FB),
    (0xF900, 0xFAFF),
    (0xFE10, 0xFE19),
    (0xFE30, 0xFE52),
    (0xFE54, 0xFE66),
    (0xFE68, 0xFE6B),
    (0xFF01, 0xFF60),
    (0xFFE0, 0xFFE6),
];

#[cfg(test)]
mod tests {
    use super::*;
    use DisplayToken::*;

    #[test]
    fn test_tab_expands_to_next_stop() {
        let tab_map = TabMap::new(4);
        assert_eq!(tab_map.display_tokens("a\tb", 0), vec![Char, Tab, TabSpace, TabSpace, Char]);
        assert_eq!(tab_map.display_tokens("\t", 2), vec![Tab, TabSpace]);
    }

    #[test]
    fn test_token_classes() {
        let tab_map = TabMap::new(4);
        assert_eq!(tab_map.display_tokens("a (b", 0), vec![Char, Space, Punctuation, Char]);
        assert_eq!(tab_map.display_tokens("中x", 0), vec![Char, CharExt, Char]);
        assert_eq!(tab_map.display_tokens("{}", 0), vec![Char, Char]);
    }

    #[test]
    fn test_punctuation_bands() {
        for ch in "()*+,-./:;<=>?".chars() {
            assert!(is_punctuation(ch), "{ch:?}");
        }
        for ch in "'0@[{a".chars() {
            assert!(!is_punctuation(ch), "{ch:?}");
        }
    }

    #[test]
    fn test_string_screen_width() {
        let tab_map = TabMap::new(4);
        assert_eq!(tab_map.string_screen_width("abc", None, 0), (3, 3));
        assert_eq!(tab_map.string_screen_width("\tx", None, 0), (5, 2));
        assert_eq!(tab_map.string_screen_width("\tx", None, 1), (5, 2));
        assert_eq!(tab_map.string_screen_width("中文", None, 0), (4, 2));
    }

    #[test]
    fn test_string_screen_width_stops_at_max() {
        let tab_map = TabMap::new(4);
        assert_eq!(tab_map.string_screen_width("abcdef", Some(2), 0), (3, 2));
        assert_eq!(tab_map.string_screen_width("中文", Some(3), 0), (4, 1));
        assert_eq!(tab_map.string_screen_width("abc", Some(0), 0), (0, 0));
    }

    #[test]
    fn test_screen_tab_size() {
        let tab_map = TabMap::new(4);
        assert_eq!(tab_map.screen_tab_size(0), 4);
        assert_eq!(tab_map.screen_tab_size(3), 1);
        assert_eq!(tab_map.screen_tab_size(5), 3);
    }
}
