//! Wrap Map - Soft wrap configuration and split computation
//!
//! The wrap map decides where a logical line breaks into screen sub-lines.
//! Splits are expressed as document columns so they can be compared against
//! text lengths directly; filler cells from tabs and wide characters are not
//! counted.

use serde::{Deserialize, Serialize};

use super::DisplayToken;

/// Break-point heuristics used when a line has to wrap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapMethod {
    /// Look at most 10 cells back for a boundary and avoid breaking before punctuation
    Code,
    /// Look back up to three quarters of the wrap limit for whitespace
    #[default]
    Text,
}

/// Allowed range for the wrap limit; `None` bounds are open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WrapLimitRange {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl WrapLimitRange {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    /// Clamp `limit` into the range; the lower bound wins if the range is inverted
    pub fn constrain(&self, limit: usize) -> usize {
        let mut limit = limit;
        if let Some(max) = self.max {
            limit = limit.min(max);
        }
        if let Some(min) = self.min {
            limit = limit.max(min);
        }
        limit
    }
}

/// Tracks soft wrap configuration
#[derive(Clone, Debug)]
pub struct WrapMap {
    /// Whether wrapping is enabled
    enabled: bool,
    /// Current wrap limit in screen columns
    wrap_limit: usize,
    /// Bounds applied when the limit is adjusted
    limit_range: WrapLimitRange,
    method: WrapMethod,
}

impl Default for WrapMap {
    fn default() -> Self {
        Self::new(80)
    }
}

impl WrapMap {
    /// Create a disabled wrap map with the given wrap limit
    pub fn new(wrap_limit: usize) -> Self {
        Self {
            enabled: false,
            wrap_limit: wrap_limit.max(1),
            limit_range: WrapLimitRange::default(),
            method: WrapMethod::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn wrap_limit(&self) -> usize {
        self.wrap_limit
    }

    pub fn limit_range(&self) -> WrapLimitRange {
        self.limit_range
    }

    pub fn set_limit_range(&mut self, range: WrapLimitRange) {
        self.limit_range = range;
    }

    pub fn method(&self) -> WrapMethod {
        self.method
    }

    pub fn set_method(&mut self, method: WrapMethod) {
        self.method = method;
    }

    /// Constrain `desired` by the limit range and store it
    ///
    /// Returns `true` if the effective limit changed. Limits of 1 or less are
    /// ignored.
    pub fn adjust_limit(&mut self, desired: usize) -> bool {
        let limit = self.limit_range.constrain(desired);
        if limit != self.wrap_limit && limit > 1 {
            self.wrap_limit = limit;
            return true;
        }
        false
    }

    /// Compute split offsets for one line's display tokens
    pub fn compute_splits(&self, tokens: &[DisplayToken]) -> Vec<usize> {
        compute_wrap_splits(tokens, self.wrap_limit, self.method)
    }
}

/// Compute the document columns at which `tokens` wraps into screen sub-lines
pub fn compute_wrap_splits(
    tokens: &[DisplayToken],
    wrap_limit: usize,
    method: WrapMethod,
) -> Vec<usize> {
    let mut splits = Vec::new();
    if tokens.is_empty() || wrap_limit == 0 {
        return splits;
    }

    let display_length = tokens.len();
    let mut last_split = 0usize;
    let mut last_doc_split = 0usize;

    let mut add_split = |split: usize, last_split: &mut usize, splits: &mut Vec<usize>| {
        let doc_chars = tokens[*last_split..split]
            .iter()
            .filter(|token| !token.is_filler())
            .count();
        last_doc_split += doc_chars;
        splits.push(last_doc_split);
        *last_split = split;
    };

    while display_length - last_split > wrap_limit {
        let mut split = last_split + wrap_limit;

        // Whitespace on both sides of the candidate is a clean break.
        if tokens[split - 1] >= DisplayToken::Space && tokens[split] >= DisplayToken::Space {
            add_split(split, &mut last_split, &mut splits);
            continue;
        }

        if tokens[split].is_placeholder() {
            // Break before the placeholder if it starts past the previous split.
            let mut cursor = split as isize;
            while cursor >= last_split as isize {
                if tokens[cursor as usize] == DisplayToken::PlaceholderStart {
                    break;
                }
                cursor -= 1;
            }
            if cursor > last_split as isize {
                add_split(cursor as usize, &mut last_split, &mut splits);
                continue;
            }

            // Otherwise break right after it.
            split = last_split + wrap_limit;
            while split < display_length && tokens[split] == DisplayToken::PlaceholderBody {
                split += 1;
            }
            if split == display_length {
                break;
            }
            add_split(split, &mut last_split, &mut splits);
            continue;
        }

        let window = match method {
            WrapMethod::Code => 10,
            WrapMethod::Text => wrap_limit - (wrap_limit >> 2),
        };
        let min_split = (split as isize - window as isize).max(last_split as isize - 1);
        let mut cursor = split as isize;

        while cursor > min_split && tokens[cursor as usize] < DisplayToken::PlaceholderStart {
            cursor -= 1;
        }
        match method {
            WrapMethod::Code => {
                while cursor > min_split && tokens[cursor as usize] < DisplayToken::PlaceholderStart {
                    cursor -= 1;
                }
                while cursor > min_split && tokens[cursor as usize] == DisplayToken::Punctuation {
                    cursor -= 1;
                }
            }
            WrapMethod::Text => {
                while cursor > min_split && tokens[cursor as usize] < DisplayToken::Space {
                    cursor -= 1;
                }
            }
        }
        if cursor > min_split {
            add_split(cursor as usize + 1, &mut last_split, &mut splits);
            continue;
        }

        // No boundary in reach; break mid-word.
        add_split(last_split + wrap_limit, &mut last_split, &mut splits);
    }

    splits
}
