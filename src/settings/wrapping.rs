//! Soft wrap settings

use serde::{Deserialize, Serialize};

use crate::display_map::{WrapLimitRange, WrapMethod};

/// Soft wrap settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrappingSettings {
    /// Enable soft wrap
    pub enabled: bool,

    /// Wrap column used until the viewport asks for another one
    pub wrap_limit: usize,

    /// Lower bound for the wrap column (None = unbounded)
    pub min: Option<usize>,

    /// Upper bound for the wrap column (None = unbounded)
    pub max: Option<usize>,

    /// Break-point heuristics
    pub method: WrapMethod,
}

impl Default for WrappingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            wrap_limit: 80,
            min: None,
            max: None,
            method: WrapMethod::Text,
        }
    }
}

impl WrappingSettings {
    /// Wrap at a fixed column
    pub fn fixed(column: usize) -> Self {
        Self {
            enabled: true,
            wrap_limit: column,
            min: Some(column),
            max: Some(column),
            method: WrapMethod::Text,
        }
    }

    pub fn limit_range(&self) -> WrapLimitRange {
        WrapLimitRange::new(self.min, self.max)
    }
}
