//! Tab settings

use serde::{Deserialize, Serialize};

/// Tab and indentation settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentationSettings {
    /// Tab size (number of columns per tab stop)
    pub tab_size: usize,
}

impl Default for IndentationSettings {
    fn default() -> Self {
        Self { tab_size: 4 }
    }
}
