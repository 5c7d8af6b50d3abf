//! Fold widget settings

use serde::{Deserialize, Serialize};

use crate::folding::FoldStyle;

/// Folding settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldingSettings {
    /// Which rows get fold widgets
    pub style: FoldStyle,
}
