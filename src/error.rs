//! Error types for fold operations

use thiserror::Error;

use crate::display_map::Range;

/// Reasons a fold cannot be added
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FoldError {
    /// The range covers fewer than two characters
    #[error("the range {range} has to be at least 2 characters wide")]
    TooShort { range: Range },

    /// The range crosses the boundary of an existing fold
    #[error("a fold can't intersect an already existing fold: {range} crosses {existing}")]
    Intersects { range: Range, existing: Range },

    /// A sub-fold must lie within its parent
    #[error("the fold {range} is not contained in {parent}")]
    NotContained { range: Range, parent: Range },
}
