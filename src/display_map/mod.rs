//! Display Map - Layout layers between document text and the screen
//!
//! The display map turns raw document rows into the rows a renderer paints.
//! Each layer handles one part of that transformation:
//!
//! - **TabMap**: Classifies characters into display cells (tabs, wide chars, punctuation)
//! - **WrapMap**: Splits long lines into screen sub-lines at good break points
//! - **FoldMap**: Collapses document ranges into placeholders, grouped into fold lines
//! - **LayoutCache**: Row widths, wrap splits and sampled doc/screen row pairs
//!
//! ## Coordinate Systems
//!
//! - **Point**: Position in the raw document (row, column in chars)
//! - **ScreenPoint**: Rendered position after folding and soft wrapping
//!
//! The layers are driven by [`EditSession`](crate::session::EditSession), which
//! owns the document and keeps every layer consistent across edits.

mod point;
mod fold_map;
mod wrap_map;
mod tab_map;
mod row_cache;
mod line_widgets;

pub use point::*;
pub use fold_map::*;
pub use wrap_map::*;
pub use tab_map::*;
pub use row_cache::*;
pub use line_widgets::*;

use serde::{Deserialize, Serialize};

/// A row/column point in document coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub const ZERO: Point = Point { row: 0, column: 0 };

    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}]", self.row, self.column)
    }
}

impl From<(usize, usize)> for Point {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}
