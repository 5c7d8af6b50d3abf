//! # Bevy Code Layout
//!
//! Fold and soft-wrap layout core for Bevy code editors.
//!
//! An [`EditSession`](session::EditSession) owns a document and keeps folds,
//! wrap data and row caches consistent while the document is edited. It
//! translates between document positions and the screen positions a renderer
//! paints.
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_code_layout::prelude::*;
//!
//! fn main() {
//!     let mut app = App::new();
//!     app.add_plugins(LayoutPlugin::with_settings(LayoutSettings::wrapped()).with_text("fn main() {}"));
//!     app.update();
//! }
//! ```
//!
//! ## Without Bevy systems
//!
//! ```rust
//! use bevy_code_layout::prelude::*;
//!
//! let mut session = EditSession::new("function foo() {\n  return 1;\n}");
//! session.add_fold("...", Range::new(0, 16, 2, 1)).unwrap();
//! assert_eq!(session.screen_length(), 1);
//! assert_eq!(session.document_to_screen_position(2, 1), ScreenPoint::new(0, 19));
//! ```

pub mod arena;
pub mod display_map;
pub mod document;
pub mod error;
pub mod events;
pub mod folding;
pub mod plugin;
pub mod session;
pub mod settings;

pub mod prelude {
    //! Convenient re-exports for common usage
    pub use crate::plugin::LayoutPlugin;
    pub use crate::settings::*;
    pub use crate::events::*;
    pub use crate::error::FoldError;
    pub use crate::session::{EditSession, FoldPlacement, FoldToggle, ParentFoldRange};
    pub use crate::document::{Delta, DeltaAction, Document, TextSource};
    pub use crate::folding::{
        CstyleFoldProvider, FoldStyle, FoldWidget, FoldWidgetProvider, IndentFoldProvider,
    };
    pub use crate::display_map::{
        Fold, FoldId, FoldLine, Point, Range, ScreenPoint, Side, WrapLimitRange, WrapMethod,
    };
}
