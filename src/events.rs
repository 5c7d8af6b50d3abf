//! Session events for inter-plugin communication

use bevy::prelude::*;

use crate::display_map::Range;
use crate::document::DeltaAction;

/// Notification emitted by an [`EditSession`](crate::session::EditSession)
///
/// Events are queued on the session while it runs and forwarded as Bevy
/// messages by [`LayoutPlugin`](crate::plugin::LayoutPlugin).
#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A fold was added to the fold map
    FoldAdded { range: Range, placeholder: String },
    /// A fold was removed, expanded, or destroyed by an edit
    FoldRemoved { range: Range, placeholder: String },
    /// The document changed; `version` counts applied deltas
    DocumentChanged {
        action: DeltaAction,
        range: Range,
        version: u64,
    },
    /// Soft wrap was switched on or off
    WrapModeChanged { enabled: bool },
    /// The effective wrap limit changed
    WrapLimitChanged { limit: usize },
    /// The tab size changed
    TabSizeChanged { tab_size: usize },
}

impl SessionEvent {
    pub fn fold_added(range: Range, placeholder: impl Into<String>) -> Self {
        Self::FoldAdded {
            range,
            placeholder: placeholder.into(),
        }
    }

    pub fn fold_removed(range: Range, placeholder: impl Into<String>) -> Self {
        Self::FoldRemoved {
            range,
            placeholder: placeholder.into(),
        }
    }
}
