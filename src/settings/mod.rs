//! Layout settings
//!
//! Everything that changes how document rows map to screen rows lives in one
//! [`LayoutSettings`] resource. Use [`LayoutSettingsBuilder`] for convenient
//! initialization.

mod folding;
mod indentation;
mod wrapping;

pub use folding::*;
pub use indentation::*;
pub use wrapping::*;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::display_map::WrapMethod;
use crate::folding::FoldStyle;

/// Complete layout settings
///
/// Missing fields fall back to their defaults when deserializing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Tab stops
    pub indentation: IndentationSettings,

    /// Soft wrap
    pub wrapping: WrappingSettings,

    /// Fold widgets
    pub folding: FoldingSettings,
}

impl LayoutSettings {
    /// Soft wrap at the viewport width, widgets on opening and closing rows
    pub fn wrapped() -> Self {
        Self {
            wrapping: WrappingSettings {
                enabled: true,
                ..default()
            },
            folding: FoldingSettings {
                style: FoldStyle::MarkBeginEnd,
            },
            ..default()
        }
    }
}

/// Builder for configuring layout settings
///
/// # Example
/// ```no_run
/// use bevy_code_layout::settings::LayoutSettingsBuilder;
///
/// let settings = LayoutSettingsBuilder::default()
///     .tab_size(2)
///     .wrap_at(100)
///     .build();
/// ```
#[derive(Default)]
pub struct LayoutSettingsBuilder {
    settings: LayoutSettings,
}

impl LayoutSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // Indentation
    pub fn tab_size(mut self, tab_size: usize) -> Self {
        self.settings.indentation.tab_size = tab_size;
        self
    }

    // Wrapping
    pub fn wrap(mut self, enabled: bool) -> Self {
        self.settings.wrapping.enabled = enabled;
        self
    }

    /// Enable soft wrap at a fixed column
    pub fn wrap_at(mut self, column: usize) -> Self {
        self.settings.wrapping = WrappingSettings {
            method: self.settings.wrapping.method,
            ..WrappingSettings::fixed(column)
        };
        self
    }

    pub fn wrap_limit_range(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.settings.wrapping.min = min;
        self.settings.wrapping.max = max;
        self
    }

    pub fn wrap_method(mut self, method: WrapMethod) -> Self {
        self.settings.wrapping.method = method;
        self
    }

    // Folding
    pub fn fold_style(mut self, style: FoldStyle) -> Self {
        self.settings.folding.style = style;
        self
    }

    // Custom settings
    pub fn indentation(mut self, indentation: IndentationSettings) -> Self {
        self.settings.indentation = indentation;
        self
    }

    pub fn wrapping(mut self, wrapping: WrappingSettings) -> Self {
        self.settings.wrapping = wrapping;
        self
    }

    pub fn folding(mut self, folding: FoldingSettings) -> Self {
        self.settings.folding = folding;
        self
    }

    pub fn build(self) -> LayoutSettings {
        self.settings
    }
}
