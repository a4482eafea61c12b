use std::sync::Arc;

use crate::assets::color::Color;
use crate::assets::decode::DecodedImage;

/// Background color a new editor starts with.
pub const DEFAULT_BACKGROUND: Color = Color::rgb(0x03, 0x69, 0xA1);
/// Number of recently used colors kept by default.
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

/// Bounded, duplicate-free history of used colors, most recent last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentColors {
    colors: Vec<Color>,
    capacity: usize,
}

impl RecentColors {
    /// Empty history keeping at most `capacity` colors.
    pub fn new(capacity: usize) -> Self {
        Self {
            colors: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `color`. A color already present is left where it is (no reorder, no duplicate);
    /// otherwise it is appended and the oldest entries are dropped past capacity.
    ///
    /// Returns `true` when the history changed.
    pub fn push(&mut self, color: Color) -> bool {
        if self.capacity == 0 || self.colors.contains(&color) {
            return false;
        }
        self.colors.push(color);
        if self.colors.len() > self.capacity {
            let excess = self.colors.len() - self.capacity;
            self.colors.drain(..excess);
        }
        true
    }

    /// Colors, oldest first.
    pub fn as_slice(&self) -> &[Color] {
        &self.colors
    }

    /// Color at `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    /// Number of stored colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Return `true` when no color has been recorded.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Maximum number of stored colors.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentColors {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_CAPACITY)
    }
}

/// User-owned editing state, changed only through the methods below.
#[derive(Debug, Clone)]
pub struct EditorState {
    background_color: Color,
    selected_image: Option<Arc<DecodedImage>>,
    recent_colors: RecentColors,
}

impl EditorState {
    /// Fresh state with the given initial background and history capacity.
    pub fn new(background_color: Color, recent_capacity: usize) -> Self {
        Self {
            background_color,
            selected_image: None,
            recent_colors: RecentColors::new(recent_capacity),
        }
    }

    /// Current background fill.
    pub fn background_color(&self) -> Color {
        self.background_color
    }

    /// Photo drawn into the image rectangle, if any.
    pub fn selected_image(&self) -> Option<&Arc<DecodedImage>> {
        self.selected_image.as_ref()
    }

    /// Recently used background colors.
    pub fn recent_colors(&self) -> &RecentColors {
        &self.recent_colors
    }

    /// Use `color` as background and record it in the history.
    pub fn set_background_color(&mut self, color: Color) {
        self.background_color = color;
        self.recent_colors.push(color);
    }

    /// Replace (or clear) the user photo.
    pub fn set_selected_image(&mut self, image: Option<Arc<DecodedImage>>) {
        self.selected_image = image;
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND, DEFAULT_RECENT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/state.rs"]
mod tests;
