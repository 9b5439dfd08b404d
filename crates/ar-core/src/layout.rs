//! Presentation-layer geometry consumed by pagination

use serde::{Deserialize, Serialize};

/// Visible reading area in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(390.0, 844.0)
    }
}

/// Text metrics used to estimate how many words fit on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    /// Font size in logical pixels
    pub font_size: f32,
    /// Line height in logical pixels
    pub line_height: f32,
}

impl Typography {
    pub const fn new(font_size: f32, line_height: f32) -> Self {
        Self {
            font_size,
            line_height,
        }
    }
}

impl Default for Typography {
    fn default() -> Self {
        Self::new(18.0, 28.0)
    }
}
