//! Canvas placement inside the window

use glam::Vec2;

pub const CANVAS_WIDTH_FRACTION: f32 = 0.8;
pub const ROTATE_PROMPT_MAX_WIDTH: f32 = 700.0;

/// Drawable area in logical pixels, origin at the window's top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CanvasRect {
    /// Left-anchored strip covering `fraction` of the window width
    pub fn for_window(window_width: f32, window_height: f32, fraction: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: (window_width * fraction.clamp(0.0, 1.0)).max(1.0),
            height: window_height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Portrait and narrow: the diagram is unreadable, ask for landscape
pub fn needs_rotate_prompt(width: f32, height: f32, max_width: f32) -> bool {
    height > width && width < max_width
}
