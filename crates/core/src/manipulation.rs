//! Annotation manipulation handles and box operations
//!
//! Provides the four corner handles of a selected text box and the pure box
//! arithmetic used while dragging and resizing. Everything here works in
//! document units with a top-left origin.

use crate::page::PageGeometry;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in document units, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rect
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Check if a point lies inside the rect (edges included)
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// Corner of a box used as a resize handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    /// Top-left
    Nw,
    /// Top-right
    Ne,
    /// Bottom-left
    Sw,
    /// Bottom-right
    Se,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    /// Whether dragging this corner moves the box's left edge
    pub fn moves_left_edge(self) -> bool {
        matches!(self, Corner::Nw | Corner::Sw)
    }

    /// Whether dragging this corner moves the box's top edge
    pub fn moves_top_edge(self) -> bool {
        matches!(self, Corner::Nw | Corner::Ne)
    }
}

/// Resize handle with position and hit radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeHandle {
    pub corner: Corner,

    /// Handle centre in document units
    pub x: f32,
    pub y: f32,

    /// Radius of the hit area in document units
    pub radius: f32,
}

impl ResizeHandle {
    /// Check if a point hits this handle
    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt() <= self.radius
    }
}

/// Generate the corner handles for a box
///
/// Returned in [`Corner::ALL`] order.
pub fn generate_handles(rect: &Rect, radius: f32) -> [ResizeHandle; 4] {
    Corner::ALL.map(|corner| {
        let x = if corner.moves_left_edge() { rect.x } else { rect.right() };
        let y = if corner.moves_top_edge() { rect.y } else { rect.bottom() };
        ResizeHandle { corner, x, y, radius }
    })
}

/// Minimum box dimensions enforced by resize
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    pub min_width: f32,
    pub min_height: f32,
}

/// Compute the box produced by dragging `corner` by `(dx, dy)` from `origin`.
///
/// The edges opposite the dragged corner stay fixed. If the moving left or top
/// edge would cross the page origin, the position clamps to 0 and the width or
/// height absorbs the overflow, so the box never escapes past the top-left of
/// the page. Width and height never drop below the limits.
pub fn resize_box(
    origin: &Rect,
    corner: Corner,
    dx: f32,
    dy: f32,
    limits: SizeLimits,
    geometry: &PageGeometry,
) -> Rect {
    let mut x = origin.x;
    let mut y = origin.y;

    let mut width = if corner.moves_left_edge() {
        (origin.width - dx).max(limits.min_width)
    } else {
        (origin.width + dx).max(limits.min_width)
    };
    let mut height = if corner.moves_top_edge() {
        (origin.height - dy).max(limits.min_height)
    } else {
        (origin.height + dy).max(limits.min_height)
    };

    if corner.moves_left_edge() {
        x = origin.x + origin.width - width;
    }
    if corner.moves_top_edge() {
        y = origin.y + origin.height - height;
    }

    if x < 0.0 {
        width += x;
        x = 0.0;
    }
    if y < 0.0 {
        height += y;
        y = 0.0;
    }

    width = width.min(geometry.effective_width - x).max(limits.min_width);
    height = height.min(geometry.effective_height - y).max(limits.min_height);

    Rect { x, y, width, height }
}

/// Clamp a box position so the whole box stays on the displayed page
pub fn clamp_to_page(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    geometry: &PageGeometry,
) -> (f32, f32) {
    let max_x = (geometry.effective_width - width).max(0.0);
    let max_y = (geometry.effective_height - height).max(0.0);
    (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
}
