//! Conversion between display pixels and document units
//!
//! The page is drawn into a framed display surface. A pointer position in
//! pixels is mapped to document units by stripping the (zoom-scaled) frame,
//! normalizing against the content box, and scaling by the page's effective
//! dimensions. Rendering goes the other way through percentages so the overlay
//! stays glued to the page image at any zoom.

use crate::page::PageGeometry;

/// Bounding rectangle of the display surface in screen pixels.
///
/// `border` is the frame thickness at zoom 1.0; it scales with zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub border: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height, border: 0.0 }
    }

    pub fn with_border(mut self, border: f32) -> Self {
        self.border = border;
        self
    }
}

/// The drawable area of the display surface, frame excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentBox {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Something that can report where the page content is drawn on screen.
///
/// Returns `None` while the surface is not mounted.
pub trait DisplaySurface {
    fn content_box(&self, zoom: f32) -> Option<ContentBox>;
}

impl DisplaySurface for DisplayRect {
    fn content_box(&self, zoom: f32) -> Option<ContentBox> {
        let inset = self.border * zoom;
        let width = self.width - inset * 2.0;
        let height = self.height - inset * 2.0;

        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        Some(ContentBox {
            width,
            height,
            offset_x: self.left + inset,
            offset_y: self.top + inset,
        })
    }
}

impl<T: DisplaySurface> DisplaySurface for Option<T> {
    fn content_box(&self, zoom: f32) -> Option<ContentBox> {
        self.as_ref().and_then(|surface| surface.content_box(zoom))
    }
}

/// A surface that has not been laid out yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unmounted;

impl DisplaySurface for Unmounted {
    fn content_box(&self, _zoom: f32) -> Option<ContentBox> {
        None
    }
}

/// Map a pointer position in pixels to document units on the displayed page.
///
/// The result is clamped to the page's effective bounds. An unmounted surface
/// yields `(0, 0)`.
pub fn to_document_units<S: DisplaySurface + ?Sized>(
    pointer_x: f32,
    pointer_y: f32,
    surface: &S,
    geometry: &PageGeometry,
    zoom: f32,
) -> (f32, f32) {
    let Some(content) = surface.content_box(zoom) else {
        log::warn!("display surface not mounted, pointer mapped to page origin");
        return (0.0, 0.0);
    };

    let ratio_x = (pointer_x - content.offset_x) / content.width;
    let ratio_y = (pointer_y - content.offset_y) / content.height;

    let x = (ratio_x * geometry.effective_width).clamp(0.0, geometry.effective_width);
    let y = (ratio_y * geometry.effective_height).clamp(0.0, geometry.effective_height);

    (x, y)
}

/// Map a pixel delta to a document-unit delta, without clamping.
///
/// Used for resize, where the delta accumulates from the pointer-down position.
pub fn delta_to_document_units<S: DisplaySurface + ?Sized>(
    dx: f32,
    dy: f32,
    surface: &S,
    geometry: &PageGeometry,
    zoom: f32,
) -> (f32, f32) {
    match surface.content_box(zoom) {
        Some(content) => (
            dx / content.width * geometry.effective_width,
            dy / content.height * geometry.effective_height,
        ),
        None => (0.0, 0.0),
    }
}

/// Position in percent of the displayed page, for placing overlays.
pub fn to_display_percent(x: f32, y: f32, geometry: &PageGeometry) -> (f32, f32) {
    (x / geometry.effective_width * 100.0, y / geometry.effective_height * 100.0)
}

/// Position in screen pixels, the inverse of [`to_document_units`] for points on the page.
pub fn to_display_pixels<S: DisplaySurface + ?Sized>(
    x: f32,
    y: f32,
    surface: &S,
    geometry: &PageGeometry,
    zoom: f32,
) -> Option<(f32, f32)> {
    let content = surface.content_box(zoom)?;
    let (percent_x, percent_y) = to_display_percent(x, y, geometry);

    Some((
        content.offset_x + percent_x / 100.0 * content.width,
        content.offset_y + percent_y / 100.0 * content.height,
    ))
}
