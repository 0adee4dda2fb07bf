//! Annotation data model and store
//!
//! A text annotation is a floating box on one page. Positions are stored in
//! document units with a top-left origin on the displayed (rotated) page; the
//! conversion to the document's own coordinate system happens only on save.
//! The store exclusively owns every annotation; callers refer to them by id.

use crate::config::EditorConfig;
use crate::manipulation::{clamp_to_page, resize_box, Corner, Rect, SizeLimits};
use crate::page::PageGeometry;
use serde::{Deserialize, Serialize};

/// Unique identifier for an annotation
///
/// Generated using UUID v4 for guaranteed uniqueness.
pub type AnnotationId = uuid::Uuid;

/// RGBA color representation
///
/// Serialized as a `#rrggbb` (or `#rrggbbaa`) hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();

        match digits.len() {
            3 => {
                let mut expanded = String::with_capacity(6);
                for c in digits.chars() {
                    expanded.push(c);
                    expanded.push(c);
                }
                Self::from_hex(&expanded)
            }
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, appending alpha only when not opaque
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Common annotation colors
impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// A floating text box on one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Stable unique identifier
    id: AnnotationId,

    text: String,

    /// Top-left corner in document units on the displayed page
    x: f32,
    y: f32,
    width: f32,
    height: f32,

    /// Page number (1-based)
    page: u32,

    font_size: f32,
    color: Color,
}

impl Annotation {
    /// Create a new, empty annotation with a generated ID
    pub fn new(page: u32, rect: Rect, font_size: f32, color: Color) -> Self {
        Self::with_id(AnnotationId::new_v4(), page, rect, font_size, color)
    }

    /// Create an annotation with a specific ID (for deserialization and tests)
    pub fn with_id(id: AnnotationId, page: u32, rect: Rect, font_size: f32, color: Color) -> Self {
        Self {
            id,
            text: String::new(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            page,
            font_size,
            color,
        }
    }

    /// Builder-style text setter
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Get the box in document units
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Whether the annotation would be discarded on save
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Copy with a fresh identity, keeping text and style
    pub fn duplicate(&self) -> Self {
        Self { id: AnnotationId::new_v4(), ..self.clone() }
    }

    /// Copy with a fresh identity placed at `(x, y)` on `page`
    pub fn duplicate_at(&self, page: u32, x: f32, y: f32) -> Self {
        Self { page, x, y, ..self.duplicate() }
    }

    fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.width = rect.width;
        self.height = rect.height;
    }
}

/// Partial style update; `None` fields are left untouched
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StylePatch {
    pub font_size: Option<f32>,
    pub color: Option<Color>,
}

impl StylePatch {
    pub fn font_size(font_size: f32) -> Self {
        Self { font_size: Some(font_size), color: None }
    }

    pub fn color(color: Color) -> Self {
        Self { font_size: None, color: Some(color) }
    }

    pub fn is_empty(&self) -> bool {
        self.font_size.is_none() && self.color.is_none()
    }
}

/// Style applied to the next created annotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleDefaults {
    pub font_size: f32,
    pub color: Color,
}

/// Ordered collection of annotations across all pages
///
/// Insertion order doubles as z-order: later annotations render on top.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    defaults: StyleDefaults,
    config: EditorConfig,
}

impl AnnotationStore {
    /// Create a new empty store
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            annotations: Vec::new(),
            defaults: StyleDefaults {
                font_size: config.default_font_size,
                color: config.default_color,
            },
            config: config.clone(),
        }
    }

    /// Create an annotation with its top-left at the given point
    ///
    /// The box size derives from the font size and the box is pulled back onto
    /// the page if it would overhang the right or bottom edge.
    pub fn create(
        &mut self,
        x: f32,
        y: f32,
        page: u32,
        font_size: f32,
        color: Color,
        geometry: &PageGeometry,
    ) -> Annotation {
        let (width, height) = self.config.default_box_size(font_size);
        let (x, y) = clamp_to_page(x, y, width, height, geometry);

        let annotation = Annotation::new(page, Rect::new(x, y, width, height), font_size, color);
        log::debug!("created annotation {} on page {page} at ({x}, {y})", annotation.id);

        self.annotations.push(annotation.clone());
        annotation
    }

    /// Create an annotation using the last-used style
    pub fn create_with_defaults(
        &mut self,
        x: f32,
        y: f32,
        page: u32,
        geometry: &PageGeometry,
    ) -> Annotation {
        let StyleDefaults { font_size, color } = self.defaults;
        self.create(x, y, page, font_size, color, geometry)
    }

    /// Insert a fully-formed annotation (paste, restore)
    pub fn insert(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Replace the text of an annotation
    ///
    /// Returns `false` if the id is unknown.
    pub fn update_text(&mut self, id: AnnotationId, text: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(annotation) => {
                annotation.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Apply a style patch to an annotation and remember it for the next creation
    ///
    /// Returns `false` if the id is unknown; the defaults are updated either way.
    pub fn update_style(&mut self, id: AnnotationId, patch: StylePatch) -> bool {
        self.update_defaults(patch);

        match self.get_mut(id) {
            Some(annotation) => {
                if let Some(font_size) = patch.font_size {
                    annotation.font_size = font_size;
                }
                if let Some(color) = patch.color {
                    annotation.color = color;
                }
                true
            }
            None => false,
        }
    }

    /// Update the last-used style without touching any annotation
    pub fn update_defaults(&mut self, patch: StylePatch) {
        if let Some(font_size) = patch.font_size {
            self.defaults.font_size = font_size;
        }
        if let Some(color) = patch.color {
            self.defaults.color = color;
        }
    }

    /// Move an annotation's top-left corner; callers are responsible for clamping
    pub fn move_to(&mut self, id: AnnotationId, x: f32, y: f32) -> bool {
        match self.get_mut(id) {
            Some(annotation) => {
                annotation.x = x;
                annotation.y = y;
                true
            }
            None => false,
        }
    }

    /// Resize an annotation by dragging `corner` by `(dx, dy)` from its box at `origin`
    ///
    /// See [`resize_box`] for the exact corner rules.
    pub fn resize(
        &mut self,
        id: AnnotationId,
        corner: Corner,
        origin: &Rect,
        dx: f32,
        dy: f32,
        geometry: &PageGeometry,
    ) -> bool {
        let limits = self.size_limits();
        match self.get_mut(id) {
            Some(annotation) => {
                annotation.set_rect(resize_box(origin, corner, dx, dy, limits, geometry));
                true
            }
            None => false,
        }
    }

    /// Remove an annotation by ID
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        log::debug!("removed annotation {id}");
        Some(self.annotations.remove(index))
    }

    /// Get an annotation by ID
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.get(id).is_some()
    }

    /// Get all annotations for a page, in z-order
    pub fn by_page(&self, page: u32) -> Vec<&Annotation> {
        self.annotations.iter().filter(|a| a.page == page).collect()
    }

    /// Find the topmost annotation whose box contains the point
    pub fn hit_test(&self, page: u32, x: f32, y: f32) -> Option<&Annotation> {
        self.annotations.iter().rev().find(|a| a.page == page && a.rect().contains(x, y))
    }

    /// Get all annotations in z-order
    pub fn all(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Deep copy of the current annotation set
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    /// Replace the whole annotation set (undo/redo, restore)
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
    }

    /// Get count of annotations
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Clear all annotations
    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    pub fn defaults(&self) -> StyleDefaults {
        self.defaults
    }

    pub fn size_limits(&self) -> SizeLimits {
        SizeLimits {
            min_width: self.config.min_width,
            min_height: self.config.min_height,
        }
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}
