//! Page geometry and the page rasterizer capability
//!
//! Page geometry is produced by the rasterizer when a document is loaded and
//! is immutable afterwards. A reload replaces the whole set.

use serde::{Deserialize, Serialize};

/// Page rotation in clockwise quarter turns.
///
/// Values outside 0/90/180/270 are treated as unrotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Map a rotation in degrees, falling back to [`Rotation::Deg0`] for anything unexpected.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees {
            90 => Rotation::Deg90,
            180 => Rotation::Deg180,
            270 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether the displayed page has its width and height swapped
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl From<i32> for Rotation {
    fn from(degrees: i32) -> Self {
        Rotation::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Geometry of one page, in document units.
///
/// `width`/`height` describe the unrotated page box. The effective dimensions
/// are what the user sees after the page rotation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
    #[serde(default)]
    pub rotation: Rotation,
    pub effective_width: f32,
    pub effective_height: f32,
}

impl PageGeometry {
    /// Create geometry for an unrotated box with a zero origin, deriving the effective size.
    pub fn new(width: f32, height: f32, rotation: Rotation) -> Self {
        let (effective_width, effective_height) =
            if rotation.is_quarter_turn() { (height, width) } else { (width, height) };

        Self {
            width,
            height,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation,
            effective_width,
            effective_height,
        }
    }

    /// Set a non-zero page origin (e.g. a media box that does not start at 0,0)
    pub fn with_offset(mut self, offset_x: f32, offset_y: f32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }
}

/// Output of rasterizing a document: one image and one geometry per page, index-aligned.
#[derive(Debug, Clone)]
pub struct RasterizedDocument<I> {
    pub images: Vec<I>,
    pub page_geometries: Vec<PageGeometry>,
}

impl<I> RasterizedDocument<I> {
    /// Pair page images with their geometry.
    ///
    /// # Errors
    /// Returns [`RasterizeError::Misaligned`] when the two lists differ in length.
    pub fn new(images: Vec<I>, page_geometries: Vec<PageGeometry>) -> Result<Self, RasterizeError> {
        if images.len() != page_geometries.len() {
            return Err(RasterizeError::Misaligned {
                images: images.len(),
                geometries: page_geometries.len(),
            });
        }
        Ok(Self { images, page_geometries })
    }

    pub fn page_count(&self) -> usize {
        self.page_geometries.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterizeError {
    #[error("document could not be decoded: {0}")]
    Decode(String),
    #[error("rasterizer returned {images} images for {geometries} page geometries")]
    Misaligned { images: usize, geometries: usize },
    #[error("backend error: {0}")]
    Backend(String),
}

/// Decodes a document into page images plus per-page geometry.
///
/// Implemented outside this crate by whatever PDF backend the host uses.
pub trait PageRasterizer {
    type Image;

    fn rasterize(&mut self, document: &[u8])
        -> Result<RasterizedDocument<Self::Image>, RasterizeError>;
}

/// Rasterizer that reports a fixed set of page geometries without producing images.
///
/// Useful for headless hosts that already know the page layout.
#[derive(Debug, Clone, Default)]
pub struct StaticRasterizer {
    geometries: Vec<PageGeometry>,
}

impl StaticRasterizer {
    pub fn new(geometries: Vec<PageGeometry>) -> Self {
        Self { geometries }
    }
}

impl PageRasterizer for StaticRasterizer {
    type Image = ();

    fn rasterize(&mut self, _document: &[u8]) -> Result<RasterizedDocument<()>, RasterizeError> {
        if self.geometries.is_empty() {
            return Err(RasterizeError::Decode("document has no pages".to_string()));
        }
        RasterizedDocument::new(vec![(); self.geometries.len()], self.geometries.clone())
    }
}
