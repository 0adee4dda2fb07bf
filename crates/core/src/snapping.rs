//! Snapping system for dragging annotations
//!
//! Provides alignment guides that pull a dragged text box onto the page edges
//! and centre lines, and onto the edges and centres of the other boxes on the
//! same page.
//!
//! Matching is first-hit, not closest-hit: candidate offsets are tried in the
//! order left/centre/right (top/centre/bottom), and for each offset the snap
//! points are tried in the order they were collected. The first pair within
//! threshold wins the axis.

use crate::annotation::{Annotation, AnnotationId};
use crate::config::EditorConfig;
use crate::page::PageGeometry;
use serde::{Deserialize, Serialize};

/// Direction of an alignment guide line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOrientation {
    /// A vertical line at some x
    Vertical,
    /// A horizontal line at some y
    Horizontal,
}

/// Transient alignment line shown while dragging
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapGuide {
    pub orientation: GuideOrientation,

    /// Position of the line in document units
    pub position: f32,
}

impl SnapGuide {
    pub fn vertical(position: f32) -> Self {
        Self { orientation: GuideOrientation::Vertical, position }
    }

    pub fn horizontal(position: f32) -> Self {
        Self { orientation: GuideOrientation::Horizontal, position }
    }
}

/// Candidate snap lines for one drag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapPoints {
    /// x positions of vertical lines
    pub vertical: Vec<f32>,
    /// y positions of horizontal lines
    pub horizontal: Vec<f32>,
}

/// Snapped position plus the guides that caused it
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub x: f32,
    pub y: f32,
    pub guides: Vec<SnapGuide>,
}

/// Snapping engine for calculating snapped box positions
#[derive(Debug, Clone)]
pub struct SnapEngine {
    enabled: bool,

    /// Snap threshold in document units
    threshold: f32,
}

impl SnapEngine {
    /// Create a snap engine with the given threshold
    pub fn new(threshold: f32) -> Self {
        Self { enabled: true, threshold }
    }

    /// Create a snap engine from editor configuration
    pub fn with_config(config: &EditorConfig) -> Self {
        Self::new(config.snap_threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable/disable snapping
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Collect snap lines from the page and the sibling boxes on `page`
    ///
    /// Page lines come first (edge, centre, far edge), then each sibling's
    /// near edge, centre and far edge in store order. The annotation being
    /// moved is skipped.
    pub fn compute_snap_points(
        &self,
        annotations: &[Annotation],
        page: u32,
        exclude: Option<AnnotationId>,
        geometry: &PageGeometry,
    ) -> SnapPoints {
        let width = geometry.effective_width;
        let height = geometry.effective_height;

        let mut points = SnapPoints {
            vertical: vec![0.0, width / 2.0, width],
            horizontal: vec![0.0, height / 2.0, height],
        };

        let siblings = annotations
            .iter()
            .filter(|annotation| annotation.page() == page)
            .filter(|annotation| Some(annotation.id()) != exclude);

        for sibling in siblings {
            let rect = sibling.rect();
            points.vertical.extend([rect.x, rect.center_x(), rect.right()]);
            points.horizontal.extend([rect.y, rect.center_y(), rect.bottom()]);
        }

        points
    }

    /// Snap a box at `(x, y)` of the given size against the collected points
    ///
    /// Each axis snaps at most once and emits at most one guide.
    pub fn apply_snapping(
        &self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        points: &SnapPoints,
    ) -> SnapResult {
        let mut result = SnapResult { x, y, guides: Vec::new() };

        if !self.enabled {
            return result;
        }

        if let Some((snapped, line)) = self.first_match(x, width, &points.vertical) {
            result.x = snapped;
            result.guides.push(SnapGuide::vertical(line));
        }

        if let Some((snapped, line)) = self.first_match(y, height, &points.horizontal) {
            result.y = snapped;
            result.guides.push(SnapGuide::horizontal(line));
        }

        result
    }

    /// Convenience: collect points and snap in one call
    #[allow(clippy::too_many_arguments)]
    pub fn snap_box(
        &self,
        annotations: &[Annotation],
        page: u32,
        exclude: Option<AnnotationId>,
        geometry: &PageGeometry,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> SnapResult {
        let points = self.compute_snap_points(annotations, page, exclude, geometry);
        self.apply_snapping(x, y, width, height, &points)
    }

    /// First (offset, line) pair within threshold, as (snapped start, line position)
    fn first_match(&self, start: f32, size: f32, lines: &[f32]) -> Option<(f32, f32)> {
        for offset in [0.0, size / 2.0, size] {
            for &line in lines {
                if (start + offset - line).abs() < self.threshold {
                    return Some((line - offset, line));
                }
            }
        }
        None
    }
}

impl Default for SnapEngine {
    fn default() -> Self {
        Self::with_config(&EditorConfig::default())
    }
}
