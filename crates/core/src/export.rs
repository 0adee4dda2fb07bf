//! Baking annotations into the document
//!
//! Annotations live in display space: top-left origin on the page as the user
//! sees it, after rotation. The document mutator expects the page's own
//! unrotated space with a bottom-left origin and a text baseline rather than a
//! box top, so every annotation goes through [`to_document_space`] on save.
//!
//! Saving threads one document value through the mutator, one call per line of
//! text. The caller's document is never touched: the pipeline works on a clone
//! and only hands it back once every call has succeeded.

use crate::annotation::{Annotation, AnnotationId, Color};
use crate::config::EditorConfig;
use crate::page::{PageGeometry, Rotation};
use serde::{Deserialize, Serialize};

/// Default fraction of the font size between the top of a text box and its baseline
pub const BASELINE_RATIO: f32 = 0.8;

/// Approximate ascender height for a font size
pub fn baseline_offset(font_size: f32, baseline_ratio: f32) -> f32 {
    font_size * baseline_ratio
}

/// Map an annotation's top-left corner to the mutator's coordinate space
///
/// The result is the text baseline origin in unrotated document units with a
/// bottom-left origin. Saving places the first line of every annotation at
/// exactly this point.
pub fn to_document_space(
    annotation: &Annotation,
    geometry: &PageGeometry,
    config: &EditorConfig,
) -> (f32, f32) {
    line_origin(annotation, 0, geometry, config)
}

/// Baseline origin of the `line_index`-th line of an annotation's text
fn line_origin(
    annotation: &Annotation,
    line_index: usize,
    geometry: &PageGeometry,
    config: &EditorConfig,
) -> (f32, f32) {
    let font_size = annotation.font_size();
    let line_top = annotation.y() + line_index as f32 * font_size * config.line_height_ratio;
    let baseline = baseline_offset(font_size, config.baseline_ratio);

    transform_point(annotation.x(), line_top, baseline, geometry)
}

fn transform_point(ax: f32, ay: f32, baseline: f32, geometry: &PageGeometry) -> (f32, f32) {
    let page_width = geometry.width;
    let page_height = geometry.height;
    let offset_x = geometry.offset_x;
    let offset_y = geometry.offset_y;

    match geometry.rotation {
        Rotation::Deg0 => (ax + offset_x, page_height - ay - baseline + offset_y),
        Rotation::Deg90 => (ay + offset_x, ax + baseline + offset_y),
        Rotation::Deg180 => (page_width - ax - offset_x, ay + baseline + offset_y),
        Rotation::Deg270 => (
            page_height - ay + offset_x,
            page_width - ax - baseline + offset_y,
        ),
    }
}

/// Placement of one text run, as passed to the mutator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawTextOptions {
    /// Page number (1-based)
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub color: Color,

    /// Page rotation, so the run can be drawn upright for the viewer
    pub rotation: Rotation,
}

/// One planned mutator invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCall {
    pub annotation: AnnotationId,
    pub text: String,
    #[serde(flatten)]
    pub options: DrawTextOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum MutatorError {
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("backend error: {0}")]
    Backend(String),
}

/// Writes a single text run onto a page
///
/// Implemented outside this crate. Each call consumes the document produced by
/// the previous one.
pub trait DocumentMutator {
    type Document;

    fn draw_text(
        &mut self,
        document: Self::Document,
        text: &str,
        options: &DrawTextOptions,
    ) -> Result<Self::Document, MutatorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("add some text before saving")]
    NothingToSave,
    #[error("no page geometry for page {page}")]
    MissingGeometry { page: u32 },
    #[error("failed to write annotation {annotation}: {source}")]
    Mutator {
        annotation: AnnotationId,
        #[source]
        source: MutatorError,
    },
}

/// Plan the ordered mutator calls for a save, without touching any document
///
/// Blank annotations are skipped. Multi-line text becomes one call per
/// non-empty line, each line stepped down the displayed page by the line
/// height before being transformed.
///
/// # Errors
/// [`SaveError::NothingToSave`] when no annotation has text, and
/// [`SaveError::MissingGeometry`] when an annotation sits on an unknown page.
pub fn plan_draw_calls(
    annotations: &[Annotation],
    geometries: &[PageGeometry],
    config: &EditorConfig,
) -> Result<Vec<DrawCall>, SaveError> {
    let filled: Vec<&Annotation> = annotations.iter().filter(|a| !a.is_blank()).collect();
    if filled.is_empty() {
        return Err(SaveError::NothingToSave);
    }

    let mut calls = Vec::new();
    for annotation in filled {
        let geometry = page_geometry(geometries, annotation.page())
            .ok_or(SaveError::MissingGeometry {
                page: annotation.page(),
            })?;

        for (line_index, line) in annotation.text().lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let (x, y) = line_origin(annotation, line_index, geometry, config);

            calls.push(DrawCall {
                annotation: annotation.id(),
                text: line.to_string(),
                options: DrawTextOptions {
                    page: annotation.page(),
                    x,
                    y,
                    font_size: annotation.font_size(),
                    color: annotation.color(),
                    rotation: geometry.rotation,
                },
            });
        }
    }

    Ok(calls)
}

/// Write every non-blank annotation into a copy of `document`
///
/// Calls run strictly in order, each consuming the previous output. On any
/// failure the partially written copy is dropped and the error names the
/// annotation that failed.
pub fn bake_annotations<M>(
    document: &M::Document,
    annotations: &[Annotation],
    geometries: &[PageGeometry],
    config: &EditorConfig,
    mutator: &mut M,
) -> Result<M::Document, SaveError>
where
    M: DocumentMutator,
    M::Document: Clone,
{
    let calls = plan_draw_calls(annotations, geometries, config)?;

    let mut working = document.clone();
    for call in &calls {
        working = mutator
            .draw_text(working, &call.text, &call.options)
            .map_err(|source| SaveError::Mutator {
                annotation: call.annotation,
                source,
            })?;
    }

    log::info!("baked {} text runs into document", calls.len());
    Ok(working)
}

fn page_geometry(geometries: &[PageGeometry], page: u32) -> Option<&PageGeometry> {
    let index = usize::try_from(page).ok()?.checked_sub(1)?;
    geometries.get(index)
}

/// Mutator that records each call into a list instead of changing a document
///
/// The "document" is the list of calls made so far.
#[derive(Debug, Default, Clone)]
pub struct RecordingMutator {
    pub page_count: Option<u32>,
}

impl DocumentMutator for RecordingMutator {
    type Document = Vec<(String, DrawTextOptions)>;

    fn draw_text(
        &mut self,
        mut document: Self::Document,
        text: &str,
        options: &DrawTextOptions,
    ) -> Result<Self::Document, MutatorError> {
        if let Some(page_count) = self.page_count {
            if options.page == 0 || options.page > page_count {
                return Err(MutatorError::PageOutOfRange {
                    page: options.page,
                    page_count,
                });
            }
        }
        document.push((text.to_string(), *options));
        Ok(document)
    }
}
