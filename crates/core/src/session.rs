//! Session snapshots and restore
//!
//! A session is everything needed to pick up where the user left off: the
//! document bytes, the annotation set, the displayed page, the last-used style
//! and the zoom. The persisted JSON shape is [`SessionSnapshot`]; document
//! bytes travel base64-encoded so the snapshot stays text-safe.
//!
//! Restore never fails hard. A session that cannot be read, decoded or
//! rasterized is logged, cleared from the store, and reported as discarded.

use crate::annotation::{Annotation, AnnotationId, Color, StylePatch};
use crate::config::EditorConfig;
use crate::controller::InteractionController;
use crate::page::{PageRasterizer, RasterizeError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("document bytes are not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("unsupported session version {0}")]
    UnsupportedVersion(u32),
    #[error("session refers to page {page} but the document has {page_count} pages")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("annotation {id} is malformed: {reason}")]
    InvalidAnnotation { id: AnnotationId, reason: &'static str },
    #[error("document could not be rasterized: {0}")]
    Rasterize(#[from] RasterizeError),
}

/// Persisted editor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Document bytes, base64 (standard alphabet, padded)
    pub document_bytes: String,
    pub annotations: Vec<Annotation>,
    pub current_page: u32,
    pub font_size: f32,
    pub color: Color,
    pub zoom: f32,
}

impl SessionSnapshot {
    pub fn encode_document(document: &[u8]) -> String {
        STANDARD.encode(document)
    }

    pub fn decode_document(&self) -> Result<Vec<u8>, SessionError> {
        Ok(STANDARD.decode(self.document_bytes.trim())?)
    }
}

/// Snapshot the controller's state together with the document it edits
pub fn capture(controller: &InteractionController, document: &[u8]) -> SessionSnapshot {
    let defaults = controller.store().defaults();

    SessionSnapshot {
        document_bytes: SessionSnapshot::encode_document(document),
        annotations: controller.store().snapshot(),
        current_page: controller.current_page(),
        font_size: defaults.font_size,
        color: defaults.color,
        zoom: controller.zoom(),
    }
}

/// Somewhere a single session can be kept between runs
pub trait SessionStore {
    /// Load the saved session, `None` if there is none
    fn load(&self) -> Result<Option<SessionSnapshot>, SessionError>;

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), SessionError>;

    fn clear(&mut self) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionEnvelope {
    version: u32,
    session: SessionSnapshot,
}

/// Session kept as a versioned JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileSessionStore {
    fn load(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&self.path)?;
        let envelope: SessionEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.version != SESSION_SCHEMA_VERSION {
            return Err(SessionError::UnsupportedVersion(envelope.version));
        }

        Ok(Some(envelope.session))
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let envelope = SessionEnvelope {
            version: SESSION_SCHEMA_VERSION,
            session: snapshot.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Session kept in memory, for hosts without persistence and for tests
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    snapshot: Option<SessionSnapshot>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self { snapshot: Some(snapshot) }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.snapshot = None;
        Ok(())
    }
}

/// A session brought back to life
#[derive(Debug)]
pub struct RestoredSession<I> {
    pub controller: InteractionController,
    pub document: Vec<u8>,
    pub images: Vec<I>,
}

#[derive(Debug)]
pub enum RestoreOutcome<I> {
    /// Nothing was saved
    Empty,
    Restored(RestoredSession<I>),
    /// The saved session was unusable and has been cleared
    Discarded(SessionError),
}

/// Restore the saved session, re-rasterizing its document
///
/// The controller starts with a single-entry history holding the restored
/// annotations.
pub fn restore<S, R>(
    store: &mut S,
    rasterizer: &mut R,
    config: &EditorConfig,
) -> RestoreOutcome<R::Image>
where
    S: SessionStore + ?Sized,
    R: PageRasterizer + ?Sized,
{
    match try_restore(&*store, rasterizer, config) {
        Ok(None) => RestoreOutcome::Empty,
        Ok(Some(session)) => {
            log::info!(
                "restored session with {} annotations on {} pages",
                session.controller.store().len(),
                session.controller.page_count()
            );
            RestoreOutcome::Restored(session)
        }
        Err(err) => {
            log::warn!("discarding saved session: {err}");
            if let Err(clear_err) = store.clear() {
                log::warn!("failed to clear discarded session: {clear_err}");
            }
            RestoreOutcome::Discarded(err)
        }
    }
}

fn try_restore<S, R>(
    store: &S,
    rasterizer: &mut R,
    config: &EditorConfig,
) -> Result<Option<RestoredSession<R::Image>>, SessionError>
where
    S: SessionStore + ?Sized,
    R: PageRasterizer + ?Sized,
{
    let Some(snapshot) = store.load()? else {
        return Ok(None);
    };

    for annotation in &snapshot.annotations {
        check_annotation(annotation, config)?;
    }

    let document = snapshot.decode_document()?;
    let rasterized = rasterizer.rasterize(&document)?;
    let page_count = u32::try_from(rasterized.page_count()).unwrap_or(u32::MAX);

    let out_of_range = std::iter::once(snapshot.current_page)
        .chain(snapshot.annotations.iter().map(Annotation::page))
        .find(|&page| page == 0 || page > page_count);
    if let Some(page) = out_of_range {
        return Err(SessionError::PageOutOfRange { page, page_count });
    }

    let mut controller = InteractionController::new(config.clone(), rasterized.page_geometries);
    controller.load_annotations(snapshot.annotations);
    controller.set_current_page(snapshot.current_page);
    controller.set_zoom(snapshot.zoom);
    controller.set_style_defaults(StylePatch {
        font_size: (snapshot.font_size > 0.0).then_some(snapshot.font_size),
        color: Some(snapshot.color),
    });

    Ok(Some(RestoredSession {
        controller,
        document,
        images: rasterized.images,
    }))
}

/// Reject annotations the editor could never have produced
fn check_annotation(annotation: &Annotation, config: &EditorConfig) -> Result<(), SessionError> {
    let rect = annotation.rect();
    let reason = if ![rect.x, rect.y, rect.width, rect.height, annotation.font_size()]
        .iter()
        .all(|value| value.is_finite())
    {
        Some("non-finite geometry")
    } else if rect.x < 0.0 || rect.y < 0.0 {
        Some("negative position")
    } else if rect.width < config.min_width {
        Some("narrower than the minimum width")
    } else if rect.height < config.min_height {
        Some("shorter than the minimum height")
    } else if annotation.font_size() <= 0.0 {
        Some("non-positive font size")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SessionError::InvalidAnnotation {
            id: annotation.id(),
            reason,
        }),
        None => Ok(()),
    }
}
