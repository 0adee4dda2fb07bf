//! PDF Overlay Core Library
//!
//! Placement and editing engine for floating text annotations drawn over a
//! rendered document page, and the transform that bakes them into the
//! document on save.

pub mod annotation;
pub mod config;
pub mod controller;
pub mod export;
pub mod history;
pub mod manipulation;
pub mod page;
pub mod session;
pub mod snapping;
pub mod units;

pub use annotation::{
    Annotation, AnnotationId, AnnotationStore, Color, StyleDefaults, StylePatch,
};
pub use config::{ConfigError, EditorConfig};
pub use controller::{
    resolve_shortcut, EditorCommand, InteractionController, Key, KeyInput, Modifiers,
    PointerState, SelectionState, Tool,
};
pub use export::{
    bake_annotations, baseline_offset, plan_draw_calls, to_document_space, DocumentMutator,
    DrawCall, DrawTextOptions, MutatorError, RecordingMutator, SaveError,
};
pub use history::{AnnotationHistory, History};
pub use manipulation::{
    clamp_to_page, generate_handles, resize_box, Corner, Rect, ResizeHandle, SizeLimits,
};
pub use page::{
    PageGeometry, PageRasterizer, RasterizeError, RasterizedDocument, Rotation, StaticRasterizer,
};
pub use session::{
    capture, restore, JsonFileSessionStore, MemorySessionStore, RestoreOutcome, RestoredSession,
    SessionError, SessionSnapshot, SessionStore,
};
pub use snapping::{GuideOrientation, SnapEngine, SnapGuide, SnapPoints, SnapResult};
pub use units::{
    delta_to_document_units, to_display_percent, to_display_pixels, to_document_units,
    ContentBox, DisplayRect, DisplaySurface, Unmounted,
};
