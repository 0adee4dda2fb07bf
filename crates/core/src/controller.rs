//! Pointer and keyboard state machine for placing and editing annotations
//!
//! The controller owns the annotation store, the undo history and the snap
//! engine, and translates raw pointer pixels and key presses into store
//! mutations. It tracks three independent pieces of state:
//! - the active tool (select or place-text)
//! - what the pointer is doing (idle, dragging a box, resizing a box)
//! - the selection (nothing, a selected box, a box whose text is being edited)
//!
//! History is recorded at action boundaries only: create, delete, paste, style
//! change, and deselect. Typing, dragging and resizing do not push on their
//! own; their result is captured by the next boundary.

use crate::annotation::{Annotation, AnnotationId, AnnotationStore, Color, StylePatch};
use crate::config::EditorConfig;
use crate::export::{bake_annotations, DocumentMutator, SaveError};
use crate::history::AnnotationHistory;
use crate::manipulation::{clamp_to_page, generate_handles, Corner, Rect, ResizeHandle};
use crate::page::PageGeometry;
use crate::snapping::{SnapEngine, SnapGuide};
use crate::units::{delta_to_document_units, to_document_units, DisplaySurface};

/// Active editing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Click selects, drags and resizes existing boxes
    #[default]
    Select,
    /// Next click on empty canvas creates a text box
    PlaceText,
}

/// What the pointer is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PointerState {
    #[default]
    Idle,
    Dragging {
        id: AnnotationId,
        /// Pointer position relative to the box's top-left at pointer-down
        grab_x: f32,
        grab_y: f32,
    },
    Resizing {
        id: AnnotationId,
        corner: Corner,
        /// Box at pointer-down; every move resizes from here
        origin: Rect,
        /// Pointer position at pointer-down, in display pixels
        start_x: f32,
        start_y: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub selected: Option<AnnotationId>,
    /// The selected box's text field is active
    pub editing: bool,
}

/// Keys the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Character(char),
    Delete,
    Backspace,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    /// Cmd on macOS
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Ctrl or Cmd, whichever the platform uses for shortcuts
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    /// Same key with Ctrl held
    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    /// Same key with Cmd held
    pub fn with_meta(mut self) -> Self {
        self.modifiers.meta = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// Editor actions reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    Undo,
    Redo,
    Copy,
    Paste,
    Delete,
    Escape,
}

/// Map a key press to an editor command
pub fn resolve_shortcut(input: &KeyInput) -> Option<EditorCommand> {
    let modifiers = input.modifiers;

    match input.key {
        Key::Escape => Some(EditorCommand::Escape),
        Key::Delete | Key::Backspace if !modifiers.command() => Some(EditorCommand::Delete),
        Key::Character(c) if modifiers.command() => match c.to_ascii_lowercase() {
            'z' if modifiers.shift => Some(EditorCommand::Redo),
            'z' => Some(EditorCommand::Undo),
            'y' => Some(EditorCommand::Redo),
            'c' => Some(EditorCommand::Copy),
            'v' => Some(EditorCommand::Paste),
            _ => None,
        },
        _ => None,
    }
}

/// Interaction state machine over the annotation store
#[derive(Debug, Clone)]
pub struct InteractionController {
    config: EditorConfig,
    store: AnnotationStore,
    history: AnnotationHistory,
    snap: SnapEngine,

    /// One entry per page, index-aligned with page order
    geometries: Vec<PageGeometry>,

    /// Displayed page (1-based)
    current_page: u32,
    zoom: f32,

    tool: Tool,
    pointer: PointerState,
    selection: SelectionState,
    clipboard: Option<Annotation>,

    /// Alignment guides for the drag in progress
    guides: Vec<SnapGuide>,
    focus_requested: bool,
}

impl InteractionController {
    /// Create a controller over an empty annotation set
    pub fn new(config: EditorConfig, geometries: Vec<PageGeometry>) -> Self {
        let store = AnnotationStore::new(&config);
        let history = AnnotationHistory::new(Vec::new(), config.history_capacity);
        let snap = SnapEngine::with_config(&config);

        Self {
            config,
            store,
            history,
            snap,
            geometries,
            current_page: 1,
            zoom: 1.0,
            tool: Tool::default(),
            pointer: PointerState::default(),
            selection: SelectionState::default(),
            clipboard: None,
            guides: Vec::new(),
            focus_requested: false,
        }
    }

    /// Replace the annotation set and start a fresh history from it
    pub fn load_annotations(&mut self, annotations: Vec<Annotation>) {
        self.end_interaction();
        self.selection = SelectionState::default();
        self.store.replace_all(annotations);
        self.history.reset(self.store.snapshot());
    }

    // Pointer input

    /// Handle a primary-button press at `(pointer_x, pointer_y)` display pixels
    pub fn pointer_down<S>(&mut self, surface: &S, pointer_x: f32, pointer_y: f32)
    where
        S: DisplaySurface + ?Sized,
    {
        let Some(geometry) = self.current_geometry() else {
            return;
        };
        let (x, y) = to_document_units(pointer_x, pointer_y, surface, &geometry, self.zoom);
        self.guides.clear();

        let resize = self.hit_selected_handle(x, y).and_then(|handle| {
            self.selected_annotation().map(|annotation| PointerState::Resizing {
                id: annotation.id(),
                corner: handle.corner,
                origin: annotation.rect(),
                start_x: pointer_x,
                start_y: pointer_y,
            })
        });
        if let Some(resize) = resize {
            self.pointer = resize;
            return;
        }

        let hit = self.store.hit_test(self.current_page, x, y).map(|a| (a.id(), a.x(), a.y()));
        match hit {
            Some((id, left, top)) if self.selection.selected == Some(id) => {
                self.pointer = PointerState::Dragging {
                    id,
                    grab_x: x - left,
                    grab_y: y - top,
                };
            }
            Some((id, _, _)) => {
                self.select(id);
            }
            None => match self.tool {
                Tool::PlaceText => self.place_text(x, y, &geometry),
                Tool::Select => self.deselect(),
            },
        }
    }

    /// Handle a double click: select the box under the pointer and edit its text
    pub fn double_click<S>(&mut self, surface: &S, pointer_x: f32, pointer_y: f32)
    where
        S: DisplaySurface + ?Sized,
    {
        let Some(geometry) = self.current_geometry() else {
            return;
        };
        let (x, y) = to_document_units(pointer_x, pointer_y, surface, &geometry, self.zoom);

        if let Some(id) = self.store.hit_test(self.current_page, x, y).map(Annotation::id) {
            self.select(id);
            self.begin_editing();
        }
    }

    /// Handle pointer motion; only has an effect while dragging or resizing
    pub fn pointer_move<S>(&mut self, surface: &S, pointer_x: f32, pointer_y: f32)
    where
        S: DisplaySurface + ?Sized,
    {
        let Some(geometry) = self.current_geometry() else {
            return;
        };

        match self.pointer {
            PointerState::Idle => {}
            PointerState::Dragging { id, grab_x, grab_y } => {
                let Some(rect) = self.store.get(id).map(Annotation::rect) else {
                    self.end_interaction();
                    return;
                };

                let (x, y) = to_document_units(pointer_x, pointer_y, surface, &geometry, self.zoom);
                let (x, y) =
                    clamp_to_page(x - grab_x, y - grab_y, rect.width, rect.height, &geometry);

                let snapped = self.snap.snap_box(
                    self.store.all(),
                    self.current_page,
                    Some(id),
                    &geometry,
                    x,
                    y,
                    rect.width,
                    rect.height,
                );
                let (x, y) =
                    clamp_to_page(snapped.x, snapped.y, rect.width, rect.height, &geometry);

                self.store.move_to(id, x, y);
                self.guides = snapped.guides;
            }
            PointerState::Resizing { id, corner, origin, start_x, start_y } => {
                let (dx, dy) = delta_to_document_units(
                    pointer_x - start_x,
                    pointer_y - start_y,
                    surface,
                    &geometry,
                    self.zoom,
                );
                if !self.store.resize(id, corner, &origin, dx, dy, &geometry) {
                    self.end_interaction();
                }
            }
        }
    }

    /// Handle button release, wherever it happens
    pub fn pointer_up(&mut self) {
        self.end_interaction();
    }

    // Commands

    /// Replace the selected annotation's text
    ///
    /// Not recorded in history until the next action boundary.
    pub fn edit_text(&mut self, text: impl Into<String>) -> bool {
        match self.selection.selected {
            Some(id) => self.store.update_text(id, text),
            None => false,
        }
    }

    pub fn set_font_size(&mut self, font_size: f32) {
        self.apply_style(StylePatch::font_size(font_size));
    }

    pub fn set_color(&mut self, color: Color) {
        self.apply_style(StylePatch::color(color));
    }

    /// Change the selected annotation's style, or only the defaults if nothing is selected
    pub fn apply_style(&mut self, patch: StylePatch) {
        if patch.is_empty() {
            return;
        }

        match self.selection.selected {
            Some(id) => {
                self.store.update_style(id, patch);
                self.commit();
            }
            None => self.store.update_defaults(patch),
        }
    }

    /// Remove the selected annotation
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selection.selected else {
            return false;
        };

        self.end_interaction();
        self.selection = SelectionState::default();
        if self.store.remove(id).is_none() {
            return false;
        }
        self.commit();
        true
    }

    /// Put a copy of the selected annotation on the clipboard
    pub fn copy(&mut self) -> bool {
        let copied = self.selected_annotation().cloned();
        if copied.is_none() {
            return false;
        }
        self.clipboard = copied;
        true
    }

    /// Paste the clipboard onto the current page, offset from the original
    pub fn paste(&mut self) -> bool {
        let Some(geometry) = self.current_geometry() else {
            return false;
        };
        let Some(source) = self.clipboard.as_ref() else {
            return false;
        };

        let offset = self.config.paste_offset;
        let x = (source.x() + offset).min(geometry.effective_width - source.width()).max(0.0);
        let y = (source.y() + offset).min(geometry.effective_height - source.height()).max(0.0);
        let pasted = source.duplicate_at(self.current_page, x, y);
        let id = pasted.id();

        log::debug!("pasted annotation {id} on page {} at ({x}, {y})", self.current_page);
        self.end_interaction();
        self.store.insert(pasted);
        self.selection = SelectionState {
            selected: Some(id),
            editing: false,
        };
        self.commit();
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                log::debug!("undo to history entry {}", self.history.index());
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                log::debug!("redo to history entry {}", self.history.index());
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Clear the selection, recording the result of any edits made while it was held
    pub fn deselect(&mut self) {
        self.end_interaction();
        if self.selection.selected.take().is_some() {
            self.selection.editing = false;
            self.commit();
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Handle a key press
    ///
    /// Shortcuts are global; only Delete/Backspace is left to the text field
    /// while it has focus. Returns whether the key was consumed.
    pub fn key_down(&mut self, input: KeyInput, text_focused: bool) -> bool {
        let Some(command) = resolve_shortcut(&input) else {
            return false;
        };
        if text_focused && command == EditorCommand::Delete {
            return false;
        }
        self.execute(command)
    }

    /// Run an editor command; returns whether it had an effect
    pub fn execute(&mut self, command: EditorCommand) -> bool {
        match command {
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
            EditorCommand::Copy => self.copy(),
            EditorCommand::Paste => self.paste(),
            EditorCommand::Delete => self.delete_selected(),
            EditorCommand::Escape => {
                if self.tool != Tool::Select {
                    self.tool = Tool::Select;
                    true
                } else if self.selection.selected.is_some() {
                    self.deselect();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Bake every non-blank annotation into a copy of `document`
    pub fn save<M>(&self, document: &M::Document, mutator: &mut M) -> Result<M::Document, SaveError>
    where
        M: DocumentMutator,
        M::Document: Clone,
    {
        bake_annotations(document, self.store.all(), &self.geometries, &self.config, mutator)
    }

    // Pages and zoom

    pub fn page_count(&self) -> u32 {
        u32::try_from(self.geometries.len()).unwrap_or(u32::MAX)
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Switch the displayed page; ends any interaction and deselects
    pub fn set_current_page(&mut self, page: u32) -> bool {
        if page == 0 || page > self.page_count() {
            return false;
        }
        if page != self.current_page {
            self.deselect();
            self.current_page = page;
        }
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_current_page(self.current_page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> bool {
        self.set_current_page(self.current_page.saturating_sub(1))
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.config.zoom_step);
    }

    pub fn geometries(&self) -> &[PageGeometry] {
        &self.geometries
    }

    /// Swap in new page geometry after the document was reloaded
    pub fn replace_geometries(&mut self, geometries: Vec<PageGeometry>) {
        self.end_interaction();
        self.geometries = geometries;
        let page_count = self.page_count();

        if self.selected_annotation().is_some_and(|a| a.page() > page_count) {
            self.deselect();
        }
        self.current_page = self.current_page.clamp(1, page_count.max(1));
        log::debug!("page geometry replaced, {page_count} pages");
    }

    /// Geometry of the displayed page
    pub fn current_geometry(&self) -> Option<PageGeometry> {
        let index = usize::try_from(self.current_page).ok()?.checked_sub(1)?;
        self.geometries.get(index).copied()
    }

    // Accessors

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Annotations on the displayed page, in z-order
    pub fn current_page_annotations(&self) -> Vec<&Annotation> {
        self.store.by_page(self.current_page)
    }

    /// Set the style used for the next created annotation
    pub fn set_style_defaults(&mut self, patch: StylePatch) {
        self.store.update_defaults(patch);
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn pointer_state(&self) -> PointerState {
        self.pointer
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selection.selected
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selection.selected.and_then(|id| self.store.get(id))
    }

    pub fn editing(&self) -> bool {
        self.selection.editing
    }

    pub fn clipboard(&self) -> Option<&Annotation> {
        self.clipboard.as_ref()
    }

    pub fn guides(&self) -> &[SnapGuide] {
        &self.guides
    }

    /// Corner handles of the selected annotation, if it is on the displayed page
    pub fn handles(&self) -> Option<[ResizeHandle; 4]> {
        self.selected_annotation()
            .filter(|a| a.page() == self.current_page)
            .map(|a| generate_handles(&a.rect(), self.config.handle_radius))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &AnnotationHistory {
        &self.history
    }

    /// Consume the pending request to focus the text field
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    pub fn snap_engine_mut(&mut self) -> &mut SnapEngine {
        &mut self.snap
    }

    // Internals

    fn place_text(&mut self, x: f32, y: f32, geometry: &PageGeometry) {
        let created = self.store.create_with_defaults(x, y, self.current_page, geometry);
        self.selection = SelectionState {
            selected: Some(created.id()),
            editing: false,
        };
        self.begin_editing();
        self.tool = Tool::Select;
        self.commit();
    }

    /// Select `id`, treating a switch away from another box as a deselect
    fn select(&mut self, id: AnnotationId) {
        if self.selection.selected == Some(id) {
            return;
        }
        if self.selection.selected.is_some() {
            self.deselect();
        }
        self.selection = SelectionState {
            selected: Some(id),
            editing: false,
        };
    }

    fn begin_editing(&mut self) {
        self.selection.editing = true;
        self.focus_requested = true;
    }

    fn hit_selected_handle(&self, x: f32, y: f32) -> Option<ResizeHandle> {
        self.handles()?.into_iter().find(|handle| handle.hit_test(x, y))
    }

    fn end_interaction(&mut self) {
        self.pointer = PointerState::Idle;
        self.guides.clear();
    }

    /// Record the store in history unless it already matches the current entry
    fn commit(&mut self) {
        if self.history.current().map(Vec::as_slice) != Some(self.store.all()) {
            self.history.push(self.store.snapshot());
        }
    }

    fn apply_snapshot(&mut self, snapshot: Vec<Annotation>) {
        self.history.set_restoring(true);
        self.end_interaction();
        self.store.replace_all(snapshot);
        self.selection.editing = false;
        if let Some(id) = self.selection.selected {
            if !self.store.contains(id) {
                self.selection.selected = None;
            }
        }
        self.history.set_restoring(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Rotation;
    use crate::snapping::GuideOrientation;
    use crate::units::{DisplayRect, Unmounted};

    fn a4() -> PageGeometry {
        PageGeometry::new(595.0, 842.0, Rotation::Deg0)
    }

    /// Surface drawn at 1:1, so pixels equal document units
    fn surface() -> DisplayRect {
        DisplayRect::new(0.0, 0.0, 595.0, 842.0)
    }

    fn controller() -> InteractionController {
        InteractionController::new(EditorConfig::default(), vec![a4(), a4()])
    }

    fn place(controller: &mut InteractionController, x: f32, y: f32) -> AnnotationId {
        controller.set_tool(Tool::PlaceText);
        controller.pointer_down(&surface(), x, y);
        controller.pointer_up();
        controller.selected().unwrap()
    }

    #[test]
    fn test_resolve_shortcuts() {
        let z = KeyInput::new(Key::Character('z'));

        assert_eq!(resolve_shortcut(&z.with_ctrl()), Some(EditorCommand::Undo));
        assert_eq!(resolve_shortcut(&z.with_meta()), Some(EditorCommand::Undo));
        assert_eq!(resolve_shortcut(&z.with_ctrl().with_shift()), Some(EditorCommand::Redo));
        assert_eq!(
            resolve_shortcut(&KeyInput::new(Key::Character('Z')).with_meta().with_shift()),
            Some(EditorCommand::Redo)
        );
        assert_eq!(
            resolve_shortcut(&KeyInput::new(Key::Character('y')).with_ctrl()),
            Some(EditorCommand::Redo)
        );
        assert_eq!(
            resolve_shortcut(&KeyInput::new(Key::Character('c')).with_ctrl()),
            Some(EditorCommand::Copy)
        );
        assert_eq!(
            resolve_shortcut(&KeyInput::new(Key::Character('v')).with_meta()),
            Some(EditorCommand::Paste)
        );
        assert_eq!(resolve_shortcut(&KeyInput::new(Key::Backspace)), Some(EditorCommand::Delete));
        assert_eq!(resolve_shortcut(&KeyInput::new(Key::Delete)), Some(EditorCommand::Delete));
        assert_eq!(resolve_shortcut(&KeyInput::new(Key::Escape)), Some(EditorCommand::Escape));
        assert_eq!(resolve_shortcut(&z), None);
        assert_eq!(resolve_shortcut(&KeyInput::new(Key::Character('q')).with_ctrl()), None);
    }

    #[test]
    fn test_place_text_creates_selects_and_edits() {
        let mut controller = controller();
        let id = place(&mut controller, 50.0, 50.0);

        let annotation = controller.store().get(id).unwrap();
        assert_eq!(annotation.rect(), Rect::new(50.0, 50.0, 120.0, 32.0));
        assert_eq!(annotation.page(), 1);
        assert!(controller.editing());
        assert_eq!(controller.tool(), Tool::Select);
        assert!(controller.take_focus_request());
        assert!(!controller.take_focus_request());
        assert!(controller.can_undo());
    }

    #[test]
    fn test_click_empty_canvas_deselects_and_records_edits() {
        let mut controller = controller();
        place(&mut controller, 50.0, 50.0);
        controller.edit_text("Hi");
        assert_eq!(controller.history().len(), 2);

        controller.pointer_down(&surface(), 400.0, 600.0);
        controller.pointer_up();

        assert_eq!(controller.selected(), None);
        assert!(!controller.editing());
        assert_eq!(controller.history().len(), 3);
        assert_eq!(controller.history().current().unwrap()[0].text(), "Hi");

        // A second deselect with nothing selected adds nothing
        controller.pointer_down(&surface(), 400.0, 600.0);
        assert_eq!(controller.history().len(), 3);
    }

    #[test]
    fn test_deselect_without_changes_does_not_push() {
        let mut controller = controller();
        place(&mut controller, 50.0, 50.0);

        controller.deselect();
        assert_eq!(controller.history().len(), 2);
    }

    #[test]
    fn test_click_selects_then_drag_moves_selected() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);
        controller.deselect();

        // First press selects without dragging
        controller.pointer_down(&surface(), 110.0, 110.0);
        assert_eq!(controller.selected(), Some(id));
        assert!(!controller.editing());
        assert_eq!(controller.pointer_state(), PointerState::Idle);

        // Second press on the selected box drags, keeping the grab offset
        controller.pointer_down(&surface(), 110.0, 110.0);
        assert!(matches!(controller.pointer_state(), PointerState::Dragging { .. }));
        controller.pointer_move(&surface(), 160.0, 140.0);
        controller.pointer_up();

        let moved = controller.store().get(id).unwrap();
        assert_eq!((moved.x(), moved.y()), (150.0, 130.0));
        assert!(controller.guides().is_empty());
    }

    #[test]
    fn test_drag_release_does_not_push() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);
        let entries = controller.history().len();

        controller.pointer_down(&surface(), 110.0, 110.0);
        controller.pointer_move(&surface(), 160.0, 150.0);
        controller.pointer_up();
        assert_eq!(controller.history().len(), entries);

        controller.deselect();
        assert_eq!(controller.history().len(), entries + 1);
        let recorded = &controller.history().current().unwrap()[0];
        assert_eq!(recorded.id(), id);
        assert_eq!((recorded.x(), recorded.y()), (150.0, 140.0));
    }

    #[test]
    fn test_drag_clamps_to_page() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);

        controller.pointer_down(&surface(), 110.0, 110.0);
        controller.pointer_move(&surface(), 590.0, 840.0);
        let annotation = controller.store().get(id).unwrap();
        assert_eq!((annotation.x(), annotation.y()), (475.0, 810.0));

        controller.pointer_move(&surface(), -100.0, -100.0);
        let annotation = controller.store().get(id).unwrap();
        assert_eq!((annotation.x(), annotation.y()), (0.0, 0.0));
    }

    #[test]
    fn test_drag_snaps_and_shows_guides() {
        let mut controller = controller();
        place(&mut controller, 100.0, 100.0);
        controller.deselect();
        let b = place(&mut controller, 300.0, 300.0);

        // Grab B inside its body, pull its left edge near A's right edge (220)
        controller.pointer_down(&surface(), 310.0, 310.0);
        controller.pointer_move(&surface(), 233.0, 310.0);

        let moved = controller.store().get(b).unwrap();
        assert_eq!(moved.x(), 220.0);
        assert_eq!(moved.y(), 300.0);
        assert_eq!(controller.guides(), &[SnapGuide::vertical(220.0)]);
        assert_eq!(controller.guides()[0].orientation, GuideOrientation::Vertical);

        controller.pointer_up();
        assert!(controller.guides().is_empty());
    }

    #[test]
    fn test_resize_from_handle() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);
        assert!(controller.handles().is_some());

        // South-east handle sits at (220, 132)
        controller.pointer_down(&surface(), 221.0, 133.0);
        assert!(matches!(
            controller.pointer_state(),
            PointerState::Resizing { corner: Corner::Se, .. }
        ));
        controller.pointer_move(&surface(), 251.0, 143.0);
        controller.pointer_up();

        assert_eq!(
            controller.store().get(id).unwrap().rect(),
            Rect::new(100.0, 100.0, 150.0, 42.0)
        );
        assert!(controller.guides().is_empty());
    }

    #[test]
    fn test_resize_north_west_absorbs_overflow() {
        let mut controller = controller();
        let id = place(&mut controller, 10.0, 4.0);

        controller.pointer_down(&surface(), 10.0, 4.0);
        controller.pointer_move(&surface(), -40.0, -46.0);

        assert_eq!(controller.store().get(id).unwrap().rect(), Rect::new(0.0, 0.0, 130.0, 36.0));
    }

    #[test]
    fn test_resize_scales_pixel_delta_by_zoom() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);
        controller.set_zoom(2.0);
        let zoomed = DisplayRect::new(0.0, 0.0, 1190.0, 1684.0);

        controller.pointer_down(&zoomed, 440.0, 264.0);
        controller.pointer_move(&zoomed, 480.0, 284.0);

        assert_eq!(
            controller.store().get(id).unwrap().rect(),
            Rect::new(100.0, 100.0, 140.0, 42.0)
        );
    }

    #[test]
    fn test_double_click_enters_editing() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);
        controller.deselect();
        controller.take_focus_request();

        controller.double_click(&surface(), 120.0, 110.0);
        assert_eq!(controller.selected(), Some(id));
        assert!(controller.editing());
        assert!(controller.take_focus_request());

        controller.double_click(&surface(), 500.0, 700.0);
        assert_eq!(controller.selected(), Some(id));
    }

    #[test]
    fn test_selection_switch_counts_as_deselect() {
        let mut controller = controller();
        let a = place(&mut controller, 100.0, 100.0);
        controller.deselect();
        let b = place(&mut controller, 300.0, 300.0);
        controller.edit_text("b");
        let entries = controller.history().len();

        controller.pointer_down(&surface(), 110.0, 110.0);
        assert_eq!(controller.selected(), Some(a));
        assert_eq!(controller.history().len(), entries + 1);
        assert_eq!(controller.store().get(b).unwrap().text(), "b");
    }

    #[test]
    fn test_style_change_updates_selected_and_defaults() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);
        let entries = controller.history().len();

        controller.set_color(Color::RED);
        controller.set_font_size(24.0);

        let annotation = controller.store().get(id).unwrap();
        assert_eq!(annotation.color(), Color::RED);
        assert_eq!(annotation.font_size(), 24.0);
        assert_eq!(controller.history().len(), entries + 2);

        controller.deselect();
        let next = place(&mut controller, 300.0, 300.0);
        assert_eq!(controller.store().get(next).unwrap().font_size(), 24.0);
    }

    #[test]
    fn test_style_change_without_selection_only_sets_defaults() {
        let mut controller = controller();
        controller.set_font_size(8.0);

        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.store().defaults().font_size, 8.0);
    }

    #[test]
    fn test_delete_selected() {
        let mut controller = controller();
        place(&mut controller, 100.0, 100.0);
        controller.deselect();
        let second = place(&mut controller, 300.0, 300.0);
        controller.deselect();

        controller.pointer_down(&surface(), 110.0, 110.0);
        assert!(controller.key_down(KeyInput::new(Key::Delete), false));

        assert_eq!(controller.store().len(), 1);
        assert_eq!(controller.store().all()[0].id(), second);
        assert_eq!(controller.selected(), None);
        assert!(!controller.delete_selected());
    }

    #[test]
    fn test_text_focus_keeps_backspace_for_the_text_field() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);

        assert!(!controller.key_down(KeyInput::new(Key::Backspace), true));
        assert!(!controller.key_down(KeyInput::new(Key::Delete), true));
        assert!(controller.store().contains(id));

        assert!(controller.key_down(KeyInput::new(Key::Escape), true));
        assert_eq!(controller.selected(), None);
        assert!(!controller.editing());
    }

    #[test]
    fn test_shortcuts_work_while_text_focused() {
        let mut controller = controller();
        place(&mut controller, 100.0, 100.0);
        assert_eq!(controller.store().len(), 1);

        assert!(controller.key_down(KeyInput::new(Key::Character('z')).with_ctrl(), true));
        assert!(controller.store().is_empty());

        let redo = KeyInput::new(Key::Character('z')).with_meta().with_shift();
        assert!(controller.key_down(redo, true));
        assert_eq!(controller.store().len(), 1);

        let id = controller.store().all()[0].id();
        controller.pointer_down(&surface(), 110.0, 110.0);
        assert_eq!(controller.selected(), Some(id));
        assert!(controller.key_down(KeyInput::new(Key::Character('c')).with_ctrl(), true));
        assert!(controller.key_down(KeyInput::new(Key::Character('v')).with_ctrl(), true));
        assert_eq!(controller.store().len(), 2);
    }

    #[test]
    fn test_escape_leaves_place_text_first() {
        let mut controller = controller();
        place(&mut controller, 100.0, 100.0);
        controller.set_tool(Tool::PlaceText);

        assert!(controller.execute(EditorCommand::Escape));
        assert_eq!(controller.tool(), Tool::Select);
        assert!(controller.selected().is_some());

        assert!(controller.execute(EditorCommand::Escape));
        assert!(controller.selected().is_none());
        assert!(!controller.execute(EditorCommand::Escape));
    }

    #[test]
    fn test_copy_paste_offsets_and_targets_current_page() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);
        controller.edit_text("copied");
        controller.set_color(Color::BLUE);

        assert!(controller.key_down(KeyInput::new(Key::Character('c')).with_ctrl(), false));
        controller.next_page();
        assert!(controller.key_down(KeyInput::new(Key::Character('v')).with_ctrl(), false));

        let pasted = controller.selected_annotation().unwrap();
        assert_ne!(pasted.id(), id);
        assert_eq!(pasted.page(), 2);
        assert_eq!((pasted.x(), pasted.y()), (120.0, 120.0));
        assert_eq!(pasted.text(), "copied");
        assert_eq!(pasted.color(), Color::BLUE);
        assert_eq!(controller.store().len(), 2);
    }

    #[test]
    fn test_paste_clamps_to_page() {
        let mut controller = controller();
        place(&mut controller, 470.0, 805.0);
        controller.copy();

        assert!(controller.paste());
        let pasted = controller.selected_annotation().unwrap();
        assert_eq!((pasted.x(), pasted.y()), (475.0, 810.0));
    }

    #[test]
    fn test_paste_with_empty_clipboard() {
        let mut controller = controller();
        assert!(!controller.copy());
        assert!(!controller.paste());
        assert!(controller.store().is_empty());
    }

    #[test]
    fn test_undo_redo_restores_snapshots() {
        let mut controller = controller();
        let id = place(&mut controller, 100.0, 100.0);
        controller.edit_text("Hi");
        controller.deselect();

        assert!(controller.undo());
        assert_eq!(controller.store().get(id).unwrap().text(), "");
        assert!(controller.undo());
        assert!(controller.store().is_empty());
        assert!(!controller.undo());

        assert!(controller.redo());
        assert!(controller.redo());
        assert_eq!(controller.store().get(id).unwrap().text(), "Hi");
        assert!(!controller.redo());
    }

    #[test]
    fn test_undo_drops_stale_selection() {
        let mut controller = controller();
        place(&mut controller, 100.0, 100.0);

        assert!(controller.key_down(KeyInput::new(Key::Character('z')).with_meta(), false));
        assert_eq!(controller.selected(), None);
        assert!(!controller.editing());
        assert!(!controller.history().is_restoring());
    }

    #[test]
    fn test_push_after_undo_discards_redo() {
        let mut controller = controller();
        place(&mut controller, 100.0, 100.0);
        controller.deselect();
        controller.undo();
        assert!(controller.can_redo());

        place(&mut controller, 300.0, 300.0);
        assert!(!controller.can_redo());
    }

    #[test]
    fn test_page_navigation_deselects() {
        let mut controller = controller();
        place(&mut controller, 100.0, 100.0);

        assert!(controller.next_page());
        assert_eq!(controller.current_page(), 2);
        assert_eq!(controller.selected(), None);
        assert!(controller.handles().is_none());

        assert!(!controller.next_page());
        assert!(controller.prev_page());
        assert!(!controller.prev_page());
        assert!(!controller.set_current_page(0));
        assert_eq!(controller.current_page(), 1);
        assert_eq!(controller.current_page_annotations().len(), 1);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut controller = controller();
        controller.set_zoom(10.0);
        assert_eq!(controller.zoom(), 4.0);

        controller.zoom_in();
        assert_eq!(controller.zoom(), 4.0);

        controller.set_zoom(0.5);
        controller.zoom_out();
        controller.zoom_out();
        assert_eq!(controller.zoom(), 0.25);
    }

    #[test]
    fn test_replace_geometries_clamps_page_and_selection() {
        let mut controller = controller();
        controller.next_page();
        place(&mut controller, 100.0, 100.0);

        controller.replace_geometries(vec![a4()]);
        assert_eq!(controller.current_page(), 1);
        assert_eq!(controller.selected(), None);
        assert_eq!(controller.page_count(), 1);
    }

    #[test]
    fn test_unmounted_surface_places_at_origin() {
        let mut controller = controller();
        controller.set_tool(Tool::PlaceText);
        controller.pointer_down(&Unmounted, 300.0, 300.0);

        let annotation = controller.selected_annotation().unwrap();
        assert_eq!((annotation.x(), annotation.y()), (0.0, 0.0));
    }

    #[test]
    fn test_no_pages_ignores_pointer() {
        let mut controller = InteractionController::new(EditorConfig::default(), Vec::new());
        controller.set_tool(Tool::PlaceText);
        controller.pointer_down(&surface(), 50.0, 50.0);

        assert!(controller.store().is_empty());
        assert!(!controller.paste());
    }

    #[test]
    fn test_load_annotations_resets_history() {
        let mut controller = controller();
        place(&mut controller, 100.0, 100.0);
        let restored = vec![Annotation::new(2, Rect::new(1.0, 1.0, 40.0, 20.0), 12.0, Color::RED)];

        controller.load_annotations(restored.clone());
        assert_eq!(controller.store().all(), restored.as_slice());
        assert_eq!(controller.history().len(), 1);
        assert!(!controller.can_undo());
        assert_eq!(controller.selected(), None);
    }
}
