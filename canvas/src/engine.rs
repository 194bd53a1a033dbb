//! Interaction engine: turns pointer and keyboard input into board mutations.
//!
//! `EngineCore` holds every piece of client-local state (document, camera,
//! UI state, active gesture) and exposes imperative handlers. Each handler
//! mutates local state first and returns the [`Action`]s the host must
//! persist or react to, so optimistic state is always visible before the
//! corresponding remote write is issued.
//!
//! Intermediate drag and resize frames only touch the local document. The
//! remote write for a gesture is emitted once, on release, and only if the
//! gesture changed something.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::mem;

use uuid::Uuid;

use crate::camera::{Camera, Point, Rect};
use crate::consts::{
    DEFAULT_CONNECTOR_COLOR, DEFAULT_CONNECTOR_WIDTH, DEFAULT_NOTE_COLOR, DEFAULT_NOTE_CONTENT, DEFAULT_NOTE_HEIGHT,
    DEFAULT_NOTE_WIDTH, DEFAULT_TEXT_COLOR, DEFAULT_TEXT_CONTENT, MARQUEE_MIN_SIZE, MIN_NOTE_HEIGHT, MIN_NOTE_WIDTH,
    MIN_STROKE_POINTS, TEXT_MIN_DRAG, WHEEL_ZOOM_FACTOR, ZOOM_STEP,
};
use crate::doc::{
    Connector, ConnectorPatch, Cursor, DocStore, EntityId, EntityRef, Note, NoteKind, NotePatch, Snapshot, Stroke,
    StrokePatch,
};
use crate::hit;
use crate::input::{Button, CursorStyle, EventTarget, InputState, Key, Modifiers, PointerEvent, Tool, UiState, WheelDelta};
use crate::render::{self, Scene};
use crate::selection::Selection;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    NoteCreated(Note),
    NoteUpdated { id: EntityId, fields: NotePatch },
    ConnectorCreated(Connector),
    ConnectorUpdated { id: EntityId, fields: ConnectorPatch },
    StrokeCreated(Stroke),
    StrokeUpdated { id: EntityId, fields: StrokePatch },
    Deleted(EntityRef),
    DeletedMany(Vec<EntityRef>),
    /// Local pointer position in canvas space, for presence.
    CursorMoved(Point),
    /// The engine switched tools on its own (e.g. back to select after placing a note).
    ToolChanged(Tool),
    SetCursor(String),
    RenderNeeded,
}

impl Action {
    /// Whether the host must write this action to the remote store.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            Self::NoteCreated(_)
                | Self::NoteUpdated { .. }
                | Self::ConnectorCreated(_)
                | Self::ConnectorUpdated { .. }
                | Self::StrokeCreated(_)
                | Self::StrokeUpdated { .. }
                | Self::Deleted(_)
                | Self::DeletedMany(_)
        )
    }
}

/// Core engine state.
///
/// Holds no browser or network handles so it can be driven directly from tests.
pub struct EngineCore {
    pub doc: DocStore,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    /// Board new entities are created on.
    pub board_id: Uuid,
    /// Local user; authors strokes and is hidden from the cursor overlay.
    pub user_id: Uuid,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(Uuid::nil(), Uuid::nil())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(board_id: Uuid, user_id: Uuid) -> Self {
        Self {
            doc: DocStore::new(),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            board_id,
            user_id,
        }
    }

    // =============================================================
    // Remote data inputs
    // =============================================================

    /// Hydrate the document from a bulk fetch, dropping local references to vanished entities.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) {
        self.doc.load_snapshot(snapshot);
        self.prune_stale_refs();
        if !self.gesture_targets_exist() {
            self.input = InputState::Idle;
        }
    }

    /// Remote note insert. Idempotent.
    pub fn apply_note_insert(&mut self, note: Note) -> bool {
        let note = self.guard_note(note);
        self.doc.add_note(note)
    }

    /// Remote note update. Ignored when the note is unknown.
    pub fn apply_note_update(&mut self, note: Note) -> bool {
        let note = self.guard_note(note);
        self.doc.replace_note(note)
    }

    pub fn apply_note_delete(&mut self, id: &EntityId) -> bool {
        let removed = self.doc.remove_note(id).is_some();
        self.forget(id);
        removed
    }

    pub fn apply_connector_insert(&mut self, connector: Connector) -> bool {
        self.doc.add_connector(connector)
    }

    pub fn apply_connector_update(&mut self, connector: Connector) -> bool {
        self.doc.replace_connector(connector)
    }

    pub fn apply_connector_delete(&mut self, id: &EntityId) -> bool {
        let removed = self.doc.remove_connector(id).is_some();
        self.forget(id);
        removed
    }

    pub fn apply_stroke_insert(&mut self, stroke: Stroke) -> bool {
        let stroke = self.guard_stroke(stroke);
        self.doc.add_stroke(stroke)
    }

    pub fn apply_stroke_update(&mut self, stroke: Stroke) -> bool {
        let stroke = self.guard_stroke(stroke);
        self.doc.replace_stroke(stroke)
    }

    pub fn apply_stroke_delete(&mut self, id: &EntityId) -> bool {
        let removed = self.doc.remove_stroke(id).is_some();
        self.forget(id);
        removed
    }

    /// Remote cursor insert or update; both upsert by user id.
    pub fn apply_cursor(&mut self, cursor: Cursor) -> bool {
        self.doc.upsert_cursor(cursor)
    }

    pub fn apply_cursor_delete(&mut self, user_id: &Uuid) -> bool {
        self.doc.remove_cursor(user_id).is_some()
    }

    /// Keep locally dragged geometry while a gesture owns this note.
    fn guard_note(&self, mut note: Note) -> Note {
        if self.input.touches(&note.id) {
            if let Some(local) = self.doc.note(&note.id) {
                note.x = local.x;
                note.y = local.y;
                note.width = local.width;
                note.height = local.height;
            }
        }
        note
    }

    fn guard_stroke(&self, mut stroke: Stroke) -> Stroke {
        if self.input.touches(&stroke.id) {
            if let Some(local) = self.doc.stroke(&stroke.id) {
                stroke.points.clone_from(&local.points);
            }
        }
        stroke
    }

    /// Drop every local reference to an entity that no longer exists.
    fn forget(&mut self, id: &EntityId) {
        self.ui.selection.remove(id);
        if self.ui.connect_anchor == Some(*id) {
            self.ui.connect_anchor = None;
        }
        let reconnecting = matches!(self.input, InputState::Reconnecting { id: rid, .. } if rid == *id);
        if self.input.touches(id) || reconnecting {
            self.cancel_gesture();
        }
    }

    fn prune_stale_refs(&mut self) {
        let doc = &self.doc;
        self.ui.selection.retain(|id| doc.contains(id));
        if self.ui.connect_anchor.is_some_and(|id| doc.note(&id).is_none()) {
            self.ui.connect_anchor = None;
        }
    }

    fn gesture_targets_exist(&self) -> bool {
        match &self.input {
            InputState::DraggingNotes { origins, .. } => origins.iter().all(|(id, _)| self.doc.note(id).is_some()),
            InputState::ResizingNote { id, .. } => self.doc.note(id).is_some(),
            InputState::DraggingStroke { id, .. } => self.doc.stroke(id).is_some(),
            InputState::Reconnecting { id, .. } => self.doc.connector(id).is_some(),
            _ => true,
        }
    }

    // =============================================================
    // Tool / settings
    // =============================================================

    /// Switch tools. Cancels any gesture in progress and clears a pending arrow anchor.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = Vec::new();
        self.cancel_gesture();
        self.ui.connect_anchor = None;
        self.ui.tool = tool;
        actions.extend(self.set_cursor(CursorStyle::for_tool(tool)));
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn set_stroke_color(&mut self, color: impl Into<String>) {
        self.ui.pen_color = color.into();
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.ui.pen_width = width;
    }

    /// Discard uncommitted gesture state, restoring any locally dragged geometry.
    pub fn cancel_gesture(&mut self) -> bool {
        match mem::take(&mut self.input) {
            InputState::Idle => false,
            InputState::DraggingNotes { origins, .. } => {
                for (id, origin) in origins {
                    self.doc.update_note(&id, &NotePatch::position(origin.x, origin.y));
                }
                true
            }
            InputState::ResizingNote { id, orig_w, orig_h, .. } => {
                self.doc.update_note(&id, &NotePatch::size(orig_w, orig_h));
                true
            }
            InputState::DraggingStroke { id, origin_points, .. } => {
                let patch = StrokePatch { points: Some(origin_points), ..Default::default() };
                self.doc.update_stroke(&id, &patch);
                true
            }
            InputState::Panning { .. }
            | InputState::DraggingText { .. }
            | InputState::Drawing { .. }
            | InputState::Marquee { .. }
            | InputState::Reconnecting { .. } => true,
        }
    }

    fn set_cursor(&mut self, style: CursorStyle) -> Option<Action> {
        if self.ui.cursor == style {
            return None;
        }
        self.ui.cursor = style;
        Some(Action::SetCursor(style.as_css().to_owned()))
    }

    fn revert_tool(&mut self, actions: &mut Vec<Action>) {
        if self.ui.tool.is_one_shot() {
            self.ui.tool = Tool::Select;
            actions.push(Action::ToolChanged(Tool::Select));
        }
    }

    // =============================================================
    // Viewport
    // =============================================================

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.camera.zoom_at(ZOOM_STEP, Point::default());
        vec![Action::RenderNeeded]
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.camera.zoom_at(-ZOOM_STEP, Point::default());
        vec![Action::RenderNeeded]
    }

    pub fn reset_view(&mut self) -> Vec<Action> {
        self.camera.reset();
        vec![Action::RenderNeeded]
    }

    // =============================================================
    // Pointer input
    // =============================================================

    /// Build a pointer event whose target is derived by hit-testing the current document.
    #[must_use]
    pub fn pointer_event(&self, screen: Point, button: Button, modifiers: Modifiers) -> PointerEvent {
        PointerEvent {
            screen,
            button,
            modifiers,
            target: hit::hit_test(screen, &self.doc, &self.camera, &self.ui.selection),
        }
    }

    pub fn on_pointer_down(&mut self, ev: PointerEvent) -> Vec<Action> {
        if ev.target == EventTarget::Control || !self.input.is_idle() {
            return Vec::new();
        }
        match ev.button {
            Button::Middle => {
                self.input = InputState::Panning { last_screen: ev.screen };
                return self.set_cursor(CursorStyle::Grabbing).into_iter().collect();
            }
            Button::Secondary => return Vec::new(),
            Button::Primary => {}
        }

        let canvas = self.camera.screen_to_canvas(ev.screen);
        match self.ui.tool {
            Tool::Select => self.select_down(ev, canvas),
            Tool::Note => self.place_note(ev.target, canvas),
            Tool::Text => {
                if ev.target.is_background() {
                    self.input = InputState::DraggingText { start: canvas, current: canvas };
                    vec![Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            Tool::Pen => {
                self.input = InputState::Drawing {
                    points: vec![canvas],
                    color: self.ui.pen_color.clone(),
                    width: self.ui.pen_width,
                };
                vec![Action::RenderNeeded]
            }
            Tool::Arrow => self.connect_click(ev.target),
        }
    }

    fn select_down(&mut self, ev: PointerEvent, canvas: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        match ev.target {
            EventTarget::ResizeHandle(id) if self.ui.selection.single() == Some(id) => {
                if let Some(note) = self.doc.note(&id) {
                    self.input = InputState::ResizingNote {
                        id,
                        start_screen: ev.screen,
                        orig_w: note.width,
                        orig_h: note.height,
                        resized: false,
                    };
                    actions.extend(self.set_cursor(CursorStyle::ResizeNwse));
                }
            }
            EventTarget::Note(id) | EventTarget::ResizeHandle(id) => {
                if self.doc.note(&id).is_none() {
                    return actions;
                }
                if ev.modifiers.shift {
                    self.ui.selection.toggle(id);
                } else {
                    let group = self.ui.selection.contains(&id) && self.ui.selection.len() > 1;
                    if !group {
                        self.ui.selection.select(id);
                    }
                    let origins = self
                        .ui
                        .selection
                        .ids()
                        .into_iter()
                        .filter_map(|sid| self.doc.note(&sid).map(|n| (sid, Point::new(n.x, n.y))))
                        .collect();
                    self.input = InputState::DraggingNotes { start_screen: ev.screen, origins, moved: false };
                    actions.extend(self.set_cursor(CursorStyle::Grabbing));
                }
            }
            EventTarget::Stroke(id) => {
                let Some(stroke) = self.doc.stroke(&id) else {
                    return actions;
                };
                let origin_points = stroke.points.clone();
                if ev.modifiers.shift {
                    self.ui.selection.toggle(id);
                } else {
                    if !self.ui.selection.contains(&id) {
                        self.ui.selection.select(id);
                    }
                    self.input = InputState::DraggingStroke { id, start_screen: ev.screen, origin_points, moved: false };
                    actions.extend(self.set_cursor(CursorStyle::Grabbing));
                }
            }
            EventTarget::Connector(id) => {
                if self.doc.connector(&id).is_none() {
                    return actions;
                }
                if ev.modifiers.shift {
                    self.ui.selection.toggle(id);
                } else {
                    self.ui.selection.select(id);
                }
            }
            EventTarget::ConnectorEnd(id) => {
                if self.doc.connector(&id).is_some() {
                    self.input = InputState::Reconnecting { id, current: canvas };
                }
            }
            EventTarget::CanvasRoot | EventTarget::ContentWrapper | EventTarget::SvgLayer => {
                if ev.modifiers.shift {
                    self.input = InputState::Marquee { start: canvas, current: canvas };
                } else {
                    self.ui.selection.clear();
                    self.input = InputState::Panning { last_screen: ev.screen };
                    actions.extend(self.set_cursor(CursorStyle::Grabbing));
                }
            }
            EventTarget::Control => return actions,
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    fn place_note(&mut self, target: EventTarget, at: Point) -> Vec<Action> {
        if !target.is_background() {
            return Vec::new();
        }
        let note = self.new_note(
            NoteKind::Note,
            Rect::new(at.x, at.y, DEFAULT_NOTE_WIDTH, DEFAULT_NOTE_HEIGHT),
            DEFAULT_NOTE_CONTENT,
            DEFAULT_NOTE_COLOR,
        );
        self.doc.add_note(note.clone());
        let mut actions = vec![Action::NoteCreated(note)];
        self.revert_tool(&mut actions);
        actions.extend(self.set_cursor(CursorStyle::for_tool(Tool::Select)));
        actions.push(Action::RenderNeeded);
        actions
    }

    fn connect_click(&mut self, target: EventTarget) -> Vec<Action> {
        let Some(id) = target.note() else {
            if target.is_background() && self.ui.connect_anchor.take().is_some() {
                return vec![Action::RenderNeeded];
            }
            return Vec::new();
        };
        if self.doc.note(&id).is_none() {
            return Vec::new();
        }
        match self.ui.connect_anchor {
            None => {
                self.ui.connect_anchor = Some(id);
                vec![Action::RenderNeeded]
            }
            Some(anchor) if anchor == id => Vec::new(),
            Some(anchor) => {
                let mut actions = self.create_connector_between(anchor, id);
                self.ui.connect_anchor = None;
                self.revert_tool(&mut actions);
                actions.extend(self.set_cursor(CursorStyle::for_tool(Tool::Select)));
                actions
            }
        }
    }

    pub fn on_pointer_move(&mut self, ev: PointerEvent) -> Vec<Action> {
        let canvas = self.camera.screen_to_canvas(ev.screen);
        let mut actions = vec![Action::CursorMoved(canvas)];
        let camera = self.camera;

        let render = match &mut self.input {
            InputState::Idle => false,
            InputState::Panning { last_screen } => {
                let delta = ev.screen.minus(*last_screen);
                *last_screen = ev.screen;
                self.camera.pan(delta.x, delta.y);
                true
            }
            InputState::DraggingText { current, .. } | InputState::Marquee { current, .. } => {
                *current = canvas;
                true
            }
            InputState::Drawing { points, .. } => {
                points.push(canvas);
                true
            }
            InputState::Reconnecting { current, .. } => {
                *current = canvas;
                true
            }
            InputState::DraggingNotes { start_screen, origins, moved } => {
                let delta = camera.screen_delta_to_canvas(ev.screen.minus(*start_screen));
                for (id, origin) in origins.iter() {
                    let at = origin.plus(delta);
                    *moved |= self.doc.update_note(id, &NotePatch::position(at.x, at.y));
                }
                true
            }
            InputState::ResizingNote { id, start_screen, orig_w, orig_h, resized } => {
                let delta = camera.screen_delta_to_canvas(ev.screen.minus(*start_screen));
                let width = (*orig_w + delta.x).max(MIN_NOTE_WIDTH);
                let height = (*orig_h + delta.y).max(MIN_NOTE_HEIGHT);
                *resized |= self.doc.update_note(id, &NotePatch::size(width, height));
                true
            }
            InputState::DraggingStroke { id, start_screen, origin_points, moved } => {
                let delta = camera.screen_delta_to_canvas(ev.screen.minus(*start_screen));
                let points = origin_points.iter().map(|p| p.plus(delta)).collect();
                let patch = StrokePatch { points: Some(points), ..Default::default() };
                *moved |= self.doc.update_stroke(id, &patch);
                true
            }
        };

        if render {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    pub fn on_pointer_up(&mut self, _ev: PointerEvent) -> Vec<Action> {
        self.finish_gesture()
    }

    /// The pointer left the canvas. Ends the current gesture as if released at the last position.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        self.finish_gesture()
    }

    fn finish_gesture(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        match mem::take(&mut self.input) {
            InputState::Idle => return actions,
            InputState::Panning { .. } => {}
            InputState::DraggingText { start, current } => {
                let rect = Rect::from_corners(start, current);
                if rect.width > TEXT_MIN_DRAG && rect.height > TEXT_MIN_DRAG {
                    let note = self.new_note(NoteKind::Text, rect, DEFAULT_TEXT_CONTENT, DEFAULT_TEXT_COLOR);
                    self.doc.add_note(note.clone());
                    actions.push(Action::NoteCreated(note));
                }
                self.revert_tool(&mut actions);
            }
            InputState::Drawing { points, color, width } => {
                if points.len() >= MIN_STROKE_POINTS {
                    let stroke = Stroke {
                        id: Uuid::new_v4(),
                        board_id: self.board_id,
                        author: self.user_id,
                        color,
                        width,
                        points,
                        created_at: None,
                    };
                    self.doc.add_stroke(stroke.clone());
                    actions.push(Action::StrokeCreated(stroke));
                }
            }
            InputState::DraggingNotes { origins, moved, .. } => {
                if moved {
                    for (id, _) in origins {
                        if let Some(note) = self.doc.note(&id) {
                            actions.push(Action::NoteUpdated { id, fields: NotePatch::position(note.x, note.y) });
                        }
                    }
                }
            }
            InputState::ResizingNote { id, resized, .. } => {
                if let Some(note) = self.doc.note(&id).filter(|_| resized) {
                    actions.push(Action::NoteUpdated { id, fields: NotePatch::size(note.width, note.height) });
                }
            }
            InputState::DraggingStroke { id, moved, .. } => {
                if let Some(stroke) = self.doc.stroke(&id).filter(|_| moved) {
                    let fields = StrokePatch { points: Some(stroke.points.clone()), ..Default::default() };
                    actions.push(Action::StrokeUpdated { id, fields });
                }
            }
            InputState::Marquee { start, current } => {
                let rect = Rect::from_corners(start, current);
                if rect.width >= MARQUEE_MIN_SIZE || rect.height >= MARQUEE_MIN_SIZE {
                    self.ui.selection.select_many(hit::marquee_selection(rect, &self.doc));
                }
            }
            InputState::Reconnecting { id, current } => {
                actions.extend(self.retarget_connector(id, current));
            }
        }
        actions.extend(self.set_cursor(CursorStyle::for_tool(self.ui.tool)));
        actions.push(Action::RenderNeeded);
        actions
    }

    fn retarget_connector(&mut self, id: EntityId, drop_at: Point) -> Option<Action> {
        let target = hit::note_at(drop_at, &self.doc)?;
        let connector = self.doc.connector(&id)?;
        if target == connector.from_note_id || target == connector.to_note_id {
            return None;
        }
        let fields = ConnectorPatch { to_note_id: Some(target), ..Default::default() };
        self.doc.update_connector(&id, &fields);
        Some(Action::ConnectorUpdated { id, fields })
    }

    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta) -> Vec<Action> {
        if self.input.is_screen_anchored() {
            return Vec::new();
        }
        self.camera.zoom_at(-delta.dy * WHEEL_ZOOM_FACTOR, screen);
        vec![Action::RenderNeeded]
    }

    // =============================================================
    // Keyboard
    // =============================================================

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if key.is("Delete") {
            return self.delete_selection();
        }
        if key.is("Escape") {
            self.cancel_gesture();
            self.ui.selection.clear();
            self.ui.connect_anchor = None;
            let mut actions: Vec<_> = self.set_cursor(CursorStyle::for_tool(self.ui.tool)).into_iter().collect();
            actions.push(Action::RenderNeeded);
            return actions;
        }
        if modifiers.command() && key.is("a") {
            return self.select_all();
        }
        Vec::new()
    }

    // =============================================================
    // Commands
    // =============================================================

    /// Connect two distinct existing notes with a default-styled arrow.
    pub fn create_connector_between(&mut self, from: EntityId, to: EntityId) -> Vec<Action> {
        if from == to || self.doc.note(&from).is_none() || self.doc.note(&to).is_none() {
            return Vec::new();
        }
        let connector = Connector {
            id: Uuid::new_v4(),
            board_id: self.board_id,
            from_note_id: from,
            to_note_id: to,
            color: DEFAULT_CONNECTOR_COLOR.to_owned(),
            stroke_width: DEFAULT_CONNECTOR_WIDTH,
        };
        self.doc.add_connector(connector.clone());
        vec![Action::ConnectorCreated(connector), Action::RenderNeeded]
    }

    /// Delete everything selected: a single delete for one entity, a batch otherwise.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        let ids = self.ui.selection.ids();
        let removed: Vec<EntityRef> = ids.iter().filter_map(|id| self.doc.remove_entity(id)).collect();
        for id in &ids {
            self.forget(id);
        }
        match removed.len() {
            0 => Vec::new(),
            1 => vec![Action::Deleted(removed[0]), Action::RenderNeeded],
            _ => vec![Action::DeletedMany(removed), Action::RenderNeeded],
        }
    }

    /// Delete one entity regardless of the selection.
    pub fn delete_item(&mut self, id: &EntityId) -> Vec<Action> {
        let Some(removed) = self.doc.remove_entity(id) else {
            return Vec::new();
        };
        self.forget(id);
        vec![Action::Deleted(removed), Action::RenderNeeded]
    }

    pub fn select_all(&mut self) -> Vec<Action> {
        self.ui.selection.select_many(self.doc.all_entity_ids());
        vec![Action::RenderNeeded]
    }

    /// Replace a note's text locally. The host decides when to persist the returned update.
    pub fn set_text(&mut self, id: &EntityId, content: impl Into<String>) -> Vec<Action> {
        let fields = NotePatch::content(content);
        if self.doc.note(id).is_none() {
            return Vec::new();
        }
        self.doc.update_note(id, &fields);
        vec![Action::NoteUpdated { id: *id, fields }, Action::RenderNeeded]
    }

    fn new_note(&self, kind: NoteKind, rect: Rect, content: &str, color: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            board_id: self.board_id,
            kind,
            content: content.to_owned(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            color: color.to_owned(),
        }
    }

    // =============================================================
    // Queries
    // =============================================================

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.ui.selection
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn note(&self, id: &EntityId) -> Option<&Note> {
        self.doc.note(id)
    }

    /// Render-ready view of the current state.
    #[must_use]
    pub fn scene(&self) -> Scene {
        render::build_scene(&self.doc, &self.camera, &self.ui, &self.input, self.user_id)
    }
}
