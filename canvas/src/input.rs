//! Input model: tools, modifier keys, mouse buttons, event targets, and the gesture state machine.
//!
//! This module defines the types consumed by the input engine. `Tool` and
//! `Modifiers` capture the user's intent at the time of a pointer event, and
//! `EventTarget` says what the pointer landed on. `InputState` is the active
//! gesture being tracked between pointer-down and pointer-up, carrying all
//! context needed to recompute positions from the gesture origin and emit
//! final document mutations on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::{Point, Rect};
use crate::consts::{DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH};
use crate::doc::EntityId;
use crate::selection::Selection;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Pointer / selection tool (default).
    #[default]
    Select,
    /// Place a sticky note with a single click.
    Note,
    /// Drag out a free-text box.
    Text,
    /// Freehand ink.
    Pen,
    /// Connect two notes with a directed arrow.
    Arrow,
}

impl Tool {
    /// Whether the tool returns to `Select` after a successful (or discarded) placement.
    #[must_use]
    pub fn is_one_shot(self) -> bool {
        matches!(self, Self::Note | Self::Text | Self::Arrow)
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Delete"`, `"Escape"`, `"a"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// What a pointer event landed on.
///
/// Hosts with a DOM report the element class; hosts without one derive it with
/// [`crate::hit::hit_test`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventTarget {
    /// The canvas root element.
    #[default]
    CanvasRoot,
    /// The transformed content wrapper inside the root.
    ContentWrapper,
    /// An SVG layer element (ink or connector layer background).
    SvgLayer,
    /// The body of a note.
    Note(EntityId),
    /// The resize handle of a note.
    ResizeHandle(EntityId),
    /// The body of a connector path.
    Connector(EntityId),
    /// The target endpoint of a connector; dragging it retargets the connector.
    ConnectorEnd(EntityId),
    /// The body of an ink stroke.
    Stroke(EntityId),
    /// Toolbar or other UI chrome; pointer events here are ignored.
    Control,
}

impl EventTarget {
    /// True for the canvas root, the content wrapper, and SVG layers.
    #[must_use]
    pub fn is_background(self) -> bool {
        matches!(self, Self::CanvasRoot | Self::ContentWrapper | Self::SvgLayer)
    }

    /// The note under the pointer, including its resize handle.
    #[must_use]
    pub fn note(self) -> Option<EntityId> {
        match self {
            Self::Note(id) | Self::ResizeHandle(id) => Some(id),
            _ => None,
        }
    }
}

/// A pointer event in screen space.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub screen: Point,
    pub button: Button,
    pub modifiers: Modifiers,
    pub target: EventTarget,
}

impl PointerEvent {
    /// Primary-button event on the canvas background with no modifiers.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            screen: Point::new(x, y),
            button: Button::Primary,
            modifiers: Modifiers::default(),
            target: EventTarget::CanvasRoot,
        }
    }

    #[must_use]
    pub fn on(mut self, target: EventTarget) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_button(mut self, button: Button) -> Self {
        self.button = button;
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// CSS cursor shown over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Grabbing,
    Crosshair,
    ResizeNwse,
}

impl CursorStyle {
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Grabbing => "grabbing",
            Self::Crosshair => "crosshair",
            Self::ResizeNwse => "nwse-resize",
        }
    }

    /// Resting cursor for a tool when no gesture is active.
    #[must_use]
    pub fn for_tool(tool: Tool) -> Self {
        match tool {
            Tool::Select => Self::Default,
            Tool::Note | Tool::Text | Tool::Pen | Tool::Arrow => Self::Crosshair,
        }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// Selected notes, connectors, and strokes.
    pub selection: Selection,
    /// First note clicked in arrow mode, waiting for a target.
    pub connect_anchor: Option<EntityId>,
    /// Color for new strokes.
    pub pen_color: String,
    /// Width for new strokes.
    pub pen_width: f64,
    /// Last cursor style reported to the host.
    pub cursor: CursorStyle,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tool: Tool::Select,
            selection: Selection::default(),
            connect_anchor: None,
            pen_color: DEFAULT_STROKE_COLOR.to_owned(),
            pen_width: DEFAULT_STROKE_WIDTH,
            cursor: CursorStyle::Default,
        }
    }
}

/// Internal state for the input state machine.
///
/// Each active variant carries gesture context needed to compute positions
/// and emit final actions on pointer-up. Drags keep the pointer-down screen
/// position and the entity's original geometry, so every frame converts the
/// total screen delta through the camera once instead of accumulating
/// per-frame canvas deltas.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the canvas by dragging the background.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute pan delta.
        last_screen: Point,
    },
    /// The user is dragging out a text box.
    DraggingText {
        /// Canvas-space press position.
        start: Point,
        /// Canvas-space current position.
        current: Point,
    },
    /// The user is drawing a freehand stroke.
    Drawing {
        /// Raw canvas-space samples.
        points: Vec<Point>,
        color: String,
        width: f64,
    },
    /// The user is moving one or more notes.
    DraggingNotes {
        /// Screen-space press position.
        start_screen: Point,
        /// Each moving note with its position at press time.
        origins: Vec<(EntityId, Point)>,
        /// Whether any move changed geometry.
        moved: bool,
    },
    /// The user is resizing the sole selected note from its bottom-right handle.
    ResizingNote {
        id: EntityId,
        /// Screen-space press position.
        start_screen: Point,
        /// Note width at the start of the resize.
        orig_w: f64,
        /// Note height at the start of the resize.
        orig_h: f64,
        resized: bool,
    },
    /// The user is translating an ink stroke.
    DraggingStroke {
        id: EntityId,
        /// Screen-space press position.
        start_screen: Point,
        /// Stroke points at press time.
        origin_points: Vec<Point>,
        moved: bool,
    },
    /// The user is dragging a selection rectangle.
    Marquee {
        /// Canvas-space press position.
        start: Point,
        /// Canvas-space current position.
        current: Point,
    },
    /// The user is dragging a connector's target end toward another note.
    Reconnecting {
        id: EntityId,
        /// Canvas-space pointer position.
        current: Point,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether this gesture is currently rewriting the geometry of `id`.
    #[must_use]
    pub fn touches(&self, id: &EntityId) -> bool {
        match self {
            Self::DraggingNotes { origins, .. } => origins.iter().any(|(oid, _)| oid == id),
            Self::ResizingNote { id: rid, .. } | Self::DraggingStroke { id: rid, .. } => rid == id,
            _ => false,
        }
    }

    /// Whether the gesture measures its delta from a screen-space start point.
    /// The camera must hold still while one of these is live.
    #[must_use]
    pub fn is_screen_anchored(&self) -> bool {
        matches!(self, Self::DraggingNotes { .. } | Self::ResizingNote { .. } | Self::DraggingStroke { .. })
    }

    /// Uncommitted visual state for the renderer.
    #[must_use]
    pub fn preview(&self) -> Option<Preview> {
        match self {
            Self::DraggingText { start, current } => Some(Preview::TextBox(Rect::from_corners(*start, *current))),
            Self::Drawing { points, color, width } => Some(Preview::Ink {
                points: points.clone(),
                color: color.clone(),
                width: *width,
            }),
            Self::Marquee { start, current } => Some(Preview::Marquee(Rect::from_corners(*start, *current))),
            Self::Reconnecting { id, current } => Some(Preview::Reconnect { connector: *id, to: *current }),
            _ => None,
        }
    }
}

/// In-progress gesture feedback, all in canvas space.
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    TextBox(Rect),
    Ink { points: Vec<Point>, color: String, width: f64 },
    Marquee(Rect),
    Reconnect { connector: EntityId, to: Point },
}
