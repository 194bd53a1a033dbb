//! Rendering: derives a render-ready scene from document, camera, and UI state.
//!
//! This module produces plain data for the host's drawing layer. It receives
//! read-only views of document state and camera state and returns a [`Scene`];
//! it does not mutate any application state.
//!
//! Referential validity is checked here rather than in the store: a connector
//! whose endpoint notes are missing yields no path and is skipped.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use uuid::Uuid;

use crate::camera::{Camera, Point, Rect};
use crate::consts::{
    CONNECTOR_CONTROL_OFFSET, CONNECTOR_CURVATURE_RATIO, CONNECTOR_MAX_CURVATURE, GRID_SIZE, PEN_PALETTE, PEN_THICKNESSES,
};
use crate::doc::{Connector, Cursor, DocStore, EntityId, Note, Stroke};
use crate::input::{CursorStyle, InputState, Preview, Tool, UiState};

/// A note with its selection decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteView {
    pub note: Note,
    pub selected: bool,
    /// Highlighted as the pending anchor of an arrow gesture.
    pub anchored: bool,
    /// The resize handle is shown only when this note is the sole selection.
    pub show_resize_handle: bool,
}

/// A stroke with its selection state.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeView {
    pub stroke: Stroke,
    pub selected: bool,
}

/// A cubic curve between two note edges, in canvas space.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorPath {
    pub id: EntityId,
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    /// Arrowhead tip.
    pub end: Point,
    pub color: String,
    pub stroke_width: f64,
    pub selected: bool,
}

impl ConnectorPath {
    /// Point on the curve at `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }

    /// `segments + 1` evenly spaced points from start to end.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn samples(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        let step = 1.0 / segments as f64;
        (0..=segments).map(|i| self.point_at(i as f64 * step)).collect()
    }

    /// SVG path data (`M .. C ..`) in canvas coordinates.
    #[must_use]
    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        )
    }
}

/// A remote user's pointer overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorView {
    pub user_id: Uuid,
    pub display_name: String,
    pub position: Point,
    pub color: String,
}

impl From<&Cursor> for CursorView {
    fn from(c: &Cursor) -> Self {
        Self {
            user_id: c.user_id,
            display_name: c.display_name.clone(),
            position: Point::new(c.x, c.y),
            color: c.color.clone(),
        }
    }
}

/// Background grid in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    /// Distance between lines in screen pixels.
    pub spacing: f64,
    /// Screen offset of the canvas origin.
    pub offset: Point,
}

impl Grid {
    #[must_use]
    pub fn for_camera(camera: &Camera) -> Self {
        Self {
            spacing: camera.canvas_dist_to_screen(GRID_SIZE),
            offset: Point::new(camera.pan_x, camera.pan_y),
        }
    }
}

/// Pen toolbar: the active settings and the presets to pick from.
#[derive(Debug, Clone, PartialEq)]
pub struct PenView {
    pub color: String,
    pub width: f64,
    pub palette: &'static [&'static str],
    pub thicknesses: &'static [f64],
}

impl PenView {
    #[must_use]
    pub fn for_ui(ui: &UiState) -> Self {
        Self { color: ui.pen_color.clone(), width: ui.pen_width, palette: &PEN_PALETTE, thicknesses: &PEN_THICKNESSES }
    }
}

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    pub grid: Grid,
    pub tool: Tool,
    pub cursor: CursorStyle,
    pub pen: PenView,
    pub notes: Vec<NoteView>,
    pub connectors: Vec<ConnectorPath>,
    pub strokes: Vec<StrokeView>,
    pub cursors: Vec<CursorView>,
    pub preview: Option<Preview>,
}

/// Derive the scene for the current state. `self_user` is excluded from the cursor overlay.
#[must_use]
pub fn build_scene(doc: &DocStore, camera: &Camera, ui: &UiState, input: &InputState, self_user: Uuid) -> Scene {
    let sole = ui.selection.single();

    let notes = doc
        .notes()
        .iter()
        .map(|note| NoteView {
            note: note.clone(),
            selected: ui.selection.contains(&note.id),
            anchored: ui.connect_anchor == Some(note.id),
            show_resize_handle: sole == Some(note.id),
        })
        .collect();

    let connectors = doc
        .connectors()
        .iter()
        .filter_map(|c| connector_path(doc, c).map(|p| ConnectorPath { selected: ui.selection.contains(&c.id), ..p }))
        .collect();

    let strokes = doc
        .strokes()
        .iter()
        .map(|stroke| StrokeView { stroke: stroke.clone(), selected: ui.selection.contains(&stroke.id) })
        .collect();

    let cursors = doc.remote_cursors(self_user).map(CursorView::from).collect();

    Scene {
        camera: *camera,
        grid: Grid::for_camera(camera),
        tool: ui.tool,
        cursor: ui.cursor,
        pen: PenView::for_ui(ui),
        notes,
        connectors,
        strokes,
        cursors,
        preview: input.preview(),
    }
}

// =============================================================
// Connector geometry
// =============================================================

/// Where the ray from the center of `rect` toward `toward` crosses the rectangle's edge.
#[must_use]
pub fn edge_point(rect: Rect, toward: Point) -> Point {
    let center = rect.center();
    let dx = toward.x - center.x;
    let dy = toward.y - center.y;
    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;
    if (dx == 0.0 && dy == 0.0) || half_w <= 0.0 || half_h <= 0.0 {
        return center;
    }
    if dx.abs() / half_w > dy.abs() / half_h {
        Point::new(center.x + half_w.copysign(dx), center.y + dy * half_w / dx.abs())
    } else {
        Point::new(center.x + dx * half_h / dy.abs(), center.y + half_h.copysign(dy))
    }
}

/// Curve from the edge of `from` to the edge of `to`, bowed perpendicular to the center line.
#[must_use]
pub fn curve_between(from: Rect, to: Rect) -> (Point, Point, Point, Point) {
    let a = from.center();
    let b = to.center();
    let start = edge_point(from, b);
    let end = edge_point(to, a);

    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let distance = dx.hypot(dy);
    let curvature = (distance * CONNECTOR_CURVATURE_RATIO).min(CONNECTOR_MAX_CURVATURE);
    let offset = curvature * CONNECTOR_CONTROL_OFFSET;
    let (px, py) = if distance > 0.0 { (-dy / distance, dx / distance) } else { (0.0, 0.0) };

    let mid = Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
    let control1 = Point::new(mid.x + px * offset, mid.y + py * offset);
    let control2 = Point::new(mid.x - px * offset, mid.y - py * offset);
    (start, control1, control2, end)
}

/// Path for a connector, or `None` when either endpoint note is missing.
#[must_use]
pub fn connector_path(doc: &DocStore, connector: &Connector) -> Option<ConnectorPath> {
    let from = doc.note(&connector.from_note_id)?;
    let to = doc.note(&connector.to_note_id)?;
    let (start, control1, control2, end) = curve_between(from.bounds(), to.bounds());
    Some(ConnectorPath {
        id: connector.id,
        start,
        control1,
        control2,
        end,
        color: connector.color.clone(),
        stroke_width: connector.stroke_width,
        selected: false,
    })
}

/// SVG path data for a polyline (`M x y L x y ...`). Empty input yields an empty string.
#[must_use]
pub fn svg_polyline(points: &[Point]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let cmd = if i == 0 { 'M' } else { 'L' };
            format!("{cmd} {} {}", p.x, p.y)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
