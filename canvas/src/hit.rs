//! Hit-testing and marquee geometry.
//!
//! Hosts that receive DOM targets can skip [`hit_test`]; it exists for hosts
//! that only have a screen position. Slop distances are defined in screen
//! pixels and converted through the camera, so targets stay the same size on
//! screen at every zoom level.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point, Rect};
use crate::consts::{CONNECTOR_HIT_SAMPLES, HANDLE_RADIUS_PX, LINE_HIT_SLOP_PX, RESIZE_HANDLE_INSET};
use crate::doc::{DocStore, EntityId, Note};
use crate::input::EventTarget;
use crate::render::connector_path;
use crate::selection::Selection;

/// Canvas-space center of a note's bottom-right resize handle.
#[must_use]
pub fn resize_handle_center(note: &Note) -> Point {
    let b = note.bounds();
    Point::new(b.right() - RESIZE_HANDLE_INSET, b.bottom() - RESIZE_HANDLE_INSET)
}

/// Test what is under `screen`, checking selection handles first.
///
/// Order: the sole-selected note's resize handle, the target end of a selected
/// connector, notes (topmost first), connector curves, strokes, then the
/// canvas background.
#[must_use]
pub fn hit_test(screen: Point, doc: &DocStore, camera: &Camera, selection: &Selection) -> EventTarget {
    let canvas = camera.screen_to_canvas(screen);

    if let Some(note) = selection.single().and_then(|id| doc.note(&id)) {
        let handle = camera.canvas_to_screen(resize_handle_center(note));
        if distance(screen, handle) <= HANDLE_RADIUS_PX {
            return EventTarget::ResizeHandle(note.id);
        }
    }

    for connector in doc.connectors().iter().filter(|c| selection.contains(&c.id)) {
        if let Some(path) = connector_path(doc, connector) {
            if distance(screen, camera.canvas_to_screen(path.end)) <= HANDLE_RADIUS_PX {
                return EventTarget::ConnectorEnd(connector.id);
            }
        }
    }

    if let Some(id) = note_at(canvas, doc) {
        return EventTarget::Note(id);
    }

    let slop = camera.screen_dist_to_canvas(LINE_HIT_SLOP_PX);

    let connectors: Vec<_> = doc.connectors().iter().collect();
    for connector in connectors.into_iter().rev() {
        let Some(path) = connector_path(doc, connector) else {
            continue;
        };
        let tolerance = connector.stroke_width / 2.0 + slop;
        if polyline_distance(canvas, &path.samples(CONNECTOR_HIT_SAMPLES)) <= tolerance {
            return EventTarget::Connector(connector.id);
        }
    }

    let strokes: Vec<_> = doc.strokes().iter().collect();
    for stroke in strokes.into_iter().rev() {
        let tolerance = stroke.width / 2.0 + slop;
        if polyline_distance(canvas, &stroke.points) <= tolerance {
            return EventTarget::Stroke(stroke.id);
        }
    }

    EventTarget::CanvasRoot
}

/// Topmost note whose bounds contain the canvas point.
#[must_use]
pub fn note_at(canvas: Point, doc: &DocStore) -> Option<EntityId> {
    let notes: Vec<_> = doc.notes().iter().collect();
    notes.into_iter().rev().find(|n| n.bounds().contains(canvas)).map(|n| n.id)
}

/// Entities selected by a canvas-space marquee rectangle.
///
/// Notes whose bounds intersect the rectangle, connectors with at least one
/// endpoint-note center inside it, and strokes with at least one point inside it.
#[must_use]
pub fn marquee_selection(rect: Rect, doc: &DocStore) -> Vec<EntityId> {
    let notes = doc.notes().iter().filter(|n| n.bounds().intersects(&rect)).map(|n| n.id);

    let connectors = doc
        .connectors()
        .iter()
        .filter(|c| {
            [c.from_note_id, c.to_note_id]
                .iter()
                .filter_map(|id| doc.note(id))
                .any(|n| rect.contains(n.center()))
        })
        .map(|c| c.id);

    let strokes = doc
        .strokes()
        .iter()
        .filter(|s| s.points.iter().any(|p| rect.contains(*p)))
        .map(|s| s.id);

    notes.chain(connectors).chain(strokes).collect()
}

fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Shortest distance from `p` to the segment `a`-`b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, Point::new(a.x + t * dx, a.y + t * dy))
}

/// Shortest distance from `p` to a polyline. An empty polyline is infinitely far away.
#[must_use]
pub fn polyline_distance(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => distance(p, *only),
        _ => points
            .windows(2)
            .map(|w| segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}
