//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 3.0;

/// Zoom change per wheel pixel (`delta = -wheel_dy * WHEEL_ZOOM_FACTOR`).
pub const WHEEL_ZOOM_FACTOR: f64 = 0.001;

/// Zoom change for the zoom-in / zoom-out buttons.
pub const ZOOM_STEP: f64 = 0.1;

/// Background grid spacing in canvas units.
pub const GRID_SIZE: f64 = 40.0;

// ── Notes ───────────────────────────────────────────────────────

/// Minimum note width enforced by the resize gesture.
pub const MIN_NOTE_WIDTH: f64 = 100.0;

/// Minimum note height enforced by the resize gesture.
pub const MIN_NOTE_HEIGHT: f64 = 50.0;

/// Size of a sticky note placed with a single click.
pub const DEFAULT_NOTE_WIDTH: f64 = 200.0;
pub const DEFAULT_NOTE_HEIGHT: f64 = 150.0;

pub const DEFAULT_NOTE_CONTENT: &str = "New note";
pub const DEFAULT_NOTE_COLOR: &str = "#fef3c7";

pub const DEFAULT_TEXT_CONTENT: &str = "Text";
pub const DEFAULT_TEXT_COLOR: &str = "transparent";

/// A text drag must exceed this size (canvas units) on both axes to create a note.
pub const TEXT_MIN_DRAG: f64 = 20.0;

// ── Strokes ─────────────────────────────────────────────────────

/// Fewest points a freehand stroke needs to be committed.
pub const MIN_STROKE_POINTS: usize = 2;

pub const DEFAULT_STROKE_COLOR: &str = "#3b82f6";
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Pen colors offered by the toolbar.
pub const PEN_PALETTE: [&str; 12] = [
    "#000000", "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#06b6d4", "#f97316", "#84cc16", "#ec4899",
    "#6b7280", "#fbbf24",
];

/// Pen thickness presets.
pub const PEN_THICKNESSES: [f64; 6] = [1.0, 2.0, 3.0, 4.0, 6.0, 8.0];

// ── Connectors ──────────────────────────────────────────────────

pub const DEFAULT_CONNECTOR_COLOR: &str = "#000000";
pub const DEFAULT_CONNECTOR_WIDTH: f64 = 2.0;

/// Curvature grows with distance by this factor, up to `CONNECTOR_MAX_CURVATURE`.
pub const CONNECTOR_CURVATURE_RATIO: f64 = 0.2;
pub const CONNECTOR_MAX_CURVATURE: f64 = 50.0;

/// Control points sit this fraction of the curvature off the center line.
pub const CONNECTOR_CONTROL_OFFSET: f64 = 0.3;

/// Samples taken along a connector curve for hit-testing.
pub const CONNECTOR_HIT_SAMPLES: usize = 16;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// The resize handle center sits this far inside the note's bottom-right corner (canvas units).
pub const RESIZE_HANDLE_INSET: f64 = 4.0;

/// Extra half-width around strokes and connectors that still counts as a hit, in screen pixels.
pub const LINE_HIT_SLOP_PX: f64 = 5.0;

/// Marquee drags smaller than this on both axes (canvas units) are treated as clicks.
pub const MARQUEE_MIN_SIZE: f64 = 4.0;
