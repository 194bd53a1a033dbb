//! Presence: throttled local cursor publishing.
//!
//! DESIGN
//! ======
//! Pointer moves arrive far faster than presence needs to travel. The
//! broadcaster lets one cursor write through per throttle window and holds
//! the newest suppressed position as pending; [`PresenceBroadcaster::flush_due`]
//! publishes it once the window has elapsed so the final resting position is
//! never lost.
//!
//! Cursor colors come from a fixed palette indexed by a hash of the user id,
//! so a user keeps the same color on every board and in every session.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::time::Duration;

use canvas::camera::Point;
use canvas::doc::Cursor;
use tokio::time::Instant;
use uuid::Uuid;

use crate::store::AuthUser;

/// Cursor colors, chosen to stay distinct on a light canvas.
pub const CURSOR_PALETTE: [&str; 10] = [
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#14b8a6", "#3b82f6", "#6366f1", "#a855f7", "#ec4899", "#64748b",
];

/// Stable palette color for a user.
#[must_use]
pub fn color_for_user(user_id: Uuid) -> &'static str {
    // FNV-1a over the id bytes.
    let hash = user_id
        .as_bytes()
        .iter()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(*b)).wrapping_mul(0x0100_0193));
    CURSOR_PALETTE[hash as usize % CURSOR_PALETTE.len()]
}

pub struct PresenceBroadcaster {
    board_id: Uuid,
    user_id: Uuid,
    display_name: String,
    color: &'static str,
    throttle: Duration,
    last_sent: Option<Instant>,
    position: Point,
    pending: bool,
}

impl PresenceBroadcaster {
    #[must_use]
    pub fn new(board_id: Uuid, user: &AuthUser, throttle: Duration) -> Self {
        Self {
            board_id,
            user_id: user.id,
            display_name: user.display_name.clone(),
            color: color_for_user(user.id),
            throttle,
            last_sent: None,
            position: Point::default(),
            pending: false,
        }
    }

    #[must_use]
    pub fn color(&self) -> &'static str {
        self.color
    }

    /// Record a canvas-space pointer position. Returns the cursor to write
    /// now, or `None` if the throttle window is still open.
    pub fn on_move(&mut self, position: Point, now: Instant) -> Option<Cursor> {
        self.position = position;
        if self.window_open(now) {
            self.pending = true;
            return None;
        }
        Some(self.send(now))
    }

    /// The pending position, once its throttle window has elapsed.
    pub fn flush_due(&mut self, now: Instant) -> Option<Cursor> {
        if !self.pending || self.window_open(now) {
            return None;
        }
        Some(self.send(now))
    }

    /// When the pending position becomes due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.last_sent.filter(|_| self.pending).map(|t| t + self.throttle)
    }

    /// Final inactive record at the last known position. Drops anything
    /// pending. `None` if no cursor was ever published.
    pub fn leave(&mut self) -> Option<Cursor> {
        self.pending = false;
        self.last_sent.map(|_| self.record(false))
    }

    fn window_open(&self, now: Instant) -> bool {
        self.last_sent.is_some_and(|t| now.saturating_duration_since(t) < self.throttle)
    }

    fn send(&mut self, now: Instant) -> Cursor {
        self.last_sent = Some(now);
        self.pending = false;
        self.record(true)
    }

    fn record(&self, active: bool) -> Cursor {
        Cursor {
            board_id: self.board_id,
            user_id: self.user_id,
            display_name: self.display_name.clone(),
            x: self.position.x,
            y: self.position.y,
            color: self.color.to_owned(),
            active,
        }
    }
}
