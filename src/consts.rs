//! Shared numeric constants for the playfield crate.

// ── Timers ──────────────────────────────────────────────────────

/// Default period of the render/animate loop, in milliseconds.
pub const DEFAULT_FRAME_INTERVAL_MS: u32 = 30;

/// Default period of the pointer-hold repeat timer, in milliseconds.
pub const DEFAULT_HOLD_INTERVAL_MS: u32 = 25;

/// Default period of the key-hold repeat loop, in milliseconds.
pub const DEFAULT_KEY_HOLD_INTERVAL_MS: u32 = 30;

// ── Geometry ────────────────────────────────────────────────────

/// Segment count used when an oval outline is flattened into a polygon.
pub const OVAL_SEGMENTS: usize = 64;

// ── Debug overlay ───────────────────────────────────────────────

/// Outer stroke width of a visible hitbox circle.
pub const HITBOX_OUTER_WIDTH: f64 = 4.0;

/// Inner stroke width of a visible hitbox circle.
pub const HITBOX_INNER_WIDTH: f64 = 2.0;

// ── Text ────────────────────────────────────────────────────────

/// Font used by text drawables that do not name one.
pub const DEFAULT_FONT: &str = "20px arial";
