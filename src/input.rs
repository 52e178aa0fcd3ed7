//! Input model: keyboard keys and the pointer gesture state machine.
//!
//! `InputState` is the gesture tracked between pointer-down and pointer-up.
//! At most one element is the target of a gesture at any time.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::fmt;

use crate::element::ElementId;
use crate::geom::Point;

/// A keyboard key as reported by the browser (`"ArrowLeft"`, `"a"`, `" "`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub String);

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gesture state between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A draggable element was picked and the pointer has not moved yet.
    Pressed {
        target: ElementId,
        /// Pointer position minus element center at pick time.
        delta: Point,
        /// The element is also holdable and its hold timer is running.
        holding: bool,
    },
    /// A draggable element is following the pointer.
    Dragging { target: ElementId, delta: Point, holding: bool },
    /// A holdable, non-draggable element is pressed.
    Holding { target: ElementId },
}

impl InputState {
    /// The element the current gesture acts on.
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        match *self {
            Self::Idle => None,
            Self::Pressed { target, .. } | Self::Dragging { target, .. } | Self::Holding { target } => Some(target),
        }
    }

    /// Whether the hold timer should be running.
    #[must_use]
    pub fn is_holding(&self) -> bool {
        match *self {
            Self::Idle => false,
            Self::Pressed { holding, .. } | Self::Dragging { holding, .. } => holding,
            Self::Holding { .. } => true,
        }
    }

    /// Whether the pointer has moved since a draggable element was picked.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}
