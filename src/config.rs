//! Dispatcher configuration.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FRAME_INTERVAL_MS, DEFAULT_HOLD_INTERVAL_MS, DEFAULT_KEY_HOLD_INTERVAL_MS};
use crate::error::{Result, SceneError};

/// Timer periods and dispatch policy for a game.
///
/// Every field has a default, so a partial JSON object such as
/// `{"hold_interval_ms": 40}` is a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Period of the render/animate loop.
    pub frame_interval_ms: u32,
    /// Period of the hold repeat timer while a holdable element is pressed.
    pub hold_interval_ms: u32,
    /// Period of the key-hold loop while any key is down.
    pub key_hold_interval_ms: u32,
    /// When `true`, a pointer-down during an active gesture finishes that
    /// gesture and picks again. When `false` the pointer-down is ignored.
    pub repick_while_selected: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            hold_interval_ms: DEFAULT_HOLD_INTERVAL_MS,
            key_hold_interval_ms: DEFAULT_KEY_HOLD_INTERVAL_MS,
            repick_while_selected: false,
        }
    }
}

impl GameConfig {
    /// Parse a configuration from JSON, filling absent fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Config`] if the JSON is malformed or an interval is zero.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| SceneError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every interval is positive.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Config`] naming the first zero interval.
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("frame_interval_ms", self.frame_interval_ms),
            ("hold_interval_ms", self.hold_interval_ms),
            ("key_hold_interval_ms", self.key_hold_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(SceneError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}
