//! Asynchronously resolved assets.
//!
//! An [`Asset`] is a shared handle whose state starts as
//! [`AssetState::Loading`] and is resolved exactly once by a loader (see
//! `web::load_image`). Drawables check the state at every use and paint
//! nothing until the asset is ready, so a scene can be built and drawn before
//! its images arrive.

#[cfg(test)]
#[path = "asset_test.rs"]
mod asset_test;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// Load state of an asset.
#[derive(Debug)]
pub enum AssetState<T> {
    Loading,
    Ready(Rc<T>),
    Failed(String),
}

/// Shared handle to an asset that may still be loading.
///
/// Clones share the same state; resolving one resolves them all.
pub struct Asset<T> {
    state: Rc<RefCell<AssetState<T>>>,
}

impl<T> Clone for Asset<T> {
    fn clone(&self) -> Self {
        Self { state: Rc::clone(&self.state) }
    }
}

impl<T> fmt::Debug for Asset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.state.borrow() {
            AssetState::Loading => "loading",
            AssetState::Ready(_) => "ready",
            AssetState::Failed(_) => "failed",
        };
        f.debug_struct("Asset").field("state", &state).finish()
    }
}

impl<T> Asset<T> {
    /// A handle that has not been resolved yet.
    #[must_use]
    pub fn loading() -> Self {
        Self { state: Rc::new(RefCell::new(AssetState::Loading)) }
    }

    /// A handle that is ready immediately.
    #[must_use]
    pub fn ready(value: T) -> Self {
        Self { state: Rc::new(RefCell::new(AssetState::Ready(Rc::new(value)))) }
    }

    /// The loaded value, or `None` while loading or after a failure.
    #[must_use]
    pub fn get(&self) -> Option<Rc<T>> {
        match &*self.state.borrow() {
            AssetState::Ready(value) => Some(Rc::clone(value)),
            AssetState::Loading | AssetState::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), AssetState::Loading)
    }

    /// The failure message, if loading failed.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        match &*self.state.borrow() {
            AssetState::Failed(reason) => Some(reason.clone()),
            AssetState::Loading | AssetState::Ready(_) => None,
        }
    }

    /// Resolve the asset with its value.
    pub fn resolve(&self, value: T) {
        self.settle(AssetState::Ready(Rc::new(value)));
    }

    /// Mark the asset as failed.
    pub fn fail(&self, reason: impl Into<String>) {
        self.settle(AssetState::Failed(reason.into()));
    }

    fn settle(&self, next: AssetState<T>) {
        match self.state.try_borrow_mut() {
            Ok(mut state) => *state = next,
            Err(e) => tracing::warn!(error = %e, "asset is borrowed; state change dropped"),
        }
    }
}

/// Decoded RGBA pixel data, row-major, four bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Wrap raw RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] if the buffer length is not
    /// `width * height * 4` or either side is zero.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidGeometry(format!("bitmap size {width}x{height} is empty")));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(SceneError::InvalidGeometry(format!(
                "bitmap {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// A bitmap filled with one RGBA value.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] if either side is zero.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self::from_rgba(width, height, pixels)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA of the pixel at `(x, y)`, or `None` outside the bitmap.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }
}

/// Sprite-sheet metadata: frames laid out left to right in one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMeta {
    pub frame_count: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl SheetMeta {
    /// Parse and validate metadata such as
    /// `{"frame_count": 8, "frame_width": 32, "frame_height": 32}`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::SheetMeta`] if the JSON is malformed or any field is zero.
    pub fn from_json(raw: &str) -> Result<Self> {
        let meta: Self = serde_json::from_str(raw).map_err(|e| SceneError::SheetMeta(e.to_string()))?;
        meta.validate()?;
        Ok(meta)
    }

    /// # Errors
    ///
    /// Returns [`SceneError::SheetMeta`] naming the first zero field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("frame_count", self.frame_count),
            ("frame_width", self.frame_width),
            ("frame_height", self.frame_height),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(SceneError::SheetMeta(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}
