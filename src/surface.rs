//! The rendering-surface contract shared by the visible canvas and the
//! scratch context used for hit-testing.
//!
//! A surface carries a transform stack with canvas semantics
//! (`save`/`restore`/`set_transform`/`translate`/`rotate`/`scale`) and a
//! small set of paint operations. Every paint operation draws in the local
//! space of the current transform. [`Surface::alpha_at`] reads back a single
//! device pixel, ignoring the transform; pixel hit-testing is built on it.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use std::rc::Rc;

use kurbo::Affine;

use crate::asset::Bitmap;
use crate::shape::Geometry;

/// Error raised by a surface backend (for example a rejected canvas call).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("surface operation failed: {0}")]
pub struct SurfaceError(pub String);

/// A non-premultiplied RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 128, 0);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[must_use]
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.strip_prefix('#')?;
        let digit = |i: usize| hex_value(hex.get(i..=i)?);
        let pair = |i: usize| hex_value(hex.get(i..i + 2)?);
        match hex.len() {
            3 => Some(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// CSS `rgba(...)` notation, as accepted by canvas style setters.
    #[must_use]
    pub fn to_css(self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, f64::from(self.a) / 255.0)
    }
}

fn hex_value(digits: &str) -> Option<u8> {
    match u8::from_str_radix(digits, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

/// Horizontal/vertical rectangle used for image source and destination areas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// A `width × height` rectangle centered on the origin.
    #[must_use]
    pub fn centered(width: f64, height: f64) -> Self {
        Self { x: -width / 2.0, y: -height / 2.0, width, height }
    }
}

/// A 2D drawing target with a canvas-style transform stack.
pub trait Surface {
    /// Width in device pixels.
    fn width(&self) -> u32;

    /// Height in device pixels.
    fn height(&self) -> u32;

    /// Resize the backing store. Contents are discarded.
    fn resize(&mut self, width: u32, height: u32);

    /// Push the current transform.
    fn save(&mut self);

    /// Pop the transform pushed by the matching [`Surface::save`]. Unbalanced
    /// restores are ignored, like the canvas.
    fn restore(&mut self);

    /// The current transform.
    fn transform(&self) -> Affine;

    /// Replace the current transform.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the backend rejects the matrix.
    fn set_transform(&mut self, transform: Affine) -> Result<(), SurfaceError>;

    /// Post-multiply a translation.
    ///
    /// # Errors
    ///
    /// Propagates [`Surface::set_transform`] failures.
    fn translate(&mut self, tx: f64, ty: f64) -> Result<(), SurfaceError> {
        let t = self.transform() * Affine::translate((tx, ty));
        self.set_transform(t)
    }

    /// Post-multiply a rotation in radians.
    ///
    /// # Errors
    ///
    /// Propagates [`Surface::set_transform`] failures.
    fn rotate(&mut self, angle: f64) -> Result<(), SurfaceError> {
        let t = self.transform() * Affine::rotate(angle);
        self.set_transform(t)
    }

    /// Post-multiply a scale.
    ///
    /// # Errors
    ///
    /// Propagates [`Surface::set_transform`] failures.
    fn scale(&mut self, sx: f64, sy: f64) -> Result<(), SurfaceError> {
        let t = self.transform() * Affine::scale_non_uniform(sx, sy);
        self.set_transform(t)
    }

    /// Clear every pixel to transparent, regardless of the current transform.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the backend rejects the call.
    fn clear(&mut self) -> Result<(), SurfaceError>;

    /// Alpha of the device pixel at `(x, y)`. Pixels outside the surface read as 0.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the pixel data cannot be read.
    fn alpha_at(&self, x: i64, y: i64) -> Result<u8, SurfaceError>;

    /// Fill the interior of `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the backend rejects the path.
    fn fill(&mut self, geometry: &Geometry, color: Color) -> Result<(), SurfaceError>;

    /// Stroke the outline of `geometry` with a line `line_width` units wide.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the backend rejects the path.
    fn stroke(&mut self, geometry: &Geometry, color: Color, line_width: f64) -> Result<(), SurfaceError>;

    /// Draw the `src` area of `image` into the `dest` area of local space.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the backend cannot draw the bitmap.
    fn draw_image(&mut self, image: &Rc<Bitmap>, src: Rect, dest: Rect) -> Result<(), SurfaceError>;

    /// Draw `text` centered on the local origin.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the backend rejects the call.
    fn fill_text(&mut self, text: &str, font: &str, color: Color) -> Result<(), SurfaceError>;
}

/// Run `f` between a [`Surface::save`] and its matching [`Surface::restore`].
///
/// The restore happens whether or not `f` fails.
///
/// # Errors
///
/// Returns whatever `f` returns.
pub fn scoped<S, T, E, F>(surface: &mut S, f: F) -> Result<T, E>
where
    S: Surface + ?Sized,
    F: FnOnce(&mut S) -> Result<T, E>,
{
    surface.save();
    let result = f(surface);
    surface.restore();
    result
}
