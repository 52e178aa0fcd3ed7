//! Plane geometry: validated points and affine transforms.
//!
//! [`Point`] is the currency of every position in the crate. Its components
//! are always finite; every constructor and arithmetic operation checks the
//! result and fails with [`SceneError::NonFinite`] instead of producing NaN
//! or infinity.
//!
//! Transforms are [`kurbo::Affine`], whose coefficients `[a b c d e f]` are
//! the 2D canvas matrix. A canvas `translate`, `rotate` or `scale` is a
//! post-multiplication: `current * Affine::rotate(angle)`.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use std::fmt;

use kurbo::Affine;

use crate::error::{finite, Result, SceneError};

/// A point (or vector) in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// The origin `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] if either coordinate is NaN or infinite.
    pub fn new(x: f64, y: f64) -> Result<Self> {
        Ok(Self { x: finite("x", x)?, y: finite("y", y)? })
    }

    #[must_use]
    pub fn x(self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(self) -> f64 {
        self.y
    }

    /// Replace the x coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] and leaves the point unchanged if `x` is not finite.
    pub fn set_x(&mut self, x: f64) -> Result<()> {
        self.x = finite("x", x)?;
        Ok(())
    }

    /// Replace the y coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] and leaves the point unchanged if `y` is not finite.
    pub fn set_y(&mut self, y: f64) -> Result<()> {
        self.y = finite("y", y)?;
        Ok(())
    }

    /// Component-wise sum.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] if the sum overflows.
    pub fn add(self, other: Self) -> Result<Self> {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference `self - other`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] if the difference overflows.
    pub fn subtract(self, other: Self) -> Result<Self> {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Rotate this point around `origin` by `angle` radians.
    ///
    /// Positive angles turn clockwise on screen, matching canvas `rotate`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] if `angle` is not finite or the result overflows.
    pub fn rotate_around(self, origin: Self, angle: f64) -> Result<Self> {
        let angle = finite("angle", angle)?;
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - origin.x;
        let dy = self.y - origin.y;
        Self::new(origin.x + cos * dx - sin * dy, origin.y + sin * dx + cos * dy)
    }

    /// Whether `low <= x <= high`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidRange`] if `low > high`.
    pub fn x_within(self, low: f64, high: f64) -> Result<bool> {
        within(self.x, low, high)
    }

    /// Whether `low <= y <= high`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidRange`] if `low > high`.
    pub fn y_within(self, low: f64, high: f64) -> Result<bool> {
        within(self.y, low, high)
    }

    /// Arithmetic mean of a set of points.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::EmptyInput`] when `points` is empty.
    pub fn average(points: &[Self]) -> Result<Self> {
        if points.is_empty() {
            return Err(SceneError::EmptyInput("Point::average"));
        }
        #[allow(clippy::cast_precision_loss)]
        let n = points.len() as f64;
        let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Self::new(sx / n, sy / n)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X: {}, Y: {}", self.x, self.y)
    }
}

fn within(value: f64, low: f64, high: f64) -> Result<bool> {
    if low > high {
        return Err(SceneError::InvalidRange { low, high });
    }
    Ok(low <= value && value <= high)
}

/// Inverse of `transform`, or `None` when it is singular or not finite.
#[must_use]
pub fn invert(transform: Affine) -> Option<Affine> {
    let det = transform.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some(transform.inverse())
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}
