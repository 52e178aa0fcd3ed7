//! Circular hitboxes for coarse collision.

#[cfg(test)]
#[path = "hitbox_test.rs"]
mod hitbox_test;

use crate::error::{positive, Result};
use crate::geom::Point;

/// A circle attached to an element, offset from its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    radius: f64,
    offset: Point,
}

impl Hitbox {
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`](crate::error::SceneError::NonPositive)
    /// unless `radius` is positive and finite.
    pub fn new(radius: f64, offset: Point) -> Result<Self> {
        Ok(Self { radius: positive("radius", radius)?, offset })
    }

    /// A hitbox centered on its element.
    ///
    /// # Errors
    ///
    /// See [`Hitbox::new`].
    pub fn centered(radius: f64) -> Result<Self> {
        Self::new(radius, Point::ORIGIN)
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// World position of the circle for an element at `center` turned by `rotation`.
    ///
    /// # Errors
    ///
    /// Fails if the position overflows.
    pub fn world_center(&self, center: Point, rotation: f64) -> Result<Point> {
        center.add(self.offset)?.rotate_around(center, rotation)
    }

    /// Whether two placed circles overlap. Touching circles do not.
    #[must_use]
    pub fn overlaps(a: (Point, f64), b: (Point, f64)) -> bool {
        a.0.distance_to(b.0) < a.1 + b.1
    }
}
