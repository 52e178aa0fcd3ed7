//! Vector shapes: validated geometry plus fill and stroke styling.
//!
//! Every geometry lives in the local space of its drawable. Rectangles and
//! ovals are centered on the local origin; polygons and lines use their
//! points as given. Curved outlines are flattened into polygons of
//! [`OVAL_SEGMENTS`] edges before they are rasterized or stroked.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use std::f64::consts::TAU;

use crate::consts::OVAL_SEGMENTS;
use crate::error::{finite, positive, Result, SceneError};
use crate::geom::Point;
use crate::surface::Color;

/// The outline of a shape in local space.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Axis-aligned rectangle centered on the origin.
    Rectangle { width: f64, height: f64 },
    /// Ellipse centered on the origin.
    Oval { rx: f64, ry: f64 },
    /// Closed polygon, filled with the nonzero winding rule.
    Polygon(Vec<Point>),
    /// Open polyline. Lines are stroked only.
    Line(Vec<Point>),
}

impl Geometry {
    /// A validated rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] unless both sides are positive.
    pub fn rectangle(width: f64, height: f64) -> Result<Self> {
        Ok(Self::Rectangle { width: positive("width", width)?, height: positive("height", height)? })
    }

    /// A validated ellipse.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] unless both radii are positive.
    pub fn oval(rx: f64, ry: f64) -> Result<Self> {
        Ok(Self::Oval { rx: positive("rx", rx)?, ry: positive("ry", ry)? })
    }

    /// A circle of radius `r`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] unless `r` is positive.
    pub fn circle(r: f64) -> Result<Self> {
        Self::oval(r, r)
    }

    /// A closed polygon of at least three points.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] for fewer than three points.
    pub fn polygon(points: Vec<Point>) -> Result<Self> {
        let geometry = Self::Polygon(points);
        geometry.validate()?;
        Ok(geometry)
    }

    /// An open polyline of at least two points.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidGeometry`] for fewer than two points.
    pub fn line(points: Vec<Point>) -> Result<Self> {
        let geometry = Self::Line(points);
        geometry.validate()?;
        Ok(geometry)
    }

    /// Re-check a geometry that may have been built from its variants directly.
    ///
    /// # Errors
    ///
    /// Returns the same errors as the validating constructors.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Rectangle { width, height } => {
                positive("width", *width)?;
                positive("height", *height)?;
            }
            Self::Oval { rx, ry } => {
                positive("rx", *rx)?;
                positive("ry", *ry)?;
            }
            Self::Polygon(points) if points.len() < 3 => {
                return Err(SceneError::InvalidGeometry(format!(
                    "a polygon needs at least 3 points, got {}",
                    points.len()
                )));
            }
            Self::Line(points) if points.len() < 2 => {
                return Err(SceneError::InvalidGeometry(format!(
                    "a line needs at least 2 points, got {}",
                    points.len()
                )));
            }
            Self::Polygon(_) | Self::Line(_) => {}
        }
        Ok(())
    }

    /// Whether the outline joins its last point back to the first.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !matches!(self, Self::Line(_))
    }

    /// Outline vertices in local space. Ovals are flattened.
    #[must_use]
    pub fn outline(&self) -> Vec<(f64, f64)> {
        match self {
            Self::Rectangle { width, height } => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                vec![(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            }
            Self::Oval { rx, ry } => (0..OVAL_SEGMENTS)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let t = TAU * i as f64 / OVAL_SEGMENTS as f64;
                    (rx * t.cos(), ry * t.sin())
                })
                .collect(),
            Self::Polygon(points) | Self::Line(points) => points.iter().map(|p| (p.x(), p.y())).collect(),
        }
    }

    /// Local bounding box as `(min_x, min_y, max_x, max_y)`.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Self::Rectangle { width, height } => (-width / 2.0, -height / 2.0, width / 2.0, height / 2.0),
            Self::Oval { rx, ry } => (-rx, -ry, *rx, *ry),
            Self::Polygon(_) | Self::Line(_) => {
                self.outline().iter().fold(
                    (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                    |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                )
            }
        }
    }

    /// Whether a local-space sample point falls in the filled interior.
    ///
    /// Rectangles are half-open on their right and bottom edges so that
    /// adjacent rectangles never share a sampled pixel.
    #[must_use]
    pub fn fill_contains(&self, x: f64, y: f64) -> bool {
        match self {
            Self::Rectangle { width, height } => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                x >= -hw && x < hw && y >= -hh && y < hh
            }
            Self::Oval { rx, ry } => (x / rx).powi(2) + (y / ry).powi(2) <= 1.0,
            Self::Polygon(_) => winding_number(&self.outline(), x, y) != 0,
            Self::Line(_) => false,
        }
    }

    /// Whether a local-space sample point lies within `line_width / 2` of the outline.
    #[must_use]
    pub fn stroke_contains(&self, x: f64, y: f64, line_width: f64) -> bool {
        let half = line_width / 2.0;
        let outline = self.outline();
        segments(&outline, self.is_closed()).any(|(a, b)| segment_distance(a, b, (x, y)) <= half)
    }
}

/// Stroke style: color and line width in local units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] unless `width` is positive.
    pub fn new(color: Color, width: f64) -> Result<Self> {
        Ok(Self { color, width: positive("line width", width)? })
    }
}

/// A styled vector shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    geometry: Geometry,
    fill: Option<Color>,
    stroke: Option<Stroke>,
}

impl Shape {
    /// Build a shape from validated parts.
    ///
    /// # Errors
    ///
    /// Fails if the geometry is invalid, the stroke width is not positive, or
    /// a line has no stroke to draw.
    pub fn new(geometry: Geometry, fill: Option<Color>, stroke: Option<Stroke>) -> Result<Self> {
        geometry.validate()?;
        if let Some(s) = stroke {
            positive("line width", s.width)?;
        }
        if matches!(geometry, Geometry::Line(_)) && stroke.is_none() {
            return Err(SceneError::InvalidGeometry("a line must have a stroke".into()));
        }
        Ok(Self { geometry, fill, stroke })
    }

    /// A filled shape without outline.
    ///
    /// # Errors
    ///
    /// See [`Shape::new`].
    pub fn filled(geometry: Geometry, color: Color) -> Result<Self> {
        Self::new(geometry, Some(color), None)
    }

    /// An outlined shape without fill.
    ///
    /// # Errors
    ///
    /// See [`Shape::new`].
    pub fn stroked(geometry: Geometry, color: Color, width: f64) -> Result<Self> {
        Self::new(geometry, None, Some(Stroke::new(color, width)?))
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    pub fn fill(&self) -> Option<Color> {
        self.fill
    }

    #[must_use]
    pub fn stroke(&self) -> Option<Stroke> {
        self.stroke
    }

    /// Replace the fill color. Has no visible effect on lines.
    pub fn set_fill(&mut self, fill: Option<Color>) {
        self.fill = fill;
    }

    /// Local bounding box including half the stroke width.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let (x0, y0, x1, y1) = self.geometry.bounds();
        let pad = self.stroke.map_or(0.0, |s| s.width / 2.0);
        (x0 - pad, y0 - pad, x1 + pad, y1 + pad)
    }

    /// Offset every polygon or line point by `(dx, dy)`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] if a moved point overflows.
    pub fn offset_points(&mut self, dx: f64, dy: f64) -> Result<()> {
        let delta = Point::new(finite("dx", dx)?, finite("dy", dy)?)?;
        if let Geometry::Polygon(points) | Geometry::Line(points) = &mut self.geometry {
            let moved = points.iter().map(|p| p.add(delta)).collect::<Result<Vec<_>>>()?;
            *points = moved;
        }
        Ok(())
    }
}

fn segments(outline: &[(f64, f64)], closed: bool) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
    let open = outline.windows(2).map(|w| (w[0], w[1]));
    let closing = match (closed, outline.first(), outline.last()) {
        (true, Some(&first), Some(&last)) if outline.len() > 2 => Some((last, first)),
        _ => None,
    };
    open.chain(closing)
}

/// Distance from `p` to the segment `a`–`b`.
fn segment_distance(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 { 0.0 } else { (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0) };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    (p.0 - cx).hypot(p.1 - cy)
}

/// Nonzero winding number of `outline` around `(x, y)`.
fn winding_number(outline: &[(f64, f64)], x: f64, y: f64) -> i32 {
    let mut winding = 0;
    for (a, b) in segments(outline, true) {
        let cross = (b.0 - a.0) * (y - a.1) - (x - a.0) * (b.1 - a.1);
        if a.1 <= y {
            if b.1 > y && cross > 0.0 {
                winding += 1;
            }
        } else if b.1 <= y && cross < 0.0 {
            winding -= 1;
        }
    }
    winding
}
