//! Software RGBA surface.
//!
//! `RasterSurface` implements [`Surface`] in memory. It is the scratch
//! context for pixel hit-testing off-browser and the target of every pixel
//! test in this crate.
//!
//! Painting works by inverse mapping: the device-space bounding box of the
//! primitive is computed through the current transform, and each pixel in it
//! is sampled at its center, mapped back into local space and tested against
//! the primitive. Coverage is binary (no antialiasing). Colors composite with
//! source-over. The surface remembers the area painted since the last clear so
//! that clearing after a probe only touches those pixels.
//!
//! There is no font rasterizer; `fill_text` leaves no pixels.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use std::ops::Range;
use std::rc::Rc;

use kurbo::Affine;

use crate::asset::Bitmap;
use crate::geom::invert;
use crate::shape::Geometry;
use crate::surface::{Color, Rect, Surface, SurfaceError};

/// Device-space pixel box: `x0..x1`, `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelBox {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl PixelBox {
    fn union(self, other: Self) -> Self {
        Self { x0: self.x0.min(other.x0), y0: self.y0.min(other.y0), x1: self.x1.max(other.x1), y1: self.y1.max(other.y1) }
    }
}

/// In-memory RGBA surface with a canvas-style transform stack.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    current: Affine,
    stack: Vec<Affine>,
    dirty: Option<PixelBox>,
}

impl RasterSurface {
    /// A transparent surface of `width × height` pixels.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            current: Affine::IDENTITY,
            stack: Vec::new(),
            dirty: None,
        }
    }

    /// RGBA of the device pixel at `(x, y)`, or `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x as usize, y as usize);
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Number of pixels with non-zero alpha.
    #[must_use]
    pub fn covered_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    fn index(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * 4
    }

    /// Device-space pixel box covering the local rectangle `(x0, y0)..(x1, y1)`,
    /// clipped to the surface.
    fn device_box(&self, local: (f64, f64, f64, f64)) -> Option<PixelBox> {
        let (x0, y0, x1, y1) = local;
        let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)].map(|(x, y)| self.current * kurbo::Point::new(x, y));
        let (min_x, min_y, max_x, max_y) = corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(a, b, c, d), p| (a.min(p.x), b.min(p.y), c.max(p.x), d.max(p.y)),
        );
        let xs = pixel_span(min_x, max_x, self.width)?;
        let ys = pixel_span(min_y, max_y, self.height)?;
        Some(PixelBox { x0: xs.start, y0: ys.start, x1: xs.end, y1: ys.end })
    }

    /// Paint every pixel in the device box of `local_bounds` whose center maps
    /// to a local point accepted by `sample`.
    fn paint<F>(&mut self, local_bounds: (f64, f64, f64, f64), mut sample: F)
    where
        F: FnMut(f64, f64) -> Option<[u8; 4]>,
    {
        let Some(inverse) = invert(self.current) else {
            return;
        };
        let Some(area) = self.device_box(local_bounds) else {
            return;
        };
        for py in area.y0..area.y1 {
            for px in area.x0..area.x1 {
                #[allow(clippy::cast_precision_loss)]
                let local = inverse * kurbo::Point::new(px as f64 + 0.5, py as f64 + 0.5);
                if let Some(src) = sample(local.x, local.y) {
                    let i = self.index(px, py);
                    blend(&mut self.pixels[i..i + 4], src);
                }
            }
        }
        self.dirty = Some(self.dirty.map_or(area, |d| d.union(area)));
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    /// Resizing resets the transform stack, like assigning canvas dimensions.
    fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    fn save(&mut self) {
        self.stack.push(self.current);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.current = t;
        }
    }

    fn transform(&self) -> Affine {
        self.current
    }

    fn set_transform(&mut self, transform: Affine) -> Result<(), SurfaceError> {
        self.current = transform;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        if let Some(area) = self.dirty.take() {
            for py in area.y0..area.y1 {
                let start = self.index(area.x0, py);
                let end = self.index(area.x1, py);
                self.pixels[start..end].fill(0);
            }
        }
        Ok(())
    }

    fn alpha_at(&self, x: i64, y: i64) -> Result<u8, SurfaceError> {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return Ok(0);
        };
        Ok(self.pixel(x, y).map_or(0, |px| px[3]))
    }

    fn fill(&mut self, geometry: &Geometry, color: Color) -> Result<(), SurfaceError> {
        if color.a == 0 {
            return Ok(());
        }
        let rgba = [color.r, color.g, color.b, color.a];
        self.paint(geometry.bounds(), |x, y| geometry.fill_contains(x, y).then_some(rgba));
        Ok(())
    }

    fn stroke(&mut self, geometry: &Geometry, color: Color, line_width: f64) -> Result<(), SurfaceError> {
        if color.a == 0 || line_width <= 0.0 {
            return Ok(());
        }
        let rgba = [color.r, color.g, color.b, color.a];
        let half = line_width / 2.0;
        let (x0, y0, x1, y1) = geometry.bounds();
        let padded = (x0 - half, y0 - half, x1 + half, y1 + half);
        self.paint(padded, |x, y| geometry.stroke_contains(x, y, line_width).then_some(rgba));
        Ok(())
    }

    fn draw_image(&mut self, image: &Rc<Bitmap>, src: Rect, dest: Rect) -> Result<(), SurfaceError> {
        if dest.width == 0.0 || dest.height == 0.0 {
            return Ok(());
        }
        let bounds = (dest.x, dest.y, dest.x + dest.width, dest.y + dest.height);
        self.paint(bounds, |x, y| {
            let u = (x - dest.x) / dest.width;
            let v = (y - dest.y) / dest.height;
            if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                return None;
            }
            let (bx, by) = (src.x + u * src.width, src.y + v * src.height);
            if bx < 0.0 || by < 0.0 {
                return None;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (bx, by) = (bx.floor() as u32, by.floor() as u32);
            image.pixel(bx, by).filter(|px| px[3] != 0)
        });
        Ok(())
    }

    fn fill_text(&mut self, _text: &str, _font: &str, _color: Color) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Pixel indices whose centers can fall in `lo..=hi`, clipped to `0..limit`.
fn pixel_span(lo: f64, hi: f64, limit: u32) -> Option<Range<usize>> {
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let lo = lo.floor().max(0.0);
    let hi = hi.ceil().min(f64::from(limit));
    if lo >= hi {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let span = lo as usize..hi as usize;
    Some(span)
}

/// Source-over composite of a non-premultiplied `src` onto `dst`.
fn blend(dst: &mut [u8], src: [u8; 4]) {
    if src[3] == 255 || dst[3] == 0 {
        dst.copy_from_slice(&src);
        return;
    }
    let sa = f64::from(src[3]) / 255.0;
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let mixed = (f64::from(src[c]) * sa + f64::from(dst[c]) * da * (1.0 - sa)) / out_a;
        dst[c] = channel(mixed);
    }
    dst[3] = channel(out_a * 255.0);
}

fn channel(value: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let v = value.round().clamp(0.0, 255.0) as u8;
    v
}
