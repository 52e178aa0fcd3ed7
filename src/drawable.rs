//! Drawables: the visual leaves of an element.
//!
//! A drawable sits at an offset from its element's center with its own
//! rotation and scale. All four kinds share one draw routine and one pixel
//! hit-test; only [`Drawable::paint`] looks at the kind.

#[cfg(test)]
#[path = "drawable_test.rs"]
mod drawable_test;

use kurbo::Affine;

use crate::asset::{Asset, Bitmap, SheetMeta};
use crate::consts::DEFAULT_FONT;
use crate::error::{finite, positive, Result, SceneError};
use crate::geom::Point;
use crate::shape::Shape;
use crate::surface::{scoped, Color, Rect, Surface};

/// An animated sprite cut from a horizontal strip of equal frames.
#[derive(Debug, Clone)]
pub struct Sprite {
    sheet: Asset<Bitmap>,
    meta: Asset<SheetMeta>,
    current_frame: u32,
    /// Ticks skipped between frame advances.
    stagger: u32,
    counter: u32,
}

impl Sprite {
    #[must_use]
    pub fn new(sheet: Asset<Bitmap>, meta: Asset<SheetMeta>, stagger: u32) -> Self {
        Self { sheet, meta, current_frame: 0, stagger, counter: 0 }
    }

    #[must_use]
    pub fn sheet(&self) -> &Asset<Bitmap> {
        &self.sheet
    }

    #[must_use]
    pub fn meta(&self) -> &Asset<SheetMeta> {
        &self.meta
    }

    #[must_use]
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    #[must_use]
    pub fn stagger(&self) -> u32 {
        self.stagger
    }

    /// Advance one animation tick. The frame moves after `stagger` skipped
    /// ticks and wraps at the frame count. Nothing happens until the
    /// metadata is ready.
    pub fn tick(&mut self) {
        let Some(meta) = self.meta.get() else {
            return;
        };
        if self.counter >= self.stagger {
            self.current_frame = (self.current_frame + 1) % meta.frame_count.max(1);
            self.counter = 0;
        } else {
            self.counter += 1;
        }
    }
}

/// What a drawable paints.
#[derive(Debug, Clone)]
pub enum DrawableKind {
    Shape(Shape),
    /// Text centered on the drawable's origin. Never hit-tests.
    Text { text: String, font: String, color: Color },
    Image(Asset<Bitmap>),
    Sprite(Sprite),
}

impl DrawableKind {
    /// Text in the default font.
    #[must_use]
    pub fn text(text: impl Into<String>, color: Color) -> Self {
        Self::Text { text: text.into(), font: DEFAULT_FONT.to_owned(), color }
    }
}

/// Placement and presentation attributes shared by every kind.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawableAttrs {
    pub name: Option<String>,
    pub level: i32,
    pub dx: f64,
    pub dy: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: f64,
    pub h_scale: f64,
    pub v_scale: f64,
    pub visible: bool,
}

impl Default for DrawableAttrs {
    fn default() -> Self {
        Self {
            name: None,
            level: 0,
            dx: 0.0,
            dy: 0.0,
            width: None,
            height: None,
            rotation: 0.0,
            h_scale: 1.0,
            v_scale: 1.0,
            visible: true,
        }
    }
}

impl DrawableAttrs {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }
}

/// A positioned visual leaf owned by one element.
#[derive(Debug, Clone)]
pub struct Drawable {
    name: Option<String>,
    level: i32,
    offset: Point,
    width: Option<f64>,
    height: Option<f64>,
    rotation: f64,
    h_scale: f64,
    v_scale: f64,
    visible: bool,
    kind: DrawableKind,
}

impl Drawable {
    /// # Errors
    ///
    /// Fails if an offset or rotation is not finite, a scale factor is zero or
    /// not finite, or an explicit size is not positive.
    pub fn new(kind: DrawableKind, attrs: DrawableAttrs) -> Result<Self> {
        let mut drawable = Self {
            name: attrs.name,
            level: attrs.level,
            offset: Point::new(attrs.dx, attrs.dy)?,
            width: None,
            height: None,
            rotation: finite("rotation", attrs.rotation)?,
            h_scale: 1.0,
            v_scale: 1.0,
            visible: attrs.visible,
            kind,
        };
        drawable.set_scale(attrs.h_scale, attrs.v_scale)?;
        drawable.set_size(attrs.width, attrs.height)?;
        Ok(drawable)
    }

    /// A drawable with default attributes.
    ///
    /// # Errors
    ///
    /// See [`Drawable::new`].
    pub fn from_kind(kind: DrawableKind) -> Result<Self> {
        Self::new(kind, DrawableAttrs::default())
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    #[must_use]
    pub fn level(&self) -> i32 {
        self.level
    }

    pub(crate) fn set_level(&mut self, level: i32) {
        self.level = level;
    }

    /// Offset from the element center, in the element's rotated frame.
    #[must_use]
    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] if `rotation` is not finite.
    pub fn set_rotation(&mut self, rotation: f64) -> Result<()> {
        self.rotation = finite("rotation", rotation)?;
        Ok(())
    }

    #[must_use]
    pub fn scale(&self) -> (f64, f64) {
        (self.h_scale, self.v_scale)
    }

    /// Set the horizontal and vertical scale. Negative factors mirror.
    ///
    /// # Errors
    ///
    /// Fails if either factor is zero or not finite.
    pub fn set_scale(&mut self, h_scale: f64, v_scale: f64) -> Result<()> {
        let h = nonzero("h_scale", h_scale)?;
        let v = nonzero("v_scale", v_scale)?;
        self.h_scale = h;
        self.v_scale = v;
        Ok(())
    }

    /// Set or clear the explicit draw size.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] for a zero or negative dimension.
    pub fn set_size(&mut self, width: Option<f64>, height: Option<f64>) -> Result<()> {
        let width = width.map(|w| positive("width", w)).transpose()?;
        let height = height.map(|h| positive("height", h)).transpose()?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[must_use]
    pub fn kind(&self) -> &DrawableKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut DrawableKind {
        &mut self.kind
    }

    /// Draw size: the explicit size where set, otherwise the bitmap or frame
    /// size once the asset is ready. `None` for shapes and text without an
    /// explicit size, and for assets still loading.
    #[must_use]
    pub fn size(&self) -> Option<(f64, f64)> {
        let natural = match &self.kind {
            DrawableKind::Image(image) => {
                image.get().map(|b| (f64::from(b.width()), f64::from(b.height())))
            }
            DrawableKind::Sprite(sprite) => {
                sprite.meta.get().map(|m| (f64::from(m.frame_width), f64::from(m.frame_height)))
            }
            DrawableKind::Shape(_) | DrawableKind::Text { .. } => None,
        };
        match (self.width, self.height, natural) {
            (Some(w), Some(h), _) => Some((w, h)),
            (w, h, Some((nw, nh))) => Some((w.unwrap_or(nw), h.unwrap_or(nh))),
            _ => None,
        }
    }

    /// `translate(dx, dy) · rotate(rotation) · scale(h_scale, v_scale)`.
    #[must_use]
    pub fn local_transform(&self) -> Affine {
        Affine::translate((self.offset.x(), self.offset.y()))
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.h_scale, self.v_scale)
    }

    /// Paint the drawable in the surface's current local space, ignoring
    /// placement and visibility. Unready assets paint nothing.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn paint<S: Surface + ?Sized>(&self, surface: &mut S) -> Result<()> {
        match &self.kind {
            DrawableKind::Shape(shape) => {
                if let Some(color) = shape.fill() {
                    surface.fill(shape.geometry(), color)?;
                }
                if let Some(stroke) = shape.stroke() {
                    surface.stroke(shape.geometry(), stroke.color, stroke.width)?;
                }
            }
            DrawableKind::Text { text, font, color } => surface.fill_text(text, font, *color)?,
            DrawableKind::Image(image) => {
                if let (Some(bitmap), Some((w, h))) = (image.get(), self.size()) {
                    let src = Rect::new(0.0, 0.0, f64::from(bitmap.width()), f64::from(bitmap.height()));
                    surface.draw_image(&bitmap, src, Rect::centered(w, h))?;
                }
            }
            DrawableKind::Sprite(sprite) => {
                if let (Some(sheet), Some(meta), Some((w, h))) = (sprite.sheet.get(), sprite.meta.get(), self.size()) {
                    let fw = f64::from(meta.frame_width);
                    let src = Rect::new(f64::from(sprite.current_frame) * fw, 0.0, fw, f64::from(meta.frame_height));
                    surface.draw_image(&sheet, src, Rect::centered(w, h))?;
                }
            }
        }
        Ok(())
    }

    /// Draw under the local transform if visible. The surface transform is
    /// restored afterwards.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) -> Result<()> {
        if !self.visible {
            return Ok(());
        }
        scoped(surface, |s| {
            let t = s.transform() * self.local_transform();
            s.set_transform(t)?;
            self.paint(s)
        })
    }

    /// Pixel hit-test against the scratch surface.
    ///
    /// `point` is in the coordinate space of the scratch surface's current
    /// transform parent (the canvas), so no inverse mapping is needed: the
    /// drawable is painted alone and the alpha under `point` decides.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn is_inside<S: Surface + ?Sized>(&self, point: Point, scratch: &mut S) -> Result<bool> {
        if !self.visible || matches!(self.kind, DrawableKind::Text { .. }) {
            return Ok(false);
        }
        scratch.clear()?;
        self.draw(scratch)?;
        #[allow(clippy::cast_possible_truncation)]
        let (x, y) = (point.x().floor() as i64, point.y().floor() as i64);
        Ok(scratch.alpha_at(x, y)? != 0)
    }

    /// Advance sprite animation by one tick. Other kinds are static.
    pub fn animate(&mut self) {
        if let DrawableKind::Sprite(sprite) = &mut self.kind {
            sprite.tick();
        }
    }
}

fn nonzero(field: &'static str, value: f64) -> Result<f64> {
    let value = finite(field, value)?;
    if value == 0.0 { Err(SceneError::NonPositive { field, value }) } else { Ok(value) }
}
