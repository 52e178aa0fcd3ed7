//! Rendering: draws the scene to any [`Surface`].
//!
//! Reads the scene and paints; it never mutates application state. Composite
//! elements draw nothing themselves because their members are top-level
//! elements of the same scene.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use kurbo::Affine;

use crate::consts::{HITBOX_INNER_WIDTH, HITBOX_OUTER_WIDTH};
use crate::element::Element;
use crate::error::{Result, SceneError};
use crate::hit::placement;
use crate::scene::Scene;
use crate::shape::Geometry;
use crate::surface::{Color, Surface, scoped};

/// Draw the whole scene, bottom level first.
///
/// # Errors
///
/// Propagates surface failures.
pub fn draw_scene<S: Surface + ?Sized>(scene: &Scene, surface: &mut S) -> Result<()> {
    // Layer 1: clear under the identity transform.
    surface.set_transform(Affine::IDENTITY)?;
    surface.clear()?;

    // Layer 2: elements in z-order.
    for element in scene.ordered() {
        if element.is_composite() || !scene.is_shown(element.id()) {
            continue;
        }
        draw_element(element, surface)?;
    }
    Ok(())
}

/// Draw one plain element and, if enabled, its hitbox overlay.
///
/// # Errors
///
/// Propagates surface failures.
pub fn draw_element<S: Surface + ?Sized>(element: &Element, surface: &mut S) -> Result<()> {
    scoped(surface, |s| {
        s.set_transform(placement(element))?;
        for drawable in element.drawables() {
            drawable.draw(s)?;
        }
        if element.hitbox_visible {
            draw_hitboxes(element, s)?;
        }
        Ok(())
    })
}

fn draw_hitboxes<S: Surface + ?Sized>(element: &Element, surface: &mut S) -> Result<()> {
    for hitbox in element.hitboxes() {
        let circle = Geometry::circle(hitbox.radius())?;
        scoped(surface, |s| {
            s.translate(hitbox.offset().x(), hitbox.offset().y())?;
            s.stroke(&circle, Color::RED, HITBOX_OUTER_WIDTH)?;
            s.stroke(&circle, Color::GREEN, HITBOX_INNER_WIDTH)?;
            Ok::<(), SceneError>(())
        })?;
    }
    Ok(())
}
