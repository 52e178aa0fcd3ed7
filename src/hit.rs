//! Pixel-accurate hit-testing of elements.
//!
//! Each drawable is painted alone onto a scratch surface under the element's
//! placement and the alpha under the pointer decides. Elements are tested
//! top-most first, so the pick agrees with what the user sees.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use kurbo::Affine;

use crate::element::{Element, ElementId};
use crate::error::Result;
use crate::geom::Point;
use crate::scene::Scene;
use crate::surface::{Surface, scoped};

/// Canvas transform of an element: translate to its center, then rotate.
#[must_use]
pub fn placement(element: &Element) -> Affine {
    Affine::translate(kurbo::Point::from(element.center()).to_vec2()) * Affine::rotate(element.rotation())
}

/// Whether `point` (canvas space) lands on a painted pixel of the element.
///
/// Hidden elements are never hit. A composite is hit when any member is.
/// The scratch surface's transform is left as it was.
///
/// # Errors
///
/// [`SceneError::UnknownElement`](crate::error::SceneError::UnknownElement)
/// for unknown ids, or surface failures.
pub fn element_is_inside<S: Surface + ?Sized>(
    scene: &Scene,
    id: ElementId,
    point: Point,
    scratch: &mut S,
) -> Result<bool> {
    let element = scene.element(id)?;
    if !element.visible {
        return Ok(false);
    }
    if element.is_composite() {
        for membership in element.members() {
            if element_is_inside(scene, membership.element, point, scratch)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }
    scoped(scratch, |s| {
        s.set_transform(placement(element))?;
        for drawable in element.drawables() {
            if drawable.is_inside(point, s)? {
                return Ok(true);
            }
        }
        Ok(false)
    })
}

/// The top-most pick target under `point`, if any.
///
/// Elements that are not pick targets are skipped.
///
/// # Errors
///
/// Propagates surface failures.
pub fn element_at<S: Surface + ?Sized>(scene: &Scene, point: Point, scratch: &mut S) -> Result<Option<ElementId>> {
    for element in scene.ordered().rev() {
        if !element.interaction.is_pick_target() || !scene.is_shown(element.id()) {
            continue;
        }
        if element_is_inside(scene, element.id(), point, scratch)? {
            return Ok(Some(element.id()));
        }
    }
    Ok(None)
}
