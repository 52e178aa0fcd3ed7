use std::f64::consts::FRAC_PI_2;

use super::*;
use crate::element::{Element, ElementAttrs, Interaction};

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y).unwrap()
}

fn close(a: Point, b: Point) -> bool {
    a.distance_to(b) < 1e-9
}

fn setup() -> (Scene, ElementId, ElementId) {
    let mut scene = Scene::new();
    let comp = scene.insert(Element::composite(ElementAttrs::named("group")).unwrap()).unwrap();
    let attrs = ElementAttrs {
        center: pt(10.0, 0.0),
        interaction: Interaction { clickable: true, draggable: true, pressable: true, holdable: true, ..Interaction::default() },
        ..ElementAttrs::named("part")
    };
    let part = scene.insert(Element::new(attrs).unwrap()).unwrap();
    (scene, comp, part)
}

// =============================================================
// Membership
// =============================================================

#[test]
fn joining_mutes_click_drag_and_press() {
    let (mut scene, comp, part) = setup();
    scene.add_member(comp, part).unwrap();
    let flags = scene.element(part).unwrap().interaction;
    assert!(!flags.clickable && !flags.draggable && !flags.pressable);
    assert!(flags.holdable);
}

#[test]
fn leaving_restores_flags() {
    let (mut scene, comp, part) = setup();
    scene.add_member(comp, part).unwrap();
    scene.remove_member(comp, part).unwrap();
    let flags = scene.element(part).unwrap().interaction;
    assert!(flags.clickable && flags.draggable && flags.pressable);
}

#[test]
fn joining_twice_is_rejected() {
    let (mut scene, comp, part) = setup();
    scene.add_member(comp, part).unwrap();
    assert_eq!(scene.add_member(comp, part).unwrap_err(), SceneError::AlreadyMember { composite: comp, member: part });
}

#[test]
fn removing_non_member_is_rejected() {
    let (mut scene, comp, part) = setup();
    assert_eq!(scene.remove_member(comp, part).unwrap_err(), SceneError::NotMember { composite: comp, member: part });
}

#[test]
fn plain_element_cannot_take_members() {
    let (mut scene, comp, part) = setup();
    assert_eq!(scene.add_member(part, comp).unwrap_err(), SceneError::NotComposite(part));
    assert_eq!(scene.members(part).unwrap_err(), SceneError::NotComposite(part));
}

#[test]
fn composite_cannot_contain_itself() {
    let (mut scene, comp, _) = setup();
    assert!(matches!(scene.add_member(comp, comp), Err(SceneError::MembershipCycle { .. })));
}

#[test]
fn nested_cycle_is_rejected() {
    let (mut scene, outer, _) = setup();
    let inner = scene.insert(Element::composite(ElementAttrs::named("inner")).unwrap()).unwrap();
    scene.add_member(outer, inner).unwrap();
    assert!(matches!(scene.add_member(inner, outer), Err(SceneError::MembershipCycle { .. })));
}

#[test]
fn unknown_member_is_rejected() {
    let (mut scene, comp, _) = setup();
    let ghost = ElementId::new_v4();
    assert_eq!(scene.add_member(comp, ghost).unwrap_err(), SceneError::UnknownElement(ghost));
}

#[test]
fn add_members_is_all_or_nothing() {
    let (mut scene, comp, part) = setup();
    let err = scene.add_members(comp, &[part, part]).unwrap_err();
    assert!(matches!(err, SceneError::AlreadyMember { .. }));
    assert!(scene.members(comp).unwrap().is_empty());
    assert!(scene.element(part).unwrap().interaction.clickable);
}

#[test]
fn reset_releases_members_and_listeners() {
    let (mut scene, comp, part) = setup();
    scene.add_member(comp, part).unwrap();
    scene.element_mut(comp).unwrap().on_click(|_, _| {});
    scene.reset_composite(comp).unwrap();
    assert!(scene.members(comp).unwrap().is_empty());
    assert!(scene.element(part).unwrap().interaction.clickable);
    assert!(scene.element_mut(comp).unwrap().due(crate::listener::EventKind::Click, None).is_empty());
}

// =============================================================
// Rotation
// =============================================================

#[test]
fn rotate_members_turns_centers_and_orientation() {
    let (mut scene, comp, part) = setup();
    scene.add_member(comp, part).unwrap();
    scene.rotate_members(comp, Point::ORIGIN, FRAC_PI_2, false).unwrap();
    let el = scene.element(part).unwrap();
    assert!(close(el.center(), pt(0.0, 10.0)));
    assert!((el.rotation() - FRAC_PI_2).abs() < 1e-12);
}

#[test]
fn rotate_members_can_keep_orientation() {
    let (mut scene, comp, part) = setup();
    scene.add_member(comp, part).unwrap();
    scene.rotate_members(comp, Point::ORIGIN, FRAC_PI_2, true).unwrap();
    let el = scene.element(part).unwrap();
    assert!(close(el.center(), pt(0.0, 10.0)));
    assert!(el.rotation().abs() < f64::EPSILON);
}

#[test]
fn rotating_nested_composite_carries_its_members() {
    let (mut scene, outer, part) = setup();
    let inner = scene
        .insert(Element::composite(ElementAttrs { center: pt(10.0, 0.0), ..ElementAttrs::named("inner") }).unwrap())
        .unwrap();
    scene.add_member(inner, part).unwrap();
    scene.add_member(outer, inner).unwrap();
    scene.rotate_members(outer, Point::ORIGIN, FRAC_PI_2, true).unwrap();
    assert!(close(scene.element(inner).unwrap().center(), pt(0.0, 10.0)));
    assert!(close(scene.element(part).unwrap().center(), pt(0.0, 10.0)));
}
