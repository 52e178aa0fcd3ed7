use super::*;
use crate::element::{ElementAttrs, Interaction};
use crate::hitbox::Hitbox;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y).unwrap()
}

fn named(name: &str, level: i32) -> Element {
    Element::new(ElementAttrs { level, ..ElementAttrs::named(name) }).unwrap()
}

fn ball(name: &str, x: f64) -> Element {
    let mut el = Element::new(ElementAttrs { center: pt(x, 0.0), ..ElementAttrs::named(name) }).unwrap();
    el.add_hitbox(Hitbox::centered(5.0).unwrap()).unwrap();
    el
}

fn order(scene: &Scene) -> Vec<&str> {
    scene.ordered().filter_map(Element::name).collect()
}

// =============================================================
// Insertion and lookup
// =============================================================

#[test]
fn insert_then_lookup_by_name() {
    let mut scene = Scene::new();
    let id = scene.insert(named("ship", 0)).unwrap();
    assert_eq!(scene.by_name("ship").unwrap(), id);
    assert_eq!(scene.len(), 1);
    assert!(scene.contains(id));
}

#[test]
fn duplicate_name_is_rejected() {
    let mut scene = Scene::new();
    scene.insert(named("ship", 0)).unwrap();
    let err = scene.insert(named("ship", 1)).unwrap_err();
    assert_eq!(err, SceneError::DuplicateName("ship".into()));
    assert_eq!(scene.len(), 1);
}

#[test]
fn same_element_twice_is_rejected() {
    let mut scene = Scene::new();
    let el = named("ship", 0);
    let again = el.clone();
    scene.insert(el).unwrap();
    assert!(matches!(scene.insert(again), Err(SceneError::AlreadyAdded(_))));
}

#[test]
fn unnamed_elements_never_clash() {
    let mut scene = Scene::new();
    scene.insert(Element::new(ElementAttrs::default()).unwrap()).unwrap();
    scene.insert(Element::new(ElementAttrs::default()).unwrap()).unwrap();
    assert_eq!(scene.len(), 2);
}

#[test]
fn insert_all_is_all_or_nothing() {
    let mut scene = Scene::new();
    let err = scene.insert_all(vec![named("a", 0), named("b", 0), named("a", 0)]).unwrap_err();
    assert_eq!(err, SceneError::DuplicateName("a".into()));
    assert!(scene.is_empty());
    scene.insert_all(vec![named("a", 0), named("b", 0)]).unwrap();
    assert_eq!(scene.len(), 2);
}

#[test]
fn unknown_name_is_not_found() {
    let scene = Scene::new();
    assert_eq!(scene.by_name("ghost").unwrap_err(), SceneError::NotFound("ghost".into()));
}

#[test]
fn unknown_id_errors() {
    let scene = Scene::new();
    let id = ElementId::new_v4();
    assert_eq!(scene.element(id).unwrap_err(), SceneError::UnknownElement(id));
    assert!(scene.get(id).is_none());
}

// =============================================================
// Levels
// =============================================================

#[test]
fn order_follows_level_then_insertion() {
    let mut scene = Scene::new();
    scene.insert(named("b", 1)).unwrap();
    scene.insert(named("a", 0)).unwrap();
    scene.insert(named("c", 1)).unwrap();
    assert_eq!(order(&scene), vec!["a", "b", "c"]);
}

#[test]
fn set_level_resorts_stably() {
    let mut scene = Scene::new();
    let a = scene.insert(named("a", 0)).unwrap();
    scene.insert(named("b", 1)).unwrap();
    scene.insert(named("c", 1)).unwrap();
    scene.set_level(a, 1).unwrap();
    assert_eq!(order(&scene), vec!["a", "b", "c"]);
    scene.set_level(a, 2).unwrap();
    assert_eq!(order(&scene), vec!["b", "c", "a"]);
}

#[test]
fn highest_level_of_empty_scene_is_none() {
    let mut scene = Scene::new();
    assert_eq!(scene.highest_level(), None);
    scene.insert(named("a", -3)).unwrap();
    scene.insert(named("b", 4)).unwrap();
    assert_eq!(scene.highest_level(), Some(4));
}

// =============================================================
// Names and removal
// =============================================================

#[test]
fn rename_checks_uniqueness() {
    let mut scene = Scene::new();
    let a = scene.insert(named("a", 0)).unwrap();
    scene.insert(named("b", 0)).unwrap();
    assert!(scene.rename(a, Some("b".into())).is_err());
    scene.rename(a, Some("a".into())).unwrap();
    scene.rename(a, Some("z".into())).unwrap();
    assert_eq!(scene.by_name("z").unwrap(), a);
}

#[test]
fn pop_by_name_removes() {
    let mut scene = Scene::new();
    scene.insert(named("a", 0)).unwrap();
    let popped = scene.pop_by_name("a").unwrap();
    assert_eq!(popped.name(), Some("a"));
    assert!(scene.is_empty());
    assert!(scene.ids().is_empty());
}

#[test]
fn removed_member_gets_flags_back() {
    let mut scene = Scene::new();
    let comp = scene.insert(Element::composite(ElementAttrs::named("group")).unwrap()).unwrap();
    let mut el = named("part", 0);
    el.interaction = Interaction { clickable: true, ..Interaction::default() };
    let part = scene.insert(el).unwrap();
    scene.add_member(comp, part).unwrap();
    let removed = scene.remove(part).unwrap();
    assert!(removed.interaction.clickable);
    assert!(scene.element(comp).unwrap().members().is_empty());
}

#[test]
fn removed_composite_releases_members() {
    let mut scene = Scene::new();
    let comp = scene.insert(Element::composite(ElementAttrs::named("group")).unwrap()).unwrap();
    let mut el = named("part", 0);
    el.interaction.draggable = true;
    let part = scene.insert(el).unwrap();
    scene.add_member(comp, part).unwrap();
    assert!(!scene.element(part).unwrap().interaction.draggable);
    scene.remove(comp).unwrap();
    assert!(scene.element(part).unwrap().interaction.draggable);
}

#[test]
fn hiding_a_composite_hides_nested_members() {
    let mut scene = Scene::new();
    let outer = scene.insert(Element::composite(ElementAttrs::named("outer")).unwrap()).unwrap();
    let inner = scene.insert(Element::composite(ElementAttrs::named("inner")).unwrap()).unwrap();
    let part = scene.insert(named("part", 0)).unwrap();
    scene.add_member(inner, part).unwrap();
    scene.add_member(outer, inner).unwrap();
    assert_eq!(scene.composites_of(part), vec![inner]);
    assert!(scene.is_shown(part));
    scene.element_mut(outer).unwrap().visible = false;
    assert!(!scene.is_shown(part));
    assert!(!scene.is_shown(inner));
}

#[test]
fn clear_empties_everything() {
    let mut scene = Scene::new();
    scene.insert(named("a", 0)).unwrap();
    scene.clear();
    assert!(scene.is_empty());
    assert!(scene.by_name("a").is_err());
}

// =============================================================
// Placement and copies
// =============================================================

#[test]
fn move_by_offsets_center() {
    let mut scene = Scene::new();
    let a = scene.insert(named("a", 0)).unwrap();
    scene.move_by(a, pt(3.0, -2.0)).unwrap();
    assert_eq!(scene.element(a).unwrap().center(), pt(3.0, -2.0));
}

#[test]
fn moving_composite_carries_members() {
    let mut scene = Scene::new();
    let comp = scene.insert(Element::composite(ElementAttrs::named("group")).unwrap()).unwrap();
    let a = scene.insert(ball("a", 10.0)).unwrap();
    let b = scene.insert(ball("b", -10.0)).unwrap();
    scene.add_members(comp, &[a, b]).unwrap();
    scene.set_center(comp, pt(100.0, 50.0)).unwrap();
    assert_eq!(scene.element(a).unwrap().center(), pt(110.0, 50.0));
    assert_eq!(scene.element(b).unwrap().center(), pt(90.0, 50.0));
    assert_eq!(scene.element(comp).unwrap().center(), pt(100.0, 50.0));
}

#[test]
fn copy_gets_default_name_and_new_id() {
    let mut scene = Scene::new();
    let a = scene.insert(named("ship", 2)).unwrap();
    let copy = scene.copy_element(a, None).unwrap();
    assert_ne!(copy, a);
    assert_eq!(scene.by_name("ship_copy").unwrap(), copy);
    assert_eq!(scene.element(copy).unwrap().level(), 2);
}

#[test]
fn copy_with_taken_name_adds_nothing() {
    let mut scene = Scene::new();
    let a = scene.insert(named("ship", 0)).unwrap();
    scene.insert(named("other", 0)).unwrap();
    assert!(scene.copy_element(a, Some("other".into())).is_err());
    assert_eq!(scene.len(), 2);
}

#[test]
fn copying_composite_copies_members_with_original_flags() {
    let mut scene = Scene::new();
    let comp = scene.insert(Element::composite(ElementAttrs::named("group")).unwrap()).unwrap();
    let mut el = named("part", 0);
    el.interaction.clickable = true;
    let part = scene.insert(el).unwrap();
    scene.add_member(comp, part).unwrap();

    let copy = scene.copy_element(comp, Some("group2".into())).unwrap();
    let members = scene.members(copy).unwrap();
    assert_eq!(members.len(), 1);
    let part_copy = scene.by_name("part_copy").unwrap();
    assert_eq!(members[0], part_copy);
    assert!(!scene.element(part_copy).unwrap().interaction.clickable);
    scene.remove_member(copy, part_copy).unwrap();
    assert!(scene.element(part_copy).unwrap().interaction.clickable);
    assert_eq!(scene.members(comp).unwrap(), vec![part]);
}

#[test]
fn failed_composite_copy_rolls_back() {
    let mut scene = Scene::new();
    let comp = scene.insert(Element::composite(ElementAttrs::named("group")).unwrap()).unwrap();
    let part = scene.insert(named("part", 0)).unwrap();
    scene.insert(named("part_copy", 0)).unwrap();
    scene.add_member(comp, part).unwrap();
    assert!(scene.copy_element(comp, None).is_err());
    assert_eq!(scene.len(), 3);
    assert!(scene.by_name("group_copy").is_err());
}

// =============================================================
// Collision
// =============================================================

#[test]
fn check_collisions_lists_overlapping_elements() {
    let mut scene = Scene::new();
    let a = scene.insert(ball("a", 0.0)).unwrap();
    let b = scene.insert(ball("b", 8.0)).unwrap();
    scene.insert(ball("c", 40.0)).unwrap();
    assert_eq!(scene.check_collisions(a).unwrap(), vec![b]);
}

#[test]
fn composite_collides_through_members() {
    let mut scene = Scene::new();
    let comp = scene.insert(Element::composite(ElementAttrs::named("group")).unwrap()).unwrap();
    let a = scene.insert(ball("a", 0.0)).unwrap();
    let far = scene.insert(ball("far", 100.0)).unwrap();
    let near = scene.insert(ball("near", 6.0)).unwrap();
    scene.add_member(comp, a).unwrap();
    assert!(scene.collides(comp, near).unwrap());
    assert!(!scene.collides(comp, far).unwrap());
}

#[test]
fn member_does_not_collide_with_itself_via_composite() {
    let mut scene = Scene::new();
    let comp = scene.insert(Element::composite(ElementAttrs::named("group")).unwrap()).unwrap();
    let a = scene.insert(ball("a", 0.0)).unwrap();
    scene.add_member(comp, a).unwrap();
    assert!(!scene.collides(comp, a).unwrap());
}
