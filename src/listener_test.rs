use std::cell::Cell;

use super::*;

fn counting() -> (Callback, Rc<Cell<u32>>) {
    let hits = Rc::new(Cell::new(0));
    let seen = Rc::clone(&hits);
    let cb = callback(move |_, _| seen.set(seen.get() + 1));
    (cb, hits)
}

fn run(callbacks: &[Callback]) {
    let mut scene = Scene::new();
    let event = Event::new(ElementId::new_v4(), EventKind::Click);
    invoke(callbacks, &mut scene, &event);
}

// =============================================================
// ListenerList
// =============================================================

#[test]
fn every_listener_fires_in_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut list = ListenerList::default();
    for n in 0..3 {
        let order = Rc::clone(&order);
        list.add(callback(move |_, _| order.borrow_mut().push(n)));
    }
    run(&list.due());
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
}

#[test]
fn removed_listener_no_longer_fires() {
    let (cb, hits) = counting();
    let mut list = ListenerList::default();
    let id = list.add(cb);
    assert!(list.remove(id));
    assert!(!list.remove(id));
    run(&list.due());
    assert_eq!(hits.get(), 0);
    assert!(list.is_empty());
}

#[test]
fn staggered_listener_fires_first_then_every_nth() {
    let (cb, hits) = counting();
    let mut list = ListenerList::default();
    list.add_staggered(cb, 3).unwrap();
    let fired: Vec<usize> = (0..7).map(|_| list.due().len()).collect();
    assert_eq!(fired, vec![1, 0, 0, 1, 0, 0, 1]);
    assert_eq!(hits.get(), 0);
}

#[test]
fn stagger_of_zero_is_rejected() {
    let (cb, _) = counting();
    let mut list = ListenerList::default();
    assert!(matches!(list.add_staggered(cb, 0), Err(SceneError::NonPositive { field: "every", .. })));
    assert!(list.is_empty());
}

#[test]
fn reset_counters_restarts_stagger() {
    let (cb, _) = counting();
    let mut list = ListenerList::default();
    list.add_staggered(cb, 4).unwrap();
    assert_eq!(list.due().len(), 1);
    assert_eq!(list.due().len(), 0);
    list.reset_counters();
    assert_eq!(list.due().len(), 1);
}

#[test]
fn clones_share_callbacks() {
    let (cb, hits) = counting();
    let mut list = ListenerList::default();
    list.add(cb);
    let mut copy = list.clone();
    run(&copy.due());
    run(&list.due());
    assert_eq!(hits.get(), 2);
}

#[test]
fn debug_shows_length() {
    let (cb, _) = counting();
    let mut list = ListenerList::default();
    list.add(cb);
    assert_eq!(format!("{list:?}"), "ListenerList { len: 1 }");
}

// =============================================================
// KeyedListeners
// =============================================================

#[test]
fn keyed_due_only_for_matching_key() {
    let (cb, hits) = counting();
    let mut keyed = KeyedListeners::default();
    keyed.add(Key::from("a"), cb);
    run(&keyed.due(&Key::from("b")));
    assert_eq!(hits.get(), 0);
    run(&keyed.due(&Key::from("a")));
    assert_eq!(hits.get(), 1);
}

#[test]
fn keyed_remove_drops_empty_keys() {
    let (cb, _) = counting();
    let mut keyed = KeyedListeners::default();
    let id = keyed.add(Key::from("a"), cb);
    assert!(keyed.has_key(&Key::from("a")));
    assert!(keyed.remove(id));
    assert!(!keyed.has_key(&Key::from("a")));
    assert!(keyed.is_empty());
}

#[test]
fn keyed_reset_only_touches_one_key() {
    let mut keyed = KeyedListeners::default();
    keyed.add_staggered(Key::from("a"), counting().0, 2).unwrap();
    keyed.add_staggered(Key::from("b"), counting().0, 2).unwrap();
    keyed.due(&Key::from("a"));
    keyed.due(&Key::from("b"));
    keyed.reset_counters(&Key::from("a"));
    assert_eq!(keyed.due(&Key::from("a")).len(), 1);
    assert_eq!(keyed.due(&Key::from("b")).len(), 0);
}

// =============================================================
// Invocation
// =============================================================

#[test]
fn callbacks_can_mutate_the_scene() {
    let mut scene = Scene::new();
    let cb = callback(|scene, _| {
        scene.insert(crate::element::Element::new(crate::element::ElementAttrs::named("spawned")).unwrap()).unwrap();
    });
    let event = Event::new(ElementId::new_v4(), EventKind::Click);
    invoke(&[cb], &mut scene, &event);
    assert!(scene.by_name("spawned").is_ok());
}

#[test]
fn event_builder_sets_fields() {
    let target = ElementId::new_v4();
    let p = Point::new(1.0, 2.0).unwrap();
    let event = Event::new(target, EventKind::KeyHold).with_key(Key::from("x")).with_pointer(Some(p));
    assert_eq!(event.key, Some(Key::from("x")));
    assert_eq!(event.pointer, Some(p));
    assert_eq!(event.delta, None);
}
