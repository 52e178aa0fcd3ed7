//! Element listeners: observer lists with stable ids and per-listener stagger.
//!
//! Callbacks receive the scene mutably, so they can move, restyle, add or
//! remove elements. The dispatcher clones the due callbacks out of the
//! element before calling them; a listener list is never borrowed while its
//! callbacks run.

#[cfg(test)]
#[path = "listener_test.rs"]
mod listener_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::element::ElementId;
use crate::error::{Result, SceneError};
use crate::geom::Point;
use crate::input::Key;
use crate::scene::Scene;

/// Handle returned when a listener is registered; used to remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Which listener list an event was dispatched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    StartDrag,
    Drag,
    FinishDrag,
    StartHold,
    Hold,
    FinishHold,
    KeyPress,
    KeyHold,
    KeyUp,
}

/// What a listener is told about the event that fired it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The element whose listener is running.
    pub target: ElementId,
    pub kind: EventKind,
    /// Last known pointer position in canvas space.
    pub pointer: Option<Point>,
    /// The key, for keyboard events.
    pub key: Option<Key>,
    /// Pointer offset from the element center at pick time, for drag events.
    pub delta: Option<Point>,
}

impl Event {
    #[must_use]
    pub fn new(target: ElementId, kind: EventKind) -> Self {
        Self { target, kind, pointer: None, key: None, delta: None }
    }

    #[must_use]
    pub fn with_pointer(mut self, pointer: Option<Point>) -> Self {
        self.pointer = pointer;
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn with_delta(mut self, delta: Option<Point>) -> Self {
        self.delta = delta;
        self
    }
}

/// A shared element callback.
pub type Callback = Rc<RefCell<dyn FnMut(&mut Scene, &Event)>>;

/// Wrap a closure as a [`Callback`].
pub fn callback(f: impl FnMut(&mut Scene, &Event) + 'static) -> Callback {
    Rc::new(RefCell::new(f))
}

#[derive(Clone)]
struct Listener {
    id: ListenerId,
    callback: Callback,
    every: u32,
    counter: u32,
}

/// Insertion-ordered listeners for one event.
///
/// Each listener fires on every `every`-th dispatch, starting with the
/// first. Non-repeating events use `every = 1`.
#[derive(Clone, Default)]
pub struct ListenerList {
    listeners: Vec<Listener>,
}

impl fmt::Debug for ListenerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList").field("len", &self.listeners.len()).finish()
    }
}

impl ListenerList {
    /// Register a listener that fires on every dispatch.
    pub fn add(&mut self, callback: Callback) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.push(Listener { id, callback, every: 1, counter: 0 });
        id
    }

    /// Register a listener that fires on every `every`-th dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] when `every` is zero.
    pub fn add_staggered(&mut self, callback: Callback, every: u32) -> Result<ListenerId> {
        if every == 0 {
            return Err(SceneError::NonPositive { field: "every", value: 0.0 });
        }
        let id = ListenerId::new();
        self.listeners.push(Listener { id, callback, every, counter: 0 });
        Ok(id)
    }

    /// Remove a listener. Returns whether it was present.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Callbacks due on this dispatch, in registration order. Advances every
    /// listener's stagger counter.
    pub fn due(&mut self) -> Vec<Callback> {
        let mut due = Vec::new();
        for listener in &mut self.listeners {
            if listener.counter == 0 {
                due.push(Rc::clone(&listener.callback));
            }
            listener.counter = (listener.counter + 1) % listener.every;
        }
        due
    }

    /// Restart every stagger so the next dispatch fires all listeners.
    pub fn reset_counters(&mut self) {
        for listener in &mut self.listeners {
            listener.counter = 0;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

/// Listener lists indexed by key.
#[derive(Debug, Clone, Default)]
pub struct KeyedListeners {
    by_key: HashMap<Key, ListenerList>,
}

impl KeyedListeners {
    pub fn add(&mut self, key: Key, callback: Callback) -> ListenerId {
        self.by_key.entry(key).or_default().add(callback)
    }

    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] when `every` is zero.
    pub fn add_staggered(&mut self, key: Key, callback: Callback, every: u32) -> Result<ListenerId> {
        self.by_key.entry(key).or_default().add_staggered(callback, every)
    }

    /// Remove a listener registered under any key.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for list in self.by_key.values_mut() {
            removed |= list.remove(id);
        }
        self.by_key.retain(|_, list| !list.is_empty());
        removed
    }

    /// Callbacks for `key` due on this dispatch.
    pub fn due(&mut self, key: &Key) -> Vec<Callback> {
        self.by_key.get_mut(key).map(ListenerList::due).unwrap_or_default()
    }

    pub fn reset_counters(&mut self, key: &Key) {
        if let Some(list) = self.by_key.get_mut(key) {
            list.reset_counters();
        }
    }

    #[must_use]
    pub fn has_key(&self, key: &Key) -> bool {
        self.by_key.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
    }
}

/// Run `callbacks` in order against `scene`.
///
/// A callback that is already running (it triggered a nested dispatch of
/// itself) is skipped.
pub(crate) fn invoke(callbacks: &[Callback], scene: &mut Scene, event: &Event) {
    for cb in callbacks {
        match cb.try_borrow_mut() {
            Ok(mut f) => (*f)(scene, event),
            Err(_) => tracing::warn!(kind = ?event.kind, target = %event.target, "listener re-entered; skipped"),
        }
    }
}
