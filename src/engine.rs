//! Dispatcher: turns pointer, keyboard and timer input into listener calls.
//!
//! `GameCore` is generic over the scratch surface so every gesture can be
//! driven from tests with a [`RasterSurface`](crate::raster::RasterSurface).
//! The browser wrapper in `web` owns the canvases and the timers and reacts
//! to the [`Action`]s returned here.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::config::GameConfig;
use crate::element::{Element, ElementAttrs, ElementId};
use crate::error::Result;
use crate::geom::Point;
use crate::hit;
use crate::input::{InputState, Key};
use crate::listener::{Event, EventKind, ListenerId, invoke};
use crate::render;
use crate::scene::Scene;
use crate::surface::Surface;

/// What a handler did, for the host to react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// An element was picked by pointer-down.
    Picked(ElementId),
    Clicked(ElementId),
    DragStarted(ElementId),
    Dragged(ElementId),
    DragFinished(ElementId),
    /// A holdable element was pressed; start the hold timer.
    HoldStarted(ElementId),
    /// The hold gesture ended; stop the hold timer.
    HoldFinished(ElementId),
    RenderNeeded,
}

/// State every hit-test and dispatch reads: last pointer position and the
/// scratch surface used for pixel probes.
#[derive(Debug)]
pub struct Shared<S> {
    pub mouse_pos: Option<Point>,
    pub scratch: S,
}

struct Registered<F: ?Sized> {
    entries: Vec<(ListenerId, Rc<RefCell<F>>)>,
}

impl<F: ?Sized> Default for Registered<F> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<F: ?Sized> Registered<F> {
    fn add(&mut self, callback: Rc<RefCell<F>>) -> ListenerId {
        let id = ListenerId::new();
        self.entries.push((id, callback));
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(other, _)| *other != id);
        self.entries.len() != before
    }

    fn snapshot(&self) -> Vec<Rc<RefCell<F>>> {
        self.entries.iter().map(|(_, cb)| Rc::clone(cb)).collect()
    }
}

#[derive(Clone, Copy)]
enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Core game state: all logic that doesn't depend on the browser.
pub struct GameCore<S: Surface> {
    pub scene: Scene,
    pub shared: Shared<S>,
    pub input: InputState,
    pub config: GameConfig,
    pressed_keys: Vec<Key>,
    width: u32,
    height: u32,
    pointer_down: Registered<dyn FnMut(&mut Scene, Point)>,
    pointer_move: Registered<dyn FnMut(&mut Scene, Point)>,
    pointer_up: Registered<dyn FnMut(&mut Scene, Point)>,
    clear_listeners: Registered<dyn FnMut(&mut Scene)>,
}

impl<S: Surface> fmt::Debug for GameCore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameCore")
            .field("elements", &self.scene.len())
            .field("input", &self.input)
            .field("pressed_keys", &self.pressed_keys)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl<S: Surface> GameCore<S> {
    /// Create a game whose canvas has the scratch surface's size.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Config`](crate::error::SceneError::Config) for an invalid configuration.
    pub fn new(scratch: S, config: GameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scene: Scene::new(),
            width: scratch.width(),
            height: scratch.height(),
            shared: Shared { mouse_pos: None, scratch },
            input: InputState::Idle,
            config,
            pressed_keys: Vec::new(),
            pointer_down: Registered::default(),
            pointer_move: Registered::default(),
            pointer_up: Registered::default(),
            clear_listeners: Registered::default(),
        })
    }

    // --- Canvas ---

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resize the canvas and the scratch surface with it.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.shared.scratch.resize(width, height);
    }

    /// Center of the canvas.
    ///
    /// # Errors
    ///
    /// Propagates point validation.
    pub fn canvas_center(&self) -> Result<Point> {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Whether `point` lies on the canvas, edges included.
    #[must_use]
    pub fn in_bounds(&self, point: Point) -> bool {
        (0.0..=f64::from(self.width)).contains(&point.x()) && (0.0..=f64::from(self.height)).contains(&point.y())
    }

    // --- Elements ---

    fn centered_attrs(&self, name: Option<&str>) -> Result<ElementAttrs> {
        Ok(ElementAttrs { name: name.map(str::to_owned), center: self.canvas_center()?, ..ElementAttrs::default() })
    }

    /// Add an empty plain element at the canvas center.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateName`](crate::error::SceneError::DuplicateName) if the name is taken.
    pub fn create_element(&mut self, name: Option<&str>) -> Result<ElementId> {
        let attrs = self.centered_attrs(name)?;
        self.scene.insert(Element::new(attrs)?)
    }

    /// Add an empty composite at the canvas center.
    ///
    /// # Errors
    ///
    /// [`SceneError::DuplicateName`](crate::error::SceneError::DuplicateName) if the name is taken.
    pub fn create_composite(&mut self, name: Option<&str>) -> Result<ElementId> {
        let attrs = self.centered_attrs(name)?;
        self.scene.insert(Element::composite(attrs)?)
    }

    /// The top-most pick target under `point`.
    ///
    /// # Errors
    ///
    /// Propagates scratch surface failures.
    pub fn element_at(&mut self, point: Point) -> Result<Option<ElementId>> {
        hit::element_at(&self.scene, point, &mut self.shared.scratch)
    }

    /// The element of the active gesture, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.input.target()
    }

    /// Keys currently down, in the order they were pressed.
    #[must_use]
    pub fn pressed_keys(&self) -> &[Key] {
        &self.pressed_keys
    }

    // --- Scene listeners ---

    /// Run `f` on every in-bounds pointer-down, before any pick.
    pub fn on_pointer_down(&mut self, f: impl FnMut(&mut Scene, Point) + 'static) -> ListenerId {
        self.pointer_down.add(Rc::new(RefCell::new(f)))
    }

    pub fn on_pointer_move(&mut self, f: impl FnMut(&mut Scene, Point) + 'static) -> ListenerId {
        self.pointer_move.add(Rc::new(RefCell::new(f)))
    }

    pub fn on_pointer_up(&mut self, f: impl FnMut(&mut Scene, Point) + 'static) -> ListenerId {
        self.pointer_up.add(Rc::new(RefCell::new(f)))
    }

    /// Run `f` after [`GameCore::clear`] empties the scene.
    pub fn on_clear(&mut self, f: impl FnMut(&mut Scene) + 'static) -> ListenerId {
        self.clear_listeners.add(Rc::new(RefCell::new(f)))
    }

    /// Remove a scene-level listener.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.pointer_down.remove(id)
            | self.pointer_move.remove(id)
            | self.pointer_up.remove(id)
            | self.clear_listeners.remove(id)
    }

    fn fire_pointer(&mut self, phase: PointerPhase, point: Point) {
        let callbacks = match phase {
            PointerPhase::Down => self.pointer_down.snapshot(),
            PointerPhase::Move => self.pointer_move.snapshot(),
            PointerPhase::Up => self.pointer_up.snapshot(),
        };
        for cb in callbacks {
            match cb.try_borrow_mut() {
                Ok(mut f) => (*f)(&mut self.scene, point),
                Err(_) => tracing::warn!("pointer listener re-entered; skipped"),
            }
        }
    }

    // --- Element listeners ---

    /// Run the due `kind` listeners of `target`; returns how many ran.
    fn dispatch(&mut self, target: ElementId, kind: EventKind, key: Option<&Key>, delta: Option<Point>) -> usize {
        let Some(element) = self.scene.get_mut(target) else {
            return 0;
        };
        let due = element.due(kind, key);
        if !due.is_empty() {
            let mut event = Event::new(target, kind).with_pointer(self.shared.mouse_pos).with_delta(delta);
            event.key = key.cloned();
            tracing::trace!(%target, ?kind, count = due.len(), "dispatch");
            invoke(&due, &mut self.scene, &event);
        }
        due.len()
    }

    /// Fire `kind` listeners of `target`. Returns whether the target still
    /// exists afterwards.
    fn fire(&mut self, target: ElementId, kind: EventKind, key: Option<&Key>, delta: Option<Point>) -> bool {
        self.dispatch(target, kind, key, delta);
        self.scene.contains(target)
    }

    /// Pressable elements in draw order, snapshotted before dispatch.
    fn pressable(&self) -> Vec<ElementId> {
        self.scene.ordered().filter(|e| e.interaction.pressable).map(Element::id).collect()
    }

    fn still_pressable(&self, id: ElementId) -> bool {
        self.scene.get(id).is_some_and(|e| e.interaction.pressable)
    }

    // --- Pointer input ---

    /// Pointer pressed at `point` (canvas space).
    ///
    /// # Errors
    ///
    /// Propagates scratch surface failures and center arithmetic overflow.
    pub fn pointer_down(&mut self, point: Point) -> Result<Vec<Action>> {
        self.shared.mouse_pos = Some(point);
        if !self.in_bounds(point) {
            return Ok(Vec::new());
        }

        let mut actions = Vec::new();
        if self.input.target().is_some() {
            if !self.config.repick_while_selected {
                tracing::trace!("pointer-down ignored during active gesture");
                return Ok(actions);
            }
            actions.extend(self.finish_gesture());
        }
        self.fire_pointer(PointerPhase::Down, point);

        let Some(target) = self.element_at(point)? else {
            return Ok(actions);
        };
        tracing::debug!(%target, x = point.x(), y = point.y(), "picked");
        actions.push(Action::Picked(target));
        let flags = self.scene.element(target)?.interaction;

        if flags.clickable {
            actions.push(Action::Clicked(target));
            if !self.fire(target, EventKind::Click, None, None) {
                return Ok(actions);
            }
        }

        if flags.draggable {
            let delta = point.subtract(self.scene.element(target)?.center())?;
            self.input = InputState::Pressed { target, delta, holding: flags.holdable };
            actions.push(Action::DragStarted(target));
            if !self.fire(target, EventKind::StartDrag, None, Some(delta)) {
                self.input = InputState::Idle;
                return Ok(actions);
            }
        } else if flags.holdable {
            self.input = InputState::Holding { target };
        }

        if flags.holdable {
            if let Some(element) = self.scene.get_mut(target) {
                element.reset_stagger(EventKind::Hold, None);
            }
            actions.push(Action::HoldStarted(target));
            if !self.fire(target, EventKind::StartHold, None, None) {
                self.input = InputState::Idle;
                actions.push(Action::HoldFinished(target));
            }
        }
        Ok(actions)
    }

    /// Pointer moved to `point` (canvas space).
    ///
    /// # Errors
    ///
    /// Fails if the dragged center would not be finite.
    pub fn pointer_move(&mut self, point: Point) -> Result<Vec<Action>> {
        self.shared.mouse_pos = Some(point);
        self.fire_pointer(PointerPhase::Move, point);

        let (target, delta, holding) = match self.input {
            InputState::Pressed { target, delta, holding } | InputState::Dragging { target, delta, holding } => {
                (target, delta, holding)
            }
            InputState::Idle | InputState::Holding { .. } => return Ok(Vec::new()),
        };
        let Some(element) = self.scene.get(target) else {
            return Ok(self.abandon());
        };

        let mut actions = Vec::new();
        if !element.interaction.stationary {
            self.scene.set_center(target, point.subtract(delta)?)?;
            actions.push(Action::RenderNeeded);
        }
        self.input = InputState::Dragging { target, delta, holding };
        actions.push(Action::Dragged(target));
        if !self.fire(target, EventKind::Drag, None, Some(delta)) {
            actions.extend(self.abandon());
        }
        Ok(actions)
    }

    /// Pointer released at `point` (canvas space).
    pub fn pointer_up(&mut self, point: Point) -> Vec<Action> {
        self.shared.mouse_pos = Some(point);
        self.fire_pointer(PointerPhase::Up, point);
        self.finish_gesture()
    }

    /// End the active gesture, firing finish listeners.
    fn finish_gesture(&mut self) -> Vec<Action> {
        let state = std::mem::take(&mut self.input);
        let Some(target) = state.target() else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        let mut alive = self.scene.contains(target);
        if let InputState::Pressed { delta, .. } | InputState::Dragging { delta, .. } = state {
            if alive {
                actions.push(Action::DragFinished(target));
                alive = self.fire(target, EventKind::FinishDrag, None, Some(delta));
            }
        }
        if state.is_holding() {
            actions.push(Action::HoldFinished(target));
            if alive {
                self.fire(target, EventKind::FinishHold, None, None);
            }
        }
        tracing::debug!(%target, "gesture finished");
        actions
    }

    /// Drop the gesture without finish listeners; its target is gone.
    fn abandon(&mut self) -> Vec<Action> {
        let state = std::mem::take(&mut self.input);
        match state.target() {
            Some(target) if state.is_holding() => vec![Action::HoldFinished(target)],
            _ => Vec::new(),
        }
    }

    // --- Timers ---

    /// One tick of the hold timer.
    pub fn hold_tick(&mut self) -> Vec<Action> {
        if !self.input.is_holding() {
            return Vec::new();
        }
        let Some(target) = self.input.target() else {
            return Vec::new();
        };
        if !self.fire(target, EventKind::Hold, None, None) {
            return self.abandon();
        }
        Vec::new()
    }

    /// Key went down. Repeats of a key already down are ignored.
    pub fn key_down(&mut self, key: Key) -> Vec<Action> {
        if self.pressed_keys.contains(&key) {
            return Vec::new();
        }
        self.pressed_keys.push(key.clone());
        let mut fired = false;
        for id in self.pressable() {
            if self.still_pressable(id) {
                fired |= self.dispatch(id, EventKind::KeyPress, Some(&key), None) > 0;
            }
        }
        render_if(fired)
    }

    /// One tick of the key-hold loop: fires `key_hold` for every key down.
    pub fn key_hold_tick(&mut self) -> Vec<Action> {
        let keys = self.pressed_keys.clone();
        let mut fired = false;
        for id in self.pressable() {
            for key in &keys {
                if self.still_pressable(id) {
                    fired |= self.dispatch(id, EventKind::KeyHold, Some(key), None) > 0;
                }
            }
        }
        render_if(fired)
    }

    /// Key released: resets its key-hold stagger and fires `key_up`.
    pub fn key_up(&mut self, key: &Key) -> Vec<Action> {
        self.pressed_keys.retain(|k| k != key);
        let mut fired = false;
        for id in self.pressable() {
            if let Some(element) = self.scene.get_mut(id) {
                element.reset_stagger(EventKind::KeyHold, Some(key));
            }
            if self.still_pressable(id) {
                fired |= self.dispatch(id, EventKind::KeyUp, Some(key), None) > 0;
            }
        }
        render_if(fired)
    }

    // --- Frame loop ---

    /// Draw the scene to `target`.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn draw<T: Surface + ?Sized>(&self, target: &mut T) -> Result<()> {
        render::draw_scene(&self.scene, target)
    }

    /// Advance sprite animations by one tick.
    pub fn animate(&mut self) {
        self.scene.animate();
    }

    /// Draw, then animate: one tick of the frame loop.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub fn frame<T: Surface + ?Sized>(&mut self, target: &mut T) -> Result<()> {
        self.draw(target)?;
        self.animate();
        Ok(())
    }

    /// Remove every element, drop the gesture and pressed keys, then run
    /// clear listeners.
    pub fn clear(&mut self) -> Vec<Action> {
        let actions = self.abandon();
        self.scene.clear();
        self.pressed_keys.clear();
        for cb in self.clear_listeners.snapshot() {
            match cb.try_borrow_mut() {
                Ok(mut f) => (*f)(&mut self.scene),
                Err(_) => tracing::warn!("clear listener re-entered; skipped"),
            }
        }
        tracing::debug!(elements = self.scene.len(), "game cleared");
        actions
    }
}

fn render_if(fired: bool) -> Vec<Action> {
    if fired { vec![Action::RenderNeeded] } else { Vec::new() }
}
