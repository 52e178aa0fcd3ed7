//! Elements: positioned, interactive nodes of the scene.
//!
//! A plain element owns a level-sorted list of drawables and any number of
//! hitboxes. A composite owns memberships instead: references to other scene
//! elements that it moves, rotates and hit-tests as a group. Operations that
//! need to see other elements (moving a composite, membership, collision
//! between composites) live on [`Scene`](crate::scene::Scene).

#[cfg(test)]
#[path = "element_test.rs"]
mod element_test;

use uuid::Uuid;

use crate::drawable::Drawable;
use crate::error::{finite, Result, SceneError};
use crate::geom::Point;
use crate::hitbox::Hitbox;
use crate::input::Key;
use crate::listener::{callback, Callback, EventKind, Event, KeyedListeners, ListenerId, ListenerList};
use crate::scene::Scene;

/// Unique identifier for an element.
pub type ElementId = Uuid;

/// How an element responds to input.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interaction {
    /// Fires click listeners on pointer-down.
    pub clickable: bool,
    /// Follows the pointer while pressed.
    pub draggable: bool,
    /// Fires hold listeners on a timer while pressed.
    pub holdable: bool,
    /// Receives keyboard events.
    pub pressable: bool,
    /// Fires drag listeners without moving.
    pub stationary: bool,
}

impl Interaction {
    /// Whether the scene pick considers this element at all.
    #[must_use]
    pub fn is_pick_target(self) -> bool {
        self.clickable || self.draggable || self.holdable
    }
}

/// Flags a composite overrides on its members, kept so they can be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SavedFlags {
    pub clickable: bool,
    pub draggable: bool,
    pub pressable: bool,
}

impl SavedFlags {
    /// Record the member's flags.
    #[must_use]
    pub fn capture(interaction: Interaction) -> Self {
        Self { clickable: interaction.clickable, draggable: interaction.draggable, pressable: interaction.pressable }
    }

    /// Put the recorded flags back.
    pub fn restore(self, interaction: &mut Interaction) {
        interaction.clickable = self.clickable;
        interaction.draggable = self.draggable;
        interaction.pressable = self.pressable;
    }
}

/// One member of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub element: ElementId,
    pub saved: SavedFlags,
}

/// What an element holds.
#[derive(Debug, Clone)]
pub enum Content {
    Drawables(Vec<Drawable>),
    Members(Vec<Membership>),
}

/// Construction attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementAttrs {
    pub name: Option<String>,
    pub level: i32,
    pub center: Point,
    pub rotation: f64,
    pub visible: bool,
    pub interaction: Interaction,
    pub hitbox_visible: bool,
}

impl Default for ElementAttrs {
    fn default() -> Self {
        Self {
            name: None,
            level: 0,
            center: Point::ORIGIN,
            rotation: 0.0,
            visible: true,
            interaction: Interaction::default(),
            hitbox_visible: false,
        }
    }
}

impl ElementAttrs {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }
}

#[derive(Debug, Clone, Default)]
struct Listeners {
    click: ListenerList,
    start_drag: ListenerList,
    drag: ListenerList,
    finish_drag: ListenerList,
    start_hold: ListenerList,
    hold: ListenerList,
    finish_hold: ListenerList,
    key_press: KeyedListeners,
    key_hold: KeyedListeners,
    key_up: ListenerList,
}

impl Listeners {
    fn list_mut(&mut self, kind: EventKind) -> Option<&mut ListenerList> {
        match kind {
            EventKind::Click => Some(&mut self.click),
            EventKind::StartDrag => Some(&mut self.start_drag),
            EventKind::Drag => Some(&mut self.drag),
            EventKind::FinishDrag => Some(&mut self.finish_drag),
            EventKind::StartHold => Some(&mut self.start_hold),
            EventKind::Hold => Some(&mut self.hold),
            EventKind::FinishHold => Some(&mut self.finish_hold),
            EventKind::KeyUp => Some(&mut self.key_up),
            EventKind::KeyPress | EventKind::KeyHold => None,
        }
    }

    fn keyed_mut(&mut self, kind: EventKind) -> Option<&mut KeyedListeners> {
        match kind {
            EventKind::KeyPress => Some(&mut self.key_press),
            EventKind::KeyHold => Some(&mut self.key_hold),
            _ => None,
        }
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let lists = [
            &mut self.click,
            &mut self.start_drag,
            &mut self.drag,
            &mut self.finish_drag,
            &mut self.start_hold,
            &mut self.hold,
            &mut self.finish_hold,
            &mut self.key_up,
        ];
        let mut removed = false;
        for list in lists {
            removed |= list.remove(id);
        }
        removed |= self.key_press.remove(id);
        removed |= self.key_hold.remove(id);
        removed
    }
}

/// A node of the scene.
#[derive(Debug, Clone)]
pub struct Element {
    id: ElementId,
    name: Option<String>,
    level: i32,
    center: Point,
    rotation: f64,
    /// Hidden elements are neither drawn nor hit.
    pub visible: bool,
    pub interaction: Interaction,
    /// Draw hitbox circles on top of the element.
    pub hitbox_visible: bool,
    hitboxes: Vec<Hitbox>,
    content: Content,
    listeners: Listeners,
}

impl Element {
    /// A plain element with no drawables.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] if the rotation is not finite.
    pub fn new(attrs: ElementAttrs) -> Result<Self> {
        Self::build(attrs, Content::Drawables(Vec::new()))
    }

    /// An empty composite.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonFinite`] if the rotation is not finite.
    pub fn composite(attrs: ElementAttrs) -> Result<Self> {
        Self::build(attrs, Content::Members(Vec::new()))
    }

    fn build(attrs: ElementAttrs, content: Content) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: attrs.name,
            level: attrs.level,
            center: attrs.center,
            rotation: finite("rotation", attrs.rotation)?,
            visible: attrs.visible,
            interaction: attrs.interaction,
            hitbox_visible: attrs.hitbox_visible,
            hitboxes: Vec::new(),
            content,
            listeners: Listeners::default(),
        })
    }

    /// A copy under a fresh id. Listeners are shared with the original.
    pub(crate) fn duplicate(&self, name: Option<String>) -> Self {
        Self { id: Uuid::new_v4(), name, ..self.clone() }
    }

    // --- Identity and placement ---

    #[must_use]
    pub fn id(&self) -> ElementId {
        self.id
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

    /// Center in canvas space.
    #[must_use]
    pub fn center(&self) -> Point {
        self.center
    }

    /// Move this element only. Composites are moved through the scene so
    /// their members follow.
    pub(crate) fn set_center(&mut self, center: Point) {
        self.center = center;
    }

    /// Rotation in radians around the center.
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
    pub fn is_composite(&self) -> bool {
        matches!(self.content, Content::Members(_))
    }

    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    // --- Drawables ---

    /// Drawables in draw order. Empty for composites.
    #[must_use]
    pub fn drawables(&self) -> &[Drawable] {
        match &self.content {
            Content::Drawables(drawables) => drawables,
            Content::Members(_) => &[],
        }
    }

    fn drawables_mut(&mut self) -> Result<&mut Vec<Drawable>> {
        match &mut self.content {
            Content::Drawables(drawables) => Ok(drawables),
            Content::Members(_) => Err(SceneError::CompositeContent("drawables")),
        }
    }

    /// Add a drawable, keeping the list sorted by level. Drawables with equal
    /// levels keep insertion order.
    ///
    /// # Errors
    ///
    /// Fails on composites and when another drawable has the same name.
    pub fn add_drawable(&mut self, drawable: Drawable) -> Result<()> {
        let drawables = self.drawables_mut()?;
        if let Some(name) = drawable.name() {
            if drawables.iter().any(|d| d.name() == Some(name)) {
                return Err(SceneError::DuplicateName(name.to_owned()));
            }
        }
        let at = drawables.partition_point(|d| d.level() <= drawable.level());
        drawables.insert(at, drawable);
        Ok(())
    }

    /// Add several drawables; stops at the first failure.
    ///
    /// # Errors
    ///
    /// See [`Element::add_drawable`].
    pub fn add_drawables(&mut self, drawables: impl IntoIterator<Item = Drawable>) -> Result<()> {
        for drawable in drawables {
            self.add_drawable(drawable)?;
        }
        Ok(())
    }

    fn drawable_index(&self, name: &str) -> Result<usize> {
        let mut found = self.drawables().iter().enumerate().filter(|(_, d)| d.name() == Some(name));
        match (found.next(), found.next()) {
            (Some((i, _)), None) => Ok(i),
            (Some(_), Some(_)) => Err(SceneError::Ambiguous(name.to_owned())),
            (None, _) => Err(SceneError::NotFound(name.to_owned())),
        }
    }

    /// The drawable called `name`.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::Ambiguous`].
    pub fn drawable(&self, name: &str) -> Result<&Drawable> {
        let i = self.drawable_index(name)?;
        Ok(&self.drawables()[i])
    }

    /// Mutable access to the drawable called `name`. Use
    /// [`Element::set_drawable_level`] to change its level.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::Ambiguous`].
    pub fn drawable_mut(&mut self, name: &str) -> Result<&mut Drawable> {
        let i = self.drawable_index(name)?;
        Ok(&mut self.drawables_mut()?[i])
    }

    /// Remove and return the drawable called `name`.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::Ambiguous`].
    pub fn pop_drawable(&mut self, name: &str) -> Result<Drawable> {
        let i = self.drawable_index(name)?;
        Ok(self.drawables_mut()?.remove(i))
    }

    /// Change a drawable's level and move it to its new place in draw order.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::Ambiguous`].
    pub fn set_drawable_level(&mut self, name: &str, level: i32) -> Result<()> {
        let mut drawable = self.pop_drawable(name)?;
        drawable.set_level(level);
        self.add_drawable(drawable)
    }

    /// Rename a drawable, keeping names unique within the element.
    ///
    /// # Errors
    ///
    /// Fails if `name` is missing or `new_name` is taken by another drawable.
    pub fn rename_drawable(&mut self, name: &str, new_name: Option<String>) -> Result<()> {
        let i = self.drawable_index(name)?;
        if let Some(new) = new_name.as_deref() {
            if self.drawables().iter().enumerate().any(|(j, d)| j != i && d.name() == Some(new)) {
                return Err(SceneError::DuplicateName(new.to_owned()));
            }
        }
        self.drawables_mut()?[i].set_name(new_name);
        Ok(())
    }

    /// Advance sprite animations.
    pub fn animate(&mut self) {
        if let Content::Drawables(drawables) = &mut self.content {
            drawables.iter_mut().for_each(Drawable::animate);
        }
    }

    // --- Hitboxes ---

    #[must_use]
    pub fn hitboxes(&self) -> &[Hitbox] {
        &self.hitboxes
    }

    /// # Errors
    ///
    /// Returns [`SceneError::CompositeContent`] on composites.
    pub fn add_hitbox(&mut self, hitbox: Hitbox) -> Result<()> {
        if self.is_composite() {
            return Err(SceneError::CompositeContent("hitboxes"));
        }
        self.hitboxes.push(hitbox);
        Ok(())
    }

    pub fn clear_hitboxes(&mut self) {
        self.hitboxes.clear();
    }

    /// Hitbox circles placed in canvas space as `(center, radius)`.
    ///
    /// # Errors
    ///
    /// Fails if a placed center overflows.
    pub fn world_hitboxes(&self) -> Result<Vec<(Point, f64)>> {
        self.hitboxes
            .iter()
            .map(|hb| Ok((hb.world_center(self.center, self.rotation)?, hb.radius())))
            .collect()
    }

    /// Whether any hitbox of `self` overlaps any hitbox of `other`. Elements
    /// without hitboxes never collide. For composites use
    /// [`Scene::collides`](crate::scene::Scene::collides).
    ///
    /// # Errors
    ///
    /// Fails if a placed hitbox center overflows.
    pub fn collides_with(&self, other: &Self) -> Result<bool> {
        let mine = self.world_hitboxes()?;
        let theirs = other.world_hitboxes()?;
        Ok(mine.iter().any(|&a| theirs.iter().any(|&b| Hitbox::overlaps(a, b))))
    }

    // --- Composite membership ---

    /// Members of a composite. Empty for plain elements.
    #[must_use]
    pub fn members(&self) -> &[Membership] {
        match &self.content {
            Content::Members(members) => members,
            Content::Drawables(_) => &[],
        }
    }

    pub(crate) fn members_mut(&mut self) -> Result<&mut Vec<Membership>> {
        let id = self.id;
        match &mut self.content {
            Content::Members(members) => Ok(members),
            Content::Drawables(_) => Err(SceneError::NotComposite(id)),
        }
    }

    #[must_use]
    pub fn has_member(&self, id: ElementId) -> bool {
        self.members().iter().any(|m| m.element == id)
    }

    // --- Listeners ---

    pub fn on_click(&mut self, f: impl FnMut(&mut Scene, &Event) + 'static) -> ListenerId {
        self.listeners.click.add(callback(f))
    }

    pub fn on_start_drag(&mut self, f: impl FnMut(&mut Scene, &Event) + 'static) -> ListenerId {
        self.listeners.start_drag.add(callback(f))
    }

    /// Fires on every pointer move while the element is dragged.
    pub fn on_drag(&mut self, f: impl FnMut(&mut Scene, &Event) + 'static) -> ListenerId {
        self.listeners.drag.add(callback(f))
    }

    pub fn on_finish_drag(&mut self, f: impl FnMut(&mut Scene, &Event) + 'static) -> ListenerId {
        self.listeners.finish_drag.add(callback(f))
    }

    pub fn on_start_hold(&mut self, f: impl FnMut(&mut Scene, &Event) + 'static) -> ListenerId {
        self.listeners.start_hold.add(callback(f))
    }

    /// Fires on every `every`-th hold tick while the element is pressed,
    /// starting with the first tick.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] when `every` is zero.
    pub fn on_hold(&mut self, every: u32, f: impl FnMut(&mut Scene, &Event) + 'static) -> Result<ListenerId> {
        self.listeners.hold.add_staggered(callback(f), every)
    }

    pub fn on_finish_hold(&mut self, f: impl FnMut(&mut Scene, &Event) + 'static) -> ListenerId {
        self.listeners.finish_hold.add(callback(f))
    }

    /// Fires once when `key` goes down. Requires `interaction.pressable`.
    pub fn on_key_press(&mut self, key: impl Into<Key>, f: impl FnMut(&mut Scene, &Event) + 'static) -> ListenerId {
        self.listeners.key_press.add(key.into(), callback(f))
    }

    /// Fires on every `every`-th key-hold tick while `key` is down.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NonPositive`] when `every` is zero.
    pub fn on_key_hold(
        &mut self,
        key: impl Into<Key>,
        every: u32,
        f: impl FnMut(&mut Scene, &Event) + 'static,
    ) -> Result<ListenerId> {
        self.listeners.key_hold.add_staggered(key.into(), callback(f), every)
    }

    /// Fires when any key is released.
    pub fn on_key_up(&mut self, f: impl FnMut(&mut Scene, &Event) + 'static) -> ListenerId {
        self.listeners.key_up.add(callback(f))
    }

    /// Remove a listener from whichever list holds it.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Drop every listener.
    pub fn clear_listeners(&mut self) {
        self.listeners = Listeners::default();
    }

    /// Callbacks due for `kind`, advancing stagger counters.
    pub(crate) fn due(&mut self, kind: EventKind, key: Option<&Key>) -> Vec<Callback> {
        if let Some(list) = self.listeners.list_mut(kind) {
            return list.due();
        }
        match (self.listeners.keyed_mut(kind), key) {
            (Some(keyed), Some(key)) => keyed.due(key),
            _ => Vec::new(),
        }
    }

    /// Restart the stagger of `kind` so its next dispatch fires every listener.
    pub(crate) fn reset_stagger(&mut self, kind: EventKind, key: Option<&Key>) {
        if let Some(list) = self.listeners.list_mut(kind) {
            list.reset_counters();
            return;
        }
        if let (Some(keyed), Some(key)) = (self.listeners.keyed_mut(kind), key) {
            keyed.reset_counters(key);
        }
    }
}
