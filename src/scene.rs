//! Scene: the element store and its z-order.
//!
//! Elements live in a map keyed by id. A separate order list keeps every id
//! sorted by level; equal levels keep insertion order, so the later of two
//! elements on the same level is on top. Composite members are ordinary
//! entries of the same store and the composite refers to them by id.
//!
//! Names are optional but unique among the scene's elements.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::{HashMap, HashSet};

use crate::element::{Element, ElementId};
use crate::error::{Result, SceneError};
use crate::geom::Point;

/// Every element of a game, in draw order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    elements: HashMap<ElementId, Element>,
    order: Vec<ElementId>,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Insertion ---

    fn check_insert(&self, element: &Element) -> Result<()> {
        if self.elements.contains_key(&element.id()) {
            return Err(SceneError::AlreadyAdded(element.id()));
        }
        if let Some(name) = element.name() {
            if self.name_taken(name, None) {
                return Err(SceneError::DuplicateName(name.to_owned()));
            }
        }
        Ok(())
    }

    fn name_taken(&self, name: &str, except: Option<ElementId>) -> bool {
        self.elements.values().any(|e| Some(e.id()) != except && e.name() == Some(name))
    }

    fn place(&mut self, element: Element) -> ElementId {
        let id = element.id();
        let level = element.level();
        let at = self.order.partition_point(|other| self.elements.get(other).is_none_or(|e| e.level() <= level));
        self.order.insert(at, id);
        self.elements.insert(id, element);
        id
    }

    /// Add an element on top of the elements of its level.
    ///
    /// # Errors
    ///
    /// [`SceneError::AlreadyAdded`] if the id is present,
    /// [`SceneError::DuplicateName`] if the name is taken. The scene is
    /// unchanged on error.
    pub fn insert(&mut self, element: Element) -> Result<ElementId> {
        self.check_insert(&element)?;
        let id = self.place(element);
        tracing::trace!(%id, "element inserted");
        Ok(id)
    }

    /// Add several elements at once. Either all are added or none.
    ///
    /// # Errors
    ///
    /// As [`Scene::insert`], also when two of the new elements share an id or name.
    pub fn insert_all(&mut self, elements: Vec<Element>) -> Result<Vec<ElementId>> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for element in &elements {
            self.check_insert(element)?;
            if !ids.insert(element.id()) {
                return Err(SceneError::AlreadyAdded(element.id()));
            }
            if let Some(name) = element.name() {
                if !names.insert(name) {
                    return Err(SceneError::DuplicateName(name.to_owned()));
                }
            }
        }
        Ok(elements.into_iter().map(|e| self.place(e)).collect())
    }

    // --- Lookup ---

    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    /// Like [`Scene::get`] but fails for unknown ids.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`].
    pub fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements.get(&id).ok_or(SceneError::UnknownElement(id))
    }

    /// Like [`Scene::get_mut`] but fails for unknown ids.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`].
    pub fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements.get_mut(&id).ok_or(SceneError::UnknownElement(id))
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// The element called `name`.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::Ambiguous`].
    pub fn by_name(&self, name: &str) -> Result<ElementId> {
        let mut found = self.order.iter().filter(|id| self.elements.get(*id).is_some_and(|e| e.name() == Some(name)));
        match (found.next(), found.next()) {
            (Some(id), None) => Ok(*id),
            (Some(_), Some(_)) => Err(SceneError::Ambiguous(name.to_owned())),
            (None, _) => Err(SceneError::NotFound(name.to_owned())),
        }
    }

    /// Ids in draw order, bottom first.
    #[must_use]
    pub fn ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Elements in draw order, bottom first.
    pub fn ordered(&self) -> impl DoubleEndedIterator<Item = &Element> + '_ {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Composites that list `id` as a member.
    #[must_use]
    pub fn composites_of(&self, id: ElementId) -> Vec<ElementId> {
        self.ordered().filter(|e| e.has_member(id)).map(Element::id).collect()
    }

    /// Whether `id` is visible and so is every composite that contains it.
    #[must_use]
    pub fn is_shown(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|e| e.visible) && self.composites_of(id).into_iter().all(|c| self.is_shown(c))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    // --- Removal ---

    /// Remove an element.
    ///
    /// A removed member leaves its composites with its flags restored. A
    /// removed composite releases its members, restoring their flags; the
    /// members stay in the scene.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`].
    pub fn remove(&mut self, id: ElementId) -> Result<Element> {
        let mut element = self.elements.remove(&id).ok_or(SceneError::UnknownElement(id))?;
        self.order.retain(|other| *other != id);
        for composite in self.elements.values_mut().filter(|e| e.is_composite()) {
            if let Ok(members) = composite.members_mut() {
                if let Some(at) = members.iter().position(|m| m.element == id) {
                    let membership = members.remove(at);
                    membership.saved.restore(&mut element.interaction);
                }
            }
        }
        if let Ok(members) = element.members_mut() {
            for membership in members.drain(..) {
                if let Some(member) = self.elements.get_mut(&membership.element) {
                    membership.saved.restore(&mut member.interaction);
                }
            }
        }
        tracing::trace!(%id, "element removed");
        Ok(element)
    }

    /// Remove the element called `name`.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotFound`] or [`SceneError::Ambiguous`].
    pub fn pop_by_name(&mut self, name: &str) -> Result<Element> {
        let id = self.by_name(name)?;
        self.remove(id)
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
    }

    // --- Names and levels ---

    /// Rename an element, or clear its name with `None`.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`], or [`SceneError::DuplicateName`] if
    /// another element uses `name`.
    pub fn rename(&mut self, id: ElementId, name: Option<String>) -> Result<()> {
        if let Some(n) = name.as_deref() {
            if self.name_taken(n, Some(id)) {
                return Err(SceneError::DuplicateName(n.to_owned()));
            }
        }
        self.element_mut(id)?.set_name(name);
        Ok(())
    }

    /// Change an element's level and restore draw order.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`].
    pub fn set_level(&mut self, id: ElementId, level: i32) -> Result<()> {
        self.element_mut(id)?.set_level(level);
        self.update_levels();
        Ok(())
    }

    /// Highest level in the scene, or `None` when empty.
    #[must_use]
    pub fn highest_level(&self) -> Option<i32> {
        self.elements.values().map(Element::level).max()
    }

    /// Stable re-sort of the draw order by level.
    pub fn update_levels(&mut self) {
        let elements = &self.elements;
        self.order.sort_by_key(|id| elements.get(id).map_or(i32::MIN, Element::level));
    }

    // --- Placement ---

    /// Move an element's center. A composite carries its members along
    /// rigidly: each member center has the old composite center subtracted
    /// and the new one added.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`], or [`SceneError::NonFinite`] if a
    /// moved center overflows.
    pub fn set_center(&mut self, id: ElementId, center: Point) -> Result<()> {
        let element = self.element(id)?;
        let old = element.center();
        let members: Vec<ElementId> = element.members().iter().map(|m| m.element).collect();
        let mut moved = Vec::with_capacity(members.len());
        for member in &members {
            let relative = self.element(*member)?.center().subtract(old)?;
            moved.push((*member, relative.add(center)?));
        }
        self.element_mut(id)?.set_center(center);
        for (member, target) in moved {
            self.set_center(member, target)?;
        }
        Ok(())
    }

    /// Move an element by `delta`.
    ///
    /// # Errors
    ///
    /// As [`Scene::set_center`].
    pub fn move_by(&mut self, id: ElementId, delta: Point) -> Result<()> {
        let target = self.element(id)?.center().add(delta)?;
        self.set_center(id, target)
    }

    // --- Copies ---

    /// Copy an element into the scene under a fresh id.
    ///
    /// The copy is named `new_name`, or `<name>_copy` when `new_name` is
    /// `None` and the original has a name. Listeners are shared with the
    /// original. Copying a composite also copies each member (with the
    /// member's own flags, not the muted ones) and makes the copies members
    /// of the new composite.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`], or [`SceneError::DuplicateName`] if a
    /// copy's name is taken. Nothing is added on error.
    pub fn copy_element(&mut self, id: ElementId, new_name: Option<String>) -> Result<ElementId> {
        let mut added = Vec::new();
        let result = self.copy_into(id, new_name, &mut added);
        if result.is_err() {
            for copy in added.into_iter().rev() {
                if let Err(e) = self.remove(copy) {
                    tracing::warn!(%copy, error = %e, "could not roll back partial copy");
                }
            }
        }
        result
    }

    fn copy_into(&mut self, id: ElementId, new_name: Option<String>, added: &mut Vec<ElementId>) -> Result<ElementId> {
        let original = self.element(id)?;
        let name = new_name.or_else(|| original.name().map(|n| format!("{n}_copy")));
        let mut copy = original.duplicate(name);
        let memberships = original.members().to_vec();
        if let Ok(members) = copy.members_mut() {
            members.clear();
        }
        let copy_id = self.insert(copy)?;
        added.push(copy_id);
        for membership in memberships {
            let member_copy = self.copy_into(membership.element, None, added)?;
            let member = self.element_mut(member_copy)?;
            membership.saved.restore(&mut member.interaction);
            self.add_member(copy_id, member_copy)?;
        }
        Ok(copy_id)
    }

    // --- Collision ---

    /// Plain elements standing for `id`: itself, or a composite's members
    /// expanded recursively.
    fn collision_leaves(&self, id: ElementId, out: &mut Vec<ElementId>) -> Result<()> {
        let element = self.element(id)?;
        if element.is_composite() {
            for membership in element.members() {
                self.collision_leaves(membership.element, out)?;
            }
        } else {
            out.push(id);
        }
        Ok(())
    }

    /// Whether `a` and `b` collide. A composite collides when any of its
    /// members does. An element never collides with itself.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`], or [`SceneError::NonFinite`] if a
    /// hitbox position overflows.
    pub fn collides(&self, a: ElementId, b: ElementId) -> Result<bool> {
        let mut left = Vec::new();
        let mut right = Vec::new();
        self.collision_leaves(a, &mut left)?;
        self.collision_leaves(b, &mut right)?;
        for l in &left {
            for r in &right {
                if l != r && self.element(*l)?.collides_with(self.element(*r)?)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Every other element colliding with `id`, in draw order.
    ///
    /// # Errors
    ///
    /// As [`Scene::collides`].
    pub fn check_collisions(&self, id: ElementId) -> Result<Vec<ElementId>> {
        self.element(id)?;
        let mut hits = Vec::new();
        for other in &self.order {
            if *other != id && self.collides(id, *other)? {
                hits.push(*other);
            }
        }
        Ok(hits)
    }

    // --- Animation ---

    /// Advance every sprite in the scene by one tick.
    pub fn animate(&mut self) {
        for element in self.elements.values_mut() {
            element.animate();
        }
    }
}
