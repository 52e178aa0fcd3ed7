//! Composite membership.
//!
//! A composite groups other scene elements. While a member, an element has
//! its clickable, draggable and pressable flags forced off so input goes to
//! the composite's own listeners; the flags it had on joining are restored
//! when it leaves.

#[cfg(test)]
#[path = "composite_test.rs"]
mod composite_test;

use crate::element::{ElementId, Membership, SavedFlags};
use crate::error::{Result, SceneError};
use crate::geom::Point;
use crate::scene::Scene;

impl Scene {
    /// Whether `target` is `from` or reachable through membership from it.
    fn reaches(&self, from: ElementId, target: ElementId) -> bool {
        from == target
            || self
                .get(from)
                .is_some_and(|e| e.members().iter().any(|m| self.reaches(m.element, target)))
    }

    fn check_member(&self, composite: ElementId, member: ElementId) -> Result<()> {
        let group = self.element(composite)?;
        if !group.is_composite() {
            return Err(SceneError::NotComposite(composite));
        }
        self.element(member)?;
        if group.has_member(member) {
            return Err(SceneError::AlreadyMember { composite, member });
        }
        if self.reaches(member, composite) {
            return Err(SceneError::MembershipCycle { composite, member });
        }
        Ok(())
    }

    fn admit(&mut self, composite: ElementId, member: ElementId) -> Result<()> {
        let element = self.element_mut(member)?;
        let saved = SavedFlags::capture(element.interaction);
        element.interaction.clickable = false;
        element.interaction.draggable = false;
        element.interaction.pressable = false;
        self.element_mut(composite)?.members_mut()?.push(Membership { element: member, saved });
        tracing::trace!(%composite, %member, "member added");
        Ok(())
    }

    /// Make `member` part of `composite`.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`] for either id,
    /// [`SceneError::NotComposite`], [`SceneError::AlreadyMember`], or
    /// [`SceneError::MembershipCycle`] when the composite would end up
    /// containing itself.
    pub fn add_member(&mut self, composite: ElementId, member: ElementId) -> Result<()> {
        self.check_member(composite, member)?;
        self.admit(composite, member)
    }

    /// Add several members. Either all are added or none.
    ///
    /// # Errors
    ///
    /// As [`Scene::add_member`], also when `members` lists an id twice.
    pub fn add_members(&mut self, composite: ElementId, members: &[ElementId]) -> Result<()> {
        for (i, member) in members.iter().enumerate() {
            self.check_member(composite, *member)?;
            if members[..i].contains(member) {
                return Err(SceneError::AlreadyMember { composite, member: *member });
            }
        }
        for member in members {
            self.admit(composite, *member)?;
        }
        Ok(())
    }

    /// Take `member` out of `composite` and restore its flags.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`], [`SceneError::NotComposite`] or
    /// [`SceneError::NotMember`].
    pub fn remove_member(&mut self, composite: ElementId, member: ElementId) -> Result<()> {
        let members = self.element_mut(composite)?.members_mut()?;
        let at = members
            .iter()
            .position(|m| m.element == member)
            .ok_or(SceneError::NotMember { composite, member })?;
        let membership = members.remove(at);
        if let Some(element) = self.get_mut(member) {
            membership.saved.restore(&mut element.interaction);
        }
        Ok(())
    }

    /// Member ids of `composite`, in the order they joined.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`] or [`SceneError::NotComposite`].
    pub fn members(&self, composite: ElementId) -> Result<Vec<ElementId>> {
        let group = self.element(composite)?;
        if !group.is_composite() {
            return Err(SceneError::NotComposite(composite));
        }
        Ok(group.members().iter().map(|m| m.element).collect())
    }

    /// Release every member, restoring their flags, and drop the
    /// composite's listeners.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`] or [`SceneError::NotComposite`].
    pub fn reset_composite(&mut self, composite: ElementId) -> Result<()> {
        let group = self.element_mut(composite)?;
        let released: Vec<Membership> = group.members_mut()?.drain(..).collect();
        group.clear_listeners();
        for membership in released {
            if let Some(element) = self.get_mut(membership.element) {
                membership.saved.restore(&mut element.interaction);
            }
        }
        Ok(())
    }

    /// Rotate every member's center by `angle` radians around `origin`.
    ///
    /// With `keep_orientation` the members keep their own rotation;
    /// otherwise `angle` is added to it. Member composites move their own
    /// members along rigidly.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownElement`], [`SceneError::NotComposite`], or
    /// [`SceneError::NonFinite`] for a non-finite angle.
    pub fn rotate_members(
        &mut self,
        composite: ElementId,
        origin: Point,
        angle: f64,
        keep_orientation: bool,
    ) -> Result<()> {
        for member in self.members(composite)? {
            let center = self.element(member)?.center().rotate_around(origin, angle)?;
            self.set_center(member, center)?;
            if !keep_orientation {
                let element = self.element_mut(member)?;
                let rotation = element.rotation() + angle;
                element.set_rotation(rotation)?;
            }
        }
        Ok(())
    }
}
