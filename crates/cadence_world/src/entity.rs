//! Entity handles and tag sets.
//!
//! An [`EntityRef`] is a pure index into world-owned storage: every
//! accessor resolves through the world's authoritative record for that
//! identity at call time, so a handle can never disagree with the world
//! about deletion state, tags, or components. Two handles to the same
//! identity observe the same tag set.

use std::collections::BTreeSet;

use parking_lot::RwLock;

use cadence_component::{Component, ComponentRead, ComponentWrite, EntityId};

use crate::error::WorldError;
use crate::world::World;

/// The world-owned record backing one entity slot.
///
/// Records are reinitialized in place when a recycled identity is
/// respawned; the table itself never shrinks.
#[derive(Debug, Default)]
pub(crate) struct EntityRecord {
    pub(crate) deleted: bool,
    pub(crate) tags: RwLock<BTreeSet<String>>,
}

impl EntityRecord {
    /// Reset the record for a fresh occupant of the slot.
    pub(crate) fn reset(&mut self) {
        self.deleted = false;
        self.tags = RwLock::new(BTreeSet::new());
    }
}

/// A handle to one entity, bound to its owning world.
///
/// Obtained from [`World::entity`] or by iterating [`World::entities`].
/// The handle is `Copy` and carries no entity state of its own.
pub struct EntityRef<'w, S> {
    world: &'w World<S>,
    id: EntityId,
}

impl<'w, S> EntityRef<'w, S> {
    /// Only the world constructs handles, after bounds-checking the id.
    pub(crate) fn new(world: &'w World<S>, id: EntityId) -> Self {
        Self { world, id }
    }

    fn record(&self) -> &'w EntityRecord {
        // The table never shrinks and the id was bounds-checked at
        // construction.
        &self.world.records[self.id.index()]
    }

    /// The entity's identity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns `true` if the entity is currently marked deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.record().deleted
    }

    /// A snapshot of the entity's current tags, in order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.record().tags.read().iter().cloned().collect()
    }

    /// Add a tag. A no-op if the tag is already present.
    pub fn push_tag(&self, tag: impl Into<String>) {
        self.record().tags.write().insert(tag.into());
    }

    /// Remove a tag. A no-op if the tag is absent.
    pub fn remove_tag(&self, tag: &str) {
        self.record().tags.write().remove(tag);
    }

    /// Returns `true` if the entity carries the tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.record().tags.read().contains(tag)
    }

    /// Read this entity's component of type `C`.
    pub fn component<C: Component>(&self) -> Result<ComponentRead<'w, C>, WorldError> {
        self.world.component(self.id)
    }

    /// Write access to this entity's component of type `C`.
    pub fn component_mut<C: Component>(&self) -> Result<ComponentWrite<'w, C>, WorldError> {
        self.world.component_mut(self.id)
    }

    /// Returns `true` if this entity has a component of type `C`.
    pub fn has_component<C: Component>(&self) -> Result<bool, WorldError> {
        self.world.has_component::<C>(self.id)
    }
}

// Manual impls: the handle is always Copy, whatever the state payload is.
impl<S> Clone for EntityRef<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for EntityRef<'_, S> {}

impl<S> std::fmt::Debug for EntityRef<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("id", &self.id)
            .field("deleted", &self.is_deleted())
            .finish()
    }
}

/// Lazy view over all currently live entities.
///
/// Computed at iteration time against the live entity table, not a frozen
/// snapshot: a slot deleted before the cursor reaches it is skipped.
pub struct Entities<'w, S> {
    world: &'w World<S>,
    next: usize,
}

impl<'w, S> Entities<'w, S> {
    pub(crate) fn new(world: &'w World<S>) -> Self {
        Self { world, next: 0 }
    }
}

impl<'w, S> Iterator for Entities<'w, S> {
    type Item = EntityRef<'w, S>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.world.records.len() {
            let index = self.next;
            self.next += 1;
            if !self.world.records[index].deleted {
                return Some(EntityRef::new(self.world, EntityId::from_raw(index as u64)));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_operations_are_idempotent() {
        let mut world: World<()> = World::new(());
        let id = world.spawn();
        let entity = world.entity(id).unwrap();

        entity.push_tag("enemy");
        entity.push_tag("enemy");
        assert!(entity.has_tag("enemy"));
        assert_eq!(entity.tags(), vec!["enemy".to_string()]);

        entity.remove_tag("enemy");
        entity.remove_tag("enemy");
        assert!(!entity.has_tag("enemy"));
        assert!(entity.tags().is_empty());
    }

    #[test]
    fn test_tags_snapshot_is_ordered() {
        let mut world: World<()> = World::new(());
        let id = world.spawn();
        let entity = world.entity(id).unwrap();

        entity.push_tag("zebra");
        entity.push_tag("apple");
        assert_eq!(entity.tags(), vec!["apple".to_string(), "zebra".to_string()]);
    }

    #[test]
    fn test_handle_aliases_observe_same_tags() {
        let mut world: World<()> = World::new(());
        let id = world.spawn();

        let a = world.entity(id).unwrap();
        let b = world.entity(id).unwrap();
        a.push_tag("shared");
        assert!(b.has_tag("shared"));
    }

    #[test]
    fn test_handle_sees_deletion_through_world() {
        let mut world: World<()> = World::new(());
        let id = world.spawn();
        assert!(!world.entity(id).unwrap().is_deleted());

        world.delete(id).unwrap();
        assert!(world.entity(id).unwrap().is_deleted());
    }

    #[test]
    fn test_respawn_gets_fresh_tags() {
        let mut world: World<()> = World::new(());
        let id = world.spawn();
        world.entity(id).unwrap().push_tag("old");
        world.delete(id).unwrap();

        let recycled = world.spawn();
        assert_eq!(recycled, id);
        assert!(!world.entity(recycled).unwrap().has_tag("old"));
    }

    #[test]
    fn test_entities_view_skips_deleted() {
        let mut world: World<()> = World::new(());
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.delete(b).unwrap();

        let live: Vec<EntityId> = world.entities().map(|e| e.id()).collect();
        assert_eq!(live, vec![a, c]);
    }

    #[test]
    fn test_entity_out_of_range_is_none() {
        let world: World<()> = World::new(());
        assert!(world.entity(EntityId::from_raw(0)).is_none());
    }
}
