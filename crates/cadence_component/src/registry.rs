//! Dense, identity-indexed storage for a single component type.
//!
//! A [`Registry`] holds one slot per entity the owning world has ever
//! allocated, whether or not the entity uses this component type. The world
//! keeps every registry's length in lock-step with its entity table:
//! allocating a brand-new identity calls [`Registry::grow`] on every
//! registry, and recycled identities reuse their existing slot.
//!
//! Slots are individually locked so systems running in parallel during a
//! phase can read and write component *values* through a shared world
//! reference. Structural changes — assigning, removing, growing — require
//! `&mut` and therefore cannot overlap an in-flight phase.
//!
//! Heterogeneous registries are reachable through one uniform lookup via
//! [`AnyRegistry`], which erases the component type down to the small
//! operation set the world needs during entity lifecycle management. The
//! statically-typed surface is recovered with a checked downcast.

use std::any::Any;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::component::Component;
use crate::entity::EntityId;
use crate::error::ComponentError;

/// A shared read guard over one stored component value.
pub type ComponentRead<'a, C> = MappedRwLockReadGuard<'a, C>;

/// An exclusive write guard over one stored component value.
pub type ComponentWrite<'a, C> = MappedRwLockWriteGuard<'a, C>;

/// Dense storage for all instances of one component type.
///
/// `slots[i]` is `Some` exactly when entity `i` currently has this
/// component. Removal drops the stored value.
#[derive(Debug, Default)]
pub struct Registry<C: Component> {
    slots: Vec<RwLock<Option<C>>>,
}

impl<C: Component> Registry<C> {
    /// Create a registry pre-grown to `len` vacant slots, one per entity
    /// the owning world has already allocated.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || RwLock::new(None));
        Self { slots }
    }

    /// Append exactly one vacant slot.
    ///
    /// Called once per registry every time the world allocates a brand-new
    /// identity, so slot count and entity table length never diverge.
    pub fn grow(&mut self) {
        self.slots.push(RwLock::new(None));
    }

    /// Store `value` for `id` and return a reference to the stored value.
    ///
    /// Fails with [`ComponentError::AlreadyAssigned`] if the slot is
    /// occupied; the existing value is left untouched.
    pub fn assign(&mut self, id: EntityId, value: C) -> Result<&mut C, ComponentError> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(ComponentError::NoSuchEntity(id))?
            .get_mut();

        if slot.is_some() {
            return Err(ComponentError::AlreadyAssigned {
                entity: id,
                component: std::any::type_name::<C>(),
            });
        }

        Ok(slot.insert(value))
    }

    /// Read the component stored for `id`.
    pub fn get(&self, id: EntityId) -> Result<ComponentRead<'_, C>, ComponentError> {
        let slot = self
            .slots
            .get(id.index())
            .ok_or(ComponentError::NoSuchEntity(id))?;

        RwLockReadGuard::try_map(slot.read(), Option::as_ref).map_err(|_| {
            ComponentError::NotAssigned {
                entity: id,
                component: std::any::type_name::<C>(),
            }
        })
    }

    /// Write access to the component stored for `id`.
    pub fn get_mut(&self, id: EntityId) -> Result<ComponentWrite<'_, C>, ComponentError> {
        let slot = self
            .slots
            .get(id.index())
            .ok_or(ComponentError::NoSuchEntity(id))?;

        RwLockWriteGuard::try_map(slot.write(), Option::as_mut).map_err(|_| {
            ComponentError::NotAssigned {
                entity: id,
                component: std::any::type_name::<C>(),
            }
        })
    }

    /// Drop the component stored for `id`, leaving the slot vacant.
    pub fn remove(&mut self, id: EntityId) -> Result<(), ComponentError> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(ComponentError::NoSuchEntity(id))?
            .get_mut();

        match slot.take() {
            Some(_) => Ok(()),
            None => Err(ComponentError::NotAssigned {
                entity: id,
                component: std::any::type_name::<C>(),
            }),
        }
    }

    /// Number of allocated slots (assigned or vacant).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slots have been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The type-erased registry surface.
///
/// Exposes only the operations the world needs without knowing the
/// component type: growing on spawn, removing on delete, and the length
/// check backing the table/registry synchronization invariant. Typed access
/// goes through [`AnyRegistry::as_any`] with a checked downcast back to
/// [`Registry<C>`].
pub trait AnyRegistry: Send + Sync {
    /// Append exactly one vacant slot.
    fn grow(&mut self);

    /// Drop the component stored for `id`, if any.
    fn remove(&mut self, id: EntityId) -> Result<(), ComponentError>;

    /// Number of allocated slots.
    fn len(&self) -> usize;

    /// The name of the stored component type, for diagnostics.
    fn component_name(&self) -> &'static str;

    /// Upcast for checked downcasting to the concrete registry.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for checked downcasting to the concrete registry.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> AnyRegistry for Registry<C> {
    fn grow(&mut self) {
        Registry::grow(self);
    }

    fn remove(&mut self, id: EntityId) -> Result<(), ComponentError> {
        Registry::remove(self, id)
    }

    fn len(&self) -> usize {
        Registry::len(self)
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[test]
    fn test_with_len_allocates_vacant_slots() {
        let reg: Registry<Position> = Registry::with_len(3);
        assert_eq!(reg.len(), 3);
        for i in 0..3 {
            let err = reg.get(EntityId::from_raw(i)).unwrap_err();
            assert!(err.is_not_assigned());
        }
    }

    #[test]
    fn test_assign_then_get() {
        let mut reg = Registry::with_len(1);
        let id = EntityId::from_raw(0);
        reg.assign(id, Position { x: 1.0, y: 2.0 }).unwrap();

        let pos = reg.get(id).unwrap();
        assert_eq!(*pos, Position { x: 1.0, y: 2.0 });
    }

    #[test]
    fn test_double_assign_keeps_first_value() {
        let mut reg = Registry::with_len(1);
        let id = EntityId::from_raw(0);
        reg.assign(id, Position { x: 1.0, y: 0.0 }).unwrap();

        let err = reg.assign(id, Position { x: 2.0, y: 0.0 }).unwrap_err();
        assert!(matches!(err, ComponentError::AlreadyAssigned { .. }));
        assert_eq!(reg.get(id).unwrap().x, 1.0);
    }

    #[test]
    fn test_assign_out_of_range() {
        let mut reg = Registry::with_len(1);
        let err = reg
            .assign(EntityId::from_raw(1), Position { x: 0.0, y: 0.0 })
            .unwrap_err();
        assert!(matches!(err, ComponentError::NoSuchEntity(_)));
    }

    #[test]
    fn test_remove_vacant_slot() {
        let mut reg: Registry<Position> = Registry::with_len(1);
        let err = reg.remove(EntityId::from_raw(0)).unwrap_err();
        assert!(err.is_not_assigned());
    }

    #[test]
    fn test_remove_then_get_is_not_assigned() {
        let mut reg = Registry::with_len(1);
        let id = EntityId::from_raw(0);
        reg.assign(id, Position { x: 1.0, y: 1.0 }).unwrap();
        reg.remove(id).unwrap();

        assert!(reg.get(id).unwrap_err().is_not_assigned());
    }

    #[test]
    fn test_slot_reusable_after_remove() {
        let mut reg = Registry::with_len(1);
        let id = EntityId::from_raw(0);
        reg.assign(id, Position { x: 1.0, y: 1.0 }).unwrap();
        reg.remove(id).unwrap();
        reg.assign(id, Position { x: 9.0, y: 9.0 }).unwrap();

        assert_eq!(reg.get(id).unwrap().x, 9.0);
    }

    #[test]
    fn test_grow_appends_one_vacant_slot() {
        let mut reg: Registry<Position> = Registry::with_len(0);
        reg.grow();
        reg.grow();
        assert_eq!(reg.len(), 2);
        assert!(reg.get(EntityId::from_raw(1)).unwrap_err().is_not_assigned());
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut reg = Registry::with_len(1);
        let id = EntityId::from_raw(0);
        reg.assign(id, Position { x: 0.0, y: 0.0 }).unwrap();

        reg.get_mut(id).unwrap().x = 5.0;
        assert_eq!(reg.get(id).unwrap().x, 5.0);
    }

    #[test]
    fn test_erased_registry_roundtrip() {
        let mut boxed: Box<dyn AnyRegistry> = Box::new(Registry::<Position>::with_len(1));
        boxed.grow();
        assert_eq!(boxed.len(), 2);
        assert!(boxed.component_name().ends_with("Position"));

        let reg = boxed
            .as_any_mut()
            .downcast_mut::<Registry<Position>>()
            .unwrap();
        reg.assign(EntityId::from_raw(1), Position { x: 3.0, y: 4.0 })
            .unwrap();
        assert_eq!(reg.get(EntityId::from_raw(1)).unwrap().y, 4.0);
    }
}
