//! Core [`Component`] trait and component type identity.
//!
//! Every piece of data attached to an entity must implement [`Component`].
//! The trait requires `Send + Sync + 'static` so components can be shared
//! with the systems running in parallel during a phase.
//!
//! Type identity is carried by [`ComponentTypeId`], which wraps the
//! compiler-assigned [`std::any::TypeId`]. Unlike a self-reported name
//! string, a `TypeId` cannot collide between two distinct component types,
//! which makes "one registry per component type per world" enforceable.

use std::any::TypeId;

/// The core component trait.
///
/// Implementing `Component` is an explicit opt-in: it marks a type as
/// storable in a world registry, with at most one instance per entity.
///
/// # Examples
///
/// ```rust
/// use cadence_component::Component;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {}
/// ```
pub trait Component: Send + Sync + 'static {}

/// A unique identifier for a component type.
///
/// Equality and hashing consider only the underlying [`TypeId`]; the type
/// name is carried along purely for diagnostics and log output.
#[derive(Debug, Clone, Copy)]
pub struct ComponentTypeId {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentTypeId {
    /// Compute the [`ComponentTypeId`] for a component type `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// The human-readable name of the component type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentTypeId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentTypeId {}

impl std::hash::Hash for ComponentTypeId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl std::fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Health;
    impl Component for Health {}

    #[derive(Debug)]
    struct Velocity;
    impl Component for Velocity {}

    #[test]
    fn test_type_id_is_stable() {
        assert_eq!(ComponentTypeId::of::<Health>(), ComponentTypeId::of::<Health>());
    }

    #[test]
    fn test_type_id_differs_between_types() {
        assert_ne!(ComponentTypeId::of::<Health>(), ComponentTypeId::of::<Velocity>());
    }

    #[test]
    fn test_type_id_carries_name() {
        assert!(ComponentTypeId::of::<Health>().name().ends_with("Health"));
    }

    #[test]
    fn test_type_id_usable_as_map_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(ComponentTypeId::of::<Health>(), 1u32);
        map.insert(ComponentTypeId::of::<Velocity>(), 2u32);
        assert_eq!(map.get(&ComponentTypeId::of::<Health>()), Some(&1));
        assert_eq!(map.len(), 2);
    }
}
