//! Entity identity.
//!
//! An [`EntityId`] is a lightweight `u64` identifier with no inherent data.
//! Identities double as slot indices into every dense component registry, so
//! they are allocated densely starting from zero and recycled FIFO by the
//! world after deletion.

/// A unique entity identifier.
///
/// Entities are pure identifiers — they carry no data of their own.
/// Components and tags are attached to an entity's world-owned record to
/// give it meaning.
///
/// An `EntityId` is unique among currently-live entities, but is recycled
/// once the entity is deleted. Holding on to the id of a deleted entity and
/// using it after a respawn will address the new occupant of the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create an entity id from a raw `u64`.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns the dense slot index this identity addresses.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let e = EntityId::from_raw(42);
        assert_eq!(e.id(), 42);
        assert_eq!(e.index(), 42);
    }

    #[test]
    fn test_entity_id_ordering_follows_allocation_order() {
        assert!(EntityId::from_raw(0) < EntityId::from_raw(1));
        assert!(EntityId::from_raw(1) < EntityId::from_raw(100));
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::from_raw(7).to_string(), "Entity(7)");
    }
}
