//! Component-layer error types.

use crate::entity::EntityId;

/// Errors produced by registry slot operations.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// The identity lies outside the registry's allocated slot range.
    #[error("no slot allocated for {0}")]
    NoSuchEntity(EntityId),

    /// The slot already holds a component; the existing value is untouched.
    #[error("component {component} is already assigned to {entity}")]
    AlreadyAssigned {
        /// The addressed entity.
        entity: EntityId,
        /// The component type name.
        component: &'static str,
    },

    /// The slot holds no component.
    #[error("component {component} is not assigned to {entity}")]
    NotAssigned {
        /// The addressed entity.
        entity: EntityId,
        /// The component type name.
        component: &'static str,
    },
}

impl ComponentError {
    /// Returns `true` for the "slot holds no component" case.
    ///
    /// Callers that treat absence as a non-event (`has_component`, entity
    /// deletion cleanup) branch on this instead of matching the variant.
    #[must_use]
    pub const fn is_not_assigned(&self) -> bool {
        matches!(self, Self::NotAssigned { .. })
    }
}
