//! World-level errors, error joining, and the fatal escalation protocol.
//!
//! Library operations return the concrete [`WorldError`]. User-supplied
//! systems and actions return [`anyhow::Result`], which keeps the cause
//! chain open for composition — in particular for the [`Fatal`] marker,
//! which any error can carry anywhere in its chain to abort the run loop.

use anyhow::Result;

use cadence_component::{ComponentError, EntityId};

/// Errors produced by world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The identity addresses no allocated entity slot.
    #[error("no entity with id {0}")]
    NoSuchEntity(EntityId),

    /// The entity slot is currently marked deleted.
    #[error("{0} is marked deleted")]
    EntityDeleted(EntityId),

    /// A registry's slot count no longer matches the entity table.
    ///
    /// This is a programming-error-level invariant breach, not a
    /// recoverable condition: world and registries are only ever resized
    /// together.
    #[error("registry for {component} is out of sync with the entity table")]
    RegistryDesync {
        /// The component type whose registry failed the invariant.
        component: &'static str,
    },

    /// The entity was deleted, but one or more registries genuinely failed
    /// to clean up its components.
    #[error("{entity} deleted, but component cleanup failed")]
    CleanupFailed {
        /// The deleted entity.
        entity: EntityId,
        /// The collected per-registry failures.
        #[source]
        source: ErrorList,
    },

    /// A registry slot operation failed.
    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// A joined collection of errors that are reported together.
///
/// Used wherever the engine accumulates instead of short-circuiting: the
/// sequential actions of a phase, the per-entity operations of a piped
/// system, and registry cleanup during entity deletion.
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<anyhow::Error>,
}

impl ErrorList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error to the list.
    pub fn push(&mut self, err: impl Into<anyhow::Error>) {
        self.errors.push(err.into());
    }

    /// Returns `true` if no errors have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The collected errors.
    #[must_use]
    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }

    /// `Ok(())` if empty, otherwise the whole list as one error.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow::Error::new(self))
        }
    }
}

impl std::fmt::Display for ErrorList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} joined error(s)", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            write!(f, "\n  {}: {err:#}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

impl FromIterator<anyhow::Error> for ErrorList {
    fn from_iter<I: IntoIterator<Item = anyhow::Error>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// Marker error that escalates any failure to a run-loop abort.
///
/// Attach it anywhere in an error's cause chain — most conveniently via
/// [`FatalExt::fatal`] — and [`World::run`](crate::world::World::run) will
/// return immediately, skipping every remaining phase.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("fatal error")]
pub struct Fatal;

/// Marks a result's error as fatal.
pub trait FatalExt<T> {
    /// Attach the [`Fatal`] marker to the error chain.
    fn fatal(self) -> Result<T>;
}

impl<T, E: Into<anyhow::Error>> FatalExt<T> for Result<T, E> {
    fn fatal(self) -> Result<T> {
        self.map_err(|err| err.into().context(Fatal))
    }
}

/// Returns `true` if the error's cause chain carries the [`Fatal`] marker.
///
/// Joined errors are searched recursively, so a single fatal per-entity
/// failure inside a piped system escalates the whole phase result.
#[must_use]
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<Fatal>().is_some()
            || cause
                .downcast_ref::<ErrorList>()
                .is_some_and(|list| list.errors().iter().any(is_fatal))
    })
}
