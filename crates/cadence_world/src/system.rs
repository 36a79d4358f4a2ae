//! Systems, actions, and the per-phase execution context.
//!
//! A **system** iterates entities and runs concurrently with the other
//! systems of its phase; an **action** operates on world and lifecycle
//! state only and runs sequentially, in registration order, on the
//! dispatching thread. Both return [`anyhow::Result`] so any domain error
//! can be escalated with the [`Fatal`](crate::error::Fatal) marker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::entity::{Entities, EntityRef};
use crate::error::ErrorList;
use crate::phase::Phase;
use crate::world::World;

/// Sequential per-phase logic over world state. No entity iteration.
pub(crate) type BoxedAction<S> = Arc<dyn Fn(&mut World<S>) -> Result<()> + Send + Sync>;

/// Concurrent per-phase logic over the live-entity view.
pub(crate) type BoxedSystem<S> =
    Arc<dyn for<'w> Fn(&SystemContext<'w, S>) -> Result<()> + Send + Sync>;

/// Advisory cancellation signal shared by the systems of one phase.
///
/// Raised after the first system error; systems are never forcibly
/// interrupted, but long-running ones can poll
/// [`SystemContext::is_cancelled`] and wind down early.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once a sibling system has failed.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Context handed to a system for one phase dispatch.
///
/// Carries the world, the dispatching phase, and the phase's cancellation
/// token. The entity view is recomputed on every [`SystemContext::entities`]
/// call against the live table.
pub struct SystemContext<'w, S> {
    world: &'w World<S>,
    phase: Phase,
    cancel: CancelToken,
}

impl<'w, S> SystemContext<'w, S> {
    pub(crate) fn new(world: &'w World<S>, phase: Phase, cancel: CancelToken) -> Self {
        Self {
            world,
            phase,
            cancel,
        }
    }

    /// The world being dispatched.
    #[must_use]
    pub fn world(&self) -> &'w World<S> {
        self.world
    }

    /// The phase this system was dispatched under.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The lazy view over all currently live entities.
    #[must_use]
    pub fn entities(&self) -> Entities<'w, S> {
        self.world.entities()
    }

    /// Returns `true` once a sibling system of this phase has failed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_raised()
    }
}

impl<S> std::fmt::Debug for SystemContext<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemContext")
            .field("phase", &self.phase)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Build a system from a per-entity projection and an operation on the
/// projected value.
///
/// `pipe` decides which entities are relevant and computes a typed view of
/// each; `operation` acts on the view. Every projected item is visited and
/// per-item errors are joined into the system's single result — a piped
/// system never stops early on a per-entity failure. A failure only aborts
/// the run loop if the operation marks it
/// [`fatal`](crate::error::FatalExt::fatal).
///
/// # Examples
///
/// ```rust,ignore
/// let movement = piped_system(
///     |entity| {
///         let velocity = *entity.component::<Velocity>().ok()?;
///         Some((entity.id(), velocity))
///     },
///     |ctx, (id, velocity)| {
///         ctx.world().component_mut::<Position>(id)?.advance(velocity);
///         Ok(())
///     },
/// );
/// world.system(Phase::ON_UPDATE, movement);
/// ```
pub fn piped_system<S, D, P, O>(
    pipe: P,
    operation: O,
) -> impl for<'w> Fn(&SystemContext<'w, S>) -> Result<()> + Send + Sync
where
    P: for<'w> Fn(EntityRef<'w, S>) -> Option<D> + Send + Sync,
    O: for<'w> Fn(&SystemContext<'w, S>, D) -> Result<()> + Send + Sync,
{
    move |ctx| {
        let mut joined = ErrorList::new();
        for entity in ctx.entities() {
            if let Some(view) = pipe(entity) {
                if let Err(err) = operation(ctx, view) {
                    joined.push(err);
                }
            }
        }
        joined.into_result()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use cadence_component::{Component, EntityId};

    use crate::error::is_fatal;
    use crate::error::{ErrorList, FatalExt};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Score(i32);
    impl Component for Score {}

    fn test_context<S>(world: &World<S>) -> SystemContext<'_, S> {
        SystemContext::new(world, Phase::ON_UPDATE, CancelToken::new())
    }

    #[test]
    fn test_cancel_token_starts_lowered() {
        let token = CancelToken::new();
        assert!(!token.is_raised());
        token.raise();
        assert!(token.is_raised());
    }

    #[test]
    fn test_piped_system_visits_only_projected_entities() {
        let mut world: World<()> = World::new(());
        for points in [1, 2, 3] {
            let id = world.spawn();
            world.set_component(id, Score(points)).unwrap();
        }
        let unscored = world.spawn();
        let _ = unscored;

        let visited = std::sync::Mutex::new(Vec::new());
        let system = piped_system(
            |entity| {
                let score = *entity.component::<Score>().ok()?;
                Some((entity.id(), score))
            },
            |_ctx, (id, score): (EntityId, Score)| {
                visited.lock().unwrap().push((id, score.0));
                Ok(())
            },
        );

        system(&test_context(&world)).unwrap();
        assert_eq!(visited.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_piped_system_joins_per_entity_errors() {
        let mut world: World<()> = World::new(());
        for points in [1, -2, -3] {
            let id = world.spawn();
            world.set_component(id, Score(points)).unwrap();
        }

        let system = piped_system(
            |entity| entity.component::<Score>().ok().map(|s| *s),
            |_ctx, score: Score| {
                if score.0 < 0 {
                    Err(anyhow!("negative score {}", score.0))
                } else {
                    Ok(())
                }
            },
        );

        let err = system(&test_context(&world)).unwrap_err();
        let joined = err.downcast_ref::<ErrorList>().unwrap();
        assert_eq!(joined.len(), 2);
        assert!(!is_fatal(&err));
    }

    #[test]
    fn test_piped_system_fatal_item_escalates() {
        let mut world: World<()> = World::new(());
        let id = world.spawn();
        world.set_component(id, Score(-1)).unwrap();

        let system = piped_system(
            |entity| entity.component::<Score>().ok().map(|s| *s),
            |_ctx, score: Score| {
                if score.0 < 0 {
                    Err(anyhow!("corrupted score")).fatal()
                } else {
                    Ok(())
                }
            },
        );

        let err = system(&test_context(&world)).unwrap_err();
        assert!(is_fatal(&err));
    }

    #[test]
    fn test_piped_system_can_mutate_components() {
        let mut world: World<()> = World::new(());
        let id = world.spawn();
        world.set_component(id, Score(41)).unwrap();

        let system = piped_system(
            |entity| entity.has_component::<Score>().ok()?.then(|| entity.id()),
            |ctx, id: EntityId| {
                ctx.world().component_mut::<Score>(id)?.0 += 1;
                Ok(())
            },
        );

        system(&test_context(&world)).unwrap();
        assert_eq!(world.component::<Score>(id).unwrap().0, 42);
    }
}
