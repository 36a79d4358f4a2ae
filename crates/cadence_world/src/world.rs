//! World — entity lifecycle, component access, and phase dispatch.
//!
//! The [`World`] is the single owner of all entities and registries and the
//! only component through which they may be mutated. It also drives the run
//! loop: [`World::run`] dispatches `ON_START` once, sweeps the registered
//! loop phases until quit is signaled, then dispatches `ON_END` once.
//!
//! Structural mutation — spawning, deleting, first-assigning a component —
//! takes `&mut self`, while the systems of an in-flight phase only ever see
//! `&World`. The prohibition on structural changes during parallel system
//! execution is therefore enforced by the borrow checker rather than left
//! to convention; component *values* stay writable through per-slot locks.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use cadence_component::{
    AnyRegistry, Component, ComponentError, ComponentRead, ComponentTypeId, ComponentWrite,
    EntityId, Registry,
};

use crate::entity::{Entities, EntityRecord, EntityRef};
use crate::error::{ErrorList, WorldError, is_fatal};
use crate::module::Module;
use crate::phase::Phase;
use crate::system::{BoxedAction, BoxedSystem, CancelToken, SystemContext};

/// A cloneable, thread-safe request to stop the run loop.
///
/// Obtained from [`World::quit_signal`]; raising it from any thread makes
/// the run loop stop once the current phase sweep completes.
#[derive(Debug, Clone, Default)]
pub struct QuitSignal(Arc<AtomicBool>);

impl QuitSignal {
    /// Request the run loop to stop.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once quit has been requested.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Coordinates the game lifecycle: owns all entities and registries, keeps
/// them synchronized, and dispatches the registered actions and systems
/// phase by phase.
///
/// `S` is the caller-supplied state payload, reachable from actions
/// (mutably) and systems (shared).
pub struct World<S> {
    state: S,

    pub(crate) records: Vec<EntityRecord>,
    free_ids: VecDeque<EntityId>,

    registries: HashMap<ComponentTypeId, Box<dyn AnyRegistry>>,

    phases: Vec<Phase>,
    actions: HashMap<Phase, Vec<BoxedAction<S>>>,
    systems: HashMap<Phase, Vec<BoxedSystem<S>>>,

    quit: QuitSignal,
}

impl<S> World<S> {
    /// Create a world around the given state payload.
    #[must_use]
    pub fn new(state: S) -> Self {
        info!("creating world");
        Self {
            state,
            records: Vec::new(),
            free_ids: VecDeque::new(),
            registries: HashMap::new(),
            phases: Vec::new(),
            actions: HashMap::new(),
            systems: HashMap::new(),
            quit: QuitSignal::default(),
        }
    }

    /// The caller-supplied state payload.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable access to the state payload.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    // --- entity lifecycle ---------------------------------------------------

    /// Create a new entity and return its identity.
    ///
    /// The earliest-freed identity is recycled first; only when the free
    /// list is empty is a brand-new identity allocated, in which case every
    /// registry grows by one slot so lengths stay in lock-step with the
    /// entity table.
    pub fn spawn(&mut self) -> EntityId {
        let id = match self.free_ids.pop_front() {
            Some(id) => {
                self.records[id.index()].reset();
                id
            }
            None => {
                let id = EntityId::from_raw(self.records.len() as u64);
                self.records.push(EntityRecord::default());
                for registry in self.registries.values_mut() {
                    registry.grow();
                }
                id
            }
        };

        debug!(id = %id, "spawned entity");
        id
    }

    /// Remove an entity from the world.
    ///
    /// Marks the record deleted, queues the identity for reuse, and removes
    /// the entity's components from every registry. Registries that never
    /// held a component for this entity are not a failure; only a genuine
    /// cleanup error (a registry out of sync with the entity table) is
    /// reported, joined into [`WorldError::CleanupFailed`].
    pub fn delete(&mut self, id: EntityId) -> Result<(), WorldError> {
        let record = self
            .records
            .get_mut(id.index())
            .ok_or(WorldError::NoSuchEntity(id))?;
        if record.deleted {
            return Err(WorldError::EntityDeleted(id));
        }

        record.deleted = true;
        self.free_ids.push_back(id);

        let mut failures = ErrorList::new();
        for registry in self.registries.values_mut() {
            if let Err(err) = registry.remove(id) {
                if !err.is_not_assigned() {
                    failures.push(err);
                }
            }
        }
        if !failures.is_empty() {
            return Err(WorldError::CleanupFailed {
                entity: id,
                source: failures,
            });
        }

        debug!(id = %id, "deleted entity");
        Ok(())
    }

    /// A handle to the entity with the given identity, deleted or not.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_, S>> {
        (id.index() < self.records.len()).then(|| EntityRef::new(self, id))
    }

    /// The lazy view over all currently live entities.
    #[must_use]
    pub fn entities(&self) -> Entities<'_, S> {
        Entities::new(self)
    }

    /// Total allocated entity slots (live and recycled-but-allocated).
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.records.len()
    }

    // --- component access ---------------------------------------------------

    /// Associate a component with an entity.
    ///
    /// The registry for `C` is created on first use, pre-grown to the
    /// entity table length. Fails with
    /// [`ComponentError::AlreadyAssigned`] if the entity already has a `C`;
    /// the existing value is left untouched.
    pub fn set_component<C: Component>(&mut self, id: EntityId, value: C) -> Result<(), WorldError> {
        self.ensure_live(id)?;

        let len = self.records.len();
        let registry = self
            .registries
            .entry(ComponentTypeId::of::<C>())
            .or_insert_with(|| Box::new(Registry::<C>::with_len(len)));
        let Some(registry) = registry.as_any_mut().downcast_mut::<Registry<C>>() else {
            return Err(WorldError::RegistryDesync {
                component: std::any::type_name::<C>(),
            });
        };

        match registry.assign(id, value) {
            Ok(_) => Ok(()),
            // The table said the id is live, so an out-of-range slot means
            // the registry fell out of sync.
            Err(ComponentError::NoSuchEntity(_)) => Err(WorldError::RegistryDesync {
                component: std::any::type_name::<C>(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Read the component of type `C` assigned to an entity.
    pub fn component<C: Component>(&self, id: EntityId) -> Result<ComponentRead<'_, C>, WorldError> {
        self.ensure_live(id)?;

        let Some(registry) = self.registry::<C>() else {
            // No registry yet: no entity anywhere has this component.
            return Err(WorldError::Component(ComponentError::NotAssigned {
                entity: id,
                component: std::any::type_name::<C>(),
            }));
        };

        match registry.get(id) {
            Ok(guard) => Ok(guard),
            Err(ComponentError::NoSuchEntity(_)) => Err(WorldError::RegistryDesync {
                component: std::any::type_name::<C>(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Write access to the component of type `C` assigned to an entity.
    pub fn component_mut<C: Component>(
        &self,
        id: EntityId,
    ) -> Result<ComponentWrite<'_, C>, WorldError> {
        self.ensure_live(id)?;

        let Some(registry) = self.registry::<C>() else {
            return Err(WorldError::Component(ComponentError::NotAssigned {
                entity: id,
                component: std::any::type_name::<C>(),
            }));
        };

        match registry.get_mut(id) {
            Ok(guard) => Ok(guard),
            Err(ComponentError::NoSuchEntity(_)) => Err(WorldError::RegistryDesync {
                component: std::any::type_name::<C>(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns `true` if the entity currently has a component of type `C`.
    ///
    /// "Not assigned" is `false`; every other failure propagates.
    pub fn has_component<C: Component>(&self, id: EntityId) -> Result<bool, WorldError> {
        match self.component::<C>(id) {
            Ok(_) => Ok(true),
            Err(WorldError::Component(err)) if err.is_not_assigned() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn registry<C: Component>(&self) -> Option<&Registry<C>> {
        self.registries
            .get(&ComponentTypeId::of::<C>())
            .and_then(|registry| registry.as_any().downcast_ref())
    }

    fn ensure_live(&self, id: EntityId) -> Result<(), WorldError> {
        let record = self
            .records
            .get(id.index())
            .ok_or(WorldError::NoSuchEntity(id))?;
        if record.deleted {
            return Err(WorldError::EntityDeleted(id));
        }
        Ok(())
    }

    // --- registration -------------------------------------------------------

    /// Register an action in the given phase.
    ///
    /// Actions of one phase run sequentially, in registration order, on the
    /// dispatching thread.
    pub fn action<F>(&mut self, phase: Phase, action: F) -> &mut Self
    where
        F: Fn(&mut World<S>) -> Result<()> + Send + Sync + 'static,
    {
        self.register_phase(phase);
        self.actions.entry(phase).or_default().push(Arc::new(action));
        self
    }

    /// Register a system in the given phase.
    ///
    /// Systems of one phase run in parallel with no guaranteed relative
    /// order. Logic that must be ordered belongs in different phases.
    pub fn system<F>(&mut self, phase: Phase, system: F) -> &mut Self
    where
        F: for<'w> Fn(&SystemContext<'w, S>) -> Result<()> + Send + Sync + 'static,
    {
        self.register_phase(phase);
        self.systems.entry(phase).or_default().push(Arc::new(system));
        self
    }

    /// Install a module, invoking its configuration callback once.
    pub fn install<M: Module<S>>(&mut self, module: M) -> &mut Self {
        module.configure(self);
        self
    }

    fn register_phase(&mut self, phase: Phase) {
        if let Err(position) = self.phases.binary_search(&phase) {
            self.phases.insert(position, phase);
        }
    }

    // --- run loop -----------------------------------------------------------

    /// Request the run loop to stop once the current phase sweep completes.
    pub fn quit(&self) {
        info!("quit signaled");
        self.quit.raise();
    }

    /// A cloneable handle for signaling quit from other threads.
    #[must_use]
    pub fn quit_signal(&self) -> QuitSignal {
        self.quit.clone()
    }
}

impl<S: Sync> World<S> {
    /// Launch the game and block until it finishes.
    ///
    /// Dispatches `ON_START` once, then sweeps every registered phase
    /// strictly between the anchors in ascending order until quit is
    /// signaled, then dispatches `ON_END` once. A fatal error — one whose
    /// cause chain carries [`Fatal`](crate::error::Fatal) — aborts
    /// immediately, skipping every remaining phase including `ON_END`;
    /// non-fatal errors are logged and the loop keeps going.
    pub fn run(&mut self) -> Result<()> {
        info!("starting world");
        if let Err(err) = self.dispatch_phase(Phase::ON_START) {
            if is_fatal(&err) {
                error!(err = format!("{err:#}").as_str(), "fatal error during OnStart; quitting");
                return Err(err);
            }
        }

        let loop_phases: Vec<Phase> = self
            .phases
            .iter()
            .copied()
            .filter(|&phase| phase != Phase::ON_START && phase != Phase::ON_END)
            .collect();
        info!(
            phases = format!("{loop_phases:?}").as_str(),
            "starting game loop"
        );

        while !self.quit.is_raised() {
            for &phase in &loop_phases {
                if let Err(err) = self.dispatch_phase(phase) {
                    if is_fatal(&err) {
                        error!(
                            phase = %phase,
                            err = format!("{err:#}").as_str(),
                            "fatal error; quitting"
                        );
                        return Err(err);
                    }
                }
            }
        }

        info!("ending world");
        let result = self.dispatch_phase(Phase::ON_END);
        if let Err(err) = &result {
            if is_fatal(err) {
                error!(err = format!("{err:#}").as_str(), "fatal error during OnEnd");
            }
        }
        result
    }

    /// Dispatch one phase: actions first, sequentially, errors joined; then
    /// — only if every action succeeded — all systems in parallel.
    ///
    /// The systems' result is the first failure by completion order. A
    /// failure raises the phase's advisory [`CancelToken`], but the
    /// dispatcher still waits for every launched system before returning.
    fn dispatch_phase(&mut self, phase: Phase) -> Result<()> {
        let actions = self.actions.get(&phase).cloned().unwrap_or_default();
        let mut joined = ErrorList::new();
        for action in &actions {
            if let Err(err) = (action.as_ref())(self) {
                joined.push(err);
            }
        }
        if !joined.is_empty() {
            warn!(phase = %phase, err = %joined, "error during phase actions");
            return joined.into_result();
        }

        let systems = self.systems.get(&phase).cloned().unwrap_or_default();
        if systems.is_empty() {
            return Ok(());
        }

        let world: &World<S> = self;
        let cancel = CancelToken::new();
        let (done_tx, done_rx) = crossbeam_channel::bounded(systems.len());

        let first_failure = std::thread::scope(|scope| {
            for system in &systems {
                let system = Arc::clone(system);
                let done_tx = done_tx.clone();
                let cancel = cancel.clone();
                let ctx = SystemContext::new(world, phase, cancel.clone());
                scope.spawn(move || {
                    let result = (system.as_ref())(&ctx);
                    if result.is_err() {
                        // Advisory only: siblings keep running but can poll
                        // the token and wind down early.
                        cancel.raise();
                    }
                    let _ = done_tx.send(result);
                });
            }
            drop(done_tx);

            // The channel closes once every system has reported, so this
            // doubles as the wait-for-all barrier. Errors arrive in
            // completion order; the first one wins, the rest are dropped.
            let mut first = None;
            for result in done_rx {
                if let Err(err) = result {
                    if first.is_none() {
                        first = Some(err);
                    }
                }
            }
            first
        });

        match first_failure {
            Some(err) => {
                warn!(phase = %phase, err = format!("{err:#}").as_str(), "error during phase");
                Err(err)
            }
            None => Ok(()),
        }
    }
}
