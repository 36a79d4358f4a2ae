//! The cadence runtime core: a world of entities and components driven by a
//! phase-ordered scheduler.
//!
//! A [`World`] owns the entity table and every per-type component registry,
//! keeps their identities synchronized, and dispatches game logic phase by
//! phase: [`actions`](World::action) run sequentially with exclusive world
//! access, [`systems`](World::system) run in parallel over a shared view.
//! [`World::run`] drives the whole lifecycle from `ON_START` to `ON_END`.
//!
//! # Examples
//!
//! ```rust,ignore
//! let mut world = World::new(GameState::default());
//! world
//!     .install(MovementModule)
//!     .action(Phase::POST_FRAME, |world| {
//!         if world.state().frames > 60 {
//!             world.quit();
//!         }
//!         Ok(())
//!     });
//! world.run()?;
//! ```

pub mod entity;
pub mod error;
pub mod module;
pub mod phase;
pub mod system;
pub mod world;

pub use cadence_component::{
    Component, ComponentError, ComponentRead, ComponentTypeId, ComponentWrite, EntityId,
};

pub use entity::{Entities, EntityRef};
pub use error::{ErrorList, Fatal, FatalExt, WorldError, is_fatal};
pub use module::Module;
pub use phase::Phase;
pub use system::{CancelToken, SystemContext, piped_system};
pub use world::{QuitSignal, World};
