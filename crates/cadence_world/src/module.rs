//! Reusable configuration bundles.

use crate::world::World;

/// A set of world configurations packed into one reusable unit.
///
/// A module is invoked exactly once, synchronously, while the world is
/// being set up — typically to register a related group of systems,
/// actions, and starting entities. It has no further runtime presence.
///
/// # Examples
///
/// ```rust,ignore
/// struct PhysicsModule;
///
/// impl Module<GameState> for PhysicsModule {
///     fn configure(&self, world: &mut World<GameState>) {
///         world
///             .system(Phase::ON_UPDATE, integrate_velocities)
///             .system(Phase::ON_VALIDATE, check_bounds);
///     }
/// }
///
/// world.install(PhysicsModule);
/// ```
pub trait Module<S> {
    /// Apply this module's configuration to the world.
    fn configure(&self, world: &mut World<S>);
}
