//! Drift — a minimal world where entities move under constant velocity.
//!
//! Spawns a handful of entities with [`Position`] and [`Velocity`]
//! components, installs a movement module, and runs the world for a fixed
//! frame budget before quitting. Demonstrates the full lifecycle: modules,
//! phases, actions, piped systems, and the quit signal.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cadence_world::{Component, EntityId, Module, Phase, World, piped_system};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}
impl Component for Velocity {}

struct DriftState {
    frame: u32,
    budget: u32,
}

/// Movement plus a frame-budget stopwatch.
struct DriftModule;

impl Module<DriftState> for DriftModule {
    fn configure(&self, world: &mut World<DriftState>) {
        world.action(Phase::PRE_FRAME, |world: &mut World<DriftState>| {
            world.state_mut().frame += 1;
            Ok(())
        });

        world.system(
            Phase::ON_UPDATE,
            piped_system(
                |entity| {
                    let velocity = *entity.component::<Velocity>().ok()?;
                    Some((entity.id(), velocity))
                },
                |ctx, (id, velocity): (EntityId, Velocity)| {
                    let mut position = ctx.world().component_mut::<Position>(id)?;
                    position.x += velocity.dx;
                    position.y += velocity.dy;
                    Ok(())
                },
            ),
        );

        world.action(Phase::POST_FRAME, |world: &mut World<DriftState>| {
            if world.state().frame >= world.state().budget {
                info!(frame = world.state().frame, "frame budget exhausted");
                world.quit();
            }
            Ok(())
        });
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("drift=info".parse()?))
        .init();

    let mut world = World::new(DriftState {
        frame: 0,
        budget: 60,
    });

    for n in 0..3 {
        let id = world.spawn();
        world.set_component(id, Position { x: 0.0, y: 0.0 })?;
        world.set_component(
            id,
            Velocity {
                dx: 1.0 + n as f32,
                dy: 0.5,
            },
        )?;
        info!(id = %id, "spawned drifter");
    }

    world.install(DriftModule);
    world.action(Phase::ON_END, |world: &mut World<DriftState>| {
        for entity in world.entities() {
            let position = entity.component::<Position>()?;
            info!(
                id = %entity.id(),
                x = position.x,
                y = position.y,
                "final position"
            );
        }
        Ok(())
    });

    world.run()
}
