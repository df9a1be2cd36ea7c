//! 2D rigid-body physics.
//!
//! One tick runs through `PhysicsDriver::step`:
//! bounds -> broadphase -> integrate -> candidate pairs -> narrow phase ->
//! resolve -> notify. Everything is single-threaded and runs to completion.

pub mod aabb;
pub mod body;
pub mod collider;
pub mod detector;
pub mod driver;
pub mod formulas;
pub mod integrator;
pub mod quadtree;
pub mod resolver;
pub mod viewport;

use serde::{Deserialize, Serialize};

use crate::{
    config::PhysicsConfig,
    ecs::World,
    error::Result,
    event::EventBus,
    math::Vec2,
    pool::{Pool, PoolManager},
};

pub use aabb::Aabb;
pub use body::{BodyFlags, RigidBody};
pub use collider::{Collider, PhysicsMaterial, Shape};
pub use detector::{CollisionInfo, Detector};
pub use driver::{PhysicsDriver, TickStats};
pub use integrator::{Integrator, IntegratorKind};
pub use quadtree::Quadtree;
pub use resolver::Resolver;

/// Name of the scratch-vector pool used by the integrators.
pub const VEC2_POOL: &str = "vec2";

/// Pool of scratch vectors, reset from `(x, y)`.
pub type Vec2Pool = Pool<Vec2, (f32, f32)>;

/// Fetches (creating on first use) the scratch-vector pool.
pub fn vec2_pool(pools: &mut PoolManager) -> Result<&mut Vec2Pool> {
    pools.create(
        VEC2_POOL,
        || Vec2::ZERO,
        |v: &mut Vec2, (x, y): (f32, f32)| *v = Vec2::new(x, y),
    )
}

/// Explicit state shared by the physics subsystems, built once per world.
#[derive(Debug)]
pub struct PhysicsContext {
    pub config: PhysicsConfig,
    pub pools: PoolManager,
}

impl PhysicsContext {
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        let mut pools = PoolManager::default();
        vec2_pool(&mut pools)?;
        Ok(Self { config, pools })
    }
}

/// Emitted once per confirmed contact, after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub tick: u64,
    pub info: CollisionInfo,
}

/// Physics stepper trait.
pub trait PhysicsBackend: Send + Sync {
    fn step(
        &mut self,
        world: &mut World,
        ctx: &mut PhysicsContext,
        events: &mut EventBus,
        dt_sec: f32,
    ) -> Result<TickStats>;
}
