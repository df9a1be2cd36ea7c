//! `physics_core`
//!
//! 2D rigid-body physics for a small entity world.
//!
//! Design goals:
//! - Deterministic: ordered storage, canonical pair ordering, no hidden globals.
//! - Clear separation of concerns (ecs, physics, pools, events, config).
//! - Traits at the seams that get swapped (integrators, physics backend).
//! - No `unsafe`.

pub mod collections;
pub mod config;
pub mod ecs;
pub mod error;
pub mod event;
pub mod math;
pub mod physics;
pub mod pool;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::ecs::*;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::event::*;
    pub use crate::math::*;
    pub use crate::physics::{
        Aabb, BodyFlags, Collider, CollisionEvent, CollisionInfo, IntegratorKind,
        PhysicsBackend, PhysicsContext, PhysicsDriver, PhysicsMaterial, RigidBody, Shape,
        TickStats,
    };
}
