//! Randomized stress scenes.

use physics_core::{
    ecs::{EntityId, Transform, World},
    error::Result,
    math::Vec2,
    physics::{Aabb, Collider, PhysicsMaterial, RigidBody},
};
use rand::Rng;

/// Largest circle radius / rectangle half extent spawned.
pub const MAX_BODY_EXTENT: f32 = 12.0;
/// Share of spawned bodies that are static.
pub const STATIC_RATIO: f64 = 0.1;

/// Spawns `count` random circles and rectangles inside `bounds`.
///
/// Roughly one in ten bodies is static. Returned ids are in spawn order.
pub fn populate_random<R: Rng + ?Sized>(
    world: &mut World,
    rng: &mut R,
    count: usize,
    bounds: &Aabb,
) -> Result<Vec<EntityId>> {
    let mut spawned = Vec::with_capacity(count);
    for _ in 0..count {
        let material = PhysicsMaterial::new(rng.gen_range(0.0..=1.0), rng.gen_range(0.0..=0.5));
        let collider = if rng.gen_bool(0.5) {
            Collider::circle(rng.gen_range(2.0..=MAX_BODY_EXTENT), material)
        } else {
            Collider::rectangle(
                Vec2::new(
                    rng.gen_range(2.0..=MAX_BODY_EXTENT),
                    rng.gen_range(2.0..=MAX_BODY_EXTENT),
                ),
                material,
            )
        };

        let inner = bounds.expand(-MAX_BODY_EXTENT);
        let position = Vec2::new(
            rng.gen_range(inner.min_x..=inner.max_x.max(inner.min_x)),
            rng.gen_range(inner.min_y..=inner.max_y.max(inner.min_y)),
        );

        let body = if rng.gen_bool(STATIC_RATIO) {
            RigidBody::new_static(collider)
        } else {
            RigidBody::new(rng.gen_range(0.5..=10.0), collider).with_velocity(Vec2::new(
                rng.gen_range(-100.0..=100.0),
                rng.gen_range(-100.0..=100.0),
            ))
        };

        spawned.push(world.spawn_body(Transform::at(position), body)?);
    }
    Ok(spawned)
}
