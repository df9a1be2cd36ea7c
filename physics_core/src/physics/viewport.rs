//! Keeps bodies inside the world bounds.

use crate::{
    ecs::{EntityId, World},
    physics::aabb::Aabb,
};

/// Clamps one body's collider inside `bounds`, reflecting the velocity
/// component that pointed out of bounds (scaled by the body's restitution).
/// Returns true if the body touched a wall.
pub fn confine(world: &mut World, entity: EntityId, bounds: &Aabb) -> bool {
    let Some((body, transform)) = world.physics_mut(entity) else {
        return false;
    };
    if !body.is_dynamic() {
        return false;
    }

    let aabb = body.collider.aabb(transform);
    let e = body.collider.material.restitution;
    let mut hit = false;

    if aabb.width() <= bounds.width() {
        if aabb.min_x < bounds.min_x {
            transform.position.x += bounds.min_x - aabb.min_x;
            if body.velocity.x < 0.0 {
                body.velocity.x = -body.velocity.x * e;
            }
            hit = true;
        } else if aabb.max_x > bounds.max_x {
            transform.position.x -= aabb.max_x - bounds.max_x;
            if body.velocity.x > 0.0 {
                body.velocity.x = -body.velocity.x * e;
            }
            hit = true;
        }
    }

    if aabb.height() <= bounds.height() {
        if aabb.min_y < bounds.min_y {
            transform.position.y += bounds.min_y - aabb.min_y;
            if body.velocity.y < 0.0 {
                body.velocity.y = -body.velocity.y * e;
            }
            hit = true;
        } else if aabb.max_y > bounds.max_y {
            transform.position.y -= aabb.max_y - bounds.max_y;
            if body.velocity.y > 0.0 {
                body.velocity.y = -body.velocity.y * e;
            }
            hit = true;
        }
    }

    hit
}

/// Confines every physics entity; returns the number of wall contacts.
pub fn confine_all(world: &mut World, bounds: &Aabb) -> usize {
    world
        .physics_entities()
        .into_iter()
        .filter(|&e| confine(world, e, bounds))
        .count()
}
