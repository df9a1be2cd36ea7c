//! Interpolation.
//!
//! Physics runs at a fixed rate; rendering runs at its own rate and blends
//! between each body's previous and current tick positions. Read-only: call
//! after `step` has returned.

use physics_core::{
    ecs::{EntityId, World},
    math::Vec2,
};
use serde::{Deserialize, Serialize};

/// One entity's render-ready position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    pub id: EntityId,
    pub position: Vec2,
    pub rotation: f32,
}

/// Interpolated position of `entity`.
///
/// `alpha` is clamped to [0,1] where 0 = previous tick, 1 = current tick.
pub fn interp_entity(world: &World, entity: EntityId, alpha: f32) -> Option<Vec2> {
    world
        .transform(entity)
        .map(|t| t.prev_position.lerp(t.position, alpha))
}

/// Interpolated state of every entity that has a transform, in id order.
pub fn render_states(world: &World, alpha: f32) -> Vec<RenderState> {
    world
        .entities()
        .filter_map(|id| {
            let t = world.transform(id)?;
            Some(RenderState {
                id,
                position: t.prev_position.lerp(t.position, alpha),
                rotation: t.rotation,
            })
        })
        .collect()
}

/// Convenience: find one entity in a render list.
pub fn find_entity(states: &[RenderState], id: EntityId) -> Option<&RenderState> {
    states.iter().find(|s| s.id == id)
}
