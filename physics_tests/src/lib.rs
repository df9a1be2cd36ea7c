//! Shared helpers for the integration tests and the parity runner.

use std::collections::BTreeSet;

use physics_core::{
    config::PhysicsConfig,
    ecs::{EntityId, World},
    physics::{detector::collide, Aabb, Detector, Quadtree},
};
use physics_sim::scene;
use rand::{rngs::StdRng, SeedableRng};

pub type PairSet = BTreeSet<(EntityId, EntityId)>;

/// Installs a test-friendly subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// Seeded random scene inside `bounds`.
pub fn random_world(seed: u64, bodies: usize, bounds: &Aabb) -> anyhow::Result<World> {
    let mut world = World::default();
    let mut rng = StdRng::seed_from_u64(seed);
    scene::populate_random(&mut world, &mut rng, bodies, bounds)?;
    Ok(world)
}

/// Every touching pair found by testing all N² combinations.
pub fn brute_force_pairs(world: &World) -> PairSet {
    let ids = world.physics_entities();
    let mut out = PairSet::new();
    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            let (Some(ba), Some(ta), Some(bb), Some(tb)) =
                (world.body(a), world.transform(a), world.body(b), world.transform(b))
            else {
                continue;
            };
            let wa = ba.collider.world_shape(ta);
            let wb = bb.collider.world_shape(tb);
            if collide(&wa, &wb).is_some() {
                out.insert((a.min(b), a.max(b)));
            }
        }
    }
    out
}

/// Touching pairs found through the quadtree and the detector, using the
/// broadphase settings from `config`.
pub fn broadphase_pairs(world: &World, config: &PhysicsConfig) -> PairSet {
    let mut tree = Quadtree::new(
        config.world_bounds,
        config.quadtree_max_depth,
        config.quadtree_node_capacity,
    );
    let boxes: Vec<(EntityId, Aabb)> = world
        .physics_entities()
        .into_iter()
        .filter_map(|id| Some((id, world.body(id)?.collider.aabb(world.transform(id)?))))
        .collect();
    for &(id, aabb) in &boxes {
        tree.insert(id, aabb);
    }
    let candidates = tree.candidate_pairs(boxes.iter().map(|(id, aabb)| (*id, aabb)));
    Detector::new()
        .detect(world, &candidates)
        .into_iter()
        .map(|info| (info.a, info.b))
        .collect()
}
