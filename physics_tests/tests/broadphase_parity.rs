//! The broadphase must never drop a pair the exact tests would report.

use std::sync::{Arc, Mutex};

use physics_core::{
    config::PhysicsConfig,
    event::EventBus,
    math::Vec2,
    physics::{
        integrator::StepParams, vec2_pool, Aabb, CollisionEvent, IntegratorKind,
        PhysicsBackend, PhysicsContext, PhysicsDriver,
    },
    pool::PoolManager,
};
use physics_tests::{broadphase_pairs, brute_force_pairs, init_tracing, random_world, PairSet};

#[test]
fn quadtree_matches_brute_force_across_seeds() -> anyhow::Result<()> {
    init_tracing();
    let config = PhysicsConfig::default();
    let mut total = 0;
    for seed in 0..10 {
        let world = random_world(seed, 250, &config.world_bounds)?;
        let expected = brute_force_pairs(&world);
        assert_eq!(broadphase_pairs(&world, &config), expected, "seed {seed}");
        total += expected.len();
    }
    // Dense enough that the comparison means something.
    assert!(total > 0);
    Ok(())
}

#[test]
fn single_node_tree_matches_brute_force() -> anyhow::Result<()> {
    let config = PhysicsConfig {
        quadtree_max_depth: 0,
        ..Default::default()
    };
    for seed in 100..105 {
        let world = random_world(seed, 200, &config.world_bounds)?;
        assert_eq!(broadphase_pairs(&world, &config), brute_force_pairs(&world));
    }
    Ok(())
}

#[test]
fn tiny_node_capacity_matches_brute_force() -> anyhow::Result<()> {
    let config = PhysicsConfig {
        quadtree_node_capacity: 1,
        ..Default::default()
    };
    let world = random_world(9, 300, &config.world_bounds)?;
    assert_eq!(broadphase_pairs(&world, &config), brute_force_pairs(&world));
    Ok(())
}

#[test]
fn bodies_outside_tree_bounds_are_still_paired() -> anyhow::Result<()> {
    // Scene spans 1000x1000 but the tree only covers the top-left corner.
    let config = PhysicsConfig {
        world_bounds: Aabb::new(0.0, 0.0, 100.0, 100.0),
        ..Default::default()
    };
    let world = random_world(3, 300, &Aabb::new(0.0, 0.0, 1000.0, 1000.0))?;
    assert_eq!(broadphase_pairs(&world, &config), brute_force_pairs(&world));
    Ok(())
}

#[test]
fn driver_notifies_every_touching_pair() -> anyhow::Result<()> {
    init_tracing();
    let config = PhysicsConfig {
        gravity: Vec2::ZERO,
        ..Default::default()
    };
    let mut world = random_world(17, 250, &config.world_bounds)?;
    let expected = brute_force_pairs(&world);

    let seen = Arc::new(Mutex::new(PairSet::new()));
    let mut events = EventBus::default();
    {
        let seen = seen.clone();
        events.on(move |e: &CollisionEvent| {
            seen.lock().unwrap().insert((e.info.a, e.info.b));
        });
    }

    let mut driver = PhysicsDriver::new(&config);
    let mut ctx = PhysicsContext::new(config)?;
    // Zero dt: nothing moves before detection.
    let stats = driver.step(&mut world, &mut ctx, &mut events, 0.0)?;

    assert_eq!(stats.contacts, expected.len());
    assert_eq!(*seen.lock().unwrap(), expected);
    assert!(stats.broadphase_found >= stats.contacts as u64);
    Ok(())
}

#[test]
fn driver_catches_pairs_created_by_this_ticks_motion() -> anyhow::Result<()> {
    init_tracing();
    let dt = 1.0 / 30.0;
    for kind in [IntegratorKind::Euler, IntegratorKind::Rk4, IntegratorKind::Verlet] {
        for seed in 0..10 {
            let config = PhysicsConfig {
                gravity: Vec2::new(0.0, 300.0),
                physics_integrator: kind,
                ..Default::default()
            };

            // Twin world moved by the same integrator, checked exhaustively.
            let mut twin = random_world(seed, 300, &config.world_bounds)?;
            let integrator = kind.build();
            let params = StepParams {
                gravity: config.gravity,
                dt,
                sleep_epsilon: config.sleep_epsilon,
            };
            let mut pools = PoolManager::default();
            for id in twin.physics_entities() {
                if let Some((body, transform)) = twin.physics_mut(id) {
                    integrator.integrate(body, transform, &params, vec2_pool(&mut pools)?)?;
                }
            }
            let expected = brute_force_pairs(&twin);

            let mut world = random_world(seed, 300, &config.world_bounds)?;
            let seen = Arc::new(Mutex::new(PairSet::new()));
            let mut events = EventBus::default();
            {
                let seen = seen.clone();
                events.on(move |e: &CollisionEvent| {
                    seen.lock().unwrap().insert((e.info.a, e.info.b));
                });
            }
            let mut driver = PhysicsDriver::new(&config);
            let mut ctx = PhysicsContext::new(config)?;
            driver.step(&mut world, &mut ctx, &mut events, dt)?;

            assert_eq!(*seen.lock().unwrap(), expected, "{kind} seed {seed}");
        }
    }
    Ok(())
}
