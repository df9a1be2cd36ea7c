//! Broadphase parity runner.
//!
//! Builds seeded random scenes and checks that quadtree + detector report
//! exactly the pairs a brute-force N² pass finds, across several tree depths
//! and node capacities. Then steps each scene with every integrator and checks
//! that no scratch vectors leak.
//!
//! Usage:
//!   cargo run -p physics_tests --bin parity_runner -- [seeds] [bodies]

use std::time::Instant;

use anyhow::Context;
use physics_core::{
    config::PhysicsConfig,
    event::EventBus,
    physics::{IntegratorKind, PhysicsBackend, PhysicsContext, PhysicsDriver},
};
use physics_tests::{broadphase_pairs, brute_force_pairs, random_world};

const LAYOUTS: [(u32, usize); 4] = [(0, 8), (4, 2), (20, 8), (20, 1)];
const INTEGRATORS: [IntegratorKind; 3] =
    [IntegratorKind::Euler, IntegratorKind::Rk4, IntegratorKind::Verlet];

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let seeds: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(20);
    let bodies: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(150);

    println!("Broadphase parity: {seeds} seeds x {bodies} bodies");
    let started = Instant::now();
    let mut checks = 0usize;
    let mut failures = Vec::new();

    for seed in 0..seeds {
        for (max_depth, capacity) in LAYOUTS {
            let config = PhysicsConfig {
                quadtree_max_depth: max_depth,
                quadtree_node_capacity: capacity,
                ..Default::default()
            };
            let world = random_world(seed, bodies, &config.world_bounds)?;
            let expected = brute_force_pairs(&world);
            let actual = broadphase_pairs(&world, &config);
            checks += 1;
            if expected != actual {
                failures.push(format!(
                    "seed {seed} depth {max_depth} capacity {capacity}: expected {} pairs, got {}",
                    expected.len(),
                    actual.len()
                ));
            }
        }

        for kind in INTEGRATORS {
            let config = PhysicsConfig {
                physics_integrator: kind,
                ..Default::default()
            };
            let mut world = random_world(seed, bodies, &config.world_bounds)?;
            let mut driver = PhysicsDriver::new(&config);
            let mut ctx = PhysicsContext::new(config).context("build context")?;
            let mut events = EventBus::default();
            for _ in 0..30 {
                let dt = ctx.config.dt();
                driver
                    .step(&mut world, &mut ctx, &mut events, dt)
                    .with_context(|| format!("seed {seed} integrator {kind}"))?;
            }
            checks += 1;
            if ctx.pools.outstanding() != 0 {
                failures.push(format!(
                    "seed {seed} integrator {kind}: {} pooled vectors leaked",
                    ctx.pools.outstanding()
                ));
            }
        }
    }

    println!("====================================");
    println!("Checks:   {checks}");
    println!("Failed:   {}", failures.len());
    println!("Duration: {:.2}s", started.elapsed().as_secs_f64());
    for f in &failures {
        println!("  FAIL {f}");
    }

    if failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} parity checks failed", failures.len())
    }
}
