//! Standalone simulation binary.
//!
//! Usage:
//!   cargo run -p physics_sim -- [--config physics.json] [--ticks 600] [--bodies 200] [--seed 1] [--unpaced]
//!
//! Fills the world bounds with a random scene, runs it for the requested
//! number of ticks and prints the final tick stats as JSON.

use std::env;

use anyhow::Context;
use physics_core::config::PhysicsConfig;
use physics_sim::{scene, Simulation};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

struct Args {
    config: Option<String>,
    ticks: u32,
    bodies: usize,
    seed: u64,
    paced: bool,
}

fn parse_args() -> Args {
    let mut out = Args {
        config: None,
        ticks: 600,
        bodies: 200,
        seed: 1,
        paced: true,
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                out.config = Some(args[i + 1].clone());
                i += 2;
            }
            "--ticks" if i + 1 < args.len() => {
                out.ticks = args[i + 1].parse().unwrap_or(600);
                i += 2;
            }
            "--bodies" if i + 1 < args.len() => {
                out.bodies = args[i + 1].parse().unwrap_or(200);
                i += 2;
            }
            "--seed" if i + 1 < args.len() => {
                out.seed = args[i + 1].parse().unwrap_or(1);
                i += 2;
            }
            "--unpaced" => {
                out.paced = false;
                i += 1;
            }
            _ => i += 1,
        }
    }
    out
}

fn load_config(path: Option<&str>) -> anyhow::Result<PhysicsConfig> {
    let Some(path) = path else {
        return Ok(PhysicsConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
    PhysicsConfig::from_json_str(&text).with_context(|| format!("parse config {path}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args();
    let cfg = load_config(args.config.as_deref())?;
    info!(
        ticks = args.ticks,
        bodies = args.bodies,
        seed = args.seed,
        tick_hz = cfg.tick_hz,
        integrator = %cfg.physics_integrator,
        "Starting simulation"
    );

    let bounds = cfg.world_bounds;
    let mut sim = Simulation::new(cfg)?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    scene::populate_random(&mut sim.world, &mut rng, args.bodies, &bounds)
        .context("populate scene")?;

    if args.paced {
        sim.run_for_ticks(args.ticks).await?;
    } else {
        for _ in 0..args.ticks {
            sim.step()?;
        }
    }

    let report = serde_json::to_string_pretty(sim.last_stats()).context("serialize stats")?;
    println!("{report}");
    info!(
        tick = sim.tick(),
        collisions = sim.collisions_seen(),
        "Simulation finished"
    );
    Ok(())
}
