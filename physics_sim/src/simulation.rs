//! Simulation runner.
//!
//! Owns one world together with everything needed to step it: the physics
//! context (config + pools), the driver and the event bus.
//!
//! Determinism notes:
//! - Every physics tick uses `config.dt()`; wall-clock time only feeds the
//!   accumulator in `advance`.
//! - `run_for_ticks` paces ticks with tokio timers but runs each tick
//!   synchronously to completion.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use physics_core::{
    config::PhysicsConfig,
    ecs::{EntityId, World},
    event::EventBus,
    math::Vec2,
    physics::{CollisionEvent, PhysicsBackend, PhysicsContext, PhysicsDriver, TickStats},
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::interp::{self, RenderState};

/// Upper bound on ticks run by a single `advance` call. Any time left over
/// after that is dropped so a slow frame cannot snowball.
pub const MAX_TICKS_PER_ADVANCE: u32 = 8;

/// A world plus the machinery that steps it.
pub struct Simulation {
    pub world: World,
    pub ctx: PhysicsContext,
    pub events: EventBus,
    driver: PhysicsDriver,
    accumulator: f32,
    collisions: Arc<AtomicU64>,
    last_stats: TickStats,
}

impl Simulation {
    /// Creates an empty simulation with the given config.
    pub fn new(config: PhysicsConfig) -> anyhow::Result<Self> {
        let driver = PhysicsDriver::new(&config);
        let ctx = PhysicsContext::new(config).context("build physics context")?;

        let collisions = Arc::new(AtomicU64::new(0));
        let mut events = EventBus::default();
        {
            let collisions = collisions.clone();
            events.on(move |_: &CollisionEvent| {
                collisions.fetch_add(1, Ordering::Relaxed);
            });
        }

        info!(
            tick_hz = ctx.config.tick_hz,
            integrator = %ctx.config.physics_integrator,
            "Simulation created"
        );

        Ok(Self {
            world: World::default(),
            ctx,
            events,
            driver,
            accumulator: 0.0,
            collisions,
            last_stats: TickStats::default(),
        })
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> u64 {
        self.driver.tick()
    }

    /// Collision events delivered since creation.
    pub fn collisions_seen(&self) -> u64 {
        self.collisions.load(Ordering::Relaxed)
    }

    pub fn last_stats(&self) -> &TickStats {
        &self.last_stats
    }

    pub fn driver(&self) -> &PhysicsDriver {
        &self.driver
    }

    /// Executes one fixed physics tick.
    pub fn step(&mut self) -> anyhow::Result<TickStats> {
        let dt = self.ctx.config.dt();
        let stats = self
            .driver
            .step(&mut self.world, &mut self.ctx, &mut self.events, dt)
            .with_context(|| format!("physics tick {}", self.driver.tick() + 1))?;
        if self.ctx.pools.outstanding() > 0 {
            warn!(
                tick = stats.tick,
                outstanding = self.ctx.pools.outstanding(),
                "Pooled objects not released"
            );
        }
        self.last_stats = stats.clone();
        Ok(stats)
    }

    /// Applies an impulse to a body between ticks (gameplay input, explosions).
    pub fn apply_impulse(&mut self, entity: EntityId, impulse: Vec2) -> anyhow::Result<()> {
        let (body, _) = self
            .world
            .require_physics_mut(entity)
            .with_context(|| format!("apply impulse to {:?}", entity))?;
        body.apply_impulse(impulse);
        Ok(())
    }

    /// Feeds `elapsed_sec` of wall time into the accumulator and runs as many
    /// whole ticks as fit. Returns the number of ticks run.
    pub fn advance(&mut self, elapsed_sec: f32) -> anyhow::Result<u32> {
        if !(elapsed_sec.is_finite() && elapsed_sec >= 0.0) {
            anyhow::bail!("elapsed time must be finite and non-negative, got {elapsed_sec}");
        }
        let dt = self.ctx.config.dt();
        self.accumulator += elapsed_sec;

        let mut ran = 0;
        while self.accumulator >= dt {
            if ran == MAX_TICKS_PER_ADVANCE {
                debug!(
                    dropped_sec = self.accumulator,
                    "Falling behind, dropping accumulated time"
                );
                self.accumulator = 0.0;
                break;
            }
            self.step()?;
            self.accumulator -= dt;
            ran += 1;
        }
        Ok(ran)
    }

    /// How far the accumulator is into the next tick, in [0,1). Use as the
    /// render interpolation factor.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.ctx.config.dt()).clamp(0.0, 1.0)
    }

    /// Interpolated render states at the current `alpha`.
    pub fn render_snapshot(&self) -> Vec<RenderState> {
        interp::render_states(&self.world, self.alpha())
    }

    /// Runs a number of ticks at the configured rate.
    pub async fn run_for_ticks(&mut self, ticks: u32) -> anyhow::Result<()> {
        let dt = Duration::from_secs_f32(self.ctx.config.dt());
        let mut next = Instant::now();

        for _ in 0..ticks {
            next += dt;
            self.step()?;
            tokio::time::sleep_until(next).await;
        }
        info!(
            tick = self.tick(),
            collisions = self.collisions_seen(),
            "Run finished"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick())
            .field("entities", &self.world.len())
            .field("accumulator", &self.accumulator)
            .finish()
    }
}
