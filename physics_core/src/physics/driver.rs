//! Per-tick physics orchestration.
//!
//! Step order is fixed:
//! 1. Recompute AABBs, fattened by how far each body can travel this tick.
//! 2. Rebuild the quadtree from those boxes.
//! 3. Integrate dynamic bodies (tentative positions).
//! 4. Query the quadtree with post-integration boxes for candidate pairs.
//! 5. Narrow phase on the candidates.
//! 6. Resolve contacts, then optionally confine bodies to the world bounds.
//! 7. Emit one `CollisionEvent` per contact.
//!
//! Integrating before detection lets the resolver fix overlaps created by this
//! tick's motion instead of lagging a frame behind. Fattening the boxes in
//! step 1 keeps the step-2 tree valid for the step-4 queries.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    config::PhysicsConfig,
    ecs::{EntityId, World},
    error::{PhysicsError, Result},
    event::EventBus,
    math::Vec2,
    physics::{
        aabb::Aabb,
        body::RigidBody,
        detector::Detector,
        integrator::{Integrator, IntegratorKind, StepParams},
        quadtree::Quadtree,
        resolver::{Resolver, ResolverSettings},
        vec2_pool, viewport, CollisionEvent, PhysicsBackend, PhysicsContext,
    },
};

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    pub tick: u64,
    pub bodies: usize,
    pub candidates: usize,
    pub contacts: usize,
    pub resolved: usize,
    pub broadphase_potential: u64,
    pub broadphase_found: u64,
    pub viewport_hits: usize,
    pub events_delivered: usize,
}

/// Runs the physics pipeline over a `World`.
pub struct PhysicsDriver {
    quadtree: Quadtree,
    detector: Detector,
    resolver: Resolver,
    integrator: Box<dyn Integrator>,
    tick: u64,
    // Reused between ticks.
    swept: Vec<(EntityId, Aabb)>,
    tight: Vec<(EntityId, Aabb)>,
}

impl PhysicsDriver {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            quadtree: Quadtree::new(
                config.world_bounds,
                config.quadtree_max_depth,
                config.quadtree_node_capacity,
            ),
            detector: Detector::new(),
            resolver: Resolver::new(resolver_settings(config)),
            integrator: config.physics_integrator.build(),
            tick: 0,
            swept: Vec::new(),
            tight: Vec::new(),
        }
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn quadtree(&self) -> &Quadtree {
        &self.quadtree
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn integrator_kind(&self) -> IntegratorKind {
        self.integrator.kind()
    }

    /// Picks up config edits made between ticks.
    fn sync_config(&mut self, config: &PhysicsConfig) {
        if self.quadtree.bounds() != config.world_bounds
            || self.quadtree.max_depth() != config.quadtree_max_depth
            || self.quadtree.capacity() != config.quadtree_node_capacity.max(1)
        {
            debug!(
                max_depth = config.quadtree_max_depth,
                capacity = config.quadtree_node_capacity,
                "Rebuilding quadtree"
            );
            let mut rebuilt = Quadtree::new(
                config.world_bounds,
                config.quadtree_max_depth,
                config.quadtree_node_capacity,
            );
            rebuilt.total_potential = self.quadtree.total_potential;
            rebuilt.total_found = self.quadtree.total_found;
            self.quadtree = rebuilt;
        }
        if self.integrator.kind() != config.physics_integrator {
            debug!(integrator = %config.physics_integrator, "Switching integrator");
            self.integrator = config.physics_integrator.build();
        }
        self.resolver.settings = resolver_settings(config);
    }
}

fn resolver_settings(config: &PhysicsConfig) -> ResolverSettings {
    ResolverSettings {
        slop: config.collision_adjustment_buffer,
        correction_factor: config.collision_correction_factor,
    }
}

/// Upper bound on how far a body can move in one tick under any integrator.
fn travel_bound(body: &RigidBody, gravity: Vec2, dt: f32) -> f32 {
    if !body.is_dynamic() {
        return 0.0;
    }
    let accel = (body.acceleration + gravity).len();
    (body.velocity.len() + 2.0 * accel * dt) * dt
}

impl PhysicsBackend for PhysicsDriver {
    fn step(
        &mut self,
        world: &mut World,
        ctx: &mut PhysicsContext,
        events: &mut EventBus,
        dt_sec: f32,
    ) -> Result<TickStats> {
        if !(dt_sec.is_finite() && dt_sec >= 0.0) {
            return Err(PhysicsError::InvalidOperation(format!(
                "time step must be finite and non-negative, got {}",
                dt_sec
            )));
        }
        // Config may have been edited since the last tick.
        ctx.config.validate()?;
        self.sync_config(&ctx.config);
        let gravity = ctx.config.gravity;
        let tick = self.tick + 1;
        let potential_before = self.quadtree.total_potential;
        let found_before = self.quadtree.total_found;

        // (a) swept bounds from the current transforms.
        let entities = world.physics_entities();
        self.swept.clear();
        for &id in &entities {
            if let (Some(body), Some(t)) = (world.body(id), world.transform(id)) {
                let aabb = body.collider.aabb(t);
                self.swept
                    .push((id, aabb.expand(travel_bound(body, gravity, dt_sec))));
            }
        }

        // (b) broadphase rebuild.
        self.quadtree.clear();
        for &(id, aabb) in &self.swept {
            self.quadtree.insert(id, aabb);
        }

        // (c) integration.
        let params = StepParams {
            gravity,
            dt: dt_sec,
            sleep_epsilon: ctx.config.sleep_epsilon,
        };
        let pool = vec2_pool(&mut ctx.pools)?;
        for &id in &entities {
            if let Some((body, transform)) = world.physics_mut(id) {
                self.integrator.integrate(body, transform, &params, pool)?;
            }
        }
        if pool.outstanding() > 0 {
            warn!(
                outstanding = pool.outstanding(),
                "Scratch vectors still checked out after integration"
            );
        }

        // (d) candidate pairs from post-integration bounds.
        self.tight.clear();
        for &id in &entities {
            if let (Some(body), Some(t)) = (world.body(id), world.transform(id)) {
                self.tight.push((id, body.collider.aabb(t)));
            }
        }
        let pairs = self
            .quadtree
            .candidate_pairs(self.tight.iter().map(|(id, aabb)| (*id, aabb)));

        // (e) narrow phase.
        let contacts = self.detector.detect(world, &pairs);

        // (f) resolution.
        let resolved = self.resolver.resolve_all(world, &contacts);
        let viewport_hits = if ctx.config.handle_viewport_collisions {
            viewport::confine_all(world, &ctx.config.world_bounds)
        } else {
            0
        };

        // (g) notifications.
        let stats_contacts = contacts.len();
        let mut events_delivered = 0;
        for info in contacts {
            events_delivered += events.emit(CollisionEvent { tick, info });
        }

        self.tick = tick;
        let stats = TickStats {
            tick,
            bodies: entities.len(),
            candidates: pairs.len(),
            contacts: stats_contacts,
            resolved,
            broadphase_potential: self.quadtree.total_potential - potential_before,
            broadphase_found: self.quadtree.total_found - found_before,
            viewport_hits,
            events_delivered,
        };
        trace!(
            tick,
            bodies = stats.bodies,
            candidates = stats.candidates,
            contacts = stats.contacts,
            resolved = stats.resolved,
            "Physics tick"
        );
        Ok(stats)
    }
}

impl std::fmt::Debug for PhysicsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsDriver")
            .field("tick", &self.tick)
            .field("integrator", &self.integrator.kind())
            .field("quadtree_nodes", &self.quadtree.node_count())
            .finish()
    }
}
