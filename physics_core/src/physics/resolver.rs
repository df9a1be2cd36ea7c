//! Impulse-based contact resolution.
//!
//! Linear only: impulses change velocity, positional correction nudges
//! positions apart along the contact normal. Static and sleeping bodies have
//! zero effective inverse mass and are never modified.

use crate::{
    collections::PriorityQueue,
    ecs::{EntityId, World},
    math::Vec2,
    physics::{collider::PhysicsMaterial, detector::CollisionInfo},
};

/// Resolver tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    /// Penetration left uncorrected.
    pub slop: f32,
    /// Fraction of the remaining penetration removed per contact.
    pub correction_factor: f32,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            slop: 0.01,
            correction_factor: 0.2,
        }
    }
}

/// Combined restitution: the less bouncy material wins, so contacts never gain energy.
pub fn combine_restitution(a: &PhysicsMaterial, b: &PhysicsMaterial) -> f32 {
    a.restitution.min(b.restitution)
}

/// Combined friction, same policy as restitution.
pub fn combine_friction(a: &PhysicsMaterial, b: &PhysicsMaterial) -> f32 {
    a.friction.min(b.friction)
}

/// Snapshot of the body state one contact needs.
#[derive(Debug, Clone, Copy)]
struct Side {
    velocity: Vec2,
    inv_mass: f32,
    material: PhysicsMaterial,
}

impl Side {
    fn read(world: &World, entity: EntityId) -> Option<Self> {
        let body = world.body(entity)?;
        Some(Self {
            velocity: body.velocity,
            inv_mass: body.effective_inv_mass(),
            material: body.collider.material,
        })
    }
}

/// Velocity and position changes for one contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactResponse {
    pub velocity_a: Vec2,
    pub velocity_b: Vec2,
    pub shift_a: Vec2,
    pub shift_b: Vec2,
    /// Normal impulse magnitude; zero when the bodies were already separating.
    pub impulse: f32,
}

#[derive(Debug, Default)]
pub struct Resolver {
    pub settings: ResolverSettings,
    /// Contacts that changed at least one body.
    pub total_resolved: u64,
}

impl Resolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self {
            settings,
            total_resolved: 0,
        }
    }

    pub fn reset_counters(&mut self) {
        self.total_resolved = 0;
    }

    /// Resolves every contact, deepest penetration first. Returns how many
    /// contacts were applied this call.
    pub fn resolve_all(&mut self, world: &mut World, contacts: &[CollisionInfo]) -> usize {
        let mut queue: PriorityQueue<&CollisionInfo> = PriorityQueue::with_capacity(contacts.len());
        for c in contacts {
            queue.enqueue(c, c.penetration);
        }
        let mut applied = 0;
        while let Some(contact) = queue.dequeue() {
            if self.resolve(world, contact) {
                applied += 1;
            }
        }
        applied
    }

    /// Resolves a single contact against the current body state. Returns false
    /// when nothing could move (both bodies immovable or missing).
    pub fn resolve(&mut self, world: &mut World, contact: &CollisionInfo) -> bool {
        let (Some(a), Some(b)) = (Side::read(world, contact.a), Side::read(world, contact.b)) else {
            return false;
        };
        let Some(response) = self.respond(&a, &b, contact) else {
            return false;
        };

        if let Some((body, transform)) = world.physics_mut(contact.a) {
            body.velocity = response.velocity_a;
            transform.position += response.shift_a;
        }
        if let Some((body, transform)) = world.physics_mut(contact.b) {
            body.velocity = response.velocity_b;
            transform.position += response.shift_b;
        }
        self.total_resolved += 1;
        true
    }

    fn respond(&self, a: &Side, b: &Side, contact: &CollisionInfo) -> Option<ContactResponse> {
        let inv_sum = a.inv_mass + b.inv_mass;
        if inv_sum == 0.0 {
            return None;
        }
        let n = contact.normal;
        let mut va = a.velocity;
        let mut vb = b.velocity;
        let mut j = 0.0;

        let rel_vel = (vb - va).dot(n);
        if rel_vel <= 0.0 {
            let e = combine_restitution(&a.material, &b.material);
            j = -(1.0 + e) * rel_vel / inv_sum;
            va -= n * (j * a.inv_mass);
            vb += n * (j * b.inv_mass);

            // Coulomb friction along the post-impulse sliding direction.
            let rv = vb - va;
            if let Some(t) = (rv - n * rv.dot(n)).try_normalize() {
                let mu = combine_friction(&a.material, &b.material);
                let jt = coulomb_clamp(-rv.dot(t) / inv_sum, mu, j);
                va -= t * (jt * a.inv_mass);
                vb += t * (jt * b.inv_mass);
            }
        }

        let depth = (contact.penetration - self.settings.slop).max(0.0);
        let c = depth * self.settings.correction_factor / inv_sum;

        Some(ContactResponse {
            velocity_a: va,
            velocity_b: vb,
            shift_a: -(n * (c * a.inv_mass)),
            shift_b: n * (c * b.inv_mass),
            impulse: j,
        })
    }
}

/// Limits a friction impulse to the Coulomb cone `|jt| <= mu * j`. A NaN
/// bound (from non-finite input) collapses to zero.
fn coulomb_clamp(jt: f32, mu: f32, j: f32) -> f32 {
    let bound = (mu * j).max(0.0);
    jt.clamp(-bound, bound)
}
