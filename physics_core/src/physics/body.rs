//! Rigid body component.

use crate::{math::Vec2, physics::collider::Collider};

bitflags::bitflags! {
    /// Body state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BodyFlags: u8 {
        const NONE = 0;
        const STATIC = 1 << 0;    // Infinite mass, never moves
        const SLEEPING = 1 << 1;  // Frozen until woken explicitly
    }
}

impl Default for BodyFlags {
    fn default() -> Self {
        Self::NONE
    }
}

/// Linear rigid body. Rotation is not simulated.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub velocity: Vec2,
    pub prev_velocity: Vec2,
    /// Constant acceleration applied on top of gravity.
    pub acceleration: Vec2,
    mass: f32,
    /// Multiplicative velocity decay per tick; 1 keeps all velocity.
    pub damping: f32,
    pub flags: BodyFlags,
    pub collider: Collider,
}

impl RigidBody {
    /// Dynamic body. Non-positive or non-finite masses fall back to 1.
    pub fn new(mass: f32, collider: Collider) -> Self {
        let mass = if mass > 0.0 && mass.is_finite() {
            mass
        } else {
            1.0
        };
        Self {
            velocity: Vec2::ZERO,
            prev_velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass,
            damping: 1.0,
            flags: BodyFlags::NONE,
            collider,
        }
    }

    /// Immovable body with infinite mass.
    pub fn new_static(collider: Collider) -> Self {
        let mut body = Self::new(1.0, collider);
        body.flags |= BodyFlags::STATIC;
        body
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self.prev_velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(BodyFlags::STATIC)
    }

    pub fn is_sleeping(&self) -> bool {
        self.flags.contains(BodyFlags::SLEEPING)
    }

    pub fn set_sleeping(&mut self, sleeping: bool) {
        self.flags.set(BodyFlags::SLEEPING, sleeping);
    }

    /// Inverse mass; 0 for static bodies.
    pub fn inv_mass(&self) -> f32 {
        if self.is_static() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inverse mass as seen by the resolver: sleeping bodies act as static.
    pub fn effective_inv_mass(&self) -> f32 {
        if self.is_sleeping() {
            0.0
        } else {
            self.inv_mass()
        }
    }

    /// Bodies the integrator advances.
    pub fn is_dynamic(&self) -> bool {
        !self.is_static() && !self.is_sleeping()
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse * self.effective_inv_mass();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collider::PhysicsMaterial;

    fn collider() -> Collider {
        Collider::circle(1.0, PhysicsMaterial::default())
    }

    #[test]
    fn static_body_has_zero_inverse_mass() {
        let body = RigidBody::new_static(collider());
        assert_eq!(body.inv_mass(), 0.0);
        assert!(!body.is_dynamic());
    }

    #[test]
    fn invalid_mass_falls_back_to_unit() {
        assert_eq!(RigidBody::new(0.0, collider()).mass(), 1.0);
        assert_eq!(RigidBody::new(-3.0, collider()).mass(), 1.0);
        assert_eq!(RigidBody::new(4.0, collider()).inv_mass(), 0.25);
    }

    #[test]
    fn sleeping_body_ignores_impulses() {
        let mut body = RigidBody::new(2.0, collider());
        body.set_sleeping(true);
        body.apply_impulse(Vec2::new(10.0, 0.0));
        assert_eq!(body.velocity, Vec2::ZERO);

        body.set_sleeping(false);
        body.apply_impulse(Vec2::new(10.0, 0.0));
        assert_eq!(body.velocity, Vec2::new(5.0, 0.0));
    }
}
