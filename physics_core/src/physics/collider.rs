//! Collider shapes and materials.

use serde::{Deserialize, Serialize};

use crate::{
    ecs::{EntityId, Transform},
    error::{PhysicsError, Result},
    math::Vec2,
    physics::aabb::Aabb,
};

/// Surface response parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Fraction of closing speed kept after a bounce, in `[0, 1]`.
    pub restitution: f32,
    /// Coulomb friction coefficient, `>= 0`.
    pub friction: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.2,
            friction: 0.1,
        }
    }
}

impl PhysicsMaterial {
    pub fn new(restitution: f32, friction: f32) -> Self {
        Self {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
        }
    }
}

/// Local collider geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rectangle { half_extents: Vec2 },
}

/// Collider geometry resolved into world space for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldShape {
    Circle { center: Vec2, radius: f32 },
    Rectangle { center: Vec2, half_extents: Vec2 },
}

impl WorldShape {
    pub fn center(&self) -> Vec2 {
        match *self {
            WorldShape::Circle { center, .. } | WorldShape::Rectangle { center, .. } => center,
        }
    }

    pub fn aabb(&self) -> Aabb {
        match *self {
            WorldShape::Circle { center, radius } => {
                Aabb::from_center(center, Vec2::new(radius, radius))
            }
            WorldShape::Rectangle {
                center,
                half_extents,
            } => Aabb::from_center(center, half_extents),
        }
    }
}

/// A shape attached to exactly one rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub shape: Shape,
    /// Offset relative to the owning transform.
    pub local: Transform,
    pub material: PhysicsMaterial,
    owner: Option<EntityId>,
}

impl Collider {
    pub fn new(shape: Shape, material: PhysicsMaterial) -> Self {
        Self {
            shape,
            local: Transform::default(),
            material,
            owner: None,
        }
    }

    pub fn circle(radius: f32, material: PhysicsMaterial) -> Self {
        Self::new(Shape::Circle { radius }, material)
    }

    pub fn rectangle(half_extents: Vec2, material: PhysicsMaterial) -> Self {
        Self::new(Shape::Rectangle { half_extents }, material)
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.local = Transform::at(offset);
        self
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Binds the collider to `entity`.
    ///
    /// Re-attaching to the same owner is a no-op; attaching a collider owned by
    /// a different entity is an invalid operation.
    pub fn attach(&mut self, entity: EntityId) -> Result<()> {
        match self.owner {
            Some(current) if current != entity => Err(PhysicsError::InvalidOperation(format!(
                "collider is already owned by {:?}, cannot attach to {:?}",
                current, entity
            ))),
            _ => {
                self.owner = Some(entity);
                Ok(())
            }
        }
    }

    /// World-space geometry given the owning transform.
    pub fn world_shape(&self, owner: &Transform) -> WorldShape {
        let scale = Vec2::new(
            owner.scale.x * self.local.scale.x,
            owner.scale.y * self.local.scale.y,
        )
        .abs();
        let offset = Vec2::new(
            self.local.position.x * owner.scale.x,
            self.local.position.y * owner.scale.y,
        );
        let center = owner.position + offset;
        match self.shape {
            Shape::Circle { radius } => WorldShape::Circle {
                center,
                radius: radius * scale.x.max(scale.y),
            },
            Shape::Rectangle { half_extents } => WorldShape::Rectangle {
                center,
                half_extents: Vec2::new(half_extents.x * scale.x, half_extents.y * scale.y),
            },
        }
    }

    pub fn aabb(&self, owner: &Transform) -> Aabb {
        self.world_shape(owner).aabb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_aabb_follows_transform_and_scale() {
        let c = Collider::circle(2.0, PhysicsMaterial::default()).with_offset(Vec2::new(1.0, 0.0));
        let mut t = Transform::at(Vec2::new(10.0, 10.0));
        t.scale = Vec2::new(2.0, 1.0);
        let aabb = c.aabb(&t);
        // centre at 10 + 1*2, radius 2 * max(2, 1)
        assert_eq!(aabb, Aabb::new(8.0, 6.0, 16.0, 14.0));
    }

    #[test]
    fn rectangle_aabb() {
        let c = Collider::rectangle(Vec2::new(3.0, 1.0), PhysicsMaterial::default());
        let aabb = c.aabb(&Transform::at(Vec2::new(0.0, 0.0)));
        assert_eq!(aabb, Aabb::new(-3.0, -1.0, 3.0, 1.0));
    }

    #[test]
    fn attach_is_exclusive() {
        let mut c = Collider::circle(1.0, PhysicsMaterial::default());
        c.attach(EntityId(1)).unwrap();
        c.attach(EntityId(1)).unwrap();
        assert!(c.attach(EntityId(2)).is_err());
        assert_eq!(c.owner(), Some(EntityId(1)));
    }

    #[test]
    fn material_is_clamped() {
        let m = PhysicsMaterial::new(1.5, -1.0);
        assert_eq!(m.restitution, 1.0);
        assert_eq!(m.friction, 0.0);
    }
}
