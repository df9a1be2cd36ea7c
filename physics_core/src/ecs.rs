//! Entity/component store (minimal ECS).
//!
//! This is a deliberately small ECS for a deterministic physics tick. It is
//! not archetype-based; the closed set of component kinds lives in per-kind
//! arenas keyed by entity id. Arenas are ordered maps so iteration order is
//! stable from tick to tick.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::{PhysicsError, Result},
    math::Vec2,
    physics::body::RigidBody,
};

/// Opaque entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Component type tag used as the arena key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform,
    RigidBody,
}

/// Common component: placement in the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    /// Position before the most recent integration.
    pub prev_position: Vec2,
    /// Radians. Carried for rendering; collision math ignores it.
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            prev_position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            prev_position: position,
            ..Default::default()
        }
    }
}

/// Closed set of components the store knows about.
#[derive(Debug, Clone)]
pub enum Component {
    Transform(Transform),
    RigidBody(RigidBody),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Transform(_) => ComponentKind::Transform,
            Component::RigidBody(_) => ComponentKind::RigidBody,
        }
    }
}

/// Borrowed view of a stored component.
#[derive(Debug, Clone, Copy)]
pub enum ComponentRef<'a> {
    Transform(&'a Transform),
    RigidBody(&'a RigidBody),
}

/// Simple world that stores components per kind.
#[derive(Debug, Default)]
pub struct World {
    next_id: u64,
    alive: BTreeSet<EntityId>,
    transforms: BTreeMap<EntityId, Transform>,
    bodies: BTreeMap<EntityId, RigidBody>,
}

impl World {
    /// Creates a new entity.
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.alive.insert(id);
        id
    }

    /// Creates an entity with both physics components.
    pub fn spawn_body(&mut self, transform: Transform, body: RigidBody) -> Result<EntityId> {
        let id = self.spawn();
        self.add_component(id, Component::Transform(transform))?;
        if let Err(e) = self.add_component(id, Component::RigidBody(body)) {
            self.despawn(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Removes an entity and all of its components.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        self.transforms.remove(&entity);
        self.bodies.remove(&entity);
        self.alive.remove(&entity)
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.alive.contains(&entity)
    }

    /// Inserts/replaces a component for an entity.
    ///
    /// A rigid body takes ownership of its collider here; a collider that is
    /// already owned by another entity is rejected.
    pub fn add_component(&mut self, entity: EntityId, component: Component) -> Result<()> {
        if !self.is_alive(entity) {
            return Err(PhysicsError::InvalidOperation(format!(
                "entity {:?} is not alive",
                entity
            )));
        }
        match component {
            Component::Transform(t) => {
                self.transforms.insert(entity, t);
            }
            Component::RigidBody(mut body) => {
                body.collider.attach(entity)?;
                self.bodies.insert(entity, body);
            }
        }
        Ok(())
    }

    pub fn get_component(&self, entity: EntityId, kind: ComponentKind) -> Option<ComponentRef<'_>> {
        match kind {
            ComponentKind::Transform => self.transforms.get(&entity).map(ComponentRef::Transform),
            ComponentKind::RigidBody => self.bodies.get(&entity).map(ComponentRef::RigidBody),
        }
    }

    pub fn has_component(&self, entity: EntityId, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Transform => self.transforms.contains_key(&entity),
            ComponentKind::RigidBody => self.bodies.contains_key(&entity),
        }
    }

    pub fn transform(&self, entity: EntityId) -> Option<&Transform> {
        self.transforms.get(&entity)
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.transforms.get_mut(&entity)
    }

    pub fn body(&self, entity: EntityId) -> Option<&RigidBody> {
        self.bodies.get(&entity)
    }

    pub fn body_mut(&mut self, entity: EntityId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(&entity)
    }

    /// Both physics components of an entity, mutably.
    pub fn physics_mut(&mut self, entity: EntityId) -> Option<(&mut RigidBody, &mut Transform)> {
        let body = self.bodies.get_mut(&entity)?;
        let transform = self.transforms.get_mut(&entity)?;
        Some((body, transform))
    }

    /// Like `get_component`, but a missing component is an error.
    pub fn require_component(
        &self,
        entity: EntityId,
        kind: ComponentKind,
    ) -> Result<ComponentRef<'_>> {
        self.get_component(entity, kind)
            .ok_or(PhysicsError::MissingComponent { entity, kind })
    }

    /// Like `physics_mut`, but names the missing component on failure.
    pub fn require_physics_mut(
        &mut self,
        entity: EntityId,
    ) -> Result<(&mut RigidBody, &mut Transform)> {
        if !self.transforms.contains_key(&entity) {
            return Err(PhysicsError::MissingComponent {
                entity,
                kind: ComponentKind::Transform,
            });
        }
        self.physics_mut(entity).ok_or(PhysicsError::MissingComponent {
            entity,
            kind: ComponentKind::RigidBody,
        })
    }

    /// Iterates live entity ids in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive.iter().copied()
    }

    /// Entities that carry both a transform and a rigid body.
    pub fn physics_entities(&self) -> Vec<EntityId> {
        self.bodies
            .keys()
            .filter(|id| self.transforms.contains_key(id))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }
}
