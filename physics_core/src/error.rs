//! Error types for the physics core.
//!
//! There is no I/O in this crate, so every error here is a contract violation
//! by the caller. Nothing is retried; a failed tick leaves the remaining steps
//! of that tick unapplied.

use std::fmt;

use crate::ecs::{ComponentKind, EntityId};

/// Physics core error.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A programming-contract violation, e.g. attaching an owned collider.
    InvalidOperation(String),
    /// A configuration value is out of range.
    InvalidConfig(String),
    /// An entity is missing a component the operation requires.
    MissingComponent {
        entity: EntityId,
        kind: ComponentKind,
    },
    /// A pool exists under this name but stores a different item type.
    PoolTypeMismatch(String),
    /// No pool is registered under this name.
    UnknownPool(String),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::InvalidOperation(msg) => write!(f, "invalid operation: {}", msg),
            PhysicsError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            PhysicsError::MissingComponent { entity, kind } => {
                write!(f, "entity {:?} has no {:?} component", entity, kind)
            }
            PhysicsError::PoolTypeMismatch(name) => {
                write!(f, "pool '{}' holds a different item type", name)
            }
            PhysicsError::UnknownPool(name) => write!(f, "no pool named '{}'", name),
        }
    }
}

impl std::error::Error for PhysicsError {}

pub type Result<T> = std::result::Result<T, PhysicsError>;
