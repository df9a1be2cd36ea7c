//! Configuration system.
//!
//! Loads physics configuration from JSON strings (file IO left to app).
//! Every key has a default, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::{
    error::{PhysicsError, Result},
    math::Vec2,
    physics::{
        aabb::Aabb,
        integrator::IntegratorKind,
        quadtree::{DEFAULT_MAX_DEPTH, DEFAULT_NODE_CAPACITY},
    },
};

/// Root physics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed simulation tick rate.
    pub tick_hz: u32,
    /// Gravity added to every dynamic body's acceleration (y grows downward).
    pub gravity: Vec2,
    /// Quadtree root bounds and viewport used for boundary collisions.
    pub world_bounds: Aabb,
    pub quadtree_max_depth: u32,
    /// Entries a quadtree node holds before it splits.
    pub quadtree_node_capacity: usize,
    pub physics_integrator: IntegratorKind,
    /// Penetration tolerated before positional correction applies (slop).
    pub collision_adjustment_buffer: f32,
    /// Fraction of the remaining penetration corrected per tick.
    pub collision_correction_factor: f32,
    /// Keep bodies inside `world_bounds`.
    pub handle_viewport_collisions: bool,
    /// Speeds below this snap to zero after integration.
    pub sleep_epsilon: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            gravity: Vec2::new(0.0, 9.81),
            world_bounds: Aabb::new(0.0, 0.0, 1024.0, 768.0),
            quadtree_max_depth: DEFAULT_MAX_DEPTH,
            quadtree_node_capacity: DEFAULT_NODE_CAPACITY,
            physics_integrator: IntegratorKind::Euler,
            collision_adjustment_buffer: 0.01,
            collision_correction_factor: 0.2,
            handle_viewport_collisions: false,
            sleep_epsilon: 1e-5,
        }
    }
}

impl PhysicsConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Fixed timestep in seconds.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }

    /// Rejects values the tick cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_hz == 0 {
            return Err(PhysicsError::InvalidConfig("tick_hz must be > 0".into()));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig("gravity must be finite".into()));
        }
        let b = &self.world_bounds;
        if !(b.max_x > b.min_x && b.max_y > b.min_y) {
            return Err(PhysicsError::InvalidConfig(format!(
                "world_bounds must have positive area, got {:?}",
                b
            )));
        }
        if self.quadtree_node_capacity == 0 {
            return Err(PhysicsError::InvalidConfig(
                "quadtree_node_capacity must be > 0".into(),
            ));
        }
        if !(self.collision_adjustment_buffer >= 0.0) {
            return Err(PhysicsError::InvalidConfig(
                "collision_adjustment_buffer must be >= 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.collision_correction_factor) {
            return Err(PhysicsError::InvalidConfig(
                "collision_correction_factor must be in [0, 1]".into(),
            ));
        }
        if !(self.sleep_epsilon >= 0.0) {
            return Err(PhysicsError::InvalidConfig("sleep_epsilon must be >= 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let cfg = PhysicsConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, PhysicsConfig::default());
        assert_eq!(cfg.quadtree_max_depth, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_integrator_names() {
        let cfg = PhysicsConfig::from_json_str(
            r#"{ "physics_integrator": "verlet", "quadtree_max_depth": 0, "handle_viewport_collisions": true }"#,
        )
        .unwrap();
        assert_eq!(cfg.physics_integrator, IntegratorKind::Verlet);
        assert_eq!(cfg.quadtree_max_depth, 0);
        assert!(cfg.handle_viewport_collisions);

        assert!(PhysicsConfig::from_json_str(r#"{ "physics_integrator": "leapfrog" }"#).is_err());
    }

    #[test]
    fn json_roundtrip() {
        let mut cfg = PhysicsConfig::default();
        cfg.physics_integrator = IntegratorKind::Rk4;
        let text = cfg.to_json_pretty().unwrap();
        assert!(text.contains("\"rk4\""));
        assert_eq!(PhysicsConfig::from_json_str(&text).unwrap(), cfg);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = PhysicsConfig::default();
        cfg.tick_hz = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = PhysicsConfig::default();
        cfg.world_bounds = Aabb::new(0.0, 0.0, 0.0, 10.0);
        assert!(cfg.validate().is_err());

        let mut cfg = PhysicsConfig::default();
        cfg.collision_correction_factor = 1.5;
        assert!(cfg.validate().is_err());
    }
}
