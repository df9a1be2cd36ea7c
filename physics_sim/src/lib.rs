//! `physics_sim`
//!
//! Runs `physics_core` worlds:
//! - Fixed timestep accumulator and tick loop
//! - Render interpolation between the last two physics states
//! - Randomized stress scenes
//!
//! Determinism notes:
//! - Physics always steps with the configured `dt`, never wall-clock deltas.
//! - Scenes are built from a seeded RNG.

pub mod interp;
pub mod scene;
pub mod simulation;

pub use simulation::Simulation;
