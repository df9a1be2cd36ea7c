//! Motion integrators.
//!
//! Every integrator advances one body by one tick and borrows its intermediate
//! vectors from the `vec2` pool. All borrowed slots are returned before
//! `integrate` returns, including on the error path.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    ecs::Transform,
    error::{PhysicsError, Result},
    math::Vec2,
    physics::{body::RigidBody, Vec2Pool},
    pool::PoolHandle,
};

/// Which integrator the driver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorKind {
    /// Semi-implicit (symplectic) Euler.
    #[default]
    Euler,
    Rk4,
    /// Velocity Verlet.
    Verlet,
}

impl IntegratorKind {
    pub fn build(self) -> Box<dyn Integrator> {
        match self {
            IntegratorKind::Euler => Box::new(EulerIntegrator),
            IntegratorKind::Rk4 => Box::new(Rk4Integrator),
            IntegratorKind::Verlet => Box::new(VerletIntegrator),
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntegratorKind::Euler => "euler",
            IntegratorKind::Rk4 => "rk4",
            IntegratorKind::Verlet => "verlet",
        };
        f.write_str(name)
    }
}

impl FromStr for IntegratorKind {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euler" => Ok(IntegratorKind::Euler),
            "rk4" => Ok(IntegratorKind::Rk4),
            "verlet" => Ok(IntegratorKind::Verlet),
            other => Err(PhysicsError::InvalidConfig(format!(
                "unknown integrator '{}'",
                other
            ))),
        }
    }
}

/// Per-tick integration inputs.
#[derive(Debug, Clone, Copy)]
pub struct StepParams {
    pub gravity: Vec2,
    pub dt: f32,
    pub sleep_epsilon: f32,
}

/// Advances a single body by one tick.
pub trait Integrator: Send + Sync {
    fn kind(&self) -> IntegratorKind;

    /// Snapshots the previous velocity/position, then advances dynamic bodies.
    /// Static and sleeping bodies only get the snapshot.
    fn integrate(
        &self,
        body: &mut RigidBody,
        transform: &mut Transform,
        params: &StepParams,
        pool: &mut Vec2Pool,
    ) -> Result<()>;
}

const SCRATCH_SLOTS: usize = 8;

/// Pool slots held for the duration of one integration.
struct Scratch<'a> {
    pool: &'a mut Vec2Pool,
    held: [Option<PoolHandle>; SCRATCH_SLOTS],
    len: usize,
}

impl<'a> Scratch<'a> {
    fn new(pool: &'a mut Vec2Pool) -> Self {
        Self {
            pool,
            held: [None; SCRATCH_SLOTS],
            len: 0,
        }
    }

    fn put(&mut self, v: Vec2) -> Result<PoolHandle> {
        if self.len == SCRATCH_SLOTS {
            return Err(PhysicsError::InvalidOperation(
                "integrator scratch space exhausted".into(),
            ));
        }
        let h = self.pool.acquire((v.x, v.y));
        self.held[self.len] = Some(h);
        self.len += 1;
        Ok(h)
    }

    fn at(&mut self, h: PoolHandle) -> Result<&mut Vec2> {
        self.pool
            .get_mut(h)
            .ok_or_else(|| PhysicsError::InvalidOperation("stale scratch vector".into()))
    }

    fn value(&self, h: PoolHandle) -> Result<Vec2> {
        self.pool
            .get(h)
            .copied()
            .ok_or_else(|| PhysicsError::InvalidOperation("stale scratch vector".into()))
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        for h in self.held.iter_mut().take(self.len) {
            if let Some(h) = h.take() {
                // Only fails for handles cleared out from under us.
                let _ = self.pool.release(h);
            }
        }
    }
}

fn snapshot(body: &mut RigidBody, transform: &mut Transform) {
    body.prev_velocity = body.velocity;
    transform.prev_position = transform.position;
}

fn settle(velocity: &mut Vec2, epsilon: f32) {
    if velocity.len() < epsilon {
        *velocity = Vec2::ZERO;
    }
}

/// `v += (a + g)·dt; v *= damping; p += v·dt`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EulerIntegrator;

impl Integrator for EulerIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::Euler
    }

    fn integrate(
        &self,
        body: &mut RigidBody,
        transform: &mut Transform,
        params: &StepParams,
        pool: &mut Vec2Pool,
    ) -> Result<()> {
        snapshot(body, transform);
        if !body.is_dynamic() {
            return Ok(());
        }

        let mut s = Scratch::new(pool);

        let dv = s.put(body.acceleration)?;
        *s.at(dv)? += params.gravity;
        *s.at(dv)? *= params.dt;
        body.velocity += s.value(dv)?;
        body.velocity *= body.damping;
        settle(&mut body.velocity, params.sleep_epsilon);

        let dp = s.put(body.velocity)?;
        *s.at(dp)? *= params.dt;
        transform.position += s.value(dp)?;
        Ok(())
    }
}

/// `p += v·dt + ½·a·dt²; v += a·dt; v *= damping`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerletIntegrator;

impl Integrator for VerletIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::Verlet
    }

    fn integrate(
        &self,
        body: &mut RigidBody,
        transform: &mut Transform,
        params: &StepParams,
        pool: &mut Vec2Pool,
    ) -> Result<()> {
        snapshot(body, transform);
        if !body.is_dynamic() {
            return Ok(());
        }

        let dt = params.dt;
        let mut s = Scratch::new(pool);

        let accel = s.put(body.acceleration)?;
        *s.at(accel)? += params.gravity;

        let dp = s.put(body.velocity)?;
        *s.at(dp)? *= dt;
        let half_a = s.value(accel)? * (0.5 * dt * dt);
        *s.at(dp)? += half_a;
        transform.position += s.value(dp)?;

        body.velocity += s.value(accel)? * dt;
        body.velocity *= body.damping;
        settle(&mut body.velocity, params.sleep_epsilon);
        Ok(())
    }
}

/// Classic fourth-order Runge-Kutta over `(position, velocity)` with the
/// acceleration held constant across the tick; damping applies afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rk4Integrator;

impl Integrator for Rk4Integrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::Rk4
    }

    fn integrate(
        &self,
        body: &mut RigidBody,
        transform: &mut Transform,
        params: &StepParams,
        pool: &mut Vec2Pool,
    ) -> Result<()> {
        snapshot(body, transform);
        if !body.is_dynamic() {
            return Ok(());
        }

        let dt = params.dt;
        let v0 = body.velocity;
        let mut s = Scratch::new(pool);

        // Velocity derivative is the same at every stage.
        let a = s.put(body.acceleration)?;
        *s.at(a)? += params.gravity;
        let accel = s.value(a)?;

        // Position derivatives at the four stages.
        let k1 = s.put(v0)?;
        let k2 = s.put(v0 + accel * (0.5 * dt))?;
        let k3 = s.put(v0 + accel * (0.5 * dt))?;
        let k4 = s.put(v0 + accel * dt)?;

        let (v1, v2, v3, v4) = (s.value(k1)?, s.value(k2)?, s.value(k3)?, s.value(k4)?);
        let sum = s.put(v1)?;
        *s.at(sum)? += v2 * 2.0;
        *s.at(sum)? += v3 * 2.0;
        *s.at(sum)? += v4;
        *s.at(sum)? *= dt / 6.0;

        transform.position += s.value(sum)?;
        body.velocity = v0 + accel * dt;
        body.velocity *= body.damping;
        settle(&mut body.velocity, params.sleep_epsilon);
        Ok(())
    }
}
