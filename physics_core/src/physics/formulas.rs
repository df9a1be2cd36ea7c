//! Closed-form collision outcomes.
//!
//! Reference solutions for head-on collisions between two point masses. The
//! resolver is checked against these, and gameplay code can use them directly.

use crate::math::Vec2;

/// Perfectly elastic 1D collision. Returns the final velocities `[a, b]`.
///
/// Equal masses swap velocities exactly: each mass share is exactly 0.5.
pub fn elastic_1d(va: f32, vb: f32, ma: f32, mb: f32) -> [f32; 2] {
    let total = ma + mb;
    let wa = ma / total;
    let wb = mb / total;
    [
        (1.0 - 2.0 * wb) * va + 2.0 * wb * vb,
        (1.0 - 2.0 * wa) * vb + 2.0 * wa * va,
    ]
}

/// Perfectly inelastic 1D collision: both bodies leave with the
/// momentum-weighted average velocity.
pub fn inelastic_1d(va: f32, vb: f32, ma: f32, mb: f32) -> f32 {
    (ma * va + mb * vb) / (ma + mb)
}

/// Perfectly inelastic 2D collision.
pub fn inelastic_2d(va: Vec2, vb: Vec2, ma: f32, mb: f32) -> Vec2 {
    Vec2::new(
        inelastic_1d(va.x, vb.x, ma, mb),
        inelastic_1d(va.y, vb.y, ma, mb),
    )
}

/// Perfectly elastic 2D collision along the contact `normal` (unit, A to B).
/// Tangential components are untouched.
pub fn elastic_2d(va: Vec2, vb: Vec2, ma: f32, mb: f32, normal: Vec2) -> [Vec2; 2] {
    let an = va.dot(normal);
    let bn = vb.dot(normal);
    let [an2, bn2] = elastic_1d(an, bn, ma, mb);
    [va + normal * (an2 - an), vb + normal * (bn2 - bn)]
}

/// Relative closing speed retained after impact, for a given restitution.
pub fn restituted_1d(va: f32, vb: f32, ma: f32, mb: f32, restitution: f32) -> [f32; 2] {
    let common = inelastic_1d(va, vb, ma, mb);
    let e = restitution.clamp(0.0, 1.0);
    [
        common + e * mb * (vb - va) / (ma + mb),
        common + e * ma * (va - vb) / (ma + mb),
    ]
}
