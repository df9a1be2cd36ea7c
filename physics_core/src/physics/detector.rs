//! Narrow-phase collision detection.
//!
//! Turns broadphase candidate pairs into exact contacts. Normals always point
//! from body A to body B, where A is the lower entity id of the pair.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    ecs::{EntityId, World},
    math::Vec2,
    physics::collider::{Shape, WorldShape},
};

/// Confirmed contact between two bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionInfo {
    pub a: EntityId,
    pub b: EntityId,
    pub shape_a: Shape,
    pub shape_b: Shape,
    /// Unit vector pointing from A to B.
    pub normal: Vec2,
    pub penetration: f32,
    pub contacts: Vec<Vec2>,
}

/// Contact geometry before it is tagged with entity ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifold {
    pub normal: Vec2,
    pub penetration: f32,
    pub contacts: Vec<Vec2>,
}

impl Manifold {
    fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// Exact shape-pair tests.
#[derive(Debug, Default)]
pub struct Detector {
    /// Pairs handed to `detect` since the last reset.
    pub total_potential: u64,
    /// Pairs that turned out to be touching.
    pub total_found: u64,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_counters(&mut self) {
        self.total_potential = 0;
        self.total_found = 0;
    }

    /// Runs the exact test on every candidate pair. Pairs whose entities lack
    /// physics components are skipped.
    pub fn detect(
        &mut self,
        world: &World,
        pairs: &BTreeSet<(EntityId, EntityId)>,
    ) -> Vec<CollisionInfo> {
        let mut out = Vec::new();
        for &(a, b) in pairs {
            debug_assert!(a < b, "candidate pairs must be canonical");
            self.total_potential += 1;

            let (Some(body_a), Some(ta), Some(body_b), Some(tb)) =
                (world.body(a), world.transform(a), world.body(b), world.transform(b))
            else {
                continue;
            };

            let wa = body_a.collider.world_shape(ta);
            let wb = body_b.collider.world_shape(tb);
            if let Some(m) = collide(&wa, &wb) {
                self.total_found += 1;
                out.push(CollisionInfo {
                    a,
                    b,
                    shape_a: body_a.collider.shape,
                    shape_b: body_b.collider.shape,
                    normal: m.normal,
                    penetration: m.penetration,
                    contacts: m.contacts,
                });
            }
        }
        out
    }
}

/// Dispatches on the shape pair.
pub fn collide(a: &WorldShape, b: &WorldShape) -> Option<Manifold> {
    match (*a, *b) {
        (
            WorldShape::Circle {
                center: ca,
                radius: ra,
            },
            WorldShape::Circle {
                center: cb,
                radius: rb,
            },
        ) => circle_circle(ca, ra, cb, rb),
        (
            WorldShape::Rectangle {
                center: ca,
                half_extents: ha,
            },
            WorldShape::Rectangle {
                center: cb,
                half_extents: hb,
            },
        ) => rect_rect(ca, ha, cb, hb),
        (
            WorldShape::Circle { center, radius },
            WorldShape::Rectangle {
                center: rc,
                half_extents,
            },
        ) => circle_rect(center, radius, rc, half_extents),
        (
            WorldShape::Rectangle {
                center: rc,
                half_extents,
            },
            WorldShape::Circle { center, radius },
        ) => circle_rect(center, radius, rc, half_extents).map(Manifold::flipped),
    }
}

fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Manifold> {
    let delta = cb - ca;
    let sum = ra + rb;
    let dist_sq = delta.len_sq();
    if dist_sq >= sum * sum {
        return None;
    }
    let dist = dist_sq.sqrt();
    // Coincident centres have no direction; pick +x.
    let normal = delta.try_normalize().unwrap_or(Vec2::X);
    Some(Manifold {
        normal,
        penetration: sum - dist,
        contacts: vec![ca + normal * ra],
    })
}

fn rect_rect(ca: Vec2, ha: Vec2, cb: Vec2, hb: Vec2) -> Option<Manifold> {
    let delta = cb - ca;
    let overlap_x = ha.x + hb.x - delta.x.abs();
    let overlap_y = ha.y + hb.y - delta.y.abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }

    // Shared span on the axis orthogonal to the contact normal.
    let span = |lo_a: f32, hi_a: f32, lo_b: f32, hi_b: f32| (lo_a.max(lo_b), hi_a.min(hi_b));

    if overlap_x < overlap_y {
        let sign = if delta.x < 0.0 { -1.0 } else { 1.0 };
        let face_x = ca.x + ha.x * sign;
        let (y0, y1) = span(ca.y - ha.y, ca.y + ha.y, cb.y - hb.y, cb.y + hb.y);
        Some(Manifold {
            normal: Vec2::new(sign, 0.0),
            penetration: overlap_x,
            contacts: vec![Vec2::new(face_x, y0), Vec2::new(face_x, y1)],
        })
    } else {
        let sign = if delta.y < 0.0 { -1.0 } else { 1.0 };
        let face_y = ca.y + ha.y * sign;
        let (x0, x1) = span(ca.x - ha.x, ca.x + ha.x, cb.x - hb.x, cb.x + hb.x);
        Some(Manifold {
            normal: Vec2::new(0.0, sign),
            penetration: overlap_y,
            contacts: vec![Vec2::new(x0, face_y), Vec2::new(x1, face_y)],
        })
    }
}

/// Circle is body A, rectangle is body B.
fn circle_rect(center: Vec2, radius: f32, rc: Vec2, half: Vec2) -> Option<Manifold> {
    let local = center - rc;
    let clamped = Vec2::new(
        local.x.clamp(-half.x, half.x),
        local.y.clamp(-half.y, half.y),
    );
    let inside = clamped == local;

    if !inside {
        let closest = rc + clamped;
        let to_rect = closest - center;
        let dist_sq = to_rect.len_sq();
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        return Some(Manifold {
            normal: to_rect.try_normalize().unwrap_or(Vec2::X),
            penetration: radius - dist,
            contacts: vec![closest],
        });
    }

    // Centre inside the rectangle: push out through the nearest face.
    let gap_x = half.x - local.x.abs();
    let gap_y = half.y - local.y.abs();
    if gap_x < gap_y {
        let side = if local.x < 0.0 { -1.0 } else { 1.0 };
        Some(Manifold {
            normal: Vec2::new(-side, 0.0),
            penetration: radius + gap_x,
            contacts: vec![Vec2::new(rc.x + half.x * side, center.y)],
        })
    } else {
        let side = if local.y < 0.0 { -1.0 } else { 1.0 };
        Some(Manifold {
            normal: Vec2::new(0.0, -side),
            penetration: radius + gap_y,
            contacts: vec![Vec2::new(center.x, rc.y + half.y * side)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ecs::Transform,
        physics::{
            body::RigidBody,
            collider::{Collider, PhysicsMaterial},
        },
    };

    fn circle(x: f32, y: f32, r: f32) -> WorldShape {
        WorldShape::Circle {
            center: Vec2::new(x, y),
            radius: r,
        }
    }

    fn rect(x: f32, y: f32, hw: f32, hh: f32) -> WorldShape {
        WorldShape::Rectangle {
            center: Vec2::new(x, y),
            half_extents: Vec2::new(hw, hh),
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn circles_overlapping() {
        let m = collide(&circle(0.0, 0.0, 1.0), &circle(1.5, 0.0, 1.0)).unwrap();
        assert_eq!(m.normal, Vec2::X);
        assert!(close(m.penetration, 0.5));
        assert_eq!(m.contacts, vec![Vec2::new(1.0, 0.0)]);
    }

    #[test]
    fn circles_apart_or_touching() {
        assert!(collide(&circle(0.0, 0.0, 1.0), &circle(3.0, 0.0, 1.0)).is_none());
        assert!(collide(&circle(0.0, 0.0, 1.0), &circle(2.0, 0.0, 1.0)).is_none());
    }

    #[test]
    fn coincident_circles_get_fallback_normal() {
        let m = collide(&circle(1.0, 1.0, 1.0), &circle(1.0, 1.0, 2.0)).unwrap();
        assert_eq!(m.normal, Vec2::X);
        assert!(close(m.penetration, 3.0));
    }

    #[test]
    fn rectangles_pick_min_overlap_axis() {
        // x overlap 0.5, y overlap 2.0
        let m = collide(&rect(0.0, 0.0, 1.0, 1.0), &rect(1.5, 0.0, 1.0, 1.0)).unwrap();
        assert_eq!(m.normal, Vec2::new(1.0, 0.0));
        assert!(close(m.penetration, 0.5));
        assert_eq!(m.contacts.len(), 2);

        let m = collide(&rect(0.0, 0.0, 1.0, 1.0), &rect(0.2, -1.8, 1.0, 1.0)).unwrap();
        assert_eq!(m.normal, Vec2::new(0.0, -1.0));
        assert!(close(m.penetration, 0.2));
        assert!(close(m.contacts[0].x, -0.8) && close(m.contacts[0].y, -1.0));
        assert!(close(m.contacts[1].x, 1.0) && close(m.contacts[1].y, -1.0));
    }

    #[test]
    fn rectangles_apart() {
        assert!(collide(&rect(0.0, 0.0, 1.0, 1.0), &rect(3.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn circle_against_rectangle_face() {
        // Circle left of the box, overlapping by 0.5.
        let m = collide(&circle(-1.5, 0.0, 1.0), &rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert_eq!(m.normal, Vec2::X);
        assert!(close(m.penetration, 0.5));
        assert_eq!(m.contacts, vec![Vec2::new(-1.0, 0.0)]);
    }

    #[test]
    fn rectangle_against_circle_flips_normal() {
        let m = collide(&rect(0.0, 0.0, 1.0, 1.0), &circle(-1.5, 0.0, 1.0)).unwrap();
        assert_eq!(m.normal, -Vec2::X);
        assert!(close(m.penetration, 0.5));
    }

    #[test]
    fn circle_centre_inside_rectangle() {
        let m = collide(&circle(0.0, 0.8, 0.5), &rect(0.0, 0.0, 2.0, 1.0)).unwrap();
        // Nearest face is the +y face, circle must move +y, so A->B normal is -y.
        assert_eq!(m.normal, Vec2::new(0.0, -1.0));
        assert!(close(m.penetration, 0.7));
    }

    #[test]
    fn circle_near_corner_misses() {
        // Inside the AABB overlap but outside the rounded corner.
        assert!(collide(&circle(1.8, 1.8, 1.0), &rect(0.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn detect_counts_pairs() {
        let mut world = World::default();
        let m = PhysicsMaterial::default();
        let a = world
            .spawn_body(Transform::at(Vec2::new(0.0, 0.0)), RigidBody::new(1.0, Collider::circle(1.0, m)))
            .unwrap();
        let b = world
            .spawn_body(Transform::at(Vec2::new(1.0, 0.0)), RigidBody::new(1.0, Collider::circle(1.0, m)))
            .unwrap();
        let c = world
            .spawn_body(Transform::at(Vec2::new(9.0, 0.0)), RigidBody::new(1.0, Collider::circle(1.0, m)))
            .unwrap();

        let pairs: BTreeSet<_> = [(a, b), (a, c), (b, c)].into_iter().collect();
        let mut detector = Detector::new();
        let hits = detector.detect(&world, &pairs);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].a, hits[0].b), (a, b));
        assert_eq!(detector.total_potential, 3);
        assert_eq!(detector.total_found, 1);
    }
}
