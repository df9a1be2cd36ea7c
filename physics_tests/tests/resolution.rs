//! Resolver outcomes checked against the closed-form collision formulas.

use std::collections::BTreeSet;

use physics_core::{
    ecs::{EntityId, Transform, World},
    math::Vec2,
    physics::{
        formulas, resolver::ResolverSettings, Collider, CollisionInfo, Detector,
        PhysicsMaterial, Resolver, RigidBody,
    },
};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn ball(world: &mut World, pos: Vec2, mass: f32, vel: Vec2, restitution: f32) -> EntityId {
    world
        .spawn_body(
            Transform::at(pos),
            RigidBody::new(
                mass,
                Collider::circle(1.0, PhysicsMaterial::new(restitution, 0.0)),
            )
            .with_velocity(vel),
        )
        .unwrap()
}

fn contacts(world: &World, a: EntityId, b: EntityId) -> Vec<CollisionInfo> {
    let pairs: BTreeSet<_> = [(a.min(b), a.max(b))].into_iter().collect();
    Detector::new().detect(world, &pairs)
}

fn resolve(world: &mut World, a: EntityId, b: EntityId) -> Vec<CollisionInfo> {
    let found = contacts(world, a, b);
    Resolver::new(ResolverSettings::default()).resolve_all(world, &found);
    found
}

#[test]
fn inelastic_head_on_matches_formula() {
    for (ma, mb, va, vb) in [(3.0, 3.0, 100.0, -50.0), (7.0, 4.0, 20.0, -10.0)] {
        let mut world = World::default();
        let a = ball(&mut world, Vec2::new(10.0, 10.0), ma, Vec2::new(va, 0.0), 0.0);
        let b = ball(&mut world, Vec2::new(11.9, 10.0), mb, Vec2::new(vb, 0.0), 0.0);
        resolve(&mut world, a, b);

        let expected = formulas::inelastic_1d(va, vb, ma, mb);
        assert!(close(world.body(a).unwrap().velocity.x, expected));
        assert!(close(world.body(b).unwrap().velocity.x, expected));
    }
}

#[test]
fn unequal_mass_inelastic_value() {
    assert!(close(formulas::inelastic_1d(20.0, -10.0, 7.0, 4.0), 9.0909));
}

#[test]
fn inelastic_2d_reference_values() {
    assert_eq!(
        formulas::inelastic_2d(Vec2::new(20.0, 30.0), Vec2::new(-10.0, -40.0), 14.0, 14.0),
        Vec2::new(5.0, -5.0)
    );
    assert_eq!(
        formulas::inelastic_2d(Vec2::new(40.0, 20.0), Vec2::new(-10.0, -30.0), 8.0, 12.0),
        Vec2::new(10.0, -10.0)
    );
}

#[test]
fn elastic_oblique_matches_formula() {
    let mut world = World::default();
    let (ma, mb) = (2.0, 5.0);
    let (va, vb) = (Vec2::new(30.0, 5.0), Vec2::new(-10.0, 8.0));
    let a = ball(&mut world, Vec2::new(50.0, 50.0), ma, va, 1.0);
    let b = ball(&mut world, Vec2::new(51.2, 51.2), mb, vb, 1.0);
    let found = resolve(&mut world, a, b);
    assert_eq!(found.len(), 1);

    let [ea, eb] = formulas::elastic_2d(va, vb, ma, mb, found[0].normal);
    let (ra, rb) = (world.body(a).unwrap().velocity, world.body(b).unwrap().velocity);
    assert!(close(ra.x, ea.x) && close(ra.y, ea.y), "{:?} vs {:?}", ra, ea);
    assert!(close(rb.x, eb.x) && close(rb.y, eb.y), "{:?} vs {:?}", rb, eb);
}

#[test]
fn partial_restitution_matches_formula() {
    let mut world = World::default();
    let a = ball(&mut world, Vec2::new(10.0, 10.0), 1.0, Vec2::new(8.0, 0.0), 0.5);
    let b = ball(&mut world, Vec2::new(11.5, 10.0), 3.0, Vec2::new(-4.0, 0.0), 0.5);
    resolve(&mut world, a, b);

    let [ea, eb] = formulas::restituted_1d(8.0, -4.0, 1.0, 3.0, 0.5);
    assert!(close(world.body(a).unwrap().velocity.x, ea));
    assert!(close(world.body(b).unwrap().velocity.x, eb));
}

#[test]
fn static_pair_is_left_untouched() {
    let mut world = World::default();
    let wall = |x: f32| {
        RigidBody::new_static(Collider::rectangle(
            Vec2::new(5.0, 5.0),
            PhysicsMaterial::new(1.0, 0.5),
        ))
        .with_velocity(Vec2::new(x, 0.0))
    };
    let a = world
        .spawn_body(Transform::at(Vec2::new(0.0, 0.0)), wall(3.0))
        .unwrap();
    let b = world
        .spawn_body(Transform::at(Vec2::new(8.0, 0.0)), wall(-3.0))
        .unwrap();

    let found = resolve(&mut world, a, b);
    assert_eq!(found.len(), 1);
    assert_eq!(world.body(a).unwrap().velocity, Vec2::new(3.0, 0.0));
    assert_eq!(world.body(b).unwrap().velocity, Vec2::new(-3.0, 0.0));
    assert_eq!(world.transform(a).unwrap().position, Vec2::new(0.0, 0.0));
    assert_eq!(world.transform(b).unwrap().position, Vec2::new(8.0, 0.0));
}

#[test]
fn sleeping_body_acts_like_a_wall() {
    let mut world = World::default();
    let mover = ball(&mut world, Vec2::new(10.0, 10.0), 1.0, Vec2::new(5.0, 0.0), 1.0);
    let sleeper = ball(&mut world, Vec2::new(11.8, 10.0), 1.0, Vec2::ZERO, 1.0);
    world.body_mut(sleeper).unwrap().set_sleeping(true);

    resolve(&mut world, mover, sleeper);
    assert_eq!(world.body(sleeper).unwrap().velocity, Vec2::ZERO);
    assert_eq!(world.transform(sleeper).unwrap().position, Vec2::new(11.8, 10.0));
    assert!(close(world.body(mover).unwrap().velocity.x, -5.0));
}
