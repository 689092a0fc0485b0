//! Scene construction for the headless demo.
//!
//! Every configured gravity source becomes an enabled [`GravityEmitter`]
//! entity. Spheres get a planet collider at their inner radius and planes get
//! a floor slab, so the character has something to stand on wherever gravity
//! points. A water pool, a few loose crates and an elevator platform share the
//! first source's surface.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec2, Vec3};
use orbis_config::{Config, GravitySourceDef};
use orbis_physics::physics_bridge::{
    spawn_character, spawn_gravity_box, spawn_moving_platform, spawn_static_box,
    spawn_static_sphere, spawn_sensor_box,
};
use orbis_physics::{
    Character, CharacterController, GravityBody, GravityEmitter, GravityRegistry, GravitySource,
    Layer, LayerMask, PhysicsWorld, RigidBodyHandle,
};
use orbis_player::{CameraInput, FrameTime, OrbitCamera, RollingBall};
use tracing::{debug, info};

use crate::elevator::Elevator;
use crate::pilot::{Pilot, SimClock};

pub const GROUND: Layer = Layer(0);
pub const CHARACTER: Layer = Layer(1);
pub const WATER: Layer = Layer(4);
pub const ZONE: Layer = Layer(5);

/// Half thickness of the floor slab under a gravity plane.
const FLOOR_HALF_THICKNESS: f32 = 0.5;

/// Half extent of the floor slab along the plane.
const FLOOR_HALF_SIZE: f32 = 50.0;

/// Where the first gravity source puts its surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    /// Point on the surface.
    pub point: Vec3,
    /// Surface normal at `point`.
    pub up: Vec3,
    /// Unit tangent along the surface.
    pub forward: Vec3,
}

impl Surface {
    fn at(point: Vec3, up: Vec3) -> Self {
        let forward = up.any_orthonormal_vector();
        Self { point, up, forward }
    }

    fn offset(&self, along: f32, height: f32) -> Vec3 {
        self.point + self.forward * along + self.up * height
    }
}

/// Enables an emitter per configured source and spawns matching ground
/// colliders. Returns the surface of the first source that has one, plus the
/// emitters.
pub fn build_gravity(
    physics: &mut PhysicsWorld,
    registry: &mut GravityRegistry,
    defs: &[GravitySourceDef],
) -> (Surface, Vec<GravityEmitter>) {
    let mut surface = None;
    let mut emitters = Vec::with_capacity(defs.len());
    for def in defs {
        let source = GravitySource::from_def(def);
        let found = match &source {
            GravitySource::Sphere(sphere) => {
                let (_, inner_radius, _, _) = sphere.radii();
                spawn_static_sphere(physics, sphere.center(), inner_radius, GROUND);
                Some(Surface::at(sphere.center() + Vec3::Y * inner_radius, Vec3::Y))
            }
            GravitySource::Plane(plane) => {
                let rotation = Quat::from_rotation_arc(Vec3::Y, plane.up());
                let center = plane.origin() - plane.up() * FLOOR_HALF_THICKNESS;
                spawn_static_box(
                    physics,
                    center,
                    rotation,
                    Vec3::new(FLOOR_HALF_SIZE, FLOOR_HALF_THICKNESS, FLOOR_HALF_SIZE),
                    GROUND,
                );
                Some(Surface::at(plane.origin(), plane.up()))
            }
            GravitySource::Box(_) => None,
        };
        debug!("Scene source: {}", source.kind());
        let mut emitter = GravityEmitter::new(registry, source);
        emitter.enable(registry);
        emitters.push(emitter);
        surface = surface.or(found);
    }

    let surface = surface.unwrap_or_else(|| {
        info!("No source with a surface, spawning a default floor");
        spawn_static_box(
            physics,
            Vec3::new(0.0, -FLOOR_HALF_THICKNESS, 0.0),
            Quat::IDENTITY,
            Vec3::new(FLOOR_HALF_SIZE, FLOOR_HALF_THICKNESS, FLOOR_HALF_SIZE),
            GROUND,
        );
        Surface::at(Vec3::ZERO, Vec3::Y)
    });
    (surface, emitters)
}

/// Disables every emitter in `world` and resets its registry.
pub fn shutdown_gravity(world: &mut World) {
    world.resource_scope(|world, mut registry: Mut<GravityRegistry>| {
        let mut emitters = world.query::<&mut GravityEmitter>();
        for mut emitter in emitters.iter_mut(world) {
            if emitter.is_active() {
                emitter.disable(&mut registry);
            }
        }
        registry.clear();
    });
}

/// Builds the full ECS world for a run from `config`.
pub fn build_world(config: &Config) -> World {
    let mut world = World::new();
    let mut physics = PhysicsWorld::with_timestep(config.fixed_dt());
    let mut registry = GravityRegistry::new();
    let (surface, emitters) = build_gravity(&mut physics, &mut registry, &config.gravity.sources);

    let start = surface.offset(0.0, 1.0);
    let character_body = spawn_character(&mut physics, start, config.ball.radius, CHARACTER);

    spawn_sensor_box(&mut physics, surface.offset(-2.5, 0.0), Vec3::ONE, WATER);
    let crates: Vec<_> = [(-2.5, 3.0), (-2.5, 5.0), (2.5, 3.0)]
        .into_iter()
        .map(|(along, height)| {
            spawn_gravity_box(
                &mut physics,
                surface.offset(along, height),
                Vec3::splat(0.25),
                GROUND,
            )
        })
        .collect();

    let platform_rest = surface.offset(0.0, 3.0) + surface.up.cross(surface.forward) * 3.0;
    let platform = spawn_moving_platform(
        &mut physics,
        platform_rest,
        Vec3::new(1.0, 0.1, 1.0),
        Vec3::ZERO,
        GROUND,
    );
    let zone = spawn_sensor_box(&mut physics, start, Vec3::splat(1.5), ZONE);

    let mut camera = OrbitCamera::new(config.camera.clone(), start);
    camera.set_orbit_angles(Vec2::new(30.0, 0.0));

    let controller = CharacterController::new(config.movement.clone());
    world.spawn((
        Character::new(character_body, controller),
        RollingBall::new(config.ball.clone()),
    ));
    for emitter in emitters {
        world.spawn(emitter);
    }
    for body in crates {
        world.spawn((
            RigidBodyHandle(body),
            {
                let mut gravity_body = GravityBody::default();
                gravity_body.float_to_sleep = true;
                gravity_body.water_mask = LayerMask::only(WATER);
                gravity_body.buoyancy = 1.2;
                gravity_body.water_drag = 2.0;
                gravity_body
            },
        ));
    }

    info!(
        "Scene: {} gravity sources, {} colliders, start at {:?}",
        registry.len(),
        physics.collider_set.len(),
        start
    );

    world.insert_resource(Elevator::new(
        platform,
        zone,
        platform_rest,
        surface.up * 2.0,
        2.0,
    ));
    world.insert_resource(physics);
    world.insert_resource(registry);
    world.insert_resource(camera);
    world.insert_resource(CameraInput::default());
    world.insert_resource(FrameTime::default());
    world.insert_resource(SimClock::default());
    world.insert_resource(Pilot::default());
    world
}
