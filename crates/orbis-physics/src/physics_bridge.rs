//! Rapier backend: implements [`PhysicsQueries`] over a [`PhysicsWorld`],
//! converts engine contacts into [`ContactFrame`]s, and writes controller
//! velocities and gravity-body forces back into the engine.
//!
//! Collider layers live in the low five bits of `Collider::user_data`. Body ids
//! pack a [`rapier3d::prelude::RigidBodyHandle`]'s index and generation.
//!
//! Per fixed tick, run [`character_control_system`] and [`gravity_body_system`]
//! before [`crate::physics_step_system`], then [`character_contact_system`].

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use rapier3d::math::Pose;
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::Cuboid;
use rapier3d::prelude::{
    Collider, ColliderBuilder, ColliderHandle, QueryFilter, QueryPipeline, Ray, RigidBody,
    RigidBodyBuilder, Vector,
};
use tracing::{debug, trace};

use crate::character_controller::{CharacterController, StepOutcome};
use crate::contacts::{ContactFrame, SurfaceContact, TriggerContact};
use crate::gravity_body::{BodyForces, GravityBody};
use crate::gravity_registry::GravityRegistry;
use crate::queries::{
    BodyId, BodySnapshot, Layer, LayerMask, PhysicsQueries, QueryTriggers, RayHit,
};
use crate::{PhysicsWorld, RigidBodyHandle};

type RapierBodyHandle = rapier3d::prelude::RigidBodyHandle;

/// Contact points farther apart than this are speculative and ignored.
const CONTACT_DISTANCE: f32 = 0.02;

fn to_vector(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

/// Stores a collision layer in collider user data.
pub fn layer_user_data(layer: Layer) -> u128 {
    u128::from(layer.0 & 31)
}

/// Collision layer of a collider.
pub fn layer_of(collider: &Collider) -> Layer {
    Layer((collider.user_data & 31) as u8)
}

pub fn body_id(handle: RapierBodyHandle) -> BodyId {
    let (index, generation) = handle.into_raw_parts();
    BodyId((u64::from(generation) << 32) | u64::from(index))
}

pub fn body_handle(id: BodyId) -> RapierBodyHandle {
    RapierBodyHandle::from_raw_parts(id.0 as u32, (id.0 >> 32) as u32)
}

fn snapshot(body: &RigidBody) -> BodySnapshot {
    let t = body.translation();
    let r = body.rotation();
    let v = body.linvel();
    let w = body.angvel();
    BodySnapshot {
        position: Vec3::new(t.x, t.y, t.z),
        rotation: Quat::from_xyzw(r.x, r.y, r.z, r.w),
        velocity: Vec3::new(v.x, v.y, v.z),
        angular_velocity: Vec3::new(w.x, w.y, w.z),
        mass: body.mass(),
        kinematic: body.is_kinematic(),
        sleeping: body.is_sleeping(),
    }
}

/// Snapshot of a body in `physics`, or `None` if the handle is stale.
pub fn body_snapshot(physics: &PhysicsWorld, handle: RapierBodyHandle) -> Option<BodySnapshot> {
    physics.rigid_body_set.get(handle).map(snapshot)
}

/// Scene queries against a [`PhysicsWorld`], optionally ignoring one body
/// (usually the character doing the querying).
pub struct RapierQueries<'a> {
    physics: &'a PhysicsWorld,
    exclude: Option<RapierBodyHandle>,
}

impl<'a> RapierQueries<'a> {
    pub fn new(physics: &'a PhysicsWorld) -> Self {
        Self {
            physics,
            exclude: None,
        }
    }

    pub fn excluding(physics: &'a PhysicsWorld, body: RapierBodyHandle) -> Self {
        Self {
            physics,
            exclude: Some(body),
        }
    }
}

impl RapierQueries<'_> {
    /// Runs `query` against a pipeline restricted to `mask`, skipping the
    /// excluded body and, unless `triggers` collides, sensors.
    fn with_pipeline<R>(
        &self,
        mask: LayerMask,
        triggers: QueryTriggers,
        query: impl FnOnce(&QueryPipeline<'_>) -> R,
    ) -> R {
        let in_mask = |_: ColliderHandle, collider: &Collider| mask.contains(layer_of(collider));
        let mut filter = QueryFilter::new().predicate(&in_mask);
        if triggers == QueryTriggers::Ignore {
            filter = filter.exclude_sensors();
        }
        if let Some(exclude) = self.exclude {
            filter = filter.exclude_rigid_body(exclude);
        }

        let physics = self.physics;
        let query_pipeline = physics.broad_phase.as_query_pipeline(
            physics.narrow_phase.query_dispatcher(),
            &physics.rigid_body_set,
            &physics.collider_set,
            filter,
        );
        query(&query_pipeline)
    }

    fn hit(
        &self,
        handle: ColliderHandle,
        point: Vec3,
        normal: Vec3,
        distance: f32,
    ) -> Option<RayHit> {
        let collider = self.physics.collider_set.get(handle)?;
        Some(RayHit {
            point,
            normal,
            distance,
            layer: layer_of(collider),
            body: collider.parent().map(body_id),
        })
    }
}

impl PhysicsQueries for RapierQueries<'_> {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
        triggers: QueryTriggers,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || !(max_distance > 0.0) {
            return None;
        }

        let ray = Ray::new(to_vector(origin), to_vector(direction));
        let (handle, hit) = self.with_pipeline(mask, triggers, |pipeline| {
            pipeline.cast_ray_and_get_normal(&ray, max_distance, true)
        })?;
        let distance = hit.time_of_impact;
        self.hit(
            handle,
            origin + direction * distance,
            Vec3::new(hit.normal.x, hit.normal.y, hit.normal.z),
            distance,
        )
    }

    /// Sweeps a cuboid. Colliders already overlapping the box at `origin`
    /// are not reported.
    fn cast_box(
        &self,
        origin: Vec3,
        half_extents: Vec3,
        orientation: Quat,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || !(max_distance > 0.0) {
            return None;
        }

        let shape = Cuboid::new(to_vector(half_extents.max(Vec3::ZERO)));
        let pose = Pose::new(to_vector(origin), to_vector(orientation.to_scaled_axis()));
        let mut options = ShapeCastOptions::with_max_time_of_impact(max_distance);
        options.stop_at_penetration = false;

        let (handle, hit) = self.with_pipeline(mask, QueryTriggers::Ignore, |pipeline| {
            pipeline.cast_shape(&pose, to_vector(direction), &shape, options)
        })?;
        let distance = hit.time_of_impact;
        // normal1 is the box's own outward normal, local to the box.
        let n = hit.normal1;
        let outward = orientation * Vec3::new(n.x, n.y, n.z);
        let normal = (-outward).normalize_or(-direction);
        self.hit(handle, origin + direction * distance, normal, distance)
    }

    fn body(&self, id: BodyId) -> Option<BodySnapshot> {
        body_snapshot(self.physics, body_handle(id))
    }
}

// ---------------------------------------------------------------------------
// Scene building
// ---------------------------------------------------------------------------

/// Rapier handles of a controlled character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharacterBody {
    pub body: RapierBodyHandle,
    pub collider: ColliderHandle,
}

/// Spawns a frictionless, non-rotating dynamic ball for a character.
pub fn spawn_character(
    physics: &mut PhysicsWorld,
    position: Vec3,
    radius: f32,
    layer: Layer,
) -> CharacterBody {
    let body = RigidBodyBuilder::dynamic()
        .translation(to_vector(position))
        .lock_rotations()
        .ccd_enabled(true)
        .build();
    let body = physics.rigid_body_set.insert(body);
    let collider = ColliderBuilder::ball(radius)
        .friction(0.0)
        .user_data(layer_user_data(layer))
        .build();
    let collider =
        physics
            .collider_set
            .insert_with_parent(collider, body, &mut physics.rigid_body_set);
    debug!("Spawned character at {:?}", position);
    CharacterBody { body, collider }
}

/// Spawns a fixed box collider.
pub fn spawn_static_box(
    physics: &mut PhysicsWorld,
    center: Vec3,
    rotation: Quat,
    half_extents: Vec3,
    layer: Layer,
) -> ColliderHandle {
    let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        .translation(to_vector(center))
        .rotation(to_vector(rotation.to_scaled_axis()))
        .user_data(layer_user_data(layer))
        .build();
    physics.collider_set.insert(collider)
}

/// Spawns a fixed sphere collider, for example a planet surface.
pub fn spawn_static_sphere(
    physics: &mut PhysicsWorld,
    center: Vec3,
    radius: f32,
    layer: Layer,
) -> ColliderHandle {
    let collider = ColliderBuilder::ball(radius)
        .translation(to_vector(center))
        .user_data(layer_user_data(layer))
        .build();
    physics.collider_set.insert(collider)
}

/// Spawns a fixed sensor box, such as a water volume or a detection zone.
pub fn spawn_sensor_box(
    physics: &mut PhysicsWorld,
    center: Vec3,
    half_extents: Vec3,
    layer: Layer,
) -> ColliderHandle {
    let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        .translation(to_vector(center))
        .sensor(true)
        .user_data(layer_user_data(layer))
        .build();
    physics.collider_set.insert(collider)
}

/// Spawns a kinematic box moving at a constant velocity.
pub fn spawn_moving_platform(
    physics: &mut PhysicsWorld,
    center: Vec3,
    half_extents: Vec3,
    velocity: Vec3,
    layer: Layer,
) -> RapierBodyHandle {
    let body = RigidBodyBuilder::kinematic_velocity_based()
        .translation(to_vector(center))
        .linvel(to_vector(velocity))
        .build();
    let body = physics.rigid_body_set.insert(body);
    let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        .user_data(layer_user_data(layer))
        .build();
    physics
        .collider_set
        .insert_with_parent(collider, body, &mut physics.rigid_body_set);
    body
}

/// Spawns a dynamic box meant to be driven by a [`GravityBody`].
pub fn spawn_gravity_box(
    physics: &mut PhysicsWorld,
    center: Vec3,
    half_extents: Vec3,
    layer: Layer,
) -> RapierBodyHandle {
    let body = RigidBodyBuilder::dynamic()
        .translation(to_vector(center))
        .build();
    let body = physics.rigid_body_set.insert(body);
    let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        .user_data(layer_user_data(layer))
        .build();
    physics
        .collider_set
        .insert_with_parent(collider, body, &mut physics.rigid_body_set);
    body
}

// ---------------------------------------------------------------------------
// Contact collection
// ---------------------------------------------------------------------------

/// Water triggers overlapping `collider`.
fn overlapping_triggers(physics: &PhysicsWorld, collider: ColliderHandle) -> Vec<TriggerContact> {
    physics
        .narrow_phase
        .intersection_pairs_with(collider)
        .filter(|(_, _, intersecting)| *intersecting)
        .filter_map(|(a, b, _)| {
            let other = if a == collider { b } else { a };
            physics.collider_set.get(other)
        })
        .map(|other| TriggerContact {
            layer: layer_of(other),
            body: other.parent().map(body_id),
        })
        .collect()
}

/// Gathers the contacts of the last engine step for a character.
///
/// Water triggers are evaluated first so that solid contacts are skipped once
/// the character is swimming.
pub fn collect_contacts(
    physics: &PhysicsWorld,
    character: &CharacterBody,
    controller: &CharacterController,
) -> ContactFrame {
    let mut collector = controller.contact_collector();
    let Some(body) = body_snapshot(physics, character.body) else {
        return collector.finish();
    };
    let queries = RapierQueries::excluding(physics, character.body);

    for trigger in overlapping_triggers(physics, character.collider) {
        collector.evaluate_submergence(&queries, body.position, trigger);
    }

    for pair in physics.narrow_phase.contact_pairs_with(character.collider) {
        if !pair.has_any_active_contact() {
            continue;
        }
        let character_first = pair.collider1 == character.collider;
        let other = if character_first {
            pair.collider2
        } else {
            pair.collider1
        };
        let Some(other) = physics.collider_set.get(other) else {
            continue;
        };
        if other.is_sensor() {
            continue;
        }
        for manifold in &pair.manifolds {
            if !manifold.points.iter().any(|p| p.dist <= CONTACT_DISTANCE) {
                continue;
            }
            // Manifold normals point away from collider1.
            let n = manifold.data.normal;
            let normal = Vec3::new(n.x, n.y, n.z);
            let normal = if character_first { -normal } else { normal };
            collector.add_contact(SurfaceContact {
                normal,
                layer: layer_of(other),
                body: other.parent().map(body_id),
            });
        }
    }

    let frame = collector.finish();
    trace!(
        "Contacts: ground={} steep={} climb={} submergence={}",
        frame.ground_count, frame.steep_count, frame.climb_count, frame.submergence
    );
    frame
}

/// Runs one controller step for `character` and writes the new velocity.
pub fn step_character(
    physics: &mut PhysicsWorld,
    character: &CharacterBody,
    controller: &mut CharacterController,
    registry: &GravityRegistry,
    frame: ContactFrame,
) -> Option<StepOutcome> {
    let body = body_snapshot(physics, character.body)?;
    let dt = physics.dt();
    let outcome = {
        let queries = RapierQueries::excluding(physics, character.body);
        controller.fixed_step(frame, &body, registry, &queries, dt)
    };
    let rigid_body = physics.rigid_body_set.get_mut(character.body)?;
    rigid_body.set_linvel(to_vector(outcome.velocity), true);
    Some(outcome)
}

/// Applies one step of [`BodyForces`] to a rigid body. Forces from the
/// previous step are cleared first, since Rapier keeps them until reset.
pub fn apply_body_forces(body: &mut RigidBody, forces: Option<BodyForces>) {
    body.reset_forces(false);
    body.reset_torques(false);
    let Some(forces) = forces else {
        return;
    };

    if forces.velocity_scale < 1.0 {
        let v = body.linvel();
        let w = body.angvel();
        let (v, w) = (Vec3::new(v.x, v.y, v.z), Vec3::new(w.x, w.y, w.z));
        body.set_linvel(to_vector(v * forces.velocity_scale), true);
        body.set_angvel(to_vector(w * forces.velocity_scale), true);
    }

    let mass = body.mass();
    body.add_force(to_vector(forces.acceleration * mass), true);
    if let Some((acceleration, point)) = forces.buoyancy {
        body.add_force_at_point(to_vector(acceleration * mass), to_vector(point), true);
    }
}

// ---------------------------------------------------------------------------
// ECS
// ---------------------------------------------------------------------------

/// A controlled character: its engine handles, controller and the contacts
/// waiting for the next step.
#[derive(Component, Debug)]
pub struct Character {
    pub body: CharacterBody,
    pub controller: CharacterController,
    pub pending: ContactFrame,
    pub last_outcome: Option<StepOutcome>,
}

impl Character {
    pub fn new(body: CharacterBody, controller: CharacterController) -> Self {
        Self {
            body,
            controller,
            pending: ContactFrame::default(),
            last_outcome: None,
        }
    }
}

/// Steps every character controller. Runs before the engine step.
pub fn character_control_system(
    mut physics: ResMut<PhysicsWorld>,
    registry: Res<GravityRegistry>,
    mut characters: Query<&mut Character>,
) {
    for mut character in characters.iter_mut() {
        let character = &mut *character;
        let frame = std::mem::take(&mut character.pending);
        character.last_outcome = step_character(
            &mut physics,
            &character.body,
            &mut character.controller,
            &registry,
            frame,
        );
    }
}

/// Collects contacts for every character. Runs after the engine step.
pub fn character_contact_system(
    physics: Res<PhysicsWorld>,
    mut characters: Query<&mut Character>,
) {
    for mut character in characters.iter_mut() {
        let character = &mut *character;
        character.pending = collect_contacts(&physics, &character.body, &character.controller);
    }
}

/// Applies registry gravity, buoyancy and water drag to gravity bodies, then
/// measures their submergence for the next step. Runs before the engine step.
pub fn gravity_body_system(
    mut physics: ResMut<PhysicsWorld>,
    registry: Res<GravityRegistry>,
    mut bodies: Query<(&RigidBodyHandle, &mut GravityBody)>,
) {
    let dt = physics.dt();
    for (handle, mut gravity_body) in bodies.iter_mut() {
        let Some(body) = body_snapshot(&physics, handle.0) else {
            continue;
        };
        let forces = gravity_body.step(&body, &registry, dt);
        if let Some(rigid_body) = physics.rigid_body_set.get_mut(handle.0) {
            apply_body_forces(rigid_body, forces);
        }

        let colliders: Vec<ColliderHandle> = physics
            .rigid_body_set
            .get(handle.0)
            .map(|b| b.colliders().to_vec())
            .unwrap_or_default();
        let queries = RapierQueries::excluding(&physics, handle.0);
        for collider in colliders {
            for trigger in overlapping_triggers(&physics, collider) {
                gravity_body.evaluate_submergence(&queries, &body, trigger);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity_source::{GravityPlane, GravitySphere};
    use crate::physics_step_system;
    use orbis_config::MovementConfig;

    const GROUND: Layer = Layer(0);
    const WATER: Layer = Layer(4);

    fn floor(physics: &mut PhysicsWorld) {
        spawn_static_box(
            physics,
            Vec3::new(0.0, -0.5, 0.0),
            Quat::IDENTITY,
            Vec3::new(50.0, 0.5, 50.0),
            GROUND,
        );
    }

    fn flat_registry() -> GravityRegistry {
        let mut registry = GravityRegistry::new();
        registry.register(GravityPlane::horizontal(Vec3::ZERO, 9.81, 100.0));
        registry
    }

    fn setup(registry: GravityRegistry) -> (World, Schedule) {
        let mut world = World::new();
        world.insert_resource(PhysicsWorld::new());
        world.insert_resource(registry);
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                character_control_system,
                gravity_body_system,
                physics_step_system,
                character_contact_system,
            )
                .chain(),
        );
        (world, schedule)
    }

    #[test]
    fn test_body_id_roundtrip() {
        let mut physics = PhysicsWorld::new();
        let handle = physics
            .rigid_body_set
            .insert(RigidBodyBuilder::dynamic().build());
        assert_eq!(body_handle(body_id(handle)), handle);
    }

    #[test]
    fn test_ray_hits_floor_with_layer() {
        let mut physics = PhysicsWorld::new();
        spawn_static_box(
            &mut physics,
            Vec3::new(0.0, -0.5, 0.0),
            Quat::IDENTITY,
            Vec3::new(10.0, 0.5, 10.0),
            Layer(3),
        );
        physics.step();

        let queries = RapierQueries::new(&physics);
        let hit = queries
            .cast_ray(
                Vec3::new(0.0, 2.0, 0.0),
                Vec3::NEG_Y,
                5.0,
                LayerMask::ALL,
                QueryTriggers::Ignore,
            )
            .expect("ray should hit the floor");
        assert!((hit.distance - 2.0).abs() < 1e-3, "distance={}", hit.distance);
        assert!((hit.normal - Vec3::Y).length() < 1e-3);
        assert_eq!(hit.layer, Layer(3));
        assert!(hit.body.is_none());

        let masked = queries.cast_ray(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::NEG_Y,
            5.0,
            LayerMask::only(Layer(1)),
            QueryTriggers::Ignore,
        );
        assert!(masked.is_none(), "layer mask filters the floor out");
    }

    #[test]
    fn test_sensors_only_hit_when_requested() {
        let mut physics = PhysicsWorld::new();
        spawn_sensor_box(&mut physics, Vec3::ZERO, Vec3::splat(1.0), WATER);
        physics.step();

        let queries = RapierQueries::new(&physics);
        let origin = Vec3::new(0.0, 3.0, 0.0);
        assert!(
            queries
                .cast_ray(origin, Vec3::NEG_Y, 5.0, LayerMask::ALL, QueryTriggers::Ignore)
                .is_none()
        );
        let hit = queries
            .cast_ray(origin, Vec3::NEG_Y, 5.0, LayerMask::ALL, QueryTriggers::Collide)
            .expect("water surface");
        assert!((hit.distance - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_box_cast_catches_offset_obstacle() {
        let mut physics = PhysicsWorld::new();
        // Thin post off to the side of the center ray.
        spawn_static_box(
            &mut physics,
            Vec3::new(0.4, 0.4, -5.0),
            Quat::IDENTITY,
            Vec3::new(0.05, 0.05, 0.5),
            GROUND,
        );
        physics.step();

        let queries = RapierQueries::new(&physics);
        let origin = Vec3::ZERO;
        assert!(
            queries
                .cast_ray(origin, Vec3::NEG_Z, 10.0, LayerMask::ALL, QueryTriggers::Ignore)
                .is_none()
        );
        let hit = queries
            .cast_box(
                origin,
                Vec3::new(0.4, 0.4, 0.0),
                Quat::IDENTITY,
                Vec3::NEG_Z,
                10.0,
                LayerMask::ALL,
            )
            .expect("box corner sweeps into the post");
        assert!((hit.distance - 4.5).abs() < 1e-3, "distance={}", hit.distance);
    }

    #[test]
    fn test_box_cast_catches_obstacle_between_corners() {
        let mut physics = PhysicsWorld::new();
        // Tall thin post crossing the box face between its center and corners.
        spawn_static_box(
            &mut physics,
            Vec3::new(0.2, 0.0, -5.0),
            Quat::IDENTITY,
            Vec3::new(0.05, 2.0, 0.5),
            GROUND,
        );
        physics.step();

        let queries = RapierQueries::new(&physics);
        for offset in [Vec3::ZERO, Vec3::new(0.4, 0.4, 0.0), Vec3::new(-0.4, -0.4, 0.0)] {
            assert!(
                queries
                    .cast_ray(offset, Vec3::NEG_Z, 10.0, LayerMask::ALL, QueryTriggers::Ignore)
                    .is_none()
            );
        }
        let hit = queries
            .cast_box(
                Vec3::ZERO,
                Vec3::new(0.4, 0.4, 0.0),
                Quat::IDENTITY,
                Vec3::NEG_Z,
                10.0,
                LayerMask::ALL,
            )
            .expect("box face sweeps into the post");
        assert!((hit.distance - 4.5).abs() < 1e-3, "distance={}", hit.distance);
        assert!(hit.normal.dot(Vec3::Z) > 0.9, "normal={:?}", hit.normal);
    }

    #[test]
    fn test_character_lands_on_floor() {
        let (mut world, mut schedule) = setup(flat_registry());
        let body = {
            let mut physics = world.resource_mut::<PhysicsWorld>();
            floor(&mut physics);
            spawn_character(&mut physics, Vec3::new(0.0, 2.0, 0.0), 0.5, Layer(1))
        };
        let entity = world
            .spawn(Character::new(
                body,
                CharacterController::new(MovementConfig::default()),
            ))
            .id();

        for _ in 0..180 {
            schedule.run(&mut world);
        }

        let character = world.get::<Character>(entity).unwrap();
        let outcome = character.last_outcome.expect("character was stepped");
        assert_eq!(outcome.mode, crate::MotionMode::Grounded);
        let physics = world.resource::<PhysicsWorld>();
        let y = physics.rigid_body_set[character.body.body].translation().y;
        assert!((y - 0.5).abs() < 0.1, "resting height y={y}");
    }

    #[test]
    fn test_character_walks_on_floor() {
        let (mut world, mut schedule) = setup(flat_registry());
        let body = {
            let mut physics = world.resource_mut::<PhysicsWorld>();
            floor(&mut physics);
            spawn_character(&mut physics, Vec3::new(0.0, 0.5, 0.0), 0.5, Layer(1))
        };
        let mut controller = CharacterController::new(MovementConfig::default());
        controller.set_input(crate::MovementInput {
            axes: Vec3::Z,
            input_space: None,
        });
        let entity = world.spawn(Character::new(body, controller)).id();

        for _ in 0..120 {
            schedule.run(&mut world);
        }

        let character = world.get::<Character>(entity).unwrap();
        let physics = world.resource::<PhysicsWorld>();
        let t = physics.rigid_body_set[character.body.body].translation();
        assert!(t.z > 3.0, "character should have walked forward: z={}", t.z);
        assert!(t.y > 0.3 && t.y < 0.7, "character stays on the floor: y={}", t.y);
    }

    #[test]
    fn test_gravity_body_falls_toward_planet() {
        let mut registry = GravityRegistry::new();
        registry.register(GravitySphere::new(Vec3::ZERO, 9.81, 0.0, 1.0, 50.0, 60.0));
        let (mut world, mut schedule) = setup(registry);
        let handle = {
            let mut physics = world.resource_mut::<PhysicsWorld>();
            spawn_gravity_box(
                &mut physics,
                Vec3::new(20.0, 0.0, 0.0),
                Vec3::splat(0.5),
                GROUND,
            )
        };
        let entity = world
            .spawn((RigidBodyHandle(handle), GravityBody::default()))
            .id();

        for _ in 0..30 {
            schedule.run(&mut world);
        }

        let physics = world.resource::<PhysicsWorld>();
        let t = physics.rigid_body_set[handle].translation();
        assert!(t.x < 20.0, "body pulled toward the center: x={}", t.x);
        assert!(t.y.abs() < 1e-3 && t.z.abs() < 1e-3);
        let gravity = world.get::<GravityBody>(entity).unwrap().gravity();
        assert!(gravity.x < 0.0);
    }

    #[test]
    fn test_submerged_gravity_body_floats() {
        let mut world = World::new();
        world.insert_resource(PhysicsWorld::new());
        world.insert_resource(flat_registry());
        let mut schedule = Schedule::default();
        schedule.add_systems((gravity_body_system, physics_step_system).chain());

        let handle = {
            let mut physics = world.resource_mut::<PhysicsWorld>();
            spawn_sensor_box(&mut physics, Vec3::new(0.0, -5.0, 0.0), Vec3::splat(5.0), WATER);
            spawn_gravity_box(&mut physics, Vec3::new(0.0, -3.0, 0.0), Vec3::splat(0.25), GROUND)
        };
        world.spawn((
            RigidBodyHandle(handle),
            {
                let mut gravity_body = GravityBody::default();
                gravity_body.buoyancy = 2.0;
                gravity_body.water_mask = LayerMask::only(WATER);
                gravity_body
            },
        ));

        for _ in 0..60 {
            schedule.run(&mut world);
        }

        let physics = world.resource::<PhysicsWorld>();
        let t = physics.rigid_body_set[handle].translation();
        assert!(t.y > -3.0, "buoyancy lifts the body: y={}", t.y);
    }
}
