//! Elevator platform: rises while anything stands in its detection zone and
//! sinks back once the zone empties.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use bevy_ecs::prelude::*;
use glam::Vec3;
use orbis_app::{AutomaticSlider, DetectionZone};
use orbis_physics::PhysicsWorld;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle, Vector};
use tracing::{debug, trace};

const IDLE: u8 = 0;
const RAISE: u8 = 1;
const LOWER: u8 = 2;

/// Kinematic platform driven by a slider and a detection zone.
#[derive(Resource, Debug)]
pub struct Elevator {
    platform: RigidBodyHandle,
    zone_collider: ColliderHandle,
    from: Vec3,
    travel: Vec3,
    slider: AutomaticSlider,
    zone: DetectionZone<ColliderHandle>,
    request: Arc<AtomicU8>,
}

impl Elevator {
    /// `from` is the platform's rest position; it travels by `travel` over
    /// `duration` seconds.
    pub fn new(
        platform: RigidBodyHandle,
        zone_collider: ColliderHandle,
        from: Vec3,
        travel: Vec3,
        duration: f32,
    ) -> Self {
        let request = Arc::new(AtomicU8::new(IDLE));
        let (raise, lower) = (Arc::clone(&request), Arc::clone(&request));
        Self {
            platform,
            zone_collider,
            from,
            travel,
            slider: AutomaticSlider::new(duration)
                .with_smoothstep(true)
                .on_value_changed(|value| trace!("Elevator at {:.2}", value)),
            zone: DetectionZone::new()
                .on_first_enter(move || raise.store(RAISE, Ordering::SeqCst))
                .on_last_exit(move || lower.store(LOWER, Ordering::SeqCst)),
            request,
        }
    }

    /// Slider position in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.slider.value()
    }

    pub fn occupants(&self) -> usize {
        self.zone.len()
    }

    /// Position the platform is being driven to.
    pub fn target(&self) -> Vec3 {
        self.from + self.travel * self.slider.output()
    }

    fn apply_request(&mut self) {
        match self.request.swap(IDLE, Ordering::SeqCst) {
            RAISE => {
                debug!("Elevator rising");
                self.slider.set_reversed(false);
                self.slider.enable();
            }
            LOWER => {
                debug!("Elevator returning");
                self.slider.set_reversed(true);
                self.slider.enable();
            }
            _ => {}
        }
    }
}

/// Updates the zone from the last engine step and sets the platform velocity
/// so the next step lands it on the slider's target. Runs before the engine
/// step.
pub fn elevator_system(mut physics: ResMut<PhysicsWorld>, mut elevator: ResMut<Elevator>) {
    let dt = physics.dt();
    let zone_collider = elevator.zone_collider;

    let inside: Vec<ColliderHandle> = physics
        .narrow_phase
        .intersection_pairs_with(zone_collider)
        .filter(|(_, _, intersecting)| *intersecting)
        .map(|(a, b, _)| if a == zone_collider { b } else { a })
        .collect();
    elevator.zone.sync(inside);
    elevator
        .zone
        .prune(|collider| physics.collider_set.get(collider).is_some_and(|c| c.is_enabled()));
    elevator.apply_request();
    elevator.slider.fixed_step(dt);

    let target = elevator.target();
    let Some(body) = physics.rigid_body_set.get_mut(elevator.platform) else {
        return;
    };
    let t = body.translation();
    let current = Vec3::new(t.x, t.y, t.z);
    let velocity = (target - current) / dt;
    body.set_linvel(Vector::new(velocity.x, velocity.y, velocity.z), true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_physics::Layer;
    use orbis_physics::physics_bridge::{spawn_moving_platform, spawn_sensor_box};
    use orbis_physics::physics_step_system;
    use rapier3d::prelude::{ColliderBuilder, RigidBodyBuilder};

    fn setup() -> (World, Schedule, RigidBodyHandle, RigidBodyHandle) {
        let mut physics = PhysicsWorld::new();
        let from = Vec3::new(0.0, 0.0, 5.0);
        let platform =
            spawn_moving_platform(&mut physics, from, Vec3::new(1.0, 0.1, 1.0), Vec3::ZERO, Layer(0));
        let zone = spawn_sensor_box(&mut physics, Vec3::ZERO, Vec3::ONE, Layer(5));

        let visitor = physics
            .rigid_body_set
            .insert(RigidBodyBuilder::dynamic().build());
        physics.collider_set.insert_with_parent(
            ColliderBuilder::ball(0.25).build(),
            visitor,
            &mut physics.rigid_body_set,
        );

        let mut world = World::new();
        world.insert_resource(physics);
        world.insert_resource(Elevator::new(platform, zone, from, Vec3::Y * 2.0, 1.0));
        let mut schedule = Schedule::default();
        schedule.add_systems((elevator_system, physics_step_system).chain());
        (world, schedule, platform, visitor)
    }

    fn platform_height(world: &World, platform: RigidBodyHandle) -> f32 {
        world.resource::<PhysicsWorld>().rigid_body_set[platform]
            .translation()
            .y
    }

    #[test]
    fn test_occupied_zone_raises_platform() {
        let (mut world, mut schedule, platform, _) = setup();
        for _ in 0..90 {
            schedule.run(&mut world);
        }
        let elevator = world.resource::<Elevator>();
        assert_eq!(elevator.occupants(), 1);
        assert_eq!(elevator.progress(), 1.0);
        let y = platform_height(&world, platform);
        assert!((y - 2.0).abs() < 1e-3, "y={y}");
    }

    #[test]
    fn test_empty_zone_lowers_platform() {
        let (mut world, mut schedule, platform, visitor) = setup();
        for _ in 0..90 {
            schedule.run(&mut world);
        }
        world.resource_mut::<PhysicsWorld>().rigid_body_set[visitor]
            .set_translation(Vector::new(20.0, 0.0, 0.0), true);
        for _ in 0..90 {
            schedule.run(&mut world);
        }
        let elevator = world.resource::<Elevator>();
        assert_eq!(elevator.occupants(), 0);
        assert_eq!(elevator.progress(), 0.0);
        let y = platform_height(&world, platform);
        assert!(y.abs() < 1e-3, "y={y}");
    }
}
