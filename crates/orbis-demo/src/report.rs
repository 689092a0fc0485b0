//! Telemetry snapshots of the running scene.
//!
//! Taken once per simulated second for the debug log and once at the end of
//! the run for the summary.

use std::fmt;

use bevy_ecs::prelude::*;
use glam::Vec3;
use orbis_physics::physics_bridge::body_snapshot;
use orbis_physics::{
    Character, GravityBody, GravityRegistry, MotionMode, PhysicsWorld, RigidBodyHandle,
};
use orbis_player::{BallAppearance, OrbitCamera, RollingBall};

use crate::elevator::Elevator;

/// Scene state at one instant.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub position: Vec3,
    pub speed: f32,
    pub mode: Option<MotionMode>,
    /// Net gravity magnitude at the character.
    pub gravity: f32,
    pub jump_phase: u32,
    pub ball: BallAppearance,
    pub camera_distance: f32,
    /// Camera `(pitch, yaw)` in degrees.
    pub camera_angles: (f32, f32),
    pub crates_awake: usize,
    pub crates_total: usize,
    pub elevator_progress: f32,
}

/// Captures telemetry for the first character, or `None` if there is none.
pub fn capture(world: &mut World) -> Option<Telemetry> {
    let (body, mode, jump_phase, ball) = {
        let mut query = world.query::<(&Character, Option<&RollingBall>)>();
        let (character, ball) = query.iter(world).next()?;
        (
            character.body.body,
            character.last_outcome.map(|o| o.mode),
            character.controller.jump_phase(),
            ball.map_or(BallAppearance::Normal, RollingBall::appearance),
        )
    };

    let crates: Vec<RigidBodyHandle> = world
        .query_filtered::<&RigidBodyHandle, With<GravityBody>>()
        .iter(world)
        .copied()
        .collect();

    let physics = world.resource::<PhysicsWorld>();
    let snapshot = body_snapshot(physics, body)?;
    let crates_awake = crates
        .iter()
        .filter_map(|handle| body_snapshot(physics, handle.0))
        .filter(|crate_body| !crate_body.sleeping)
        .count();

    let camera = world.resource::<OrbitCamera>();
    let angles = camera.orbit_angles();
    let registry = world.resource::<GravityRegistry>();

    Some(Telemetry {
        position: snapshot.position,
        speed: snapshot.velocity.length(),
        mode,
        gravity: registry.gravity(snapshot.position).length(),
        jump_phase,
        ball,
        camera_distance: camera.pose().position.distance(snapshot.position),
        camera_angles: (angles.x, angles.y),
        crates_awake,
        crates_total: crates.len(),
        elevator_progress: world
            .get_resource::<Elevator>()
            .map_or(0.0, Elevator::progress),
    })
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = self
            .mode
            .map_or_else(|| "-".to_string(), |mode| format!("{:?}", mode));
        write!(
            f,
            "pos=({:.2}, {:.2}, {:.2}) speed={:.2} mode={} g={:.2} jumps={} ball={:?} \
             camera={:.2}m@({:.0}, {:.0}) crates={}/{} awake elevator={:.2}",
            self.position.x,
            self.position.y,
            self.position.z,
            self.speed,
            mode,
            self.gravity,
            self.jump_phase,
            self.ball,
            self.camera_distance,
            self.camera_angles.0,
            self.camera_angles.1,
            self.crates_awake,
            self.crates_total,
            self.elevator_progress,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_config::Config;

    #[test]
    fn test_capture_fresh_scene() {
        let mut world = crate::scene::build_world(&Config::default());
        let telemetry = capture(&mut world).expect("scene has a character");
        assert!(telemetry.mode.is_none(), "not stepped yet");
        assert_eq!(telemetry.crates_total, 3);
        assert_eq!(telemetry.elevator_progress, 0.0);
        assert!(telemetry.gravity > 0.0);
        assert!(telemetry.to_string().contains("mode=-"));
    }

    #[test]
    fn test_capture_empty_world() {
        let mut world = World::new();
        assert!(capture(&mut world).is_none());
    }
}
