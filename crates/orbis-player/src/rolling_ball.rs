//! Cosmetic rolling of the character's visual ball.
//!
//! The physics body never rotates; this module spins a visual-only rotation
//! so the ball appears to roll over whatever surface it moves along.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use orbis_config::BallConfig;
use orbis_physics::physics_bridge::body_snapshot;
use orbis_physics::{Character, CosmeticState, MotionMode, PhysicsWorld};

use crate::orbit_camera::FrameTime;

/// Travel below this distance per frame does not roll the ball.
const MIN_ROLL_DISTANCE: f32 = 0.001;

/// Material shown on the ball.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BallAppearance {
    #[default]
    Normal,
    Climbing,
    Swimming,
}

/// Visual rotation and appearance of a character's ball.
#[derive(Component, Clone, Debug)]
pub struct RollingBall {
    config: BallConfig,
    rotation: Quat,
    appearance: BallAppearance,
}

impl RollingBall {
    pub fn new(config: BallConfig) -> Self {
        Self {
            config,
            rotation: Quat::IDENTITY,
            appearance: BallAppearance::Normal,
        }
    }

    pub fn config(&self) -> &BallConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: BallConfig) {
        self.config = config;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn appearance(&self) -> BallAppearance {
        self.appearance
    }

    /// Rolls the ball for one rendered frame given the controller's last step
    /// and the body's current velocity.
    pub fn update(&mut self, cosmetic: &CosmeticState, velocity: Vec3, dt: f32) {
        let mut plane_normal = cosmetic.contact_normal;
        let mut rotation_factor = 1.0;
        self.appearance = match cosmetic.mode {
            MotionMode::Climbing => BallAppearance::Climbing,
            MotionMode::Swimming => {
                rotation_factor = self.config.swim_rotation;
                BallAppearance::Swimming
            }
            MotionMode::Steep => {
                plane_normal = cosmetic.steep_normal.normalize_or(plane_normal);
                BallAppearance::Normal
            }
            MotionMode::Airborne => {
                rotation_factor = self.config.air_rotation;
                BallAppearance::Normal
            }
            MotionMode::Grounded => BallAppearance::Normal,
        };
        let plane_normal = plane_normal.normalize_or(Vec3::Y);

        // Relative to the connected body, and without the part along the
        // normal so jumping does not spin the ball.
        let mut movement = (velocity - cosmetic.connection_velocity) * dt;
        movement -= plane_normal * movement.dot(plane_normal);
        let distance = movement.length();

        let mut rotation = self.rotation;
        if let Some(angular_velocity) = cosmetic.connected_angular_velocity {
            rotation = Quat::from_scaled_axis(angular_velocity * dt) * rotation;
        }
        if !distance.is_finite() || distance < MIN_ROLL_DISTANCE || self.config.radius <= 0.0 {
            self.rotation = rotation.normalize();
            return;
        }

        let angle = distance * rotation_factor / self.config.radius;
        let rotation_axis = plane_normal.cross(movement / distance).normalize_or_zero();
        let ball_up = self.rotation * Vec3::Y;
        rotation = Quat::from_scaled_axis(rotation_axis * angle) * rotation;
        if self.config.align_speed > 0.0 && rotation_axis != Vec3::ZERO {
            rotation = self.align_rotation(ball_up, rotation_axis, rotation, distance);
        }
        self.rotation = rotation.normalize();
    }

    /// Turns the ball's up axis toward the rolling axis, at most
    /// `align_speed` degrees per unit travelled.
    fn align_rotation(
        &self,
        ball_up: Vec3,
        rotation_axis: Vec3,
        rotation: Quat,
        travelled: f32,
    ) -> Quat {
        let dot = ball_up.dot(rotation_axis).clamp(-1.0, 1.0);
        let angle = dot.acos().to_degrees();
        let max_angle = self.config.align_speed * travelled;

        let aligned = Quat::from_rotation_arc(ball_up, rotation_axis) * rotation;
        if angle <= max_angle {
            aligned
        } else {
            rotation.slerp(aligned, max_angle / angle)
        }
    }
}

/// Rolls the ball of every character that has one.
pub fn rolling_ball_system(
    time: Res<FrameTime>,
    physics: Res<PhysicsWorld>,
    mut balls: Query<(&Character, &mut RollingBall)>,
) {
    for (character, mut ball) in balls.iter_mut() {
        let Some(body) = body_snapshot(&physics, character.body.body) else {
            continue;
        };
        ball.update(character.controller.cosmetic(), body.velocity, time.delta);
    }
}
