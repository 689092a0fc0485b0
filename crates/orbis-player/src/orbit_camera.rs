//! Orbit camera that follows a target around arbitrary gravity.
//!
//! The camera keeps orbit angles in a frame aligned to the local up axis. Each
//! frame it:
//!
//! 1. rotates that frame toward the registry's up axis at the focus point,
//!    capped at `up_alignment_speed` degrees per second;
//! 2. lets the focus point lag behind the target within `focus_radius`;
//! 3. applies manual orbit input, or after `align_delay` idle seconds turns
//!    to face the direction the target is moving;
//! 4. clamps pitch and wraps yaw;
//! 5. pulls in along the view ray when scenery blocks the near plane.
//!
//! Orbit angles are `(pitch, yaw)` in degrees. Yaw 0 looks along +Z of the
//! aligned frame, yaw 90 along +X, and positive pitch looks down.

use bevy_ecs::prelude::*;
use glam::{EulerRot, Quat, Vec2, Vec3};
use orbis_config::CameraConfig;
use orbis_physics::physics_bridge::body_snapshot;
use orbis_physics::{
    Character, GravityRegistry, LayerMask, PhysicsQueries, PhysicsWorld, RapierQueries,
};
use tracing::trace;

/// Manual input below this magnitude on both axes counts as idle.
const INPUT_EPSILON: f32 = 0.001;

/// Squared focus movement per frame below which automatic rotation is skipped.
const MIN_AUTO_MOVEMENT_SQ: f32 = 0.000001;

/// Focus distance below which centering stops pulling.
const CENTERING_EPSILON: f32 = 0.01;

/// Manual orbit input for one frame, each axis in `[-1, 1]`.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraInput {
    /// `x` changes pitch, `y` changes yaw.
    pub orbit: Vec2,
}

/// Unscaled frame timing.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Seconds since the camera started.
    pub elapsed: f32,
}

/// World-space camera transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
    /// Unit view direction, `rotation * +Z`.
    pub look_direction: Vec3,
}

/// Signed shortest difference from `current` to `target` in degrees, in
/// `(-180, 180]`.
pub fn delta_angle(current: f32, target: f32) -> f32 {
    let delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

/// Moves `current` toward `target` by at most `max_delta` degrees, taking the
/// short way around.
pub fn move_towards_angle(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = delta_angle(current, target);
    if -max_delta < delta && delta < max_delta {
        return target;
    }
    current + delta.clamp(-max_delta, max_delta)
}

/// Yaw in degrees of a unit `(x, z)` direction in the aligned frame.
pub fn heading_angle(direction: Vec2) -> f32 {
    let angle = direction.y.clamp(-1.0, 1.0).acos().to_degrees();
    if direction.x < 0.0 { 360.0 - angle } else { angle }
}

/// Half-extents of the near-plane rectangle for a perspective camera.
pub fn near_plane_half_extents(near_clip: f32, field_of_view: f32, aspect: f32) -> Vec3 {
    let y = near_clip * (0.5 * field_of_view).to_radians().tan();
    Vec3::new(y * aspect, y, 0.0)
}

fn validated(mut config: CameraConfig) -> CameraConfig {
    if config.max_vertical_angle < config.min_vertical_angle {
        config.max_vertical_angle = config.min_vertical_angle;
    }
    config
}

fn orbit_rotation(angles: Vec2) -> Quat {
    Quat::from_euler(EulerRot::YXZ, angles.y.to_radians(), angles.x.to_radians(), 0.0)
}

/// Gravity-aligned orbit camera state.
#[derive(Resource, Clone, Debug)]
pub struct OrbitCamera {
    config: CameraConfig,
    focus_point: Vec3,
    previous_focus_point: Vec3,
    orbit_angles: Vec2,
    orbit_rotation: Quat,
    gravity_alignment: Quat,
    last_manual_rotation_time: f32,
    pose: CameraPose,
}

impl OrbitCamera {
    /// Creates a camera focused on `target`, pitched 45 degrees down.
    pub fn new(config: CameraConfig, target: Vec3) -> Self {
        let mut camera = Self {
            config: validated(config),
            focus_point: target,
            previous_focus_point: target,
            orbit_angles: Vec2::new(45.0, 0.0),
            orbit_rotation: Quat::IDENTITY,
            gravity_alignment: Quat::IDENTITY,
            last_manual_rotation_time: 0.0,
            pose: CameraPose {
                position: target,
                rotation: Quat::IDENTITY,
                look_direction: Vec3::Z,
            },
        };
        camera.constrain_angles();
        camera.orbit_rotation = orbit_rotation(camera.orbit_angles);
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Replaces the settings. The vertical range is re-clamped immediately.
    pub fn set_config(&mut self, config: CameraConfig) {
        self.config = validated(config);
        self.constrain_angles();
        self.orbit_rotation = orbit_rotation(self.orbit_angles);
    }

    pub fn focus_point(&self) -> Vec3 {
        self.focus_point
    }

    /// `(pitch, yaw)` in degrees.
    pub fn orbit_angles(&self) -> Vec2 {
        self.orbit_angles
    }

    pub fn set_orbit_angles(&mut self, angles: Vec2) {
        self.orbit_angles = angles;
        self.constrain_angles();
        self.orbit_rotation = orbit_rotation(self.orbit_angles);
    }

    pub fn gravity_alignment(&self) -> Quat {
        self.gravity_alignment
    }

    /// Pose computed by the last update.
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// Rotation to use as the character's input space.
    pub fn input_space(&self) -> Quat {
        self.pose.rotation
    }

    /// Advances the camera by one rendered frame.
    pub fn update(
        &mut self,
        target: Vec3,
        input: CameraInput,
        registry: &GravityRegistry,
        world: &impl PhysicsQueries,
        time: FrameTime,
    ) -> CameraPose {
        self.update_gravity_alignment(registry, time.delta);
        self.update_focus_point(target, time.delta);

        if self.manual_rotation(input, time) || self.automatic_rotation(time) {
            self.constrain_angles();
            self.orbit_rotation = orbit_rotation(self.orbit_angles);
        }

        let look_rotation = (self.gravity_alignment * self.orbit_rotation).normalize();
        let look_direction = look_rotation * Vec3::Z;
        let mut look_position = self.focus_point - look_direction * self.config.distance;

        // Cast from the true target to the near-plane rectangle so that the
        // lagging focus point cannot hide geometry between camera and target.
        let rect_offset = look_direction * self.config.near_clip;
        let rect_position = look_position + rect_offset;
        let cast_line = rect_position - target;
        let cast_distance = cast_line.length();
        if cast_distance > f32::EPSILON {
            let cast_direction = cast_line / cast_distance;
            let half_extents = near_plane_half_extents(
                self.config.near_clip,
                self.config.field_of_view,
                self.config.aspect,
            );
            if let Some(hit) = world.cast_box(
                target,
                half_extents,
                look_rotation,
                cast_direction,
                cast_distance,
                LayerMask(self.config.obstruction_mask),
            ) {
                trace!("Camera obstructed at {:.2} m", hit.distance);
                look_position = target + cast_direction * hit.distance - rect_offset;
            }
        }

        self.pose = CameraPose {
            position: look_position,
            rotation: look_rotation,
            look_direction,
        };
        self.pose
    }

    fn update_gravity_alignment(&mut self, registry: &GravityRegistry, dt: f32) {
        let from_up = self.gravity_alignment * Vec3::Y;
        let to_up = registry.up_axis(self.focus_point);
        if to_up == Vec3::ZERO {
            return;
        }

        let dot = from_up.dot(to_up).clamp(-1.0, 1.0);
        let angle = dot.acos().to_degrees();
        let max_angle = self.config.up_alignment_speed * dt;

        let new_alignment = Quat::from_rotation_arc(from_up, to_up) * self.gravity_alignment;
        self.gravity_alignment = if angle <= max_angle {
            new_alignment
        } else {
            self.gravity_alignment
                .slerp(new_alignment, max_angle / angle)
        }
        .normalize();
    }

    fn update_focus_point(&mut self, target: Vec3, dt: f32) {
        self.previous_focus_point = self.focus_point;
        let radius = self.config.focus_radius;
        if radius <= 0.0 {
            self.focus_point = target;
            return;
        }

        let distance = target.distance(self.focus_point);
        let mut t = 1.0;
        if distance > CENTERING_EPSILON && self.config.focus_centering > 0.0 {
            t = (1.0 - self.config.focus_centering).powf(dt);
        }
        if distance > radius {
            t = f32::min(t, radius / distance);
        }
        self.focus_point = target.lerp(self.focus_point, t);
    }

    fn manual_rotation(&mut self, input: CameraInput, time: FrameTime) -> bool {
        let orbit = input.orbit;
        if orbit.x.abs() <= INPUT_EPSILON && orbit.y.abs() <= INPUT_EPSILON {
            return false;
        }
        self.orbit_angles += self.config.rotation_speed * time.delta * orbit;
        self.last_manual_rotation_time = time.elapsed;
        true
    }

    fn automatic_rotation(&mut self, time: FrameTime) -> bool {
        if time.elapsed - self.last_manual_rotation_time < self.config.align_delay {
            return false;
        }

        let aligned_delta =
            self.gravity_alignment.inverse() * (self.focus_point - self.previous_focus_point);
        let movement = Vec2::new(aligned_delta.x, aligned_delta.z);
        let movement_sq = movement.length_squared();
        if movement_sq < MIN_AUTO_MOVEMENT_SQ {
            return false;
        }

        let heading = heading_angle(movement / movement_sq.sqrt());
        let delta_abs = delta_angle(self.orbit_angles.y, heading).abs();
        let mut rotation_change = self.config.rotation_speed * time.delta.min(movement_sq);
        let smooth_range = self.config.align_smooth_range;
        if delta_abs < smooth_range {
            rotation_change *= delta_abs / smooth_range;
        } else if 180.0 - delta_abs < smooth_range {
            rotation_change *= (180.0 - delta_abs) / smooth_range;
        }
        self.orbit_angles.y = move_towards_angle(self.orbit_angles.y, heading, rotation_change);
        true
    }

    fn constrain_angles(&mut self) {
        self.orbit_angles.x = self
            .orbit_angles
            .x
            .clamp(self.config.min_vertical_angle, self.config.max_vertical_angle);
        self.orbit_angles.y = self.orbit_angles.y.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs.
        if self.orbit_angles.y >= 360.0 {
            self.orbit_angles.y -= 360.0;
        }
    }
}

/// Follows the first [`Character`] and hands the resulting camera rotation to
/// its controller as input space. Runs once per rendered frame.
pub fn orbit_camera_system(
    time: Res<FrameTime>,
    input: Res<CameraInput>,
    physics: Res<PhysicsWorld>,
    registry: Res<GravityRegistry>,
    mut camera: ResMut<OrbitCamera>,
    mut characters: Query<&mut Character>,
) {
    let Some(mut character) = characters.iter_mut().next() else {
        return;
    };
    let Some(body) = body_snapshot(&physics, character.body.body) else {
        return;
    };
    let world = RapierQueries::excluding(&physics, character.body.body);
    camera.update(body.position, *input, &registry, &world, *time);

    let mut movement = character.controller.input();
    movement.input_space = Some(camera.input_space());
    character.controller.set_input(movement);
}

#[cfg(test)]
#[path = "orbit_camera_tests.rs"]
mod tests;
