//! Sphere character controller for arbitrary gravity: walking, stairs, snapping
//! to ground, jumping, wall climbing, swimming and riding moving bodies.
//!
//! The controller never touches the physics engine directly. Each fixed step it
//! consumes the [`ContactFrame`] collected during the previous engine step, the
//! character body's [`BodySnapshot`], the [`GravityRegistry`] and a
//! [`PhysicsQueries`] implementation, and returns the velocity to write back.
//!
//! # Step order
//!
//! 1. Sample gravity and derive the up axis (the previous axis is kept where
//!    gravity vanishes).
//! 2. Classify the frame: climbing, swimming, ground, snap-to-ground probe,
//!    steep crevasse. Track the connected body's motion.
//! 3. Apply water drag, then input acceleration clamped to `accel * dt`.
//! 4. Resolve a pending jump.
//! 5. Apply gravity for the current mode.

use glam::{Quat, Vec3};
use orbis_config::MovementConfig;
use tracing::{debug, trace, warn};

use crate::contacts::{ContactCollector, ContactFrame, ContactRules};
use crate::gravity_registry::GravityRegistry;
use crate::queries::{BodyId, BodySnapshot, LayerMask, PhysicsQueries, QueryTriggers};

/// Fraction of climb acceleration used to press the character into a wall.
const CLIMB_GRIP: f32 = 0.9;

/// Squared speed below which a grounded character only feels the normal
/// component of gravity, so it does not slide down gentle slopes.
const REST_SPEED_SQ: f32 = 0.01;

/// Player intent for the next steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementInput {
    /// `x` = right, `y` = up (swimming only), `z` = forward. Clamped to length 1.
    pub axes: Vec3,
    /// Frame the axes are relative to, usually the camera's. `None` uses the
    /// world X and Z axes. Both are flattened onto the plane of the up axis.
    pub input_space: Option<Quat>,
}

impl Default for MovementInput {
    fn default() -> Self {
        Self {
            axes: Vec3::ZERO,
            input_space: None,
        }
    }
}

/// Classification of a step, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionMode {
    Climbing,
    Swimming,
    Grounded,
    Steep,
    Airborne,
}

/// Values kept from the last step for orienting the character's visuals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CosmeticState {
    pub mode: MotionMode,
    /// Effective contact normal, or the up axis while airborne.
    pub contact_normal: Vec3,
    pub steep_normal: Vec3,
    /// Velocity inherited from the connected body.
    pub connection_velocity: Vec3,
    /// Angular velocity of the connected body, when it was also connected the
    /// step before.
    pub connected_angular_velocity: Option<Vec3>,
    pub submergence: f32,
}

impl Default for CosmeticState {
    fn default() -> Self {
        Self {
            mode: MotionMode::Airborne,
            contact_normal: Vec3::Y,
            steep_normal: Vec3::ZERO,
            connection_velocity: Vec3::ZERO,
            connected_angular_velocity: None,
            submergence: 0.0,
        }
    }
}

/// Result of one fixed step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    /// Velocity to write back to the character body.
    pub velocity: Vec3,
    pub mode: MotionMode,
    pub up_axis: Vec3,
    /// Net gravity at the body position.
    pub gravity: Vec3,
    /// Whether a jump was performed this step.
    pub jumped: bool,
}

/// Per-step working values.
struct StepState {
    frame: ContactFrame,
    velocity: Vec3,
    gravity: Vec3,
    right_axis: Vec3,
    forward_axis: Vec3,
    connection_velocity: Vec3,
    connected_angular_velocity: Option<Vec3>,
}

/// Builds the classification thresholds for a movement config.
pub fn contact_rules(config: &MovementConfig) -> ContactRules {
    ContactRules {
        min_ground_dot: config.max_ground_angle.to_radians().cos(),
        min_stairs_dot: config.max_stairs_angle.to_radians().cos(),
        min_climb_dot: config.max_climb_angle.to_radians().cos(),
        stairs_mask: LayerMask(config.stairs_mask),
        climb_mask: LayerMask(config.climb_mask),
        water_mask: LayerMask(config.water_mask),
        submergence_offset: config.submergence_offset,
        submergence_range: config.submergence_range,
        swim_threshold: config.swim_threshold,
    }
}

/// Flattens `direction` onto the plane with `normal`, normalized.
pub fn project_direction_on_plane(direction: Vec3, normal: Vec3) -> Vec3 {
    (direction - normal * direction.dot(normal)).normalize_or_zero()
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// State carried across fixed steps for one character.
#[derive(Clone, Debug)]
pub struct CharacterController {
    config: MovementConfig,
    rules: ContactRules,
    input: MovementInput,
    desired_jump: bool,
    desires_climbing: bool,
    up_axis: Vec3,
    steps_since_last_grounded: i32,
    steps_since_last_jump: i32,
    jump_phase: u32,
    previous_connected_body: Option<BodyId>,
    connection_world_position: Vec3,
    connection_local_position: Vec3,
    swimming: bool,
    cosmetic: CosmeticState,
}

impl CharacterController {
    /// Creates a controller. Out-of-range tuning is clamped first.
    pub fn new(mut config: MovementConfig) -> Self {
        config.sanitize();
        Self {
            rules: contact_rules(&config),
            config,
            input: MovementInput::default(),
            desired_jump: false,
            desires_climbing: false,
            up_axis: Vec3::Y,
            steps_since_last_grounded: 0,
            steps_since_last_jump: 0,
            jump_phase: 0,
            previous_connected_body: None,
            connection_world_position: Vec3::ZERO,
            connection_local_position: Vec3::ZERO,
            swimming: false,
            cosmetic: CosmeticState::default(),
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Replaces the tuning, clamped into range, and recomputes the angle
    /// thresholds.
    pub fn set_config(&mut self, mut config: MovementConfig) {
        config.sanitize();
        self.rules = contact_rules(&config);
        self.config = config;
    }

    pub fn rules(&self) -> &ContactRules {
        &self.rules
    }

    /// Up axis used by the last step, also used to classify the next contacts.
    pub fn up_axis(&self) -> Vec3 {
        self.up_axis
    }

    pub fn cosmetic(&self) -> &CosmeticState {
        &self.cosmetic
    }

    pub fn jump_phase(&self) -> u32 {
        self.jump_phase
    }

    pub fn is_swimming(&self) -> bool {
        self.swimming
    }

    pub fn desires_climbing(&self) -> bool {
        self.desires_climbing
    }

    pub fn input(&self) -> MovementInput {
        self.input
    }

    pub fn set_input(&mut self, input: MovementInput) {
        self.input = MovementInput {
            axes: input.axes.clamp_length_max(1.0),
            input_space: input.input_space,
        };
    }

    /// Queues a jump for the next step. Ignored while swimming.
    pub fn request_jump(&mut self) {
        if !self.swimming {
            self.desired_jump = true;
        }
    }

    /// Climbing is never desired while swimming.
    pub fn set_climb_intent(&mut self, climb: bool) {
        self.desires_climbing = climb && !self.swimming;
    }

    /// Suppresses the snap-to-ground probe for the next few steps, for example
    /// when a launch pad throws the character.
    pub fn prevent_snap_to_ground(&mut self) {
        self.steps_since_last_jump = -1;
    }

    /// Starts collecting contacts for the next step.
    pub fn contact_collector(&self) -> ContactCollector {
        ContactCollector::new(self.rules, self.up_axis, self.desires_climbing)
    }

    /// Advances the controller by one fixed step.
    pub fn fixed_step(
        &mut self,
        frame: ContactFrame,
        body: &BodySnapshot,
        registry: &GravityRegistry,
        world: &impl PhysicsQueries,
        dt: f32,
    ) -> StepOutcome {
        let gravity = registry.gravity(body.position);
        let up = -gravity.normalize_or_zero();
        if up != Vec3::ZERO {
            self.up_axis = up;
        }

        if !(dt > 0.0 && dt.is_finite()) {
            warn!("Skipping character step with invalid dt {}", dt);
            return StepOutcome {
                velocity: body.velocity,
                mode: self.cosmetic.mode,
                up_axis: self.up_axis,
                gravity,
                jumped: false,
            };
        }

        let (right, forward) = match self.input.input_space {
            Some(space) => (space * Vec3::X, space * Vec3::Z),
            None => (Vec3::X, Vec3::Z),
        };
        let mut step = StepState {
            frame,
            velocity: body.velocity,
            gravity,
            right_axis: project_direction_on_plane(right, self.up_axis),
            forward_axis: project_direction_on_plane(forward, self.up_axis),
            connection_velocity: Vec3::ZERO,
            connected_angular_velocity: None,
        };

        self.update_state(&mut step, body, world, dt);

        if step.frame.in_water() {
            step.velocity *= 1.0 - self.config.water_drag * step.frame.submergence * dt;
        }

        self.adjust_velocity(&mut step, dt);

        let mut jumped = false;
        if self.desired_jump {
            self.desired_jump = false;
            jumped = self.jump(&mut step);
        }

        self.apply_gravity(&mut step, dt);

        if !step.velocity.is_finite() {
            warn!(
                "Discarding non-finite character velocity {:?}",
                step.velocity
            );
            step.velocity = if body.velocity.is_finite() {
                body.velocity
            } else {
                Vec3::ZERO
            };
        }

        let mode = self.mode(&step.frame);
        if mode != self.cosmetic.mode {
            debug!("Character mode {:?} -> {:?}", self.cosmetic.mode, mode);
        }
        self.finish_step(&step, mode);

        StepOutcome {
            velocity: step.velocity,
            mode,
            up_axis: self.up_axis,
            gravity,
            jumped,
        }
    }

    fn is_climbing(&self, frame: &ContactFrame) -> bool {
        frame.climb_count > 0 && self.steps_since_last_jump > 2
    }

    fn is_swimming_in(&self, frame: &ContactFrame) -> bool {
        frame.submergence >= self.config.swim_threshold
    }

    fn mode(&self, frame: &ContactFrame) -> MotionMode {
        if self.is_climbing(frame) {
            MotionMode::Climbing
        } else if self.is_swimming_in(frame) {
            MotionMode::Swimming
        } else if frame.ground_count > 0 {
            MotionMode::Grounded
        } else if frame.steep_count > 0 {
            MotionMode::Steep
        } else {
            MotionMode::Airborne
        }
    }

    fn update_state(
        &mut self,
        step: &mut StepState,
        body: &BodySnapshot,
        world: &impl PhysicsQueries,
        dt: f32,
    ) {
        self.steps_since_last_grounded = self.steps_since_last_grounded.saturating_add(1);
        self.steps_since_last_jump = self.steps_since_last_jump.saturating_add(1);

        let supported = self.check_climbing(step)
            || self.check_swimming(step)
            || step.frame.ground_count > 0
            || self.snap_to_ground(step, body, world)
            || self.check_steep_contacts(step);

        if supported {
            self.steps_since_last_grounded = 0;
            if self.steps_since_last_jump > 1 {
                self.jump_phase = 0;
            }
            if step.frame.ground_count > 1 {
                step.frame.contact_normal = step
                    .frame
                    .contact_normal
                    .try_normalize()
                    .unwrap_or(self.up_axis);
            }
        } else {
            step.frame.contact_normal = self.up_axis;
        }

        if let Some(id) = step.frame.connected_body
            && let Some(connected) = world.body(id)
            && (connected.kinematic || connected.mass >= body.mass)
        {
            self.update_connection_state(step, id, &connected, body, dt);
        }
    }

    fn update_connection_state(
        &mut self,
        step: &mut StepState,
        id: BodyId,
        connected: &BodySnapshot,
        body: &BodySnapshot,
        dt: f32,
    ) {
        if self.previous_connected_body == Some(id) {
            let movement = connected.transform_point(self.connection_local_position)
                - self.connection_world_position;
            step.connection_velocity = movement / dt;
            step.connected_angular_velocity = Some(connected.angular_velocity);
        }
        self.connection_world_position = body.position;
        self.connection_local_position = connected.inverse_transform_point(body.position);
    }

    fn check_climbing(&self, step: &mut StepState) -> bool {
        if !self.is_climbing(&step.frame) {
            return false;
        }
        let frame = &mut step.frame;
        if frame.climb_count > 1 {
            frame.climb_normal = frame.climb_normal.normalize_or_zero();
            // Stuck in a crevasse between two climbable walls: keep the last one.
            if self.up_axis.dot(frame.climb_normal) >= self.rules.min_ground_dot {
                frame.climb_normal = frame.last_climb_normal;
            }
        }
        frame.ground_count = 1;
        frame.contact_normal = frame.climb_normal;
        true
    }

    fn check_swimming(&self, step: &mut StepState) -> bool {
        if !self.is_swimming_in(&step.frame) {
            return false;
        }
        step.frame.ground_count = 0;
        step.frame.contact_normal = self.up_axis;
        true
    }

    fn snap_to_ground(
        &self,
        step: &mut StepState,
        body: &BodySnapshot,
        world: &impl PhysicsQueries,
    ) -> bool {
        if self.steps_since_last_grounded > 1 || self.steps_since_last_jump <= 2 {
            return false;
        }
        let speed = step.velocity.length();
        if speed > self.config.max_snap_speed {
            return false;
        }
        let Some(hit) = world.cast_ray(
            body.position,
            -self.up_axis,
            self.config.probe_distance,
            LayerMask(self.config.probe_mask),
            QueryTriggers::Ignore,
        ) else {
            return false;
        };
        if self.up_axis.dot(hit.normal) < self.rules.min_dot(hit.layer) {
            return false;
        }

        step.frame.ground_count = 1;
        step.frame.contact_normal = hit.normal;
        let dot = step.velocity.dot(hit.normal);
        if dot > 0.0 {
            step.velocity = (step.velocity - hit.normal * dot).normalize_or_zero() * speed;
        }
        step.frame.connected_body = hit.body;
        trace!("Snapped to ground at {:?}", hit.point);
        true
    }

    fn check_steep_contacts(&self, step: &mut StepState) -> bool {
        let frame = &mut step.frame;
        if frame.steep_count > 1 {
            frame.steep_normal = frame.steep_normal.normalize_or_zero();
            if self.up_axis.dot(frame.steep_normal) >= self.rules.min_ground_dot {
                frame.steep_count = 0;
                frame.ground_count = 1;
                frame.contact_normal = frame.steep_normal;
                return true;
            }
        }
        false
    }

    fn adjust_velocity(&self, step: &mut StepState, dt: f32) {
        let config = &self.config;
        let on_ground = step.frame.ground_count > 0;
        let swimming = self.is_swimming_in(&step.frame);

        let (acceleration, speed, x_axis, z_axis) = if self.is_climbing(&step.frame) {
            (
                config.max_climb_acceleration,
                config.max_climb_speed,
                step.frame.contact_normal.cross(self.up_axis),
                self.up_axis,
            )
        } else if step.frame.in_water() {
            let swim_factor = (step.frame.submergence / config.swim_threshold).min(1.0);
            let base_acceleration = if on_ground {
                config.max_acceleration
            } else {
                config.max_air_acceleration
            };
            (
                lerp(base_acceleration, config.max_swim_acceleration, swim_factor),
                lerp(config.max_speed, config.max_swim_speed, swim_factor),
                step.right_axis,
                step.forward_axis,
            )
        } else {
            let acceleration = if on_ground {
                config.max_acceleration
            } else {
                config.max_air_acceleration
            };
            let speed = if on_ground && self.desires_climbing {
                config.max_climb_speed
            } else {
                config.max_speed
            };
            (acceleration, speed, step.right_axis, step.forward_axis)
        };

        let x_axis = project_direction_on_plane(x_axis, step.frame.contact_normal);
        let z_axis = project_direction_on_plane(z_axis, step.frame.contact_normal);

        let input = self.input.axes;
        let relative_velocity = step.velocity - step.connection_velocity;
        let adjustment = Vec3::new(
            input.x * speed - relative_velocity.dot(x_axis),
            if swimming {
                input.y * speed - relative_velocity.dot(self.up_axis)
            } else {
                0.0
            },
            input.z * speed - relative_velocity.dot(z_axis),
        )
        .clamp_length_max(acceleration * dt);

        step.velocity += x_axis * adjustment.x + z_axis * adjustment.z;
        if swimming {
            step.velocity += self.up_axis * adjustment.y;
        }
    }

    fn jump(&mut self, step: &mut StepState) -> bool {
        let frame = &step.frame;
        let direction = if frame.ground_count > 0 {
            frame.contact_normal
        } else if frame.steep_count > 0 {
            self.jump_phase = 0;
            frame.steep_normal
        } else if self.config.max_air_jumps > 0 && self.jump_phase <= self.config.max_air_jumps {
            if self.jump_phase == 0 {
                self.jump_phase = 1;
            }
            frame.contact_normal
        } else {
            return false;
        };

        self.steps_since_last_jump = 0;
        self.jump_phase += 1;

        let mut jump_speed = (2.0 * step.gravity.length() * self.config.jump_height).sqrt();
        if frame.in_water() {
            jump_speed *= (1.0 - frame.submergence / self.config.swim_threshold).max(0.0);
        }
        let direction = (direction + self.up_axis).normalize_or_zero();
        let aligned_speed = step.velocity.dot(direction);
        if aligned_speed > 0.0 {
            jump_speed = (jump_speed - aligned_speed).max(0.0);
        }
        step.velocity += direction * jump_speed;
        trace!(
            "Jump phase {} along {:?} at {} m/s",
            self.jump_phase, direction, jump_speed
        );
        true
    }

    fn apply_gravity(&self, step: &mut StepState, dt: f32) {
        let frame = &step.frame;
        let on_ground = frame.ground_count > 0;
        let grip = self.config.max_climb_acceleration * CLIMB_GRIP;

        if self.is_climbing(frame) {
            step.velocity -= frame.contact_normal * (grip * dt);
        } else if frame.in_water() {
            step.velocity +=
                step.gravity * ((1.0 - self.config.buoyancy * frame.submergence) * dt);
        } else if on_ground && step.velocity.length_squared() < REST_SPEED_SQ {
            step.velocity += frame.contact_normal * (step.gravity.dot(frame.contact_normal) * dt);
        } else if self.desires_climbing && on_ground {
            step.velocity += (step.gravity - frame.contact_normal * grip) * dt;
        } else {
            step.velocity += step.gravity * dt;
        }
    }

    fn finish_step(&mut self, step: &StepState, mode: MotionMode) {
        self.swimming = self.is_swimming_in(&step.frame);
        if self.swimming {
            self.desires_climbing = false;
            self.desired_jump = false;
        }
        self.previous_connected_body = step.frame.connected_body;
        self.cosmetic = CosmeticState {
            mode,
            contact_normal: step.frame.contact_normal,
            steep_normal: step.frame.steep_normal,
            connection_velocity: step.connection_velocity,
            connected_angular_velocity: step.connected_angular_velocity,
            submergence: step.frame.submergence,
        };
    }
}

#[cfg(test)]
#[path = "character_controller_tests.rs"]
mod tests;
