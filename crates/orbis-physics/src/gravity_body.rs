//! Rigid bodies driven by the gravity registry instead of engine gravity.
//!
//! A [`GravityBody`] computes, per fixed step, the acceleration and buoyancy to
//! apply to a dynamic body. It optionally lets a body that has come to rest
//! fall asleep by withholding gravity, since a constant custom force would
//! otherwise keep it awake forever.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::contacts::TriggerContact;
use crate::gravity_registry::GravityRegistry;
use crate::queries::{BodySnapshot, LayerMask, PhysicsQueries, QueryTriggers};

/// Seconds a body must stay below [`REST_SPEED_SQ`] before gravity is withheld.
pub const FLOAT_TO_SLEEP_DELAY: f32 = 1.0;

/// Squared speed under which a body counts as resting.
pub const REST_SPEED_SQ: f32 = 0.0001;

/// Forces for one step, expressed as accelerations so they scale with mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyForces {
    /// Factor applied to linear and angular velocity for water drag.
    pub velocity_scale: f32,
    /// Acceleration applied at the center of mass.
    pub acceleration: Vec3,
    /// Buoyancy acceleration and the world point it acts on.
    pub buoyancy: Option<(Vec3, Vec3)>,
}

/// Per-body gravity, buoyancy and water drag settings.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct GravityBody {
    /// Stop applying gravity once the body rests, so the engine can sleep it.
    pub float_to_sleep: bool,
    pub submergence_offset: f32,
    pub submergence_range: f32,
    pub buoyancy: f32,
    pub water_drag: f32,
    pub water_mask: LayerMask,
    /// Body-local point where buoyancy acts.
    pub buoyancy_offset: Vec3,
    float_delay: f32,
    submergence: f32,
    gravity: Vec3,
}

impl Default for GravityBody {
    fn default() -> Self {
        Self {
            float_to_sleep: false,
            submergence_offset: 0.5,
            submergence_range: 1.0,
            buoyancy: 1.0,
            water_drag: 1.0,
            water_mask: LayerMask::NONE,
            buoyancy_offset: Vec3::ZERO,
            float_delay: 0.0,
            submergence: 0.0,
            gravity: Vec3::ZERO,
        }
    }
}

impl GravityBody {
    pub fn submergence(&self) -> f32 {
        self.submergence
    }

    /// Gravity sampled by the last step that applied forces.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Returns the forces for this step, or `None` while the body is asleep or
    /// allowed to drift off to sleep.
    pub fn step(
        &mut self,
        body: &BodySnapshot,
        registry: &GravityRegistry,
        dt: f32,
    ) -> Option<BodyForces> {
        if self.float_to_sleep {
            if body.sleeping {
                self.float_delay = 0.0;
                return None;
            }
            if body.velocity.length_squared() < REST_SPEED_SQ {
                self.float_delay += dt;
                if self.float_delay >= FLOAT_TO_SLEEP_DELAY {
                    return None;
                }
            } else {
                self.float_delay = 0.0;
            }
        }

        self.gravity = registry.gravity(body.position);
        let mut forces = BodyForces {
            velocity_scale: 1.0,
            acceleration: self.gravity,
            buoyancy: None,
        };

        if self.submergence > 0.0 {
            forces.velocity_scale = (1.0 - self.water_drag * self.submergence * dt).max(0.0);
            forces.buoyancy = Some((
                self.gravity * -(self.buoyancy * self.submergence),
                body.transform_point(self.buoyancy_offset),
            ));
            self.submergence = 0.0;
        }

        Some(forces)
    }

    /// Measures submergence in the water volume `trigger` against the gravity
    /// of the last step.
    pub fn evaluate_submergence(
        &mut self,
        world: &impl PhysicsQueries,
        body: &BodySnapshot,
        trigger: TriggerContact,
    ) {
        if !self.water_mask.contains(trigger.layer) {
            return;
        }
        let up = -self.gravity.normalize_or_zero();
        let hit = world.cast_ray(
            body.position + up * self.submergence_offset,
            -up,
            self.submergence_range + 1.0,
            self.water_mask,
            QueryTriggers::Collide,
        );
        self.submergence = match hit {
            Some(hit) => (1.0 - hit.distance / self.submergence_range).clamp(0.0, 1.0),
            None => 1.0,
        };
    }
}
