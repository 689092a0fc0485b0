//! Physics for Orbis: gravity sources and their registry, the sphere character
//! controller, gravity-driven rigid bodies, and the Rapier backend that feeds
//! them contacts and queries.
//!
//! Rapier's own gravity is switched off. Every acceleration comes from the
//! [`GravityRegistry`], either through [`CharacterController`] velocities or
//! through [`GravityBody`] forces.

use bevy_ecs::prelude::*;
use rapier3d::prelude::*;

pub mod character_controller;
pub mod contacts;
pub mod gravity_body;
pub mod gravity_registry;
pub mod gravity_source;
pub mod physics_bridge;
pub mod queries;

pub use character_controller::{
    CharacterController, CosmeticState, MotionMode, MovementInput, StepOutcome,
};
pub use contacts::{ContactCollector, ContactFrame, ContactRules, SurfaceContact, TriggerContact};
pub use gravity_body::{BodyForces, GravityBody};
pub use gravity_registry::{GravityEmitter, GravityRegistry, ScopedSource, SourceId};
pub use gravity_source::{BoxFalloff, GravityBox, GravityPlane, GravitySource, GravitySphere};
pub use physics_bridge::{Character, CharacterBody, RapierQueries};
pub use queries::{
    BodyId, BodySnapshot, EmptyWorld, Layer, LayerMask, PhysicsQueries, QueryTriggers, RayHit,
};

/// Central physics simulation resource owning all Rapier state.
///
/// Insert into the ECS world at startup. Systems read via `Res<PhysicsWorld>`
/// for queries or mutate via `ResMut<PhysicsWorld>` to add/remove bodies.
#[derive(Resource)]
pub struct PhysicsWorld {
    /// Engine gravity. Zero unless a caller opts back into uniform gravity.
    pub gravity: Vector,
    /// Timestep and solver configuration.
    pub integration_parameters: IntegrationParameters,
    /// The main simulation pipeline.
    pub physics_pipeline: PhysicsPipeline,
    /// Tracks sleeping/awake body islands.
    pub island_manager: IslandManager,
    /// Broad-phase collision detection (also provides query pipeline).
    pub broad_phase: BroadPhaseBvh,
    /// Narrow-phase collision detection (contact manifolds).
    pub narrow_phase: NarrowPhase,
    /// All rigid bodies in the simulation.
    pub rigid_body_set: RigidBodySet,
    /// All colliders in the simulation.
    pub collider_set: ColliderSet,
    /// Impulse-based joints.
    pub impulse_joint_set: ImpulseJointSet,
    /// Multibody joints.
    pub multibody_joint_set: MultibodyJointSet,
    /// Continuous collision detection solver.
    pub ccd_solver: CCDSolver,
}

impl PhysicsWorld {
    /// Creates a world without engine gravity stepping at `1/60` seconds.
    pub fn new() -> Self {
        Self::with_timestep(1.0 / 60.0)
    }

    /// Creates a world without engine gravity stepping at `dt` seconds.
    pub fn with_timestep(dt: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt,
            ..Default::default()
        };

        Self {
            gravity: Vector::new(0.0, 0.0, 0.0),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Fixed timestep in seconds.
    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Advances the simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Component that stores a Rapier rigid body handle on an ECS entity.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RigidBodyHandle(pub rapier3d::prelude::RigidBodyHandle);

/// ECS system that steps the physics simulation once per invocation.
pub fn physics_step_system(mut physics: ResMut<PhysicsWorld>) {
    physics.step();
}
