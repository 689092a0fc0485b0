//! Seams to the external physics engine: ray and box sweeps, body snapshots,
//! and collision-layer filtering.
//!
//! The controller, gravity bodies and camera only see these types. The Rapier
//! backend in [`crate::physics_bridge`] is one implementation; tests use
//! scripted fakes.

use glam::{Quat, Vec3};

/// A collision layer index in `0..32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Layer(pub u8);

/// Bit set of collision layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// Matches no layer.
    pub const NONE: Self = Self(0);

    /// Mask with a single layer set.
    pub const fn only(layer: Layer) -> Self {
        Self(1u32 << (layer.0 & 31))
    }

    /// Returns `true` if `layer` is part of this mask.
    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & (1u32 << (layer.0 & 31)) != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<u32> for LayerMask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

/// Whether trigger (sensor) volumes participate in a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryTriggers {
    /// Sensors are skipped.
    Ignore,
    /// Sensors can be hit.
    Collide,
}

/// Opaque identifier of a rigid body owned by the physics engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyId(pub u64);

/// Result of a ray or box sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// World-space impact point.
    pub point: Vec3,
    /// Unit surface normal at the impact point.
    pub normal: Vec3,
    /// Distance travelled along the query direction.
    pub distance: f32,
    /// Layer of the collider that was hit.
    pub layer: Layer,
    /// Rigid body the collider is attached to, if any.
    pub body: Option<BodyId>,
}

/// Read-only view of a rigid body's state for one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySnapshot {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub kinematic: bool,
    pub sleeping: bool,
}

impl BodySnapshot {
    /// A dynamic, awake, unrotated body at `position`.
    pub fn at(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            velocity,
            angular_velocity: Vec3::ZERO,
            mass: 1.0,
            kinematic: false,
            sleeping: false,
        }
    }

    /// Maps a point from body-local space to world space.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Maps a point from world space to body-local space.
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }
}

/// Spatial queries and body lookups provided by the physics engine.
pub trait PhysicsQueries {
    /// Casts a ray and returns the nearest hit within `max_distance`.
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
        triggers: QueryTriggers,
    ) -> Option<RayHit>;

    /// Sweeps an oriented box along `direction` and returns the nearest hit.
    /// Sensors are always ignored.
    fn cast_box(
        &self,
        origin: Vec3,
        half_extents: Vec3,
        orientation: Quat,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;

    /// Returns the current state of a body, or `None` if it no longer exists.
    fn body(&self, id: BodyId) -> Option<BodySnapshot>;
}

/// A world with nothing in it. Every query misses.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyWorld;

impl PhysicsQueries for EmptyWorld {
    fn cast_ray(&self, _: Vec3, _: Vec3, _: f32, _: LayerMask, _: QueryTriggers) -> Option<RayHit> {
        None
    }

    fn cast_box(&self, _: Vec3, _: Vec3, _: Quat, _: Vec3, _: f32, _: LayerMask) -> Option<RayHit> {
        None
    }

    fn body(&self, _: BodyId) -> Option<BodySnapshot> {
        None
    }
}
