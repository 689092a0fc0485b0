//! Analytic gravity sources: plane, sphere and box.
//!
//! Each source maps a world position to an acceleration vector. Parameters are
//! private and every setter re-validates them, so the cached falloff factors
//! always match the current radii/distances.

use glam::{EulerRot, Quat, Vec3};
use orbis_config::GravitySourceDef;

/// Reciprocal of a falloff span. A zero or negative span saturates instead of
/// dividing by zero, which turns the band into an instant cutoff.
fn falloff_factor(span: f32) -> f32 {
    let factor = 1.0 / span;
    if span > 0.0 && factor.is_finite() {
        factor
    } else {
        f32::MAX
    }
}

/// Linear falloff weight for `offset * factor`, clamped to `[0, 1]`.
fn attenuation(offset: f32, factor: f32) -> f32 {
    (1.0 - offset * factor).clamp(0.0, 1.0)
}

fn euler_degrees(rotation: [f32; 3]) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        rotation[1].to_radians(),
        rotation[0].to_radians(),
        rotation[2].to_radians(),
    )
}

// ---------------------------------------------------------------------------
// Plane
// ---------------------------------------------------------------------------

/// Infinite plane pulling everything up to `range` above it straight down.
#[derive(Clone, Debug, PartialEq)]
pub struct GravityPlane {
    origin: Vec3,
    rotation: Quat,
    strength: f32,
    range: f32,
}

impl GravityPlane {
    /// Creates a plane whose up direction is `rotation * +Y`. Negative ranges
    /// are clamped to zero.
    pub fn new(origin: Vec3, rotation: Quat, strength: f32, range: f32) -> Self {
        Self {
            origin,
            rotation: rotation.normalize(),
            strength,
            range: range.max(0.0),
        }
    }

    /// Horizontal plane through `origin` with up = +Y.
    pub fn horizontal(origin: Vec3, strength: f32, range: f32) -> Self {
        Self::new(origin, Quat::IDENTITY, strength, range)
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn set_transform(&mut self, origin: Vec3, rotation: Quat) {
        self.origin = origin;
        self.rotation = rotation.normalize();
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }

    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.0);
    }

    /// Full-strength pull along `-up` anywhere at or below `range` above the
    /// plane, zero beyond it. The field is binary: there is no attenuation
    /// between the surface and `range`.
    pub fn gravity_at(&self, position: Vec3) -> Vec3 {
        let up = self.up();
        let distance = up.dot(position - self.origin);
        if distance > self.range {
            return Vec3::ZERO;
        }
        -self.strength * up
    }
}

// ---------------------------------------------------------------------------
// Sphere
// ---------------------------------------------------------------------------

/// Spherical source with an outer falloff shell and an inverted inner core.
///
/// Between `inner_radius` and `outer_radius` the pull has full strength toward
/// the center. It fades out linearly from `outer_radius` to
/// `outer_falloff_radius`, and from `inner_radius` down to
/// `inner_falloff_radius`.
#[derive(Clone, Debug, PartialEq)]
pub struct GravitySphere {
    center: Vec3,
    strength: f32,
    inner_falloff_radius: f32,
    inner_radius: f32,
    outer_radius: f32,
    outer_falloff_radius: f32,
    inner_falloff_factor: f32,
    outer_falloff_factor: f32,
}

impl GravitySphere {
    /// Creates a sphere with the given radii, clamped into
    /// `0 <= inner_falloff <= inner <= outer <= outer_falloff`.
    pub fn new(
        center: Vec3,
        strength: f32,
        inner_falloff_radius: f32,
        inner_radius: f32,
        outer_radius: f32,
        outer_falloff_radius: f32,
    ) -> Self {
        let mut sphere = Self {
            center,
            strength,
            inner_falloff_radius,
            inner_radius,
            outer_radius,
            outer_falloff_radius,
            inner_falloff_factor: 0.0,
            outer_falloff_factor: 0.0,
        };
        sphere.validate();
        sphere
    }

    fn validate(&mut self) {
        self.inner_falloff_radius = self.inner_falloff_radius.max(0.0);
        self.inner_radius = self.inner_radius.max(self.inner_falloff_radius);
        self.outer_radius = self.outer_radius.max(self.inner_radius);
        self.outer_falloff_radius = self.outer_falloff_radius.max(self.outer_radius);

        self.inner_falloff_factor = falloff_factor(self.inner_radius - self.inner_falloff_radius);
        self.outer_falloff_factor = falloff_factor(self.outer_falloff_radius - self.outer_radius);
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// `(inner_falloff, inner, outer, outer_falloff)` radii.
    pub fn radii(&self) -> (f32, f32, f32, f32) {
        (
            self.inner_falloff_radius,
            self.inner_radius,
            self.outer_radius,
            self.outer_falloff_radius,
        )
    }

    /// `(inner, outer)` cached falloff factors.
    pub fn falloff_factors(&self) -> (f32, f32) {
        (self.inner_falloff_factor, self.outer_falloff_factor)
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }

    pub fn set_radii(
        &mut self,
        inner_falloff_radius: f32,
        inner_radius: f32,
        outer_radius: f32,
        outer_falloff_radius: f32,
    ) {
        self.inner_falloff_radius = inner_falloff_radius;
        self.inner_radius = inner_radius;
        self.outer_radius = outer_radius;
        self.outer_falloff_radius = outer_falloff_radius;
        self.validate();
    }

    pub fn set_outer_radius(&mut self, outer_radius: f32) {
        self.outer_radius = outer_radius;
        self.validate();
    }

    pub fn set_outer_falloff_radius(&mut self, outer_falloff_radius: f32) {
        self.outer_falloff_radius = outer_falloff_radius;
        self.validate();
    }

    pub fn set_inner_radius(&mut self, inner_radius: f32) {
        self.inner_radius = inner_radius;
        self.validate();
    }

    pub fn set_inner_falloff_radius(&mut self, inner_falloff_radius: f32) {
        self.inner_falloff_radius = inner_falloff_radius;
        self.validate();
    }

    pub fn gravity_at(&self, position: Vec3) -> Vec3 {
        let vector = self.center - position;
        let distance = vector.length();
        if distance > self.outer_falloff_radius
            || distance < self.inner_falloff_radius
            || distance <= f32::EPSILON
        {
            return Vec3::ZERO;
        }

        let mut g = self.strength / distance;
        if distance > self.outer_radius {
            g *= attenuation(distance - self.outer_radius, self.outer_falloff_factor);
        } else if distance < self.inner_radius {
            g *= attenuation(self.inner_radius - distance, self.inner_falloff_factor);
        }
        g * vector
    }
}

// ---------------------------------------------------------------------------
// Box
// ---------------------------------------------------------------------------

/// Oriented box pulling toward its nearest face from inside, and toward its
/// surface from outside with rounded edge/corner falloff.
#[derive(Clone, Debug, PartialEq)]
pub struct GravityBox {
    center: Vec3,
    rotation: Quat,
    strength: f32,
    boundary: Vec3,
    inner_distance: f32,
    inner_falloff_distance: f32,
    outer_distance: f32,
    outer_falloff_distance: f32,
    inner_falloff_factor: f32,
    outer_falloff_factor: f32,
}

/// Distances of a [`GravityBox`] measured from its faces.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxFalloff {
    /// Depth below a face with full strength.
    pub inner_distance: f32,
    /// Depth below a face where the pull fades to zero.
    pub inner_falloff_distance: f32,
    /// Height above a face with full strength.
    pub outer_distance: f32,
    /// Height above a face where the pull fades to zero.
    pub outer_falloff_distance: f32,
}

impl GravityBox {
    pub fn new(
        center: Vec3,
        rotation: Quat,
        strength: f32,
        boundary: Vec3,
        falloff: BoxFalloff,
    ) -> Self {
        let mut gravity_box = Self {
            center,
            rotation: rotation.normalize(),
            strength,
            boundary,
            inner_distance: falloff.inner_distance,
            inner_falloff_distance: falloff.inner_falloff_distance,
            outer_distance: falloff.outer_distance,
            outer_falloff_distance: falloff.outer_falloff_distance,
            inner_falloff_factor: 0.0,
            outer_falloff_factor: 0.0,
        };
        gravity_box.validate();
        gravity_box
    }

    fn validate(&mut self) {
        self.boundary = self.boundary.max(Vec3::ZERO);

        let max_inner = self.boundary.min_element();
        self.inner_distance = self.inner_distance.clamp(0.0, max_inner);
        self.inner_falloff_distance = self
            .inner_falloff_distance
            .min(max_inner)
            .max(self.inner_distance);

        self.outer_distance = self.outer_distance.max(0.0);
        self.outer_falloff_distance = self.outer_falloff_distance.max(self.outer_distance);

        self.inner_falloff_factor =
            falloff_factor(self.inner_falloff_distance - self.inner_distance);
        self.outer_falloff_factor =
            falloff_factor(self.outer_falloff_distance - self.outer_distance);
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Half-extents of the box.
    pub fn boundary(&self) -> Vec3 {
        self.boundary
    }

    pub fn falloff(&self) -> BoxFalloff {
        BoxFalloff {
            inner_distance: self.inner_distance,
            inner_falloff_distance: self.inner_falloff_distance,
            outer_distance: self.outer_distance,
            outer_falloff_distance: self.outer_falloff_distance,
        }
    }

    /// `(inner, outer)` cached falloff factors.
    pub fn falloff_factors(&self) -> (f32, f32) {
        (self.inner_falloff_factor, self.outer_falloff_factor)
    }

    pub fn set_transform(&mut self, center: Vec3, rotation: Quat) {
        self.center = center;
        self.rotation = rotation.normalize();
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }

    pub fn set_boundary(&mut self, boundary: Vec3) {
        self.boundary = boundary;
        self.validate();
    }

    pub fn set_falloff(&mut self, falloff: BoxFalloff) {
        self.inner_distance = falloff.inner_distance;
        self.inner_falloff_distance = falloff.inner_falloff_distance;
        self.outer_distance = falloff.outer_distance;
        self.outer_falloff_distance = falloff.outer_falloff_distance;
        self.validate();
    }

    pub fn gravity_at(&self, position: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * (position - self.center);

        let mut vector = Vec3::ZERO;
        let mut outside = 0;
        for axis in 0..3 {
            let bound = self.boundary[axis];
            if local[axis] > bound {
                vector[axis] = bound - local[axis];
                outside += 1;
            } else if local[axis] < -bound {
                vector[axis] = -bound - local[axis];
                outside += 1;
            }
        }

        if outside > 0 {
            // Directly above a single face the offsets along the other axes are
            // zero, so their sum is the distance to that face.
            let distance = if outside == 1 {
                (vector.x + vector.y + vector.z).abs()
            } else {
                vector.length()
            };
            if distance > self.outer_falloff_distance || distance <= f32::EPSILON {
                return Vec3::ZERO;
            }
            let mut g = self.strength / distance;
            if distance > self.outer_distance {
                g *= attenuation(distance - self.outer_distance, self.outer_falloff_factor);
            }
            return self.rotation * (g * vector);
        }

        let margins = self.boundary - local.abs();
        let axis = if margins.x < margins.y {
            if margins.x < margins.z { 0 } else { 2 }
        } else if margins.y < margins.z {
            1
        } else {
            2
        };
        vector[axis] = self.face_component(local[axis], margins[axis]);
        self.rotation * vector
    }

    /// Pull toward the face on the side of `coordinate`, `margin` below it.
    fn face_component(&self, coordinate: f32, margin: f32) -> f32 {
        if margin > self.inner_falloff_distance {
            return 0.0;
        }
        let mut g = self.strength;
        if margin > self.inner_distance {
            g *= attenuation(margin - self.inner_distance, self.inner_falloff_factor);
        }
        if coordinate > 0.0 { -g } else { g }
    }
}

// ---------------------------------------------------------------------------
// Closed variant set
// ---------------------------------------------------------------------------

/// Every kind of gravity source the registry can aggregate.
#[derive(Clone, Debug, PartialEq)]
pub enum GravitySource {
    Plane(GravityPlane),
    Sphere(GravitySphere),
    Box(GravityBox),
}

impl GravitySource {
    /// Acceleration this source contributes at `position`.
    pub fn gravity_at(&self, position: Vec3) -> Vec3 {
        match self {
            GravitySource::Plane(plane) => plane.gravity_at(position),
            GravitySource::Sphere(sphere) => sphere.gravity_at(position),
            GravitySource::Box(gravity_box) => gravity_box.gravity_at(position),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GravitySource::Plane(_) => "plane",
            GravitySource::Sphere(_) => "sphere",
            GravitySource::Box(_) => "box",
        }
    }

    /// Builds a source from its configuration definition.
    pub fn from_def(def: &GravitySourceDef) -> Self {
        match *def {
            GravitySourceDef::Plane {
                origin,
                rotation,
                strength,
                range,
            } => GravitySource::Plane(GravityPlane::new(
                Vec3::from_array(origin),
                euler_degrees(rotation),
                strength,
                range,
            )),
            GravitySourceDef::Sphere {
                center,
                strength,
                inner_falloff_radius,
                inner_radius,
                outer_radius,
                outer_falloff_radius,
            } => GravitySource::Sphere(GravitySphere::new(
                Vec3::from_array(center),
                strength,
                inner_falloff_radius,
                inner_radius,
                outer_radius,
                outer_falloff_radius,
            )),
            GravitySourceDef::Box {
                center,
                rotation,
                strength,
                boundary,
                inner_distance,
                inner_falloff_distance,
                outer_distance,
                outer_falloff_distance,
            } => GravitySource::Box(GravityBox::new(
                Vec3::from_array(center),
                euler_degrees(rotation),
                strength,
                Vec3::from_array(boundary),
                BoxFalloff {
                    inner_distance,
                    inner_falloff_distance,
                    outer_distance,
                    outer_falloff_distance,
                },
            )),
        }
    }
}

impl From<GravityPlane> for GravitySource {
    fn from(plane: GravityPlane) -> Self {
        GravitySource::Plane(plane)
    }
}

impl From<GravitySphere> for GravitySource {
    fn from(sphere: GravitySphere) -> Self {
        GravitySource::Sphere(sphere)
    }
}

impl From<GravityBox> for GravitySource {
    fn from(gravity_box: GravityBox) -> Self {
        GravitySource::Box(gravity_box)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_sphere() -> GravitySphere {
        GravitySphere::new(Vec3::ZERO, 10.0, 1.0, 5.0, 10.0, 15.0)
    }

    fn falloff(inner: f32, inner_falloff: f32, outer: f32, outer_falloff: f32) -> BoxFalloff {
        BoxFalloff {
            inner_distance: inner,
            inner_falloff_distance: inner_falloff,
            outer_distance: outer,
            outer_falloff_distance: outer_falloff,
        }
    }

    // -- Plane --

    #[test]
    fn test_plane_on_surface_has_full_strength() {
        let plane = GravityPlane::horizontal(Vec3::new(0.0, 2.0, 0.0), 9.81, 1.0);
        let g = plane.gravity_at(Vec3::new(5.0, 2.0, -3.0));
        assert!((g.length() - 9.81).abs() < 1e-5);
        assert!((g.normalize() - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_plane_beyond_range_is_zero() {
        let plane = GravityPlane::horizontal(Vec3::ZERO, 9.81, 1.0);
        assert_eq!(plane.gravity_at(Vec3::new(0.0, 1.01, 0.0)), Vec3::ZERO);
        assert_ne!(plane.gravity_at(Vec3::new(0.0, 1.0, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn test_plane_is_binary_within_range() {
        let plane = GravityPlane::horizontal(Vec3::ZERO, 9.81, 4.0);
        let near = plane.gravity_at(Vec3::new(0.0, 0.5, 0.0));
        let far = plane.gravity_at(Vec3::new(0.0, 3.9, 0.0));
        assert_eq!(near, far);
        let below = plane.gravity_at(Vec3::new(0.0, -20.0, 0.0));
        assert_eq!(below, near);
    }

    #[test]
    fn test_plane_follows_rotation() {
        let plane = GravityPlane::new(
            Vec3::ZERO,
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            9.81,
            1.0,
        );
        let g = plane.gravity_at(Vec3::ZERO);
        assert!((g - Vec3::new(9.81, 0.0, 0.0)).length() < 1e-4, "g={g:?}");
    }

    #[test]
    fn test_plane_negative_range_clamped() {
        let mut plane = GravityPlane::horizontal(Vec3::ZERO, 9.81, -3.0);
        assert_eq!(plane.range(), 0.0);
        plane.set_range(-1.0);
        assert_eq!(plane.range(), 0.0);
    }

    // -- Sphere --

    #[test]
    fn test_sphere_zero_outside_falloff_band() {
        let sphere = reference_sphere();
        assert_eq!(sphere.gravity_at(Vec3::new(20.0, 0.0, 0.0)), Vec3::ZERO);
        assert_eq!(sphere.gravity_at(Vec3::new(0.0, 15.5, 0.0)), Vec3::ZERO);
        assert_eq!(sphere.gravity_at(Vec3::new(0.0, 0.0, 0.5)), Vec3::ZERO);
        assert_eq!(sphere.gravity_at(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_sphere_full_strength_between_inner_and_outer() {
        let sphere = reference_sphere();
        let position = Vec3::new(7.5, 0.0, 0.0);
        let g = sphere.gravity_at(position);
        // Scalar factor is strength / distance, applied to the 7.5 m offset.
        let factor = 10.0 / 7.5;
        assert!((g - factor * (Vec3::ZERO - position)).length() < 1e-5);
        assert!((g.length() - 10.0).abs() < 1e-4);
        assert!(g.x < 0.0, "pulls toward the center");
    }

    #[test]
    fn test_sphere_outer_falloff_is_linear() {
        let sphere = reference_sphere();
        let g = sphere.gravity_at(Vec3::new(0.0, 12.5, 0.0));
        assert!((g.length() - 5.0).abs() < 1e-4, "halfway through falloff: {g:?}");
        assert!(g.y < 0.0);
    }

    #[test]
    fn test_sphere_inner_core_pulls_toward_surface_weaker() {
        let sphere = reference_sphere();
        let g = sphere.gravity_at(Vec3::new(3.0, 0.0, 0.0));
        // 1 - (5 - 3) / 4 = 0.5
        assert!((g.length() - 5.0).abs() < 1e-4, "g={g:?}");
    }

    #[test]
    fn test_sphere_validation_orders_radii() {
        let mut sphere = GravitySphere::new(Vec3::ZERO, 9.81, 3.0, 2.0, 1.0, 0.0);
        assert_eq!(sphere.radii(), (3.0, 3.0, 3.0, 3.0));

        sphere.set_inner_falloff_radius(-2.0);
        let (inner_falloff, inner, outer, outer_falloff) = sphere.radii();
        assert_eq!(inner_falloff, 0.0);
        assert!(inner_falloff <= inner && inner <= outer && outer <= outer_falloff);
    }

    #[test]
    fn test_sphere_factors_recomputed_after_edit() {
        let mut sphere = reference_sphere();
        assert_eq!(sphere.falloff_factors(), (0.25, 0.2));
        sphere.set_outer_falloff_radius(20.0);
        assert_eq!(sphere.falloff_factors().1, 0.1);
        sphere.set_inner_radius(9.0);
        assert_eq!(sphere.falloff_factors().0, 0.125);
    }

    #[test]
    fn test_sphere_zero_span_is_instant_cutoff() {
        let sphere = GravitySphere::new(Vec3::ZERO, 10.0, 0.0, 0.0, 10.0, 10.0);
        let (inner, outer) = sphere.falloff_factors();
        assert!(inner.is_finite() && outer.is_finite());

        let at_edge = sphere.gravity_at(Vec3::new(10.0, 0.0, 0.0));
        assert!((at_edge.length() - 10.0).abs() < 1e-4);
        assert_eq!(sphere.gravity_at(Vec3::new(10.001, 0.0, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn test_sphere_factors_finite_for_valid_configs() {
        for (a, b, c, d) in [(0.0, 1.0, 2.0, 3.0), (0.5, 0.5, 8.0, 9.0), (1.0, 4.0, 4.0, 4.0)] {
            let sphere = GravitySphere::new(Vec3::ZERO, 9.81, a, b, c, d);
            let (inner, outer) = sphere.falloff_factors();
            assert!(inner.is_finite(), "inner factor for {:?}", (a, b, c, d));
            assert!(outer.is_finite(), "outer factor for {:?}", (a, b, c, d));
        }
    }

    // -- Box --

    #[test]
    fn test_box_inside_single_axis_pull() {
        let gravity_box = GravityBox::new(
            Vec3::ZERO,
            Quat::IDENTITY,
            9.81,
            Vec3::splat(5.0),
            falloff(1.0, 5.0, 0.0, 0.0),
        );
        // Margins: x = 1, y = 3, z = 4
        let g = gravity_box.gravity_at(Vec3::new(4.0, 2.0, -1.0));
        let non_zero = [g.x, g.y, g.z].iter().filter(|c| **c != 0.0).count();
        assert_eq!(non_zero, 1);
        assert!((g.x + 9.81).abs() < 1e-5, "pulls toward +X face: {g:?}");

        let g = gravity_box.gravity_at(Vec3::new(0.5, -0.5, -4.5));
        assert_eq!(g.x, 0.0);
        assert_eq!(g.y, 0.0);
        assert!((g.z - 9.81).abs() < 1e-5, "pulls toward -Z face: {g:?}");
    }

    #[test]
    fn test_box_inside_attenuates_with_depth() {
        let gravity_box = GravityBox::new(
            Vec3::ZERO,
            Quat::IDENTITY,
            10.0,
            Vec3::splat(5.0),
            falloff(1.0, 3.0, 0.0, 0.0),
        );
        // Margin 2 to the +Y face: halfway between inner and inner falloff.
        let g = gravity_box.gravity_at(Vec3::new(0.0, 3.0, 0.5));
        assert!((g.y + 5.0).abs() < 1e-4, "g={g:?}");
        // Deeper than the falloff distance: no pull.
        assert_eq!(gravity_box.gravity_at(Vec3::new(0.0, 1.0, 0.5)), Vec3::ZERO);
    }

    #[test]
    fn test_box_above_one_face() {
        let gravity_box = GravityBox::new(
            Vec3::ZERO,
            Quat::IDENTITY,
            9.81,
            Vec3::splat(2.0),
            falloff(0.0, 0.0, 1.0, 3.0),
        );
        let g = gravity_box.gravity_at(Vec3::new(0.5, 2.5, -1.0));
        assert!((g - Vec3::new(0.0, -9.81, 0.0)).length() < 1e-4, "g={g:?}");

        // 2 m above the face: halfway through the outer falloff.
        let g = gravity_box.gravity_at(Vec3::new(0.0, 4.0, 0.0));
        assert!((g.length() - 9.81 * 0.5).abs() < 1e-4, "g={g:?}");

        assert_eq!(gravity_box.gravity_at(Vec3::new(0.0, 5.5, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn test_box_edge_uses_euclidean_distance() {
        let gravity_box = GravityBox::new(
            Vec3::ZERO,
            Quat::IDENTITY,
            9.81,
            Vec3::splat(2.0),
            falloff(0.0, 0.0, 1.0, 3.0),
        );
        // Off the +X/+Y edge by (0.5, 0.5): distance ~0.707, full strength.
        let g = gravity_box.gravity_at(Vec3::new(2.5, 2.5, 0.0));
        assert!((g.length() - 9.81).abs() < 1e-4);
        assert!((g.normalize() - Vec3::new(-1.0, -1.0, 0.0).normalize()).length() < 1e-5);

        // Corner offset (2, 2, 2): distance ~3.46 beyond outer falloff.
        assert_eq!(gravity_box.gravity_at(Vec3::splat(4.0)), Vec3::ZERO);
    }

    #[test]
    fn test_box_respects_rotation() {
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let gravity_box = GravityBox::new(
            Vec3::new(10.0, 0.0, 0.0),
            rotation,
            9.81,
            Vec3::new(1.0, 3.0, 1.0),
            falloff(0.0, 0.0, 2.0, 2.0),
        );
        // The long local Y axis now lies along world X.
        let g = gravity_box.gravity_at(Vec3::new(10.0, 1.5, 0.0));
        assert!((g - Vec3::new(0.0, -9.81, 0.0)).length() < 1e-3, "g={g:?}");
    }

    #[test]
    fn test_box_validation_clamps_distances() {
        let gravity_box = GravityBox::new(
            Vec3::ZERO,
            Quat::IDENTITY,
            9.81,
            Vec3::new(4.0, -1.0, 3.0),
            falloff(5.0, 1.0, 3.0, 1.0),
        );
        assert_eq!(gravity_box.boundary(), Vec3::new(4.0, 0.0, 3.0));
        let f = gravity_box.falloff();
        assert_eq!(f.inner_distance, 0.0);
        assert_eq!(f.inner_falloff_distance, 0.0);
        assert_eq!(f.outer_distance, 3.0);
        assert_eq!(f.outer_falloff_distance, 3.0);
        let (inner, outer) = gravity_box.falloff_factors();
        assert!(inner.is_finite() && outer.is_finite());
    }

    // -- Enum --

    #[test]
    fn test_from_def_builds_matching_variant() {
        let def = GravitySourceDef::Sphere {
            center: [0.0, 1.0, 0.0],
            strength: 10.0,
            inner_falloff_radius: 1.0,
            inner_radius: 5.0,
            outer_radius: 10.0,
            outer_falloff_radius: 15.0,
        };
        let source = GravitySource::from_def(&def);
        assert_eq!(source.kind(), "sphere");
        let g = source.gravity_at(Vec3::new(0.0, 8.5, 0.0));
        assert!((g.length() - 10.0).abs() < 1e-4);

        let plane = GravitySource::from_def(&GravitySourceDef::Plane {
            origin: [0.0, 0.0, 0.0],
            rotation: [180.0, 0.0, 0.0],
            strength: 9.81,
            range: 1.0,
        });
        let g = plane.gravity_at(Vec3::ZERO);
        assert!(g.y > 9.0, "upside-down plane pulls up: {g:?}");
    }
}
