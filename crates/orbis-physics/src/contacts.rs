//! Per-step contact classification for the character controller.
//!
//! The physics backend reports every touching collider and water trigger to a
//! [`ContactCollector`] after the engine step. The collector sorts the normals
//! into ground, steep and climbable buckets and measures submergence. Its
//! finished [`ContactFrame`] is the input of the next
//! [`CharacterController::fixed_step`](crate::character_controller::CharacterController::fixed_step).

use glam::Vec3;

use crate::queries::{BodyId, Layer, LayerMask, PhysicsQueries, QueryTriggers};

/// Upward normal component above which a non-ground contact still counts as
/// a wall rather than a ceiling.
const STEEP_MIN_UP_DOT: f32 = -0.01;

/// A solid collider touching the character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceContact {
    /// Unit normal pointing away from the surface, toward the character.
    pub normal: Vec3,
    pub layer: Layer,
    pub body: Option<BodyId>,
}

/// A trigger volume overlapping the character.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerContact {
    pub layer: Layer,
    pub body: Option<BodyId>,
}

/// Dot-product thresholds and layer masks used to classify contacts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactRules {
    /// `cos(max_ground_angle)`.
    pub min_ground_dot: f32,
    /// `cos(max_stairs_angle)`, used for layers in `stairs_mask`.
    pub min_stairs_dot: f32,
    /// `cos(max_climb_angle)`.
    pub min_climb_dot: f32,
    pub stairs_mask: LayerMask,
    pub climb_mask: LayerMask,
    pub water_mask: LayerMask,
    /// Height above the body origin where the submergence probe starts.
    pub submergence_offset: f32,
    /// Probe depth mapping to full submergence.
    pub submergence_range: f32,
    /// Submergence at or above which the character swims.
    pub swim_threshold: f32,
}

impl ContactRules {
    /// Ground threshold for a surface on `layer`.
    pub fn min_dot(&self, layer: Layer) -> f32 {
        if self.stairs_mask.contains(layer) {
            self.min_stairs_dot
        } else {
            self.min_ground_dot
        }
    }
}

/// Contacts gathered during one physics step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactFrame {
    pub ground_count: u32,
    pub steep_count: u32,
    pub climb_count: u32,
    /// Sum of ground normals. Not normalized.
    pub contact_normal: Vec3,
    /// Sum of steep normals. Not normalized.
    pub steep_normal: Vec3,
    /// Sum of climbable normals. Not normalized.
    pub climb_normal: Vec3,
    /// The most recent single climbable normal.
    pub last_climb_normal: Vec3,
    /// Fraction in `[0, 1]` of the character below a water surface.
    pub submergence: f32,
    /// Body the character is standing on, clinging to or floating in.
    pub connected_body: Option<BodyId>,
}

impl Default for ContactFrame {
    fn default() -> Self {
        Self {
            ground_count: 0,
            steep_count: 0,
            climb_count: 0,
            contact_normal: Vec3::ZERO,
            steep_normal: Vec3::ZERO,
            climb_normal: Vec3::ZERO,
            last_climb_normal: Vec3::ZERO,
            submergence: 0.0,
            connected_body: None,
        }
    }
}

impl ContactFrame {
    pub fn in_water(&self) -> bool {
        self.submergence > 0.0
    }
}

/// Accumulates one step's contacts against a fixed up axis.
#[derive(Clone, Debug)]
pub struct ContactCollector {
    rules: ContactRules,
    up_axis: Vec3,
    desires_climbing: bool,
    frame: ContactFrame,
}

impl ContactCollector {
    pub fn new(rules: ContactRules, up_axis: Vec3, desires_climbing: bool) -> Self {
        Self {
            rules,
            up_axis,
            desires_climbing,
            frame: ContactFrame::default(),
        }
    }

    pub fn up_axis(&self) -> Vec3 {
        self.up_axis
    }

    /// True once the measured submergence reaches the swim threshold.
    pub fn is_swimming(&self) -> bool {
        self.frame.submergence >= self.rules.swim_threshold
    }

    /// Measures how deep `position` sits inside the water volume `trigger`.
    ///
    /// Probes down from just above the body. A miss means the probe started
    /// below the surface, which counts as fully submerged. Triggers outside the
    /// water mask are ignored.
    pub fn evaluate_submergence(
        &mut self,
        world: &impl PhysicsQueries,
        position: Vec3,
        trigger: TriggerContact,
    ) {
        if !self.rules.water_mask.contains(trigger.layer) {
            return;
        }
        let origin = position + self.up_axis * self.rules.submergence_offset;
        let hit = world.cast_ray(
            origin,
            -self.up_axis,
            self.rules.submergence_range + 1.0,
            self.rules.water_mask,
            QueryTriggers::Collide,
        );
        self.frame.submergence = match hit {
            Some(hit) => (1.0 - hit.distance / self.rules.submergence_range).clamp(0.0, 1.0),
            None => 1.0,
        };
        if self.is_swimming() {
            self.frame.connected_body = trigger.body;
        }
    }

    /// Classifies one contact normal. Ignored while swimming.
    pub fn add_contact(&mut self, contact: SurfaceContact) {
        if self.is_swimming() {
            return;
        }
        let frame = &mut self.frame;
        let up_dot = self.up_axis.dot(contact.normal);

        if up_dot >= self.rules.min_dot(contact.layer) {
            frame.ground_count += 1;
            frame.contact_normal += contact.normal;
            frame.connected_body = contact.body;
            return;
        }

        if up_dot > STEEP_MIN_UP_DOT {
            frame.steep_count += 1;
            frame.steep_normal += contact.normal;
            if frame.ground_count == 0 {
                frame.connected_body = contact.body;
            }
        }
        if self.desires_climbing
            && up_dot >= self.rules.min_climb_dot
            && self.rules.climb_mask.contains(contact.layer)
        {
            frame.climb_count += 1;
            frame.climb_normal += contact.normal;
            frame.last_climb_normal = contact.normal;
            frame.connected_body = contact.body;
        }
    }

    pub fn finish(self) -> ContactFrame {
        self.frame
    }
}
