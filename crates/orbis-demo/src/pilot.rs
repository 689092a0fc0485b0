//! Scripted input standing in for a player.
//!
//! Walks off the start pad, jumps (once from the ground and once in the air),
//! strafes while orbiting the camera, tries to climb, and finally idles so the
//! camera's automatic alignment can take over.

use bevy_ecs::prelude::*;
use glam::{Vec2, Vec3};
use orbis_physics::Character;
use orbis_player::{CameraInput, FrameTime};
use tracing::debug;

/// Simulated time of the current fixed step.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct SimClock {
    pub elapsed: f32,
}

/// Movement held over a time window.
struct Segment {
    start: f32,
    end: f32,
    axes: Vec3,
    climb: bool,
}

const MOVES: &[Segment] = &[
    Segment {
        start: 1.0,
        end: 4.0,
        axes: Vec3::Z,
        climb: false,
    },
    Segment {
        start: 4.0,
        end: 5.5,
        axes: Vec3::X,
        climb: false,
    },
    Segment {
        start: 5.5,
        end: 7.0,
        axes: Vec3::new(-0.5, 0.0, 1.0),
        climb: true,
    },
];

/// Jump requests by time. The second follows closely enough to be an air jump.
const JUMPS: &[f32] = &[2.0, 2.3, 6.0];

/// Camera orbit input windows, `(start, end, input)`.
const ORBITS: &[(f32, f32, Vec2)] = &[
    (4.0, 5.0, Vec2::new(0.0, 1.0)),
    (5.0, 5.5, Vec2::new(-0.5, 0.0)),
];

fn segment_at(t: f32) -> Option<&'static Segment> {
    MOVES.iter().find(|s| s.start <= t && t < s.end)
}

/// Orbit input at frame time `t`.
pub fn orbit_at(t: f32) -> Vec2 {
    ORBITS
        .iter()
        .find(|(start, end, _)| *start <= t && t < *end)
        .map_or(Vec2::ZERO, |(_, _, input)| *input)
}

/// Progress through the jump schedule.
#[derive(Resource, Debug, Default)]
pub struct Pilot {
    next_jump: usize,
}

impl Pilot {
    /// Number of jump requests issued so far.
    pub fn jumps_requested(&self) -> usize {
        self.next_jump
    }
}

/// Feeds scripted movement into every character. Runs first in the fixed
/// schedule.
pub fn pilot_system(
    clock: Res<SimClock>,
    mut pilot: ResMut<Pilot>,
    mut characters: Query<&mut Character>,
) {
    let t = clock.elapsed;
    let segment = segment_at(t);
    let jump = JUMPS.get(pilot.next_jump).is_some_and(|&at| at <= t);
    if jump {
        debug!("Pilot jumps at {:.2}s", t);
        pilot.next_jump += 1;
    }

    for mut character in characters.iter_mut() {
        let mut input = character.controller.input();
        input.axes = segment.map_or(Vec3::ZERO, |s| s.axes);
        character.controller.set_input(input);
        character
            .controller
            .set_climb_intent(segment.is_some_and(|s| s.climb));
        if jump {
            character.controller.request_jump();
        }
    }
}

/// Sets the camera's orbit input for this frame.
pub fn camera_script_system(time: Res<FrameTime>, mut input: ResMut<CameraInput>) {
    input.orbit = orbit_at(time.elapsed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_do_not_overlap() {
        for pair in MOVES.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        assert!(segment_at(0.5).is_none());
        assert_eq!(segment_at(1.5).map(|s| s.axes), Some(Vec3::Z));
        assert!(segment_at(6.0).is_some_and(|s| s.climb));
    }

    #[test]
    fn test_orbit_windows() {
        assert_eq!(orbit_at(0.0), Vec2::ZERO);
        assert_eq!(orbit_at(4.5), Vec2::new(0.0, 1.0));
        assert_eq!(orbit_at(9.0), Vec2::ZERO);
    }

    #[test]
    fn test_jumps_fire_once_each() {
        let mut world = World::new();
        world.insert_resource(SimClock { elapsed: 0.0 });
        world.insert_resource(Pilot::default());
        let mut schedule = Schedule::default();
        schedule.add_systems(pilot_system);

        for step in 0..600 {
            world.resource_mut::<SimClock>().elapsed = step as f32 / 60.0;
            schedule.run(&mut world);
        }
        assert_eq!(world.resource::<Pilot>().jumps_requested(), JUMPS.len());
    }
}
