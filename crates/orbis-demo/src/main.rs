//! Orbis headless demo.
//!
//! Loads the configuration, builds a scene around the configured gravity
//! sources, and runs a scripted character through it with the fixed-timestep
//! loop: physics and the controller at the fixed rate, camera and ball
//! cosmetics once per frame. Progress goes to the log.
//!
//! Run with: `cargo run -p orbis-demo -- --seconds 10`

mod elevator;
mod pilot;
mod report;
mod scene;

use bevy_ecs::prelude::*;
use clap::Parser;
use orbis_app::GameLoop;
use orbis_config::{CliArgs, Config, ConfigError};
use orbis_physics::physics_bridge::{
    character_contact_system, character_control_system, gravity_body_system,
};
use orbis_physics::physics_step_system;
use orbis_player::{FrameTime, orbit_camera_system, rolling_ball_system};
use tracing::{debug, info, warn};

use crate::elevator::elevator_system;
use crate::pilot::{SimClock, camera_script_system, pilot_system};

/// Frame times cycled through to mimic an uneven render rate.
const FRAME_TIMES: [f64; 4] = [0.016, 0.021, 0.017, 0.026];

/// Systems that run once per fixed step, in order.
fn fixed_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            pilot_system,
            character_control_system,
            gravity_body_system,
            elevator_system,
            physics_step_system,
            character_contact_system,
        )
            .chain(),
    );
    schedule
}

/// Systems that run once per rendered frame, in order.
fn frame_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((camera_script_system, orbit_camera_system, rolling_ball_system).chain());
    schedule
}

/// Runs the scene for `seconds` of simulated time.
fn run(world: &mut World, hz: u32, seconds: f32) {
    let mut game_loop = GameLoop::with_rate(hz);
    let mut fixed = fixed_schedule();
    let mut frame = frame_schedule();
    let mut elapsed_frames = 0.0;
    let mut last_report = 0u32;

    for frame_time in FRAME_TIMES.iter().copied().cycle() {
        if game_loop.total_sim_time() >= f64::from(seconds) {
            break;
        }

        let mut rendered = None;
        game_loop.advance(
            frame_time,
            |_, sim_time| {
                world.resource_mut::<SimClock>().elapsed = sim_time as f32;
                fixed.run(world);
            },
            |dt, _| rendered = Some(dt),
        );

        if let Some(dt) = rendered {
            elapsed_frames += dt;
            world.insert_resource(FrameTime {
                delta: dt as f32,
                elapsed: elapsed_frames as f32,
            });
            frame.run(world);
        }

        let second = game_loop.total_sim_time() as u32;
        if second > last_report {
            last_report = second;
            if let Some(telemetry) = report::capture(world) {
                debug!("t={}s {}", second, telemetry);
            }
        }
    }

    info!(
        "Ran {} fixed steps over {} frames ({:.2}s simulated)",
        game_loop.update_count(),
        game_loop.frame_count(),
        game_loop.total_sim_time()
    );
}

fn main() -> Result<(), ConfigError> {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .unwrap_or_else(orbis_config::default_config_dir);
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(&args);

    orbis_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );

    info!("Orbis demo");
    info!("Config directory: {}", config_dir.display());
    info!(
        "Simulation: {} Hz for {:.1}s, {} gravity sources",
        config.simulation.fixed_hz,
        config.simulation.demo_seconds,
        config.gravity.sources.len()
    );

    let mut world = scene::build_world(&config);
    run(
        &mut world,
        config.simulation.fixed_hz,
        config.simulation.demo_seconds,
    );

    match report::capture(&mut world) {
        Some(telemetry) => info!("Final state: {}", telemetry),
        None => warn!("Scene ended without a character"),
    }
    scene::shutdown_gravity(&mut world);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_physics::{Character, MotionMode};

    #[test]
    fn test_short_run_lands_character() {
        let config = Config::default();
        let mut world = scene::build_world(&config);
        run(&mut world, 60, 1.0);

        let telemetry = report::capture(&mut world).expect("character present");
        assert_eq!(telemetry.mode, Some(MotionMode::Grounded));
        assert!(
            (telemetry.position.length() - 5.5).abs() < 0.1,
            "resting on the planet: {:?}",
            telemetry.position
        );
    }

    #[test]
    fn test_camera_feeds_input_space() {
        let mut world = scene::build_world(&Config::default());
        run(&mut world, 60, 0.5);
        let character = world
            .query::<&Character>()
            .iter(&world)
            .next()
            .expect("character present");
        assert!(character.controller.input().input_space.is_some());
    }
}
