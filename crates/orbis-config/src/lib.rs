//! Configuration system for Orbis.
//!
//! Tunables for the character controller, orbit camera, gravity scene and
//! simulation loop. Settings persist to disk as RON files, accept CLI
//! overrides via clap, and are silently clamped back into their valid ranges
//! by each section's `sanitize`.

mod cli;
mod config;
mod error;

use std::path::PathBuf;

pub use cli::CliArgs;
pub use config::{
    BallConfig, CameraConfig, Config, DebugConfig, GravityConfig, GravitySourceDef,
    MovementConfig, SimulationConfig,
};
pub use error::ConfigError;

/// Default per-user config directory (`<config_dir>/orbis`), falling back to
/// the working directory when the platform has no config location.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("orbis"))
        .unwrap_or_else(|| PathBuf::from("."))
}
