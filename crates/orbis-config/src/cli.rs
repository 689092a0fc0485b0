//! Command-line argument parsing for Orbis.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orbis command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "orbis", about = "Multi-source gravity character sandbox")]
pub struct CliArgs {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Length of the headless run in seconds.
    #[arg(long)]
    pub seconds: Option<f32>,

    /// Fixed physics tick rate in Hz.
    #[arg(long)]
    pub hz: Option<u32>,

    /// Jump apex height in meters.
    #[arg(long)]
    pub jump_height: Option<f32>,

    /// Number of jumps allowed while airborne.
    #[arg(long)]
    pub air_jumps: Option<u32>,
}

impl Config {
    /// Apply CLI overrides to a loaded config, then re-clamp.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(seconds) = args.seconds {
            self.simulation.demo_seconds = seconds;
        }
        if let Some(hz) = args.hz {
            self.simulation.fixed_hz = hz;
        }
        if let Some(height) = args.jump_height {
            self.movement.jump_height = height;
        }
        if let Some(jumps) = args.air_jumps {
            self.movement.max_air_jumps = jumps;
        }
        self.sanitize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            log_level: Some("debug".to_string()),
            air_jumps: Some(2),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.debug.log_level, "debug");
        assert_eq!(config.movement.max_air_jumps, 2);
        // Non-overridden fields retain defaults
        assert_eq!(config.movement.jump_height, 2.0);
        assert_eq!(config.simulation.fixed_hz, 60);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_override_is_clamped() {
        let mut config = Config::default();
        let args = CliArgs {
            jump_height: Some(50.0),
            air_jumps: Some(12),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.movement.jump_height, 10.0);
        assert_eq!(config.movement.max_air_jumps, 5);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["orbis", "--seconds", "3.5", "--hz", "120"]);
        assert_eq!(args.seconds, Some(3.5));
        assert_eq!(args.hz, Some(120));
        assert!(args.config.is_none());
    }
}
