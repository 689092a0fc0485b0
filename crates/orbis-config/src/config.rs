//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Character controller tuning.
    pub movement: MovementConfig,
    /// Rolling-ball cosmetic settings.
    pub ball: BallConfig,
    /// Orbit camera settings.
    pub camera: CameraConfig,
    /// Gravity sources active in the scene.
    pub gravity: GravityConfig,
    /// Simulation loop settings.
    pub simulation: SimulationConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Character controller tuning. Angles are in degrees, layer masks are bit sets
/// indexed by collider layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MovementConfig {
    /// Top walking speed in m/s.
    pub max_speed: f32,
    /// Top climbing speed in m/s.
    pub max_climb_speed: f32,
    /// Top swimming speed in m/s.
    pub max_swim_speed: f32,
    /// Ground acceleration in m/s².
    pub max_acceleration: f32,
    /// Air acceleration in m/s².
    pub max_air_acceleration: f32,
    /// Climbing acceleration in m/s². Also scales the pull into climbable walls.
    pub max_climb_acceleration: f32,
    /// Swimming acceleration in m/s².
    pub max_swim_acceleration: f32,
    /// Jump apex height in meters.
    pub jump_height: f32,
    /// Number of jumps allowed while airborne.
    pub max_air_jumps: u32,
    /// Steepest walkable slope.
    pub max_ground_angle: f32,
    /// Steepest walkable slope on stairs layers.
    pub max_stairs_angle: f32,
    /// Steepest climbable surface (90 = vertical wall, 180 = ceiling).
    pub max_climb_angle: f32,
    /// Speed above which the character is never snapped back to the ground.
    pub max_snap_speed: f32,
    /// Length of the downward snap probe.
    pub probe_distance: f32,
    /// Layers the snap probe can hit.
    pub probe_mask: u32,
    /// Layers that use `max_stairs_angle` instead of `max_ground_angle`.
    pub stairs_mask: u32,
    /// Layers that can be climbed.
    pub climb_mask: u32,
    /// Layers that count as water volumes.
    pub water_mask: u32,
    /// Height above the body origin where the water probe starts.
    pub submergence_offset: f32,
    /// Depth over which submergence goes from 0 to 1.
    pub submergence_range: f32,
    /// Buoyancy multiplier (1 = neutral when fully submerged).
    pub buoyancy: f32,
    /// Water drag per second at full submergence.
    pub water_drag: f32,
    /// Submergence at which the character starts swimming.
    pub swim_threshold: f32,
}

/// Rolling-ball visual settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BallConfig {
    /// Visual ball radius in meters.
    pub radius: f32,
    /// Degrees per meter travelled at which the ball's up axis realigns.
    pub align_speed: f32,
    /// Rotation multiplier while airborne.
    pub air_rotation: f32,
    /// Rotation multiplier while swimming.
    pub swim_rotation: f32,
}

/// Orbit camera settings. Angles in degrees, speeds in degrees per second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Distance from the focus point.
    pub distance: f32,
    /// Radius the focus point may lag behind the target.
    pub focus_radius: f32,
    /// Fraction of the focus offset removed per second (0 = none, 1 = all).
    pub focus_centering: f32,
    /// Lowest orbit pitch.
    pub min_vertical_angle: f32,
    /// Highest orbit pitch.
    pub max_vertical_angle: f32,
    /// Seconds without manual input before automatic alignment starts.
    pub align_delay: f32,
    /// Orbit rotation speed.
    pub rotation_speed: f32,
    /// Angle range over which automatic alignment slows down.
    pub align_smooth_range: f32,
    /// Maximum speed at which the camera follows gravity changes.
    pub up_alignment_speed: f32,
    /// Layers that obstruct the camera.
    pub obstruction_mask: u32,
    /// Near clip plane distance.
    pub near_clip: f32,
    /// Vertical field of view.
    pub field_of_view: f32,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
}

/// Gravity sources placed in the scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GravityConfig {
    /// Source definitions, registered in order.
    pub sources: Vec<GravitySourceDef>,
}

/// Serializable definition of one gravity source. Rotations are Euler angles
/// in degrees as `(pitch, yaw, roll)`, applied yaw first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GravitySourceDef {
    /// Infinite plane pulling along its down direction.
    Plane {
        origin: [f32; 3],
        rotation: [f32; 3],
        strength: f32,
        range: f32,
    },
    /// Spherical source with inner and outer falloff shells.
    Sphere {
        center: [f32; 3],
        strength: f32,
        inner_falloff_radius: f32,
        inner_radius: f32,
        outer_radius: f32,
        outer_falloff_radius: f32,
    },
    /// Oriented box pulling toward its faces.
    Box {
        center: [f32; 3],
        rotation: [f32; 3],
        #[serde(default = "default_strength")]
        strength: f32,
        boundary: [f32; 3],
        inner_distance: f32,
        inner_falloff_distance: f32,
        outer_distance: f32,
        outer_falloff_distance: f32,
    },
}

fn default_strength() -> f32 {
    9.81
}

/// Simulation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed physics tick rate in Hz.
    pub fixed_hz: u32,
    /// Length of a headless demo run in seconds.
    pub demo_seconds: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log every classified contact at trace level.
    pub trace_contacts: bool,
}

// --- Default implementations ---

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_speed: 10.0,
            max_climb_speed: 2.0,
            max_swim_speed: 5.0,
            max_acceleration: 10.0,
            max_air_acceleration: 1.0,
            max_climb_acceleration: 20.0,
            max_swim_acceleration: 5.0,
            jump_height: 2.0,
            max_air_jumps: 0,
            max_ground_angle: 25.0,
            max_stairs_angle: 50.0,
            max_climb_angle: 140.0,
            max_snap_speed: 100.0,
            probe_distance: 1.0,
            probe_mask: u32::MAX,
            stairs_mask: 0,
            climb_mask: u32::MAX,
            water_mask: 0,
            submergence_offset: 0.5,
            submergence_range: 1.0,
            buoyancy: 1.0,
            water_drag: 1.0,
            swim_threshold: 0.5,
        }
    }
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            align_speed: 180.0,
            air_rotation: 0.5,
            swim_rotation: 2.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            focus_radius: 1.0,
            focus_centering: 0.5,
            min_vertical_angle: -30.0,
            max_vertical_angle: 60.0,
            align_delay: 5.0,
            rotation_speed: 90.0,
            align_smooth_range: 45.0,
            up_alignment_speed: 360.0,
            obstruction_mask: u32::MAX,
            near_clip: 0.3,
            field_of_view: 60.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            sources: vec![GravitySourceDef::Sphere {
                center: [0.0, 0.0, 0.0],
                strength: 9.81,
                inner_falloff_radius: 1.0,
                inner_radius: 5.0,
                outer_radius: 10.0,
                outer_falloff_radius: 15.0,
            }],
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_hz: 60,
            demo_seconds: 10.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            trace_contacts: false,
        }
    }
}

// --- Range clamping ---

impl MovementConfig {
    /// Clamps every field into its valid range.
    pub fn sanitize(&mut self) {
        self.max_speed = self.max_speed.clamp(0.0, 100.0);
        self.max_climb_speed = self.max_climb_speed.clamp(0.0, 100.0);
        self.max_swim_speed = self.max_swim_speed.clamp(0.0, 100.0);
        self.max_acceleration = self.max_acceleration.clamp(0.0, 100.0);
        self.max_air_acceleration = self.max_air_acceleration.clamp(0.0, 100.0);
        self.max_climb_acceleration = self.max_climb_acceleration.clamp(0.0, 100.0);
        self.max_swim_acceleration = self.max_swim_acceleration.clamp(0.0, 100.0);
        self.jump_height = self.jump_height.clamp(0.0, 10.0);
        self.max_air_jumps = self.max_air_jumps.min(5);
        self.max_ground_angle = self.max_ground_angle.clamp(0.0, 90.0);
        self.max_stairs_angle = self.max_stairs_angle.clamp(0.0, 90.0);
        self.max_climb_angle = self.max_climb_angle.clamp(90.0, 180.0);
        self.max_snap_speed = self.max_snap_speed.clamp(0.0, 100.0);
        self.probe_distance = self.probe_distance.max(0.0);
        self.submergence_range = self.submergence_range.max(0.1);
        self.buoyancy = self.buoyancy.max(0.0);
        self.water_drag = self.water_drag.clamp(0.0, 10.0);
        self.swim_threshold = self.swim_threshold.clamp(0.01, 1.0);
    }
}

impl BallConfig {
    /// Clamps every field into its valid range.
    pub fn sanitize(&mut self) {
        self.radius = self.radius.max(0.1);
        self.align_speed = self.align_speed.max(0.0);
        self.air_rotation = self.air_rotation.max(0.0);
        self.swim_rotation = self.swim_rotation.max(0.0);
    }
}

impl CameraConfig {
    /// Clamps every field into its valid range. The vertical range never inverts.
    pub fn sanitize(&mut self) {
        self.distance = self.distance.clamp(1.0, 20.0);
        self.focus_radius = self.focus_radius.max(0.0);
        self.focus_centering = self.focus_centering.clamp(0.0, 1.0);
        self.min_vertical_angle = self.min_vertical_angle.clamp(-89.0, 89.0);
        self.max_vertical_angle = self.max_vertical_angle.clamp(-89.0, 89.0);
        if self.max_vertical_angle < self.min_vertical_angle {
            self.max_vertical_angle = self.min_vertical_angle;
        }
        self.align_delay = self.align_delay.max(0.0);
        self.rotation_speed = self.rotation_speed.clamp(1.0, 360.0);
        self.align_smooth_range = self.align_smooth_range.clamp(0.0, 90.0);
        self.up_alignment_speed = self.up_alignment_speed.max(0.0);
        self.near_clip = self.near_clip.max(0.01);
        self.field_of_view = self.field_of_view.clamp(1.0, 179.0);
        self.aspect = self.aspect.max(0.01);
    }
}

impl Config {
    /// Clamps all sections into their valid ranges.
    pub fn sanitize(&mut self) {
        self.movement.sanitize();
        self.ball.sanitize();
        self.camera.sanitize();
        self.simulation.fixed_hz = self.simulation.fixed_hz.max(1);
        self.simulation.demo_seconds = self.simulation.demo_seconds.max(0.0);
    }

    /// Fixed physics timestep in seconds.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.simulation.fixed_hz.max(1) as f32
    }
}

// --- Load / Save / Reload ---

/// Reads and sanitizes one config file.
fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: Config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.sanitize();
    Ok(config)
}

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let new_config = read_config(&config_path)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("jump_height: 2.0"));
        assert!(ron_str.contains("Sphere"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(movement: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.gravity, GravityConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let ron_str = "(movement: (jump_height: 3.5, max_air_jumps: 2))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.movement.jump_height, 3.5);
        assert_eq!(config.movement.max_air_jumps, 2);
        assert_eq!(config.movement.max_speed, 10.0);
    }

    #[test]
    fn test_gravity_sources_parse() {
        let ron_str = "(gravity: (sources: [
            Plane(origin: (0.0, 0.0, 0.0), rotation: (0.0, 0.0, 0.0), strength: 9.81, range: 2.0),
            Box(center: (0.0, 10.0, 0.0), rotation: (0.0, 45.0, 0.0), boundary: (3.0, 3.0, 3.0),
                inner_distance: 0.0, inner_falloff_distance: 1.0,
                outer_distance: 1.0, outer_falloff_distance: 4.0),
        ]))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.gravity.sources.len(), 2);
        assert!(matches!(
            config.gravity.sources[0],
            GravitySourceDef::Plane { range, .. } if range == 2.0
        ));
    }

    #[test]
    fn test_sanitize_clamps_movement_ranges() {
        let mut movement = MovementConfig {
            max_climb_angle: 45.0,
            max_ground_angle: 120.0,
            swim_threshold: 0.0,
            max_air_jumps: 9,
            submergence_range: 0.0,
            ..Default::default()
        };
        movement.sanitize();
        assert_eq!(movement.max_climb_angle, 90.0);
        assert_eq!(movement.max_ground_angle, 90.0);
        assert_eq!(movement.swim_threshold, 0.01);
        assert_eq!(movement.max_air_jumps, 5);
        assert_eq!(movement.submergence_range, 0.1);
    }

    #[test]
    fn test_sanitize_never_inverts_vertical_range() {
        let mut camera = CameraConfig {
            min_vertical_angle: 40.0,
            max_vertical_angle: 10.0,
            ..Default::default()
        };
        camera.sanitize();
        assert_eq!(camera.min_vertical_angle, 40.0);
        assert_eq!(camera.max_vertical_angle, 40.0);
    }

    #[test]
    fn test_fixed_dt_matches_tick_rate() {
        let mut config = Config::default();
        assert!((config.fixed_dt() - 1.0 / 60.0).abs() < f32::EPSILON);
        config.simulation.fixed_hz = 0;
        config.sanitize();
        assert_eq!(config.simulation.fixed_hz, 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.movement.max_air_jumps = 2;
        config.camera.distance = 8.0;
        config.debug.log_level = "debug".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.movement.jump_height = 4.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().movement.jump_height, 4.0);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(movement: (max_speed: fast))").unwrap();

        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err:?}");
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(err.to_string().contains("config.ron"), "{err}");
    }

    #[test]
    fn test_missing_file_on_reload_reports_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::default().reload(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }), "{err:?}");
        assert_eq!(err.path(), Some(dir.path().join("config.ron").as_path()));
    }
}
