//! Camera and cosmetic state for the player character.

pub mod orbit_camera;
pub mod rolling_ball;

pub use orbit_camera::{
    CameraInput, CameraPose, FrameTime, OrbitCamera, delta_angle, heading_angle,
    move_towards_angle, near_plane_half_extents, orbit_camera_system,
};
pub use rolling_ball::{BallAppearance, RollingBall, rolling_ball_system};
