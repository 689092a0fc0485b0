//! Application framework for Orbis: the fixed-timestep loop and scene helpers
//! driven from it.

pub mod automatic_slider;
pub mod detection_zone;
pub mod game_loop;

pub use automatic_slider::AutomaticSlider;
pub use detection_zone::DetectionZone;
pub use game_loop::{FIXED_DT, GameLoop, MAX_FRAME_TIME};
