//! Fixed-timestep loop.
//!
//! Physics and the character controller run at a fixed rate while cameras and
//! cosmetics run once per frame. An accumulator turns variable frame times
//! into whole fixed steps and leaves an interpolation alpha for rendering.

use std::time::Instant;
use tracing::warn;

/// Default fixed timestep: 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Frame times above this are clamped so a stall does not trigger dozens of
/// catch-up steps.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Fixed-timestep loop state.
///
/// [`tick`](Self::tick) measures wall-clock time; [`advance`](Self::advance)
/// takes the frame time explicitly for headless runs and tests.
pub struct GameLoop {
    fixed_dt: f64,
    previous_time: Instant,
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl GameLoop {
    /// Creates a 60 Hz loop starting from the current instant.
    pub fn new() -> Self {
        Self::with_fixed_dt(FIXED_DT)
    }

    /// Creates a loop stepping `hz` times per simulated second. Zero falls
    /// back to 60 Hz.
    pub fn with_rate(hz: u32) -> Self {
        if hz == 0 {
            warn!("Fixed rate of 0 Hz requested, using 60 Hz");
            return Self::new();
        }
        Self::with_fixed_dt(1.0 / f64::from(hz))
    }

    fn with_fixed_dt(fixed_dt: f64) -> Self {
        Self {
            fixed_dt,
            previous_time: Instant::now(),
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Runs one frame using the wall-clock time since the previous tick.
    pub fn tick(&mut self, update_fn: impl FnMut(f64, f64), render_fn: impl FnMut(f64, f64)) {
        let current_time = Instant::now();
        let frame_time = current_time
            .duration_since(self.previous_time)
            .as_secs_f64();
        self.previous_time = current_time;
        self.advance(frame_time, update_fn, render_fn);
    }

    /// Runs one frame of `frame_time` seconds.
    ///
    /// - `update_fn(fixed_dt, total_sim_time)` runs zero or more times.
    /// - `render_fn(frame_time, alpha)` runs exactly once with the clamped
    ///   frame time and an alpha in `[0.0, 1.0)`.
    pub fn advance(
        &mut self,
        frame_time: f64,
        mut update_fn: impl FnMut(f64, f64),
        mut render_fn: impl FnMut(f64, f64),
    ) {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.accumulator += frame_time;
        while self.accumulator >= self.fixed_dt {
            update_fn(self.fixed_dt, self.total_sim_time);
            self.total_sim_time += self.fixed_dt;
            self.accumulator -= self.fixed_dt;
            self.update_count += 1;
        }

        render_fn(frame_time, self.alpha());
        self.frame_count += 1;
    }

    /// Fraction of a fixed step left in the accumulator.
    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / self.fixed_dt
        } else {
            0.0
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Total simulated time in seconds.
    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
