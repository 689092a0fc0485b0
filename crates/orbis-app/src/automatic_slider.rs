//! A value that slides between 0 and 1 over a fixed duration.
//!
//! Anything interpolated over time (a moving platform, a door, a light) can be
//! driven by the slider's output. It starts disabled; enabling it runs it to
//! one end, where it either stops or turns around.

use tracing::debug;

/// Shortest allowed duration in seconds.
pub const MIN_DURATION: f32 = 0.01;

type ValueCallback = Box<dyn FnMut(f32) + Send + Sync>;

/// Fixed-step slider from 0 to 1 with optional auto-reverse and smoothstep.
pub struct AutomaticSlider {
    duration: f32,
    value: f32,
    reversed: bool,
    auto_reverse: bool,
    smoothstep: bool,
    enabled: bool,
    on_value_changed: Option<ValueCallback>,
}

impl std::fmt::Debug for AutomaticSlider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomaticSlider")
            .field("duration", &self.duration)
            .field("value", &self.value)
            .field("reversed", &self.reversed)
            .field("auto_reverse", &self.auto_reverse)
            .field("smoothstep", &self.smoothstep)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl AutomaticSlider {
    /// Creates a disabled slider at 0 that takes `duration` seconds per pass.
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(MIN_DURATION),
            value: 0.0,
            reversed: false,
            auto_reverse: false,
            smoothstep: false,
            enabled: false,
            on_value_changed: None,
        }
    }

    pub fn with_auto_reverse(mut self, auto_reverse: bool) -> Self {
        self.auto_reverse = auto_reverse;
        self
    }

    pub fn with_smoothstep(mut self, smoothstep: bool) -> Self {
        self.smoothstep = smoothstep;
        self
    }

    /// Sets the callback that receives the output after every step.
    pub fn on_value_changed(mut self, callback: impl FnMut(f32) + Send + Sync + 'static) -> Self {
        self.on_value_changed = Some(Box::new(callback));
        self
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.max(MIN_DURATION);
    }

    /// Raw linear position in `[0, 1]`.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Output as passed to the callback.
    pub fn output(&self) -> f32 {
        if self.smoothstep {
            3.0 * self.value * self.value - 2.0 * self.value * self.value * self.value
        } else {
            self.value
        }
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub fn auto_reverse(&self) -> bool {
        self.auto_reverse
    }

    pub fn set_auto_reverse(&mut self, auto_reverse: bool) {
        self.auto_reverse = auto_reverse;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Advances one fixed step. Does nothing while disabled.
    pub fn fixed_step(&mut self, dt: f32) {
        if !self.enabled {
            return;
        }
        let delta = dt / self.duration;
        if self.reversed {
            self.value -= delta;
            if self.value <= 0.0 {
                if self.auto_reverse {
                    self.value = (-self.value).min(1.0);
                    self.reversed = false;
                } else {
                    self.value = 0.0;
                    self.enabled = false;
                    debug!("Slider reached start");
                }
            }
        } else {
            self.value += delta;
            if self.value >= 1.0 {
                if self.auto_reverse {
                    self.value = (2.0 - self.value).max(0.0);
                    self.reversed = true;
                } else {
                    self.value = 1.0;
                    self.enabled = false;
                    debug!("Slider reached end");
                }
            }
        }

        let output = self.output();
        if let Some(callback) = self.on_value_changed.as_mut() {
            callback(output);
        }
    }
}
