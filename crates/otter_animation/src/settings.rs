//! Animator Settings
//!
//! Per-animator playback configuration.
//!
//! ```rust,ignore
//! use otter::animation::{Animator, AnimatorSettings};
//!
//! // Half-speed playback, never step more than 100 ms in one frame
//! let settings = AnimatorSettings::default()
//!     .with_time_scale(0.5)
//!     .with_max_delta_time(0.1);
//!
//! let animator = Animator::new(skeleton).with_settings(settings);
//! ```

/// Playback configuration applied to every delta time an
/// [`Animator`](crate::Animator) receives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorSettings {
    /// Multiplier applied to every delta time. Values below 0 count as 0.
    pub time_scale: f32,
    /// Upper bound for a single (scaled) step, absorbing host hitches such
    /// as a window drag or a breakpoint. `None` disables the clamp.
    pub max_delta_time: Option<f32>,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_time: None,
        }
    }
}

impl AnimatorSettings {
    #[must_use]
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    #[must_use]
    pub fn with_max_delta_time(mut self, max_delta_time: f32) -> Self {
        self.max_delta_time = Some(max_delta_time);
        self
    }

    /// The step actually fed to the blend tree for a host delta `dt`.
    #[must_use]
    pub fn effective_delta(&self, dt: f32) -> f32 {
        let scaled = dt * self.time_scale.max(0.0);
        if !scaled.is_finite() || scaled <= 0.0 {
            return 0.0;
        }
        match self.max_delta_time {
            Some(max) if max >= 0.0 => scaled.min(max),
            _ => scaled,
        }
    }
}
