//! Frame clock.
//!
//! Turns wall-clock time into [`FrameTick`]s for the fields. Besides plain
//! timing it supports pausing (ticks come out with a zero delta, which the
//! fields ignore), a fixed delta for deterministic stepping, a time scale, and
//! a cap on the delta so a stalled frame does not snap the morph forward.
//!
//! ```ignore
//! let mut clock = Clock::new();
//! // once per redraw:
//! let tick = clock.tick();
//! scene.tick(tick);
//! ```

use crate::field::FrameTick;
use std::time::Instant;

/// Default upper bound on a single frame's delta, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.1;

#[derive(Debug)]
pub struct Clock {
    last_frame: Instant,
    elapsed: f32,
    delta: f32,
    frame_count: u64,
    paused: bool,
    fixed_delta: Option<f32>,
    time_scale: f32,
    max_delta: f32,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            elapsed: 0.0,
            delta: 0.0,
            frame_count: 0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// Measure the time since the last tick and advance.
    pub fn tick(&mut self) -> FrameTick {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.advance_by(raw)
    }

    /// Advance by an explicit raw delta, as if `raw` seconds had passed.
    ///
    /// Pause, fixed delta, time scale and the delta cap all still apply.
    pub fn advance_by(&mut self, raw: f32) -> FrameTick {
        if self.paused {
            self.delta = 0.0;
            return self.current();
        }

        let raw = self.fixed_delta.unwrap_or(raw);
        let delta = if raw.is_finite() {
            (raw * self.time_scale).clamp(0.0, self.max_delta)
        } else {
            0.0
        };

        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
        self.current()
    }

    /// The most recent tick.
    pub fn current(&self) -> FrameTick {
        FrameTick::new(self.elapsed, self.delta)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Time spent paused is not a frame delta.
            self.last_frame = Instant::now();
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Use `Some(delta)` for every frame instead of measured time.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Negative scales clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_max_delta(&mut self, max_delta: f32) {
        if max_delta.is_finite() && max_delta > 0.0 {
            self.max_delta = max_delta;
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
