//! Shared capability of the animated fields.
//!
//! The foliage point field and the ornament groups animate towards the same
//! [`Mode`] in different ways (one scalar handed to the GPU, versus a CPU loop
//! over instances). Both implement [`MorphField`] so the scene can drive them
//! uniformly while each keeps its own rate and style.

use crate::mode::Mode;

/// Timing for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTick {
    /// Seconds since the clock started (excluding pauses).
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

impl FrameTick {
    pub fn new(elapsed: f32, delta: f32) -> Self {
        Self { elapsed, delta }
    }

    /// A zero, negative or non-finite delta. Such frames must not move anything.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.delta.is_finite() && self.delta > 0.0) || !self.elapsed.is_finite()
    }
}

/// A field that morphs between the scattered and assembled layouts.
pub trait MorphField {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Number of particles or instances in the field.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance one frame towards `mode`.
    ///
    /// Degenerate ticks (see [`FrameTick::is_degenerate`]) leave the field untouched.
    fn advance(&mut self, tick: FrameTick, mode: Mode);
}
