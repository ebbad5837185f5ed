//! Spawn context for field construction.
//!
//! Fields are built by calling a spawner closure once per index. The closure
//! receives a [`SpawnContext`] carrying the index, the total count and an RNG,
//! plus helpers for the two layouts. Tests pass their own closures to pin
//! positions without touching the RNG at all.
//!
//! ```ignore
//! let mut rng = spawn_rng(Some(7));
//! let field = Foliage::with_spawner(3, Smoothing::default(), &mut rng, |ctx| FoliageParticle {
//!     scatter: Vec3::new(ctx.index as f32, 0.0, 0.0),
//!     assembled: Vec3::ZERO,
//!     seed: 0.5,
//! })?;
//! ```

use crate::error::ConfigError;
use crate::shape::{self, TreeShape};
use crate::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Context provided to spawner functions with helpers for the two layouts.
pub struct SpawnContext<'a> {
    /// Index of the element being spawned (0 to count-1).
    pub index: usize,
    /// Total number of elements being spawned.
    pub count: usize,
    rng: &'a mut SmallRng,
}

impl<'a> SpawnContext<'a> {
    pub(crate) fn new(index: usize, count: usize, rng: &'a mut SmallRng) -> Self {
        Self { index, count, rng }
    }

    /// Normalized progress through the spawn (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        TreeShape::fraction(self.index, self.count).unwrap_or(0.0)
    }

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random point inside a sphere of given radius, uniform by volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        shape::sample_scattered_point(&mut *self.rng, radius)
    }

    /// Spiral position of this index on the tree, with radial jitter.
    pub fn tree_position(
        &mut self,
        tree: &TreeShape,
        y_offset: f32,
        jitter: f32,
    ) -> Result<Vec3, ConfigError> {
        shape::sample_assembled_point(&mut *self.rng, tree, self.index, self.count, y_offset, jitter)
    }

    /// Random Euler angles, each in `[0, π)`.
    pub fn random_rotation(&mut self) -> Vec3 {
        use std::f32::consts::PI;
        Vec3::new(
            self.rng.gen::<f32>() * PI,
            self.rng.gen::<f32>() * PI,
            self.rng.gen::<f32>() * PI,
        )
    }
}

/// RNG used for field construction.
///
/// `Some(seed)` gives a reproducible layout; `None` seeds from the OS.
pub fn spawn_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Run `spawner` for every index in `0..count`, failing fast on a zero count.
pub(crate) fn spawn_all<T, F>(
    what: &'static str,
    count: usize,
    rng: &mut SmallRng,
    mut spawner: F,
) -> Result<Vec<T>, ConfigError>
where
    F: FnMut(&mut SpawnContext<'_>) -> Result<T, ConfigError>,
{
    if count == 0 {
        return Err(ConfigError::InvalidCount { what, count });
    }
    let mut out = Vec::with_capacity(count);
    for index in 0..count {
        let mut ctx = SpawnContext::new(index, count, rng);
        out.push(spawner(&mut ctx)?);
    }
    Ok(out)
}
