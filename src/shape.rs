//! Target positions for the two layouts.
//!
//! The scattered layout is a uniform sample of a solid sphere. The assembled
//! layout is a conical golden-angle spiral: height rises linearly with the
//! index, the radius shrinks linearly to zero at the top, and each index turns
//! by [`GOLDEN_ANGLE`] so neighbouring indices never line up.

use crate::error::ConfigError;
use crate::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Angular increment between consecutive spiral indices, `π(3 - √5)` radians.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Cone profile of the assembled tree.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeShape {
    /// Vertical extent, from `y_offset` to `y_offset + height`.
    pub height: f32,
    /// Radius of the bottom ring. Shrinks linearly to zero at the top.
    pub base_radius: f32,
}

impl Default for TreeShape {
    fn default() -> Self {
        Self {
            height: 14.0,
            base_radius: 6.0,
        }
    }
}

impl TreeShape {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tree height", self.height)?;
        positive("tree base radius", self.base_radius)
    }

    /// Fraction of the way up the tree for `index` out of `total`.
    ///
    /// The last index sits at exactly 1.0. A single-element spiral sits at the base.
    pub fn fraction(index: usize, total: usize) -> Result<f32, ConfigError> {
        if total == 0 || index >= total {
            return Err(ConfigError::InvalidTotal { index, total });
        }
        if total == 1 {
            return Ok(0.0);
        }
        Ok(index as f32 / (total - 1) as f32)
    }

    /// Height of `index` before `y_offset` is applied.
    pub fn height_at(&self, fraction: f32) -> f32 {
        fraction * self.height
    }

    /// Cone radius at the given height fraction.
    pub fn radius_at(&self, fraction: f32) -> f32 {
        self.base_radius * (1.0 - fraction)
    }

    /// Spiral angle of `index`, wrapped into `[0, 2π)`.
    pub fn angle_at(index: usize) -> f32 {
        // Wrap in f64 so large indices keep their fractional turn.
        ((index as f64 * GOLDEN_ANGLE as f64) % std::f64::consts::TAU) as f32
    }

    /// Deterministic spiral point with an explicit radial offset.
    ///
    /// `radial_noise` is added to the cone radius before the point is placed,
    /// so `0.0` gives the exact spiral.
    pub fn spiral_point(
        &self,
        index: usize,
        total: usize,
        y_offset: f32,
        radial_noise: f32,
    ) -> Result<Vec3, ConfigError> {
        let fraction = Self::fraction(index, total)?;
        let theta = Self::angle_at(index);
        let radius = self.radius_at(fraction) + radial_noise;

        Ok(Vec3::new(
            theta.cos() * radius,
            self.height_at(fraction) + y_offset,
            theta.sin() * radius,
        ))
    }
}

/// Uniform random point inside a sphere of the given radius, centered at origin.
///
/// The radius is `cbrt(u) * radius` so points are uniform by volume, and the
/// latitude is `acos(2v - 1)` so the poles are not over-sampled.
pub fn sample_scattered_point<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let theta = TAU * rng.gen::<f32>();
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r = rng.gen::<f32>().cbrt() * radius;
    let sin_phi = phi.sin();

    Vec3::new(
        r * sin_phi * theta.cos(),
        r * sin_phi * theta.sin(),
        r * phi.cos(),
    )
}

/// Point on the conical spiral for `index` of `total`, with a symmetric
/// radial jitter in `[-jitter/2, jitter/2)`.
///
/// Fails when `total` is zero or `index` is out of range.
pub fn sample_assembled_point<R: Rng + ?Sized>(
    rng: &mut R,
    shape: &TreeShape,
    index: usize,
    total: usize,
    y_offset: f32,
    jitter: f32,
) -> Result<Vec3, ConfigError> {
    let noise = if jitter > 0.0 {
        (rng.gen::<f32>() - 0.5) * jitter
    } else {
        0.0
    };
    shape.spiral_point(index, total, y_offset, noise)
}

pub(crate) fn positive(what: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRadius { what, value })
    }
}

pub(crate) fn finite(what: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { what, value })
    }
}

pub(crate) fn non_negative(what: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { what, value })
    }
}
