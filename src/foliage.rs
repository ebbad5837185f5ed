//! GPU-interpolated point-cloud foliage.
//!
//! Each particle stores a scatter position, an assembled position and a random
//! seed, all fixed at construction. Per frame only two scalars change: the
//! global `progress` (smoothed towards the mode's target) and the elapsed
//! time. The vertex shader turns those into per-particle positions using the
//! law implemented on the CPU by [`FoliageParticle::position_at`]:
//!
//! ```text
//! local    = clamp((progress - seed * 0.2) / 0.8, 0, 1)
//! eased    = cubic_ease_in_out(local)
//! position = mix(scatter, assembled, eased)
//! position.y += sin(time * 2 + seed * 10) * 0.1                 // breathing
//! position.y += sin(time * 0.5 + scatter.x) * (1 - eased) * 0.5 // scatter float
//! ```

use crate::config::FoliageConfig;
use crate::error::ConfigError;
use crate::field::{FrameTick, MorphField};
use crate::mode::Mode;
use crate::shape::{positive, TreeShape};
use crate::spawn::{spawn_all, SpawnContext};
use crate::Vec3;
use bytemuck::{Pod, Zeroable};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

/// Fraction of the progress range spent staggering particles by seed.
pub const SEED_DELAY: f32 = 0.2;

/// How `progress` approaches its target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Smoothing {
    /// `progress += (target - progress) * (1 - exp(-rate * delta))`.
    ///
    /// Frame-rate independent.
    Exponential { rate: f32 },
    /// `progress = lerp(progress, target, min(rate * delta, 1))`.
    ///
    /// A plain per-frame lerp; converges faster at low frame rates.
    Linear { rate: f32 },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::Exponential { rate: 1.5 }
    }
}

impl Smoothing {
    /// Blend factor in `[0, 1]` for a frame of length `delta`.
    pub fn factor(&self, delta: f32) -> f32 {
        match *self {
            Smoothing::Exponential { rate } => 1.0 - (-rate * delta).exp(),
            Smoothing::Linear { rate } => (rate * delta).min(1.0),
        }
    }

    pub fn rate(&self) -> f32 {
        match *self {
            Smoothing::Exponential { rate } | Smoothing::Linear { rate } => rate,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("progress rate", self.rate())
    }
}

/// Cubic ease-in-out on `[0, 1]`.
#[inline]
pub fn cubic_ease_in_out(x: f32) -> f32 {
    if x < 0.5 {
        4.0 * x * x * x
    } else {
        1.0 - (-2.0 * x + 2.0).powi(3) / 2.0
    }
}

/// One foliage particle. Immutable after construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoliageParticle {
    pub scatter: Vec3,
    pub assembled: Vec3,
    /// Random value in `[0, 1)` that delays the morph and picks the colour.
    pub seed: f32,
}

impl FoliageParticle {
    /// This particle's eased share of the global progress.
    pub fn eased_progress(&self, progress: f32) -> f32 {
        let local = ((progress - self.seed * SEED_DELAY) / (1.0 - SEED_DELAY)).clamp(0.0, 1.0);
        cubic_ease_in_out(local)
    }

    /// Position the vertex shader places this particle at.
    pub fn position_at(&self, progress: f32, time: f32) -> Vec3 {
        let eased = self.eased_progress(progress);
        let mut pos = self.scatter.lerp(self.assembled, eased);

        let breathe = (time * 2.0 + self.seed * 10.0).sin() * 0.1;
        let float_y = (time * 0.5 + self.scatter.x).sin() * (1.0 - eased) * 0.5;
        pos.y += breathe + float_y;
        pos
    }

    /// Reference point size before perspective: looser dust when scattered,
    /// tighter points on the tree.
    pub fn base_size(&self, progress: f32) -> f32 {
        let eased = self.eased_progress(progress);
        15.0 + (10.0 - 15.0) * eased
    }

    pub fn to_gpu(&self) -> FoliageGpu {
        FoliageGpu {
            scatter: self.scatter.to_array(),
            assembled: self.assembled.to_array(),
            seed: self.seed,
        }
    }
}

/// Vertex-buffer layout of a [`FoliageParticle`], uploaded once.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FoliageGpu {
    pub scatter: [f32; 3],
    pub assembled: [f32; 3],
    pub seed: f32,
}

/// The two scalars uploaded every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoliageFrame {
    pub progress: f32,
    pub time: f32,
}

/// Point-cloud foliage field.
#[derive(Debug)]
pub struct Foliage {
    particles: Vec<FoliageParticle>,
    smoothing: Smoothing,
    progress: f32,
    elapsed: f32,
}

impl Foliage {
    /// Generate `config.count` particles: sphere scatter positions, tree spiral
    /// positions and seeds.
    pub fn new(
        config: &FoliageConfig,
        tree: &TreeShape,
        rng: &mut SmallRng,
    ) -> Result<Self, ConfigError> {
        positive("foliage scatter radius", config.scatter_radius)?;
        let particles = spawn_all("foliage", config.count, rng, |ctx| {
            Ok(FoliageParticle {
                scatter: ctx.random_in_sphere(config.scatter_radius),
                assembled: ctx.tree_position(tree, config.y_offset, config.jitter)?,
                seed: ctx.random(),
            })
        })?;
        Self::from_particles(particles, config.smoothing)
    }

    /// Build from a spawner closure, called once per index.
    pub fn with_spawner<F>(
        count: usize,
        smoothing: Smoothing,
        rng: &mut SmallRng,
        mut spawner: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&mut SpawnContext<'_>) -> FoliageParticle,
    {
        let particles = spawn_all("foliage", count, rng, |ctx| Ok(spawner(ctx)))?;
        Self::from_particles(particles, smoothing)
    }

    /// Build from three parallel buffers, one entry per particle.
    pub fn from_buffers(
        scatter: &[Vec3],
        assembled: &[Vec3],
        seeds: &[f32],
        smoothing: Smoothing,
    ) -> Result<Self, ConfigError> {
        for (what, found) in [("assembled positions", assembled.len()), ("seeds", seeds.len())] {
            if found != scatter.len() {
                return Err(ConfigError::LengthMismatch {
                    what,
                    expected: scatter.len(),
                    found,
                });
            }
        }
        let particles = scatter
            .iter()
            .zip(assembled)
            .zip(seeds)
            .map(|((&scatter, &assembled), &seed)| FoliageParticle {
                scatter,
                assembled,
                seed,
            })
            .collect();
        Self::from_particles(particles, smoothing)
    }

    pub fn from_particles(
        particles: Vec<FoliageParticle>,
        smoothing: Smoothing,
    ) -> Result<Self, ConfigError> {
        if particles.is_empty() {
            return Err(ConfigError::InvalidCount {
                what: "foliage",
                count: 0,
            });
        }
        smoothing.validate()?;
        for (index, particle) in particles.iter().enumerate() {
            if !(0.0..1.0).contains(&particle.seed) {
                return Err(ConfigError::InvalidSeed {
                    index,
                    value: particle.seed,
                });
            }
            if !(particle.scatter.is_finite() && particle.assembled.is_finite()) {
                return Err(ConfigError::NonFinitePosition {
                    what: "particle",
                    index,
                });
            }
        }
        tracing::debug!(count = particles.len(), ?smoothing, "built foliage field");
        Ok(Self {
            particles,
            smoothing,
            progress: 0.0,
            elapsed: 0.0,
        })
    }

    /// Advance progress towards `mode`'s target by one frame of `delta` seconds.
    ///
    /// Zero, negative and non-finite deltas are ignored.
    pub fn update(&mut self, delta: f32, mode: Mode) {
        if !(delta.is_finite() && delta > 0.0) {
            return;
        }
        let target = mode.target();
        let factor = self.smoothing.factor(delta);
        self.progress = (self.progress + (target - self.progress) * factor).clamp(0.0, 1.0);
        self.elapsed += delta;
    }

    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Jump straight to a progress value, e.g. to start fully assembled.
    pub fn set_progress(&mut self, progress: f32) {
        if progress.is_finite() {
            self.progress = progress.clamp(0.0, 1.0);
        }
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    pub fn particles(&self) -> &[FoliageParticle] {
        &self.particles
    }

    /// Static buffer for the one-time upload.
    pub fn gpu_particles(&self) -> Vec<FoliageGpu> {
        self.particles.iter().map(FoliageParticle::to_gpu).collect()
    }

    /// Per-frame scalars for the shader.
    pub fn frame(&self) -> FoliageFrame {
        FoliageFrame {
            progress: self.progress,
            time: self.elapsed,
        }
    }
}

impl MorphField for Foliage {
    fn name(&self) -> &str {
        "foliage"
    }

    fn len(&self) -> usize {
        self.particles.len()
    }

    fn advance(&mut self, tick: FrameTick, mode: Mode) {
        if tick.is_degenerate() {
            return;
        }
        self.update(tick.delta, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::spawn_rng;

    fn fixed_field(count: usize, smoothing: Smoothing) -> Foliage {
        let mut rng = spawn_rng(Some(0));
        Foliage::with_spawner(count, smoothing, &mut rng, |ctx| FoliageParticle {
            scatter: Vec3::new(ctx.index as f32 * 10.0, 0.0, 0.0),
            assembled: Vec3::new(0.0, ctx.index as f32, 0.0),
            seed: ctx.index as f32 / count as f32,
        })
        .unwrap()
    }

    #[test]
    fn test_from_buffers_checks_lengths() {
        let scatter = [Vec3::ZERO, Vec3::X];
        let assembled = [Vec3::Y, Vec3::Z];
        let field = Foliage::from_buffers(&scatter, &assembled, &[0.1, 0.9], Smoothing::default())
            .unwrap();
        assert_eq!(field.particles()[1].assembled, Vec3::Z);
        assert_eq!(field.particles()[1].seed, 0.9);

        let err = Foliage::from_buffers(&scatter, &assembled, &[0.1], Smoothing::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LengthMismatch {
                what: "seeds",
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_from_buffers_rejects_seed_outside_unit_range() {
        for seed in [7.5, 1.0, -0.1, f32::NAN] {
            let err = Foliage::from_buffers(&[Vec3::ZERO], &[Vec3::ONE], &[seed], Smoothing::default())
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidSeed { index: 0, .. }));
        }
    }

    #[test]
    fn test_from_buffers_rejects_non_finite_positions() {
        let err = Foliage::from_buffers(
            &[Vec3::ZERO, Vec3::splat(f32::NAN)],
            &[Vec3::ONE, Vec3::ONE],
            &[0.2, 0.4],
            Smoothing::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonFinitePosition { what: "particle", index: 1 }
        ));

        let err = Foliage::from_buffers(
            &[Vec3::ZERO],
            &[Vec3::new(0.0, f32::NEG_INFINITY, 0.0)],
            &[0.2],
            Smoothing::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NonFinitePosition { .. }));
    }

    #[test]
    fn test_generated_field_sizes() {
        let config = FoliageConfig {
            count: 500,
            ..FoliageConfig::default()
        };
        let mut rng = spawn_rng(Some(11));
        let field = Foliage::new(&config, &TreeShape::default(), &mut rng).unwrap();
        assert_eq!(field.len(), 500);
        assert_eq!(field.gpu_particles().len(), 500);
        for p in field.particles() {
            assert!(p.scatter.length() <= config.scatter_radius + 1e-3);
            assert!((0.0..1.0).contains(&p.seed));
            assert!(p.assembled.y >= config.y_offset - 1e-4);
        }
    }

    #[test]
    fn test_zero_count_rejected() {
        let config = FoliageConfig {
            count: 0,
            ..FoliageConfig::default()
        };
        let mut rng = spawn_rng(Some(1));
        let err = Foliage::new(&config, &TreeShape::default(), &mut rng).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCount { what: "foliage", count: 0 }));
    }

    #[test]
    fn test_update_at_target_is_idempotent() {
        let mut field = fixed_field(3, Smoothing::default());
        field.set_progress(1.0);
        field.update(0.016, Mode::Assembled);
        assert!((field.progress() - 1.0).abs() < 1e-6);

        field.set_progress(0.0);
        field.update(0.016, Mode::Scattered);
        assert!(field.progress().abs() < 1e-6);
    }

    #[test]
    fn test_progress_converges_monotonically() {
        for smoothing in [Smoothing::Exponential { rate: 1.5 }, Smoothing::Linear { rate: 1.5 }] {
            let mut field = fixed_field(3, smoothing);
            let mut previous = field.progress();
            for _ in 0..500 {
                field.update(0.016, Mode::Assembled);
                assert!(field.progress() >= previous);
                assert!(field.progress() <= 1.0);
                previous = field.progress();
            }

            for _ in 0..500 {
                field.update(0.016, Mode::Scattered);
                assert!(field.progress() <= previous);
                assert!(field.progress() >= 0.0);
                previous = field.progress();
            }
        }
    }

    #[test]
    fn test_linear_smoothing_never_overshoots_on_long_frames() {
        let mut field = fixed_field(3, Smoothing::Linear { rate: 1.5 });
        field.update(5.0, Mode::Assembled);
        assert_eq!(field.progress(), 1.0);
    }

    #[test]
    fn test_thousand_frames_reach_assembled() {
        let mut field = fixed_field(3, Smoothing::default());
        for _ in 0..1000 {
            field.advance(FrameTick::new(0.0, 0.016), Mode::Assembled);
        }
        assert!((field.progress() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_delta_is_noop() {
        let mut field = fixed_field(3, Smoothing::default());
        field.set_progress(0.4);
        for delta in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            field.update(delta, Mode::Assembled);
            assert_eq!(field.progress(), 0.4);
            assert_eq!(field.elapsed(), 0.0);
        }
    }

    #[test]
    fn test_elapsed_accumulates() {
        let mut field = fixed_field(3, Smoothing::default());
        for _ in 0..10 {
            field.update(0.1, Mode::Assembled);
        }
        assert!((field.frame().time - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ease_curve() {
        assert_eq!(cubic_ease_in_out(0.0), 0.0);
        assert_eq!(cubic_ease_in_out(0.5), 0.5);
        assert_eq!(cubic_ease_in_out(1.0), 1.0);
        assert!(cubic_ease_in_out(0.25) < 0.25);
        assert!(cubic_ease_in_out(0.75) > 0.75);
    }

    #[test]
    fn test_seed_delays_local_progress() {
        let early = FoliageParticle {
            scatter: Vec3::ZERO,
            assembled: Vec3::ONE,
            seed: 0.0,
        };
        let late = FoliageParticle { seed: 0.99, ..early };
        assert!(early.eased_progress(0.3) > late.eased_progress(0.3));
        assert_eq!(late.eased_progress(0.1), 0.0);
        assert_eq!(late.eased_progress(1.0), 1.0);
        assert!(early.eased_progress(0.8) > 0.9999);
    }

    #[test]
    fn test_position_law_endpoints() {
        let p = FoliageParticle {
            scatter: Vec3::new(4.0, 1.0, -2.0),
            assembled: Vec3::new(0.0, 5.0, 1.0),
            seed: 0.3,
        };
        // At time 0 the breathing term is sin(3) * 0.1 and the float term sin(4) * 0.5.
        let breathe = (0.3f32 * 10.0).sin() * 0.1;
        let float_y = 4.0f32.sin() * 0.5;

        let scattered = p.position_at(0.0, 0.0);
        assert!((scattered - (p.scatter + Vec3::Y * (breathe + float_y))).length() < 1e-5);

        let assembled = p.position_at(1.0, 0.0);
        assert!((assembled - (p.assembled + Vec3::Y * breathe)).length() < 1e-5);
    }

    #[test]
    fn test_point_size_shrinks_on_tree() {
        let p = FoliageParticle {
            scatter: Vec3::ZERO,
            assembled: Vec3::ONE,
            seed: 0.5,
        };
        assert_eq!(p.base_size(0.0), 15.0);
        assert_eq!(p.base_size(1.0), 10.0);
    }

    #[test]
    fn test_gpu_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<FoliageGpu>(), 28);
        let gpu = fixed_field(2, Smoothing::default()).gpu_particles();
        assert_eq!(gpu[1].scatter, [10.0, 0.0, 0.0]);
        assert_eq!(gpu[1].assembled, [0.0, 1.0, 0.0]);
        assert_eq!(gpu[1].seed, 0.5);
    }

    #[test]
    fn test_smoothing_deserializes_tagged() {
        let s: Smoothing = serde_json::from_str(r#"{ "kind": "linear", "rate": 2.0 }"#).unwrap();
        assert_eq!(s, Smoothing::Linear { rate: 2.0 });
        assert!(Smoothing::Exponential { rate: 0.0 }.validate().is_err());
    }
}
