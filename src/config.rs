//! Scene configuration.
//!
//! Every struct uses `#[serde(default)]`, so a JSON file only needs the keys it
//! overrides:
//!
//! ```json
//! { "foliage": { "count": 5000 }, "initial_mode": "scattered" }
//! ```
//!
//! Defaults give the stock scene: 15000 foliage particles, gold
//! spheres, dark red boxes and small white lights.

use crate::error::ConfigError;
use crate::foliage::Smoothing;
use crate::mode::Mode;
use crate::ornaments::OrnamentKind;
use crate::shape::{finite, non_negative, positive, TreeShape};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Point-cloud foliage parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoliageConfig {
    pub count: usize,
    pub scatter_radius: f32,
    /// Height of the tree's base ring.
    pub y_offset: f32,
    /// Full width of the symmetric radial jitter.
    pub jitter: f32,
    pub smoothing: Smoothing,
    /// sRGB colour of high-seed particles.
    pub color_high: [f32; 3],
    /// sRGB colour of low-seed particles.
    pub color_low: [f32; 3],
    /// sRGB sparkle colour for seeds above 0.85.
    pub color_gold: [f32; 3],
    /// Multiplier from the reference point size to on-screen pixels.
    pub point_scale: f32,
}

impl Default for FoliageConfig {
    fn default() -> Self {
        Self {
            count: 15_000,
            scatter_radius: 25.0,
            y_offset: -7.0,
            jitter: 0.8,
            smoothing: Smoothing::default(),
            color_high: hex(0x0f4d2a),
            color_low: hex(0x001a0b),
            color_gold: hex(0xffd700),
            point_scale: 24.0,
        }
    }
}

/// One instanced ornament group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrnamentGroupConfig {
    pub name: String,
    pub kind: OrnamentKind,
    pub count: usize,
    /// Group scale, multiplied by each instance's random size.
    pub scale: f32,
    /// Speed multiplier. `None` uses the kind's default.
    pub weight: Option<f32>,
    pub color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub scatter_radius: f32,
    pub y_offset: f32,
    pub jitter: f32,
    /// Horizontal distance the assembled target is pushed out from the trunk.
    pub push_out: f32,
    /// Base lerp rate before the weight is applied.
    pub base_speed: f32,
}

impl Default for OrnamentGroupConfig {
    fn default() -> Self {
        Self {
            name: "ornaments".to_string(),
            kind: OrnamentKind::Sphere,
            count: 100,
            scale: 1.0,
            weight: None,
            color: hex(0xffd700),
            metallic: 0.9,
            roughness: 0.1,
            scatter_radius: 30.0,
            y_offset: -7.0,
            jitter: 0.2,
            push_out: 0.5,
            base_speed: 2.0,
        }
    }
}

impl OrnamentGroupConfig {
    pub fn speed_weight(&self) -> f32 {
        self.weight.unwrap_or_else(|| self.kind.default_weight())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::InvalidCount {
                what: "ornament",
                count: self.count,
            });
        }
        positive("ornament scale", self.scale)?;
        positive("ornament scatter radius", self.scatter_radius)?;
        positive("ornament weight", self.speed_weight())?;
        positive("ornament base speed", self.base_speed)?;
        finite("ornament y offset", self.y_offset)?;
        non_negative("ornament jitter", self.jitter)?;
        non_negative("ornament push out", self.push_out)
    }
}

/// Whole scene: tree shape, foliage, ornament groups and starting mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub tree: TreeShape,
    pub foliage: FoliageConfig,
    pub ornaments: Vec<OrnamentGroupConfig>,
    pub initial_mode: Mode,
    /// Vertical offset of the whole tree group in world space.
    pub root_offset: f32,
    /// Seed for layout generation. `None` picks a fresh layout every run.
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            tree: TreeShape::default(),
            foliage: FoliageConfig::default(),
            ornaments: vec![
                OrnamentGroupConfig {
                    name: "gold spheres".to_string(),
                    kind: OrnamentKind::Sphere,
                    count: 300,
                    scale: 0.5,
                    ..OrnamentGroupConfig::default()
                },
                OrnamentGroupConfig {
                    name: "red boxes".to_string(),
                    kind: OrnamentKind::Box,
                    count: 100,
                    scale: 0.7,
                    color: hex(0x8b0000),
                    roughness: 0.3,
                    ..OrnamentGroupConfig::default()
                },
                OrnamentGroupConfig {
                    name: "lights".to_string(),
                    kind: OrnamentKind::Sphere,
                    count: 200,
                    scale: 0.2,
                    color: hex(0xffffff),
                    metallic: 1.0,
                    roughness: 0.0,
                    ..OrnamentGroupConfig::default()
                },
            ],
            initial_mode: Mode::Assembled,
            root_offset: 2.0,
            seed: None,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tree.validate()?;
        if self.foliage.count == 0 {
            return Err(ConfigError::InvalidCount {
                what: "foliage",
                count: self.foliage.count,
            });
        }
        positive("foliage scatter radius", self.foliage.scatter_radius)?;
        finite("foliage y offset", self.foliage.y_offset)?;
        non_negative("foliage jitter", self.foliage.jitter)?;
        positive("foliage point scale", self.foliage.point_scale)?;
        self.foliage.smoothing.validate()?;
        for group in &self.ornaments {
            group.validate()?;
        }
        Ok(())
    }
}

/// `0xRRGGBB` to sRGB components in `[0, 1]`.
pub fn hex(rgb: u32) -> [f32; 3] {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    ]
}

/// sRGB component to linear, for upload to an sRGB render target.
pub fn srgb_to_linear(c: [f32; 3]) -> [f32; 3] {
    c.map(|v| {
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    })
}
