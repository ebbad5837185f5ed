//! # arix
//!
//! A particle tree that morphs between a scattered cloud and an assembled cone.
//!
//! Two kinds of field make up the visual:
//!
//! - **Foliage**: thousands of points whose positions are interpolated on the
//!   GPU. The CPU only advances a single smoothed `progress` scalar.
//! - **Ornaments**: a few hundred instanced meshes per group, each chasing its
//!   own target on the CPU, with a fresh transform buffer every frame.
//!
//! One [`ModeController`] decides which configuration every field heads for.
//!
//! ## Quick Start
//!
//! ```ignore
//! use arix::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     let scene = Scene::new(SceneConfig::default())?;
//!     arix::run(scene)
//! }
//! ```
//!
//! ## Headless use
//!
//! Everything except the viewer works without a window:
//!
//! ```ignore
//! let mut scene = Scene::new(SceneConfig { seed: Some(7), ..Default::default() })?;
//! let mut clock = Clock::new();
//! clock.set_fixed_delta(Some(1.0 / 60.0));
//!
//! scene.controller().set_mode(false); // scatter
//! for _ in 0..120 {
//!     scene.tick(clock.advance_by(0.0));
//! }
//! let frame = scene.foliage().frame();
//! ```
//!
//! ## Controls
//!
//! | Input | Effect |
//! |-------|--------|
//! | `A` / `Enter` | assemble |
//! | `S` / `Backspace` | scatter |
//! | `Space` | toggle |
//! | `P` | pause the clock |
//! | drag / wheel | orbit / zoom |

pub mod config;
pub mod controls;
pub mod error;
pub mod field;
pub mod foliage;
mod gpu;
pub mod mode;
pub mod ornaments;
pub mod scene;
pub mod shaders;
pub mod shape;
pub mod spawn;
pub mod time;
mod window;

pub use config::{FoliageConfig, OrnamentGroupConfig, SceneConfig};
pub use controls::ControlAction;
pub use error::{ConfigError, GpuError, ViewerError};
pub use field::{FrameTick, MorphField};
pub use foliage::{Foliage, FoliageParticle, Smoothing};
pub use glam::{Mat4, Vec3};
pub use mode::{Mode, ModeController, ModeWatch};
pub use ornaments::{OrnamentField, OrnamentInstance, OrnamentKind};
pub use scene::Scene;
pub use shape::TreeShape;
pub use spawn::SpawnContext;
pub use time::Clock;
pub use window::run;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use arix::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{FoliageConfig, OrnamentGroupConfig, SceneConfig};
    pub use crate::controls::ControlAction;
    pub use crate::error::{ConfigError, ViewerError};
    pub use crate::field::{FrameTick, MorphField};
    pub use crate::foliage::{Foliage, FoliageParticle, Smoothing};
    pub use crate::mode::{Mode, ModeController};
    pub use crate::ornaments::{OrnamentField, OrnamentInstance, OrnamentKind};
    pub use crate::scene::Scene;
    pub use crate::shape::TreeShape;
    pub use crate::spawn::SpawnContext;
    pub use crate::time::Clock;
    pub use crate::{Mat4, Vec3};
}
