//! The whole visual: one mode, one foliage field, several ornament groups.
//!
//! [`Scene::tick`] reads the mode once and hands it to every field, so all
//! fields see the same target for the whole frame. Each field then moves at
//! its own pace, which is what layers the morph.

use crate::config::SceneConfig;
use crate::error::ConfigError;
use crate::field::{FrameTick, MorphField};
use crate::foliage::Foliage;
use crate::mode::{Mode, ModeController, ModeWatch};
use crate::ornaments::OrnamentField;
use crate::spawn::spawn_rng;

pub struct Scene {
    config: SceneConfig,
    controller: ModeController,
    watch: ModeWatch,
    foliage: Foliage,
    ornaments: Vec<OrnamentField>,
}

impl Scene {
    /// Validate `config` and generate every field.
    pub fn new(config: SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = spawn_rng(config.seed);

        let foliage = Foliage::new(&config.foliage, &config.tree, &mut rng)?;
        let ornaments = config
            .ornaments
            .iter()
            .map(|group| OrnamentField::new(group, &config.tree, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;

        let controller = ModeController::new(config.initial_mode);
        let watch = controller.watch();

        tracing::info!(
            foliage = foliage.len(),
            groups = ornaments.len(),
            instances = ornaments.iter().map(|g| g.len()).sum::<usize>(),
            mode = %config.initial_mode,
            "scene ready"
        );

        Ok(Self {
            config,
            controller,
            watch,
            foliage,
            ornaments,
        })
    }

    /// Advance every field by one frame.
    pub fn tick(&mut self, tick: FrameTick) {
        if tick.is_degenerate() {
            return;
        }
        let mode = self.watch.get();
        if let Some(changed) = self.watch.changed() {
            tracing::debug!(mode = %changed, "fields retargeted");
        }
        for field in self.fields_mut() {
            field.advance(tick, mode);
        }
    }

    fn fields_mut(&mut self) -> impl Iterator<Item = &mut dyn MorphField> {
        std::iter::once(&mut self.foliage as &mut dyn MorphField)
            .chain(self.ornaments.iter_mut().map(|g| g as &mut dyn MorphField))
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn foliage(&self) -> &Foliage {
        &self.foliage
    }

    pub fn ornaments(&self) -> &[OrnamentField] {
        &self.ornaments
    }

    pub fn ornaments_mut(&mut self) -> &mut [OrnamentField] {
        &mut self.ornaments
    }
}
