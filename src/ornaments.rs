//! CPU-interpolated instanced ornaments.
//!
//! Every instance keeps its own current position and eases it towards the
//! active target with a per-frame lerp. While scattered, instances bob and
//! tumble; while assembled, they keep whatever rotation they had when the
//! tree formed. The resulting transforms land in one instance buffer per
//! group, rewritten every frame because the bob never settles.

use crate::config::OrnamentGroupConfig;
use crate::error::ConfigError;
use crate::field::{FrameTick, MorphField};
use crate::mode::Mode;
use crate::shape::{positive, TreeShape};
use crate::spawn::{spawn_all, SpawnContext};
use crate::Vec3;
use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

/// Amplitude of the scattered vertical bob, per frame.
const BOB_AMPLITUDE: f32 = 0.02;
/// Idle tumble rates (radians per second) around X and Y.
const TUMBLE_X: f32 = 0.2;
const TUMBLE_Y: f32 = 0.3;

/// Mesh used by an ornament group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrnamentKind {
    #[default]
    Sphere,
    Box,
}

impl OrnamentKind {
    /// Speed multiplier for the kind.
    ///
    /// Despite the name "weight" this is not inertia: a larger value moves
    /// the instance faster. Boxes drift in behind the lighter spheres.
    pub fn default_weight(self) -> f32 {
        match self {
            OrnamentKind::Box => 0.8,
            OrnamentKind::Sphere => 1.2,
        }
    }
}

/// One ornament instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrnamentInstance {
    pub scatter_target: Vec3,
    pub assembled_target: Vec3,
    pub current_position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    pub speed_weight: f32,
    pub size_scale: f32,
}

impl OrnamentInstance {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        positive("ornament instance weight", self.speed_weight)?;
        positive("ornament instance size", self.size_scale)?;
        let vectors = [
            self.scatter_target,
            self.assembled_target,
            self.current_position,
            self.rotation,
        ];
        if vectors.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(ConfigError::NonFinitePosition {
                what: "ornament",
                index,
            })
        }
    }

    /// A new instance resting at its scatter target.
    pub fn new(
        scatter_target: Vec3,
        assembled_target: Vec3,
        rotation: Vec3,
        speed_weight: f32,
        size_scale: f32,
    ) -> Self {
        Self {
            scatter_target,
            assembled_target,
            current_position: scatter_target,
            rotation,
            speed_weight,
            size_scale,
        }
    }

    pub fn target(&self, mode: Mode) -> Vec3 {
        match mode {
            Mode::Assembled => self.assembled_target,
            Mode::Scattered => self.scatter_target,
        }
    }

    /// Move one frame towards `mode`'s target.
    ///
    /// The blend factor is `delta * base_speed * speed_weight`, capped at 1.
    pub fn step(&mut self, index: usize, tick: FrameTick, base_speed: f32, mode: Mode) {
        let target = self.target(mode);
        let t = (tick.delta * base_speed * self.speed_weight).clamp(0.0, 1.0);
        self.current_position = self.current_position.lerp(target, t);

        if mode == Mode::Scattered {
            self.current_position.y += (tick.elapsed + index as f32).sin() * BOB_AMPLITUDE;
            self.rotation.x += tick.delta * TUMBLE_X;
            self.rotation.y += tick.delta * TUMBLE_Y;
        }
    }

    pub fn transform(&self, group_scale: f32) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(
            Vec3::splat(group_scale * self.size_scale),
            rotation,
            self.current_position,
        )
    }
}

/// Column-major 4x4 transform as laid out in the instance buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceTransform {
    pub columns: [[f32; 4]; 4],
}

impl From<Mat4> for InstanceTransform {
    fn from(m: Mat4) -> Self {
        Self {
            columns: m.to_cols_array_2d(),
        }
    }
}

/// A group of identical-mesh ornaments sharing one instance buffer.
#[derive(Debug)]
pub struct OrnamentField {
    config: OrnamentGroupConfig,
    instances: Vec<OrnamentInstance>,
    transforms: Vec<InstanceTransform>,
    dirty: bool,
}

impl OrnamentField {
    /// Generate `config.count` instances on the tree surface and in the scatter sphere.
    pub fn new(
        config: &OrnamentGroupConfig,
        tree: &TreeShape,
        rng: &mut SmallRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let weight = config.speed_weight();
        let instances = spawn_all("ornament", config.count, rng, |ctx| {
            let mut assembled = ctx.tree_position(tree, config.y_offset, config.jitter)?;
            assembled += push_outward(assembled, config.push_out);
            let scatter = ctx.random_in_sphere(config.scatter_radius);
            let rotation = ctx.random_rotation();
            let size_scale = ctx.random() * 0.5 + 0.5;
            Ok(OrnamentInstance::new(scatter, assembled, rotation, weight, size_scale))
        })?;
        Self::from_instances(config.clone(), instances)
    }

    /// Build from a spawner closure, called once per index.
    pub fn with_spawner<F>(
        config: OrnamentGroupConfig,
        rng: &mut SmallRng,
        mut spawner: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&mut SpawnContext<'_>) -> OrnamentInstance,
    {
        let instances = spawn_all("ornament", config.count, rng, |ctx| Ok(spawner(ctx)))?;
        Self::from_instances(config, instances)
    }

    /// Build from ready-made instances.
    ///
    /// `config.count` is replaced by the number of instances.
    pub fn from_instances(
        mut config: OrnamentGroupConfig,
        instances: Vec<OrnamentInstance>,
    ) -> Result<Self, ConfigError> {
        if instances.is_empty() {
            return Err(ConfigError::InvalidCount {
                what: "ornament",
                count: 0,
            });
        }
        positive("ornament base speed", config.base_speed)?;
        positive("ornament scale", config.scale)?;
        for (index, instance) in instances.iter().enumerate() {
            instance.validate(index)?;
        }
        config.count = instances.len();
        tracing::debug!(
            group = %config.name,
            kind = ?config.kind,
            count = instances.len(),
            "built ornament group"
        );
        let mut field = Self {
            transforms: vec![InstanceTransform::zeroed(); instances.len()],
            config,
            instances,
            dirty: true,
        };
        field.write_transforms();
        Ok(field)
    }

    /// Advance every instance one frame and rewrite the instance buffer.
    ///
    /// Degenerate deltas leave positions, rotations and the buffer untouched.
    pub fn update(&mut self, elapsed: f32, delta: f32, mode: Mode) {
        let tick = FrameTick::new(elapsed, delta);
        if tick.is_degenerate() {
            return;
        }
        let base_speed = self.config.base_speed;
        for (i, instance) in self.instances.iter_mut().enumerate() {
            instance.step(i, tick, base_speed, mode);
        }
        self.write_transforms();
    }

    fn write_transforms(&mut self) {
        let scale = self.config.scale;
        for (slot, instance) in self.transforms.iter_mut().zip(&self.instances) {
            *slot = instance.transform(scale).into();
        }
        self.dirty = true;
    }

    pub fn config(&self) -> &OrnamentGroupConfig {
        &self.config
    }

    pub fn kind(&self) -> OrnamentKind {
        self.config.kind
    }

    pub fn instances(&self) -> &[OrnamentInstance] {
        &self.instances
    }

    pub fn transforms(&self) -> &[InstanceTransform] {
        &self.transforms
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Hand the instance buffer to the renderer if it changed, clearing the flag.
    pub fn take_dirty_transforms(&mut self) -> Option<&[InstanceTransform]> {
        if self.dirty {
            self.dirty = false;
            Some(&self.transforms)
        } else {
            None
        }
    }
}

impl MorphField for OrnamentField {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn len(&self) -> usize {
        self.instances.len()
    }

    fn advance(&mut self, tick: FrameTick, mode: Mode) {
        self.update(tick.elapsed, tick.delta, mode);
    }
}

/// Horizontal push away from the trunk so ornaments sit on the surface.
///
/// Points on the axis have no horizontal direction and are not moved.
pub fn push_outward(position: Vec3, distance: f32) -> Vec3 {
    Vec3::new(position.x, 0.0, position.z).normalize_or_zero() * distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::spawn_rng;

    fn single(scatter: Vec3, assembled: Vec3, weight: f32) -> OrnamentField {
        let config = OrnamentGroupConfig {
            count: 1,
            weight: Some(weight),
            ..OrnamentGroupConfig::default()
        };
        let instance = OrnamentInstance::new(scatter, assembled, Vec3::ZERO, weight, 1.0);
        OrnamentField::from_instances(config, vec![instance]).unwrap()
    }

    #[test]
    fn test_switch_to_assembled_converges() {
        let mut field = single(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, 1.0);
        let mut elapsed = 0.0;
        for _ in 0..10 {
            elapsed += 0.016;
            field.update(elapsed, 0.016, Mode::Scattered);
        }
        let mut frames = 0;
        while field.instances()[0].current_position.length() >= 0.01 {
            elapsed += 0.016;
            field.update(elapsed, 0.016, Mode::Assembled);
            frames += 1;
            assert!(frames < 10_000, "never converged");
        }
    }

    #[test]
    fn test_distance_to_target_shrinks_monotonically() {
        let mut field = single(Vec3::new(-5.0, 3.0, 8.0), Vec3::new(1.0, 2.0, 0.5), 0.8);
        let target = field.instances()[0].assembled_target;
        let mut previous = field.instances()[0].current_position.distance(target);
        for frame in 0..300 {
            field.update(frame as f32 * 0.016, 0.016, Mode::Assembled);
            let d = field.instances()[0].current_position.distance(target);
            assert!(d < previous || d == 0.0);
            previous = d;
        }
    }

    #[test]
    fn test_heavier_weight_approaches_faster() {
        let mut slow = single(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, 0.8);
        let mut fast = single(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, 1.2);
        for frame in 0..30 {
            let t = frame as f32 * 0.016;
            slow.update(t, 0.016, Mode::Assembled);
            fast.update(t, 0.016, Mode::Assembled);
        }
        assert!(
            fast.instances()[0].current_position.length()
                < slow.instances()[0].current_position.length()
        );
    }

    #[test]
    fn test_rotation_frozen_when_assembled() {
        let mut field = single(Vec3::ZERO, Vec3::ONE, 1.0);
        field.instances[0].rotation = Vec3::new(0.3, 0.4, 0.5);
        for frame in 0..60 {
            field.update(frame as f32 * 0.016, 0.016, Mode::Assembled);
        }
        assert_eq!(field.instances()[0].rotation, Vec3::new(0.3, 0.4, 0.5));
    }

    #[test]
    fn test_tumble_when_scattered() {
        let mut field = single(Vec3::ZERO, Vec3::ONE, 1.0);
        field.update(1.0, 0.5, Mode::Scattered);
        let rotation = field.instances()[0].rotation;
        assert!((rotation.x - 0.1).abs() < 1e-6);
        assert!((rotation.y - 0.15).abs() < 1e-6);
        assert_eq!(rotation.z, 0.0);
    }

    #[test]
    fn test_scattered_bob_uses_index_phase() {
        let config = OrnamentGroupConfig {
            count: 2,
            ..OrnamentGroupConfig::default()
        };
        let at_rest = OrnamentInstance::new(Vec3::ZERO, Vec3::ONE, Vec3::ZERO, 1.0, 1.0);
        let mut field = OrnamentField::from_instances(config, vec![at_rest, at_rest]).unwrap();
        field.update(0.0, 0.016, Mode::Scattered);
        // Instance 0 has phase sin(0) = 0, instance 1 sin(1).
        assert_eq!(field.instances()[0].current_position.y, 0.0);
        assert!((field.instances()[1].current_position.y - 1f32.sin() * 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_delta_is_noop() {
        let mut field = single(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, 1.0);
        let _ = field.take_dirty_transforms();
        let before = field.instances()[0];
        for delta in [0.0, -0.5, f32::NAN] {
            field.update(1.0, delta, Mode::Scattered);
        }
        assert_eq!(field.instances()[0], before);
        assert!(!field.is_dirty());
    }

    #[test]
    fn test_buffer_dirty_every_frame() {
        let mut field = single(Vec3::ZERO, Vec3::ZERO, 1.0);
        for frame in 0..5 {
            assert!(field.take_dirty_transforms().is_some());
            assert!(field.take_dirty_transforms().is_none());
            field.update(frame as f32, 0.016, Mode::Assembled);
        }
    }

    #[test]
    fn test_transform_scale_and_translation() {
        let config = OrnamentGroupConfig {
            count: 1,
            scale: 0.5,
            ..OrnamentGroupConfig::default()
        };
        let instance = OrnamentInstance::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::ZERO, 1.0, 0.8);
        let field = OrnamentField::from_instances(config, vec![instance]).unwrap();
        let m = Mat4::from_cols_array_2d(&field.transforms()[0].columns);
        let (scale, _, translation) = m.to_scale_rotation_translation();
        assert!((scale - Vec3::splat(0.4)).length() < 1e-5);
        assert!((translation - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_generated_group_sits_outside_spiral() {
        let config = OrnamentGroupConfig {
            count: 200,
            jitter: 0.0,
            ..OrnamentGroupConfig::default()
        };
        let tree = TreeShape::default();
        let mut rng = spawn_rng(Some(21));
        let field = OrnamentField::new(&config, &tree, &mut rng).unwrap();
        assert_eq!(field.len(), 200);
        for (i, instance) in field.instances().iter().enumerate() {
            let spiral = tree.spiral_point(i, 200, config.y_offset, 0.0).unwrap();
            let horizontal = |v: Vec3| Vec3::new(v.x, 0.0, v.z).length();
            let pushed = horizontal(instance.assembled_target) - horizontal(spiral);
            // The top ornament sits on the axis, which has no outward direction.
            assert!((pushed - config.push_out).abs() < 1e-3 || horizontal(spiral) < 1e-4);
            assert_eq!(instance.current_position, instance.scatter_target);
            assert!(instance.scatter_target.length() <= config.scatter_radius + 1e-3);
            assert!((0.5..=1.0).contains(&instance.size_scale));
            assert_eq!(instance.speed_weight, 1.2);
        }
    }

    #[test]
    fn test_push_outward_on_axis_is_zero() {
        assert_eq!(push_outward(Vec3::new(0.0, 5.0, 0.0), 0.5), Vec3::ZERO);
        let pushed = push_outward(Vec3::new(3.0, 5.0, 4.0), 0.5);
        assert!((pushed - Vec3::new(0.3, 0.0, 0.4)).length() < 1e-6);
    }

    #[test]
    fn test_zero_count_rejected() {
        let config = OrnamentGroupConfig {
            count: 0,
            ..OrnamentGroupConfig::default()
        };
        let mut rng = spawn_rng(Some(2));
        assert!(OrnamentField::new(&config, &TreeShape::default(), &mut rng).is_err());
        assert!(OrnamentField::from_instances(OrnamentGroupConfig::default(), Vec::new()).is_err());
    }

    #[test]
    fn test_from_instances_rejects_bad_weight_and_size() {
        let config = OrnamentGroupConfig::default;
        for weight in [f32::NAN, 0.0, -1.0] {
            let instance = OrnamentInstance::new(Vec3::X, Vec3::ZERO, Vec3::ZERO, weight, 1.0);
            let err = OrnamentField::from_instances(config(), vec![instance]).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidRadius { what: "ornament instance weight", .. }
            ));
        }
        let instance = OrnamentInstance::new(Vec3::X, Vec3::ZERO, Vec3::ZERO, 1.0, 0.0);
        let err = OrnamentField::from_instances(config(), vec![instance]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRadius { what: "ornament instance size", .. }
        ));
    }

    #[test]
    fn test_from_instances_rejects_non_finite_targets() {
        let good = OrnamentInstance::new(Vec3::X, Vec3::ZERO, Vec3::ZERO, 1.0, 1.0);
        let bad = OrnamentInstance::new(Vec3::X, Vec3::new(0.0, f32::INFINITY, 0.0), Vec3::ZERO, 1.0, 1.0);
        let err = OrnamentField::from_instances(OrnamentGroupConfig::default(), vec![good, bad])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonFinitePosition { what: "ornament", index: 1 }
        ));

        let nan_scatter = OrnamentInstance::new(Vec3::splat(f32::NAN), Vec3::ZERO, Vec3::ZERO, 1.0, 1.0);
        assert!(OrnamentField::from_instances(OrnamentGroupConfig::default(), vec![nan_scatter]).is_err());
    }

    #[test]
    fn test_from_instances_syncs_count() {
        let instance = OrnamentInstance::new(Vec3::X, Vec3::ZERO, Vec3::ZERO, 1.0, 1.0);
        let field = OrnamentField::from_instances(OrnamentGroupConfig::default(), vec![instance])
            .unwrap();
        assert_eq!(field.config().count, 1);
        assert_eq!(field.instances().len(), 1);
    }
}
