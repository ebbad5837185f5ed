//! Orbit camera around the tree.

use glam::{Mat4, Vec3};

pub const FOV_Y_DEGREES: f32 = 50.0;
pub const MIN_DISTANCE: f32 = 10.0;
pub const MAX_DISTANCE: f32 = 50.0;
/// Half a turn per minute.
pub const AUTO_ROTATE_SPEED: f32 = std::f32::consts::TAU / 60.0 * 0.5;

const PITCH_LIMIT: f32 = 1.5;

pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    pub target: Vec3,
}

impl Camera {
    /// Looking at the origin from +Z, 25 units out.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 25.0,
            target: Vec3::ZERO,
        }
    }

    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, 0.1, 200.0)
    }

    /// Drag by `dx`, `dy` radians.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx;
        self.pitch = (self.pitch + dy).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Positive `amount` moves closer.
    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance * (1.0 - amount * 0.1)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn auto_rotate(&mut self, delta: f32) {
        self.yaw += AUTO_ROTATE_SPEED * delta;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
